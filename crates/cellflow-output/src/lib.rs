//! `cellflow-output` — CSV sinks for the engine's record streams.
//!
//! [`CsvRecorder`] implements [`cellflow_sim::Recorder`] over three files in
//! an output directory:
//!
//! | File              | Stream                         |
//! |-------------------|--------------------------------|
//! | `system_data.csv` | one row per tick               |
//! | `vehicle_data.csv`| one row per completed journey  |
//! | `trace_data.csv`  | one row per trajectory point   |
//!
//! Records accumulate in memory and are written on `flush`.  With background
//! flushing enabled, a flush is dispatched to a helper thread behind a
//! single-flight guard: if the previous write has not returned, the new
//! flush is skipped with a warning and the rows stay buffered for the next
//! one.  Sink errors never reach the engine; the first one is kept for
//! inspection via [`CsvRecorder::take_error`].

pub mod csv_recorder;
pub mod error;


pub use csv_recorder::CsvRecorder;
pub use error::{OutputError, OutputResult};
