//! The CSV-backed recorder.

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use csv::Writer;
use log::warn;

use cellflow_core::Tick;
use cellflow_sim::{Recorder, SystemRecord, TraceRecord, VehicleRecord};

use crate::error::OutputResult;

const SYSTEM_HEADER: [&str; 7] = [
    "time_step",
    "generated",
    "active",
    "waiting",
    "completed",
    "average_speed",
    "density",
];

const VEHICLE_HEADER: [&str; 12] = [
    "trip_index",
    "vehicle_id",
    "acceleration",
    "slowing_prob",
    "origin",
    "destination",
    "in_time",
    "out_time",
    "tag",
    "closed",
    "path_length",
    "path_cells",
];

const TRACE_HEADER: [&str; 3] = ["vehicle_id", "time", "cell_id"];

/// Record rows buffered between flushes.
#[derive(Default)]
struct Caches {
    systems: Vec<SystemRecord>,
    vehicles: Vec<VehicleRecord>,
    traces: Vec<TraceRecord>,
}

impl Caches {
    fn is_empty(&self) -> bool {
        self.systems.is_empty() && self.vehicles.is_empty() && self.traces.is_empty()
    }
}

struct Files {
    system: Writer<File>,
    vehicle: Writer<File>,
    trace: Writer<File>,
}

struct Inner {
    caches: Mutex<Caches>,
    files: Mutex<Files>,
    /// Monotone index stamped onto vehicle rows at write time.
    trip_index: AtomicU64,
    /// Single-flight guard for background flushes.
    in_flight: AtomicBool,
    last_error: Mutex<Option<crate::OutputError>>,
}

/// A [`Recorder`] writing the three record streams as CSV.
///
/// Cheap to clone-share internally: the engine holds it by reference while a
/// background flush thread (if enabled) holds the same state through an
/// `Arc`.
pub struct CsvRecorder {
    inner: Arc<Inner>,
    background_flush: bool,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl CsvRecorder {
    /// Open (or truncate) the three CSV files in `dir` and write headers.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut system = Writer::from_path(dir.join("system_data.csv"))?;
        system.write_record(SYSTEM_HEADER)?;
        system.flush()?;

        let mut vehicle = Writer::from_path(dir.join("vehicle_data.csv"))?;
        vehicle.write_record(VEHICLE_HEADER)?;
        vehicle.flush()?;

        let mut trace = Writer::from_path(dir.join("trace_data.csv"))?;
        trace.write_record(TRACE_HEADER)?;
        trace.flush()?;

        Ok(Self {
            inner: Arc::new(Inner {
                caches: Mutex::new(Caches::default()),
                files: Mutex::new(Files {
                    system,
                    vehicle,
                    trace,
                }),
                trip_index: AtomicU64::new(0),
                in_flight: AtomicBool::new(false),
                last_error: Mutex::new(None),
            }),
            background_flush: false,
            pending: Mutex::new(None),
        })
    }

    /// Dispatch flushes to a helper thread instead of blocking the tick
    /// loop.  Overlapping flushes are skipped with a warning.
    pub fn with_background_flush(mut self) -> Self {
        self.background_flush = true;
        self
    }

    /// The first sink error encountered, if any.  Clears the slot.
    pub fn take_error(&self) -> Option<crate::OutputError> {
        self.inner.last_error.lock().unwrap().take()
    }

    /// Rows currently buffered across all three streams.
    pub fn buffered_rows(&self) -> usize {
        let caches = self.inner.caches.lock().unwrap();
        caches.systems.len() + caches.vehicles.len() + caches.traces.len()
    }

    fn join_pending(&self) {
        if let Some(handle) = self.pending.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

impl Inner {
    fn store_error(&self, result: OutputResult<()>) {
        if let Err(e) = result {
            warn!("record sink error: {e}");
            let mut slot = self.last_error.lock().unwrap();
            if slot.is_none() {
                *slot = Some(e);
            }
        }
    }

    /// Swap the caches out and write everything.  Serialized by the files
    /// mutex; the caches lock is only held for the swap.
    fn write_out(&self) {
        let drained = {
            let mut caches = self.caches.lock().unwrap();
            std::mem::take(&mut *caches)
        };
        if drained.is_empty() {
            return;
        }
        let mut files = self.files.lock().unwrap();
        let result = write_caches(&mut files, &drained, &self.trip_index);
        self.store_error(result);
    }
}

fn write_caches(files: &mut Files, caches: &Caches, trip_index: &AtomicU64) -> OutputResult<()> {
    for r in &caches.systems {
        files.system.write_record(&[
            r.time_step.to_string(),
            r.generated.to_string(),
            r.active.to_string(),
            r.waiting.to_string(),
            r.completed.to_string(),
            format!("{:.4}", r.average_speed),
            format!("{:.6}", r.density),
        ])?;
    }

    for r in &caches.vehicles {
        let index = trip_index.fetch_add(1, Ordering::Relaxed) + 1;
        let path = format!(
            "[{}]",
            r.path_cells
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );
        files.vehicle.write_record(&[
            index.to_string(),
            r.vehicle_id.to_string(),
            r.acceleration.to_string(),
            format!("{:.4}", r.slowing_prob),
            r.origin.to_string(),
            r.destination.to_string(),
            r.in_time.to_string(),
            r.out_time.to_string(),
            format!("{:.4}", r.tag),
            r.closed.to_string(),
            r.path_length.to_string(),
            path,
        ])?;
    }

    for r in &caches.traces {
        files.trace.write_record(&[
            r.vehicle_id.to_string(),
            r.time.to_string(),
            r.cell.to_string(),
        ])?;
    }

    files.system.flush()?;
    files.vehicle.flush()?;
    files.trace.flush()?;
    Ok(())
}

impl Recorder for CsvRecorder {
    fn record_system(&self, record: &SystemRecord) {
        self.inner.caches.lock().unwrap().systems.push(*record);
    }

    fn record_vehicle(&self, record: &VehicleRecord) {
        self.inner.caches.lock().unwrap().vehicles.push(record.clone());
    }

    fn record_trace(&self, points: &[TraceRecord]) {
        self.inner
            .caches
            .lock()
            .unwrap()
            .traces
            .extend_from_slice(points);
    }

    fn flush(&self, _now: Tick) {
        if !self.background_flush {
            self.inner.write_out();
            return;
        }

        if self.inner.in_flight.swap(true, Ordering::AcqRel) {
            warn!("previous data write still running, skipping this flush");
            return;
        }
        self.join_pending();
        let inner = Arc::clone(&self.inner);
        let handle = std::thread::spawn(move || {
            inner.write_out();
            inner.in_flight.store(false, Ordering::Release);
        });
        *self.pending.lock().unwrap() = Some(handle);
    }

    fn finish(&self) {
        self.join_pending();
        self.inner.write_out();
    }
}
