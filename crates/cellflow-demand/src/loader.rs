//! CSV demand-curve loading.
//!
//! Expected shape: a header row, then one record per time-of-day step with
//! the demand value in the second column:
//!
//! ```csv
//! time,demand
//! 0,1.25
//! 1,0.80
//! ```

use std::io::Read;
use std::path::Path;

use crate::curve::DemandCurve;
use crate::error::{DemandError, DemandResult};

impl DemandCurve {
    /// Load a curve from any CSV reader.  An empty or headers-only file is a
    /// startup error.
    pub fn from_csv_reader<R: Read>(reader: R) -> DemandResult<DemandCurve> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut values = Vec::new();
        for (i, record) in csv.records().enumerate() {
            let record = record?;
            if record.len() < 2 {
                return Err(DemandError::ShortRecord {
                    record: i + 1,
                    got: record.len(),
                });
            }
            let raw = &record[1];
            let value: f64 = raw.parse().map_err(|_| DemandError::Parse {
                record: i + 1,
                value: raw.to_string(),
            })?;
            values.push(value);
        }

        if values.is_empty() {
            return Err(DemandError::EmptyCurve);
        }
        Ok(DemandCurve::new(values))
    }

    /// Load a curve from a CSV file on disk.
    pub fn from_csv_path(path: &Path) -> DemandResult<DemandCurve> {
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        Self::from_csv_reader(file)
    }
}
