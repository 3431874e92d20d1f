//! Recorded measurement streams
//!
//! One record per line, whitespace separated:
//!
//! ```text
//! L  px  py  timestamp  [gt_px gt_py gt_vx gt_vy ...]
//! R  rho phi rho_dot timestamp  [gt_px gt_py gt_vx gt_vy ...]
//! ```
//!
//! Timestamps are microseconds. Ground truth columns beyond the first four
//! are ignored. Blank lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::types::{GroundTruth, Measurement, MeasurementRecord};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: unknown sensor tag '{tag}'")]
    UnknownSensor { line: usize, tag: String },

    #[error("line {line}: expected at least {expected} fields, found {found}")]
    MissingFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: incomplete ground truth ({found} of 4 values)")]
    PartialGroundTruth { line: usize, found: usize },
}

/// Load every record from `path`, decompressing `.gz` files on the fly
pub fn load(path: &Path) -> Result<Vec<MeasurementRecord>, DatasetError> {
    let file = File::open(path)?;
    let records = if path.extension().map(|e| e == "gz").unwrap_or(false) {
        read_records(BufReader::new(GzDecoder::new(file)))?
    } else {
        read_records(BufReader::new(file))?
    };
    log::debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<MeasurementRecord>, DatasetError> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        if let Some(record) = parse_line(&line?, idx + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Parse one line; `Ok(None)` for blank lines and comments
pub fn parse_line(text: &str, line: usize) -> Result<Option<MeasurementRecord>, DatasetError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = text.split_whitespace().collect();
    let number = |i: usize| -> Result<f64, DatasetError> {
        fields[i].parse::<f64>().map_err(|_| DatasetError::InvalidNumber {
            line,
            value: fields[i].to_string(),
        })
    };
    let timestamp = |i: usize| -> Result<i64, DatasetError> {
        fields[i].parse::<i64>().map_err(|_| DatasetError::InvalidNumber {
            line,
            value: fields[i].to_string(),
        })
    };
    let require = |expected: usize| -> Result<(), DatasetError> {
        if fields.len() < expected {
            return Err(DatasetError::MissingFields {
                line,
                expected,
                found: fields.len(),
            });
        }
        Ok(())
    };

    let (measurement, gt_start) = match fields[0] {
        "L" => {
            require(4)?;
            (Measurement::lidar(timestamp(3)?, number(1)?, number(2)?), 4)
        }
        "R" => {
            require(5)?;
            (
                Measurement::radar(timestamp(4)?, number(1)?, number(2)?, number(3)?),
                5,
            )
        }
        tag => {
            return Err(DatasetError::UnknownSensor {
                line,
                tag: tag.to_string(),
            })
        }
    };

    let ground_truth = match fields.len() - gt_start {
        0 => None,
        found if found < 4 => return Err(DatasetError::PartialGroundTruth { line, found }),
        _ => Some(GroundTruth {
            px: number(gt_start)?,
            py: number(gt_start + 1)?,
            vx: number(gt_start + 2)?,
            vy: number(gt_start + 3)?,
        }),
    };

    Ok(Some(MeasurementRecord {
        measurement,
        ground_truth,
    }))
}
