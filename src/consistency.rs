// consistency.rs: Normalized Innovation Squared (NIS) reporting.
//
// The filter hands every NIS value to a reporter after a correction. Reporters
// never feed anything back into the filter and must not fail it: I/O errors
// are logged and swallowed here.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::SensorType;

// ===== Chi-squared critical values (95%) =====
pub const CHI_SQUARED_95_2D: f64 = 5.991;
pub const CHI_SQUARED_95_3D: f64 = 7.815;

/// 95% chi-squared threshold for a sensor's measurement dimension
pub fn chi_squared_95(sensor: SensorType) -> f64 {
    match sensor {
        SensorType::Lidar => CHI_SQUARED_95_2D,
        SensorType::Radar => CHI_SQUARED_95_3D,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NisSample {
    pub sensor: SensorType,
    pub nis: f64,
    /// Measurement timestamp [microseconds]
    pub timestamp: i64,
}

/// Receives one NIS value per correction
pub trait NisReporter {
    fn report(&mut self, sample: NisSample);
}

/// Discards every sample
impl NisReporter for () {
    fn report(&mut self, _sample: NisSample) {}
}

/// Fan-out to two reporters
impl<A: NisReporter, B: NisReporter> NisReporter for (A, B) {
    fn report(&mut self, sample: NisSample) {
        self.0.report(sample);
        self.1.report(sample);
    }
}

/// Optional reporter, enabled at runtime
impl<R: NisReporter> NisReporter for Option<R> {
    fn report(&mut self, sample: NisSample) {
        if let Some(inner) = self {
            inner.report(sample);
        }
    }
}

impl<R: NisReporter + ?Sized> NisReporter for Box<R> {
    fn report(&mut self, sample: NisSample) {
        (**self).report(sample);
    }
}

// ─── In-memory recorder ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct NisSummary {
    pub count: usize,
    pub mean: f64,
    /// Share of samples above the 95% chi-squared threshold
    pub fraction_above_95: f64,
}

/// Keeps every sample for later consistency analysis
#[derive(Clone, Debug, Default)]
pub struct NisRecorder {
    samples: Vec<NisSample>,
}

impl NisRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[NisSample] {
        &self.samples
    }

    pub fn values(&self, sensor: SensorType) -> impl Iterator<Item = f64> + '_ {
        self.samples
            .iter()
            .filter(move |s| s.sensor == sensor)
            .map(|s| s.nis)
    }

    pub fn summary(&self, sensor: SensorType) -> NisSummary {
        let threshold = chi_squared_95(sensor);
        let (count, sum, above) = self.values(sensor).fold((0usize, 0.0, 0usize), |acc, nis| {
            (acc.0 + 1, acc.1 + nis, acc.2 + usize::from(nis > threshold))
        });
        if count == 0 {
            return NisSummary::default();
        }
        NisSummary {
            count,
            mean: sum / count as f64,
            fraction_above_95: above as f64 / count as f64,
        }
    }

    pub fn summaries(&self) -> HashMap<SensorType, NisSummary> {
        [SensorType::Lidar, SensorType::Radar]
            .into_iter()
            .map(|sensor| (sensor, self.summary(sensor)))
            .collect()
    }
}

impl NisReporter for NisRecorder {
    fn report(&mut self, sample: NisSample) {
        self.samples.push(sample);
    }
}

// ─── File writer ─────────────────────────────────────────────────────────────

/// Appends NIS values to one text file per sensor, one value per line
#[derive(Debug)]
pub struct NisFileWriter {
    lidar_path: PathBuf,
    radar_path: PathBuf,
}

impl NisFileWriter {
    pub const LIDAR_FILE: &'static str = "NIS_lidar";
    pub const RADAR_FILE: &'static str = "NIS_radar";

    /// Create (or truncate) both files inside `dir`
    pub fn create(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let lidar_path = dir.join(Self::LIDAR_FILE);
        let radar_path = dir.join(Self::RADAR_FILE);
        File::create(&lidar_path)?;
        File::create(&radar_path)?;
        log::debug!("NIS output: {} / {}", lidar_path.display(), radar_path.display());
        Ok(Self {
            lidar_path,
            radar_path,
        })
    }

    pub fn path(&self, sensor: SensorType) -> &Path {
        match sensor {
            SensorType::Lidar => &self.lidar_path,
            SensorType::Radar => &self.radar_path,
        }
    }

    fn append(&self, sample: &NisSample) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.path(sample.sensor))?;
        writeln!(file, "{}", sample.nis)
    }
}

impl NisReporter for NisFileWriter {
    fn report(&mut self, sample: NisSample) {
        if let Err(e) = self.append(&sample) {
            log::warn!(
                "Failed to write {} NIS to {}: {}",
                sample.sensor,
                self.path(sample.sensor).display(),
                e
            );
        }
    }
}

// ─── Log reporter ────────────────────────────────────────────────────────────

/// Emits every sample through the `log` facade, flagging threshold violations
#[derive(Clone, Copy, Debug, Default)]
pub struct NisLogger;

impl NisReporter for NisLogger {
    fn report(&mut self, sample: NisSample) {
        if sample.nis > chi_squared_95(sample.sensor) {
            log::debug!(
                "[NIS] {} {:.3} above 95% bound at t={}",
                sample.sensor,
                sample.nis,
                sample.timestamp
            );
        } else {
            log::trace!("[NIS] {} {:.3} at t={}", sample.sensor, sample.nis, sample.timestamp);
        }
    }
}
