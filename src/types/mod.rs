pub mod linalg;

pub use linalg::*;

use nalgebra::Vector4;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which physical sensor produced a measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    /// Cartesian position sensor
    Lidar,
    /// Range / bearing / range-rate sensor
    Radar,
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorType::Lidar => write!(f, "lidar"),
            SensorType::Radar => write!(f, "radar"),
        }
    }
}

/// Raw measurement payload, tagged by sensor
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sensor", rename_all = "lowercase")]
pub enum MeasurementData {
    /// Position in the tracking frame [m]
    Lidar { px: f64, py: f64 },
    /// Range [m], bearing [rad], range rate [m/s]
    Radar { rho: f64, phi: f64, rho_dot: f64 },
}

impl MeasurementData {
    pub fn sensor_type(&self) -> SensorType {
        match self {
            MeasurementData::Lidar { .. } => SensorType::Lidar,
            MeasurementData::Radar { .. } => SensorType::Radar,
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            MeasurementData::Lidar { px, py } => px.is_finite() && py.is_finite(),
            MeasurementData::Radar { rho, phi, rho_dot } => {
                rho.is_finite() && phi.is_finite() && rho_dot.is_finite()
            }
        }
    }
}

/// A single timestamped sensor reading
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Capture time [microseconds]
    pub timestamp: i64,
    #[serde(flatten)]
    pub data: MeasurementData,
}

impl Measurement {
    pub fn lidar(timestamp: i64, px: f64, py: f64) -> Self {
        Self {
            timestamp,
            data: MeasurementData::Lidar { px, py },
        }
    }

    pub fn radar(timestamp: i64, rho: f64, phi: f64, rho_dot: f64) -> Self {
        Self {
            timestamp,
            data: MeasurementData::Radar { rho, phi, rho_dot },
        }
    }

    pub fn sensor_type(&self) -> SensorType {
        self.data.sensor_type()
    }
}

/// Reference trajectory sample accompanying a measurement in recorded datasets
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub px: f64,
    pub py: f64,
    pub vx: f64,
    pub vy: f64,
}

impl GroundTruth {
    /// `[px, py, vx, vy]`, the layout compared by the accuracy metrics
    pub fn as_vector(&self) -> Vector4<f64> {
        Vector4::new(self.px, self.py, self.vx, self.vy)
    }
}

/// One line of a recorded measurement stream
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub measurement: Measurement,
    pub ground_truth: Option<GroundTruth>,
}
