//! Sensor measurement models
//!
//! Each model maps a predicted state sigma point into its sensor's
//! measurement space and carries that sensor's additive noise.

use nalgebra::{SMatrix, SVector};

use super::moments::{recombine, Moments};
use crate::config::FilterConfig;
use crate::types::{
    LidarVec, MeasurementSigmaPoints, PredictedSigmaPoints, RadarVec, SensorType, SigmaWeights,
    StateVec, IDX_PHI, IDX_PX, IDX_PY, IDX_V, IDX_YAW, LIDAR_DIM, RADAR_DIM, SIGMA_COUNT,
};

/// Range below which the range-rate projection divides by `MIN_RANGE` instead
pub const MIN_RANGE: f64 = 1e-4;

/// Maps state space into a `Z`-dimensional measurement space
pub trait MeasurementModel<const Z: usize> {
    const SENSOR: SensorType;

    /// Index of the angular measurement component, if any
    const ANGLE_INDEX: Option<usize>;

    /// Noise-free measurement of a single state
    fn measure(&self, x: &StateVec) -> SVector<f64, Z>;

    /// Additive measurement noise covariance R
    fn noise(&self) -> SMatrix<f64, Z, Z>;
}

/// Predicted measurement distribution plus the sigma points it came from
#[derive(Clone, Debug)]
pub struct PredictedMeasurement<const Z: usize> {
    pub sigma_points: MeasurementSigmaPoints<Z>,
    pub mean: SVector<f64, Z>,
    /// Innovation covariance S, sensor noise included
    pub covariance: SMatrix<f64, Z, Z>,
}

/// Transform predicted state sigma points through `model` and recombine them
pub fn predict_measurement<M, const Z: usize>(
    model: &M,
    x_sigmas: &PredictedSigmaPoints,
    weights: &SigmaWeights,
) -> PredictedMeasurement<Z>
where
    M: MeasurementModel<Z>,
{
    let mut z_sigmas = MeasurementSigmaPoints::<Z>::zeros();
    for i in 0..SIGMA_COUNT {
        let x: StateVec = x_sigmas.column(i).into_owned();
        z_sigmas.set_column(i, &model.measure(&x));
    }

    let Moments { mean, covariance } = recombine(&z_sigmas, weights, M::ANGLE_INDEX);

    PredictedMeasurement {
        sigma_points: z_sigmas,
        mean,
        covariance: covariance + model.noise(),
    }
}

// ─── Lidar ───────────────────────────────────────────────────────────────────

/// Position sensor: observes (px, py) directly
#[derive(Clone, Debug)]
pub struct LidarModel {
    noise: SMatrix<f64, LIDAR_DIM, LIDAR_DIM>,
}

impl LidarModel {
    pub fn new(std_px: f64, std_py: f64) -> Self {
        Self {
            noise: SMatrix::<f64, LIDAR_DIM, LIDAR_DIM>::from_diagonal(&LidarVec::new(
                std_px * std_px,
                std_py * std_py,
            )),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.std_laspx, config.std_laspy)
    }
}

impl MeasurementModel<LIDAR_DIM> for LidarModel {
    const SENSOR: SensorType = SensorType::Lidar;
    const ANGLE_INDEX: Option<usize> = None;

    fn measure(&self, x: &StateVec) -> LidarVec {
        LidarVec::new(x[IDX_PX], x[IDX_PY])
    }

    fn noise(&self) -> SMatrix<f64, LIDAR_DIM, LIDAR_DIM> {
        self.noise
    }
}

// ─── Radar ───────────────────────────────────────────────────────────────────

/// Range / bearing / range-rate sensor located at the origin
#[derive(Clone, Debug)]
pub struct RadarModel {
    noise: SMatrix<f64, RADAR_DIM, RADAR_DIM>,
}

impl RadarModel {
    pub fn new(std_rho: f64, std_phi: f64, std_rho_dot: f64) -> Self {
        Self {
            noise: SMatrix::<f64, RADAR_DIM, RADAR_DIM>::from_diagonal(&RadarVec::new(
                std_rho * std_rho,
                std_phi * std_phi,
                std_rho_dot * std_rho_dot,
            )),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.std_radr, config.std_radphi, config.std_radrd)
    }
}

impl MeasurementModel<RADAR_DIM> for RadarModel {
    const SENSOR: SensorType = SensorType::Radar;
    const ANGLE_INDEX: Option<usize> = Some(IDX_PHI);

    fn measure(&self, x: &StateVec) -> RadarVec {
        let px = x[IDX_PX];
        let py = x[IDX_PY];
        let v = x[IDX_V];
        let (sin_yaw, cos_yaw) = x[IDX_YAW].sin_cos();

        let rho = px.hypot(py);
        let phi = py.atan2(px);
        // At the origin the radial direction is undefined; clamp the divisor
        let rho_dot = (px * cos_yaw * v + py * sin_yaw * v) / rho.max(MIN_RANGE);

        RadarVec::new(rho, phi, rho_dot)
    }

    fn noise(&self) -> SMatrix<f64, RADAR_DIM, RADAR_DIM> {
        self.noise
    }
}
