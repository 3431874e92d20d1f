//! Linear algebra type system for the CTRV tracker
//!
//! Provides compile-time dimension checking and clean type aliases
//! for every stage of the unscented filter.

use nalgebra::{SMatrix, SVector};

// ===== State Dimensions =====
pub const STATE_DIM: usize = 5; // (px, py, v, yaw, yaw_rate)
pub const NOISE_DIM: usize = 2; // (longitudinal accel, yaw accel)
pub const AUGMENTED_DIM: usize = STATE_DIM + NOISE_DIM;

// ===== Measurement Dimensions =====
pub const LIDAR_DIM: usize = 2; // (px, py)
pub const RADAR_DIM: usize = 3; // (rho, phi, rho_dot)

// ===== State Types =====
pub type StateVec = SVector<f64, STATE_DIM>;
pub type StateMat = SMatrix<f64, STATE_DIM, STATE_DIM>;

pub type AugmentedVec = SVector<f64, AUGMENTED_DIM>;
pub type AugmentedMat = SMatrix<f64, AUGMENTED_DIM, AUGMENTED_DIM>;

// ===== Measurement Types =====
pub type LidarVec = SVector<f64, LIDAR_DIM>;
pub type RadarVec = SVector<f64, RADAR_DIM>;

// ===== Sigma Point Types =====
pub const SIGMA_COUNT: usize = 2 * AUGMENTED_DIM + 1; // 15
pub type AugmentedSigmaPoints = SMatrix<f64, AUGMENTED_DIM, SIGMA_COUNT>;
pub type PredictedSigmaPoints = SMatrix<f64, STATE_DIM, SIGMA_COUNT>;
pub type SigmaWeights = SVector<f64, SIGMA_COUNT>;

/// Sigma points mapped into a `Z`-dimensional measurement space
pub type MeasurementSigmaPoints<const Z: usize> = SMatrix<f64, Z, SIGMA_COUNT>;

/// Kalman gain for a `Z`-dimensional measurement (5×Z)
pub type KalmanGain<const Z: usize> = SMatrix<f64, STATE_DIM, Z>;

// ===== State Indices =====
pub const IDX_PX: usize = 0;
pub const IDX_PY: usize = 1;
pub const IDX_V: usize = 2;
pub const IDX_YAW: usize = 3;
pub const IDX_YAW_RATE: usize = 4;
pub const IDX_NU_A: usize = 5;
pub const IDX_NU_YAWDD: usize = 6;

// ===== Radar Measurement Indices =====
pub const IDX_RHO: usize = 0;
pub const IDX_PHI: usize = 1;
pub const IDX_RHO_DOT: usize = 2;
