use thiserror::Error;

use crate::types::SensorType;

/// Filter error types
///
/// `Diverged` and `SingularInnovation` mean the numerics can no longer be
/// trusted; the filter leaves its estimate untouched when returning them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Filter diverged: {stage} covariance is not positive definite")]
    Diverged { stage: &'static str },

    #[error("Singular innovation covariance for {sensor} update")]
    SingularInnovation { sensor: SensorType },

    #[error("Timestamp went backwards: {current} < {previous} (µs)")]
    NonMonotonicTimestamp { previous: i64, current: i64 },

    #[error("Invalid prediction time step: {0} s")]
    InvalidTimeStep(f64),

    #[error("Non-finite {sensor} measurement")]
    NonFiniteMeasurement { sensor: SensorType },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;
