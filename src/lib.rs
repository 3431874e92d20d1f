//! Unscented Kalman filter tracking a single object with a constant turn
//! rate and velocity (CTRV) model, fusing lidar position fixes and radar
//! range / bearing / range-rate readings.

pub mod accuracy;
pub mod config;
pub mod consistency;
pub mod dataset;
pub mod error;
pub mod filters;
pub mod types;

pub use accuracy::{calculate_rmse, Rmse};
pub use config::FilterConfig;
pub use consistency::{NisFileWriter, NisLogger, NisRecorder, NisReporter, NisSample, NisSummary};
pub use error::{FilterError, FilterResult};
pub use filters::{CtrvUkf, ProcessOutcome, UkfState};
pub use types::{GroundTruth, Measurement, MeasurementData, MeasurementRecord, SensorType};
