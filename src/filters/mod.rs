pub mod angle;
pub mod correction;
pub mod measurement;
pub mod moments;
pub mod process;
pub mod sigma_points;
pub mod ukf_ctrv;

pub use angle::normalize_angle;
pub use correction::{correct, Correction};
pub use measurement::{predict_measurement, LidarModel, MeasurementModel, PredictedMeasurement, RadarModel};
pub use moments::{recombine, Moments};
pub use process::{ctrv_transition, predict_sigma_points};
pub use sigma_points::{sigma_weights, SigmaPointGenerator};
pub use ukf_ctrv::{CtrvUkf, ProcessOutcome, UkfState};
