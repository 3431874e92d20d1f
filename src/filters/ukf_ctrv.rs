use nalgebra::{SVector, Vector4};
use serde::{Deserialize, Serialize};

use super::correction::{correct, Correction};
use super::measurement::{predict_measurement, LidarModel, MeasurementModel, RadarModel};
use super::moments::{recombine, symmetrize, Moments};
use super::process::predict_sigma_points;
use super::sigma_points::{sigma_weights, SigmaPointGenerator};
use crate::config::FilterConfig;
use crate::consistency::{NisReporter, NisSample};
use crate::error::{FilterError, FilterResult};
use crate::types::{
    LidarVec, Measurement, MeasurementData, PredictedSigmaPoints, RadarVec, SensorType,
    SigmaWeights, StateMat, StateVec, IDX_PX, IDX_PY, IDX_V, IDX_YAW, IDX_YAW_RATE,
};

/// What `process_measurement` did with a measurement
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProcessOutcome {
    /// First measurement: estimate set directly, no prediction or correction
    Initialized,
    /// Sensor disabled by configuration; state and timestamp untouched
    Skipped,
    /// Predicted to the measurement time and corrected
    Updated { sensor: SensorType, nis: f64 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UkfState {
    /// Position in the tracking frame [m]
    pub position: (f64, f64),

    /// Speed magnitude [m/s]
    pub speed: f64,

    /// Heading [rad] and heading rate [rad/s]
    pub yaw: f64,
    pub yaw_rate: f64,

    /// Cartesian velocity derived from speed and heading [m/s]
    pub velocity: (f64, f64),

    /// Covariance trace for uncertainty
    pub covariance_trace: f64,

    /// Last processed measurement time [microseconds]
    pub timestamp: Option<i64>,

    /// Update counters
    pub lidar_updates: u64,
    pub radar_updates: u64,
    pub skipped: u64,
}

impl UkfState {
    /// `[px, py, vx, vy]`
    pub fn to_cartesian(&self) -> Vector4<f64> {
        Vector4::new(self.position.0, self.position.1, self.velocity.0, self.velocity.1)
    }
}

/// Unscented Kalman filter with a CTRV motion model and lidar/radar updates
///
/// Drives the predict/update cycle over a time-ordered measurement stream.
/// Every NIS value is handed to the reporter `R` after a correction.
#[derive(Clone, Debug)]
pub struct CtrvUkf<R = ()> {
    config: FilterConfig,

    /// State vector [px, py, v, yaw, yaw_rate]
    state: StateVec,

    /// Covariance matrix [5x5]
    covariance: StateMat,

    weights: SigmaWeights,
    generator: SigmaPointGenerator,
    lidar: LidarModel,
    radar: RadarModel,

    /// Sigma points of the latest prediction, consumed by the next update
    predicted_sigmas: Option<PredictedSigmaPoints>,

    /// `None` until the first measurement has been seen
    last_timestamp: Option<i64>,

    nis_lidar: Option<f64>,
    nis_radar: Option<f64>,

    /// Update counters
    lidar_updates: u64,
    radar_updates: u64,
    skipped: u64,

    reporter: R,
}

impl CtrvUkf<()> {
    /// Create a filter that discards NIS values
    pub fn new(config: FilterConfig) -> FilterResult<Self> {
        Self::with_reporter(config, ())
    }
}

impl<R: NisReporter> CtrvUkf<R> {
    pub fn with_reporter(config: FilterConfig, reporter: R) -> FilterResult<Self> {
        config.validate()?;
        let lambda = config.spreading();

        Ok(Self {
            weights: sigma_weights(lambda),
            generator: SigmaPointGenerator::new(lambda, config.std_a, config.std_yawdd),
            lidar: LidarModel::from_config(&config),
            radar: RadarModel::from_config(&config),
            state: StateVec::zeros(),
            covariance: StateMat::zeros(),
            predicted_sigmas: None,
            last_timestamp: None,
            nis_lidar: None,
            nis_radar: None,
            lidar_updates: 0,
            radar_updates: 0,
            skipped: 0,
            reporter,
            config,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn state(&self) -> &StateVec {
        &self.state
    }

    pub fn covariance(&self) -> &StateMat {
        &self.covariance
    }

    pub fn is_initialized(&self) -> bool {
        self.last_timestamp.is_some()
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.last_timestamp
    }

    /// NIS of the most recent correction from `sensor`
    pub fn last_nis(&self, sensor: SensorType) -> Option<f64> {
        match sensor {
            SensorType::Lidar => self.nis_lidar,
            SensorType::Radar => self.nis_radar,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Get current state
    pub fn snapshot(&self) -> UkfState {
        let v = self.state[IDX_V];
        let (sin_yaw, cos_yaw) = self.state[IDX_YAW].sin_cos();
        UkfState {
            position: (self.state[IDX_PX], self.state[IDX_PY]),
            speed: v,
            yaw: self.state[IDX_YAW],
            yaw_rate: self.state[IDX_YAW_RATE],
            velocity: (v * cos_yaw, v * sin_yaw),
            covariance_trace: self.covariance.trace(),
            timestamp: self.last_timestamp,
            lidar_updates: self.lidar_updates,
            radar_updates: self.radar_updates,
            skipped: self.skipped,
        }
    }

    /// Set state manually (for testing/initialization)
    pub fn set_state(&mut self, state: StateVec, covariance: StateMat, timestamp: i64) {
        self.state = state;
        self.covariance = covariance;
        self.predicted_sigmas = None;
        self.last_timestamp = Some(timestamp);
    }

    /// Run one measurement through the filter
    ///
    /// The first measurement (of either sensor) initializes the estimate.
    /// Later measurements from a disabled sensor are skipped without touching
    /// the state or the timestamp. Otherwise the estimate is predicted to the
    /// measurement time and corrected. On error the estimate is unchanged.
    pub fn process_measurement(&mut self, measurement: &Measurement) -> FilterResult<ProcessOutcome> {
        let sensor = measurement.sensor_type();
        if !measurement.data.is_finite() {
            return Err(FilterError::NonFiniteMeasurement { sensor });
        }

        let Some(previous) = self.last_timestamp else {
            self.initialize(measurement);
            return Ok(ProcessOutcome::Initialized);
        };

        if !self.config.sensor_enabled(sensor) {
            self.skipped += 1;
            log::trace!("Skipping {} measurement at t={}", sensor, measurement.timestamp);
            return Ok(ProcessOutcome::Skipped);
        }

        if measurement.timestamp < previous {
            return Err(FilterError::NonMonotonicTimestamp {
                previous,
                current: measurement.timestamp,
            });
        }

        let dt = (measurement.timestamp - previous) as f64 / 1.0e6;
        let backup = (self.state, self.covariance, self.predicted_sigmas);

        self.predict(dt)?;
        let nis = match self.update(measurement) {
            Ok(nis) => nis,
            Err(e) => {
                (self.state, self.covariance, self.predicted_sigmas) = backup;
                return Err(e);
            }
        };
        self.last_timestamp = Some(measurement.timestamp);

        Ok(ProcessOutcome::Updated { sensor, nis })
    }

    /// Predict the estimate `dt` seconds ahead
    pub fn predict(&mut self, dt: f64) -> FilterResult<()> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(FilterError::InvalidTimeStep(dt));
        }

        let aug_sigmas = self.generator.generate(&self.state, &self.covariance)?;
        let predicted = predict_sigma_points(&aug_sigmas, dt);
        let Moments { mean, covariance } = recombine(&predicted, &self.weights, Some(IDX_YAW));

        self.state = mean;
        self.covariance = symmetrize(&covariance);
        self.predicted_sigmas = Some(predicted);
        log::trace!("Predicted {:.3}s ahead, trace(P)={:.4}", dt, self.covariance.trace());
        Ok(())
    }

    /// Fuse a measurement into the current (already predicted) estimate
    ///
    /// Uses the sigma points of the latest prediction; without one, the
    /// current estimate is re-sampled with a zero time step first. Reports
    /// the NIS and returns it.
    pub fn update(&mut self, measurement: &Measurement) -> FilterResult<f64> {
        let sigmas = match self.predicted_sigmas {
            Some(sigmas) => sigmas,
            None => {
                let aug_sigmas = self.generator.generate(&self.state, &self.covariance)?;
                predict_sigma_points(&aug_sigmas, 0.0)
            }
        };

        let sensor = measurement.sensor_type();
        let nis = match measurement.data {
            MeasurementData::Lidar { px, py } => {
                let c = self.fuse(&self.lidar, &sigmas, &LidarVec::new(px, py))?;
                self.lidar_updates += 1;
                self.nis_lidar = Some(c.nis);
                (self.state, self.covariance) = (c.state, c.covariance);
                c.nis
            }
            MeasurementData::Radar { rho, phi, rho_dot } => {
                let c = self.fuse(&self.radar, &sigmas, &RadarVec::new(rho, phi, rho_dot))?;
                self.radar_updates += 1;
                self.nis_radar = Some(c.nis);
                (self.state, self.covariance) = (c.state, c.covariance);
                c.nis
            }
        };
        self.predicted_sigmas = None;

        log::trace!("{} update at t={}: NIS={:.3}", sensor, measurement.timestamp, nis);
        self.reporter.report(NisSample {
            sensor,
            nis,
            timestamp: measurement.timestamp,
        });
        Ok(nis)
    }

    fn fuse<M, const Z: usize>(
        &self,
        model: &M,
        sigmas: &PredictedSigmaPoints,
        z: &SVector<f64, Z>,
    ) -> FilterResult<Correction<Z>>
    where
        M: MeasurementModel<Z>,
    {
        let predicted = predict_measurement(model, sigmas, &self.weights);
        correct(
            &self.state,
            &self.covariance,
            sigmas,
            &self.weights,
            &predicted,
            z,
            M::ANGLE_INDEX,
            M::SENSOR,
        )
    }

    /// Set the estimate straight from the first measurement
    fn initialize(&mut self, measurement: &Measurement) {
        self.state = match measurement.data {
            MeasurementData::Lidar { px, py } => StateVec::new(px, py, 0.0, 0.0, 0.0),
            // Rough heuristic: range rate stands in for speed and bearing for heading
            MeasurementData::Radar { rho, phi, rho_dot } => {
                let (sin_phi, cos_phi) = phi.sin_cos();
                StateVec::new(rho * cos_phi, rho * sin_phi, rho_dot, phi, 0.0)
            }
        };
        self.covariance = initial_covariance(&self.config);
        self.predicted_sigmas = None;
        self.last_timestamp = Some(measurement.timestamp);

        log::debug!(
            "UKF initialized from {} at t={}: px={:.3}, py={:.3}",
            measurement.sensor_type(),
            measurement.timestamp,
            self.state[IDX_PX],
            self.state[IDX_PY]
        );
    }
}

/// Prior covariance: identity, inflated on speed and heading
pub fn initial_covariance(config: &FilterConfig) -> StateMat {
    let mut p = StateMat::identity();
    p[(IDX_V, IDX_V)] = config.initial_variance_velocity;
    p[(IDX_YAW, IDX_YAW)] = config.initial_variance_yaw;
    p
}
