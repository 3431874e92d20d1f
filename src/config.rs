// config.rs: Construction-time parameters for the CTRV unscented filter.
//
// Nothing here is mutated once a filter has been built; the filter keeps its
// own copy.

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::types::{SensorType, AUGMENTED_DIM};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    // ── Sensor gating ──
    pub use_lidar: bool,
    pub use_radar: bool,

    // ── Process noise ──
    /// Longitudinal acceleration noise std [m/s²]
    pub std_a: f64,
    /// Yaw acceleration noise std [rad/s²]
    pub std_yawdd: f64,

    // ── Lidar noise ──
    pub std_laspx: f64,
    pub std_laspy: f64,

    // ── Radar noise ──
    pub std_radr: f64,
    pub std_radphi: f64,
    pub std_radrd: f64,

    // ── Sigma point spreading ──
    /// `None` selects `3 - AUGMENTED_DIM`
    pub lambda: Option<f64>,

    // ── Initial prior ──
    pub initial_variance_velocity: f64,
    pub initial_variance_yaw: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            use_lidar: true,
            use_radar: true,
            std_a: 0.8,
            std_yawdd: 0.4,
            std_laspx: 0.15,
            std_laspy: 0.15,
            std_radr: 0.3,
            std_radphi: 0.03,
            std_radrd: 0.3,
            lambda: None,
            initial_variance_velocity: 2.0,
            initial_variance_yaw: 2.0,
        }
    }
}

impl FilterConfig {
    /// Spreading parameter actually used for sigma point placement
    pub fn spreading(&self) -> f64 {
        self.lambda.unwrap_or(3.0 - AUGMENTED_DIM as f64)
    }

    pub fn sensor_enabled(&self, sensor: SensorType) -> bool {
        match sensor {
            SensorType::Lidar => self.use_lidar,
            SensorType::Radar => self.use_radar,
        }
    }

    pub fn validate(&self) -> FilterResult<()> {
        let stds = [
            ("std_a", self.std_a),
            ("std_yawdd", self.std_yawdd),
            ("std_laspx", self.std_laspx),
            ("std_laspy", self.std_laspy),
            ("std_radr", self.std_radr),
            ("std_radphi", self.std_radphi),
            ("std_radrd", self.std_radrd),
            ("initial_variance_velocity", self.initial_variance_velocity),
            ("initial_variance_yaw", self.initial_variance_yaw),
        ];
        for (name, value) in stds {
            if !value.is_finite() || value <= 0.0 {
                return Err(FilterError::InvalidConfig(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }

        let lambda = self.spreading();
        if !lambda.is_finite() || lambda + AUGMENTED_DIM as f64 <= 0.0 {
            return Err(FilterError::InvalidConfig(format!(
                "lambda + {AUGMENTED_DIM} must be positive, got lambda = {lambda}"
            )));
        }
        Ok(())
    }
}
