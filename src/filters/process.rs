//! Constant Turn Rate and Velocity (CTRV) motion model
//!
//! Propagates augmented sigma points (state + process noise) by `dt` seconds.
//! Noise enters as longitudinal acceleration `nu_a` and yaw acceleration
//! `nu_yawdd`, both held constant over the interval.

use crate::types::{
    AugmentedSigmaPoints, AugmentedVec, PredictedSigmaPoints, StateVec, IDX_NU_A, IDX_NU_YAWDD,
    IDX_PX, IDX_PY, IDX_V, IDX_YAW, IDX_YAW_RATE, SIGMA_COUNT,
};

/// Below this yaw rate [rad/s] the straight-line limit is used
pub const YAW_RATE_EPSILON: f64 = 1e-6;

/// Propagate a single augmented sigma point
pub fn ctrv_transition(sigma: &AugmentedVec, dt: f64) -> StateVec {
    let px = sigma[IDX_PX];
    let py = sigma[IDX_PY];
    let v = sigma[IDX_V];
    let yaw = sigma[IDX_YAW];
    let yaw_rate = sigma[IDX_YAW_RATE];
    let nu_a = sigma[IDX_NU_A];
    let nu_yawdd = sigma[IDX_NU_YAWDD];

    let dt2 = dt * dt;
    let (sin_yaw, cos_yaw) = yaw.sin_cos();

    let (mut px_p, mut py_p) = if yaw_rate.abs() > YAW_RATE_EPSILON {
        let yaw_end = yaw + yaw_rate * dt;
        let radius = v / yaw_rate;
        (
            px + radius * (yaw_end.sin() - sin_yaw),
            py + radius * (cos_yaw - yaw_end.cos()),
        )
    } else {
        (px + v * dt * cos_yaw, py + v * dt * sin_yaw)
    };

    // Noise contribution
    px_p += 0.5 * nu_a * dt2 * cos_yaw;
    py_p += 0.5 * nu_a * dt2 * sin_yaw;
    let v_p = v + nu_a * dt;
    let yaw_p = yaw + yaw_rate * dt + 0.5 * nu_yawdd * dt2;
    let yaw_rate_p = yaw_rate + nu_yawdd * dt;

    StateVec::new(px_p, py_p, v_p, yaw_p, yaw_rate_p)
}

/// Propagate every augmented sigma point (one per column)
pub fn predict_sigma_points(sigmas: &AugmentedSigmaPoints, dt: f64) -> PredictedSigmaPoints {
    let mut predicted = PredictedSigmaPoints::zeros();
    for i in 0..SIGMA_COUNT {
        let sigma: AugmentedVec = sigmas.column(i).into_owned();
        predicted.set_column(i, &ctrv_transition(&sigma, dt));
    }
    predicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn aug(
        px: f64,
        py: f64,
        v: f64,
        yaw: f64,
        yaw_rate: f64,
        nu_a: f64,
        nu_yawdd: f64,
    ) -> AugmentedVec {
        AugmentedVec::from_column_slice(&[px, py, v, yaw, yaw_rate, nu_a, nu_yawdd])
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let sigma = aug(1.0, -2.0, 3.0, 0.7, 0.4, 0.5, -0.3);
        let out = ctrv_transition(&sigma, 0.0);
        let expected = StateVec::new(1.0, -2.0, 3.0, 0.7, 0.4);
        assert_abs_diff_eq!((out - expected).norm(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_straight_line() {
        let sigma = aug(0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0);
        let out = ctrv_transition(&sigma, 1.5);
        assert_abs_diff_eq!(out[IDX_PX], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[IDX_PY], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[IDX_V], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[IDX_YAW], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quarter_turn() {
        // v = 1, yaw_rate = pi/2: after 1 s a quarter circle of radius 2/pi
        let sigma = aug(0.0, 0.0, 1.0, 0.0, FRAC_PI_2, 0.0, 0.0);
        let out = ctrv_transition(&sigma, 1.0);
        let r = 1.0 / FRAC_PI_2;
        assert_abs_diff_eq!(out[IDX_PX], r, epsilon = 1e-12);
        assert_abs_diff_eq!(out[IDX_PY], r, epsilon = 1e-12);
        assert_abs_diff_eq!(out[IDX_YAW], FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(out[IDX_YAW_RATE], FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_tiny_yaw_rate_matches_straight_line() {
        let straight = ctrv_transition(&aug(1.0, 1.0, 5.0, 0.3, 0.0, 0.0, 0.0), 0.1);
        let tiny = ctrv_transition(&aug(1.0, 1.0, 5.0, 0.3, 1e-7, 0.0, 0.0), 0.1);
        assert_abs_diff_eq!(straight[IDX_PX], tiny[IDX_PX], epsilon = 1e-6);
        assert_abs_diff_eq!(straight[IDX_PY], tiny[IDX_PY], epsilon = 1e-6);
        assert!(tiny.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_noise_terms() {
        let sigma = aug(0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 1.0);
        let out = ctrv_transition(&sigma, 0.5);
        assert_abs_diff_eq!(out[IDX_PX], 0.5 * 2.0 * 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(out[IDX_PY], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[IDX_V], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[IDX_YAW], 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(out[IDX_YAW_RATE], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_known_sigma_column() {
        // Reference values for the first column of a standard CTRV prediction
        let sigma = aug(5.7441, 1.38, 2.2049, 0.5015, 0.3528, 0.0, 0.0);
        let out = ctrv_transition(&sigma, 0.1);
        assert_abs_diff_eq!(out[IDX_PX], 5.93553, epsilon = 1e-5);
        assert_abs_diff_eq!(out[IDX_PY], 1.48939, epsilon = 1e-5);
        assert_abs_diff_eq!(out[IDX_V], 2.2049, epsilon = 1e-5);
        assert_abs_diff_eq!(out[IDX_YAW], 0.53678, epsilon = 1e-5);
        assert_abs_diff_eq!(out[IDX_YAW_RATE], 0.3528, epsilon = 1e-5);
    }
}
