//! Unscented Kalman correction
//!
//! Fuses a real measurement into the predicted estimate using the
//! cross-covariance of state and measurement sigma points.

use nalgebra::{Cholesky, SMatrix, SVector};

use super::measurement::PredictedMeasurement;
use super::moments::{residual, symmetrize};
use crate::error::{FilterError, FilterResult};
use crate::types::{
    KalmanGain, PredictedSigmaPoints, SensorType, SigmaWeights, StateMat, StateVec, IDX_YAW,
    SIGMA_COUNT,
};

/// Outcome of fusing one measurement into the estimate
#[derive(Clone, Debug)]
pub struct Correction<const Z: usize> {
    pub state: StateVec,
    pub covariance: StateMat,
    pub gain: KalmanGain<Z>,
    /// Actual minus predicted measurement, angle wrapped
    pub innovation: SVector<f64, Z>,
    /// Normalized Innovation Squared: yᵀ S⁻¹ y
    pub nis: f64,
}

/// Cross-covariance between state and measurement sigma point residuals
pub fn cross_covariance<const Z: usize>(
    x: &StateVec,
    x_sigmas: &PredictedSigmaPoints,
    predicted: &PredictedMeasurement<Z>,
    weights: &SigmaWeights,
    z_angle_index: Option<usize>,
) -> KalmanGain<Z> {
    let mut tc = KalmanGain::<Z>::zeros();
    for i in 0..SIGMA_COUNT {
        let x_point: StateVec = x_sigmas.column(i).into_owned();
        let z_point: SVector<f64, Z> = predicted.sigma_points.column(i).into_owned();
        let x_diff = residual(&x_point, x, Some(IDX_YAW));
        let z_diff = residual(&z_point, &predicted.mean, z_angle_index);
        tc += x_diff * z_diff.transpose() * weights[i];
    }
    tc
}

/// Inverse of the innovation covariance via its Cholesky factor
fn invert_innovation<const Z: usize>(
    s: &SMatrix<f64, Z, Z>,
    sensor: SensorType,
) -> FilterResult<SMatrix<f64, Z, Z>> {
    if !s.iter().all(|v| v.is_finite()) {
        return Err(FilterError::SingularInnovation { sensor });
    }
    Cholesky::new(*s)
        .map(|chol| chol.inverse())
        .ok_or(FilterError::SingularInnovation { sensor })
}

/// Unscented Kalman correction
///
/// `K = Tc S⁻¹`, `x += K y`, `P -= K S Kᵀ`. The covariance is symmetrised
/// before it is returned. Nothing is mutated; the caller commits the result.
#[allow(clippy::too_many_arguments)]
pub fn correct<const Z: usize>(
    x: &StateVec,
    p: &StateMat,
    x_sigmas: &PredictedSigmaPoints,
    weights: &SigmaWeights,
    predicted: &PredictedMeasurement<Z>,
    z: &SVector<f64, Z>,
    z_angle_index: Option<usize>,
    sensor: SensorType,
) -> FilterResult<Correction<Z>> {
    let s_inv = invert_innovation(&predicted.covariance, sensor)?;
    let tc = cross_covariance(x, x_sigmas, predicted, weights, z_angle_index);
    let gain = tc * s_inv;

    let innovation = residual(z, &predicted.mean, z_angle_index);
    let state = x + gain * innovation;
    let covariance = symmetrize(&(p - gain * predicted.covariance * gain.transpose()));
    let nis = innovation.dot(&(s_inv * innovation));

    Ok(Correction {
        state,
        covariance,
        gain,
        innovation,
        nis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::measurement::{predict_measurement, LidarModel, MeasurementModel, RadarModel};
    use crate::filters::moments::recombine;
    use crate::filters::process::predict_sigma_points;
    use crate::filters::sigma_points::{sigma_weights, SigmaPointGenerator};
    use crate::types::{LidarVec, RadarVec, IDX_PHI, IDX_PX, IDX_PY, LIDAR_DIM};
    use approx::assert_abs_diff_eq;

    struct Prepared {
        x: StateVec,
        p: StateMat,
        x_sigmas: PredictedSigmaPoints,
        weights: SigmaWeights,
    }

    fn prepare(x0: StateVec, dt: f64) -> Prepared {
        let generator = SigmaPointGenerator::new(-4.0, 0.8, 0.4);
        let weights = sigma_weights(-4.0);
        let aug = generator.generate(&x0, &StateMat::identity()).unwrap();
        let x_sigmas = predict_sigma_points(&aug, dt);
        let m = recombine(&x_sigmas, &weights, Some(IDX_YAW));
        Prepared {
            x: m.mean,
            p: m.covariance,
            x_sigmas,
            weights,
        }
    }

    #[test]
    fn test_lidar_correction_pulls_toward_measurement() {
        let s = prepare(StateVec::new(1.0, 1.0, 0.0, 0.0, 0.0), 0.1);
        let model = LidarModel::new(0.15, 0.15);
        let predicted = predict_measurement(&model, &s.x_sigmas, &s.weights);
        let z = LidarVec::new(1.1, 1.1);

        let c = correct(&s.x, &s.p, &s.x_sigmas, &s.weights, &predicted, &z, None, SensorType::Lidar)
            .expect("lidar correction");

        assert!(c.state[IDX_PX] > s.x[IDX_PX] && c.state[IDX_PX] < 1.1);
        assert!(c.state[IDX_PY] > s.x[IDX_PY] && c.state[IDX_PY] < 1.1);
        assert!(c.covariance.trace() < s.p.trace());
        let asymmetry = (c.covariance - c.covariance.transpose()).norm();
        assert_abs_diff_eq!(asymmetry, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nis_matches_definition() {
        let s = prepare(StateVec::new(3.0, -2.0, 1.0, 0.3, 0.1), 0.05);
        let model = LidarModel::new(0.15, 0.15);
        let predicted = predict_measurement(&model, &s.x_sigmas, &s.weights);
        let z = LidarVec::new(3.2, -2.1);

        let c = correct(&s.x, &s.p, &s.x_sigmas, &s.weights, &predicted, &z, None, SensorType::Lidar)
            .expect("lidar correction");

        let y = z - predicted.mean;
        let s_inv = predicted.covariance.try_inverse().unwrap();
        let expected = (y.transpose() * s_inv * y)[(0, 0)];
        assert_abs_diff_eq!(c.nis, expected, epsilon = 1e-9);
        assert!(c.nis >= 0.0);
    }

    #[test]
    fn test_radar_innovation_bearing_is_wrapped() {
        // Object behind the sensor, bearing near +pi; measurement reported near -pi
        let s = prepare(StateVec::new(-10.0, 0.05, 1.0, 3.1, 0.0), 0.1);
        let model = RadarModel::new(0.3, 0.03, 0.3);
        let predicted = predict_measurement(&model, &s.x_sigmas, &s.weights);
        let mut z: RadarVec = model.measure(&s.x);
        z[IDX_PHI] -= std::f64::consts::TAU;

        let c = correct(
            &s.x,
            &s.p,
            &s.x_sigmas,
            &s.weights,
            &predicted,
            &z,
            Some(IDX_PHI),
            SensorType::Radar,
        )
        .unwrap();

        assert!(c.innovation[IDX_PHI].abs() < 0.1);
        assert!((c.state - s.x).norm() < 1.0);
    }

    #[test]
    fn test_singular_innovation_is_reported() {
        let s = prepare(StateVec::new(1.0, 1.0, 0.0, 0.0, 0.0), 0.1);
        let predicted = PredictedMeasurement::<LIDAR_DIM> {
            sigma_points: SMatrix::zeros(),
            mean: LidarVec::zeros(),
            covariance: SMatrix::zeros(),
        };
        let err = correct(
            &s.x,
            &s.p,
            &s.x_sigmas,
            &s.weights,
            &predicted,
            &LidarVec::new(1.0, 1.0),
            None,
            SensorType::Lidar,
        )
        .unwrap_err();
        assert_eq!(
            err,
            FilterError::SingularInnovation {
                sensor: SensorType::Lidar
            }
        );
    }
}
