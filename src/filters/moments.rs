//! Unscented transform recombination
//!
//! Turns a set of weighted sigma points back into a mean and covariance.
//! Used for the process step (state space) and for both measurement spaces.

use nalgebra::{SMatrix, SVector};

use super::angle::normalize_angle;
use crate::types::{SigmaWeights, SIGMA_COUNT};

/// Mean and covariance of a `D`-dimensional distribution
#[derive(Clone, Debug, PartialEq)]
pub struct Moments<const D: usize> {
    pub mean: SVector<f64, D>,
    pub covariance: SMatrix<f64, D, D>,
}

/// Deviation of a sigma point from the mean, with the angular component wrapped
pub fn residual<const D: usize>(
    point: &SVector<f64, D>,
    mean: &SVector<f64, D>,
    angle_index: Option<usize>,
) -> SVector<f64, D> {
    let mut diff = point - mean;
    if let Some(idx) = angle_index {
        diff[idx] = normalize_angle(diff[idx]);
    }
    diff
}

/// Weighted recombination of sigma points into mean and covariance
///
/// `angle_index` names the component (heading or bearing) whose residuals
/// must be wrapped before entering the outer products. Its mean is taken as
/// the first sigma point plus the weighted wrapped offsets from it, which
/// equals the plain weighted sum unless the points straddle ±π.
pub fn recombine<const D: usize>(
    sigmas: &SMatrix<f64, D, SIGMA_COUNT>,
    weights: &SigmaWeights,
    angle_index: Option<usize>,
) -> Moments<D> {
    let mut mean: SVector<f64, D> = sigmas * weights;
    if let Some(idx) = angle_index {
        let reference = sigmas[(idx, 0)];
        let offset: f64 = (0..SIGMA_COUNT)
            .map(|i| weights[i] * normalize_angle(sigmas[(idx, i)] - reference))
            .sum();
        mean[idx] = reference + offset;
    }

    let mut covariance = SMatrix::<f64, D, D>::zeros();
    for i in 0..SIGMA_COUNT {
        let point: SVector<f64, D> = sigmas.column(i).into_owned();
        let diff = residual(&point, &mean, angle_index);
        covariance += diff * diff.transpose() * weights[i];
    }

    Moments { mean, covariance }
}

/// Force symmetry of a covariance matrix
pub fn symmetrize<const D: usize>(covariance: &SMatrix<f64, D, D>) -> SMatrix<f64, D, D> {
    (covariance + covariance.transpose()) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::sigma_points::sigma_weights;
    use crate::types::{PredictedSigmaPoints, IDX_YAW};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_identical_points_have_zero_covariance() {
        let column = SVector::<f64, 5>::new(1.0, 2.0, 3.0, 0.5, 0.1);
        let sigmas = PredictedSigmaPoints::from_fn(|r, _| column[r]);
        let m = recombine(&sigmas, &sigma_weights(-4.0), Some(IDX_YAW));
        assert_abs_diff_eq!((m.mean - column).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.covariance.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_heading_residual_is_wrapped() {
        // Offsets beyond +-pi are really offsets of -+(pi - 1)
        let weights = sigma_weights(1.0);
        let sigmas = SMatrix::<f64, 1, SIGMA_COUNT>::from_fn(|_, c| {
            if c == 0 {
                0.0
            } else if c % 2 == 0 {
                PI + 1.0
            } else {
                -(PI + 1.0)
            }
        });
        let wrapped = recombine(&sigmas, &weights, Some(0));
        let raw = recombine(&sigmas, &weights, None);
        assert_abs_diff_eq!(wrapped.covariance[(0, 0)], 0.875 * (PI - 1.0).powi(2), epsilon = 1e-9);
        assert_abs_diff_eq!(raw.covariance[(0, 0)], 0.875 * (PI + 1.0).powi(2), epsilon = 1e-9);
    }

    #[test]
    fn test_covariance_is_symmetric() {
        let weights = sigma_weights(-4.0);
        let sigmas = PredictedSigmaPoints::from_fn(|r, c| {
            ((r + 1) * (c + 3)) as f64 * 0.01 + (c as f64).sin()
        });
        let m = recombine(&sigmas, &weights, Some(IDX_YAW));
        let asymmetry = (m.covariance - m.covariance.transpose()).norm();
        assert_abs_diff_eq!(asymmetry, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_symmetrize() {
        let a = SMatrix::<f64, 2, 2>::new(1.0, 2.0, 4.0, 3.0);
        let s = symmetrize(&a);
        assert_eq!(s[(0, 1)], 3.0);
        assert_eq!(s[(1, 0)], 3.0);
        assert_eq!(s[(0, 0)], 1.0);
    }
}
