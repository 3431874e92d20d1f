use nalgebra::Cholesky;

use crate::error::{FilterError, FilterResult};
use crate::types::{
    AugmentedMat, AugmentedSigmaPoints, AugmentedVec, SigmaWeights, StateMat, StateVec,
    AUGMENTED_DIM, IDX_NU_A, IDX_NU_YAWDD, SIGMA_COUNT, STATE_DIM,
};

/// Sigma point weights for spreading parameter `lambda`
///
/// `w0 = λ / (λ + n_aug)`, every other weight is `1 / (2 (λ + n_aug))`.
/// The same weights are used for the mean and the covariance.
pub fn sigma_weights(lambda: f64) -> SigmaWeights {
    let denom = lambda + AUGMENTED_DIM as f64;
    let mut weights = SigmaWeights::from_element(0.5 / denom);
    weights[0] = lambda / denom;
    weights
}

/// Builds augmented sigma points from the current estimate
#[derive(Clone, Debug)]
pub struct SigmaPointGenerator {
    lambda: f64,
    /// Process noise variances (σ_a², σ_yawdd²)
    noise_var: (f64, f64),
}

impl SigmaPointGenerator {
    pub fn new(lambda: f64, std_a: f64, std_yawdd: f64) -> Self {
        Self {
            lambda,
            noise_var: (std_a * std_a, std_yawdd * std_yawdd),
        }
    }

    /// Augmented mean: the state followed by zero-mean process noise
    pub fn augmented_mean(&self, x: &StateVec) -> AugmentedVec {
        let mut x_aug = AugmentedVec::zeros();
        x_aug.fixed_rows_mut::<STATE_DIM>(0).copy_from(x);
        x_aug
    }

    /// Augmented covariance: P with the process noise block on the diagonal
    pub fn augmented_covariance(&self, p: &StateMat) -> AugmentedMat {
        let mut p_aug = AugmentedMat::zeros();
        p_aug
            .fixed_view_mut::<STATE_DIM, STATE_DIM>(0, 0)
            .copy_from(p);
        p_aug[(IDX_NU_A, IDX_NU_A)] = self.noise_var.0;
        p_aug[(IDX_NU_YAWDD, IDX_NU_YAWDD)] = self.noise_var.1;
        p_aug
    }

    /// Generate the 2·n_aug + 1 augmented sigma points as columns
    ///
    /// Column 0 is the augmented mean; columns `1 + i` and `1 + n_aug + i` are
    /// the mean plus/minus `sqrt(λ + n_aug)` times column `i` of the lower
    /// Cholesky factor. Fails with `Diverged` when the augmented covariance
    /// is not positive definite.
    pub fn generate(&self, x: &StateVec, p: &StateMat) -> FilterResult<AugmentedSigmaPoints> {
        let x_aug = self.augmented_mean(x);
        let p_aug = self.augmented_covariance(p);

        let l = Cholesky::new(p_aug)
            .ok_or(FilterError::Diverged {
                stage: "augmented state",
            })?
            .l();

        let scale = (self.lambda + AUGMENTED_DIM as f64).sqrt();
        let mut sigmas = AugmentedSigmaPoints::zeros();
        sigmas.set_column(0, &x_aug);
        for i in 0..AUGMENTED_DIM {
            let offset = l.column(i) * scale;
            sigmas.set_column(i + 1, &(x_aug + offset));
            sigmas.set_column(i + 1 + AUGMENTED_DIM, &(x_aug - offset));
        }
        debug_assert_eq!(sigmas.ncols(), SIGMA_COUNT);

        Ok(sigmas)
    }
}
