//! Root-mean-square error of estimates against ground truth

use nalgebra::Vector4;
use serde::Serialize;

/// Component-wise RMSE over `[px, py, vx, vy]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rmse {
    pub value: Vector4<f64>,
    /// False when the inputs were empty or of different lengths
    pub valid: bool,
}

impl Rmse {
    fn invalid() -> Self {
        Self {
            value: Vector4::zeros(),
            valid: false,
        }
    }
}

pub fn calculate_rmse(estimations: &[Vector4<f64>], ground_truth: &[Vector4<f64>]) -> Rmse {
    if estimations.is_empty() || estimations.len() != ground_truth.len() {
        log::warn!(
            "Invalid data to calculate the RMSE: {} estimations, {} ground truth samples",
            estimations.len(),
            ground_truth.len()
        );
        return Rmse::invalid();
    }

    let sum_sq = estimations
        .iter()
        .zip(ground_truth)
        .fold(Vector4::zeros(), |acc: Vector4<f64>, (est, gt)| {
            let residual = est - gt;
            acc + residual.component_mul(&residual)
        });

    Rmse {
        value: (sum_sq / estimations.len() as f64).map(f64::sqrt),
        valid: true,
    }
}
