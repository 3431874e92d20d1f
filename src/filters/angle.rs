use std::f64::consts::{PI, TAU};

/// Wrap an angle into (-π, π]
///
/// The result differs from the input by an integer multiple of 2π.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
