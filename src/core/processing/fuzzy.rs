use ndarray::{Array2, Zip};

use crate::types::{DistanceField, FuzzyParameters};

/// Decay steepness from apparent object width.
///
/// `a = object_width * visual_arc * distance_multiplier` is the distance up to
/// which an object of that width stays resolvable; `visual_arc` is a plain
/// scale factor calibrated at 1. Decay starts at `b1`, so `b2 = max(a - b1, 1)`.
pub fn derive_b2(object_width: f64, b1: f64, visual_arc: f64, distance_multiplier: f64) -> f64 {
    let a = object_width * visual_arc * distance_multiplier;
    (a - b1).max(1.0)
}

/// Membership of a single distance: 1 inside `b1`, then `1 / (1 + 2((d - b1) / b2)^2)`.
#[inline]
pub fn membership(d: f64, b1: f64, b2: f64) -> f64 {
    if d <= b1 {
        1.0
    } else {
        let t = (d - b1) / b2;
        1.0 / (1.0 + 2.0 * t * t)
    }
}

/// Per-cell membership over a distance field.
pub fn compute_membership(distances: &DistanceField, params: FuzzyParameters) -> Array2<f64> {
    let FuzzyParameters { b1, b2 } = params;
    let mut out = Array2::<f64>::zeros(distances.dim());
    Zip::from(&mut out)
        .and(distances)
        .par_for_each(|m, &d| *m = membership(d, b1, b2));
    out
}
