use ndarray::{Array2, Zip};

use crate::error::{Error, Result};
use crate::types::{DistanceField, NODATA, OutputGrid, VisibilityMask};

fn check_shape(
    stage: &'static str,
    expected: (usize, usize),
    actual: (usize, usize),
) -> Result<()> {
    if expected != actual {
        return Err(Error::GridMismatch {
            stage,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Fuse membership, visibility and the optional radius cutoff.
///
/// Cells beyond `max_distance` are `NODATA` whatever their membership or
/// visibility; all other cells get `membership` where visible and 0 elsewhere.
pub fn composite(
    membership: &Array2<f64>,
    visibility: &VisibilityMask,
    distances: &DistanceField,
    max_distance: Option<f64>,
) -> Result<OutputGrid> {
    let shape = distances.dim();
    check_shape("membership", shape, membership.dim())?;
    check_shape("visibility", shape, visibility.dim())?;

    let mut out = Array2::<f32>::zeros(shape);
    Zip::from(&mut out)
        .and(membership)
        .and(visibility)
        .and(distances)
        .par_for_each(|o, &m, &visible, &d| {
            let in_radius = max_distance.is_none_or(|max| d <= max);
            *o = if !in_radius {
                NODATA
            } else if visible {
                m as f32
            } else {
                0.0
            };
        });
    Ok(out)
}
