use ndarray::{Array1, Array2, Zip};
use tracing::debug;

use crate::core::grid::GridModel;
use crate::types::{DistanceField, Point};

/// Euclidean distance from `observer` to every cell of `grid`.
///
/// Column and row offsets are computed once per axis; the grid pass itself is
/// row-sharded across the rayon pool. `observer` must be finite.
pub fn build_distance_field(grid: &GridModel, observer: Point) -> DistanceField {
    let dx: Array1<f64> = Array1::from_shape_fn(grid.cols, |col| grid.col_x(col) - observer.x);
    let dy: Array1<f64> = Array1::from_shape_fn(grid.rows, |row| grid.row_y(row) - observer.y);
    let dx2 = dx.mapv(|v| v * v);

    let mut distances = Array2::<f64>::zeros(grid.shape());
    Zip::from(distances.rows_mut())
        .and(&dy)
        .par_for_each(|mut row, &row_dy| {
            let dy2 = row_dy * row_dy;
            Zip::from(&mut row)
                .and(&dx2)
                .for_each(|d, &col_dx2| *d = (col_dx2 + dy2).sqrt());
        });

    debug!(
        "Distance field {}x{} built from {}",
        grid.rows, grid.cols, observer
    );
    distances
}
