use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Point;

/// Immutable description of the terrain grid.
///
/// Rows grow downward in world space: `y = origin_y - row * res_y`.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GridModel {
    pub rows: usize,
    pub cols: usize,
    /// Cell width, grid units
    pub res_x: f64,
    /// Cell height, grid units (positive)
    pub res_y: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl GridModel {
    pub fn new(
        rows: usize,
        cols: usize,
        res_x: f64,
        res_y: f64,
        origin_x: f64,
        origin_y: f64,
    ) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::configuration(
                "grid",
                format!("{}x{}", rows, cols),
                "dimensions must be positive",
            ));
        }
        if !(res_x.is_finite() && res_x > 0.0) {
            return Err(Error::configuration("res_x", res_x, "must be positive"));
        }
        if !(res_y.is_finite() && res_y > 0.0) {
            return Err(Error::configuration("res_y", res_y, "must be positive"));
        }
        if !(origin_x.is_finite() && origin_y.is_finite()) {
            return Err(Error::configuration(
                "origin",
                format!("({}, {})", origin_x, origin_y),
                "must be finite",
            ));
        }
        Ok(Self {
            rows,
            cols,
            res_x,
            res_y,
            origin_x,
            origin_y,
        })
    }

    /// Build from a GDAL geotransform
    /// (`[origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height]`).
    /// Rotated grids are rejected.
    pub fn from_geotransform(rows: usize, cols: usize, gt: [f64; 6]) -> Result<Self> {
        if gt[2] != 0.0 || gt[4] != 0.0 {
            return Err(Error::configuration(
                "geotransform",
                format!("{:?}", gt),
                "rotated grids are not supported",
            ));
        }
        Self::new(rows, cols, gt[1], gt[5].abs(), gt[0], gt[3])
    }

    pub fn to_geotransform(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.res_x,
            0.0,
            self.origin_y,
            0.0,
            -self.res_y,
        ]
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// World x of a column's cell reference coordinate.
    #[inline]
    pub fn col_x(&self, col: usize) -> f64 {
        col as f64 * self.res_x + self.origin_x
    }

    /// World y of a row's cell reference coordinate.
    #[inline]
    pub fn row_y(&self, row: usize) -> f64 {
        self.origin_y - row as f64 * self.res_y
    }

    /// Callers must keep `row < rows` and `col < cols`.
    pub fn cell_center_coordinate(&self, row: usize, col: usize) -> Point {
        Point::new(self.col_x(col), self.row_y(row))
    }

    /// Whether `p` falls inside the grid's world extent.
    pub fn contains(&self, p: &Point) -> bool {
        let max_x = self.origin_x + self.cols as f64 * self.res_x;
        let min_y = self.origin_y - self.rows as f64 * self.res_y;
        p.x >= self.origin_x && p.x <= max_x && p.y <= self.origin_y && p.y >= min_y
    }
}
