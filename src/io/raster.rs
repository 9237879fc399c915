use std::path::{Path, PathBuf};

use gdal::Dataset;
use ndarray::Array2;
use tracing::{debug, info};

use crate::core::grid::GridModel;
use crate::error::{Error, Result};

/// Where the elevation values live
#[derive(Debug, Clone)]
pub enum TerrainSource {
    /// GDAL-readable DEM on disk; engines read it directly
    File(PathBuf),
    /// Elevation held in memory, shape `(rows, cols)`
    InMemory(Array2<f32>),
}

/// Read-only terrain: the grid, its georeferencing and the elevation source
#[derive(Debug, Clone)]
pub struct Terrain {
    pub grid: GridModel,
    /// Projection in WKT format (may be empty)
    pub projection: String,
    pub source: TerrainSource,
}

impl Terrain {
    pub fn in_memory(
        grid: GridModel,
        projection: impl Into<String>,
        elevation: Array2<f32>,
    ) -> Result<Self> {
        if elevation.dim() != grid.shape() {
            return Err(Error::GridMismatch {
                stage: "terrain",
                expected: grid.shape(),
                actual: elevation.dim(),
            });
        }
        Ok(Self {
            grid,
            projection: projection.into(),
            source: TerrainSource::InMemory(elevation),
        })
    }
}

/// Open a DEM and describe its grid without loading elevation values.
///
/// The stored path is absolute so engines running in another working
/// directory still find the file.
pub fn read_terrain<P: AsRef<Path>>(path: P) -> Result<Terrain> {
    let path = std::path::absolute(path)?;
    info!("Opening terrain: {:?}", path);
    let dataset = Dataset::open(&path)?;
    if dataset.raster_count() == 0 {
        return Err(Error::configuration(
            "dem",
            path.display(),
            "no raster bands found",
        ));
    }
    let (size_x, size_y) = dataset.raster_size();
    let (cols, rows) = (size_x as usize, size_y as usize);
    let geotransform = dataset.geo_transform()?;
    let grid = GridModel::from_geotransform(rows, cols, geotransform)?;
    let projection = dataset.projection();

    debug!(
        "Terrain grid {}x{}, resolution {} x {}, origin ({}, {})",
        grid.rows, grid.cols, grid.res_x, grid.res_y, grid.origin_x, grid.origin_y
    );

    Ok(Terrain {
        grid,
        projection,
        source: TerrainSource::File(path),
    })
}

/// Read band 1 of a raster as an f64 ndarray of shape (height, width)
pub fn read_band_f64<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let dataset = Dataset::open(path.as_ref())?;
    let (size_x, size_y) = dataset.raster_size();
    let (cols, rows) = (size_x as usize, size_y as usize);
    let band = dataset.rasterband(1)?;
    let buf = band.read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)?;
    let array = Array2::from_shape_vec((rows, cols), buf.data().to_vec())?;
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_terrain_checks_shape() {
        let grid = GridModel::new(3, 4, 1.0, 1.0, 0.0, 3.0).unwrap();
        assert!(Terrain::in_memory(grid, "", Array2::zeros((3, 4))).is_ok());
        let err = Terrain::in_memory(grid, "", Array2::zeros((4, 3))).unwrap_err();
        assert!(matches!(err, Error::GridMismatch { stage: "terrain", .. }));
    }

    #[test]
    fn test_missing_dem_is_an_error() {
        assert!(read_terrain("/definitely/not/here.tif").is_err());
    }
}
