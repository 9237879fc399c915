use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::path::Path;

use crate::core::grid::GridModel;
use crate::error::Result;

/// Write a single-band float32 GeoTIFF georeferenced by `grid`.
///
/// `nodata` is recorded on the band when given; NaN is a valid sentinel.
pub fn write_tiff_f32(
    output: &Path,
    grid: &GridModel,
    projection: &str,
    data: &Array2<f32>,
    nodata: Option<f64>,
) -> Result<Dataset> {
    let (rows, cols) = data.dim();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type::<f32, _>(output, cols, rows, 1)?;
    ds.set_geo_transform(&grid.to_geotransform())?;
    if !projection.is_empty() {
        ds.set_projection(projection)?;
    }

    // GDAL expects row-major order, which is how a standard-layout Array2 iterates
    let values: Vec<f32> = data.iter().copied().collect();
    let mut buf = Buffer::new((cols, rows), values);
    {
        let mut band = ds.rasterband(1)?;
        band.set_no_data_value(nodata)?;
        band.write((0, 0), (cols, rows), &mut buf)?;
    }
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::raster::{TerrainSource, read_band_f64, read_terrain};
    use ndarray::arr2;

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.tif");
        let grid = GridModel::new(2, 3, 10.0, 10.0, 1000.0, 2000.0).unwrap();
        let data = arr2(&[[1.0f32, 0.5, 0.0], [f32::NAN, 0.25, 1.0]]);

        let ds = write_tiff_f32(&path, &grid, "", &data, Some(f64::NAN)).unwrap();
        drop(ds);

        let terrain = read_terrain(&path).unwrap();
        assert_eq!(terrain.grid, grid);
        assert!(matches!(&terrain.source, TerrainSource::File(p) if p.is_absolute()));

        let back = read_band_f64(&path).unwrap();
        assert_eq!(back.dim(), (2, 3));
        assert_eq!(back[[0, 1]], 0.5);
        assert!(back[[1, 0]].is_nan());
        assert_eq!(back[[1, 2]], 1.0);
    }
}
