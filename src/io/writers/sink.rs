use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::processing::pipeline::ViewshedOutput;
use crate::error::{Error, Result};
use crate::io::raster::Terrain;
use crate::io::writers::metadata::embed_tiff_metadata;
use crate::io::writers::tiff::write_tiff_f32;

/// Destination for finished per-feature outputs.
///
/// `write` is called concurrently for distinct features.
pub trait OutputSink: Sync {
    /// Collision key for a feature id; two features with the same key cannot
    /// both be written.
    fn key(&self, id: &str) -> String {
        id.to_string()
    }

    fn write(&self, terrain: &Terrain, output: &ViewshedOutput) -> Result<PathBuf>;
}

/// Make a feature id safe for use in a file name
pub fn sanitize_id(id: &str) -> String {
    let s: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() || s.chars().all(|c| c == '.') {
        format!("_{}", s)
    } else {
        s
    }
}

/// Writes `<prefix><id>.tif` float32 GeoTIFFs into a directory
#[derive(Debug, Clone)]
pub struct GeoTiffSink {
    dir: PathBuf,
    prefix: String,
}

impl GeoTiffSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn output_path(&self, id: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}.tif", self.prefix, sanitize_id(id)))
    }

    // GDAL writes into a temporary file in the target directory which is then
    // renamed over the final name, so readers never see a partial raster.
    fn write_atomic(&self, terrain: &Terrain, output: &ViewshedOutput, path: &Path) -> Result<()> {
        let tmp = tempfile::Builder::new()
            .prefix(".fuzzyview-")
            .suffix(".tif")
            .tempfile_in(&self.dir)?
            .into_temp_path();
        {
            let mut ds = write_tiff_f32(
                &tmp,
                &terrain.grid,
                &terrain.projection,
                &output.grid,
                Some(f64::NAN),
            )?;
            embed_tiff_metadata(&mut ds, output)?;
        }
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl OutputSink for GeoTiffSink {
    fn key(&self, id: &str) -> String {
        sanitize_id(id)
    }

    fn write(&self, terrain: &Terrain, output: &ViewshedOutput) -> Result<PathBuf> {
        let path = self.output_path(&output.feature.id);
        self.write_atomic(terrain, output, &path).map_err(|e| {
            Error::Processing(format!("writing {}: {}", path.display(), e))
        })?;
        info!("Wrote fuzzy viewshed: {:?}", path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::GridModel;
    use crate::io::raster::read_band_f64;
    use crate::types::{FuzzyParameters, ObserverFeature, Point};
    use gdal::{Dataset, Metadata};
    use ndarray::{Array2, arr2};

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("tower-7"), "tower-7");
        assert_eq!(sanitize_id("a b/c"), "a_b_c");
        assert_eq!(sanitize_id("a:b"), sanitize_id("a?b"));
        assert_eq!(sanitize_id(""), "_");
        assert_eq!(sanitize_id(".."), "_..");
    }

    #[test]
    fn test_geotiff_sink_writes_atomically_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let sink = GeoTiffSink::new(dir.path().join("out"), "fuzzy_viewshed_").unwrap();
        let grid = GridModel::new(2, 2, 5.0, 5.0, 100.0, 200.0).unwrap();
        let terrain = Terrain::in_memory(grid, "", Array2::zeros((2, 2))).unwrap();
        let output = ViewshedOutput {
            feature: ObserverFeature {
                id: "site 1".into(),
                location: Point::new(105.0, 195.0),
                size: 0.0,
            },
            params: FuzzyParameters { b1: 2.0, b2: 1.0 },
            observer_height: 1.65,
            max_distance: Some(6.0),
            engine: "mock".into(),
            grid: arr2(&[[1.0, 0.0], [f32::NAN, 0.5]]),
        };

        let path = sink.write(&terrain, &output).unwrap();
        assert_eq!(path, dir.path().join("out").join("fuzzy_viewshed_site_1.tif"));

        let values = read_band_f64(&path).unwrap();
        assert_eq!(values[[0, 0]], 1.0);
        assert!(values[[1, 0]].is_nan());

        let ds = Dataset::open(&path).unwrap();
        assert_eq!(ds.metadata_item("FEATURE_ID", ""), Some("site 1".to_string()));
        assert_eq!(ds.metadata_item("B1", ""), Some("2".to_string()));
        assert_eq!(ds.rasterband(1).unwrap().no_data_value().map(f64::is_nan), Some(true));

        // Only the final raster remains; the temporary file was renamed
        let names: Vec<_> = std::fs::read_dir(sink.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["fuzzy_viewshed_site_1.tif".to_string()]);
    }
}
