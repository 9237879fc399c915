//! High-level, ergonomic library API: compute a fuzzy viewshed for a single
//! feature in memory, or run a whole vector file against a DEM into a directory
//! of GeoTIFFs. Prefer these entrypoints over the low-level processing modules
//! when integrating FUZZYVIEW.
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::params::ViewshedConfig;
use crate::core::processing::batch::{BatchReport, CancelToken, process_features_to_sink};
use crate::core::processing::pipeline::{ViewshedOutput, compute_fuzzy_viewshed, derive_observer};
use crate::engine::VisibilityEngine;
use crate::error::Result;
use crate::io::raster::{Terrain, read_terrain};
use crate::io::vector::read_features;
use crate::io::writers::GeoTiffSink;
use crate::types::FeatureRecord;

/// File name of the JSON report written next to the outputs
pub const REPORT_FILE_NAME: &str = "batch_report.json";

/// Compute the fuzzy viewshed of one feature in memory (no disk I/O besides
/// whatever the engine needs).
pub fn fuzzy_viewshed_for_feature(
    terrain: &Terrain,
    record: &FeatureRecord,
    engine: &dyn VisibilityEngine,
    config: &ViewshedConfig,
) -> Result<ViewshedOutput> {
    config.validate()?;
    let feature = derive_observer(record)?;
    compute_fuzzy_viewshed(terrain, &feature, engine, config)
}

/// Serialize a batch report as pretty JSON
pub fn write_batch_report(report: &BatchReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    info!("Wrote batch report: {:?}", path);
    Ok(())
}

/// Process every feature of `features_path` against the DEM at `dem_path`,
/// writing `<prefix><id>.tif` rasters and `batch_report.json` into `output_dir`.
///
/// Configuration problems fail before any feature runs; per-feature failures are
/// listed in the report unless `config.strict` is set.
pub fn process_vector_file_to_dir(
    dem_path: &Path,
    features_path: &Path,
    output_dir: &Path,
    config: &ViewshedConfig,
    engine: &dyn VisibilityEngine,
    cancel: &CancelToken,
) -> Result<BatchReport> {
    config.validate()?;
    let terrain = read_terrain(dem_path)?;
    let features = read_features(features_path, &config.id_field)?;
    let sink = GeoTiffSink::new(output_dir, config.output_prefix.clone())?;

    let report = process_features_to_sink(&terrain, &features, engine, config, &sink, cancel)?;
    write_batch_report(&report, &report_path(output_dir))?;
    Ok(report)
}

pub fn report_path(output_dir: &Path) -> PathBuf {
    output_dir.join(REPORT_FILE_NAME)
}
