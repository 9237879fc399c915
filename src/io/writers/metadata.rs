use gdal::Dataset;
use gdal::Metadata;
use std::collections::BTreeMap;

use crate::core::processing::pipeline::ViewshedOutput;
use crate::error::Result;

/// Collect the per-feature provenance written into each output raster
pub fn extract_metadata_fields(output: &ViewshedOutput) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("FEATURE_ID".to_string(), output.feature.id.clone());
    metadata.insert(
        "OBSERVER_X".to_string(),
        output.feature.location.x.to_string(),
    );
    metadata.insert(
        "OBSERVER_Y".to_string(),
        output.feature.location.y.to_string(),
    );
    metadata.insert("OBJECT_SIZE".to_string(), output.feature.size.to_string());
    metadata.insert("B1".to_string(), output.params.b1.to_string());
    metadata.insert("B2".to_string(), output.params.b2.to_string());
    metadata.insert("OBSERVER_HEIGHT".to_string(), output.observer_height.to_string());
    metadata.insert(
        "MAX_DISTANCE".to_string(),
        output
            .max_distance
            .map(|d| d.to_string())
            .unwrap_or_else(|| "none".to_string()),
    );
    metadata.insert("ENGINE".to_string(), output.engine.clone());
    metadata.insert(
        "PROCESSING_TIME".to_string(),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    );
    metadata.insert(
        "SOFTWARE".to_string(),
        format!("fuzzyview {}", env!("CARGO_PKG_VERSION")),
    );
    metadata
}

/// Embed provenance as dataset metadata items (default domain)
pub fn embed_tiff_metadata(ds: &mut Dataset, output: &ViewshedOutput) -> Result<()> {
    for (key, value) in extract_metadata_fields(output) {
        ds.set_metadata_item(&key, &value, "")?;
    }
    Ok(())
}
