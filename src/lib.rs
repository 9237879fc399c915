#![doc = r#"
FUZZYVIEW: fuzzy viewshed rasters for observer features on a DEM.

For every input feature (point, polygon or multipolygon) this crate derives an
observer point and an apparent object size, asks a visibility engine for the
binary line-of-sight mask, and fuses it with a distance-decay confidence:
full confidence up to `b1`, then `1 / (1 + 2((d - b1) / b2)^2)`. Invisible
cells are 0; cells beyond the optional maximum distance are nodata (NaN).
Results are single-band Float32 GeoTIFFs aligned with the DEM.

Requirements
------------
- GDAL development headers and runtime available on your system.
- A visibility engine. [`WhiteboxViewshed`] drives the WhiteboxTools
  `Viewshed` tool; implement [`VisibilityEngine`] to plug in your own.
- Rust 2024 edition toolchain.

Quick start: a vector file into a directory of GeoTIFFs
-------------------------------------------------------
```rust,no_run
use std::path::Path;
use fuzzyview::{CancelToken, ViewshedConfig, WhiteboxViewshed};
use fuzzyview::api::process_vector_file_to_dir;

fn main() -> fuzzyview::Result<()> {
    let config = ViewshedConfig {
        b1: 500.0,
        max_distance: Some(20_000.0),
        ..ViewshedConfig::default()
    };

    let report = process_vector_file_to_dir(
        Path::new("/data/dem.tif"),
        Path::new("/data/turbines.shp"),
        Path::new("/out"),
        &config,
        &WhiteboxViewshed::default(),
        &CancelToken::new(),
    )?;

    println!("processed={} failed={}", report.processed, report.failed);
    Ok(())
}
```

In memory, one feature
----------------------
```rust,no_run
use fuzzyview::api::fuzzy_viewshed_for_feature;
use fuzzyview::io::raster::read_terrain;
use fuzzyview::{FeatureRecord, Geometry, Point, ViewshedConfig, WhiteboxViewshed};

fn main() -> fuzzyview::Result<()> {
    let terrain = read_terrain("/data/dem.tif")?;
    let record = FeatureRecord::new("mast", Geometry::Point(Point::new(512_300.0, 6_401_050.0)));
    let output = fuzzy_viewshed_for_feature(
        &terrain,
        &record,
        &WhiteboxViewshed::default(),
        &ViewshedConfig::default(),
    )?;
    println!("{} -> {:?}", output.params, output.grid.dim());
    Ok(())
}
```

Error handling
--------------
All public functions return `fuzzyview::Result<T>`. Batch entrypoints return
`Err` only for fatal conditions (bad configuration, grid mismatches, unreadable
inputs); everything else is recorded per feature.

```rust,no_run
use fuzzyview::{Error, ViewshedConfig};

fn main() {
    let config = ViewshedConfig { b1: -1.0, ..ViewshedConfig::default() };
    match config.validate() {
        Ok(()) => {}
        Err(Error::Configuration { arg, reason, .. }) => eprintln!("{arg}: {reason}"),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`]: high-level, ergonomic entry points.
- [`core`]: grid model, geometry, parameters and the processing stages.
- [`engine`]: the visibility engine seam and the WhiteboxTools adapter.
- [`io`]: GDAL-backed terrain/feature readers and GeoTIFF writers.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod engine;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use core::geometry::{Geometry, GeometryError, Polygon};
pub use core::grid::GridModel;
pub use core::params::ViewshedConfig;
pub use error::{Error, Result};
pub use types::{
    DistanceField, FeatureRecord, FuzzyParameters, NODATA, ObserverFeature, OutputGrid, Point,
    VisibilityMask,
};

// Engines
pub use engine::{EngineError, VisibilityEngine, WhiteboxViewshed};

// Readers and writers
pub use io::raster::{Terrain, TerrainSource, read_terrain};
pub use io::vector::read_features;
pub use io::writers::metadata::{embed_tiff_metadata, extract_metadata_fields};
pub use io::writers::{GeoTiffSink, OutputSink};

// Processing
pub use core::processing::batch::{
    BatchReport, CancelToken, FeatureFailure, FeatureOutcome, process_feature_collection,
    process_features_to_sink,
};
pub use core::processing::pipeline::{ViewshedOutput, compute_fuzzy_viewshed, derive_observer};
