//! I/O layer for GDAL-backed terrain rasters and observer feature layers.
//! Provides the `raster` DEM reader, the `vector` feature reader, and
//! `writers` for GeoTIFF outputs and metadata embedding.
pub mod raster;
pub use raster::{Terrain, TerrainSource, read_terrain};

pub mod vector;
pub use vector::read_features;

pub mod writers;
