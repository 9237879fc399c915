//! Output writers: float32 GeoTIFF encoding, provenance metadata and the
//! atomic per-feature sink.
pub mod metadata;
pub mod sink;
pub mod tiff;

pub use sink::{GeoTiffSink, OutputSink, sanitize_id};
