//! Fuzzy viewshed stages: distance field, size-derived decay parameter,
//! membership, composition, the per-feature pipeline and the batch
//! orchestrator.
pub mod batch;
pub mod composite;
pub mod distance;
pub mod fuzzy;
pub mod pipeline;
