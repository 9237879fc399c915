//! Core building blocks: the terrain grid model, observer geometry analysis,
//! configuration, and the fuzzy viewshed processing stages. These are the
//! primitives consumed by the high-level `api` module.
pub mod geometry;
pub mod grid;
pub mod params;
pub mod processing;
