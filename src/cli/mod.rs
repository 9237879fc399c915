//! Command Line Interface (CLI) layer for FUZZYVIEW.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`). It wires user-provided options to
//! the library functionality exposed via `fuzzyview::api`.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
