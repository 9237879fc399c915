use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Input not found: {path}")]
    MissingInput { path: String },

    #[error("{failed} of {total} features failed; see {report}")]
    FeaturesFailed {
        failed: usize,
        total: usize,
        report: String,
    },

    #[error(transparent)]
    Library(#[from] fuzzyview::Error),
}
