use thiserror::Error;

/// Recoverable failures surfaced to the presentation layer. None of these are
/// fatal to the process; corrupt persisted data is normalized to an empty
/// collection instead of raised.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("trip not found: {0}")]
    NotFound(String),
    #[error("no live position feed is available")]
    UnsupportedEnvironment,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
