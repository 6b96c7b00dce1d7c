use thiserror::Error;

/// Failures from the plumbing around the game; the game itself never fails
#[derive(Debug, Error)]
pub enum TapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, TapError>;
