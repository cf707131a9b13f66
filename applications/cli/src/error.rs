/// CLI error types
use cadence_playback::PlaybackError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Nothing to play: pass locators on the command line or set queue.items")]
    EmptyQueue,

    #[error("Start index {index} is outside a queue of {len} items")]
    StartOutOfRange { index: usize, len: usize },
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}
