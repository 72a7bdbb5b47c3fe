//! Error types.
//!
//! `ImageSourceError` is the only failure the game itself can observe; it
//! ends up as `Phase::Failed`. `Error` covers everything around the game:
//! configuration, logging setup, and talking to a controller that is gone.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to obtain a batch of images.
#[derive(Debug, Error)]
pub enum ImageSourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image service returned status {status}")]
    Status { status: u16 },

    #[error("could not decode image list: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("requested {requested} distinct images, received {received}")]
    Insufficient { requested: usize, received: usize },

    #[error("{0}")]
    Other(String),
}

impl ImageSourceError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Game controller is no longer running")]
    ControllerClosed,

    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}
