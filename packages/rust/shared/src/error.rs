//! Error type shared by the Lodestone crates.
//!
//! The conversion pipeline recovers from its own failures, so these errors
//! surface from configuration, file input, and the fallible building blocks
//! underneath `convert`. The CLI reports them through `color-eyre`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LodestoneError {
    /// `lodestone.toml` could not be located, parsed, or validated.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// A URL, date, or document fragment did not have the expected shape.
    #[error("could not parse {message}")]
    Parse { message: String },

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// htmd gave up on a document.
    #[error("markdown conversion failed: {0}")]
    Conversion(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LodestoneError>;

impl LodestoneError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }

    /// Attach the offending path to an I/O failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
