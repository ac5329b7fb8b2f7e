//! Unified error type.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for partsbin's fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned by partsbin's fallible operations.
///
/// Application-level outcomes (404, 405, 429) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// startup and infrastructure failures: bad configuration, missing views,
/// an unreadable catalog, binding to a port.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("required view `{name}` not found in {}", dir.display())]
    MissingTemplate { name: &'static str, dir: PathBuf },

    #[error("catalog: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
