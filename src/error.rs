use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MirrorError {
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("invalid catalog format: {0}")]
    InvalidCatalogFormat(String),

    #[error("invalid unit or set identifier: {0}")]
    InvalidIdentifier(String),

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("catalog request failed: {0}")]
    CatalogHttp(String),

    #[error("transfer of {url} returned status {status}")]
    HttpStatus { status: u16, url: String },

    #[error("transfer request failed: {0}")]
    Http(String),

    #[error("external downloader failed: {0}")]
    ExternalTool(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl MirrorError {
    /// Fatal errors abort the whole run; everything else is recovered
    /// per unit by the executor.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MirrorError::CatalogUnavailable(_)
                | MirrorError::InvalidCatalogFormat(_)
                | MirrorError::MissingTool(_)
                | MirrorError::ConfigRead(_)
                | MirrorError::ConfigParse(_)
        )
    }
}
