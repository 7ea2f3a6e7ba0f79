use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading a page or the rules used to classify it.
///
/// Problems with individual links never show up here; those become a
/// terminal status on the link itself.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{url} answered {status}")]
    PageStatus { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid rules file {}: {source}", path.display())]
    InvalidRules {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Page context unavailable: {0}")]
    ContextUnavailable(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
