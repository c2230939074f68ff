//! Transport layer for minigit network operations.
//!
//! This crate provides the physical transport for the clone pipeline: the
//! git smart-HTTP protocol's two requests (ref discovery and upload-pack).
//! Higher-level protocol logic lives in `minigit-protocol`.

mod http;

pub use http::HttpClient;

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("'{url}' does not appear to be a git smart-HTTP server (hint: the endpoint returned HTML; check the repository URL)")]
    NotASmartServer { url: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Normalize a remote repository URL for the smart-HTTP endpoints:
/// trailing slashes are dropped and a `.git` suffix is appended when
/// missing.
pub fn normalize_remote_url(url: &str) -> Result<String, TransportError> {
    let trimmed = url.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(TransportError::InvalidUrl(url.to_string()));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(TransportError::InvalidUrl(format!(
            "unsupported URL scheme: {url}"
        )));
    }
    if trimmed.ends_with(".git") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}.git"))
    }
}
