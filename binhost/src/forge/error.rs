//! Error types for forge operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for forge operations.
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Errors that can occur while talking to the hosting service.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Building the HTTP client failed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The request could not be sent or the response could not be read.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{method} {url} returned HTTP {status}: {message}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// A local file to upload could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ForgeError {
    /// HTTP status code, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ForgeError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the service reported that the object is missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true if an optimistic update lost against a concurrent writer.
    pub fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(409) | Some(422))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn status(code: u16) -> ForgeError {
        ForgeError::Status {
            method: "PUT",
            url: "https://api.github.com/repos/o/r/contents/Packages".to_string(),
            status: code,
            message: "sha does not match".to_string(),
        }
    }

    #[test]
    fn test_status_display() {
        let msg = status(409).to_string();
        assert!(msg.contains("PUT"));
        assert!(msg.contains("409"));
        assert!(msg.contains("sha does not match"));
    }

    #[test]
    fn test_classification() {
        assert!(status(404).is_not_found());
        assert!(status(409).is_conflict());
        assert!(!status(500).is_conflict());
        assert_eq!(ForgeError::Client("x".to_string()).status(), None);
    }

    #[test]
    fn test_read_file_source() {
        let err = ForgeError::ReadFile {
            path: PathBuf::from("/pkgdir/app-misc/foo-1.0.tbz2"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("foo-1.0.tbz2"));
    }
}
