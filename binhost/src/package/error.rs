//! Error types for package resolution.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for locating a package archive.
pub type LocateResult<T> = Result<T, LocateError>;

/// Result type for package database lookups.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors that can occur while locating the archive to publish.
#[derive(Debug, Error)]
pub enum LocateError {
    /// The package directory could not be listed.
    #[error("failed to read {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No multi-instance build of the package exists.
    #[error("no {full_name}-<build-id>.xpak archive found in {dir}")]
    NoBuilds { dir: PathBuf, full_name: String },
}

/// Errors that can occur while reading package metadata.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The metadata entry could not be read.
    #[error("failed to read metadata for {cpv} from {path}: {source}")]
    Read {
        cpv: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The metadata entry has no such key.
    #[error("metadata for {cpv} has no {key}")]
    MissingKey { cpv: String, key: &'static str },
}
