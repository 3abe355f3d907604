//! Error types for the publisher module.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::forge::ForgeError;

/// Result type for publisher operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that can occur during publishing.
///
/// Every variant is terminal for the current run; nothing is retried.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The publishing branch neither exists nor could be created.
    #[error("unable to ensure branch '{branch}': {source}")]
    BranchEnsure {
        branch: String,
        #[source]
        source: ForgeError,
    },

    /// The release could not be looked up or created.
    #[error("unable to ensure release '{tag}': {source}")]
    Release {
        tag: String,
        #[source]
        source: ForgeError,
    },

    /// Listing, deleting or uploading the asset failed.
    #[error("failed to publish asset '{name}': {source}")]
    Asset {
        name: String,
        #[source]
        source: ForgeError,
    },

    /// The package index could not be merged or committed.
    #[error("failed to update package index '{index}': {source}")]
    IndexUpdate {
        index: String,
        #[source]
        source: IndexError,
    },
}

/// Causes of a failed package index update.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The freshly built local index could not be read.
    #[error("failed to read {path}: {source}")]
    ReadLocal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A remote call failed, including a stale blob sha on update.
    #[error(transparent)]
    Forge(#[from] ForgeError),
}
