//! Value types exchanged with the forge.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A branch and the commit at its tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub commit_sha: String,
}

/// A release, identified by its tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Parameters of a release to create.
#[derive(Debug, Clone, Serialize)]
pub struct NewRelease<'a> {
    #[serde(rename = "tag_name")]
    pub tag: &'a str,
    pub name: &'a str,
    pub body: &'a str,
    pub target_commitish: &'a str,
}

/// A file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// A local file to attach to a release.
#[derive(Debug, Clone, Copy)]
pub struct AssetUpload<'a> {
    /// Asset name on the release.
    pub name: &'a str,

    /// Local file to read.
    pub path: &'a Path,

    /// MIME type sent with the upload.
    pub content_type: &'a str,
}

/// One entry of a git tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Identity recorded as committer of index updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

impl Committer {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A single-file commit to a branch.
#[derive(Debug, Clone, Copy)]
pub struct FileCommit<'a> {
    /// Repository-relative file path.
    pub path: &'a str,

    /// Commit message.
    pub message: &'a str,

    /// Full new file content.
    pub content: &'a str,

    /// Target branch.
    pub branch: &'a str,

    /// Committer identity.
    pub committer: &'a Committer,
}
