//! Remote hosting API abstraction.
//!
//! The publisher only needs a narrow slice of a git forge: branches, releases
//! with assets, and reading/writing a single file on a branch. [`Forge`]
//! captures exactly that slice so the publish workflow can run against the
//! real GitHub API ([`GitHubForge`]) or an in-memory fake in tests.
//!
//! ```ignore
//! use binhost::forge::{Forge, GitHubForge};
//!
//! let forge = GitHubForge::new(&config.github)?;
//! let head = forge.branch_head("binhost-x86_64-pc-linux-gnu")?;
//! ```

mod error;
mod github;
mod types;

pub use error::{ForgeError, ForgeResult};
pub use github::GitHubForge;
pub use types::{Asset, AssetUpload, Branch, Committer, FileCommit, NewRelease, Release, TreeEntry};

/// Capability surface of the remote hosting service.
///
/// Lookups return `Ok(None)` when the object does not exist; every other
/// failure is an error. Implementations perform one remote call per method
/// and never retry.
pub trait Forge {
    /// Look up a branch by name.
    fn branch(&self, name: &str) -> ForgeResult<Option<Branch>>;

    /// Create a branch pointing at `from_sha`.
    fn create_branch(&self, name: &str, from_sha: &str) -> ForgeResult<Branch>;

    /// Look up a release by its tag.
    fn release_by_tag(&self, tag: &str) -> ForgeResult<Option<Release>>;

    /// Create a release.
    fn create_release(&self, release: &NewRelease<'_>) -> ForgeResult<Release>;

    /// List every asset attached to a release.
    fn list_assets(&self, release: &Release) -> ForgeResult<Vec<Asset>>;

    /// Delete an asset.
    fn delete_asset(&self, asset: &Asset) -> ForgeResult<()>;

    /// Upload a local file as a new release asset.
    fn upload_asset(&self, release: &Release, upload: &AssetUpload<'_>) -> ForgeResult<Asset>;

    /// Commit sha at the tip of a branch.
    fn branch_head(&self, branch: &str) -> ForgeResult<String>;

    /// Top-level entries of the tree of a commit or tree sha.
    fn tree(&self, sha: &str) -> ForgeResult<Vec<TreeEntry>>;

    /// Decoded text of a file on a branch.
    fn file_contents(&self, path: &str, branch: &str) -> ForgeResult<String>;

    /// Commit a new file.
    fn create_file(&self, commit: &FileCommit<'_>) -> ForgeResult<()>;

    /// Commit a new version of an existing file whose current blob is `sha`.
    ///
    /// Fails if `sha` is no longer the blob on the branch.
    fn update_file(&self, commit: &FileCommit<'_>, sha: &str) -> ForgeResult<()>;
}
