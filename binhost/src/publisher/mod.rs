//! Publishing of binary packages to a GitHub-hosted binhost.
//!
//! # Overview
//!
//! The publish workflow for one archive:
//! 1. Ensure the `binhost-<CHOST>` branch exists
//! 2. Ensure the release for the category (or package) exists
//! 3. Upload the archive as a release asset
//! 4. Merge the package into the `Packages` index on the branch
//!
//! # Example
//!
//! ```ignore
//! use binhost::forge::GitHubForge;
//! use binhost::package::{BuildEnvironment, Md5CacheDatabase, PackageLocator};
//! use binhost::publisher::ReleasePublisher;
//!
//! let env = BuildEnvironment::from_env()?;
//! let package = PackageLocator::new(&env, &config.index_file).locate()?;
//! let forge = GitHubForge::new(&config.github)?;
//! let database = Md5CacheDatabase::for_ebuild(&env.ebuild).unwrap();
//!
//! let outcome = ReleasePublisher::new(&forge, &config, &database).publish(&package)?;
//! ```

mod error;
mod index;
mod release;

pub use error::{IndexError, PublishError, PublishResult};
pub use index::{commit_message, insert_header_uri};
pub use release::{
    IndexChange, PublishOutcome, ReleasePublisher, UploadOutcome, ASSET_CONTENT_TYPE,
};
