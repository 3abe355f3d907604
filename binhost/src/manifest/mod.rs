//! Binhost package index (`Packages`) parsing and merging.
//!
//! The index is a plain text document made of `KEY: value` lines grouped into
//! blocks separated by blank lines:
//!
//! ```text
//! PROFILE: default/linux/amd64/23.0
//! TIMESTAMP: 1718000000
//! PACKAGES: 2
//!
//! CPV: app-misc/foo-1.0
//! PATH: app-misc/foo-1.0.tbz2
//!
//! CPV: app-misc/bar-2.1
//! PATH: app-misc/bar-2.1.tbz2
//! ```
//!
//! The first block is the global header; every following block describes one
//! published archive and is keyed by its `PATH` field.
//!
//! # Type Hierarchy
//!
//! ```text
//! Manifest
//! └── blocks: Vec<Block>
//!     ├── [0]    header   (PROFILE, TIMESTAMP, PACKAGES, URI, ...)
//!     └── [1..]  packages (PATH, CPV, BUILD_ID, ...)
//! ```
//!
//! Blocks keep their raw lines so that fields this crate knows nothing about
//! survive a parse/build round trip untouched.

mod block;
mod document;

pub use block::Block;
pub use document::{Manifest, MergeAction};

/// Well-known field keys.
pub mod fields {
    /// Index-relative archive path; identifies a package block.
    pub const PATH: &str = "PATH";

    /// Number of package blocks, recomputed on every build.
    pub const PACKAGES: &str = "PACKAGES";

    /// Portage profile the packages were built with.
    pub const PROFILE: &str = "PROFILE";

    /// Index generation timestamp.
    pub const TIMESTAMP: &str = "TIMESTAMP";

    /// Base download URI prepended to every `PATH`.
    pub const URI: &str = "URI";

    /// Category/package-version of a package block.
    pub const CPV: &str = "CPV";

    /// Multi-instance build id of a package block.
    pub const BUILD_ID: &str = "BUILD_ID";
}
