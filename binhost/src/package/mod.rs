//! Binary package resolution.
//!
//! Turns the Portage build environment of the package being merged into a
//! [`PackageRecord`]: which archive to publish, where it lives under `PKGDIR`,
//! and which `PATH` it has in the package index.
//!
//! # Layouts
//!
//! Portage writes binary packages in one of two layouts:
//!
//! ```text
//! single-instance                 multi-instance (FEATURES=binpkg-multi-instance)
//! PKGDIR/                         PKGDIR/
//! ├── Packages                    ├── Packages
//! └── app-misc/                   └── app-misc/
//!     └── foo-1.0.tbz2                └── foo/
//!                                         ├── foo-1.0-1.xpak
//!                                         └── foo-1.0-2.xpak
//! ```
//!
//! In the multi-instance layout the highest numeric build id is the one that
//! was just built.

mod database;
mod description;
mod environment;
mod error;
mod locator;
mod naming;

pub use database::{Md5CacheDatabase, PackageDatabase, MD5_CACHE_DIR};
pub use description::{category_description, parse_long_description, CUSTOM_CATEGORY_DESCRIPTION};
pub use environment::BuildEnvironment;
pub use error::{DatabaseError, DatabaseResult, LocateError, LocateResult};
pub use locator::{PackageLocator, PackageRecord, MULTI_INSTANCE_FEATURE};
pub use naming::{
    archive_filename, archive_path, parse_build_id, release_tag, MULTI_INSTANCE_EXT,
    SINGLE_INSTANCE_EXT,
};
