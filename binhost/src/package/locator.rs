//! Resolution of the archive produced by the current build.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::description::category_description;
use super::environment::BuildEnvironment;
use super::error::{DatabaseResult, LocateError, LocateResult};
use super::naming::{
    archive_filename, archive_path, parse_build_id, MULTI_INSTANCE_EXT, SINGLE_INSTANCE_EXT,
};
use super::PackageDatabase;

/// Portage feature selecting the multi-instance layout.
pub const MULTI_INSTANCE_FEATURE: &str = "binpkg-multi-instance";

/// Everything known about the archive being published.
///
/// Built once per run by [`PackageLocator::locate`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    /// `PF`, e.g. `foo-1.0-r1`.
    pub full_name: String,

    /// `PN`, e.g. `foo`.
    pub name: String,

    /// `PV`, e.g. `1.0`.
    pub version: String,

    /// `CATEGORY`, e.g. `app-misc`.
    pub category: String,

    /// Whether the multi-instance layout is in effect.
    pub multi_instance: bool,

    /// Build id of the archive; only set for multi-instance.
    pub build_id: Option<u64>,

    /// `tbz2` or `xpak`.
    pub file_ext: &'static str,

    /// Archive file name, also the release asset name.
    pub file_name: String,

    /// Archive path relative to `PKGDIR`, also its `PATH` in the index.
    pub pkg_path: String,

    /// Absolute archive path.
    pub file_path: PathBuf,

    /// Ebuild the archive was built from.
    pub ebuild: PathBuf,

    /// Index file name, e.g. `Packages`.
    pub manifest_name: String,

    /// Absolute path of the local index file.
    pub manifest_path: PathBuf,
}

impl PackageRecord {
    /// `<category>/<PF>`.
    pub fn cpv(&self) -> String {
        format!("{}/{}", self.category, self.full_name)
    }

    /// Long description of the package category, for release notes.
    pub fn category_description(&self) -> String {
        category_description(&self.ebuild)
    }

    /// Short description of the package, for release notes.
    pub fn package_description(&self, database: &dyn PackageDatabase) -> DatabaseResult<String> {
        database.description(&self.cpv())
    }
}

/// Resolves the [`PackageRecord`] of a build.
pub struct PackageLocator<'a> {
    env: &'a BuildEnvironment,
    index_file: &'a str,
}

impl<'a> PackageLocator<'a> {
    /// Create a locator; `index_file` is the index file name inside `PKGDIR`.
    pub fn new(env: &'a BuildEnvironment, index_file: &'a str) -> Self {
        Self { env, index_file }
    }

    /// Returns true if the build uses the multi-instance layout.
    pub fn is_multi_instance(&self) -> bool {
        self.env.has_feature(MULTI_INSTANCE_FEATURE)
    }

    /// Resolve the archive to publish.
    ///
    /// In the multi-instance layout this scans the package directory and picks
    /// the highest build id; it fails if no build exists yet.
    pub fn locate(&self) -> LocateResult<PackageRecord> {
        let env = self.env;
        let multi_instance = self.is_multi_instance();

        let (build_id, file_ext) = if multi_instance {
            let dir = env.pkgdir.join(&env.category).join(&env.name);
            (Some(latest_build_id(&dir, &env.full_name)?), MULTI_INSTANCE_EXT)
        } else {
            (None, SINGLE_INSTANCE_EXT)
        };

        let file_name = archive_filename(&env.full_name, build_id);
        let pkg_path = archive_path(&env.category, &env.name, &file_name, multi_instance);

        Ok(PackageRecord {
            full_name: env.full_name.clone(),
            name: env.name.clone(),
            version: env.version.clone(),
            category: env.category.clone(),
            multi_instance,
            build_id,
            file_ext,
            file_path: env.pkgdir.join(&pkg_path),
            file_name,
            pkg_path,
            ebuild: env.ebuild.clone(),
            manifest_name: self.index_file.to_string(),
            manifest_path: env.pkgdir.join(self.index_file),
        })
    }
}

/// Highest build id among the `<full_name>-<id>.xpak` files in `dir`.
fn latest_build_id(dir: &Path, full_name: &str) -> LocateResult<u64> {
    let read_error = |source| LocateError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut latest = None;
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        if !entry.path().is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(id) = file_name
            .to_str()
            .and_then(|name| parse_build_id(name, full_name))
        else {
            continue;
        };

        debug!(build_id = id, file = ?file_name, "found build instance");
        latest = latest.max(Some(id));
    }

    latest.ok_or_else(|| LocateError::NoBuilds {
        dir: dir.to_path_buf(),
        full_name: full_name.to_string(),
    })
}
