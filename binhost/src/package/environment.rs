//! Portage build environment of the package being published.

use std::path::PathBuf;

use crate::config::{require, ConfigResult};

/// Full package name including version and revision (`foo-1.0-r1`).
pub const PF_VAR: &str = "PF";

/// Package name without version (`foo`).
pub const PN_VAR: &str = "PN";

/// Package version without revision (`1.0`).
pub const PV_VAR: &str = "PV";

/// Package category (`app-misc`).
pub const CATEGORY_VAR: &str = "CATEGORY";

/// Space separated list of enabled Portage features.
pub const FEATURES_VAR: &str = "PORTAGE_FEATURES";

/// Absolute path of the ebuild being built.
pub const EBUILD_VAR: &str = "EBUILD";

/// Binary package output directory.
pub const PKGDIR_VAR: &str = "PKGDIR";

/// Values Portage exports to build hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
    /// `PF`, e.g. `foo-1.0-r1`.
    pub full_name: String,

    /// `PN`, e.g. `foo`.
    pub name: String,

    /// `PV`, e.g. `1.0`.
    pub version: String,

    /// `CATEGORY`, e.g. `app-misc`.
    pub category: String,

    /// Enabled features, one flag per entry.
    pub features: Vec<String>,

    /// `EBUILD`, e.g. `/var/db/repos/gentoo/app-misc/foo/foo-1.0-r1.ebuild`.
    pub ebuild: PathBuf,

    /// `PKGDIR`, e.g. `/var/cache/binpkgs`.
    pub pkgdir: PathBuf,
}

impl BuildEnvironment {
    /// Read the build environment of the current process.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the build environment through an arbitrary variable lookup.
    ///
    /// `PORTAGE_FEATURES` may be empty; every other variable is required.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            full_name: require(&lookup, PF_VAR)?,
            name: require(&lookup, PN_VAR)?,
            version: require(&lookup, PV_VAR)?,
            category: require(&lookup, CATEGORY_VAR)?,
            features: lookup(FEATURES_VAR)
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            ebuild: PathBuf::from(require(&lookup, EBUILD_VAR)?),
            pkgdir: PathBuf::from(require(&lookup, PKGDIR_VAR)?),
        })
    }

    /// Returns true if `flag` is among the enabled features.
    pub fn has_feature(&self, flag: &str) -> bool {
        self.features.iter().any(|f| f == flag)
    }

    /// `<category>/<PF>`, the key of the package in the metadata database.
    pub fn cpv(&self) -> String {
        format!("{}/{}", self.category, self.full_name)
    }
}
