//! Local package metadata lookups.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{DatabaseError, DatabaseResult};

/// Location of the metadata cache inside an ebuild repository.
pub const MD5_CACHE_DIR: &str = "metadata/md5-cache";

const DESCRIPTION_KEY: &str = "DESCRIPTION";

/// Read-only access to package metadata.
pub trait PackageDatabase {
    /// Short description of a package, keyed by `<category>/<PF>`.
    fn description(&self, cpv: &str) -> DatabaseResult<String>;
}

/// [`PackageDatabase`] reading an ebuild repository's `md5-cache`.
///
/// Cache entries are `KEY=VALUE` lines stored at
/// `<repo>/metadata/md5-cache/<category>/<PF>`.
#[derive(Debug, Clone)]
pub struct Md5CacheDatabase {
    repository: PathBuf,
}

impl Md5CacheDatabase {
    /// Create a database for the ebuild repository at `repository`.
    pub fn new(repository: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
        }
    }

    /// Database of the repository an ebuild belongs to.
    ///
    /// Ebuilds live at `<repo>/<category>/<package>/<file>.ebuild`.
    pub fn for_ebuild(ebuild: &Path) -> Option<Self> {
        ebuild
            .parent()
            .and_then(Path::parent)
            .and_then(Path::parent)
            .map(Self::new)
    }

    /// Repository root.
    pub fn repository(&self) -> &Path {
        &self.repository
    }

    fn entry_path(&self, cpv: &str) -> PathBuf {
        self.repository.join(MD5_CACHE_DIR).join(cpv)
    }
}

impl PackageDatabase for Md5CacheDatabase {
    fn description(&self, cpv: &str) -> DatabaseResult<String> {
        let path = self.entry_path(cpv);
        let content = fs::read_to_string(&path).map_err(|source| DatabaseError::Read {
            cpv: cpv.to_string(),
            path: path.clone(),
            source,
        })?;

        content
            .lines()
            .find_map(|line| line.strip_prefix(DESCRIPTION_KEY)?.strip_prefix('='))
            .map(|value| value.trim().to_string())
            .ok_or_else(|| DatabaseError::MissingKey {
                cpv: cpv.to_string(),
                key: DESCRIPTION_KEY,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_entry(repo: &Path, cpv: &str, content: &str) {
        let path = repo.join(MD5_CACHE_DIR).join(cpv);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_description() {
        let repo = TempDir::new().unwrap();
        write_entry(
            repo.path(),
            "app-misc/foo-1.0-r1",
            "DEFINED_PHASES=install\nDESCRIPTION=Foo does things = well\nEAPI=8\n",
        );

        let db = Md5CacheDatabase::new(repo.path());
        assert_eq!(
            db.description("app-misc/foo-1.0-r1").unwrap(),
            "Foo does things = well"
        );
    }

    #[test]
    fn test_missing_entry() {
        let repo = TempDir::new().unwrap();
        let db = Md5CacheDatabase::new(repo.path());

        let err = db.description("app-misc/foo-1.0").unwrap_err();
        assert!(matches!(err, DatabaseError::Read { .. }));
    }

    #[test]
    fn test_missing_description_key() {
        let repo = TempDir::new().unwrap();
        write_entry(repo.path(), "app-misc/foo-1.0", "EAPI=8\nDESCRIPTIONS=nope\n");

        let err = Md5CacheDatabase::new(repo.path())
            .description("app-misc/foo-1.0")
            .unwrap_err();
        assert!(matches!(err, DatabaseError::MissingKey { .. }));
    }

    #[test]
    fn test_for_ebuild() {
        let db = Md5CacheDatabase::for_ebuild(Path::new(
            "/var/db/repos/gentoo/app-misc/foo/foo-1.0.ebuild",
        ))
        .unwrap();
        assert_eq!(db.repository(), Path::new("/var/db/repos/gentoo"));
    }
}
