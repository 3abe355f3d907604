//! Integration tests for the publish workflow.
//!
//! These tests drive [`ReleasePublisher`] end to end against an in-memory
//! forge that records every mutating call:
//! - first publish of a single-instance package onto a fresh branch
//! - re-publish of a single-instance package (delete + upload)
//! - re-publish of a multi-instance build (no-op)
//! - merging into an existing remote index
//! - failure propagation from branch and index steps
//!
//! Run with: `cargo test --test publish_integration`

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use binhost::config::{BinhostConfig, GitHubConfig};
use binhost::forge::{
    Asset, AssetUpload, Branch, Committer, FileCommit, Forge, ForgeError, ForgeResult, NewRelease,
    Release, TreeEntry,
};
use binhost::manifest::{Manifest, MergeAction};
use binhost::package::{
    BuildEnvironment, DatabaseResult, PackageDatabase, PackageLocator, PackageRecord,
    CUSTOM_CATEGORY_DESCRIPTION, MULTI_INSTANCE_FEATURE,
};
use binhost::publisher::{IndexChange, PublishError, PublishOutcome, ReleasePublisher};

// ============================================================================
// In-memory forge
// ============================================================================

#[derive(Default)]
struct State {
    branches: HashMap<String, String>,
    releases: Vec<(Release, String)>,
    assets: HashMap<u64, Vec<Asset>>,
    files: HashMap<String, (String, String)>,
    next_id: u64,
    calls: Vec<String>,
}

#[derive(Default)]
struct FakeForge {
    state: RefCell<State>,
}

impl FakeForge {
    fn with_master() -> Self {
        let forge = Self::default();
        forge
            .state
            .borrow_mut()
            .branches
            .insert("master".to_string(), "c0ffee".to_string());
        forge
    }

    fn next_id(&self) -> u64 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.next_id
    }

    fn add_release(&self, tag: &str) -> Release {
        let release = Release {
            id: self.next_id(),
            tag: tag.to_string(),
            name: Some(tag.to_string()),
        };
        self.state
            .borrow_mut()
            .releases
            .push((release.clone(), String::new()));
        release
    }

    fn add_asset(&self, release: &Release, name: &str) {
        let asset = Asset {
            id: self.next_id(),
            name: name.to_string(),
            size: 1,
        };
        self.state
            .borrow_mut()
            .assets
            .entry(release.id)
            .or_default()
            .push(asset);
    }

    fn add_file(&self, path: &str, content: &str) {
        let sha = format!("blob-{}", self.next_id());
        self.state
            .borrow_mut()
            .files
            .insert(path.to_string(), (content.to_string(), sha));
    }

    fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    fn file(&self, path: &str) -> Option<String> {
        self.state.borrow().files.get(path).map(|(c, _)| c.clone())
    }

    fn release_body(&self, tag: &str) -> Option<String> {
        self.state
            .borrow()
            .releases
            .iter()
            .find(|(r, _)| r.tag == tag)
            .map(|(_, body)| body.clone())
    }

    fn asset_names(&self, release_tag: &str) -> Vec<String> {
        let state = self.state.borrow();
        let Some((release, _)) = state.releases.iter().find(|(r, _)| r.tag == release_tag) else {
            return Vec::new();
        };
        state
            .assets
            .get(&release.id)
            .map(|assets| assets.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }
}

fn not_found(url: &str) -> ForgeError {
    ForgeError::Status {
        method: "GET",
        url: url.to_string(),
        status: 404,
        message: "Not Found".to_string(),
    }
}

impl Forge for FakeForge {
    fn branch(&self, name: &str) -> ForgeResult<Option<Branch>> {
        Ok(self.state.borrow().branches.get(name).map(|sha| Branch {
            name: name.to_string(),
            commit_sha: sha.clone(),
        }))
    }

    fn create_branch(&self, name: &str, from_sha: &str) -> ForgeResult<Branch> {
        self.record(format!("create_branch {} {}", name, from_sha));
        self.state
            .borrow_mut()
            .branches
            .insert(name.to_string(), from_sha.to_string());
        Ok(Branch {
            name: name.to_string(),
            commit_sha: from_sha.to_string(),
        })
    }

    fn release_by_tag(&self, tag: &str) -> ForgeResult<Option<Release>> {
        Ok(self
            .state
            .borrow()
            .releases
            .iter()
            .find(|(r, _)| r.tag == tag)
            .map(|(r, _)| r.clone()))
    }

    fn create_release(&self, release: &NewRelease<'_>) -> ForgeResult<Release> {
        self.record(format!(
            "create_release {} @{}",
            release.tag, release.target_commitish
        ));
        let created = self.add_release(release.tag);
        if let Some(entry) = self
            .state
            .borrow_mut()
            .releases
            .iter_mut()
            .find(|(r, _)| r.id == created.id)
        {
            entry.1 = release.body.to_string();
        }
        Ok(created)
    }

    fn list_assets(&self, release: &Release) -> ForgeResult<Vec<Asset>> {
        Ok(self
            .state
            .borrow()
            .assets
            .get(&release.id)
            .cloned()
            .unwrap_or_default())
    }

    fn delete_asset(&self, asset: &Asset) -> ForgeResult<()> {
        self.record(format!("delete_asset {}", asset.name));
        for assets in self.state.borrow_mut().assets.values_mut() {
            assets.retain(|a| a.id != asset.id);
        }
        Ok(())
    }

    fn upload_asset(&self, release: &Release, upload: &AssetUpload<'_>) -> ForgeResult<Asset> {
        let size = fs::metadata(upload.path)
            .map_err(|source| ForgeError::ReadFile {
                path: upload.path.to_path_buf(),
                source,
            })?
            .len();
        self.record(format!("upload_asset {} {}", upload.name, upload.content_type));

        let asset = Asset {
            id: self.next_id(),
            name: upload.name.to_string(),
            size,
        };
        self.state
            .borrow_mut()
            .assets
            .entry(release.id)
            .or_default()
            .push(asset.clone());
        Ok(asset)
    }

    fn branch_head(&self, branch: &str) -> ForgeResult<String> {
        self.state
            .borrow()
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| not_found(branch))
    }

    fn tree(&self, _sha: &str) -> ForgeResult<Vec<TreeEntry>> {
        Ok(self
            .state
            .borrow()
            .files
            .iter()
            .map(|(path, (_, sha))| TreeEntry {
                path: path.clone(),
                sha: sha.clone(),
                kind: "blob".to_string(),
            })
            .collect())
    }

    fn file_contents(&self, path: &str, _branch: &str) -> ForgeResult<String> {
        self.file(path).ok_or_else(|| not_found(path))
    }

    fn create_file(&self, commit: &FileCommit<'_>) -> ForgeResult<()> {
        self.record(format!("create_file {}: {}", commit.path, commit.message));
        self.add_file(commit.path, commit.content);
        Ok(())
    }

    fn update_file(&self, commit: &FileCommit<'_>, sha: &str) -> ForgeResult<()> {
        let current = self
            .state
            .borrow()
            .files
            .get(commit.path)
            .map(|(_, s)| s.clone());
        if current.as_deref() != Some(sha) {
            return Err(ForgeError::Status {
                method: "PUT",
                url: commit.path.to_string(),
                status: 409,
                message: "sha does not match".to_string(),
            });
        }

        self.record(format!("update_file {}: {}", commit.path, commit.message));
        self.add_file(commit.path, commit.content);
        Ok(())
    }
}

struct FakeDatabase;

impl PackageDatabase for FakeDatabase {
    fn description(&self, cpv: &str) -> DatabaseResult<String> {
        Ok(format!("Description of {}", cpv))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

const CHOST: &str = "x86_64-pc-linux-gnu";
const BRANCH: &str = "binhost-x86_64-pc-linux-gnu";
const HEADER_URI: &str =
    "URI: https://github.com/owner/bins/releases/download/binhost-x86_64-pc-linux-gnu";

fn config() -> BinhostConfig {
    BinhostConfig::new(GitHubConfig::new("token", "owner/bins"), CHOST)
        .with_committer(Committer::new("binhost", "binhost@test"))
}

fn local_index(path: &str) -> String {
    format!(
        "ACCEPT_KEYWORDS: amd64\nPACKAGES: 1\nPROFILE: default/linux/amd64/23.0\n\
         TIMESTAMP: 1700000000\nVERSION: 0\n\nCPV: app-misc/foo-1.0\nPATH: {}\nSIZE: 2048\n",
        path
    )
}

/// Lay out a PKGDIR with an archive and a local index, and resolve it.
fn prepare(pkgdir: &Path, multi_instance: bool) -> PackageRecord {
    let features = if multi_instance {
        vec![MULTI_INSTANCE_FEATURE.to_string()]
    } else {
        Vec::new()
    };
    let env = BuildEnvironment {
        full_name: "foo-1.0".to_string(),
        name: "foo".to_string(),
        version: "1.0".to_string(),
        category: "app-misc".to_string(),
        features,
        ebuild: pkgdir.join("repo/app-misc/foo/foo-1.0.ebuild"),
        pkgdir: pkgdir.to_path_buf(),
    };

    let archive = if multi_instance {
        pkgdir.join("app-misc/foo/foo-1.0-2.xpak")
    } else {
        pkgdir.join("app-misc/foo-1.0.tbz2")
    };
    fs::create_dir_all(archive.parent().unwrap()).unwrap();
    fs::write(&archive, b"archive bytes").unwrap();

    let record = PackageLocator::new(&env, "Packages").locate().unwrap();
    fs::write(&record.manifest_path, local_index(&record.pkg_path)).unwrap();
    record
}

// ============================================================================
// Integration Tests
// ============================================================================

/// First publish: branch, release and index are all created.
#[test]
fn test_single_instance_first_publish() {
    let pkgdir = TempDir::new().unwrap();
    let package = prepare(pkgdir.path(), false);
    let forge = FakeForge::with_master();
    let config = config();

    let outcome = ReleasePublisher::new(&forge, &config, &FakeDatabase)
        .publish(&package)
        .unwrap();

    match outcome {
        PublishOutcome::Published {
            asset,
            replaced,
            index,
        } => {
            assert_eq!(asset.name, "foo-1.0.tbz2");
            assert_eq!(asset.size, 13);
            assert!(!replaced);
            assert_eq!(index, IndexChange::Created);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(
        forge.calls(),
        vec![
            format!("create_branch {} c0ffee", BRANCH),
            format!("create_release {}/app-misc @c0ffee", BRANCH),
            "upload_asset foo-1.0.tbz2 application/x-tar".to_string(),
            "create_file Packages: app-misc/foo-1.0 added".to_string(),
        ]
    );

    let index = forge.file("Packages").unwrap();
    assert!(index.contains(&format!(
        "PROFILE: default/linux/amd64/23.0\n{}\nTIMESTAMP: 1700000000\n",
        HEADER_URI
    )));
    assert_eq!(
        forge.release_body(&format!("{}/app-misc", BRANCH)).as_deref(),
        Some(CUSTOM_CATEGORY_DESCRIPTION)
    );
}

/// Re-publishing a single-instance archive replaces the asset.
#[test]
fn test_single_instance_replaces_existing_asset() {
    let pkgdir = TempDir::new().unwrap();
    let package = prepare(pkgdir.path(), false);
    let forge = FakeForge::with_master();
    forge
        .state
        .borrow_mut()
        .branches
        .insert(BRANCH.to_string(), "beef".to_string());
    let tag = format!("{}/app-misc", BRANCH);
    let release = forge.add_release(&tag);
    forge.add_asset(&release, "foo-1.0.tbz2");
    forge.add_asset(&release, "bar-2.0.tbz2");
    forge.add_file(
        "Packages",
        "PACKAGES: 1\nPROFILE: old\nTIMESTAMP: 1\n\nCPV: app-misc/foo-1.0\nPATH: app-misc/foo-1.0.tbz2\nSIZE: 1\n",
    );
    let config = config();

    let outcome = ReleasePublisher::new(&forge, &config, &FakeDatabase)
        .publish(&package)
        .unwrap();

    assert!(matches!(
        outcome,
        PublishOutcome::Published {
            replaced: true,
            index: IndexChange::Merged(MergeAction::Replaced),
            ..
        }
    ));
    assert_eq!(
        forge.calls(),
        vec![
            "delete_asset foo-1.0.tbz2".to_string(),
            "upload_asset foo-1.0.tbz2 application/x-tar".to_string(),
            "update_file Packages: app-misc/foo-1.0 updated".to_string(),
        ]
    );

    let mut names = forge.asset_names(&tag);
    names.sort();
    assert_eq!(names, vec!["bar-2.0.tbz2", "foo-1.0.tbz2"]);

    let index = Manifest::parse(&forge.file("Packages").unwrap());
    assert_eq!(index.package_count(), 1);
    assert_eq!(
        index
            .find_package("app-misc/foo-1.0.tbz2")
            .and_then(|b| b.get("SIZE")),
        Some("2048")
    );
    assert_eq!(
        index.header().and_then(|h| h.get("PROFILE")),
        Some("default/linux/amd64/23.0")
    );
}

/// A multi-instance build that is already on the release is left alone.
#[test]
fn test_multi_instance_already_published() {
    let pkgdir = TempDir::new().unwrap();
    let package = prepare(pkgdir.path(), true);
    let forge = FakeForge::with_master();
    forge
        .state
        .borrow_mut()
        .branches
        .insert(BRANCH.to_string(), "beef".to_string());
    let release = forge.add_release(&format!("{}/app-misc/foo", BRANCH));
    forge.add_asset(&release, "foo-1.0-2.xpak");
    let config = config();

    let outcome = ReleasePublisher::new(&forge, &config, &FakeDatabase)
        .publish(&package)
        .unwrap();

    assert!(matches!(outcome, PublishOutcome::AlreadyPublished { ref asset } if asset.name == "foo-1.0-2.xpak"));
    assert!(forge.calls().is_empty());
    assert_eq!(forge.file("Packages"), None);
}

/// A new multi-instance build gets a per-package release and is appended.
#[test]
fn test_multi_instance_new_build_is_appended() {
    let pkgdir = TempDir::new().unwrap();
    let package = prepare(pkgdir.path(), true);
    let forge = FakeForge::with_master();
    forge
        .state
        .borrow_mut()
        .branches
        .insert(BRANCH.to_string(), "beef".to_string());
    forge.add_file(
        "Packages",
        "PACKAGES: 1\nPROFILE: p\nTIMESTAMP: 1\n\nCPV: app-misc/foo-1.0\nPATH: app-misc/foo/foo-1.0-1.xpak\n",
    );
    let config = config();

    let outcome = ReleasePublisher::new(&forge, &config, &FakeDatabase)
        .publish(&package)
        .unwrap();

    assert!(matches!(
        outcome,
        PublishOutcome::Published {
            replaced: false,
            index: IndexChange::Merged(MergeAction::Appended),
            ..
        }
    ));

    let tag = format!("{}/app-misc/foo", BRANCH);
    assert_eq!(
        forge.release_body(&tag).as_deref(),
        Some("Description of app-misc/foo-1.0")
    );
    assert!(forge
        .calls()
        .contains(&format!("create_release {} @beef", tag)));

    let content = forge.file("Packages").unwrap();
    let index = Manifest::parse(&content);
    let paths: Vec<_> = index.packages().iter().filter_map(|b| b.path()).collect();
    assert_eq!(
        paths,
        vec!["app-misc/foo/foo-1.0-1.xpak", "app-misc/foo/foo-1.0-2.xpak"]
    );
    assert!(content.starts_with("ACCEPT_KEYWORDS: amd64\nPACKAGES: 2\n"));
    assert!(content.contains(HEADER_URI));
}

/// Without a base branch the publishing branch cannot be created.
#[test]
fn test_branch_ensure_failure() {
    let pkgdir = TempDir::new().unwrap();
    let package = prepare(pkgdir.path(), false);
    let forge = FakeForge::default();
    let config = config();

    let err = ReleasePublisher::new(&forge, &config, &FakeDatabase)
        .publish(&package)
        .unwrap_err();

    assert!(matches!(err, PublishError::BranchEnsure { ref branch, .. } if branch == BRANCH));
    assert!(forge.calls().is_empty());
}

/// A missing local index surfaces as an index update failure after upload.
#[test]
fn test_missing_local_index_is_surfaced() {
    let pkgdir = TempDir::new().unwrap();
    let package = prepare(pkgdir.path(), false);
    fs::remove_file(&package.manifest_path).unwrap();
    let forge = FakeForge::with_master();
    let config = config();

    let err = ReleasePublisher::new(&forge, &config, &FakeDatabase)
        .publish(&package)
        .unwrap_err();

    assert!(matches!(err, PublishError::IndexUpdate { .. }));
    assert_eq!(forge.asset_names(&format!("{}/app-misc", BRANCH)), vec!["foo-1.0.tbz2"]);
}

/// A stale blob sha is not retried.
#[test]
fn test_stale_index_sha_is_surfaced() {
    struct StaleForge(FakeForge);

    impl Forge for StaleForge {
        fn branch(&self, name: &str) -> ForgeResult<Option<Branch>> {
            self.0.branch(name)
        }
        fn create_branch(&self, name: &str, from_sha: &str) -> ForgeResult<Branch> {
            self.0.create_branch(name, from_sha)
        }
        fn release_by_tag(&self, tag: &str) -> ForgeResult<Option<Release>> {
            self.0.release_by_tag(tag)
        }
        fn create_release(&self, release: &NewRelease<'_>) -> ForgeResult<Release> {
            self.0.create_release(release)
        }
        fn list_assets(&self, release: &Release) -> ForgeResult<Vec<Asset>> {
            self.0.list_assets(release)
        }
        fn delete_asset(&self, asset: &Asset) -> ForgeResult<()> {
            self.0.delete_asset(asset)
        }
        fn upload_asset(&self, release: &Release, upload: &AssetUpload<'_>) -> ForgeResult<Asset> {
            self.0.upload_asset(release, upload)
        }
        fn branch_head(&self, branch: &str) -> ForgeResult<String> {
            self.0.branch_head(branch)
        }
        fn tree(&self, sha: &str) -> ForgeResult<Vec<TreeEntry>> {
            self.0.tree(sha)
        }
        fn file_contents(&self, path: &str, branch: &str) -> ForgeResult<String> {
            let content = self.0.file_contents(path, branch)?;
            // Another writer commits between our read and our update.
            self.0.add_file(path, &content);
            Ok(content)
        }
        fn create_file(&self, commit: &FileCommit<'_>) -> ForgeResult<()> {
            self.0.create_file(commit)
        }
        fn update_file(&self, commit: &FileCommit<'_>, sha: &str) -> ForgeResult<()> {
            self.0.update_file(commit, sha)
        }
    }

    let pkgdir = TempDir::new().unwrap();
    let package = prepare(pkgdir.path(), false);
    let forge = StaleForge(FakeForge::with_master());
    forge.0.add_file("Packages", "PACKAGES: 0\nPROFILE: p\nTIMESTAMP: 1\n");
    let config = config();

    let err = ReleasePublisher::new(&forge, &config, &FakeDatabase)
        .publish(&package)
        .unwrap_err();

    match err {
        PublishError::IndexUpdate { source, .. } => {
            assert!(source.to_string().contains("409"));
        }
        other => panic!("unexpected error: {}", other),
    }
}
