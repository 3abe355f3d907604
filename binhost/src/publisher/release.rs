//! Release workflow orchestration for publishing a binary package.
//!
//! Runs the publish workflow for one archive:
//! 1. Branch - ensure the per-`CHOST` publishing branch exists
//! 2. Release - ensure the release for the category (or package) exists
//! 3. Asset - upload the archive, replacing a mutable single-instance one
//! 4. Index - merge the package's block into the branch's package index
//!
//! Every step talks to the hosting service through [`Forge`], so the whole
//! workflow can be exercised against an in-memory implementation.

use std::fs;

use tracing::{debug, info, warn};

use super::error::{IndexError, PublishError, PublishResult};
use super::index::{commit_message, insert_header_uri};
use crate::config::BinhostConfig;
use crate::forge::{Asset, AssetUpload, Branch, FileCommit, Forge, NewRelease, Release};
use crate::manifest::{Manifest, MergeAction};
use crate::package::{release_tag, PackageDatabase, PackageRecord};

/// MIME type sent with uploaded archives.
pub const ASSET_CONTENT_TYPE: &str = "application/x-tar";

/// How the package index was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexChange {
    /// The branch had no index; it was created from the local one.
    Created,

    /// The package block was merged into the existing index.
    Merged(MergeAction),
}

/// Result of a publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The archive was uploaded and the index updated.
    Published {
        /// The uploaded asset.
        asset: Asset,
        /// Whether an asset of the same name was deleted first.
        replaced: bool,
        /// What happened to the index.
        index: IndexChange,
    },

    /// A multi-instance archive of that name already exists; nothing was done.
    AlreadyPublished {
        /// The existing asset.
        asset: Asset,
    },
}

/// Result of the asset step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The archive was uploaded.
    Uploaded { asset: Asset, replaced: bool },

    /// The archive already exists and must not be replaced.
    AlreadyPublished(Asset),
}

/// Publishes binary packages to a release and keeps the index in sync.
pub struct ReleasePublisher<'a> {
    forge: &'a dyn Forge,
    config: &'a BinhostConfig,
    database: &'a dyn PackageDatabase,
}

impl<'a> ReleasePublisher<'a> {
    /// Create a publisher.
    pub fn new(
        forge: &'a dyn Forge,
        config: &'a BinhostConfig,
        database: &'a dyn PackageDatabase,
    ) -> Self {
        Self {
            forge,
            config,
            database,
        }
    }

    /// Run the whole workflow for one package.
    pub fn publish(&self, package: &PackageRecord) -> PublishResult<PublishOutcome> {
        let branch = self.ensure_branch()?;
        let release = self.ensure_release(package, &branch)?;

        let (asset, replaced) = match self.upload_asset(package, &release)? {
            UploadOutcome::Uploaded { asset, replaced } => (asset, replaced),
            UploadOutcome::AlreadyPublished(asset) => {
                return Ok(PublishOutcome::AlreadyPublished { asset });
            }
        };

        let index = self.update_index(package, &branch.name, replaced)?;

        Ok(PublishOutcome::Published {
            asset,
            replaced,
            index,
        })
    }

    /// Look up the publishing branch, creating it from the base branch if it
    /// does not exist.
    pub fn ensure_branch(&self) -> PublishResult<Branch> {
        let name = self.config.branch_name();

        match self.forge.branch(&name) {
            Ok(Some(branch)) => return Ok(branch),
            Ok(None) => info!(branch = %name, "Creating branch"),
            Err(e) => warn!(branch = %name, error = %e, "Branch lookup failed, creating it"),
        }

        let base = &self.config.github.base_branch;
        self.forge
            .branch_head(base)
            .and_then(|sha| self.forge.create_branch(&name, &sha))
            .map_err(|source| PublishError::BranchEnsure {
                branch: name.clone(),
                source,
            })
    }

    /// Look up the release for a package, creating it if it does not exist.
    ///
    /// Single-instance archives share one release per category, described by
    /// the category metadata. Multi-instance archives get one release per
    /// package, described by the package metadata.
    pub fn ensure_release(
        &self,
        package: &PackageRecord,
        branch: &Branch,
    ) -> PublishResult<Release> {
        let name = package.multi_instance.then_some(package.name.as_str());
        let tag = release_tag(&branch.name, &package.category, name);
        let release_error = |source| PublishError::Release {
            tag: tag.clone(),
            source,
        };

        if let Some(release) = self.forge.release_by_tag(&tag).map_err(release_error)? {
            return Ok(release);
        }

        let body = if package.multi_instance {
            self.package_description(package)
        } else {
            package.category_description()
        };

        info!(release = %tag, "Creating release");
        self.forge
            .create_release(&NewRelease {
                tag: &tag,
                name: &tag,
                body: &body,
                target_commitish: &branch.commit_sha,
            })
            .map_err(release_error)
    }

    /// Upload the archive to the release.
    ///
    /// An existing multi-instance asset of the same name means this exact
    /// build is already published. An existing single-instance asset is
    /// deleted and uploaded again.
    pub fn upload_asset(
        &self,
        package: &PackageRecord,
        release: &Release,
    ) -> PublishResult<UploadOutcome> {
        let asset_error = |source| PublishError::Asset {
            name: package.file_name.clone(),
            source,
        };

        let existing = self.forge.list_assets(release).map_err(asset_error)?;
        let mut replaced = false;

        for asset in existing.iter().filter(|a| a.name == package.file_name) {
            if package.multi_instance {
                info!(asset = %asset.name, "Package already published");
                return Ok(UploadOutcome::AlreadyPublished(asset.clone()));
            }

            // GitHub rejects duplicate asset names, so the old archive is
            // unavailable until the upload below succeeds.
            warn!(asset = %asset.name, "Deleting existing asset before re-upload");
            self.forge.delete_asset(asset).map_err(asset_error)?;
            replaced = true;
        }

        let asset = self
            .forge
            .upload_asset(
                release,
                &AssetUpload {
                    name: &package.file_name,
                    path: &package.file_path,
                    content_type: ASSET_CONTENT_TYPE,
                },
            )
            .map_err(asset_error)?;

        info!("Uploaded {}", package.file_name);
        Ok(UploadOutcome::Uploaded { asset, replaced })
    }

    /// Merge the package into the index stored on the branch.
    pub fn update_index(
        &self,
        package: &PackageRecord,
        branch: &str,
        replaced: bool,
    ) -> PublishResult<IndexChange> {
        let change = self
            .sync_index(package, branch, replaced)
            .map_err(|source| PublishError::IndexUpdate {
                index: package.manifest_name.clone(),
                source,
            })?;

        info!("Package index updated");
        Ok(change)
    }

    fn sync_index(
        &self,
        package: &PackageRecord,
        branch: &str,
        replaced: bool,
    ) -> Result<IndexChange, IndexError> {
        let local =
            fs::read_to_string(&package.manifest_path).map_err(|source| IndexError::ReadLocal {
                path: package.manifest_path.clone(),
                source,
            })?;
        let incoming = insert_header_uri(&local, &self.config.github.header_uri(branch));
        let message = commit_message(package, replaced);

        let head = self.forge.branch_head(branch)?;
        let blob = self
            .forge
            .tree(&head)?
            .into_iter()
            .find(|entry| entry.path == package.manifest_name);

        let Some(blob) = blob else {
            debug!(index = %package.manifest_name, "Index not on branch yet");
            self.forge.create_file(&FileCommit {
                path: &package.manifest_name,
                message: &message,
                content: &incoming,
                branch,
                committer: &self.config.committer,
            })?;
            return Ok(IndexChange::Created);
        };

        let remote = self.forge.file_contents(&package.manifest_name, branch)?;
        let mut index = Manifest::parse(&remote);
        let action = index.update(&Manifest::parse(&incoming), &package.pkg_path);
        debug!(path = %package.pkg_path, ?action, "Merged package block");

        self.forge.update_file(
            &FileCommit {
                path: &package.manifest_name,
                message: &message,
                content: &index.build(),
                branch,
                committer: &self.config.committer,
            },
            &blob.sha,
        )?;

        Ok(IndexChange::Merged(action))
    }

    fn package_description(&self, package: &PackageRecord) -> String {
        match package.package_description(self.database) {
            Ok(description) => description,
            Err(e) => {
                warn!(package = %package.cpv(), error = %e, "No package description");
                package.cpv()
            }
        }
    }
}
