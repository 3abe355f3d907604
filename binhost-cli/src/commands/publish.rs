//! Publish command - upload the freshly built package and update the index.

use std::path::Path;

use binhost::config::{BinhostConfig, REPOSITORY_VAR, TOKEN_VAR};
use binhost::forge::GitHubForge;
use binhost::package::{BuildEnvironment, Md5CacheDatabase, PackageLocator, PackageRecord};
use binhost::publisher::{PublishOutcome, ReleasePublisher};
use tracing::{debug, info};

use crate::error::CliError;

/// Ebuild repository used when neither the settings nor the ebuild path name one.
const DEFAULT_REPOSITORY: &str = "/var/db/repos/gentoo";

/// Run the publish command.
///
/// Missing credentials are not an error: the hook is installed system-wide
/// and simply does nothing on hosts that are not configured to publish.
pub fn run() -> Result<(), CliError> {
    let Some(config) = BinhostConfig::from_env()? else {
        info!(
            "Skip binpkg deploy because of missing {} or {}",
            TOKEN_VAR, REPOSITORY_VAR
        );
        return Ok(());
    };

    let env = BuildEnvironment::from_env()?;
    let package = PackageLocator::new(&env, &config.index_file).locate()?;
    debug!(archive = %package.file_path.display(), "Resolved package archive");

    let forge = GitHubForge::new(&config.github)?;
    let database = package_database(&config, &package);
    let outcome = ReleasePublisher::new(&forge, &config, &database).publish(&package)?;

    match outcome {
        PublishOutcome::Published { asset, .. } => {
            info!(asset = %asset.name, size = asset.size, "Published {}", package.cpv());
        }
        PublishOutcome::AlreadyPublished { asset } => {
            debug!(asset = %asset.name, "Nothing to publish");
        }
    }

    Ok(())
}

/// Pick the md5-cache backing package descriptions.
fn package_database(config: &BinhostConfig, package: &PackageRecord) -> Md5CacheDatabase {
    match &config.portage_repository {
        Some(repository) => Md5CacheDatabase::new(repository.clone()),
        None => Md5CacheDatabase::for_ebuild(&package.ebuild)
            .unwrap_or_else(|| Md5CacheDatabase::new(Path::new(DEFAULT_REPOSITORY))),
    }
}
