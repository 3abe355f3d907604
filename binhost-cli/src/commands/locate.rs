//! Locate command - show which archive `publish` would upload.

use binhost::config::DEFAULT_INDEX_FILE;
use binhost::package::{release_tag, BuildEnvironment, PackageLocator, PackageRecord};

use crate::error::CliError;

/// Run the locate command.
pub fn run(index_file: Option<String>) -> Result<(), CliError> {
    let env = BuildEnvironment::from_env()?;
    let index_file = index_file.unwrap_or_else(|| DEFAULT_INDEX_FILE.to_string());
    let package = PackageLocator::new(&env, &index_file).locate()?;

    for (label, value) in describe(&package) {
        println!("{:<15}{}", format!("{}:", label), value);
    }
    Ok(())
}

/// Human readable summary of a resolved package.
fn describe(package: &PackageRecord) -> Vec<(&'static str, String)> {
    let name = package.multi_instance.then_some(package.name.as_str());
    let build_id = package
        .build_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    vec![
        ("Package", package.cpv()),
        ("Multi-instance", package.multi_instance.to_string()),
        ("Build id", build_id),
        ("Archive", package.file_path.display().to_string()),
        ("Index PATH", package.pkg_path.clone()),
        ("Index file", package.manifest_path.display().to_string()),
        ("Release", release_tag("<branch>", &package.category, name)),
    ]
}
