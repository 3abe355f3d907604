//! Manifest CLI commands.
//!
//! Offline access to the package index merge used by `publish`, handy for
//! repairing a branch's `Packages` file by hand.

use std::fs;
use std::path::{Path, PathBuf};

use binhost::manifest::{Manifest, MergeAction};
use clap::Subcommand;
use tracing::info;

use crate::error::CliError;

/// Manifest subcommands.
#[derive(Debug, Subcommand)]
pub enum ManifestCommands {
    /// Merge one package block from an incoming index into a base index
    Merge {
        /// Index to merge into
        base: PathBuf,

        /// Index holding the new header and package block
        incoming: PathBuf,

        /// PATH of the package block to take from the incoming index
        #[arg(long)]
        path: String,
    },
}

/// Run a manifest subcommand.
pub fn run(command: ManifestCommands) -> Result<(), CliError> {
    match command {
        ManifestCommands::Merge {
            base,
            incoming,
            path,
        } => run_merge(&base, &incoming, &path),
    }
}

/// Merge and print the resulting index on stdout.
fn run_merge(base: &Path, incoming: &Path, path: &str) -> Result<(), CliError> {
    let (merged, action) = merge(&read(base)?, &read(incoming)?, path);
    info!(path, ?action, "Merged package block");
    print!("{}", merged);
    Ok(())
}

/// Merge `path`'s block from `incoming` into `base`.
fn merge(base: &str, incoming: &str, path: &str) -> (String, MergeAction) {
    let mut manifest = Manifest::parse(base);
    let action = manifest.update(&Manifest::parse(incoming), path);
    (manifest.build(), action)
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}
