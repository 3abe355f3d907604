//! binhost CLI - Portage hook publishing binary packages to GitHub
//!
//! Run from a Portage `post_pkg_preinst` hook (or by hand inside the build
//! environment), `binhost` uploads the package archive that was just built
//! to a GitHub release and merges its entry into the `Packages` index kept on
//! the per-`CHOST` branch.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::manifest::ManifestCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "binhost")]
#[command(about = "Publish Portage binary packages to GitHub releases", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload the current build and update the package index (default)
    Publish,

    /// Work with package index files offline
    Manifest {
        #[command(subcommand)]
        command: ManifestCommands,
    },

    /// Show the archive the current build environment resolves to
    Locate {
        /// Package index file name inside PKGDIR
        #[arg(long)]
        index_file: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    binhost::logging::init(cli.verbose);

    if let Err(e) = run(cli.command.unwrap_or(Commands::Publish)) {
        e.exit();
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Publish => commands::publish::run(),
        Commands::Manifest { command } => commands::manifest::run(command),
        Commands::Locate { index_file } => commands::locate::run(index_file),
    }
}
