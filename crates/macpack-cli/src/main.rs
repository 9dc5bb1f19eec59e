//! Macpack launcher - command-line entry for running and tracking bundles.
//!
//! This binary wraps macpack-core: it runs bundles through the installed
//! helper, prints their output, and browses the registry of bundles that
//! have been run before.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use macpack_core::PathsConfig;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "macpack-launcher")]
#[command(about = "Run and track macpack bundles")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Helper executable (defaults to ~/.macpack/bin/macpack)
    #[arg(long, env = "MACPACK_HELPER", global = true)]
    helper: Option<PathBuf>,

    /// Registry file (defaults to ~/apps.txt)
    #[arg(long, env = "MACPACK_REGISTRY", global = true)]
    registry: Option<PathBuf>,

    /// Directory for bundle extraction scratch space (defaults to the system temp dir)
    #[arg(long, env = "MACPACK_SCRATCH_DIR", global = true)]
    scratch_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a bundle and register it
    Run {
        /// Path to the .mpb bundle
        bundle: PathBuf,

        /// Kill the helper after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Show a bundle's manifest without running it
    Inspect {
        /// Path to the .mpb bundle
        bundle: PathBuf,
    },

    /// List registered bundles
    List {
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a registered bundle by id
    Remove {
        /// Entry id as shown by `list`
        id: String,
    },

    /// Remove registered bundles whose archive no longer exists
    Prune,

    /// Find bundles in a directory
    Scan {
        /// Directory to search
        dir: PathBuf,

        /// How many directory levels to descend
        #[arg(long, default_value = "1")]
        max_depth: usize,
    },
}

impl Args {
    /// Resolve locations: explicit flags win over the home-directory defaults.
    fn paths(&self) -> Result<PathsConfig> {
        let mut paths = match (&self.helper, &self.registry) {
            (Some(helper), Some(registry)) => PathsConfig::new(helper, registry),
            _ => {
                let mut defaults = PathsConfig::from_home()?;
                if let Some(helper) = &self.helper {
                    defaults.helper_path = helper.clone();
                }
                if let Some(registry) = &self.registry {
                    defaults.registry_path = registry.clone();
                }
                defaults
            }
        };
        if let Some(dir) = &self.scratch_dir {
            paths = paths.with_scratch_dir(dir);
        }
        Ok(paths)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries helper output and listings.
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let paths = args.paths()?;
    debug!(
        "Helper: {}, registry: {}",
        paths.helper_path.display(),
        paths.registry_path.display()
    );

    let code = commands::execute(args.command, paths).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
