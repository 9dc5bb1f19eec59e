//! Subcommand implementations.

use crate::Command;
use anyhow::Result;
use macpack_core::{discovery, BundleService, CancellationToken, PathsConfig, RunOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Run a subcommand and return the process exit code.
pub async fn execute(command: Command, paths: PathsConfig) -> Result<i32> {
    match command {
        Command::Run {
            bundle,
            timeout_secs,
        } => {
            let mut builder = BundleService::builder(paths);
            if let Some(secs) = timeout_secs {
                builder = builder.launch_timeout(Duration::from_secs(secs));
            }
            run(Arc::new(builder.build()), bundle).await
        }
        Command::Inspect { bundle } => {
            let manifest = service(paths).inspect(&bundle)?;
            println!("name:        {}", manifest.name);
            println!("version:     {}", manifest.version);
            println!("author:      {}", manifest.author);
            println!("exec:        {}", manifest.exec);
            println!("description: {}", manifest.description);
            Ok(0)
        }
        Command::List { json } => {
            let entries = service(paths).list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No bundles registered");
            } else {
                for entry in entries {
                    println!("{}  {}  {}", entry.id, entry.name, entry.path.display());
                    println!("    {}", entry.description);
                }
            }
            Ok(0)
        }
        Command::Remove { id } => {
            if service(paths).remove(&id)? {
                println!("Removed {}", id);
            } else {
                println!("No registered bundle with id {}", id);
            }
            Ok(0)
        }
        Command::Prune => {
            let pruned = service(paths).prune_missing()?;
            for entry in &pruned {
                println!("Removed {} ({})", entry.name, entry.path.display());
            }
            println!("Pruned {} entries", pruned.len());
            Ok(0)
        }
        Command::Scan { dir, max_depth } => {
            let service = service(paths);
            for bundle in discovery::find_bundles(&dir, max_depth)? {
                match service.inspect(&bundle) {
                    Ok(manifest) => println!(
                        "{}  {} {}",
                        bundle.display(),
                        manifest.name,
                        manifest.version
                    ),
                    Err(e) => println!("{}  ({})", bundle.display(), e),
                }
            }
            Ok(0)
        }
    }
}

// An unreadable registry is already logged by the builder.
fn service(paths: PathsConfig) -> BundleService {
    BundleService::new(paths)
}

async fn run(service: Arc<BundleService>, bundle: PathBuf) -> Result<i32> {
    let token = CancellationToken::new();
    let run = service.clone().run_bundle_async(bundle, token.clone());
    tokio::pin!(run);

    let outcome = tokio::select! {
        outcome = &mut run => outcome?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping helper");
            token.cancel();
            run.await?
        }
    };

    Ok(report(&outcome))
}

/// Print the outcome of a run and pick the exit code.
///
/// A failed launch exits 1. Otherwise the helper's own exit code is passed
/// through; manifest and registry problems are only warnings.
fn report(outcome: &RunOutcome) -> i32 {
    if let Some(output) = outcome.output() {
        print!("{}", output);
    }

    for e in &outcome.errors {
        if e.is_recoverable() {
            warn!("{}", e);
        } else {
            error!("{}", e);
        }
    }

    if let Some(entry) = &outcome.entry {
        if outcome.inserted {
            info!("Registered {} ({})", entry.name, entry.id);
        } else {
            info!("{} is already registered ({})", entry.name, entry.id);
        }
    }

    match &outcome.launch {
        None => 1,
        Some(launch) => launch.exit_code.unwrap_or(1),
    }
}
