//! `sidewinder` command-line driver.
//!
//! `build` runs the full pipeline from a `Sidewinder.toml`; `check` re-reads a
//! finished bundle and verifies it against its manifest.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sidewinder_build::config::DEFAULT_CONFIG_FILE;
use sidewinder_build::logging::{init_logging, LoggingConfig};
use sidewinder_build::manifest::ArtifactRole;
use sidewinder_build::pipeline::{self, BuildOptions};
use sidewinder_build::{check_bundle, BuildConfig, BundleManifest};

#[derive(Parser)]
#[command(name = "sidewinder")]
#[command(about = "Bundle a compiled module, its shaders and static assets for the browser", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the deployable bundle
    Build {
        /// Build configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Package the existing module output instead of running the build command
        #[arg(long)]
        skip_module_build: bool,
    },

    /// Verify a previously built bundle
    Check {
        /// Bundle directory
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        verbose: cli.verbose,
        ..LoggingConfig::default()
    });

    let result = match cli.command {
        Commands::Build { config, skip_module_build } => build(&config, skip_module_build),
        Commands::Check { dir } => check(&dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn build(config_path: &Path, skip_module_build: bool) -> Result<()> {
    let config = BuildConfig::load(config_path)?;
    let bundle = pipeline::run(&config, &BuildOptions { skip_module_build })?;

    log::info!("bundle written to {}", bundle.root.display());
    summarize(&bundle.manifest);
    Ok(())
}

fn check(dir: &Path) -> Result<()> {
    let report = check_bundle(dir).with_context(|| format!("bundle {} failed verification", dir.display()))?;

    log::info!("bundle {} is consistent", dir.display());
    summarize(&report.manifest);
    match report.shaders {
        Some(pair) => log::info!(
            "embedded shaders: vertex {} bytes, fragment {} bytes",
            pair.vertex.text().len(),
            pair.fragment.text().len()
        ),
        None => log::info!("entry script is a custom template; embedded shaders not inspected"),
    }
    Ok(())
}

fn summarize(manifest: &BundleManifest) {
    log::info!(
        "  entry {}, module {} (+{} support), {} static",
        manifest.entry,
        manifest.module_binary,
        manifest.count(ArtifactRole::ModuleSupport),
        manifest.count(ArtifactRole::Static),
    );
    for (path, record) in &manifest.artifacts {
        log::debug!("  {path:<40} {:>9} {}", record.size, &record.sha256[..12.min(record.sha256.len())]);
    }
}
