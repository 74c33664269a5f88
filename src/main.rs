// src/main.rs

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use unipkg::config::Config;
use unipkg::context::Context;
use unipkg::filesystem::sha256_file;
use unipkg::format::{PackageFormat, detect};
use unipkg::packages::{self, PackageMetadata};
use unipkg::version::format_size;

/// Config file read when `--config` is not given, if it exists
const DEFAULT_CONFIG_PATH: &str = "/etc/unipkg/config.json";

#[derive(Parser)]
#[command(name = "unipkg")]
#[command(author, version, about = "Install, remove and inspect deb, rpm, eopkg, pacman and apk packages", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for pre-operation backups
    #[arg(short, long, global = true)]
    backup_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a package file with its native package manager
    Install {
        /// Path to the package file
        package_path: PathBuf,
        /// Ignore dependency and safety checks
        #[arg(short, long)]
        force: bool,
    },
    /// Remove a package, given its package file or its installed name
    Remove {
        /// Path to a package file, or the name of an installed package
        package: String,
        /// Also remove configuration, caches and unneeded dependencies
        #[arg(short, long)]
        purge: bool,
    },
    /// Show package metadata
    Info {
        /// Path to the package file
        package_path: PathBuf,
        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the format detected from a file name
    Detect {
        /// Path to the package file (need not exist)
        package_path: PathBuf,
    },
    /// Print the SHA-256 digest of a file
    Hash {
        /// Path to the file
        path: PathBuf,
    },
    /// Check a package signature with the native tool
    Verify {
        /// Path to the package file
        package_path: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)?,
        None => Config::default(),
    };

    Ok(match &cli.backup_dir {
        Some(dir) => config.with_backup_root(dir),
        None => config,
    })
}

fn print_metadata(meta: &PackageMetadata, format: PackageFormat) {
    println!("Package: {}", meta.name);
    println!("  Version: {}", meta.version);
    println!("  Format: {}", format);
    if !meta.architecture.is_empty() {
        println!("  Architecture: {}", meta.architecture);
    }
    println!("  Size: {}", format_size(meta.size));
    if let Some(maintainer) = &meta.maintainer {
        println!("  Maintainer: {}", maintainer);
    }
    if let Some(homepage) = &meta.homepage {
        println!("  Homepage: {}", homepage);
    }
    if !meta.license.is_empty() {
        println!("  License: {}", meta.license);
    }
    if !meta.section.is_empty() {
        println!("  Section: {}", meta.section);
    }
    if !meta.priority.is_empty() {
        println!("  Priority: {}", meta.priority);
    }
    println!("  Date: {}", meta.install_date.format("%Y-%m-%d %H:%M:%S UTC"));

    for (label, list) in [
        ("Dependencies", &meta.dependencies),
        ("Provides", &meta.provides),
        ("Conflicts", &meta.conflicts),
        ("Replaces", &meta.replaces),
    ] {
        if !list.is_empty() {
            println!("  {}: {}", label, list.join(", "));
        }
    }

    if !meta.description.is_empty() {
        println!();
        for line in meta.description.lines() {
            println!("  {}", line);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let Some(command) = &cli.command else {
        println!("unipkg v{}", env!("CARGO_PKG_VERSION"));
        println!("Run 'unipkg --help' for usage information");
        return Ok(());
    };

    let config = load_config(&cli)?;
    debug!("Using backup root {}", config.backup_root.display());
    let ctx = Context::new(config);

    match command {
        Commands::Install {
            package_path,
            force,
        } => {
            info!("Installing package: {}", package_path.display());
            let package = packages::install(package_path, *force, &ctx)?;
            println!("Installed {}", package.display_name());
            Ok(())
        }
        Commands::Remove { package, purge } => {
            if Path::new(package).exists() || detect(package).is_known() {
                let package = packages::remove(package, *purge, &ctx)?;
                println!("Removed {}", package.display_name());
            } else {
                let format = packages::remove_installed(package, *purge, &ctx)?;
                println!("Removed {} ({})", package, format);
            }
            Ok(())
        }
        Commands::Info { package_path, json } => {
            let mut package = packages::open(package_path, &ctx)?;
            let format = package.format();
            let meta = package.info()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(meta)?);
            } else {
                print_metadata(meta, format);
            }
            Ok(())
        }
        Commands::Detect { package_path } => {
            let format = detect(package_path);
            if !format.is_known() {
                return Err(anyhow::anyhow!(
                    "Unable to detect package format for: {}",
                    package_path.display()
                ));
            }
            println!("{}", format);
            Ok(())
        }
        Commands::Hash { path } => {
            let digest = sha256_file(path)
                .with_context(|| format!("failed to hash {}", path.display()))?;
            println!("{}  {}", digest, path.display());
            Ok(())
        }
        Commands::Verify { package_path } => {
            let package = packages::open(package_path, &ctx)?;
            package.verify_signature()?;
            println!("Signature OK: {}", package.display_name());
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "unipkg", &mut std::io::stdout());
            Ok(())
        }
    }
}
