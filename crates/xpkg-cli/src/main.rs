//! xpkg CLI - inspect Crossplane packages and validate resources against them

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use xpkg_marshal::{Marshaler, MarshalerConfig};

mod commands;
mod display;
mod error;
mod exit_codes;
mod util;

use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "xpkg")]
#[command(author = "xpkg Contributors")]
#[command(version)]
#[command(about = "Inspect Crossplane packages and validate resources against them", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Marshaler configuration file (YAML)
    #[arg(long, global = true, env = "XPKG_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Marshal a package directory and show what it declares
    Inspect {
        /// Package directory, named <name>@<version>
        path: String,

        /// Registry the package is published to
        #[arg(long, env = "XPKG_REGISTRY")]
        registry: Option<String>,

        /// Repository path (default: directory name without the version)
        #[arg(long)]
        repo: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Marshal a package image saved as a tar archive
    InspectImage {
        /// Image archive (manifest.json plus layer blobs)
        archive: PathBuf,

        /// Package version
        #[arg(id = "package_version", long = "package-version", default_value = "latest")]
        version: String,

        /// Registry the package is published to
        #[arg(long, env = "XPKG_REGISTRY")]
        registry: Option<String>,

        /// Repository path (default: archive file stem)
        #[arg(long)]
        repo: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate resources against the schemas of a package directory
    Validate {
        /// Package directory, named <name>@<version>
        path: String,

        /// YAML file holding one or more resources
        resource: PathBuf,

        /// Registry the package is published to
        #[arg(long, env = "XPKG_REGISTRY")]
        registry: Option<String>,

        /// Repository path (default: directory name without the version)
        #[arg(long)]
        repo: Option<String>,

        /// Output validation results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(debug: bool) {
    let env_filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy()
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_marshaler(config: Option<&PathBuf>) -> Result<Marshaler> {
    let config = match config {
        Some(path) => MarshalerConfig::load_from(path).map_err(|e| CliError::Input {
            message: format!("failed to load {}: {}", path.display(), e),
            help: Some("see `defaultRegistry`, `duplicateSchemas`, `classification`".to_string()),
        })?,
        None => MarshalerConfig::default(),
    };
    tracing::debug!(?config, "Loaded marshaler configuration");
    Ok(Marshaler::builder().config(config).build())
}

fn run(cli: Cli) -> Result<()> {
    let marshaler = load_marshaler(cli.config.as_ref())?;

    match cli.command {
        Commands::Inspect {
            path,
            registry,
            repo,
            json,
        } => commands::inspect::run(
            &marshaler,
            &path,
            registry.as_deref(),
            repo.as_deref(),
            json,
        ),

        Commands::InspectImage {
            archive,
            version,
            registry,
            repo,
            json,
        } => commands::inspect_image::run(
            &marshaler,
            &archive,
            &version,
            registry.as_deref(),
            repo.as_deref(),
            json,
        ),

        Commands::Validate {
            path,
            resource,
            registry,
            repo,
            json,
        } => commands::validate::run(
            &marshaler,
            &path,
            &resource,
            registry.as_deref(),
            repo.as_deref(),
            json,
        ),
    }
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
