mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use github_bottles::{Credential, FormulaRef, GithubBottles, ReleaseEndpoint, cache, cellar, platform};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ghbottle")]
#[command(author, version, about = "Pour Homebrew bottles published on GitHub releases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GitHub API root of the project, e.g. https://api.github.com/repos/OWNER/REPO
    #[arg(long, global = true, env = "GITHUB_BOTTLES_ENDPOINT")]
    endpoint: Option<String>,

    /// Authorization header value sent verbatim, e.g. "token ghp_..."
    #[arg(long, global = true, env = "GITHUB_BOTTLES_AUTHORIZATION", hide_env_values = true)]
    authorization: Option<String>,

    /// Bottle platform tag (defaults to the running system)
    #[arg(long, global = true)]
    platform: Option<String>,

    /// Download cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Install prefix holding the Cellar
    #[arg(long, global = true, env = "HOMEBREW_PREFIX")]
    prefix: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a bottle exists for a formula
    Check {
        /// Formula name
        name: String,
        /// Formula version
        version: String,
    },

    /// Download a bottle into the cache
    Fetch {
        /// Formula name
        name: String,
        /// Formula version
        version: String,
    },

    /// Download and pour a bottle
    Install {
        /// Formula name
        name: String,
        /// Formula version
        version: String,

        /// Pour into this directory instead of the Cellar keg
        #[arg(long)]
        into: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let endpoint = cli
        .endpoint
        .map(ReleaseEndpoint::new)
        .context("No endpoint given; pass --endpoint or set GITHUB_BOTTLES_ENDPOINT")?;
    let credential = cli
        .authorization
        .as_deref()
        .map(Credential::new)
        .transpose()?;
    let platform_tag = match cli.platform {
        Some(tag) => tag,
        None => platform::detect_bottle_tag()?,
    };
    let cache_root = cli.cache_dir.unwrap_or_else(cache::cache_dir);
    let prefix = cli.prefix.unwrap_or_else(cellar::detect_prefix);

    let mut bottles = GithubBottles::new(endpoint, credential, platform_tag)?;

    match cli.command {
        Commands::Check { name, version } => {
            commands::check(&mut bottles, &FormulaRef::new(name, version)).await?;
        }
        Commands::Fetch { name, version } => {
            commands::fetch(&mut bottles, &cache_root, &FormulaRef::new(name, version)).await?;
        }
        Commands::Install {
            name,
            version,
            into,
        } => {
            commands::install(
                &mut bottles,
                &cache_root,
                &FormulaRef::new(name, version),
                &prefix,
                into,
                cli.verbose,
            )
            .await?;
        }
    }

    Ok(())
}
