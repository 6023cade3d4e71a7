//! kgseed CLI
//!
//! - `kgseed resolve`: resolve one text, document URL or image into typed seeds
//! - `kgseed serve`: run the HTTP front door

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kgseed_core::{ResolverPolicy, SeedEngine};
use kgseed_services::{build_collaborators, ServiceConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod output;
mod resolve;
mod server;

#[derive(Parser)]
#[command(name = "kgseed")]
#[command(author, version, about = "kgseed: entity seeds from text, documents and images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one input and print the seeds grouped by type.
    Resolve(ResolveArgs),

    /// Serve `/search` over HTTP.
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
#[command(group(
    clap::ArgGroup::new("input")
        .required(true)
        .args(["text", "url", "image", "image_url"]),
))]
pub struct ResolveArgs {
    /// Free text to resolve
    #[arg(long)]
    pub text: Option<String>,
    /// Remote document whose entity mentions are resolved
    #[arg(long)]
    pub url: Option<String>,
    /// Local image file
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Remote image
    #[arg(long)]
    pub image_url: Option<String>,
    /// Restrict to these schema types (repeatable)
    #[arg(long = "type")]
    pub types: Vec<String>,
    /// Maximum number of distinct seeds
    #[arg(long)]
    pub limit: Option<usize>,
    /// Keep only seeds close to the best score
    #[arg(long)]
    pub best_only: bool,
    /// Images only: print the detected labels without resolving them
    #[arg(long)]
    pub raw: bool,
    /// Print JSON instead of the colored listing
    #[arg(long)]
    pub json: bool,
    /// Resolver policy JSON file
    #[arg(long)]
    pub policy: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:5015")]
    pub listen: SocketAddr,
    /// Resolver policy JSON file
    #[arg(long)]
    pub policy: Option<PathBuf>,
}

fn init_tracing() {
    use tracing_subscriber::prelude::*;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_policy(path: Option<&Path>) -> Result<ResolverPolicy> {
    match path {
        Some(path) => ResolverPolicy::from_json_file(path)
            .with_context(|| format!("failed to load policy {}", path.display())),
        None => Ok(ResolverPolicy::default()),
    }
}

fn build_engine(policy: Option<&Path>) -> Result<SeedEngine> {
    let policy = load_policy(policy)?;
    let config = ServiceConfig::from_env().context("service configuration")?;
    let collaborators = build_collaborators(&config).context("building collaborators")?;
    Ok(SeedEngine::new(collaborators, policy))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let _guard = rt.enter();

    // fail on missing credentials before doing any work
    let engine = match &cli.command {
        Commands::Resolve(args) => build_engine(args.policy.as_deref())?,
        Commands::Serve(args) => build_engine(args.policy.as_deref())?,
    };

    match cli.command {
        Commands::Resolve(args) => rt.block_on(resolve::cmd_resolve(&engine, &args)),
        Commands::Serve(args) => rt.block_on(server::serve(Arc::new(engine), args.listen)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_requires_an_input() {
        assert!(Cli::try_parse_from(["kgseed", "resolve"]).is_err());
        assert!(Cli::try_parse_from(["kgseed", "resolve", "--text", "a", "--url", "http://x"]).is_err());

        let cli = Cli::try_parse_from([
            "kgseed", "resolve", "--text", "Madrid", "--type", "City", "--type", "Place",
        ])
        .unwrap();
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.types, vec!["City", "Place"]);
    }

    #[test]
    fn policy_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{"score_floor": 0.3}"#).unwrap();

        let policy = load_policy(Some(&path)).unwrap();
        assert_eq!(policy.score_floor, 0.3);
        assert_eq!(policy.best_band, 0.05);

        assert!(load_policy(Some(Path::new("/nonexistent/policy.json"))).is_err());
    }
}
