//! crumbs - inspect, mint and debug stateless cookie sessions.
//!
//! Main entry point for the crumbs CLI.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use crumbs_session::SessionConfig;

mod commands;

use commands::{decode, encode, header};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// crumbs - stateless cookie session toolkit
#[derive(Parser)]
#[command(name = "crumbs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Secret the cookie keystream is derived from
    #[arg(long, global = true, env = "CRUMBS_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// TOML file with a [session] table
    #[arg(long, global = true, env = "CRUMBS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cookie name (overrides config)
    #[arg(long, global = true)]
    pub cookie_name: Option<String>,

    /// Cookie path (overrides config)
    #[arg(long, global = true)]
    pub path: Option<String>,

    /// Session lifetime in seconds, 0 for a browser-session cookie (overrides config)
    #[arg(long, global = true)]
    pub expires: Option<u64>,

    /// Also write JSON logs to a daily rotating file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode a JSON object into a cookie value
    Encode(encode::EncodeArgs),

    /// Decode a cookie value back into JSON
    Decode(decode::DecodeArgs),

    /// Print the Set-Cookie header a session would emit
    Header(header::HeaderArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "crumbs=debug,crumbs_session=debug,info"
    } else {
        "crumbs=info,crumbs_session=warn,warn"
    };

    use tracing_subscriber::prelude::*;
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::EnvFilter::new(filter));

    // Keep the guard alive so buffered file logs flush on exit.
    let (file_layer, _guard) = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "crumbs.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "crumbs=trace,crumbs_session=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    let ctx = commands::Context {
        config: resolve_config(&cli)?,
        secret: cli
            .secret
            .clone()
            .context("no secret given; pass --secret or set CRUMBS_SECRET")?,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Encode(args) => encode::run(args, &ctx),
        Commands::Decode(args) => decode::run(args, &ctx),
        Commands::Header(args) => header::run(args, &ctx),
    }
}

/// Config file (if any) with command-line overrides applied on top.
fn resolve_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(name) = &cli.cookie_name {
        config = config.with_cookie_name(name);
    }
    if let Some(path) = &cli.path {
        config = config.with_path(path);
    }
    if let Some(secs) = cli.expires {
        config = config.with_expires_secs(secs);
    }
    config.validate()?;
    tracing::debug!(?config, "Resolved session config");
    Ok(config)
}
