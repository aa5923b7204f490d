use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod cli;
mod config;
mod media;
mod utils;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch TikTok post metadata and save its media", long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: cli::Command,
}

fn init_logging(format: &str, verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // stdout carries results, logs go to stderr
    if format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = config::get_config_path(args.config.as_deref());
    let config = match &config_path {
        Some(path) if path.exists() => config::Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        _ => config::Config::default(),
    };

    init_logging(config.get_logging_format(), args.verbose);

    match &config_path {
        Some(path) => info!("Using config file: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    cli::run(args.command, config, config_path).await
}
