mod render;

use crate::{
    config::{self, Config},
    media::{
        self, verify_key, write_placeholder, DownloadOutcome, FallbackPolicy, Format, FormatKind,
        ProgressUpdate, TikTokService,
    },
};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether a link points at TikTok
    Check { url: String },
    /// Show metadata and available formats for a post
    Info {
        url: String,
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save one format of a post
    Download {
        url: String,
        /// Format label, e.g. "1080p HD", "720p", "mp3", "Photo 2"
        #[arg(short, long, default_value = "720p HD")]
        format: String,
        /// Directory to save into
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write a synthetic placeholder file when no real media can be fetched
        #[arg(long)]
        placeholder_fallback: bool,
    },
    /// Write a synthetic media file of an exact size
    Placeholder {
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Size in bytes
        #[arg(long)]
        size: u64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage the stored RapidAPI key
    ApiKey {
        #[command(subcommand)]
        action: ApiKeyAction,
    },
    /// Frequently asked questions
    Faq,
}

#[derive(Subcommand, Debug)]
pub enum ApiKeyAction {
    /// Store a key
    Set {
        key: String,
        /// Probe the endpoint before storing
        #[arg(long)]
        verify: bool,
    },
    /// Show the stored key (masked)
    Show,
    /// Remove the stored key
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
    Video,
    Photo,
    Audio,
}

impl From<KindArg> for FormatKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Video => FormatKind::Video,
            KindArg::Photo => FormatKind::Photo,
            KindArg::Audio => FormatKind::Audio,
        }
    }
}

pub async fn run(command: Command, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    let result = dispatch(command, config, config_path).await;
    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    result.map_err(explain)
}

// API key failures get a pointer at the fix.
fn explain(err: anyhow::Error) -> anyhow::Error {
    if format!("{err:#}").contains("API key") {
        err.context("API configuration required. Store a RapidAPI key with `tokgrab api-key set <KEY>`")
    } else {
        err
    }
}

async fn dispatch(command: Command, mut config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Command::Check { url } => {
            let valid = media::validate_url(&url);
            println!("{}", render::validity(&url, valid));
            if !valid {
                bail!("Invalid TikTok URL");
            }
            Ok(())
        }
        Command::Info { url, json } => {
            let service = TikTokService::new(config.api_key(), config.timeout())?;
            let info = service.fetch_info(&url).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&info).context("Failed to serialize record")?
                );
            } else {
                print!("{}", render::content(&info));
            }
            Ok(())
        }
        Command::Download {
            url,
            format,
            output,
            placeholder_fallback,
        } => {
            let format: Format = format.parse()?;
            let output_dir = output.unwrap_or_else(|| config.output_dir());
            let policy = if placeholder_fallback {
                FallbackPolicy::Placeholder
            } else {
                config.download.fallback
            };

            let service = TikTokService::new(config.api_key(), config.timeout())?;
            let info = service.fetch_info(&url).await?;
            print!("{}", render::content(&info));

            let outcome = with_progress(|tx| async move {
                service
                    .download(&info, &format, &output_dir, policy, &tx)
                    .await
            })
            .await?;
            info!(
                "Download finished: {} ({} bytes)",
                outcome.path().display(),
                outcome.bytes()
            );
            println!("{}", render::outcome(&outcome));
            Ok(())
        }
        Command::Placeholder { kind, size, output } => {
            let kind = FormatKind::from(kind);
            let output_dir = output.unwrap_or_else(|| config.output_dir());
            let path = placeholder_path(&output_dir, kind)?;

            let written = with_progress(|tx| {
                let path = path.clone();
                async move { write_placeholder(kind, size, &path, &tx).await }
            })
            .await?;

            let outcome = DownloadOutcome::Placeholder {
                path,
                bytes: written,
                reason: "requested explicitly".to_string(),
            };
            println!("{}", render::outcome(&outcome));
            Ok(())
        }
        Command::ApiKey { action } => {
            let path = config_path
                .or_else(config::default_config_path)
                .ok_or_else(|| anyhow!("Cannot determine where to store the config file"))?;
            api_key(action, &mut config, &path).await
        }
        Command::Faq => {
            print!("{}", render::FAQ);
            Ok(())
        }
    }
}

async fn api_key(action: ApiKeyAction, config: &mut Config, path: &Path) -> Result<()> {
    match action {
        ApiKeyAction::Set { key, verify } => {
            if key.trim().is_empty() {
                bail!("API key must not be empty");
            }
            if verify {
                let client = media::build_client(config.timeout())?;
                if !verify_key(&client, &key).await? {
                    bail!("API key was rejected by RapidAPI");
                }
            }
            config.set_api_key(Some(&key));
            config.save(path)?;
            info!("Stored API key in {}", path.display());
            println!("API key saved to {}", path.display());
        }
        ApiKeyAction::Show => match config.api_key() {
            Some(key) => println!("{}", render::mask_key(key)),
            None => println!("No API key stored"),
        },
        ApiKeyAction::Clear => {
            config.set_api_key(None);
            config.save(path)?;
            println!("API key removed from {}", path.display());
        }
    }
    Ok(())
}

fn placeholder_path(output_dir: &Path, kind: FormatKind) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let format = match kind {
        FormatKind::Video => Format::Hd720,
        FormatKind::Photo => Format::Photo(1),
        FormatKind::Audio => Format::Mp3Audio,
    };
    Ok(output_dir.join(media::generate_filename(&format)))
}

/// Runs `work` while a background task draws its progress on stderr.
async fn with_progress<F, Fut, T>(work: F) -> Result<T>
where
    F: FnOnce(mpsc::Sender<ProgressUpdate>) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let (tx, mut rx) = mpsc::channel::<ProgressUpdate>(64);
    let printer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            eprint!("\r{}", render::progress_line(&update));
        }
        eprintln!();
    });

    let result = work(tx).await;
    printer.await.context("Progress printer panicked")?;
    result
}
