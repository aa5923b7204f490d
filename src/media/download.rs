use super::{
    container,
    progress::{self, report, ProgressSender, SpeedMeter, Stage},
    source::TIKTOK_REFERER,
    synthetic::DEFAULT_TARGET_SIZE,
    types::{ContentInfo, DownloadUrl, Format, FormatKind},
};
use anyhow::{anyhow, bail, Context, Result};
use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, ORIGIN, REFERER};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Largest synthetic file `write_placeholder` will build in memory.
pub const MAX_PLACEHOLDER_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// What to do when a format has no real media behind it or the transfer fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    #[default]
    Fail,
    /// Write a synthetic file of the advertised size instead.
    Placeholder,
}

#[derive(Debug)]
pub enum DownloadOutcome {
    Saved {
        path: PathBuf,
        bytes: u64,
    },
    /// A synthetic file was written; `reason` says why real media was not.
    Placeholder {
        path: PathBuf,
        bytes: u64,
        reason: String,
    },
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            DownloadOutcome::Saved { path, .. } | DownloadOutcome::Placeholder { path, .. } => path,
        }
    }

    pub fn bytes(&self) -> u64 {
        match self {
            DownloadOutcome::Saved { bytes, .. } | DownloadOutcome::Placeholder { bytes, .. } => {
                *bytes
            }
        }
    }
}

fn part_path_for(output: &Path) -> PathBuf {
    let mut part = output.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

/// Saves `format` of `info` to `path`, creating its directory.
pub async fn download_file(
    client: &reqwest::Client,
    info: &ContentInfo,
    format: &Format,
    path: PathBuf,
    policy: FallbackPolicy,
    tx: &ProgressSender,
) -> Result<DownloadOutcome> {
    let unavailable = || anyhow!("{} format is not available for this content", format);
    let entry = info.format(format).ok_or_else(unavailable)?;

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    info!(
        "Downloading {} ({}) to {}",
        format,
        format.kind().mime_type(),
        path.display()
    );

    debug!("{} source: {}", format, entry.url.as_str());
    report(tx, 0.0, Stage::Preparing, None).await;

    let failure = match &entry.url {
        DownloadUrl::Unavailable => return Err(unavailable()),
        DownloadUrl::Placeholder(_) => {
            anyhow!("{} has no real media source (placeholder URL)", format)
        }
        DownloadUrl::Available(url) => match stream_to_file(client, url, &path, tx).await {
            Ok(bytes) => {
                info!("Saved {} bytes to {}", bytes, path.display());
                return Ok(DownloadOutcome::Saved { path, bytes });
            }
            Err(e) => {
                warn!("Download of {} failed: {:#}", format, e);
                e.context(format!("{format} download failed"))
            }
        },
    };

    match policy {
        FallbackPolicy::Fail => Err(failure),
        FallbackPolicy::Placeholder => {
            let target = if entry.bytes > 0 {
                entry.bytes
            } else {
                DEFAULT_TARGET_SIZE
            };
            let reason = format!("{failure:#}");
            warn!("Writing placeholder file for {}: {}", format, reason);
            // A failed transfer may have reported up to 90%
            report(tx, 0.0, Stage::Preparing, None).await;
            let bytes = write_placeholder(format.kind(), target, &path, tx).await?;
            Ok(DownloadOutcome::Placeholder {
                path,
                bytes,
                reason,
            })
        }
    }
}

/// Writes a synthetic buffer of exactly `size` bytes while replaying a
/// simulated transfer on `tx`.
pub async fn write_placeholder(
    kind: FormatKind,
    size: u64,
    path: &Path,
    tx: &ProgressSender,
) -> Result<u64> {
    if size > MAX_PLACEHOLDER_SIZE {
        bail!(
            "Placeholder size {} exceeds the {} byte limit",
            size,
            MAX_PLACEHOLDER_SIZE
        );
    }
    let size = usize::try_from(size).context("Placeholder size does not fit in memory")?;
    if size < container::header_len(kind) {
        warn!(
            "{} bytes is shorter than the {:?} header, the file will be truncated",
            size, kind
        );
    }
    let data = container::generate(kind, size);

    progress::simulate(data.len(), tx).await;
    report(tx, 98.0, Stage::Finalizing, None).await;
    save_bytes(path, &data).await?;
    report(tx, 100.0, Stage::Complete, None).await;

    Ok(data.len() as u64)
}

/// Writes through a `.part` file so a crash never leaves a truncated file
/// under the final name.
pub async fn save_bytes(path: &Path, data: &[u8]) -> Result<()> {
    let part = part_path_for(path);
    tokio::fs::write(&part, data)
        .await
        .with_context(|| format!("Failed to write {}", part.display()))?;
    tokio::fs::rename(&part, path)
        .await
        .with_context(|| format!("Failed to move file into place at {}", path.display()))
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    tx: &ProgressSender,
) -> Result<u64> {
    let part = part_path_for(path);
    let result = stream_to_part(client, url, &part, tx).await;

    match result {
        Ok(bytes) => {
            report(tx, 95.0, Stage::Finalizing, None).await;
            tokio::fs::rename(&part, path)
                .await
                .with_context(|| format!("Failed to move file into place at {}", path.display()))?;
            report(tx, 100.0, Stage::Complete, None).await;
            Ok(bytes)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            Err(e)
        }
    }
}

async fn stream_to_part(
    client: &reqwest::Client,
    url: &str,
    part: &Path,
    tx: &ProgressSender,
) -> Result<u64> {
    report(tx, 5.0, Stage::Connecting, None).await;

    let response = client
        .get(url)
        .header(REFERER, TIKTOK_REFERER)
        .header(ORIGIN, "https://www.tiktok.com")
        .send()
        .await
        .context("Failed to fetch media URL")?;

    let status = response.status();
    if !status.is_success() {
        bail!("HTTP {}", status);
    }

    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if is_html {
        bail!("Received an HTML page instead of media");
    }

    let total = response.content_length().unwrap_or(0);
    report(tx, 15.0, Stage::Downloading, None).await;

    let mut file = tokio::fs::File::create(part)
        .await
        .with_context(|| format!("Failed to create {}", part.display()))?;
    let mut stream = response.bytes_stream();
    let mut meter = SpeedMeter::new();
    let mut done: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Failed to read media data")?;
        file.write_all(&chunk)
            .await
            .context("Failed to write media data")?;
        done += chunk.len() as u64;

        if total > 0 {
            if let Some(speed) = meter.sample(done) {
                report(
                    tx,
                    progress::streamed_percent(done, total),
                    Stage::Downloading,
                    Some(speed),
                )
                .await;
            }
        }
    }

    file.flush().await.context("Failed to flush media file")?;

    if total > 0 && done != total {
        bail!("Transfer ended after {} of {} bytes", done, total);
    }

    Ok(done)
}
