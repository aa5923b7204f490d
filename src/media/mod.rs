mod classify;
mod container;
mod download;
mod extract;
mod filename;
mod progress;
mod rapidapi;
mod scraper;
mod source;
mod synthetic;
mod types;

pub use classify::validate_url;
pub use download::{write_placeholder, DownloadOutcome, FallbackPolicy};
pub use filename::generate_filename;
pub use progress::{ProgressUpdate, Stage};
pub use rapidapi::verify_key;
pub use types::{ContentInfo, ContentType, DownloadUrl, Format, FormatKind};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rapidapi::RapidApiEndpoint;
use scraper::ScraperEndpoint;
use source::MetadataSource;
use std::{path::Path, time::Duration};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(source::BROWSER_USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Entry point for everything the CLI does with a TikTok link: classify it,
/// fetch its metadata, name and save its files.
pub struct TikTokService {
    client: reqwest::Client,
    sources: Vec<Box<dyn MetadataSource>>,
}

impl TikTokService {
    pub fn new(api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = build_client(timeout)?;

        // Keyed endpoint first when configured, then the public scrapers
        let mut sources: Vec<Box<dyn MetadataSource>> = Vec::new();
        if let Some(key) = api_key {
            sources.push(Box::new(RapidApiEndpoint::new(client.clone(), key)));
        }
        sources.push(Box::new(ScraperEndpoint::tikwm(client.clone())));
        sources.push(Box::new(ScraperEndpoint::ssstik(client.clone())));

        info!(
            "TikTok service initialized with sources: {}",
            sources
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self::with_sources(client, sources))
    }

    pub fn with_sources(client: reqwest::Client, sources: Vec<Box<dyn MetadataSource>>) -> Self {
        Self { client, sources }
    }

    pub fn validate_url(&self, url: &str) -> bool {
        classify::validate_url(url)
    }

    /// Queries each source in order. When all of them fail the record is
    /// generated from the URL alone and flagged `synthetic`.
    pub async fn fetch_info(&self, url: &str) -> Result<ContentInfo> {
        let url = url.trim();
        if !self.validate_url(url) {
            return Err(anyhow!(
                "Invalid TikTok URL. Please enter a valid TikTok video link."
            ));
        }

        info!("Fetching TikTok content info for: {}", url);
        let mut errors = Vec::new();

        for source in &self.sources {
            match source.fetch(url).await {
                Ok(payload) => {
                    info!("Metadata retrieved with {}", source.name());
                    return Ok(extract::process_response(
                        &payload,
                        url,
                        source.name(),
                        Utc::now(),
                    ));
                }
                Err(e) => {
                    warn!("{} failed: {:#}", source.name(), e);
                    errors.push(format!("{e}"));
                }
            }
        }

        warn!(
            "All metadata sources failed ({}), generating a synthetic record",
            errors.join(". ")
        );
        Ok(synthetic::fallback_record(url, Utc::now()))
    }

    pub fn generate_filename(&self, format: &Format) -> String {
        filename::generate_filename(format)
    }

    pub async fn download(
        &self,
        info: &ContentInfo,
        format: &Format,
        output_dir: &Path,
        policy: FallbackPolicy,
        tx: &mpsc::Sender<ProgressUpdate>,
    ) -> Result<DownloadOutcome> {
        let path = output_dir.join(self.generate_filename(format));
        download::download_file(&self.client, info, format, path, policy, tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use types::FormatEntry;

    struct FailingSource;

    #[async_trait]
    impl MetadataSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self, _url: &str) -> Result<Value> {
            Err(anyhow!("failing: HTTP 403 Forbidden"))
        }
    }

    struct StaticSource(Value);

    #[async_trait]
    impl MetadataSource for StaticSource {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch(&self, _url: &str) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    fn service(sources: Vec<Box<dyn MetadataSource>>) -> TikTokService {
        TikTokService::with_sources(reqwest::Client::new(), sources)
    }

    #[test]
    fn test_service_new() {
        let service = TikTokService::new(None, Duration::from_secs(5)).unwrap();
        assert_eq!(service.sources.len(), 2);

        let keyed = TikTokService::new(Some("key"), Duration::from_secs(5)).unwrap();
        assert_eq!(keyed.sources.len(), 3);
        assert_eq!(keyed.sources[0].name(), "RapidAPI no-watermark");
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let service = service(vec![Box::new(FailingSource)]);
        let err = service
            .fetch_info("https://example.com/video/1")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid TikTok URL"));
    }

    #[tokio::test]
    async fn test_falls_through_to_next_source() {
        let payload = json!({"title": "From static", "play": "https://cdn.example/v.mp4"});
        let service = service(vec![
            Box::new(FailingSource),
            Box::new(StaticSource(payload)),
        ]);
        let info = service
            .fetch_info("https://www.tiktok.com/@user/video/123")
            .await
            .unwrap();
        assert!(!info.synthetic);
        assert_eq!(info.title, "From static");
        assert!(info.formats[&Format::Hd720].url.is_available());
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_synthetic_record() {
        let service = service(vec![Box::new(FailingSource), Box::new(FailingSource)]);
        let info = service
            .fetch_info("https://www.tiktok.com/@user/photo/77")
            .await
            .unwrap();
        assert!(info.synthetic);
        assert_eq!(info.content_type, ContentType::Photo);
        assert_eq!(info.id, "77");
    }

    #[tokio::test]
    async fn test_download_names_file_from_format() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(Vec::new());
        let mut info = synthetic::fallback_record("https://www.tiktok.com/@u/video/9", Utc::now());
        info.formats.insert(
            Format::Mp3Audio,
            FormatEntry::new(
                DownloadUrl::Placeholder("https://v16-web.tiktok.com/a.mp3".to_string()),
                2000,
            ),
        );
        let (tx, _rx) = mpsc::channel(1024);

        let outcome = service
            .download(
                &info,
                &Format::Mp3Audio,
                dir.path(),
                FallbackPolicy::Placeholder,
                &tx,
            )
            .await
            .unwrap();

        let name = outcome.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tokgrab_"));
        assert!(name.ends_with("_audio.mp3"));
        assert_eq!(outcome.path().parent(), Some(dir.path()));
    }

    #[test]
    fn test_generate_filename_extension() {
        let service = service(Vec::new());
        assert!(service.generate_filename(&Format::Mp3Audio).ends_with(".mp3"));
    }
}
