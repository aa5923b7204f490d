use super::source::{accept_payload, MetadataSource};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

const RAPIDAPI_HOST: &str = "tiktok-video-no-watermark2.p.rapidapi.com";
const KEY_HEADER: &str = "X-RapidAPI-Key";
const HOST_HEADER: &str = "X-RapidAPI-Host";
const KEY_CHECK_URL: &str = "https://www.tiktok.com/@test/video/1234567890";

/// Keyed endpoint that serves watermark-free renditions. Only queried when
/// an API key is configured.
pub struct RapidApiEndpoint {
    client: reqwest::Client,
    api_key: String,
}

impl RapidApiEndpoint {
    pub fn new(client: reqwest::Client, api_key: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
        }
    }

    fn base_url() -> String {
        format!("https://{RAPIDAPI_HOST}/")
    }
}

fn is_rejected_key(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[async_trait]
impl MetadataSource for RapidApiEndpoint {
    fn name(&self) -> &'static str {
        "RapidAPI no-watermark"
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        let endpoint = Url::parse_with_params(&Self::base_url(), &[("url", url), ("hd", "1")])
            .context("Failed to build RapidAPI request URL")?;
        debug!("Querying RapidAPI for: {}", url);

        let response = self
            .client
            .get(endpoint)
            .header(KEY_HEADER, &self.api_key)
            .header(HOST_HEADER, RAPIDAPI_HOST)
            .send()
            .await
            .context("RapidAPI: request failed")?;

        let status = response.status();
        if is_rejected_key(status) {
            bail!("RapidAPI: API key rejected (HTTP {})", status);
        }
        if !status.is_success() {
            return Err(anyhow!("RapidAPI: HTTP {}", status));
        }

        let body: Value = response
            .json()
            .await
            .context("RapidAPI: response is not valid JSON")?;
        let payload = accept_payload(self.name(), body)?;
        info!("RapidAPI returned metadata");
        Ok(payload)
    }
}

/// Probes the endpoint with `api_key`. The probe link does not exist, so any
/// answer other than 401/403 means the key itself was accepted.
pub async fn verify_key(client: &reqwest::Client, api_key: &str) -> Result<bool> {
    let response = client
        .post(RapidApiEndpoint::base_url())
        .header(KEY_HEADER, api_key.trim())
        .header(HOST_HEADER, RAPIDAPI_HOST)
        .json(&json!({ "url": KEY_CHECK_URL, "hd": 1 }))
        .send()
        .await
        .context("Failed to reach RapidAPI")?;

    let accepted = !is_rejected_key(response.status());
    info!(
        "RapidAPI key check returned HTTP {} ({})",
        response.status(),
        if accepted { "accepted" } else { "rejected" }
    );
    Ok(accepted)
}
