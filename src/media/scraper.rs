use super::source::{accept_payload, MetadataSource, TIKTOK_REFERER};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, REFERER};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

/// Public scraping endpoint that takes the TikTok link as a `url` query
/// parameter and answers with JSON.
pub struct ScraperEndpoint {
    name: &'static str,
    base: &'static str,
    extra_params: &'static [(&'static str, &'static str)],
    client: reqwest::Client,
}

impl ScraperEndpoint {
    pub fn tikwm(client: reqwest::Client) -> Self {
        Self {
            name: "TikWM",
            base: "https://www.tikwm.com/api/",
            extra_params: &[("hd", "1")],
            client,
        }
    }

    pub fn ssstik(client: reqwest::Client) -> Self {
        Self {
            name: "SSSTik",
            base: "https://ssstik.io/abc",
            extra_params: &[],
            client,
        }
    }

    pub fn endpoint_url(&self, url: &str) -> Result<Url> {
        let params = std::iter::once(("url", url)).chain(self.extra_params.iter().copied());
        Url::parse_with_params(self.base, params)
            .with_context(|| format!("Failed to build {} request URL", self.name))
    }
}

#[async_trait]
impl MetadataSource for ScraperEndpoint {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        let endpoint = self.endpoint_url(url)?;
        debug!("Querying {}: {}", self.name, endpoint);

        let response = self
            .client
            .get(endpoint)
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(REFERER, TIKTOK_REFERER)
            .send()
            .await
            .with_context(|| format!("{}: request failed", self.name))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("{}: HTTP {}", self.name, status));
        }

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("{}: response is not valid JSON", self.name))?;

        debug!("{} raw response: {}", self.name, body);
        let payload = accept_payload(self.name, body)?;
        info!("{} returned metadata", self.name);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tikwm_endpoint_url_encodes_link() {
        let endpoint = ScraperEndpoint::tikwm(reqwest::Client::new());
        let url = endpoint
            .endpoint_url("https://www.tiktok.com/@user/video/123?lang=en")
            .unwrap();
        assert_eq!(url.host_str(), Some("www.tikwm.com"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                (
                    "url".to_string(),
                    "https://www.tiktok.com/@user/video/123?lang=en".to_string()
                ),
                ("hd".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_ssstik_has_no_extra_params() {
        let endpoint = ScraperEndpoint::ssstik(reqwest::Client::new());
        assert_eq!(endpoint.name(), "SSSTik");
        let url = endpoint.endpoint_url("https://vm.tiktok.com/abc/").unwrap();
        assert_eq!(url.query_pairs().count(), 1);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_tikwm_live() {
        let endpoint = ScraperEndpoint::tikwm(reqwest::Client::new());
        let result = endpoint
            .fetch("https://www.tiktok.com/@tiktok/video/7106594312292453675")
            .await;
        assert!(result.is_ok());
    }
}
