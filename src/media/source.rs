use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";
pub const TIKTOK_REFERER: &str = "https://www.tiktok.com/";

#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Human-readable name of the endpoint
    fn name(&self) -> &'static str;

    /// Fetch the raw metadata payload for a TikTok URL
    async fn fetch(&self, url: &str) -> Result<Value>;
}

/// Unwraps an endpoint envelope. A body is accepted when it carries a
/// non-null `data` field, `code == 0` or `success == true`; the payload is
/// `data` when present, otherwise the whole body.
pub fn accept_payload(source: &str, mut body: Value) -> Result<Value> {
    if !body.is_object() {
        return Err(anyhow!("{}: response is not a JSON object", source));
    }

    let has_data = body.get("data").is_some_and(|data| !data.is_null());
    let code_ok = body.get("code").and_then(Value::as_i64) == Some(0);
    let success = body.get("success").and_then(Value::as_bool) == Some(true);

    if !(has_data || code_ok || success) {
        let message = body
            .get("msg")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("No valid data received");
        return Err(anyhow!("{}: {}", source, message));
    }

    if has_data {
        Ok(body["data"].take())
    } else {
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_data_envelope() {
        let payload = accept_payload("TikWM", json!({"code": 0, "data": {"id": "1"}})).unwrap();
        assert_eq!(payload, json!({"id": "1"}));
    }

    #[test]
    fn test_accepts_flat_success_body() {
        let payload = accept_payload("SSSTik", json!({"success": true, "play": "x"})).unwrap();
        assert_eq!(payload["play"], "x");
    }

    #[test]
    fn test_rejects_error_envelope_with_message() {
        let err = accept_payload("TikWM", json!({"code": -1, "msg": "Url parsing is failed!"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "TikWM: Url parsing is failed!");
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(accept_payload("TikWM", json!([1, 2])).is_err());
        assert!(accept_payload("TikWM", json!({"success": false})).is_err());
    }
}
