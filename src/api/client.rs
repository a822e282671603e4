//! TonVerse HTTP client.
//!
//! Form-encoded POSTs against `https://api.tonverse.app`. The browser
//! header set the web client sends is attached to every request; gzip
//! bodies are inflated by reqwest before decoding.
//!
//! Auth: the session token travels in the form body, not in headers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::{Form, GameApi};
use crate::types::{ApiError, JsonObject};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.tonverse.app";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Headers the game's web client sends. Content-Type is set per request
/// by the form encoder.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("Accept", "*/*"),
    ("Accept-Encoding", "gzip"),
    ("Accept-Language", "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"),
    ("Origin", "https://app.tonverse.app"),
    ("Referer", "https://app.tonverse.app/"),
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    ),
];

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// reqwest-backed [`GameApi`].
#[derive(Debug, Clone)]
pub struct TonverseClient {
    http: Client,
    base_url: String,
}

impl TonverseClient {
    /// Create a client for `base_url`.
    ///
    /// `extra_headers` are layered over the browser header set; a
    /// configured header with the same name replaces the built-in one.
    pub fn new(base_url: &str, extra_headers: &BTreeMap<String, String>) -> Result<Self> {
        let headers = build_headers(extra_headers)?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .gzip(true)
            .build()
            .context("Failed to build HTTP client for TonVerse")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn build_headers(extra_headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let builtin = BROWSER_HEADERS.iter().map(|(k, v)| (*k, *v));
    let extra = extra_headers.iter().map(|(k, v)| (k.as_str(), v.as_str()));

    for (name, value) in builtin.chain(extra) {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("Invalid header name: {name}"))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid value for header {}", name.as_str()))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

#[async_trait]
impl GameApi for TonverseClient {
    async fn post(&self, endpoint: &str, form: &Form) -> Result<JsonObject, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, "TonVerse API request");

        let resp = self
            .http
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| {
            if e.is_decode() {
                ApiError::Decode(e.to_string())
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        if status != StatusCode::OK {
            return Err(ApiError::RemoteStatus(status.to_string()));
        }

        decode_object(&body)
    }
}

/// Parse a response body that must be a JSON object.
fn decode_object(body: &[u8]) -> Result<JsonObject, ApiError> {
    match serde_json::from_slice(body) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(ApiError::Decode(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
