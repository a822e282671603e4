//! Game API integration.
//!
//! Defines the `GameApi` trait over the remote TonVerse service and the
//! reqwest-backed [`TonverseClient`] implementing it.

pub mod client;

pub use client::TonverseClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::types::{ApiError, JsonObject};

/// Form fields of a single request. Flat string keys and values only.
pub type Form = BTreeMap<String, String>;

pub const GALAXY_COLLECT: &str = "/galaxy/collect";
pub const USER_INFO: &str = "/user/info";
pub const STARS_CREATE: &str = "/stars/create";

/// Abstraction over the remote game service.
///
/// One call, one POST: no retries, no caching. Callers decide what a
/// failure means for the rest of their work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameApi: Send + Sync {
    /// POST `form` to `endpoint` and return the decoded JSON object.
    async fn post(&self, endpoint: &str, form: &Form) -> Result<JsonObject, ApiError>;
}

/// POST and decode the response into the endpoint's typed body.
pub async fn post_typed<T: DeserializeOwned>(
    api: &dyn GameApi,
    endpoint: &str,
    form: &Form,
) -> Result<T, ApiError> {
    let object = api.post(endpoint, form).await?;
    serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| ApiError::Decode(format!("{endpoint}: {e}")))
}

/// Build a form from `(key, value)` pairs.
pub fn form<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Form {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
