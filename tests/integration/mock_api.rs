//! In-memory game API and notifier for integration testing.
//!
//! `ScriptedApi` answers each (endpoint, session) pair from a script and
//! records every call; `RecordingNotifier` keeps every delivered text.
//! No network, fully deterministic.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tinyverse::api::{Form, GameApi};
use tinyverse::notify::Notifier;
use tinyverse::types::{ApiError, DeliveryError, JsonObject};

/// A recorded API call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub endpoint: String,
    pub form: Form,
}

/// Scripted [`GameApi`]: replies per endpoint and session.
#[derive(Clone, Default)]
pub struct ScriptedApi {
    replies: Arc<Mutex<HashMap<(String, String), Result<Value, ApiError>>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `endpoint` for `session` with `reply` on every call.
    pub fn reply(&self, endpoint: &str, session: &str, reply: Result<Value, ApiError>) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .insert((endpoint.to_string(), session.to_string()), reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.endpoint == endpoint)
            .collect()
    }
}

#[async_trait]
impl GameApi for ScriptedApi {
    async fn post(&self, endpoint: &str, form: &Form) -> Result<JsonObject, ApiError> {
        self.calls.lock().unwrap().push(Call {
            endpoint: endpoint.to_string(),
            form: form.clone(),
        });

        let session = form.get("session").cloned().unwrap_or_default();
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&(endpoint.to_string(), session))
            .cloned()
            .unwrap_or_else(|| Err(ApiError::RemoteStatus("404 Not Found".into())));

        match reply? {
            Value::Object(map) => Ok(map),
            other => Err(ApiError::Decode(format!("scripted reply is not an object: {other}"))),
        }
    }
}

/// Notifier that keeps every message it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingNotifier {
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn chat_ids(&self) -> Vec<i64> {
        self.sent.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tinyverse::api::form;

    #[tokio::test]
    async fn test_scripted_reply_and_recording() {
        let api = ScriptedApi::new();
        api.reply("/galaxy/collect", "A", Ok(json!({"response": {"success": 1}})));

        let ok = api.post("/galaxy/collect", &form([("session", "A")])).await;
        assert!(ok.is_ok());

        let missing = api.post("/galaxy/collect", &form([("session", "Z")])).await;
        assert_eq!(missing.unwrap_err(), ApiError::RemoteStatus("404 Not Found".into()));

        assert_eq!(api.calls().len(), 2);
        assert_eq!(api.calls_to("/user/info").len(), 0);
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::default();
        notifier.send(5, "hi").await.unwrap();
        assert_eq!(notifier.texts(), vec!["hi"]);
        assert_eq!(notifier.chat_ids(), vec![5]);
    }
}
