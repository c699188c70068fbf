//! In-memory stand-ins for the upstream API, used by unit and integration tests.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::providers::{AuthenticatedClient, InternalSnafu, ProviderError};

/// Replays a fixed script of responses, one per `get`, and records the URLs asked for.
///
/// `Err(message)` entries surface as transport failures.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<Value, String>>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<Value, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            urls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.urls().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuthenticatedClient for ScriptedClient {
    async fn get(&self, url: &str) -> Result<Value, ProviderError> {
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_string());
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => InternalSnafu { message }.fail(),
            None => InternalSnafu {
                message: format!("no scripted response left for {url}"),
            }
            .fail(),
        }
    }
}

/// An `{"errors": [...]}` body.
pub fn upstream_error(error_type: &str, message: &str) -> Value {
    json!({
        "errors": [{"errorType": error_type, "message": message}],
        "success": false
    })
}

/// The body the upstream sends when the hourly allowance is used up.
pub fn rate_limited() -> Value {
    upstream_error("system", "Too Many Requests")
}

/// A resting heart rate success body for `(date, bpm)` pairs; `None` omits the rate.
pub fn heart_body(days: &[(&str, Option<u32>)]) -> Value {
    let entries: Vec<Value> = days
        .iter()
        .map(|(date, bpm)| match bpm {
            Some(bpm) => json!({"dateTime": date, "value": {"restingHeartRate": bpm, "heartRateZones": []}}),
            None => json!({"dateTime": date, "value": {"heartRateZones": []}}),
        })
        .collect();
    json!({"activities-heart": entries})
}
