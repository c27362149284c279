use crate::client::{ApiClient, ApiError};
use crate::models::{GenerationParams, METRIC_SPEED, ModelResponse, model_profile};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A newer question was submitted while this fetch was in flight. The
    /// caller must drop the result instead of updating its view.
    #[error("Superseded by a newer question")]
    Superseded,
}

#[derive(Serialize)]
struct CompareRequest<'a> {
    prompt: &'a str,
    temperature: f64,
    max_tokens: u32,
}

/// Fetches parallel model responses for a prompt and normalizes the
/// heterogeneous per-model payloads into uniform records.
///
/// One call per question is in flight at a time in the sense that matters:
/// a later call supersedes an earlier one, and the earlier one resolves to
/// `CompareError::Superseded` so stale responses never reach the caller.
pub struct ResponseCollector {
    client: Arc<ApiClient>,
    params: GenerationParams,
    generation: AtomicU64,
}

impl ResponseCollector {
    pub fn new(client: Arc<ApiClient>, params: GenerationParams) -> Self {
        Self {
            client,
            params,
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch one response per model for `question`.
    ///
    /// The supersession ticket is claimed when this is called, not when the
    /// future is first polled, so call order defines which fetch wins.
    pub fn fetch_responses<'a>(
        &'a self,
        question: &'a str,
    ) -> impl Future<Output = Result<Vec<ModelResponse>, CompareError>> + 'a {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            let body = CompareRequest {
                prompt: question,
                temperature: self.params.temperature,
                max_tokens: self.params.max_tokens,
            };
            let payload: Value = self.client.post("/compare/compare", &body).await?;
            if self.generation.load(Ordering::SeqCst) != ticket {
                return Err(CompareError::Superseded);
            }
            Ok(fan_out(&payload))
        }
    }
}

/// Fan a single comparison payload out into one record per top-level key.
pub fn fan_out(payload: &Value) -> Vec<ModelResponse> {
    payload
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(model_id, data)| normalize_model(model_id, data))
                .collect()
        })
        .unwrap_or_default()
}

/// Normalize one model's payload, tolerating the two nesting depths the
/// backend produces: text at `response.response` or `response`, metrics at
/// `response.metrics` or `metrics`. The top-level `time_seconds` merges into
/// the metrics as `speed`.
fn normalize_model(model_id: &str, data: &Value) -> ModelResponse {
    let profile = model_profile(model_id);

    let text = data
        .get("response")
        .and_then(|r| r.get("response"))
        .and_then(Value::as_str)
        .or_else(|| data.get("response").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    let mut metrics = data
        .get("response")
        .and_then(|r| r.get("metrics"))
        .or_else(|| data.get("metrics"))
        .map(numeric_entries)
        .unwrap_or_default();

    if let Some(seconds) = data.get("time_seconds").and_then(Value::as_f64) {
        metrics.insert(METRIC_SPEED.to_string(), seconds);
    }

    ModelResponse {
        model_id: profile.id,
        model_name: profile.name,
        element: profile.element,
        color: profile.color,
        response: text,
        metrics,
    }
}

fn numeric_entries(value: &Value) -> HashMap<String, f64> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default()
}
