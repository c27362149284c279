use crate::storage::LocalStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Default per-request deadline; the underlying request is cancelled when it
/// elapses.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(29_000);

/// Routes that never carry the bearer token.
const EXCLUDED_ROUTES: [&str; 2] = ["/auth/login", "/auth/signup"];

const GENERIC_ERROR: &str = "Something went wrong";

/// Errors surfaced by the API gateway.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("Could not reach server: {0}")]
    Transport(reqwest::Error),

    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(err)
        }
    }
}

/// Single chokepoint for backend I/O: every other component issues its HTTP
/// calls through here, never directly.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<Mutex<LocalStore>>,
    default_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<Mutex<LocalStore>>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    fn requires_token(endpoint: &str) -> bool {
        !EXCLUDED_ROUTES.iter().any(|route| endpoint.contains(route))
    }

    /// POST a JSON body and decode a JSON response, with the default timeout.
    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.post_with_timeout(endpoint, body, self.default_timeout)
            .await
    }

    /// POST with an explicit deadline. On a non-2xx result the body is probed
    /// for `{message}`; an unparseable body yields a generic message.
    pub async fn post_with_timeout<B, T>(
        &self,
        endpoint: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self
            .http
            .post(&url)
            .timeout(timeout)
            .header("Content-Type", "application/json")
            .json(body);

        if Self::requires_token(endpoint) {
            let token = self.store.lock().expect("store mutex poisoned").access_token();
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| GENERIC_ERROR.to_string());
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
