use crate::models::GenerationParams;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for one scripted demo session.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Backend base URL (ignored when running offline).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the persistent key/value store file.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Use canned mock data instead of the backend.
    #[serde(default)]
    pub offline: bool,
    /// Per-request deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Temperature for response generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Maximum tokens for response generation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub frequency_penalty: f64,
    #[serde(default)]
    pub presence_penalty: f64,
    /// Reuse generation parameters persisted under `userPreferences` from a
    /// previous session instead of this file's values.
    #[serde(default)]
    pub use_stored_preferences: bool,
    /// Login credentials; omitted when a stored token should be reused.
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    /// Messages for the phase-1 chat sandbox.
    #[serde(default)]
    pub chat: Vec<String>,
    /// One entry per evaluation phase, consumed in order for phases 2..7.
    #[serde(default)]
    pub plan: Vec<PhasePlan>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub email: String,
    /// Environment variable name containing the password
    pub env_var_password: String,
    /// Create the account before logging in.
    #[serde(default)]
    pub signup: Option<SignupDetails>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignupDetails {
    pub name: String,
    pub company_name: String,
}

/// Scripted choices for one evaluation phase.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhasePlan {
    pub industry: String,
    /// Literal question text; overrides `question_index`.
    #[serde(default)]
    pub question: Option<String>,
    /// Index into the catalog's question list for (industry, stage).
    #[serde(default)]
    pub question_index: Option<usize>,
    /// Model id to select; defaults to the first response.
    #[serde(default)]
    pub choose: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_storage_path() -> String {
    "coreeval_store.json".to_string()
}

fn default_timeout_ms() -> u64 {
    29_000
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    1.0
}

fn default_max_tokens() -> u32 {
    1000
}

impl SessionConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML session file: {}", path.display()))
    }

    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            frequency_penalty: self.frequency_penalty,
            presence_penalty: self.presence_penalty,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
