use crate::models::{ChatTurn, ReportData};
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const KEY_ACCESS_TOKEN: &str = "access_token";
pub const KEY_USER: &str = "user";
pub const KEY_SELECTED_INDUSTRY: &str = "selectedIndustry";
pub const KEY_STAT_EXPLANATIONS: &str = "statExplanations";
pub const KEY_USER_PREFERENCES: &str = "userPreferences";
pub const KEY_CHAT_HISTORY: &str = "chatHistory";
pub const KEY_REPORT_DATA: &str = "reportData";
pub const KEY_RESET_PHASE: &str = "resetPhase";

/// JSON-file-backed key/value store, standing in for browser local storage.
///
/// Reads are served from memory; every write goes to disk synchronously.
/// Writes are sparse and user-driven, so last-writer-wins is acceptable.
pub struct LocalStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl LocalStore {
    /// Open the store at `path`, loading existing entries if the file exists.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read store file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse store file: {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content =
            serde_json::to_string_pretty(&self.entries).context("Failed to serialize store")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write store file: {}", self.path.display()))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).context("Failed to serialize store value")?;
        self.entries.insert(key.to_string(), value);
        self.persist()
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(KEY_ACCESS_TOKEN)
    }

    pub fn set_access_token(&mut self, token: &str) -> Result<()> {
        self.set(KEY_ACCESS_TOKEN, &token)
    }

    pub fn user(&self) -> Option<Value> {
        self.get(KEY_USER)
    }

    pub fn set_user(&mut self, user: &Value) -> Result<()> {
        self.set(KEY_USER, user)
    }

    pub fn selected_industry(&self) -> Option<String> {
        self.get(KEY_SELECTED_INDUSTRY)
    }

    pub fn set_selected_industry(&mut self, industry_id: &str) -> Result<()> {
        self.set(KEY_SELECTED_INDUSTRY, &industry_id)
    }

    pub fn clear_selected_industry(&mut self) -> Result<()> {
        self.remove(KEY_SELECTED_INDUSTRY)
    }

    pub fn chat_history(&self) -> Vec<ChatTurn> {
        self.get(KEY_CHAT_HISTORY).unwrap_or_default()
    }

    pub fn set_chat_history(&mut self, history: &[ChatTurn]) -> Result<()> {
        self.set(KEY_CHAT_HISTORY, &history)
    }

    pub fn report_data(&self) -> Option<ReportData> {
        self.get(KEY_REPORT_DATA)
    }

    pub fn set_report_data(&mut self, report: &ReportData) -> Result<()> {
        self.set(KEY_REPORT_DATA, report)
    }

    pub fn stat_explanations(&self) -> Option<BTreeMap<String, String>> {
        self.get(KEY_STAT_EXPLANATIONS)
    }

    pub fn set_stat_explanations(&mut self, explanations: &BTreeMap<String, String>) -> Result<()> {
        self.set(KEY_STAT_EXPLANATIONS, explanations)
    }

    pub fn user_preferences(&self) -> Option<Value> {
        self.get(KEY_USER_PREFERENCES)
    }

    pub fn set_user_preferences(&mut self, preferences: &Value) -> Result<()> {
        self.set(KEY_USER_PREFERENCES, preferences)
    }

    /// Post the one-shot phase-reset signal.
    pub fn mark_reset_phase(&mut self) -> Result<()> {
        self.set(KEY_RESET_PHASE, &true)
    }

    /// Consume the phase-reset signal: returns whether it was set and
    /// deletes it, so a second read sees nothing.
    pub fn take_reset_phase(&mut self) -> Result<bool> {
        let set = self.get::<bool>(KEY_RESET_PHASE).unwrap_or(false);
        if set {
            self.remove(KEY_RESET_PHASE)?;
        }
        Ok(set)
    }
}
