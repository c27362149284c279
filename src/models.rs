use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Metric keys the backend reports per model response.
pub const METRIC_COST: &str = "estimated_cost_usd";
pub const METRIC_TIME: &str = "time_seconds";
pub const METRIC_PROMPT_TOKENS: &str = "prompt_tokens";
pub const METRIC_COMPLETION_TOKENS: &str = "completion_tokens";
/// Key the top-level `time_seconds` is merged under when flattening metrics.
pub const METRIC_SPEED: &str = "speed";

/// A catalog industry entry. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    pub id: String,
    pub name: String,
}

/// One evaluation dimension, presented as a fixed seven-step sequence.
///
/// Ordering is significant: stage N maps to phase N and phases must be
/// completed in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Comprehension,
    Reasoning,
    Technical,
    Language,
    InstructionFollowing,
    Creativity,
    BiasAwareness,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Comprehension,
        Stage::Reasoning,
        Stage::Technical,
        Stage::Language,
        Stage::InstructionFollowing,
        Stage::Creativity,
        Stage::BiasAwareness,
    ];

    /// Phase number in [1, 7].
    pub fn phase(self) -> u8 {
        match self {
            Stage::Comprehension => 1,
            Stage::Reasoning => 2,
            Stage::Technical => 3,
            Stage::Language => 4,
            Stage::InstructionFollowing => 5,
            Stage::Creativity => 6,
            Stage::BiasAwareness => 7,
        }
    }

    pub fn from_phase(phase: u8) -> Option<Stage> {
        Stage::ALL.iter().copied().find(|s| s.phase() == phase)
    }

    pub fn from_name(name: &str) -> Option<Stage> {
        Stage::ALL.iter().copied().find(|s| s.name() == name)
    }

    /// Display label, also the key used by the catalog and the backend.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Comprehension => "Comprehension",
            Stage::Reasoning => "Reasoning",
            Stage::Technical => "Technical",
            Stage::Language => "Language",
            Stage::InstructionFollowing => "Instruction Following",
            Stage::Creativity => "Creativity",
            Stage::BiasAwareness => "Bias Awareness",
        }
    }

    /// The two metrics shown for this stage's evaluation.
    pub fn metric_pair(self) -> (&'static str, &'static str) {
        match self {
            Stage::Comprehension => ("Understanding", "Clarity"),
            Stage::Reasoning => ("Coherence", "Correctness"),
            Stage::Technical => ("Accuracy", "Depth"),
            Stage::Language => ("Fluency", "Grammar"),
            Stage::InstructionFollowing => ("Compliance", "Completeness"),
            Stage::Creativity => ("Originality", "Expressiveness"),
            Stage::BiasAwareness => ("Neutrality", "Fairness"),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Display identity for a model id: name, element theme and accent color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub id: String,
    pub name: String,
    pub element: String,
    pub color: String,
}

/// Resolve a model id to its display profile.
///
/// Unknown ids fall back to the raw id as name/element with a neutral color.
pub fn model_profile(id: &str) -> ModelProfile {
    let (name, element, color) = match id {
        "chatgpt" => ("Water AI", "Water", "blue"),
        "gemini" => ("Air AI", "Air", "indigo"),
        "llama" => ("Earth AI", "Earth", "green"),
        "claude" => ("Fire AI", "Fire", "red"),
        // Offline demo models keep their element identities.
        "earth" => ("EarthGPT", "Earth", "green"),
        "water" => ("AquaLLM", "Water", "blue"),
        "fire" => ("FireMind", "Fire", "red"),
        "wind" => ("WindAI", "Wind", "indigo"),
        other => (other, other, "gray"),
    };
    ModelProfile {
        id: id.to_string(),
        name: name.to_string(),
        element: element.to_string(),
        color: color.to_string(),
    }
}

/// One model's answer to a question, with its reported metrics.
///
/// Created by the response collector; immutable once received and discarded
/// when a new question is selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    pub model_id: String,
    pub model_name: String,
    pub element: String,
    pub color: String,
    /// Generated text (markdown).
    pub response: String,
    pub metrics: HashMap<String, f64>,
}

impl ModelResponse {
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }
}

/// Per-model score record from the meta-evaluation backend.
///
/// Metric values arrive as loose JSON keyed by the stage's metric names;
/// anything missing or non-numeric reads as 0 rather than failing the view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelScore {
    #[serde(rename = "proprietaryScore")]
    pub proprietary_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, serde_json::Value>,
}

impl ModelScore {
    /// Metric value for display; missing or non-numeric renders as 0.
    pub fn metric(&self, name: &str) -> f64 {
        self.metrics
            .get(name)
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0)
    }
}

/// Meta-evaluation response for one (stage, industry, responses) tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub stage: String,
    pub evaluation: BTreeMap<String, ModelScore>,
}

/// The model with the highest proprietary score; ties break to the
/// first-encountered key in iteration order.
pub fn recommended_model(evaluation: &BTreeMap<String, ModelScore>) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for (id, score) in evaluation {
        match best {
            Some((_, s)) if score.proprietary_score <= s => {}
            _ => best = Some((id.as_str(), score.proprietary_score)),
        }
    }
    best.map(|(id, _)| id)
}

/// industry -> model -> metric -> score, as persisted under `reportData`.
pub type ReportData = BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>;

/// Token usage forwarded to the meta-evaluation payload. Absent fields stay
/// absent rather than defaulting to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
}

/// Sampling parameters sent with chat and comparison requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 1000,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// Display explanations for the per-response stats, cached in the store
/// under `statExplanations` the first time a session runs.
pub fn metric_glossary() -> BTreeMap<String, String> {
    [
        (METRIC_TIME, "Wall-clock seconds to produce the response"),
        (METRIC_COST, "Approximate request cost in USD"),
        (METRIC_PROMPT_TOKENS, "Tokens consumed by the prompt"),
        (METRIC_COMPLETION_TOKENS, "Tokens generated in the response"),
        (METRIC_SPEED, "End-to-end latency of the comparison call"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// One chat exchange persisted under `chatHistory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Response from the single-model chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub metrics: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_phase_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_phase(stage.phase()), Some(stage));
        }
        assert_eq!(Stage::from_phase(0), None);
        assert_eq!(Stage::from_phase(8), None);
    }

    #[test]
    fn test_stage_ordering_is_one_to_seven() {
        let phases: Vec<u8> = Stage::ALL.iter().map(|s| s.phase()).collect();
        assert_eq!(phases, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_reasoning_metric_pair() {
        assert_eq!(Stage::Reasoning.metric_pair(), ("Coherence", "Correctness"));
    }

    #[test]
    fn test_model_profile_known_ids() {
        let profile = model_profile("claude");
        assert_eq!(profile.name, "Fire AI");
        assert_eq!(profile.element, "Fire");
        assert_eq!(profile.color, "red");
    }

    #[test]
    fn test_model_profile_unknown_id_falls_back() {
        let profile = model_profile("mystery-9b");
        assert_eq!(profile.name, "mystery-9b");
        assert_eq!(profile.element, "mystery-9b");
        assert_eq!(profile.color, "gray");
    }

    #[test]
    fn test_model_score_missing_metric_reads_zero() {
        let score: ModelScore = serde_json::from_value(json!({
            "proprietaryScore": 88.0,
            "Coherence": 91.5,
        }))
        .unwrap();
        assert_eq!(score.metric("Coherence"), 91.5);
        assert_eq!(score.metric("Correctness"), 0.0);
    }

    #[test]
    fn test_model_score_non_numeric_metric_reads_zero() {
        let score: ModelScore = serde_json::from_value(json!({
            "proprietaryScore": 70.0,
            "Coherence": "strong",
        }))
        .unwrap();
        assert_eq!(score.metric("Coherence"), 0.0);
    }

    #[test]
    fn test_recommended_model_highest_proprietary_score() {
        let mut evaluation = BTreeMap::new();
        for (id, score) in [
            ("chatgpt", 82.0),
            ("gemini", 75.0),
            ("llama", 68.0),
            ("claude", 90.0),
        ] {
            evaluation.insert(
                id.to_string(),
                ModelScore {
                    proprietary_score: score,
                    explanation: None,
                    metrics: BTreeMap::new(),
                },
            );
        }
        assert_eq!(recommended_model(&evaluation), Some("claude"));
    }

    #[test]
    fn test_recommended_model_tie_takes_first_key() {
        let mut evaluation = BTreeMap::new();
        for id in ["gemini", "chatgpt"] {
            evaluation.insert(
                id.to_string(),
                ModelScore {
                    proprietary_score: 80.0,
                    explanation: None,
                    metrics: BTreeMap::new(),
                },
            );
        }
        // BTreeMap iterates in key order, so "chatgpt" is encountered first.
        assert_eq!(recommended_model(&evaluation), Some("chatgpt"));
    }

    #[test]
    fn test_recommended_model_empty() {
        assert_eq!(recommended_model(&BTreeMap::new()), None);
    }

    #[test]
    fn test_token_counts_skip_absent_fields() {
        let counts = TokenCounts {
            prompt_tokens: Some(12),
            completion_tokens: None,
        };
        let value = serde_json::to_value(&counts).unwrap();
        assert_eq!(value, json!({"prompt_tokens": 12}));
    }
}
