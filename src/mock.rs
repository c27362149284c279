//! Canned model data for offline demo runs: no backend, same flow.

use crate::models::{
    ChatReply, EvaluationResult, ModelResponse, ModelScore, Stage, model_profile,
};
use rand::Rng;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

pub const MOCK_MODEL_IDS: [&str; 4] = ["earth", "water", "fire", "wind"];

const FASHION_QUESTION: &str = "What are key sustainability practices in fashion?";

/// One canned response per mock model, with jittered metrics.
pub fn mock_responses(question: &str) -> Vec<ModelResponse> {
    MOCK_MODEL_IDS
        .iter()
        .map(|id| {
            let profile = model_profile(id);
            ModelResponse {
                model_id: profile.id,
                model_name: profile.name,
                element: profile.element,
                color: profile.color,
                response: canned_response(id, question).to_string(),
                metrics: mock_metrics(id),
            }
        })
        .collect()
}

fn canned_response(model_id: &str, question: &str) -> &'static str {
    if question == FASHION_QUESTION {
        return match model_id {
            "earth" => {
                "The fashion industry is adopting several key sustainability practices: \
                 circular economy models that recycle materials, water conservation in \
                 dyeing and finishing, low-impact natural dyes, transparent supply \
                 chains, and durable design that extends garment lifespan."
            }
            "water" => {
                "Fashion sustainability is flowing in new directions: water-efficient \
                 closed-loop production, biodegradable and ocean-safe materials, \
                 adaptable manufacturing, blue-economy principles that protect water \
                 resources, and care innovations that reduce microplastic pollution."
            }
            "fire" => {
                "Fashion sustainability is being revolutionized through radical \
                 transparency, disruptive recycling technologies, bold upcycling \
                 movements, direct-to-consumer models that eliminate middlemen waste, \
                 and advocacy campaigns igniting consumer awareness."
            }
            _ => {
                "Fashion sustainability is evolving through lightweight design that \
                 minimizes material use, agile on-demand production, cloud-coordinated \
                 supply chains, digital and AR fashion, and initiatives that challenge \
                 consumption itself."
            }
        };
    }
    match model_id {
        "earth" => {
            "As an earth-focused model, I ground this answer in practical reality: \
             environmental impact, stability, and concrete long-term implications \
             based on established knowledge."
        }
        "water" => {
            "Approaching this with adaptability and flow, I weigh multiple \
             perspectives and emphasize the intuitive connections between the \
             concepts involved."
        }
        "fire" => {
            "I tackle this with energy and transformative thinking: innovation, \
             disruption of outdated paradigms, and the potential for rapid change."
        }
        _ => {
            "Taking an abstract, conceptual approach, I explore the theoretical \
             frameworks and possibilities beyond conventional boundaries."
        }
    }
}

/// Baseline metric profile per model, jittered into [60, 100].
fn mock_metrics(model_id: &str) -> HashMap<String, f64> {
    let (speed, reasoning, factual, creativity) = match model_id {
        "earth" => (85.0, 90.0, 95.0, 75.0),
        "water" => (80.0, 85.0, 80.0, 90.0),
        "fire" => (95.0, 75.0, 70.0, 95.0),
        _ => (90.0, 95.0, 85.0, 85.0),
    };
    [
        ("speed", speed),
        ("reasoning", reasoning),
        ("factual", factual),
        ("creativity", creativity),
        ("clarity", 85.0),
        ("conciseness", 80.0),
        ("relevance", 90.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), jitter(v)))
    .collect()
}

fn jitter(value: f64) -> f64 {
    let variance = rand::thread_rng().gen_range(-5..=5) as f64;
    (value + variance).clamp(60.0, 100.0)
}

/// A deterministic-shape mock judgment: the stage's metric pair plus a
/// proprietary score derived from the response's own metric profile.
pub fn mock_evaluation(stage: Stage, responses: &[ModelResponse]) -> EvaluationResult {
    let (first, second) = stage.metric_pair();
    let mut evaluation = BTreeMap::new();
    for response in responses {
        let baseline = if response.metrics.is_empty() {
            75.0
        } else {
            response.metrics.values().sum::<f64>() / response.metrics.len() as f64
        };
        let mut metrics = BTreeMap::new();
        metrics.insert(first.to_string(), json!(jitter(baseline)));
        metrics.insert(second.to_string(), json!(jitter(baseline)));
        evaluation.insert(
            response.model_id.clone(),
            ModelScore {
                proprietary_score: jitter(baseline),
                explanation: None,
                metrics,
            },
        );
    }
    EvaluationResult {
        stage: stage.name().to_string(),
        evaluation,
    }
}

pub fn mock_chat_reply(message: &str) -> ChatReply {
    ChatReply {
        response: format!(
            "Here's a grounded take on \"{message}\": the key is to weigh the \
             practical constraints first, then the opportunities they leave open."
        ),
        metrics: Some(json!({
            "time_seconds": 1.4,
            "prompt_tokens": 32,
            "completion_tokens": 118,
            "estimated_cost_usd": 0.004,
        })),
    }
}
