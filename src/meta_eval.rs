use crate::client::{ApiClient, ApiError};
use crate::models::{
    EvaluationResult, METRIC_COMPLETION_TOKENS, METRIC_COST, METRIC_PROMPT_TOKENS, METRIC_TIME,
    ModelResponse, Stage, TokenCounts,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Payload for the secondary per-stage judgment. Metrics a model never
/// reported are absent from the maps rather than defaulted.
#[derive(Debug, Serialize)]
pub struct MetaEvalRequest {
    pub stage: String,
    pub industry: String,
    pub prompt: String,
    pub responses: BTreeMap<String, String>,
    pub costs: BTreeMap<String, f64>,
    pub times: BTreeMap<String, f64>,
    pub tokens: BTreeMap<String, TokenCounts>,
}

/// Assemble the scoring payload from the collected responses.
pub fn build_payload(
    stage: Stage,
    industry: &str,
    prompt: &str,
    responses: &[ModelResponse],
) -> MetaEvalRequest {
    let mut texts = BTreeMap::new();
    let mut costs = BTreeMap::new();
    let mut times = BTreeMap::new();
    let mut tokens = BTreeMap::new();

    for response in responses {
        texts.insert(response.model_id.clone(), response.response.clone());
        if let Some(cost) = response.metric(METRIC_COST) {
            costs.insert(response.model_id.clone(), cost);
        }
        if let Some(time) = response.metric(METRIC_TIME) {
            times.insert(response.model_id.clone(), time);
        }
        tokens.insert(
            response.model_id.clone(),
            TokenCounts {
                prompt_tokens: response.metric(METRIC_PROMPT_TOKENS).map(|n| n as u64),
                completion_tokens: response.metric(METRIC_COMPLETION_TOKENS).map(|n| n as u64),
            },
        );
    }

    MetaEvalRequest {
        stage: stage.name().to_string(),
        industry: industry.to_string(),
        prompt: prompt.to_string(),
        responses: texts,
        costs,
        times,
        tokens,
    }
}

/// Request the per-stage judgment for a set of responses.
///
/// Invoked on demand when the performance view opens; there is no cache, so
/// re-opening the view re-issues the request.
pub async fn evaluate(
    client: &ApiClient,
    stage: Stage,
    industry: &str,
    prompt: &str,
    responses: &[ModelResponse],
) -> Result<EvaluationResult, ApiError> {
    let payload = build_payload(stage, industry, prompt, responses);
    client.post("/meta_eval/evaluate/meta", &payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{model_profile, recommended_model};
    use crate::storage::LocalStore;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn response(model_id: &str, text: &str, metrics: &[(&str, f64)]) -> ModelResponse {
        let profile = model_profile(model_id);
        ModelResponse {
            model_id: profile.id,
            model_name: profile.name,
            element: profile.element,
            color: profile.color,
            response: text.to_string(),
            metrics: metrics
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_build_payload_pulls_metric_fields() {
        let responses = vec![response(
            "claude",
            "Answer",
            &[
                (METRIC_COST, 0.378),
                (METRIC_TIME, 2.47),
                (METRIC_PROMPT_TOKENS, 40.0),
                (METRIC_COMPLETION_TOKENS, 274.0),
            ],
        )];

        let payload = build_payload(Stage::Reasoning, "finance", "Why?", &responses);
        assert_eq!(payload.stage, "Reasoning");
        assert_eq!(payload.industry, "finance");
        assert_eq!(payload.responses["claude"], "Answer");
        assert_eq!(payload.costs["claude"], 0.378);
        assert_eq!(payload.times["claude"], 2.47);
        assert_eq!(payload.tokens["claude"].prompt_tokens, Some(40));
        assert_eq!(payload.tokens["claude"].completion_tokens, Some(274));
    }

    #[test]
    fn test_build_payload_missing_fields_stay_absent() {
        let responses = vec![response("gemini", "Answer", &[(METRIC_TIME, 2.09)])];

        let payload = build_payload(Stage::Technical, "tech", "How?", &responses);
        assert!(!payload.costs.contains_key("gemini"));
        assert_eq!(payload.times["gemini"], 2.09);

        // The tokens entry exists but serializes to an empty object.
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["tokens"]["gemini"], json!({}));
        assert!(value["costs"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_round_trip() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/meta_eval/evaluate/meta")
            .match_body(mockito::Matcher::PartialJson(json!({
                "stage": "Reasoning",
                "industry": "finance",
                "prompt": "Why?",
            })))
            .with_status(200)
            .with_body(
                json!({
                    "stage": "Reasoning",
                    "evaluation": {
                        "chatgpt": {"proprietaryScore": 82, "Coherence": 80, "Correctness": 85},
                        "gemini": {"proprietaryScore": 75, "Coherence": 74, "Correctness": 71},
                        "llama": {"proprietaryScore": 68, "Coherence": 66},
                        "claude": {
                            "proprietaryScore": 90,
                            "Coherence": 92,
                            "Correctness": 89,
                            "explanation": "Strongest chain of reasoning",
                        },
                    },
                })
                .to_string(),
            )
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("store.json")).unwrap();
        let client = ApiClient::new(&server.url(), Arc::new(Mutex::new(store)));

        let responses = vec![
            response("chatgpt", "A", &[]),
            response("gemini", "B", &[]),
            response("llama", "C", &[]),
            response("claude", "D", &[]),
        ];
        let result = evaluate(&client, Stage::Reasoning, "finance", "Why?", &responses)
            .await
            .unwrap();

        assert_eq!(result.stage, "Reasoning");
        assert_eq!(result.evaluation.len(), 4);
        assert_eq!(recommended_model(&result.evaluation), Some("claude"));
        assert_eq!(result.evaluation["claude"].metric("Coherence"), 92.0);
        // llama never reported Correctness; it renders as 0.
        assert_eq!(result.evaluation["llama"].metric("Correctness"), 0.0);
        assert_eq!(
            result.evaluation["claude"].explanation.as_deref(),
            Some("Strongest chain of reasoning")
        );
    }

    #[tokio::test]
    async fn test_reopening_reissues_the_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/meta_eval/evaluate/meta")
            .with_status(200)
            .with_body(json!({"stage": "Creativity", "evaluation": {}}).to_string())
            .expect(2)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("store.json")).unwrap();
        let client = ApiClient::new(&server.url(), Arc::new(Mutex::new(store)));

        let responses = vec![response("claude", "D", &[])];
        for _ in 0..2 {
            evaluate(&client, Stage::Creativity, "tech", "Pitch", &responses)
                .await
                .unwrap();
        }
        mock.assert_async().await;
    }
}
