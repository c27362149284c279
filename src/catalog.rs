use crate::models::{Industry, Stage};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Static question sets keyed by industry and evaluation stage.
///
/// Lookups never fail: a missing industry or stage yields an empty list.
pub struct Catalog {
    industries: Vec<Industry>,
    questions: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl Catalog {
    /// Build a catalog from raw industry data, normalizing the two source
    /// shapes at the ingestion boundary: an industry object holding stages
    /// directly, or holding them one level down under a single wrapper key.
    pub fn from_value(industries: Vec<Industry>, data: &Value) -> Self {
        let mut questions = BTreeMap::new();
        if let Some(map) = data.as_object() {
            for (industry_id, industry_data) in map {
                let normalized = unwrap_single_nested(industry_data);
                let mut by_stage = BTreeMap::new();
                if let Some(stages) = normalized.as_object() {
                    for (stage_name, list) in stages {
                        let list = list
                            .as_array()
                            .map(|items| {
                                items
                                    .iter()
                                    .filter_map(|q| q.as_str().map(str::to_string))
                                    .collect()
                            })
                            .unwrap_or_default();
                        by_stage.insert(stage_name.clone(), list);
                    }
                }
                questions.insert(industry_id.clone(), by_stage);
            }
        }
        Self {
            industries,
            questions,
        }
    }

    /// Ordered industry list.
    pub fn industries(&self) -> &[Industry] {
        &self.industries
    }

    pub fn industry(&self, industry_id: &str) -> Option<&Industry> {
        self.industries.iter().find(|i| i.id == industry_id)
    }

    /// Questions for (industry, stage); empty, never an error, on any miss.
    pub fn questions_for(&self, industry_id: &str, stage: Stage) -> &[String] {
        self.questions
            .get(industry_id)
            .and_then(|stages| stages.get(stage.name()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The built-in demo catalog. A couple of industries are stored in the
    /// nested shape on purpose, so the normalizer stays exercised.
    pub fn builtin() -> Self {
        let industries = vec![
            industry("tech", "Technology"),
            industry("healthcare", "Healthcare"),
            industry("finance", "Finance"),
            industry("fashion", "Fashion"),
            industry("education", "Education"),
            industry("manufacturing", "Manufacturing"),
        ];

        let data = json!({
            "tech": {
                "Comprehension": [
                    "Explain the metaverse in simple terms",
                    "Summarize how large language models are trained",
                ],
                "Reasoning": [
                    "How will quantum computing impact cybersecurity?",
                    "Should a startup build on serverless or containers? Argue both sides",
                ],
                "Technical": [
                    "What are the key trends in AI for 2025?",
                    "Walk through how TLS 1.3 differs from TLS 1.2",
                ],
                "Language": [
                    "Rewrite a product outage notice for a non-technical audience",
                ],
                "Instruction Following": [
                    "List exactly five zero-trust principles, one line each",
                ],
                "Creativity": [
                    "Pitch a consumer app that uses on-device AI",
                ],
                "Bias Awareness": [
                    "What biases can creep into hiring algorithms?",
                ],
            },
            // Nested shape: stages live one level down.
            "healthcare": {
                "stages": {
                    "Comprehension": [
                        "What advancements in telemedicine are expected?",
                    ],
                    "Reasoning": [
                        "How is AI being used in drug discovery?",
                    ],
                    "Language": [
                        "Explain a clinical trial consent form in plain language",
                    ],
                    "Instruction Following": [
                        "Summarize patient-privacy rules in three bullet points",
                    ],
                    "Creativity": [
                        "Propose a wellness program for remote workers",
                    ],
                    "Bias Awareness": [
                        "What are the ethical considerations in genomic medicine?",
                    ],
                },
            },
            "finance": {
                "Comprehension": [
                    "Explain decentralized finance (DeFi) to a beginner",
                ],
                "Reasoning": [
                    "How might CBDCs impact traditional banking?",
                ],
                "Technical": [
                    "How do payment networks settle transactions across borders?",
                ],
                "Language": [
                    "Draft a customer notice about new overdraft terms",
                ],
                "Instruction Following": [
                    "Compare two index funds in a three-row table",
                ],
                "Creativity": [
                    "Invent a savings product for gig workers",
                ],
                "Bias Awareness": [
                    "What are sustainable investing strategies?",
                ],
            },
            "fashion": {
                "Comprehension": [
                    "What are key sustainability practices in fashion?",
                ],
                "Reasoning": [
                    "How is technology changing fashion retail?",
                ],
                "Technical": [
                    "What are the emerging materials in sustainable fashion?",
                ],
                "Creativity": [
                    "Design a capsule wardrobe concept for commuters",
                ],
            },
            "education": {
                "stages": {
                    "Comprehension": [
                        "How is AI transforming personalized learning?",
                    ],
                    "Reasoning": [
                        "What's the future of online vs in-person education?",
                    ],
                    "Technical": [
                        "How can educators incorporate VR/AR effectively?",
                    ],
                    "Language": [
                        "Simplify a university syllabus for first-year students",
                    ],
                    "Bias Awareness": [
                        "How can grading rubrics avoid cultural bias?",
                    ],
                },
            },
            "manufacturing": {
                "Comprehension": [
                    "Explain Industry 4.0 and its components",
                ],
                "Reasoning": [
                    "What are smart factories and their benefits?",
                ],
                "Technical": [
                    "How is 3D printing changing manufacturing?",
                ],
                "Instruction Following": [
                    "Outline a five-step preventive maintenance checklist",
                ],
            },
        });

        Self::from_value(industries, &data)
    }
}

fn industry(id: &str, name: &str) -> Industry {
    Industry {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// If the object has exactly one key whose value is itself an object, unwrap
/// one level. Tolerates both source shapes without caller changes.
fn unwrap_single_nested(value: &Value) -> &Value {
    if let Some(obj) = value.as_object()
        && obj.len() == 1
        && let Some((_, inner)) = obj.iter().next()
        && inner.is_object()
    {
        return inner;
    }
    value
}
