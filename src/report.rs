use crate::models::{EvaluationResult, Stage};
use crate::storage::LocalStore;
use anyhow::Result;

/// Clamp a score into the displayable [0, 100] range.
pub fn clamp_display(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Merge one phase's evaluation into the stored report structure
/// (industry -> model -> stage metric -> score). Cells the session actually
/// produced overwrite whatever an external aggregation step left behind;
/// everything else is preserved.
pub fn record_phase_result(
    store: &mut LocalStore,
    industry: &str,
    stage: Stage,
    result: &EvaluationResult,
) -> Result<()> {
    let mut report = store.report_data().unwrap_or_default();
    let industry_entry = report.entry(industry.to_string()).or_default();
    for (model_id, score) in &result.evaluation {
        industry_entry
            .entry(model_id.clone())
            .or_default()
            .insert(stage.name().to_string(), score.proprietary_score);
    }
    store.set_report_data(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelScore, ReportData};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn evaluation(scores: &[(&str, f64)]) -> EvaluationResult {
        let mut evaluation = BTreeMap::new();
        for (id, score) in scores {
            evaluation.insert(
                id.to_string(),
                ModelScore {
                    proprietary_score: *score,
                    explanation: None,
                    metrics: BTreeMap::new(),
                },
            );
        }
        EvaluationResult {
            stage: "Reasoning".to_string(),
            evaluation,
        }
    }

    #[test]
    fn test_clamp_display_bounds() {
        assert_eq!(clamp_display(-3.0), 0.0);
        assert_eq!(clamp_display(42.5), 42.5);
        assert_eq!(clamp_display(117.0), 100.0);
    }

    #[test]
    fn test_record_phase_result_creates_cells() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(&dir.path().join("store.json")).unwrap();

        let result = evaluation(&[("claude", 90.0), ("gemini", 75.0)]);
        record_phase_result(&mut store, "finance", Stage::Reasoning, &result).unwrap();

        let report = store.report_data().unwrap();
        assert_eq!(report["finance"]["claude"]["Reasoning"], 90.0);
        assert_eq!(report["finance"]["gemini"]["Reasoning"], 75.0);
    }

    #[test]
    fn test_record_preserves_external_cells() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(&dir.path().join("store.json")).unwrap();

        // An external aggregation step already populated some cells.
        let mut external = ReportData::new();
        external
            .entry("finance".to_string())
            .or_default()
            .entry("claude".to_string())
            .or_default()
            .insert("Creativity".to_string(), 81.0);
        external
            .entry("tech".to_string())
            .or_default()
            .entry("llama".to_string())
            .or_default()
            .insert("Language".to_string(), 64.0);
        store.set_report_data(&external).unwrap();

        let result = evaluation(&[("claude", 90.0)]);
        record_phase_result(&mut store, "finance", Stage::Reasoning, &result).unwrap();

        let report = store.report_data().unwrap();
        assert_eq!(report["finance"]["claude"]["Reasoning"], 90.0);
        assert_eq!(report["finance"]["claude"]["Creativity"], 81.0);
        assert_eq!(report["tech"]["llama"]["Language"], 64.0);
    }

    #[test]
    fn test_record_overwrites_own_cell() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(&dir.path().join("store.json")).unwrap();

        record_phase_result(&mut store, "tech", Stage::Technical, &evaluation(&[("claude", 70.0)]))
            .unwrap();
        record_phase_result(&mut store, "tech", Stage::Technical, &evaluation(&[("claude", 88.0)]))
            .unwrap();

        let report = store.report_data().unwrap();
        assert_eq!(report["tech"]["claude"]["Technical"], 88.0);
    }
}
