use crate::models::{ReportData, Stage, model_profile, recommended_model};
use crate::report::clamp_display;
use crate::runner::{PhaseOutcome, SessionReport};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print the finished session in the specified format
pub fn print_session(session: &SessionReport, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print_plain(session),
        OutputFormat::Json => print_json(session),
    }
}

fn print_plain(session: &SessionReport) {
    if !session.chat.is_empty() {
        println!("💬 CHAT SANDBOX");
        println!("---------------");
        for exchange in &session.chat {
            println!("You: {}", exchange.message);
            println!("AI:  {}", exchange.reply.response);
            if let Some(serde_json::Value::Object(metrics)) = &exchange.reply.metrics {
                for (key, value) in metrics {
                    match session.stat_explanations.get(key) {
                        Some(explanation) => println!("  {}: {}  ({})", key, value, explanation),
                        None => println!("  {}: {}", key, value),
                    }
                }
            }
            println!();
        }
    }

    for outcome in &session.phases {
        print_phase_plain(outcome);
        println!();
    }

    if let Some(report) = &session.report {
        print_report_plain(report);
    }
}

fn print_phase_plain(outcome: &PhaseOutcome) {
    println!(
        "=== Phase {}: {} [{}] ===",
        outcome.phase, outcome.stage, outcome.industry
    );
    println!("Question: {}", outcome.question);
    println!("Chosen response: {}", outcome.chosen);

    println!("Responses:");
    for response in &outcome.responses {
        println!(
            "  {} ({}): {}",
            response.model_name,
            response.element,
            truncate(&response.response, 72)
        );
    }

    match &outcome.evaluation {
        Some(result) => {
            let metric_pair = Stage::from_name(&outcome.stage).map(Stage::metric_pair);
            let recommended = recommended_model(&result.evaluation).map(str::to_string);

            println!("Scores:");
            for (model_id, score) in &result.evaluation {
                let marker = if recommended.as_deref() == Some(model_id.as_str()) {
                    "  << recommended"
                } else {
                    ""
                };
                println!(
                    "  {:<10} proprietary {:>5.1}%{}",
                    model_id, score.proprietary_score, marker
                );
                if let Some((first, second)) = metric_pair {
                    for metric in [first, second] {
                        let value = score.metric(metric);
                        println!("    {:<14} {} {:>5.1}%", metric, bar(value), value);
                    }
                }
                if let Some(explanation) = &score.explanation {
                    println!("    {}", explanation);
                }
            }
        }
        None => println!("Scores: unavailable for this phase"),
    }
}

fn print_report_plain(report: &ReportData) {
    println!("📊 COMPARISON REPORT");
    println!("--------------------");
    for (industry, models) in report {
        println!("Industry: {}", industry);
        for (model_id, metrics) in models {
            println!("  {} ({})", model_profile(model_id).name, model_id);
            for (metric, value) in metrics {
                let value = clamp_display(*value);
                println!("    {:<22} {} {:>5.1}%", metric, bar(value), value);
            }
        }
        println!();
    }
}

/// Print the session in JSON format
fn print_json(session: &SessionReport) {
    match serde_json::to_string_pretty(session) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing session to JSON: {}", e),
    }
}

/// 20-slot percentage bar; values are clamped into [0, 100] for display.
fn bar(value: f64) -> String {
    let value = clamp_display(value);
    let filled = (value / 5.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(20 - filled))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock;
    use crate::runner::ChatExchange;

    fn sample_session() -> SessionReport {
        let responses = mock::mock_responses("What are key sustainability practices in fashion?");
        let evaluation = mock::mock_evaluation(Stage::Creativity, &responses);

        let mut report = ReportData::new();
        report
            .entry("fashion".to_string())
            .or_default()
            .entry("fire".to_string())
            .or_default()
            .insert("Creativity".to_string(), 91.0);

        SessionReport {
            chat: vec![ChatExchange {
                message: "hello".to_string(),
                reply: mock::mock_chat_reply("hello"),
            }],
            phases: vec![PhaseOutcome {
                phase: 6,
                stage: "Creativity".to_string(),
                industry: "fashion".to_string(),
                question: "What are key sustainability practices in fashion?".to_string(),
                chosen: "fire".to_string(),
                responses,
                evaluation: Some(evaluation),
            }],
            report: Some(report),
            stat_explanations: crate::models::metric_glossary(),
        }
    }

    #[test]
    fn test_bar_widths() {
        assert_eq!(bar(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(bar(100.0), format!("[{}]", "#".repeat(20)));
        assert_eq!(bar(50.0), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
    }

    #[test]
    fn test_bar_clamps_out_of_range_values() {
        assert_eq!(bar(140.0), bar(100.0));
        assert_eq!(bar(-20.0), bar(0.0));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer sentence", 8), "a longer...");
    }

    #[test]
    fn test_plain_output_does_not_panic() {
        print_session(&sample_session(), OutputFormat::Plain);
    }

    #[test]
    fn test_json_output_does_not_panic() {
        print_session(&sample_session(), OutputFormat::Json);
    }

    #[test]
    fn test_phase_without_evaluation_renders() {
        let mut session = sample_session();
        session.phases[0].evaluation = None;
        print_session(&session, OutputFormat::Plain);
    }
}
