use crate::catalog::Catalog;
use crate::chat::ChatSession;
use crate::client::ApiClient;
use crate::compare::ResponseCollector;
use crate::config::{PhasePlan, SessionConfig};
use crate::models::{
    ChatReply, ChatTurn, EvaluationResult, GenerationParams, ModelResponse, ReportData, Stage,
    metric_glossary,
};
use crate::phases::{Advance, PhaseEngine};
use crate::reveal::{RevealBoard, RevealTimer};
use crate::storage::LocalStore;
use crate::{auth, meta_eval, mock, report};
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One phase-1 chat exchange.
#[derive(Debug, Serialize)]
pub struct ChatExchange {
    pub message: String,
    pub reply: ChatReply,
}

/// Everything one evaluation phase produced.
#[derive(Debug, Serialize)]
pub struct PhaseOutcome {
    pub phase: u8,
    pub stage: String,
    pub industry: String,
    pub question: String,
    pub chosen: String,
    pub responses: Vec<ModelResponse>,
    /// Absent when the meta-evaluation failed; the rest of the phase still
    /// renders.
    pub evaluation: Option<EvaluationResult>,
}

/// The finished session: chat sandbox, per-phase results, final report.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub chat: Vec<ChatExchange>,
    pub phases: Vec<PhaseOutcome>,
    /// Present only when all seven phases completed.
    pub report: Option<ReportData>,
    /// Cached terminology for the per-response stats.
    pub stat_explanations: BTreeMap<String, String>,
}

/// Drives a scripted demo session through the same state machines a UI
/// would: login, phase-1 chat, then industry -> question -> reveal ->
/// meta-evaluation for each phase, and the report after phase 7.
pub struct SessionRunner {
    config: SessionConfig,
    store: Arc<Mutex<LocalStore>>,
    client: Arc<ApiClient>,
    collector: ResponseCollector,
    catalog: Catalog,
    engine: PhaseEngine,
    params: GenerationParams,
}

impl SessionRunner {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let store = Arc::new(Mutex::new(LocalStore::open(Path::new(&config.storage_path))?));
        let params = Self::resolve_params(&config, &store)?;
        let client = Arc::new(
            ApiClient::new(&config.base_url, store.clone()).with_timeout(config.timeout()),
        );
        let collector = ResponseCollector::new(client.clone(), params.clone());
        Ok(Self {
            store,
            client,
            collector,
            catalog: Catalog::builtin(),
            engine: PhaseEngine::new(),
            params,
            config,
        })
    }

    /// Generation parameters for the session: the run file's values, or the
    /// persisted `userPreferences` when the file opts into reusing them.
    /// Either way the result is written back, so the next session can reuse
    /// it. The stat glossary is seeded on first run.
    fn resolve_params(
        config: &SessionConfig,
        store: &Mutex<LocalStore>,
    ) -> Result<GenerationParams> {
        let mut store = store.lock().expect("store mutex poisoned");
        let params = if config.use_stored_preferences {
            store
                .user_preferences()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_else(|| config.params())
        } else {
            config.params()
        };
        store.set_user_preferences(&serde_json::to_value(&params)?)?;
        if store.stat_explanations().is_none() {
            store.set_stat_explanations(&metric_glossary())?;
        }
        Ok(params)
    }

    pub async fn run(&mut self) -> Result<SessionReport> {
        self.ensure_authenticated().await?;

        let chat = self.run_chat_phase().await?;

        // Phase 1 is the ungated sandbox; leaving it needs no completion.
        {
            let mut store = self.store.lock().expect("store mutex poisoned");
            self.engine.advance(&mut store)?;
        }

        let mut phases = Vec::new();
        let mut final_report = None;
        let plans = self.config.plan.clone();
        for plan in &plans {
            let outcome = self.run_evaluation_phase(plan).await?;
            phases.push(outcome);

            let advance = {
                let mut store = self.store.lock().expect("store mutex poisoned");
                self.engine.advance(&mut store)?
            };
            match advance {
                Advance::Moved(next) => debug!("advanced to phase {next}"),
                Advance::GenerateReport => {
                    final_report = self.store.lock().expect("store mutex poisoned").report_data();
                    info!("all phases complete; report generated");
                    break;
                }
            }
        }

        if final_report.is_none() && !phases.is_empty() {
            info!(
                "session ended after phase {}; no report without all seven phases",
                self.engine.current_phase()
            );
        }

        let stat_explanations = self
            .store
            .lock()
            .expect("store mutex poisoned")
            .stat_explanations()
            .unwrap_or_default();

        Ok(SessionReport {
            chat,
            phases,
            report: final_report,
            stat_explanations,
        })
    }

    async fn ensure_authenticated(&self) -> Result<()> {
        if self.config.offline {
            return Ok(());
        }
        if self
            .store
            .lock()
            .expect("store mutex poisoned")
            .access_token()
            .is_some()
        {
            debug!("reusing stored access token");
            return Ok(());
        }
        let Some(auth_config) = &self.config.auth else {
            debug!("no credentials configured; proceeding without a token");
            return Ok(());
        };
        let password = std::env::var(&auth_config.env_var_password).with_context(|| {
            format!(
                "Environment variable {} not found",
                auth_config.env_var_password
            )
        })?;

        if let Some(details) = &auth_config.signup {
            let form = auth::SignupForm {
                name: details.name.clone(),
                email: auth_config.email.clone(),
                company_name: details.company_name.clone(),
                password: password.clone(),
            };
            match auth::signup(&self.client, &form).await {
                Ok(()) => info!("account created for {}", auth_config.email),
                // Duplicate signup is not fatal; the login below decides.
                Err(err) => warn!("signup skipped: {err}"),
            }
        }

        let credentials = auth::Credentials {
            email: auth_config.email.clone(),
            password,
        };
        auth::login(&self.client, &self.store, &credentials)
            .await
            .context("Login failed")?;
        info!("logged in as {}", auth_config.email);
        Ok(())
    }

    async fn run_chat_phase(&self) -> Result<Vec<ChatExchange>> {
        let mut exchanges = Vec::new();
        if self.config.chat.is_empty() {
            return Ok(exchanges);
        }
        info!("phase 1: chat sandbox ({} messages)", self.config.chat.len());

        if self.config.offline {
            for message in &self.config.chat {
                let reply = mock::mock_chat_reply(message);
                self.append_chat_turns(message, &reply)?;
                exchanges.push(ChatExchange {
                    message: message.clone(),
                    reply,
                });
            }
        } else {
            let session = ChatSession::new(
                self.client.clone(),
                self.store.clone(),
                self.params.clone(),
            );
            for message in &self.config.chat {
                let reply = session.send(message).await?;
                exchanges.push(ChatExchange {
                    message: message.clone(),
                    reply,
                });
            }
        }
        Ok(exchanges)
    }

    fn append_chat_turns(&self, message: &str, reply: &ChatReply) -> Result<()> {
        let mut store = self.store.lock().expect("store mutex poisoned");
        let mut history = store.chat_history();
        history.push(ChatTurn {
            role: "user".to_string(),
            content: message.to_string(),
        });
        history.push(ChatTurn {
            role: "assistant".to_string(),
            content: reply.response.clone(),
        });
        store.set_chat_history(&history)
    }

    async fn run_evaluation_phase(&mut self, plan: &PhasePlan) -> Result<PhaseOutcome> {
        let phase = self.engine.current_phase();
        let stage = self.engine.stage();
        let industry_name = match self.catalog.industry(&plan.industry) {
            Some(industry) => industry.name.clone(),
            None => {
                let known: Vec<&str> = self
                    .catalog
                    .industries()
                    .iter()
                    .map(|i| i.id.as_str())
                    .collect();
                warn!(
                    "unknown industry {}; catalog has: {}",
                    plan.industry,
                    known.join(", ")
                );
                plan.industry.clone()
            }
        };
        info!("phase {phase} ({stage}): industry {industry_name}");

        {
            let mut store = self.store.lock().expect("store mutex poisoned");
            // Consume the reset posted by the previous advance, then start
            // this phase's own selection.
            store.take_reset_phase()?;
            store.set_selected_industry(&plan.industry)?;
        }
        self.engine.note_industry_changed();

        let question = self.resolve_question(plan, stage)?;
        self.engine.note_question_changed();
        debug!("question: {question}");

        let responses = if self.config.offline {
            mock::mock_responses(&question)
        } else {
            self.collector
                .fetch_responses(&question)
                .await
                .with_context(|| format!("Failed to fetch responses for: {question}"))?
        };
        if responses.is_empty() {
            bail!("Comparison returned no model responses");
        }

        // Select the scripted card, then reveal the rest presenter-style;
        // the timer's cancellation handle dies with this scope.
        let board = Arc::new(Mutex::new(RevealBoard::new(
            responses.iter().map(|r| r.model_id.clone()),
            false,
            Instant::now(),
        )));
        let timer = RevealTimer::spawn(board.clone());
        let chosen = plan
            .choose
            .clone()
            .unwrap_or_else(|| responses[0].model_id.clone());
        let flipped = {
            let mut board = board.lock().expect("board mutex poisoned");
            board
                .select(&chosen, Instant::now())
                .with_context(|| format!("Cannot select response {chosen}"))?;
            board.force_reveal();
            // Leave the chosen card on its answer face for the audience.
            board.toggle_face(&chosen);
            board.cards().iter().filter(|c| c.flipped).count()
        };
        drop(timer);
        debug!("revealed {flipped} response cards");
        self.engine.note_response_revealed();

        let evaluation = if self.config.offline {
            Some(mock::mock_evaluation(stage, &responses))
        } else {
            match meta_eval::evaluate(&self.client, stage, &plan.industry, &question, &responses)
                .await
            {
                Ok(result) => Some(result),
                // Scoped to this view; the phase still renders and the
                // session continues.
                Err(err) => {
                    warn!("meta-evaluation failed for phase {phase}: {err}");
                    None
                }
            }
        };

        if let Some(result) = &evaluation {
            let mut store = self.store.lock().expect("store mutex poisoned");
            report::record_phase_result(&mut store, &plan.industry, stage, result)?;
        }

        Ok(PhaseOutcome {
            phase,
            stage: stage.name().to_string(),
            industry: plan.industry.clone(),
            question,
            chosen,
            responses,
            evaluation,
        })
    }

    fn resolve_question(&self, plan: &PhasePlan, stage: Stage) -> Result<String> {
        if let Some(question) = &plan.question {
            return Ok(question.clone());
        }
        let questions = self.catalog.questions_for(&plan.industry, stage);
        let index = plan.question_index.unwrap_or(0);
        questions.get(index).cloned().with_context(|| {
            format!(
                "No question at index {index} for industry {} at stage {stage}",
                plan.industry
            )
        })
    }
}
