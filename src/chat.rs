use crate::client::ApiClient;
use crate::models::{ChatReply, ChatTurn, GenerationParams};
use crate::storage::LocalStore;
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    frequency_penalty: f64,
    presence_penalty: f64,
}

/// Phase-1 chat sandbox: one model, no gating, history persisted under
/// `chatHistory`.
pub struct ChatSession {
    client: Arc<ApiClient>,
    store: Arc<Mutex<LocalStore>>,
    params: GenerationParams,
}

impl ChatSession {
    pub fn new(
        client: Arc<ApiClient>,
        store: Arc<Mutex<LocalStore>>,
        params: GenerationParams,
    ) -> Self {
        Self {
            client,
            store,
            params,
        }
    }

    /// Send one message and persist both turns of the exchange.
    pub async fn send(&self, message: &str) -> Result<ChatReply> {
        let body = ChatRequest {
            message,
            temperature: self.params.temperature,
            top_p: self.params.top_p,
            max_tokens: self.params.max_tokens,
            frequency_penalty: self.params.frequency_penalty,
            presence_penalty: self.params.presence_penalty,
        };
        let reply: ChatReply = self
            .client
            .post("/chat/sendMessage", &body)
            .await
            .context("Failed to send chat message")?;

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
        store
            .set_chat_history(&history)
            .context("Failed to persist chat history")?;

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn session_for(server: &mockito::Server, dir: &tempfile::TempDir) -> ChatSession {
        let store = LocalStore::open(&dir.path().join("store.json")).unwrap();
        let store = Arc::new(Mutex::new(store));
        let client = Arc::new(ApiClient::new(&server.url(), store.clone()));
        ChatSession::new(client, store, GenerationParams::default())
    }

    #[tokio::test]
    async fn test_send_carries_all_generation_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/sendMessage")
            .match_body(mockito::Matcher::PartialJson(json!({
                "message": "Explain the metaverse in simple terms",
                "temperature": 0.7,
                "top_p": 1.0,
                "max_tokens": 1000,
                "frequency_penalty": 0.0,
                "presence_penalty": 0.0,
            })))
            .with_status(200)
            .with_body(
                json!({"response": "A shared virtual space...", "metrics": {"time_seconds": 1.2}})
                    .to_string(),
            )
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let session = session_for(&server, &dir);
        let reply = session
            .send("Explain the metaverse in simple terms")
            .await
            .unwrap();
        assert_eq!(reply.response, "A shared virtual space...");
        assert!(reply.metrics.is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_history_appends_both_turns() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/sendMessage")
            .with_status(200)
            .with_body(json!({"response": "reply"}).to_string())
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let session = session_for(&server, &dir);
        session.send("first").await.unwrap();
        session.send("second").await.unwrap();

        let history = session.store.lock().unwrap().chat_history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].role, "assistant");
        assert_eq!(history[2].content, "second");
    }

    #[tokio::test]
    async fn test_failed_send_leaves_history_untouched() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/sendMessage")
            .with_status(503)
            .with_body(r#"{"message": "model overloaded"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let session = session_for(&server, &dir);
        assert!(session.send("hello?").await.is_err());
        assert!(session.store.lock().unwrap().chat_history().is_empty());
    }
}
