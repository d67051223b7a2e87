use super::Classifier;
use crate::{Error, Result};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a sentiment classifier. You will receive song lyrics \
and must answer with EXACTLY one word: 'positive', 'negative' or 'neutral'. \
Answer only that word, with no explanation and no extra punctuation.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ReplyMessage>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

/// Sentiment through an Ollama server's `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClassifier {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaClassifier {
    pub fn new(base_url: &str, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model: model.into(),
        }
    }

    async fn ask(&self, text: &str) -> Result<String> {
        let prompt = format!(
            "Classify the sentiment of the following text (positive/negative/neutral):\n\n\"\"\"\n{text}\n\"\"\""
        );
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            stream: false,
        };

        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let content = response
            .message
            .map(|m| m.content)
            .ok_or_else(|| Error::General("chat response carried no message".into()))?;
        debug!(model = %self.model, answer = %content.trim(), "classifier answered");
        Ok(content)
    }
}

impl Classifier for OllamaClassifier {
    fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.ask(text))
    }
}
