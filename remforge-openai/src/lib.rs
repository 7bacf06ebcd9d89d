//! OpenAI chat-completion client implementing the core `TextGenerator` trait.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use log::debug;
use remforge_core::{GenError, ProviderConfig, ProviderInfo, TextGenerator, TOKEN_HEADROOM};
use serde::{Deserialize, Serialize};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that writes clear, accurate flashcards for spaced repetition.";
// GPT tokenizers land near 4 characters per token on English prose.
const CHARS_PER_TOKEN: f32 = 4.0;

#[derive(Debug)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: ProviderConfig,
    requests: AtomicU64,
    total_tokens: AtomicU64,
}

impl OpenAiGenerator {
    pub fn new(config: ProviderConfig) -> Result<Self, GenError> {
        if config.api_key.trim().is_empty() {
            return Err(GenError::Config("OpenAI API key is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            requests: AtomicU64::new(0),
            total_tokens: AtomicU64::new(0),
        })
    }

    fn check_budget(&self, prompt: &str) -> Result<(), GenError> {
        let estimated = prompt.chars().count() as f32 / CHARS_PER_TOKEN;
        let budget = self.config.max_tokens as f32 * TOKEN_HEADROOM;
        if estimated > budget {
            return Err(GenError::TokenLimit(format!(
                "prompt is ~{estimated:.0} tokens, budget is {budget:.0}"
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenError> {
        self.check_budget(prompt)?;
        self.requests.fetch_add(1, Ordering::Relaxed);
        debug!(
            "openai request: model={} prompt_chars={}",
            self.config.model,
            prompt.chars().count()
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenError::Request(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GenError::RateLimited(error_message(response).await));
        }
        if !status.is_success() {
            return Err(GenError::Request(format!(
                "{status}: {}",
                error_message(response).await
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenError::Request(format!("invalid response body: {e}")))?;
        if let Some(usage) = &body.usage {
            self.total_tokens
                .fetch_add(usage.total_tokens, Ordering::Relaxed);
        }
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenError::Request("response contained no choices".to_string()))?;
        Ok(choice.message.content.trim().to_string())
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "openai".to_string(),
            model: self.config.model.clone(),
            requests: self.requests.load(Ordering::Relaxed),
            total_tokens: self.total_tokens.load(Ordering::Relaxed),
        }
    }
}

async fn error_message(response: reqwest::Response) -> String {
    match response.json::<ErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => "no error detail".to_string(),
    }
}
