//! Anthropic messages-API client implementing the core `TextGenerator` trait.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use log::debug;
use remforge_core::{GenError, ProviderConfig, ProviderInfo, TextGenerator, TOKEN_HEADROOM};
use serde::{Deserialize, Serialize};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that writes clear, accurate flashcards for spaced repetition.";
// Claude tokenization runs a little denser than GPT's.
const CHARS_PER_TOKEN: f32 = 3.5;

#[derive(Debug)]
pub struct AnthropicGenerator {
    client: reqwest::Client,
    config: ProviderConfig,
    requests: AtomicU64,
    total_tokens: AtomicU64,
}

impl AnthropicGenerator {
    pub fn new(config: ProviderConfig) -> Result<Self, GenError> {
        if config.api_key.trim().is_empty() {
            return Err(GenError::Config("Anthropic API key is empty".to_string()));
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
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
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
impl TextGenerator for AnthropicGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenError> {
        self.check_budget(prompt)?;
        self.requests.fetch_add(1, Ordering::Relaxed);
        debug!(
            "anthropic request: model={} prompt_chars={}",
            self.config.model,
            prompt.chars().count()
        );

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenError::Request(e.to_string()))?;

        let status = response.status();
        // 529 is Anthropic's overloaded signal; treat it like a rate limit.
        if status.as_u16() == 429 || status.as_u16() == 529 {
            return Err(GenError::RateLimited(error_message(response).await));
        }
        if !status.is_success() {
            return Err(GenError::Request(format!(
                "{status}: {}",
                error_message(response).await
            )));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GenError::Request(format!("invalid response body: {e}")))?;
        if let Some(usage) = &body.usage {
            self.total_tokens
                .fetch_add(usage.input_tokens + usage.output_tokens, Ordering::Relaxed);
        }
        let block = body
            .content
            .into_iter()
            .find(|b| !b.text.is_empty())
            .ok_or_else(|| GenError::Request("response contained no text blocks".to_string()))?;
        Ok(block.text.trim().to_string())
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "anthropic".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig::new("claude-3-5-haiku-latest", "sk-ant-test")
    }

    #[test]
    fn missing_key_is_fatal() {
        let err =
            AnthropicGenerator::new(ProviderConfig::new("claude-3-5-haiku-latest", "")).unwrap_err();
        assert!(matches!(err, GenError::Config(_)));
    }

    #[test]
    fn request_body_has_the_messages_shape() {
        let request = MessagesRequest {
            model: "claude-3-5-haiku-latest",
            max_tokens: 2000,
            temperature: 0.4,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: "prompt",
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "claude-3-5-haiku-latest");
        assert_eq!(value["system"], SYSTEM_PROMPT);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["max_tokens"], 2000);
    }

    #[test]
    fn parses_a_messages_response() {
        let raw = r#"{
            "content": [{"type": "text", "text": "Term :: Definition"}],
            "usage": {"input_tokens": 40, "output_tokens": 25}
        }"#;
        let body: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.content[0].text, "Term :: Definition");
        let usage = body.usage.unwrap();
        assert_eq!(usage.input_tokens + usage.output_tokens, 65);
    }

    #[tokio::test]
    async fn oversized_prompt_fails_before_sending() {
        let generator = AnthropicGenerator::new(config()).unwrap();
        let prompt = "x".repeat(100_000);
        let err = generator.generate(&prompt, 0.3).await.unwrap_err();
        assert!(matches!(err, GenError::TokenLimit(_)));
        assert_eq!(generator.info().requests, 0);
    }
}
