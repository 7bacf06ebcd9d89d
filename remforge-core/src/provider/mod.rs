use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use serde::Serialize;

use crate::errors::GenError;

pub mod canned;

pub use canned::CannedGenerator;

/// Share of the configured max_tokens a prompt may use before it is
/// rejected up front.
pub const TOKEN_HEADROOM: f32 = 0.8;

/// Retry policy for one generation call: attempt n sleeps
/// `initial_delay * 2^(n-1)` before the next try.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Backoff {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
        }
    }
}

/// Settings for constructing a concrete provider client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    pub model: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            max_tokens: 2000,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Identity and usage counters reported by a provider.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
    pub requests: u64,
    pub total_tokens: u64,
}

/// External text-generation capability. Constructed outside the core and
/// injected; the policy makes one call per externally generated card kind.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenError>;

    fn info(&self) -> ProviderInfo;

    /// Retry transient failures with exponential backoff. Non-transient
    /// failures and the final attempt's error propagate unchanged.
    async fn generate_with_backoff(
        &self,
        prompt: &str,
        temperature: f32,
        backoff: &Backoff,
    ) -> Result<String, GenError> {
        let mut delay = backoff.initial_delay;
        let mut attempt = 1;
        loop {
            match self.generate(prompt, temperature).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < backoff.max_attempts => {
                    warn!(
                        "generation attempt {attempt}/{max} failed, retrying in {delay:?}: {e}",
                        max = backoff.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
