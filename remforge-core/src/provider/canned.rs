use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::GenError;
use crate::provider::{ProviderInfo, TextGenerator};

/// Scripted generator for tests and offline runs: answers each call from a
/// queue, then reports exhaustion as a request failure.
#[derive(Default)]
pub struct CannedGenerator {
    responses: Mutex<VecDeque<Result<String, GenError>>>,
    calls: Mutex<u64>,
}

impl CannedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.responses.lock().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, err: GenError) {
        self.responses.lock().push_back(Err(err));
    }

    pub fn calls(&self) -> u64 {
        *self.calls.lock()
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String, GenError> {
        *self.calls.lock() += 1;
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GenError::Request("no scripted response left".to_string())))
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "canned".to_string(),
            model: "scripted".to_string(),
            requests: self.calls(),
            total_tokens: 0,
        }
    }
}
