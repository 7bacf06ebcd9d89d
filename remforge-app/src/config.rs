use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::warn;
use remforge_core::{Backoff, GenerationConfig};
use serde::{Deserialize, Serialize};

use crate::cli::opts::ProviderKind;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderSettings,
    pub generation: GenerationConfig,
    pub output: OutputSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub provider: ProviderKind,
    /// Empty string means the per-provider default model.
    pub model: String,
    pub max_tokens: u32,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Openai,
            model: String::new(),
            max_tokens: 2000,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub hierarchy: bool,
    pub stats_header: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            hierarchy: true,
            stats_header: true,
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config {}", p.display()))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("invalid config {}", p.display()))?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(provider) = std::env::var("REMFORGE_PROVIDER") {
            match provider.to_lowercase().as_str() {
                "openai" => self.provider.provider = ProviderKind::Openai,
                "anthropic" => self.provider.provider = ProviderKind::Anthropic,
                other => warn!("ignoring unknown REMFORGE_PROVIDER value '{other}'"),
            }
        }
        if let Ok(model) = std::env::var("REMFORGE_MODEL") {
            if !model.is_empty() {
                self.provider.model = model;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if !(100..=8000).contains(&self.provider.max_tokens) {
            bail!("provider.max_tokens must be between 100 and 8000");
        }
        if self.provider.retry_attempts > 10 {
            bail!("provider.retry_attempts must be at most 10");
        }
        for (name, value) in [
            ("concept_temperature", self.generation.concept_temperature),
            ("basic_temperature", self.generation.basic_temperature),
            ("cloze_temperature", self.generation.cloze_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                bail!("generation.{name} must be between 0.0 and 2.0");
            }
        }
        Ok(())
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            self.provider.retry_attempts,
            Duration::from_millis(self.provider.retry_delay_ms),
        )
    }
}
