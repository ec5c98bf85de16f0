use crate::config::TtsConfig;
use crate::ws::endpoint_url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Sampling parameters for the Maya voice model; unset fields use server defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f64>,
}

impl GenerationConfig {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.top_k.is_none()
            && self.max_tokens.is_none()
            && self.repetition_penalty.is_none()
    }
}

/// Options for one text-to-speech request
#[derive(Debug, Clone)]
pub struct TtsOptions {
    /// Host with or without scheme; bare hosts connect over `wss://`
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub text: String,
    /// Voice name or free-form voice description
    pub speaker: String,
    pub model: String,
    pub generation: GenerationConfig,
    /// Write received audio to this WAV file
    pub save_path: Option<PathBuf>,
    /// Output format of the service (16-bit PCM)
    pub sample_rate: u32,
    pub channels: u16,
    /// Longest silence tolerated between server frames
    pub idle_timeout: Duration,
}

impl TtsOptions {
    pub fn new(api_key: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_config(&TtsConfig::default(), api_key, text)
    }

    pub fn from_config(
        config: &TtsConfig,
        api_key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            api_key: api_key.into(),
            text: text.into(),
            speaker: config.speaker.clone(),
            model: config.model.clone(),
            generation: GenerationConfig::default(),
            save_path: None,
            sample_rate: config.sample_rate,
            channels: config.channels,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }

    pub fn url(&self) -> String {
        endpoint_url(&self.host, self.port)
    }
}
