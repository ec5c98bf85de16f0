use anyhow::Result;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/talkscriber";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Talkscriber API key (get one from https://app.talkscriber.com)
    pub api_key: Option<String>,
    pub stt: SttConfig,
    pub tts: TtsConfig,
    pub batch: BatchConfig,
    pub bench: BenchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    pub host: String,
    pub port: u16,
    pub language: String,
    pub multilingual: bool,
    pub translate: bool,
    pub enable_turn_detection: bool,
    pub turn_detection_timeout: f64,
    pub ready_timeout_secs: u64,
    pub drain_timeout_secs: u64,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            host: "wss://api.talkscriber.com".to_string(),
            port: 9090,
            language: "en".to_string(),
            multilingual: false,
            translate: false,
            enable_turn_detection: false,
            turn_detection_timeout: 0.6,
            ready_timeout_secs: 30,
            drain_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub host: String,
    pub port: u16,
    pub speaker: String,
    pub model: String,
    pub sample_rate: u32,
    pub channels: u16,
    /// Give up when the server sends nothing for this long
    pub idle_timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            host: "api.talkscriber.com".to_string(),
            port: 9099,
            speaker: "tara".to_string(),
            model: "TTS_MAYA".to_string(),
            sample_rate: 24000,
            channels: 1,
            idle_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub url: String,
    pub model: String,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            url: "https://api.talkscriber.com/api/jobs".to_string(),
            model: "L3".to_string(),
            poll_interval_secs: 2,
            timeout_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub runs: usize,
    pub pause_ms: u64,
    pub text: String,
    pub output_dir: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            runs: 100,
            pause_ms: 500,
            text: "The future of artificial intelligence is fascinating and rapidly evolving. "
                .to_string(),
            output_dir: ".".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file, then `TALKSCRIBER_*` environment
    /// variables (`TALKSCRIBER_API_KEY`, `TALKSCRIBER_STT__PORT`, ...)
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TALKSCRIBER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
