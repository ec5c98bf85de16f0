use super::messages::{Handshake, Task};
use crate::config::SttConfig;
use crate::ws::endpoint_url;
use std::path::PathBuf;
use std::time::Duration;

/// Options for a live transcription session
///
/// Every knob the service understands lives here; nothing is read from
/// process-wide state.
#[derive(Debug, Clone)]
pub struct SttOptions {
    /// WebSocket host, with or without scheme (e.g. "wss://api.talkscriber.com")
    pub host: String,

    pub port: u16,

    /// API key sent in the handshake `auth` field
    pub api_key: String,

    /// Language code for transcription (e.g. "en")
    pub language: String,

    /// Let the server auto-detect the language
    pub multilingual: bool,

    /// Translate instead of transcribe
    pub translate: bool,

    /// Server-side ML turn detection
    pub enable_turn_detection: bool,

    /// End-of-speech fallback threshold in seconds
    pub turn_detection_timeout: f64,

    /// How long to wait for SERVER_READY after the handshake
    pub ready_timeout: Duration,

    /// Server silence tolerated after the input is exhausted
    pub drain_timeout: Duration,

    /// Save the streamed audio as 16kHz mono WAV
    pub recording_path: Option<PathBuf>,

    /// Render the live transcript to stdout
    pub print_transcript: bool,
}

impl SttOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(&SttConfig::default(), api_key)
    }

    pub fn from_config(config: &SttConfig, api_key: impl Into<String>) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            api_key: api_key.into(),
            language: config.language.clone(),
            multilingual: config.multilingual,
            translate: config.translate,
            enable_turn_detection: config.enable_turn_detection,
            turn_detection_timeout: config.turn_detection_timeout,
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
            drain_timeout: Duration::from_secs(config.drain_timeout_secs),
            recording_path: None,
            print_transcript: false,
        }
    }

    pub fn url(&self) -> String {
        endpoint_url(&self.host, self.port)
    }

    /// Build the handshake sent as the first frame of a connection
    pub fn handshake(&self, uid: &str) -> Handshake {
        Handshake {
            uid: uid.to_string(),
            multilingual: self.multilingual,
            language: self.language.clone(),
            task: Task::from_translate(self.translate),
            auth: self.api_key.clone(),
            enable_turn_detection: self.enable_turn_detection,
            turn_detection_timeout: self.turn_detection_timeout,
        }
    }
}
