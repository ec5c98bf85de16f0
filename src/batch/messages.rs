use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Job submission body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub service_type: String,
    pub name: String,
    pub model_type: String,
    pub features: Vec<String>,
    pub language: String,
    pub task: String,
    pub store_conversation: bool,
    pub channels: Vec<Value>,
    /// Base64-encoded audio file
    pub data: String,
    pub meta_info: serde_json::Map<String, Value>,
}

/// Caller-facing knobs for a job; the audio is attached separately
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub language: String,
    pub translate: bool,
    pub features: Vec<String>,
    pub model: String,
    pub store_conversation: bool,
    pub channels: Vec<Value>,
    pub meta_info: serde_json::Map<String, Value>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            translate: false,
            features: Vec::new(),
            model: "L3".to_string(),
            store_conversation: false,
            channels: Vec::new(),
            meta_info: serde_json::Map::new(),
        }
    }
}

impl JobRequest {
    pub fn new(encoded_audio: String, options: &JobOptions) -> Self {
        Self {
            service_type: "batch".to_string(),
            name: uuid::Uuid::new_v4().to_string(),
            model_type: options.model.clone(),
            features: options.features.clone(),
            language: options.language.clone(),
            task: if options.translate { "translate" } else { "transcribe" }.to_string(),
            store_conversation: options.store_conversation,
            channels: options.channels.clone(),
            data: encoded_audio,
            meta_info: options.meta_info.clone(),
        }
    }
}

/// Response to a submission; only `id` is required
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSubmission {
    pub id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Response of the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Classification of a status tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Succeeded,
    Failed(String),
    Pending(Option<String>),
}

pub const SUCCESS_STATUS: &str = "DONE";
pub const FAILURE_STATUSES: [&str; 3] = ["FAILED", "FAILED_TS_TRANSCRIBE", "FAILED_TRANSCRIBE"];

impl JobState {
    pub fn classify(status: Option<&str>) -> Self {
        match status {
            Some(SUCCESS_STATUS) => JobState::Succeeded,
            Some(s) if FAILURE_STATUSES.contains(&s) => JobState::Failed(s.to_string()),
            other => JobState::Pending(other.map(str::to_string)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Pending(_))
    }
}

impl JobStatus {
    pub fn state(&self) -> JobState {
        JobState::classify(self.status.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultWord {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSegment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub words: Vec<ResultWord>,
}

/// Transcription results of a finished job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobResults {
    #[serde(default)]
    pub transcribe: Vec<ResultSegment>,
}

impl JobResults {
    /// Results arrive either as an object or as a JSON-encoded string
    pub fn parse(value: &Value) -> ClientResult<Self> {
        match value {
            Value::String(raw) => serde_json::from_str(raw)
                .map_err(|e| ClientError::Protocol(format!("results are not valid JSON: {}", e))),
            Value::Null => Ok(Self::default()),
            other => Ok(serde_json::from_value(other.clone())?),
        }
    }

    pub fn has_word_timestamps(&self) -> bool {
        self.transcribe.iter().any(|s| !s.words.is_empty())
    }

    pub fn full_transcript(&self) -> String {
        self.transcribe
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
