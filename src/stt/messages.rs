use crate::ws::is_auth_failure;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Transcription task requested in the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Transcribe,
    Translate,
}

impl Task {
    pub fn from_translate(translate: bool) -> Self {
        if translate {
            Task::Translate
        } else {
            Task::Transcribe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Transcribe => "transcribe",
            Task::Translate => "translate",
        }
    }
}

/// Handshake sent once, immediately after the socket opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handshake {
    pub uid: String,
    pub multilingual: bool,
    pub language: String,
    pub task: Task,
    pub auth: String,
    pub enable_turn_detection: bool,
    pub turn_detection_timeout: f64,
}

/// Word-level timing inside a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    #[serde(deserialize_with = "seconds")]
    pub start: f64,
    #[serde(deserialize_with = "seconds")]
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

/// Transcribed text span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(default, deserialize_with = "seconds")]
    pub start: f64,
    #[serde(default, deserialize_with = "seconds")]
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

/// Any JSON frame the STT server sends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(default)]
    pub uid: Option<String>,
    /// Preferred over `uid` when a frame carries both
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Usually a string tag, but WAIT carries the estimated wait as a number
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub segments: Option<Vec<Segment>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub language_confidence: Option<f64>,
}

/// Local state transition derived from a server frame
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    SessionId(String),
    Ready,
    Busy { wait: Option<String> },
    Disconnect,
    AuthFailed(String),
    Error(String),
    Language { code: String, confidence: Option<f64> },
    Segments(Vec<Segment>),
}

impl ServerMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// `message` rendered as text, whatever JSON type it arrived as
    pub fn message_text(&self) -> Option<String> {
        match &self.message {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Split one frame into events, in the order the client must apply them
    pub fn into_events(self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        let message = self.message_text();

        let id = self
            .session_id
            .filter(|id| !id.is_empty())
            .or(self.uid.filter(|id| !id.is_empty()));
        if let Some(id) = id {
            events.push(ServerEvent::SessionId(id));
        }

        match self.status.as_deref().map(str::to_ascii_uppercase).as_deref() {
            Some("WAIT") => events.push(ServerEvent::Busy {
                wait: message.clone(),
            }),
            Some("UNAUTHORIZED") => events.push(ServerEvent::AuthFailed(
                message.clone().unwrap_or_else(|| "unauthorized".to_string()),
            )),
            Some("ERROR") => {
                let text = message.clone().unwrap_or_else(|| "unknown server error".to_string());
                if is_auth_failure(&text) {
                    events.push(ServerEvent::AuthFailed(text));
                } else {
                    events.push(ServerEvent::Error(text));
                }
            }
            _ => {}
        }

        match message.as_deref() {
            Some("SERVER_READY") => events.push(ServerEvent::Ready),
            Some("DISCONNECT") => events.push(ServerEvent::Disconnect),
            _ => {}
        }

        if let Some(code) = self.language {
            events.push(ServerEvent::Language {
                code,
                confidence: self.language_confidence,
            });
        }

        if let Some(segments) = self.segments.filter(|s| !s.is_empty()) {
            events.push(ServerEvent::Segments(segments));
        }

        events
    }
}

/// Accept seconds as a JSON number or a numeric string ("1.250")
fn seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", s, e))),
        Value::Null => Ok(0.0),
        other => Err(serde::de::Error::custom(format!(
            "invalid timestamp: {}",
            other
        ))),
    }
}
