use super::config::{GenerationConfig, TtsOptions};
use crate::error::ClientError;
use crate::ws::is_auth_failure;
use serde::{Deserialize, Serialize};

/// Request sent as the first frame of a TTS connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsRequest {
    pub uid: String,
    pub auth: String,
    pub text: String,
    pub speaker_name: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "GenerationConfig::is_empty")]
    pub maya_generation_config: GenerationConfig,
}

impl TtsRequest {
    pub fn new(uid: String, options: &TtsOptions) -> Self {
        Self {
            uid,
            auth: options.api_key.clone(),
            text: options.text.clone(),
            speaker_name: options.speaker.clone(),
            model: options.model.clone(),
            maya_generation_config: options.generation.clone(),
        }
    }
}

/// JSON control frame from the TTS server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsControl {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a control frame means for the running request
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    /// Informational, keep reading
    Continue,
    /// Audio stream finished
    Complete,
    /// Request failed
    Fail(ClientError),
}

const COMPLETION_TAGS: [&str; 6] = [
    "DISCONNECT",
    "END_OF_AUDIO",
    "COMPLETE",
    "COMPLETED",
    "DONE",
    "END",
];

impl TtsControl {
    pub fn action(&self) -> ControlAction {
        let tags = [&self.kind, &self.status, &self.message];

        if let Some(error) = &self.error {
            return ControlAction::Fail(Self::failure(error));
        }

        let status = self.status.as_deref().map(str::to_ascii_uppercase);
        match status.as_deref() {
            Some("ERROR") | Some("FAILED") => {
                let reason = self
                    .message
                    .clone()
                    .unwrap_or_else(|| "server reported an error".to_string());
                return ControlAction::Fail(Self::failure(&reason));
            }
            Some("UNAUTHORIZED") => {
                return ControlAction::Fail(ClientError::Authentication(
                    self.message.clone().unwrap_or_else(|| "unauthorized".to_string()),
                ))
            }
            Some("WAIT") => return ControlAction::Fail(ClientError::ServerBusy(self.message.clone())),
            _ => {}
        }

        let complete = tags.iter().any(|tag| {
            tag.as_deref()
                .map(|t| COMPLETION_TAGS.contains(&t.to_ascii_uppercase().as_str()))
                .unwrap_or(false)
        });

        if complete {
            ControlAction::Complete
        } else {
            ControlAction::Continue
        }
    }

    fn failure(reason: &str) -> ClientError {
        if is_auth_failure(reason) {
            ClientError::Authentication(reason.to_string())
        } else {
            ClientError::Protocol(format!("server error: {}", reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(json: &str) -> TtsControl {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_completion_tags_end_the_stream() {
        assert_eq!(control(r#"{"message":"DISCONNECT"}"#).action(), ControlAction::Complete);
        assert_eq!(control(r#"{"type":"end_of_audio"}"#).action(), ControlAction::Complete);
        assert_eq!(control(r#"{"status":"done"}"#).action(), ControlAction::Complete);
    }

    #[test]
    fn test_error_frames_fail_the_request() {
        let action = control(r#"{"error":"Invalid API key"}"#).action();
        assert!(matches!(action, ControlAction::Fail(ClientError::Authentication(_))));

        let action = control(r#"{"status":"ERROR","message":"model overloaded"}"#).action();
        assert!(matches!(action, ControlAction::Fail(ClientError::Protocol(_))));
    }

    #[test]
    fn test_informational_frames_continue() {
        assert_eq!(control(r#"{"status":"GENERATING"}"#).action(), ControlAction::Continue);
        assert_eq!(control("{}").action(), ControlAction::Continue);
    }

    #[test]
    fn test_empty_generation_config_is_omitted() {
        let mut options = TtsOptions::new("key", "Hello");
        let request = TtsRequest::new("uid-1".to_string(), &options);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("maya_generation_config").is_none());
        assert_eq!(json["speaker_name"], "tara");
        assert_eq!(json["model"], "TTS_MAYA");

        options.generation.temperature = Some(0.7);
        options.generation.top_k = Some(50);
        let json = serde_json::to_value(TtsRequest::new("uid-2".to_string(), &options)).unwrap();
        assert_eq!(json["maya_generation_config"]["temperature"], 0.7);
        assert_eq!(json["maya_generation_config"]["top_k"], 50);
        assert!(json["maya_generation_config"].get("top_p").is_none());
    }
}
