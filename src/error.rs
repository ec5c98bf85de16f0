use std::fmt::{Display, Formatter};

/// Errors surfaced by the Talkscriber clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Transport could not be established or dropped unexpectedly
    Connection(String),
    /// Server rejected the API key
    Authentication(String),
    /// A deadline passed before the server reached the expected state
    Timeout(String),
    /// Malformed or unexpected payload
    Protocol(String),
    /// Audio hardware unavailable
    Device(String),
    /// Server asked the client to wait; the caller should back off
    ServerBusy(Option<String>),
    /// Batch job reached a terminal failure status
    JobFailed(String),
    /// Local file problem (input audio, output WAV, report file)
    Io(String),
}

impl ClientError {
    /// Per-frame errors are absorbed by a running session, everything else ends it
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ClientError::Protocol(_))
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Connection(e) => write!(f, "Connection error: {}", e),
            ClientError::Authentication(e) => write!(f, "Authentication failed: {}", e),
            ClientError::Timeout(e) => write!(f, "Timed out: {}", e),
            ClientError::Protocol(e) => write!(f, "Protocol error: {}", e),
            ClientError::Device(e) => write!(f, "Audio device error: {}", e),
            ClientError::ServerBusy(Some(wait)) => {
                write!(f, "Server busy, please retry later (estimated wait: {})", wait)
            }
            ClientError::ServerBusy(None) => write!(f, "Server busy, please retry later"),
            ClientError::JobFailed(status) => write!(f, "Job failed with status: {}", status),
            ClientError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Protocol(e.to_string())
    }
}

impl From<hound::Error> for ClientError {
    fn from(e: hound::Error) -> Self {
        ClientError::Io(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match e {
            WsError::Http(response) => {
                let status = response.status().as_u16();
                if status == 401 || status == 403 {
                    ClientError::Authentication(format!("server refused upgrade with HTTP {}", status))
                } else {
                    ClientError::Connection(format!("server refused upgrade with HTTP {}", status))
                }
            }
            other => ClientError::Connection(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(format!("request timed out: {}", e))
        } else if e.is_decode() {
            ClientError::Protocol(format!("invalid response body: {}", e))
        } else {
            ClientError::Connection(format!("request failed: {}", e))
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
