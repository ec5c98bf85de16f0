use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a live transcription session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session id in effect at close (server-issued if the server sent one)
    pub session_id: String,

    /// When the connection was opened
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Binary audio frames sent
    pub chunks_sent: usize,

    /// Payload bytes sent
    pub bytes_sent: usize,

    /// Segments received across all batches
    pub segments_received: usize,

    /// Language reported by the server, if any
    pub detected_language: Option<String>,

    pub language_confidence: Option<f64>,

    /// Time from connect to the first non-empty segment batch
    pub first_segment_ms: Option<f64>,

    /// Last displayed transcript
    pub transcript: Vec<String>,
}
