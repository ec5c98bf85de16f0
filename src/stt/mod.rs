//! Live speech-to-text session
//!
//! This module provides the `SttSession` abstraction that manages:
//! - The WebSocket connection and the one-time handshake
//! - Server status handling (ready, wait, disconnect)
//! - Audio frame streaming from an `AudioBackend`
//! - Transcript collection with consecutive-repeat suppression
//! - Session statistics and scoped shutdown

mod config;
mod messages;
mod session;
mod stats;
mod transcript;

pub use config::SttOptions;
pub use messages::{Handshake, Segment, ServerEvent, ServerMessage, Task, Word};
pub use session::{SessionOutcome, SttSession, StreamEnd};
pub use stats::SessionStats;
pub use transcript::{Transcript, DISPLAY_TAIL, DISPLAY_WIDTH};
