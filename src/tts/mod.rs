//! Text-to-speech over WebSocket with TTFT measurement and WAV output

mod client;
mod config;
mod messages;

pub use client::{TtsReport, TtsSession};
pub use config::{GenerationConfig, TtsOptions};
pub use messages::{ControlAction, TtsControl, TtsRequest};
