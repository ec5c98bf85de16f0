pub mod audio;
pub mod batch;
pub mod bench;
pub mod config;
pub mod error;
pub mod stt;
pub mod tts;
pub mod ws;

pub use audio::{
    AudioBackend, AudioBackendFactory, AudioFile, AudioFrame, AudioSource, PcmBackend, WavSink,
};
pub use batch::{BatchClient, JobOptions, JobResults, JobState, JobStatus, PollOptions};
pub use bench::{percentile, BenchmarkReport, BenchmarkRunner, LatencyStats};
pub use config::Config;
pub use error::{ClientError, ClientResult};
pub use stt::{SessionOutcome, SessionStats, SttOptions, SttSession, StreamEnd, Transcript};
pub use tts::{GenerationConfig, TtsOptions, TtsReport, TtsSession};
