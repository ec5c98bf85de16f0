pub mod backend;
pub mod file;
pub mod wav;

pub use backend::{
    bytes_to_pcm, encode_chunk, pcm_to_bytes, AudioBackend, AudioBackendFactory, AudioFrame,
    AudioSource, PcmBackend, FRAME_SAMPLES, MAX_SILENCE_SECONDS, STT_SAMPLE_RATE,
};
pub use file::AudioFile;
pub use wav::{WavSink, WAV_HEADER_BYTES};
