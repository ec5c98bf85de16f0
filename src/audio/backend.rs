use crate::error::{ClientError, ClientResult};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::file::AudioFile;

/// Samples per outbound frame (64 ms at 16kHz)
pub const FRAME_SAMPLES: usize = 1024;

/// Sample rate the STT service expects
pub const STT_SAMPLE_RATE: u32 = 16000;

/// Longest generated silence (one day)
pub const MAX_SILENCE_SECONDS: f64 = 86_400.0;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since the stream started
    pub timestamp_ms: u64,
}

/// Audio capture backend trait
///
/// Implementations:
/// - File: decoded audio file, split into fixed-size frames
/// - Silence: generated zeroes, for smoke tests and benchmarks
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start producing audio
    ///
    /// Returns a channel receiver that will receive audio frames. The channel
    /// closes once the source is exhausted or `stop` is called.
    async fn start(&mut self) -> ClientResult<mpsc::Receiver<AudioFrame>>;

    /// Stop producing audio and release the source
    async fn stop(&mut self) -> ClientResult<()>;

    /// Check if backend is currently producing frames
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Microphone input (not available in this build)
    Microphone,
    /// File input, resampled to 16kHz mono
    File(PathBuf),
    /// N seconds of silence
    Silence(f64),
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create audio backend for the given source
    ///
    /// With `realtime` set, frames are released at playback speed instead of
    /// as fast as the consumer accepts them.
    pub fn create(source: AudioSource, realtime: bool) -> ClientResult<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Microphone => Err(ClientError::Device(
                "microphone capture is not supported; use --file or --silence".to_string(),
            )),
            AudioSource::File(path) => {
                let file = AudioFile::open(&path)
                    .map_err(|e| ClientError::Io(format!("{}: {:#}", path.display(), e)))?;
                let samples = file.to_mono(STT_SAMPLE_RATE);
                Ok(Box::new(PcmBackend::new(
                    format!("file:{}", path.display()),
                    samples,
                    STT_SAMPLE_RATE,
                    realtime,
                )))
            }
            AudioSource::Silence(seconds) => {
                if !(0.0..=MAX_SILENCE_SECONDS).contains(&seconds) {
                    return Err(ClientError::Device(format!(
                        "silence duration must be between 0 and {}s, got {}",
                        MAX_SILENCE_SECONDS, seconds
                    )));
                }
                let count = (seconds * STT_SAMPLE_RATE as f64).round() as usize;
                Ok(Box::new(PcmBackend::new(
                    "silence".to_string(),
                    vec![0i16; count],
                    STT_SAMPLE_RATE,
                    realtime,
                )))
            }
        }
    }
}

/// Backend that replays an in-memory mono PCM buffer in fixed-size frames
pub struct PcmBackend {
    name: String,
    samples: Arc<Vec<i16>>,
    sample_rate: u32,
    realtime: bool,
    capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl PcmBackend {
    pub fn new(name: String, samples: Vec<i16>, sample_rate: u32, realtime: bool) -> Self {
        Self {
            name,
            samples: Arc::new(samples),
            sample_rate,
            realtime,
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Total number of frames this backend will emit
    pub fn frame_count(&self) -> usize {
        self.samples.len().div_ceil(FRAME_SAMPLES)
    }
}

#[async_trait::async_trait]
impl AudioBackend for PcmBackend {
    async fn start(&mut self) -> ClientResult<mpsc::Receiver<AudioFrame>> {
        if self.capturing.load(Ordering::SeqCst) {
            return Err(ClientError::Device(format!("{} already started", self.name)));
        }

        let (tx, rx) = mpsc::channel(32);
        let samples = Arc::clone(&self.samples);
        let capturing = Arc::clone(&self.capturing);
        let sample_rate = self.sample_rate;
        let realtime = self.realtime;
        let frame_duration =
            Duration::from_secs_f64(FRAME_SAMPLES as f64 / sample_rate as f64);

        capturing.store(true, Ordering::SeqCst);
        info!(
            "Audio backend {} started ({} samples @ {}Hz)",
            self.name,
            samples.len(),
            sample_rate
        );

        self.task = Some(tokio::spawn(async move {
            for (index, chunk) in samples.chunks(FRAME_SAMPLES).enumerate() {
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }

                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate,
                    channels: 1,
                    timestamp_ms: (index * FRAME_SAMPLES) as u64 * 1000 / sample_rate as u64,
                };

                if tx.send(frame).await.is_err() {
                    break;
                }

                if realtime {
                    tokio::time::sleep(frame_duration).await;
                }
            }

            capturing.store(false, Ordering::SeqCst);
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> ClientResult<()> {
        self.capturing.store(false, Ordering::SeqCst);

        if let Some(task) = self.task.take() {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Audio backend {} task failed: {}", self.name, e);
                }
            }
        }

        info!("Audio backend {} stopped", self.name);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Convert i16 PCM into the STT wire format: little-endian f32 in [-1, 1)
pub fn encode_chunk(samples: &[i16]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&s| (s as f32 / 32768.0).to_le_bytes())
        .collect()
}

/// Convert i16 PCM into little-endian bytes
pub fn pcm_to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Convert little-endian bytes into i16 PCM; a trailing odd byte is ignored
pub fn bytes_to_pcm(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
