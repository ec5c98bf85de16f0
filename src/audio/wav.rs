use crate::error::ClientResult;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::backend::bytes_to_pcm;

/// Size of the canonical RIFF/WAVE header for 16-bit PCM
pub const WAV_HEADER_BYTES: u64 = 44;

/// Progressive 16-bit PCM WAV writer
///
/// Finalized on `finish`, or on drop if the owner bails out early.
pub struct WavSink {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
    samples_written: u64,
    pending: Option<u8>,
}

impl WavSink {
    pub fn create(path: impl AsRef<Path>, sample_rate: u32, channels: u16) -> ClientResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&path, spec)?;

        Ok(Self {
            writer: Some(writer),
            path,
            sample_rate,
            channels,
            samples_written: 0,
            pending: None,
        })
    }

    pub fn write_samples(&mut self, samples: &[i16]) -> ClientResult<()> {
        if let Some(writer) = &mut self.writer {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
            self.samples_written += samples.len() as u64;
        }

        Ok(())
    }

    /// Append raw little-endian PCM; an odd trailing byte is carried into the next call
    pub fn write_pcm_bytes(&mut self, bytes: &[u8]) -> ClientResult<()> {
        let samples = match self.pending.take() {
            Some(first) => {
                let mut joined = Vec::with_capacity(bytes.len() + 1);
                joined.push(first);
                joined.extend_from_slice(bytes);
                if joined.len() % 2 == 1 {
                    self.pending = joined.pop();
                }
                bytes_to_pcm(&joined)
            }
            None => {
                if bytes.len() % 2 == 1 {
                    self.pending = bytes.last().copied();
                }
                bytes_to_pcm(bytes)
            }
        };

        self.write_samples(&samples)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seconds of audio written so far
    pub fn duration_seconds(&self) -> f64 {
        self.samples_written as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    pub fn finish(mut self) -> ClientResult<PathBuf> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }

        if self.pending.is_some() {
            warn!("Dropping trailing odd byte at end of {}", self.path.display());
        }

        info!(
            "Saved {:.2}s of audio to {}",
            self.duration_seconds(),
            self.path.display()
        );

        Ok(self.path.clone())
    }
}

impl Drop for WavSink {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}
