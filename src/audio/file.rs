use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{info, warn};

/// A fully decoded audio file (16-bit PCM, interleaved)
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    /// Decode any container symphonia understands (WAV, MP3, FLAC, OGG, M4A)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .context("Unsupported or corrupt audio file")?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .context("No decodable audio track")?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .context("Audio track has no sample rate")?;
        let mut channels = codec_params.channels.map(|c| c.count() as u16).unwrap_or(1);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .context("Failed to create audio decoder")?;

        let mut samples: Vec<i16> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(e) => return Err(e).context("Failed to read audio packet"),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    channels = spec.channels.count() as u16;
                    let mut buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet: {}", e);
                }
                Err(e) => return Err(e).context("Failed to decode audio"),
            }
        }

        let duration_seconds = samples.len() as f64 / (sample_rate as f64 * channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            sample_rate,
            channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate,
            channels,
            samples,
        })
    }

    /// Down-mix to mono and resample to `target_rate`
    pub fn to_mono(&self, target_rate: u32) -> Vec<i16> {
        let mono = downmix(&self.samples, self.channels);
        resample_linear(&mono, self.sample_rate, target_rate)
    }
}

/// Average interleaved channels into one
pub fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Linear-interpolation resampler for mono PCM
pub fn resample_linear(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).round() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let index = (pos.floor() as usize).min(last);
            let next = (index + 1).min(last);
            let frac = pos - index as f64;
            let value = samples[index] as f64 * (1.0 - frac) + samples[next] as f64 * frac;
            value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_averages_stereo() {
        let stereo = vec![100, 300, -200, -400, i16::MAX, i16::MAX];
        assert_eq!(downmix(&stereo, 2), vec![200, -300, i16::MAX]);
    }

    #[test]
    fn test_resample_halves_length() {
        let input: Vec<i16> = (0..32000).map(|i| (i % 100) as i16).collect();
        let output = resample_linear(&input, 32000, 16000);
        assert_eq!(output.len(), 16000);
        assert_eq!(output[0], 0);
        assert_eq!(output[1], 2);
    }

    #[test]
    fn test_resample_interpolates_when_upsampling() {
        let output = resample_linear(&[0, 100], 8000, 16000);
        assert_eq!(output, vec![0, 50, 100, 100]);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let input = vec![1, 2, 3];
        assert_eq!(resample_linear(&input, 16000, 16000), input);
    }
}
