// Integration tests for audio file decoding
//
// Fixtures are generated with hound into a scratch directory, then decoded
// back through symphonia.

use anyhow::Result;
use std::path::{Path, PathBuf};
use talkscriber::audio::{AudioFile, WavSink, WAV_HEADER_BYTES};

fn write_fixture(dir: &Path, name: &str, sample_rate: u32, channels: u16, seconds: f64) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let frames = (sample_rate as f64 * seconds) as usize;
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..frames {
        // 440Hz tone, same on every channel
        let t = i as f64 / sample_rate as f64;
        let value = ((t * 440.0 * std::f64::consts::TAU).sin() * 8000.0) as i16;
        for _ in 0..channels {
            writer.write_sample(value).unwrap();
        }
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_fixture(dir.path(), "tone.wav", 16000, 1, 0.5);

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 8000);
    assert!((audio.duration_seconds - 0.5).abs() < 0.01);
    assert!(audio.path.contains("tone.wav"));

    Ok(())
}

#[test]
fn test_stereo_file_is_downmixed_and_resampled() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_fixture(dir.path(), "stereo.wav", 48000, 2, 1.0);

    let audio = AudioFile::open(&path)?;
    assert_eq!(audio.channels, 2);
    assert_eq!(audio.sample_rate, 48000);

    let mono = audio.to_mono(16000);
    let diff = (mono.len() as i64 - 16000).abs();
    assert!(diff <= 1, "expected ~16000 samples, got {}", mono.len());
    assert!(mono.iter().any(|&s| s != 0), "tone should survive conversion");

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let result = AudioFile::open("/nonexistent/path/to/audio.wav");
    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_audio_file_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.wav");
    std::fs::write(&path, b"definitely not audio").unwrap();

    assert!(AudioFile::open(&path).is_err());
}

#[test]
fn test_wav_sink_roundtrip_through_decoder() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("out.wav");

    let mut sink = WavSink::create(&path, 24000, 1)?;
    sink.write_pcm_bytes(&[0x10, 0x00, 0x20])?;
    sink.write_pcm_bytes(&[0x00])?;
    assert!((sink.duration_seconds() - 2.0 / 24000.0).abs() < 1e-12);
    let saved = sink.finish()?;

    assert_eq!(std::fs::metadata(&saved)?.len(), WAV_HEADER_BYTES + 4);

    let audio = AudioFile::open(&saved)?;
    assert_eq!(audio.sample_rate, 24000);
    assert_eq!(audio.samples, vec![0x0010, 0x0020]);

    Ok(())
}

#[test]
fn test_wav_sink_finalizes_on_drop() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("dropped.wav");

    {
        let mut sink = WavSink::create(&path, 16000, 1)?;
        sink.write_samples(&[1, 2, 3, 4])?;
    }

    let reader = hound::WavReader::open(&path)?;
    assert_eq!(reader.len(), 4);
    assert_eq!(reader.spec().sample_rate, 16000);

    Ok(())
}
