// Tests for the audio backends feeding the STT session

use std::time::{Duration, Instant};
use talkscriber::audio::{
    encode_chunk, AudioBackend, AudioBackendFactory, AudioFrame, AudioSource, PcmBackend,
    FRAME_SAMPLES, MAX_SILENCE_SECONDS, STT_SAMPLE_RATE,
};
use talkscriber::ClientError;

#[test]
fn test_audio_frame_clone() {
    let frame = AudioFrame {
        samples: vec![1, 2, 3, 4, 5],
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 500,
    };

    let cloned = frame.clone();

    assert_eq!(frame.samples, cloned.samples);
    assert_eq!(frame.sample_rate, cloned.sample_rate);
    assert_eq!(frame.timestamp_ms, cloned.timestamp_ms);
}

#[test]
fn test_wire_chunk_is_four_bytes_per_sample() {
    let chunk = encode_chunk(&vec![0i16; FRAME_SAMPLES]);
    assert_eq!(chunk.len(), FRAME_SAMPLES * 4);
}

#[tokio::test]
async fn test_pcm_backend_frames_and_timestamps() {
    // 2.5 frames of audio
    let samples: Vec<i16> = (0..(FRAME_SAMPLES * 5 / 2) as i16).collect();
    let mut backend = PcmBackend::new("test".to_string(), samples, STT_SAMPLE_RATE, false);
    assert_eq!(backend.frame_count(), 3);

    let mut rx = backend.start().await.unwrap();
    let mut frames = Vec::new();
    while let Some(frame) = rx.recv().await {
        frames.push(frame);
    }

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].samples.len(), FRAME_SAMPLES);
    assert_eq!(frames[2].samples.len(), FRAME_SAMPLES / 2);
    assert_eq!(frames[0].timestamp_ms, 0);
    assert_eq!(frames[1].timestamp_ms, 64);
    assert_eq!(frames[1].samples[0], FRAME_SAMPLES as i16);
    assert!(frames.iter().all(|f| f.sample_rate == 16000 && f.channels == 1));

    backend.stop().await.unwrap();
    assert!(!backend.is_capturing());
}

#[tokio::test]
async fn test_realtime_pacing() {
    // 4 frames at 64ms each
    let mut backend = AudioBackendFactory::create(
        AudioSource::Silence(4.0 * FRAME_SAMPLES as f64 / STT_SAMPLE_RATE as f64),
        true,
    )
    .unwrap();

    let started = Instant::now();
    let mut rx = backend.start().await.unwrap();
    let mut count = 0;
    while rx.recv().await.is_some() {
        count += 1;
    }

    assert_eq!(count, 4);
    assert!(started.elapsed() >= Duration::from_millis(150));
    backend.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_ends_the_stream() {
    let mut backend = AudioBackendFactory::create(AudioSource::Silence(60.0), true).unwrap();
    let mut rx = backend.start().await.unwrap();
    assert!(rx.recv().await.is_some());
    assert!(backend.is_capturing());

    backend.stop().await.unwrap();
    assert!(!backend.is_capturing());

    // Whatever was buffered drains, then the channel closes
    while rx.recv().await.is_some() {}
}

#[tokio::test]
async fn test_double_start_is_rejected() {
    let mut backend = AudioBackendFactory::create(AudioSource::Silence(60.0), true).unwrap();
    let _rx = backend.start().await.unwrap();

    let second = backend.start().await;
    assert!(matches!(second, Err(ClientError::Device(_))));

    backend.stop().await.unwrap();
}

#[test]
fn test_silence_duration_is_bounded() {
    assert!(matches!(
        AudioBackendFactory::create(AudioSource::Silence(MAX_SILENCE_SECONDS + 1.0), false),
        Err(ClientError::Device(_))
    ));
    assert!(matches!(
        AudioBackendFactory::create(AudioSource::Silence(f64::INFINITY), false),
        Err(ClientError::Device(_))
    ));
}

#[test]
fn test_missing_file_source_is_io_error() {
    let result = AudioBackendFactory::create(AudioSource::File("/nonexistent/input.mp3".into()), false);
    assert!(matches!(result, Err(ClientError::Io(_))));
}

#[tokio::test]
async fn test_file_source_is_resampled_to_16k() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 32000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..32000 {
        writer.write_sample(1000i16).unwrap();
        writer.write_sample(3000i16).unwrap();
    }
    writer.finalize().unwrap();

    let mut backend = AudioBackendFactory::create(AudioSource::File(path), false).unwrap();
    let mut rx = backend.start().await.unwrap();

    let mut total = 0;
    while let Some(frame) = rx.recv().await {
        assert_eq!(frame.sample_rate, 16000);
        assert!(frame.samples.iter().all(|&s| s == 2000));
        total += frame.samples.len();
    }
    assert_eq!(total, 16000);

    backend.stop().await.unwrap();
}
