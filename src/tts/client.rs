use super::config::TtsOptions;
use super::messages::{ControlAction, TtsControl, TtsRequest};
use crate::audio::WavSink;
use crate::error::{ClientError, ClientResult};
use crate::ws;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Audio and latency figures for one TTS request
#[derive(Debug, Clone, Serialize)]
pub struct TtsReport {
    pub chunks_count: usize,
    pub total_bytes: usize,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Time from request start to the first non-empty audio frame
    pub ttft: Option<Duration>,
    pub saved_to: Option<PathBuf>,
}

impl TtsReport {
    fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            chunks_count: 0,
            total_bytes: 0,
            duration_seconds: 0.0,
            sample_rate,
            channels,
            bits_per_sample: 16,
            ttft: None,
            saved_to: None,
        }
    }

    pub fn ttft_ms(&self) -> Option<f64> {
        self.ttft.map(|d| d.as_secs_f64() * 1000.0)
    }

    fn bytes_per_second(&self) -> f64 {
        self.sample_rate as f64 * self.channels as f64 * (self.bits_per_sample / 8) as f64
    }
}

/// One-shot text-to-speech over WebSocket
pub struct TtsSession;

impl TtsSession {
    /// Send the request and collect audio until the server signals the end
    ///
    /// Audio frames are raw 16-bit little-endian PCM. When `save_path` is set
    /// the audio is written progressively; a request that yields no audio
    /// still closes cleanly and leaves a header-only WAV.
    pub async fn run(options: &TtsOptions) -> ClientResult<TtsReport> {
        let start = Instant::now();

        let stream = ws::connect(&options.url()).await?;
        let (mut sink, mut stream) = stream.split();

        let request = TtsRequest::new(uuid::Uuid::new_v4().to_string(), options);
        sink.send(Message::Text(serde_json::to_string(&request)?))
            .await?;
        info!(
            "TTS request sent (model={}, speaker={}, {} chars)",
            request.model,
            request.speaker_name,
            request.text.chars().count()
        );

        let mut wav = match &options.save_path {
            Some(path) => Some(WavSink::create(path, options.sample_rate, options.channels)?),
            None => None,
        };

        let mut report = TtsReport::new(options.sample_rate, options.channels);
        let idle_timeout = options.idle_timeout;

        loop {
            let message = match tokio::time::timeout(idle_timeout, stream.next()).await {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(_) => {
                    if let Err(e) = sink.close().await {
                        debug!("WebSocket close: {}", e);
                    }
                    return Err(ClientError::Timeout(format!(
                        "no data from the server for {:.1}s",
                        idle_timeout.as_secs_f64()
                    )));
                }
            };

            match message? {
                Message::Binary(data) => {
                    if data.is_empty() {
                        continue;
                    }
                    if report.ttft.is_none() {
                        let ttft = start.elapsed();
                        info!("First audio after {:.2}ms", ttft.as_secs_f64() * 1000.0);
                        report.ttft = Some(ttft);
                    }

                    report.chunks_count += 1;
                    report.total_bytes += data.len();

                    if let Some(wav) = &mut wav {
                        wav.write_pcm_bytes(&data)?;
                    }
                }
                Message::Text(text) => match serde_json::from_str::<TtsControl>(&text) {
                    Ok(control) => match control.action() {
                        ControlAction::Complete => {
                            debug!("Server signalled end of audio");
                            break;
                        }
                        ControlAction::Fail(e) => return Err(e),
                        ControlAction::Continue => debug!("Server status: {}", text),
                    },
                    Err(e) => warn!("Dropping malformed server message: {}", e),
                },
                Message::Close(frame) => {
                    debug!(
                        "Server closed the connection{}",
                        frame
                            .map(|f| format!(": {} {}", u16::from(f.code), f.reason))
                            .unwrap_or_default()
                    );
                    break;
                }
                _ => {}
            }
        }

        if let Err(e) = sink.close().await {
            debug!("WebSocket close: {}", e);
        }

        report.duration_seconds = report.total_bytes as f64 / report.bytes_per_second();

        if let Some(wav) = wav {
            report.saved_to = Some(wav.finish()?);
        }

        if report.total_bytes == 0 {
            warn!("Server returned no audio");
        }

        info!(
            "TTS complete: {} chunks, {} bytes, {:.2}s",
            report.chunks_count, report.total_bytes, report.duration_seconds
        );

        Ok(report)
    }

    /// Run and fail unless at least one audio frame arrived
    pub async fn run_expecting_audio(options: &TtsOptions) -> ClientResult<TtsReport> {
        let report = Self::run(options).await?;
        if report.ttft.is_none() {
            return Err(ClientError::Protocol("no audio received".to_string()));
        }
        Ok(report)
    }
}
