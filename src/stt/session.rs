use super::config::SttOptions;
use super::messages::{ServerEvent, ServerMessage};
use super::stats::SessionStats;
use super::transcript::{Transcript, DISPLAY_TAIL, DISPLAY_WIDTH};
use crate::audio::{encode_chunk, AudioBackend, WavSink, STT_SAMPLE_RATE};
use crate::error::{ClientError, ClientResult};
use crate::ws::{self, WsStream};
use chrono::{DateTime, Utc};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::error::{Error as WsError, ProtocolError};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Inbound events buffered between the listener and the foreground loop
const EVENT_QUEUE_CAPACITY: usize = 64;

/// How long `close` waits for the listener to see the close handshake
const LISTENER_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// What the listener task forwards to the foreground loop
#[derive(Debug)]
enum Inbound {
    Event(ServerEvent),
    Closed(Option<String>),
    Failed(ClientError),
}

/// Effect of one inbound item on the foreground loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Continue,
    Ready,
    Ended,
}

/// Why `SttSession::stream` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Server sent DISCONNECT or closed the socket
    ServerClosed,
    /// Input exhausted and the server went quiet for the drain timeout
    Drained,
    /// The shutdown future fired (Ctrl-C)
    Interrupted,
}

/// Result of `SttSession::run`
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub end: StreamEnd,
    /// `None` when interrupted before the server became ready
    pub stats: Option<SessionStats>,
}

/// A live transcription connection
///
/// The socket is split: a listener task owns the read half and forwards
/// parsed events through a bounded channel, while the caller's task owns the
/// write half and sends audio. Events are applied strictly in arrival order.
pub struct SttSession {
    options: SttOptions,
    session_id: String,
    sink: SplitSink<WsStream, Message>,
    events: mpsc::Receiver<Inbound>,
    listener: Option<JoinHandle<()>>,
    transcript: Transcript,
    recording: Option<WavSink>,
    started_at: DateTime<Utc>,
    opened: Instant,
    ready: bool,
    closed: bool,
    /// A write failed because the server's close frame was already read
    peer_closed: bool,
    chunks_sent: usize,
    bytes_sent: usize,
    segments_received: usize,
    detected_language: Option<String>,
    language_confidence: Option<f64>,
    first_segment_ms: Option<f64>,
}

impl SttSession {
    /// Connect, send the handshake and wait for SERVER_READY
    pub async fn open(options: SttOptions) -> ClientResult<Self> {
        let started_at = Utc::now();
        let opened = Instant::now();

        let stream = ws::connect(&options.url()).await?;
        let (mut sink, stream) = stream.split();

        let session_id = uuid::Uuid::new_v4().to_string();
        let handshake = options.handshake(&session_id);
        sink.send(Message::Text(serde_json::to_string(&handshake)?))
            .await?;

        info!(
            "Handshake sent (uid={}, language={}, multilingual={}, task={})",
            session_id,
            handshake.language,
            handshake.multilingual,
            handshake.task.as_str()
        );

        let (tx, events) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let listener = tokio::spawn(listen(stream, tx));

        let mut session = Self {
            options,
            session_id,
            sink,
            events,
            listener: Some(listener),
            transcript: Transcript::new(),
            recording: None,
            started_at,
            opened,
            ready: false,
            closed: false,
            peer_closed: false,
            chunks_sent: 0,
            bytes_sent: 0,
            segments_received: 0,
            detected_language: None,
            language_confidence: None,
            first_segment_ms: None,
        };

        // The recording file only appears once the server has accepted us
        let ready = match session.wait_until_ready().await {
            Ok(()) => session.start_recording(),
            Err(e) => Err(e),
        };
        if let Err(e) = ready {
            if let Err(close_err) = session.shutdown().await {
                warn!("Cleanup after failed open: {}", close_err);
            }
            return Err(e);
        }

        Ok(session)
    }

    /// Open, stream `backend` until it ends, then close
    ///
    /// `shutdown` covers both the wait for SERVER_READY and the streaming
    /// loop; cleanup runs on every exit path.
    pub async fn run<F>(
        options: SttOptions,
        backend: &mut dyn AudioBackend,
        shutdown: F,
    ) -> ClientResult<SessionOutcome>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut session = tokio::select! {
            session = SttSession::open(options) => session?,
            _ = &mut shutdown => {
                info!("Interrupted while waiting for the server");
                return Ok(SessionOutcome {
                    end: StreamEnd::Interrupted,
                    stats: None,
                });
            }
        };

        let streamed = session.stream(backend, shutdown.as_mut()).await;
        let closed = session.close().await;

        let end = streamed?;
        let stats = closed?;

        Ok(SessionOutcome {
            end,
            stats: Some(stats),
        })
    }

    async fn wait_until_ready(&mut self) -> ClientResult<()> {
        info!("Waiting for server ready...");
        let deadline = tokio::time::Instant::now() + self.options.ready_timeout;

        loop {
            let inbound = tokio::time::timeout_at(deadline, self.events.recv())
                .await
                .map_err(|_| {
                    ClientError::Timeout(format!(
                        "server not ready after {:.1}s",
                        self.options.ready_timeout.as_secs_f64()
                    ))
                })?;

            match self.handle(inbound)? {
                Signal::Ready => {
                    info!("Server ready");
                    return Ok(());
                }
                Signal::Ended => {
                    return Err(ClientError::Connection(
                        "server closed the connection before it was ready".to_string(),
                    ))
                }
                Signal::Continue => {}
            }
        }
    }

    fn start_recording(&mut self) -> ClientResult<()> {
        if let Some(path) = &self.options.recording_path {
            self.recording = Some(WavSink::create(path, STT_SAMPLE_RATE, 1)?);
            info!("Recording session audio to {}", path.display());
        }
        Ok(())
    }

    /// Send one audio frame; no acknowledgement is expected
    pub async fn send_chunk(&mut self, samples: &[i16]) -> ClientResult<()> {
        if self.closed {
            return Err(ClientError::Connection("session already closed".to_string()));
        }
        if !self.ready {
            return Err(ClientError::Protocol(
                "server not ready, dropping audio frame".to_string(),
            ));
        }

        let payload = encode_chunk(samples);
        let len = payload.len();
        if let Err(e) = self.sink.send(Message::Binary(payload)).await {
            if matches!(e, WsError::Protocol(ProtocolError::SendAfterClosing)) {
                self.peer_closed = true;
                self.ready = false;
            }
            return Err(e.into());
        }

        if let Some(recording) = &mut self.recording {
            if let Err(e) = recording.write_samples(samples) {
                warn!("Failed to record audio frame: {}", e);
            }
        }

        self.chunks_sent += 1;
        self.bytes_sent += len;

        Ok(())
    }

    /// Wait for the next server event and apply it
    ///
    /// Returns `Ok(None)` once the server has disconnected or closed the socket.
    pub async fn next_event(&mut self) -> ClientResult<Option<ServerEvent>> {
        match self.events.recv().await {
            Some(Inbound::Event(event)) => {
                self.apply(event.clone())?;
                Ok(Some(event))
            }
            other => {
                self.handle(other)?;
                Ok(None)
            }
        }
    }

    /// Stream frames from `backend` while applying server events
    ///
    /// Returns when the server disconnects, when the input is exhausted and
    /// the server has been quiet for the drain timeout, or when `shutdown`
    /// completes. A WAIT status stops sending and yields `ServerBusy`. The
    /// backend is stopped on every path.
    pub async fn stream<F>(
        &mut self,
        backend: &mut dyn AudioBackend,
        shutdown: F,
    ) -> ClientResult<StreamEnd>
    where
        F: Future<Output = ()>,
    {
        let mut audio_rx = backend.start().await?;
        info!("Streaming audio from {}", backend.name());

        tokio::pin!(shutdown);
        let drain_timeout = self.options.drain_timeout;
        let mut input_done = false;

        // Inbound items win over audio so a queued DISCONNECT or close frame
        // is seen before the next write
        let outcome = loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Interrupted, shutting down");
                    break Ok(StreamEnd::Interrupted);
                }
                inbound = self.events.recv() => match self.handle(inbound) {
                    Ok(Signal::Ended) => break Ok(StreamEnd::ServerClosed),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                frame = audio_rx.recv(), if !input_done => match frame {
                    Some(frame) => {
                        if let Err(e) = self.send_chunk(&frame.samples).await {
                            if e.is_fatal() {
                                break self.settle_after_send_failure(e).await;
                            }
                            warn!("{}", e);
                        }
                    }
                    None => {
                        input_done = true;
                        info!(
                            "Input exhausted after {} frames, waiting for final transcripts",
                            self.chunks_sent
                        );
                    }
                },
                _ = tokio::time::sleep(drain_timeout), if input_done => {
                    info!("No server activity for {:.1}s, finishing", drain_timeout.as_secs_f64());
                    break Ok(StreamEnd::Drained);
                }
            }
        };

        drop(audio_rx);
        if let Err(e) = backend.stop().await {
            warn!("Failed to stop audio backend {}: {}", backend.name(), e);
        }

        outcome
    }

    /// Decide how the session ended after a write failed
    ///
    /// The listener reports the socket's fate shortly after a write fails: a
    /// DISCONNECT or close frame ends the stream normally, a transport error
    /// surfaces as-is. `send_error` is returned when nothing arrives in time.
    async fn settle_after_send_failure(
        &mut self,
        send_error: ClientError,
    ) -> ClientResult<StreamEnd> {
        debug!("Audio write failed: {}", send_error);
        let deadline = tokio::time::Instant::now() + LISTENER_SHUTDOWN_GRACE;

        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(inbound) => {
                    if self.handle(inbound)? == Signal::Ended {
                        return Ok(StreamEnd::ServerClosed);
                    }
                }
                Err(_) if self.peer_closed => {
                    info!("Server closed the connection");
                    return Ok(StreamEnd::ServerClosed);
                }
                Err(_) => return Err(send_error),
            }
        }
    }

    /// Scoped shutdown: flush the recording, close the socket, stop the listener
    pub async fn close(mut self) -> ClientResult<SessionStats> {
        self.shutdown().await?;
        Ok(self.stats())
    }

    async fn shutdown(&mut self) -> ClientResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.ready = false;

        let flushed = match self.recording.take() {
            Some(recording) => recording.finish().map(|_| ()),
            None => Ok(()),
        };

        if let Err(e) = self.sink.close().await {
            debug!("WebSocket close: {}", e);
        }

        self.events.close();
        if let Some(mut listener) = self.listener.take() {
            if tokio::time::timeout(LISTENER_SHUTDOWN_GRACE, &mut listener)
                .await
                .is_err()
            {
                listener.abort();
            }
        }

        info!(
            "Session {} closed ({} frames, {} bytes sent)",
            self.session_id, self.chunks_sent, self.bytes_sent
        );

        flushed
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            duration_secs: self.opened.elapsed().as_secs_f64(),
            chunks_sent: self.chunks_sent,
            bytes_sent: self.bytes_sent,
            segments_received: self.segments_received,
            detected_language: self.detected_language.clone(),
            language_confidence: self.language_confidence,
            first_segment_ms: self.first_segment_ms,
            transcript: self.transcript.entries().to_vec(),
        }
    }

    fn handle(&mut self, inbound: Option<Inbound>) -> ClientResult<Signal> {
        match inbound {
            None => {
                debug!("Listener finished");
                Ok(Signal::Ended)
            }
            Some(Inbound::Closed(reason)) => {
                info!(
                    "WebSocket closed by server{}",
                    reason.map(|r| format!(": {}", r)).unwrap_or_default()
                );
                Ok(Signal::Ended)
            }
            Some(Inbound::Failed(e)) => Err(e),
            Some(Inbound::Event(event)) => self.apply(event),
        }
    }

    fn apply(&mut self, event: ServerEvent) -> ClientResult<Signal> {
        match event {
            ServerEvent::SessionId(id) => {
                if id != self.session_id {
                    info!("Server assigned session id {}", id);
                    self.session_id = id;
                }
                Ok(Signal::Continue)
            }
            ServerEvent::Ready => {
                self.ready = true;
                Ok(Signal::Ready)
            }
            ServerEvent::Busy { wait } => {
                self.ready = false;
                warn!("Server busy. Please wait...");
                Err(ClientError::ServerBusy(wait))
            }
            ServerEvent::Disconnect => {
                info!("Server initiated disconnect");
                self.ready = false;
                Ok(Signal::Ended)
            }
            ServerEvent::AuthFailed(reason) => Err(ClientError::Authentication(reason)),
            ServerEvent::Error(reason) => {
                error!("Server reported error: {}", reason);
                Ok(Signal::Continue)
            }
            ServerEvent::Language { code, confidence } => {
                info!(
                    "Detected language {} (confidence {})",
                    code,
                    confidence
                        .map(|c| format!("{:.2}", c))
                        .unwrap_or_else(|| "n/a".to_string())
                );
                self.detected_language = Some(code);
                self.language_confidence = confidence;
                Ok(Signal::Continue)
            }
            ServerEvent::Segments(segments) => {
                if self.first_segment_ms.is_none() {
                    self.first_segment_ms = Some(self.opened.elapsed().as_secs_f64() * 1000.0);
                }
                self.segments_received += segments.len();
                self.transcript = Transcript::from_segments(&segments);

                if self.options.print_transcript {
                    self.render();
                }
                Ok(Signal::Continue)
            }
        }
    }

    fn render(&self) {
        // Clear screen, cursor home
        print!("\x1B[2J\x1B[1;1H");
        for line in self.transcript.display_lines(DISPLAY_WIDTH, DISPLAY_TAIL) {
            println!("{}", line);
        }
        std::io::Write::flush(&mut std::io::stdout()).ok();
    }
}

impl Drop for SttSession {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Read half: parse frames and forward events until close or failure
async fn listen(mut stream: SplitStream<WsStream>, tx: mpsc::Sender<Inbound>) {
    debug!("Listener task started");

    while let Some(message) = stream.next().await {
        let terminal = match message {
            Ok(Message::Text(text)) => {
                match ServerMessage::parse(&text) {
                    Ok(parsed) => {
                        for event in parsed.into_events() {
                            if tx.send(Inbound::Event(event)).await.is_err() {
                                debug!("Session dropped, listener exiting");
                                return;
                            }
                        }
                    }
                    Err(e) => warn!("Dropping malformed server message: {}", e),
                }
                continue;
            }
            Ok(Message::Binary(data)) => {
                debug!("Ignoring {} byte binary frame", data.len());
                continue;
            }
            Ok(Message::Close(frame)) => {
                Inbound::Closed(frame.map(|f| format!("{} {}", u16::from(f.code), f.reason)))
            }
            Ok(_) => continue,
            Err(e) => Inbound::Failed(ClientError::from(e)),
        };

        let _ = tx.send(terminal).await;
        break;
    }

    debug!("Listener task stopped");
}
