use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use talkscriber::batch::{BatchClient, JobOptions, JobResults, PollOptions};
use talkscriber::config::DEFAULT_CONFIG_PATH;
use talkscriber::{
    AudioBackendFactory, AudioSource, BenchmarkRunner, Config, SttOptions, SttSession, StreamEnd,
    TtsOptions, TtsSession,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "talkscriber")]
#[command(version, about = "Client for the Talkscriber speech services")]
struct Cli {
    /// Talkscriber API key (falls back to TALKSCRIBER_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Configuration file, without extension
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Live speech-to-text (or offline batch with --offline)
    Stt(SttArgs),
    /// Text-to-speech with TTFT measurement
    Tts(TtsArgs),
    /// TTS time-to-first-token benchmark
    Bench(BenchArgs),
}

#[derive(Args)]
struct SttArgs {
    /// Audio file to stream instead of the microphone
    #[arg(long, conflicts_with = "silence")]
    file: Option<PathBuf>,

    /// Stream this many seconds of silence
    #[arg(long)]
    silence: Option<f64>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Language code (e.g. "en")
    #[arg(long)]
    language: Option<String>,

    /// Let the server detect the language
    #[arg(long)]
    multilingual: bool,

    /// Translate to English instead of transcribing
    #[arg(long)]
    translate: bool,

    /// Enable server-side turn detection
    #[arg(long)]
    turn_detection: bool,

    /// Turn detection fallback threshold in seconds
    #[arg(long)]
    turn_detection_timeout: Option<f64>,

    /// Save the streamed audio as WAV
    #[arg(long)]
    save: Option<PathBuf>,

    /// Pace file input at real-time speed
    #[arg(long)]
    realtime: bool,

    /// Submit the file to the batch API instead of streaming
    #[arg(long, requires = "file")]
    offline: bool,

    /// Batch features to enable (e.g. sentiment, redaction)
    #[arg(long, num_args = 1..)]
    features: Vec<String>,

    /// Batch API endpoint
    #[arg(long)]
    batch_host: Option<String>,
}

#[derive(Args)]
struct TtsArgs {
    /// Text to synthesize
    #[arg(long)]
    text: String,

    /// Voice name or voice description
    #[arg(long)]
    speaker: Option<String>,

    #[arg(long)]
    model: Option<String>,

    /// Write the audio to this WAV file
    #[arg(long)]
    save: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    temperature: Option<f64>,

    #[arg(long)]
    top_p: Option<f64>,

    #[arg(long)]
    top_k: Option<u32>,

    #[arg(long)]
    max_tokens: Option<u32>,

    #[arg(long)]
    repetition_penalty: Option<f64>,
}

#[derive(Args)]
struct BenchArgs {
    #[arg(long)]
    runs: Option<usize>,

    #[arg(long)]
    speaker: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Directory for the results file
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("[ERROR]: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    let api_key = match cli.api_key.or_else(|| cfg.api_key.clone()) {
        Some(key) if !key.trim().is_empty() => key,
        _ => bail!("API key required (--api-key or TALKSCRIBER_API_KEY)"),
    };

    match cli.command {
        Command::Stt(args) if args.offline => run_offline(&cfg, api_key, args).await,
        Command::Stt(args) => run_stt(&cfg, api_key, args).await,
        Command::Tts(args) => run_tts(&cfg, api_key, args).await,
        Command::Bench(args) => run_bench(&cfg, api_key, args).await,
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn run_stt(cfg: &Config, api_key: String, args: SttArgs) -> Result<()> {
    let mut options = SttOptions::from_config(&cfg.stt, api_key);
    if let Some(host) = args.host {
        options.host = host;
    }
    if let Some(port) = args.port {
        options.port = port;
    }
    if let Some(language) = args.language {
        options.language = language;
    }
    if let Some(timeout) = args.turn_detection_timeout {
        options.turn_detection_timeout = timeout;
    }
    options.multilingual |= args.multilingual;
    options.translate |= args.translate;
    options.enable_turn_detection |= args.turn_detection;
    options.recording_path = args.save;
    options.print_transcript = true;

    let source = match (args.file, args.silence) {
        (Some(path), _) => AudioSource::File(path),
        (None, Some(seconds)) => AudioSource::Silence(seconds),
        (None, None) => AudioSource::Microphone,
    };

    let mut backend = AudioBackendFactory::create(source, args.realtime)?;
    info!("Streaming from {} to {}", backend.name(), options.url());

    let outcome = SttSession::run(options, backend.as_mut(), ctrl_c()).await?;

    match outcome.end {
        StreamEnd::Interrupted => info!("Interrupted by user"),
        StreamEnd::ServerClosed => info!("Server closed the session"),
        StreamEnd::Drained => info!("Input finished"),
    }

    if let Some(stats) = outcome.stats {
        println!();
        println!(
            "Session {}: {:.1}s, {} chunks ({} bytes) sent, {} segments received",
            stats.session_id,
            stats.duration_secs,
            stats.chunks_sent,
            stats.bytes_sent,
            stats.segments_received
        );
        if let Some(language) = &stats.detected_language {
            println!(
                "Detected language: {} ({:.2})",
                language,
                stats.language_confidence.unwrap_or_default()
            );
        }
    }

    Ok(())
}

async fn run_offline(cfg: &Config, api_key: String, args: SttArgs) -> Result<()> {
    let Some(file) = args.file else {
        bail!("--file argument is required for offline mode");
    };

    let api_url = args.batch_host.unwrap_or_else(|| cfg.batch.url.clone());
    let client = BatchClient::new(api_url, api_key);

    let job = JobOptions {
        language: args.language.unwrap_or_else(|| cfg.stt.language.clone()),
        translate: args.translate || cfg.stt.translate,
        features: args.features,
        model: cfg.batch.model.clone(),
        ..JobOptions::default()
    };

    info!("Audio file: {}", file.display());
    info!("Language: {}", job.language);
    info!(
        "Translation: {}",
        if job.translate { "enabled" } else { "disabled" }
    );
    if !job.features.is_empty() {
        info!("Features enabled: {}", job.features.join(", "));
    }

    let submission = client.submit_file(&file, &job).await?;
    info!("Job submitted successfully, id {}", submission.id);

    let poll = PollOptions {
        interval: Duration::from_secs(cfg.batch.poll_interval_secs),
        timeout: Duration::from_secs(cfg.batch.timeout_secs),
    };

    let status = tokio::select! {
        status = client.wait_for_completion(&submission.id, poll) => status?,
        _ = ctrl_c() => {
            info!("Interrupted by user; job {} keeps running on the server", submission.id);
            return Ok(());
        }
    };

    let rule = "=".repeat(80);
    println!();
    println!("{}", rule);
    println!("TRANSCRIPTION RESULTS");
    println!("{}", rule);
    println!();

    let Some(raw) = &status.results else {
        println!("No results available");
        println!("{}", rule);
        return Ok(());
    };

    let results = JobResults::parse(raw)?;
    if results.transcribe.is_empty() {
        println!("No transcription data available");
        println!("{}", rule);
        return Ok(());
    }

    for segment in &results.transcribe {
        println!("[{:.2}s - {:.2}s]: {}", segment.start, segment.end, segment.text);
        if !segment.words.is_empty() {
            println!("  Word-level timestamps:");
            for word in &segment.words {
                println!("    [{:.2}s - {:.2}s]: {}", word.start, word.end, word.word);
            }
            println!();
        }
    }

    println!();
    println!("{}", "-".repeat(80));
    println!("Full Transcript:");
    println!("{}", results.full_transcript());
    println!();
    println!("{}", rule);

    Ok(())
}

fn tts_options(
    cfg: &Config,
    api_key: String,
    text: String,
    host: Option<String>,
    port: Option<u16>,
    speaker: Option<String>,
) -> TtsOptions {
    let mut options = TtsOptions::from_config(&cfg.tts, api_key, text);
    if let Some(host) = host {
        options.host = host;
    }
    if let Some(port) = port {
        options.port = port;
    }
    if let Some(speaker) = speaker {
        options.speaker = speaker;
    }
    options
}

async fn run_tts(cfg: &Config, api_key: String, args: TtsArgs) -> Result<()> {
    if args.text.trim().is_empty() {
        bail!("--text must not be empty");
    }

    let mut options = tts_options(cfg, api_key, args.text, args.host, args.port, args.speaker);
    if let Some(model) = args.model {
        options.model = model;
    }
    options.save_path = args.save;
    options.generation.temperature = args.temperature;
    options.generation.top_p = args.top_p;
    options.generation.top_k = args.top_k;
    options.generation.max_tokens = args.max_tokens;
    options.generation.repetition_penalty = args.repetition_penalty;

    let report = tokio::select! {
        report = TtsSession::run(&options) => report?,
        _ = ctrl_c() => {
            info!("Interrupted by user");
            return Ok(());
        }
    };

    println!("Audio information:");
    println!("  Chunks:      {}", report.chunks_count);
    println!("  Bytes:       {}", report.total_bytes);
    println!("  Duration:    {:.2}s", report.duration_seconds);
    println!(
        "  Format:      {} Hz, {} channel(s), {}-bit PCM",
        report.sample_rate, report.channels, report.bits_per_sample
    );
    match report.ttft_ms() {
        Some(ttft) => println!("  TTFT:        {:.2} ms", ttft),
        None => println!("  TTFT:        n/a (no audio received)"),
    }
    if let Some(path) = &report.saved_to {
        println!("  Saved to:    {}", path.display());
    }

    Ok(())
}

async fn run_bench(cfg: &Config, api_key: String, args: BenchArgs) -> Result<()> {
    let options = tts_options(
        cfg,
        api_key,
        cfg.bench.text.clone(),
        args.host,
        args.port,
        args.speaker,
    );
    let runs = args.runs.unwrap_or(cfg.bench.runs);
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| PathBuf::from(&cfg.bench.output_dir));

    let rule = "=".repeat(80);
    println!("{}", rule);
    println!("Talkscriber TTS - TTFT Benchmark");
    println!("{}", rule);
    println!("  Host: {}", options.url());
    println!("  Speaker: {}", options.speaker);
    println!("  Number of runs: {}", runs);
    println!(
        "  Text length: {} characters, {} words",
        options.text.chars().count(),
        options.text.split_whitespace().count()
    );
    println!("{}", rule);

    let runner = BenchmarkRunner::new(runs, Duration::from_millis(cfg.bench.pause_ms));
    let report = runner
        .run(
            |_| {
                let options = options.clone();
                async move { TtsSession::run(&options).await.map(|r| r.ttft) }
            },
            ctrl_c(),
        )
        .await
        .with_detail("Host", options.url())
        .with_detail("Speaker", options.speaker.clone())
        .with_detail("Text", options.text.clone());

    println!("{}", report.render());

    if !report.has_samples() {
        bail!("No successful measurements collected");
    }

    let path = report.write_to(&output_dir)?;
    println!("Results saved to: {}", path.display());

    Ok(())
}
