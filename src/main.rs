use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use genie_voice::engines::{gemini, GeminiClient, GoogleSpeechClient, GoogleTtsClient};
use genie_voice::{
    create_router, AppState, Config, FileBackend, HttpTurnClient, LanguageCode, TurnOrchestrator,
    TurnTransport, TutorSession,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Voice tutor: turn server and command-line client
#[derive(Parser)]
#[command(name = "genie-voice", version, about)]
struct Cli {
    /// Config file (extension optional, missing file is fine)
    #[arg(short, long, default_value = "config/genie-voice")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Speak a WAV file to the tutor and save the spoken reply
    Talk {
        /// 16-bit PCM WAV file to replay as microphone input
        #[arg(short, long)]
        wav: PathBuf,

        /// Server root URL; runs the turn in-process when omitted
        #[arg(short, long)]
        server: Option<String>,

        /// Learner language (e.g. hi-IN)
        #[arg(short, long)]
        language: Option<String>,

        /// Roleplay scenario id (school, store, home, playground)
        #[arg(long)]
        scenario: Option<String>,

        /// Where to write the reply audio
        #[arg(short, long, default_value = "reply.mp3")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("genie_voice=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg).await,
        Command::Talk {
            wav,
            server,
            language,
            scenario,
            out,
        } => talk(cfg, wav, server, language, scenario, out).await,
    }
}

/// Engine clients are created once and shared by every turn
fn build_orchestrator(cfg: &Config) -> Result<TurnOrchestrator> {
    let engines = &cfg.engines;

    let google_key = engines
        .google_api_key
        .clone()
        .context("engines.google_api_key is not set (GENIE__ENGINES__GOOGLE_API_KEY)")?;
    let gemini_key = engines
        .gemini_api_key
        .clone()
        .context("engines.gemini_api_key is not set (GENIE__ENGINES__GEMINI_API_KEY)")?;
    let model = engines
        .gemini_model
        .clone()
        .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());

    let transcriber = match &engines.speech_endpoint {
        Some(endpoint) => GoogleSpeechClient::with_endpoint(google_key.clone(), endpoint.clone())?,
        None => GoogleSpeechClient::new(google_key.clone())?,
    };
    let synthesizer = match &engines.tts_endpoint {
        Some(endpoint) => GoogleTtsClient::with_endpoint(google_key, endpoint.clone())?,
        None => GoogleTtsClient::new(google_key)?,
    };
    let generator = match &engines.gemini_endpoint {
        Some(endpoint) => GeminiClient::with_endpoint(gemini_key, model, endpoint.clone())?,
        None => GeminiClient::new(gemini_key, model)?,
    };

    info!("Reply model: {}", generator.model());

    Ok(TurnOrchestrator::new(
        Arc::new(transcriber),
        Arc::new(generator),
        Arc::new(synthesizer),
        cfg.turn_config(),
    ))
}

async fn serve(cfg: Config) -> Result<()> {
    let state = AppState::new(build_orchestrator(&cfg)?)
        .with_upload_format(cfg.upload_format())
        .with_default_language(cfg.default_language()?)
        .with_max_body_bytes(cfg.service.http.max_body_bytes);

    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn talk(
    cfg: Config,
    wav: PathBuf,
    server: Option<String>,
    language: Option<String>,
    scenario: Option<String>,
    out: PathBuf,
) -> Result<()> {
    let transport: Arc<dyn TurnTransport> = match &server {
        Some(url) => {
            info!("Sending turns to {}", url);
            Arc::new(HttpTurnClient::new(url))
        }
        None => Arc::new(build_orchestrator(&cfg)?),
    };

    let backend = FileBackend::open(&wav, cfg.audio_backend_config())?;
    if backend.duration().is_zero() {
        bail!("{} contains no audio", wav.display());
    }
    let session = TutorSession::new(Box::new(backend), cfg.recording_config(), transport);

    let language = match language {
        Some(tag) => LanguageCode::parse(&tag).with_context(|| format!("Invalid language: {}", tag))?,
        None => cfg.default_language()?,
    };
    if !language.is_supported() {
        warn!("{} is not one of the tutor's languages", language);
    }
    session.set_language(language).await;

    if let Some(id) = scenario {
        let mut conversation = session.conversation().await;
        let opening = conversation.select_scenario(&id)?;
        println!("AI: {}", opening.text);
    }

    session.start_recording().await?;
    info!("Listening to {} (stops after silence)", wav.display());

    let Some(outcome) = session.next_turn().await else {
        bail!("Recorder closed before an utterance was captured");
    };
    let turn = outcome?;

    println!("You: {}", turn.transcript);
    println!("AI: {}", turn.reply_text);

    tokio::fs::write(&out, &turn.reply_audio)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!("Reply audio saved to {}", out.display());

    Ok(())
}
