//! `vocal-assistant` binary.
//!
//! # Startup sequence (`run`)
//!
//! 1. Load [`AppConfig`] (file, then environment overrides).
//! 2. Initialise logging.
//! 3. Build the chat model, optional web search, speaker, cues and LEDs.
//! 4. Load the Whisper model and open the microphone.
//! 5. Run the session loop until Ctrl-C, then switch the LEDs off.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use vocal_assistant::{
    audio::{open_default_input, StreamHandle},
    config::AppConfig,
    conversation::ConversationHistory,
    cues::cue_player,
    indicator::Indicators,
    llm::{ChatModel, OpenAiChatModel},
    logging,
    query::{QueryProcessor, QuerySettings},
    search::{Locale, SearchAugmenter, SerpApiProvider},
    session::SessionStateMachine,
    speech::{Speaker, TtsSpeaker},
    stt::{ListenParams, MicrophoneTranscriber, TranscribeError, Transcriber, WhisperEngine},
};

/// Hands-free voice assistant: wake phrase, spoken questions, spoken answers.
#[derive(Parser)]
#[command(name = "vocal-assistant", version, about)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for the wake phrase and answer spoken queries (default)
    Run,
    /// Chat with the assistant by typing; `exit` quits
    Chat,
    /// Speak a text
    Say {
        text: String,
        /// Also save the audio (never overwrites; adds _1, _2, …)
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Print everything the microphone hears
    Transcribe,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let rejected = config.apply_env();
    logging::init(&config.logging)?;
    for entry in rejected {
        log::warn!("ignoring {entry}: not a valid value");
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Chat => chat(config).await,
        Command::Say { text, save } => {
            TtsSpeaker::from_config(&config.speech)
                .speak(&text, save.as_deref())
                .await?;
            Ok(())
        }
        Command::Transcribe => transcribe(config).await,
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn run(config: AppConfig) -> Result<()> {
    let indicators = Indicators::from_config(&config.indicator);
    indicators.all_off();
    log::debug!(
        "indicator pins: listening {}, speaking {}",
        config.indicator.listening_pin,
        config.indicator.speaking_pin
    );

    let (_stream, mic) = open_microphone(&config)?;

    let mut machine = SessionStateMachine::new(
        build_processor(&config),
        Arc::new(TtsSpeaker::from_config(&config.speech)),
        indicators,
        cue_player(&config.cues, &config.speech.player),
        config.session.clone(),
    );

    log::info!(
        "say {:?} to start, {:?} to stop",
        config.session.wake_phrase,
        config.session.sleep_phrase
    );
    machine
        .run(&mic, &ListenParams::from(&config.listen), ctrl_c())
        .await;

    log::info!("assistant stopped");
    Ok(())
}

async fn chat(config: AppConfig) -> Result<()> {
    let processor = build_processor(&config);
    let settings = QuerySettings::from(&config.session);
    let mut history = ConversationHistory::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Chatting with {}. Type `exit` to quit.", settings.assistant_name);

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match processor.process(query, &history, &settings).await {
            Ok(extended) => {
                history = extended;
                println!("{}", history.last_reply().unwrap_or_default());
            }
            Err(e) => eprintln!("{e}"),
        }
    }
    Ok(())
}

async fn transcribe(config: AppConfig) -> Result<()> {
    let (_stream, mic) = open_microphone(&config)?;
    let params = ListenParams::from(&config.listen);

    let stop = ctrl_c();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            heard = mic.listen(&params) => match heard {
                Ok(text) => println!("{text}"),
                Err(TranscribeError::TimedOut) => {}
                Err(e @ TranscribeError::Unintelligible) => log::info!("{e}"),
                Err(e) => log::error!("{e}"),
            },
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

fn build_processor(config: &AppConfig) -> QueryProcessor {
    let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::from_config(&config.llm));

    let provider = if config.search.enabled {
        SerpApiProvider::from_config(&config.search)
    } else {
        None
    };
    if provider.is_none() && config.session.allow_web_search {
        log::warn!("web search allowed but no search API key configured; answering without it");
    }

    let augmenter = provider.map(|p| {
        SearchAugmenter::new(
            Arc::new(p),
            Locale {
                language: config.search.language.clone(),
                country: config.search.country.clone(),
            },
        )
    });

    QueryProcessor::new(model, augmenter)
}

/// Load Whisper and open the default microphone.  The returned handle keeps
/// the capture stream alive.
fn open_microphone(config: &AppConfig) -> Result<(StreamHandle, MicrophoneTranscriber)> {
    let engine = WhisperEngine::load(&config.listen.model_path).with_context(|| {
        format!(
            "loading Whisper model {} (set WHISPER_MODEL or listen.model_path)",
            config.listen.model_path.display()
        )
    })?;
    let (stream, source) = open_default_input().context("opening the microphone")?;

    Ok((
        stream,
        MicrophoneTranscriber::new(source, Arc::new(engine), &config.listen),
    ))
}

/// Resolves on Ctrl-C.  If the signal cannot be watched it never resolves.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
