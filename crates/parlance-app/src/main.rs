//! Parlance application binary - composition root.
//!
//! Ties the Parlance crates into a single executable:
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build a scripted recognition engine and a transcription session
//! 4. Replay a canned dictation end to end, printing the transcript live
//!
//! The scripted engine stands in for a platform dictation service, so the
//! demo exercises the full session lifecycle deterministically: start
//! request, engine confirmation, interim refinement, committed text, a
//! benign silence fault, and a graceful stop.

use clap::Parser;

use parlance_core::events::SessionEvent;
use parlance_core::types::{EngineFault, ResultBatch, Segment};
use parlance_core::ParlanceConfig;
use parlance_engine::{EngineConfig, ScriptedEngine, ScriptedProvider};
use parlance_session::TranscriptionSession;

mod cli;

use cli::CliArgs;

/// Pacing between replayed result batches.
const BATCH_INTERVAL_MS: u64 = 150;

/// One canned utterance, delivered the way a live engine refines it.
fn dictation_script(interim_results: bool) -> Vec<ResultBatch> {
    if !interim_results {
        return vec![
            ResultBatch::new(vec![Segment::finalized("the quick brown fox ")]),
            ResultBatch::new(vec![Segment::finalized("jumps over the lazy dog.")]),
        ];
    }
    vec![
        ResultBatch::new(vec![Segment::provisional("the")]),
        ResultBatch::new(vec![Segment::provisional("the quick brow")]),
        ResultBatch::new(vec![Segment::provisional("the quick brown fox")]),
        ResultBatch::new(vec![
            Segment::finalized("the quick brown fox "),
            Segment::provisional("jum"),
        ]),
        ResultBatch::new(vec![Segment::provisional("jumps over the la")]),
        ResultBatch::new(vec![Segment::finalized("jumps over the lazy dog.")]),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first: the log level may come from it.
    let config_path = args.resolve_config_path();
    let config = ParlanceConfig::load_or_default(&config_path);
    let log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Parlance v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_path.display(), "Configuration loaded");

    // Engine configuration from config + CLI overrides.
    let mut recognition = config.recognition.clone();
    recognition.locale = args.resolve_locale(&recognition.locale);
    if args.no_interim {
        recognition.interim_results = false;
    }
    let engine_config = EngineConfig::from(&recognition);

    // Session over a scripted engine.
    let engine = ScriptedEngine::new();
    let provider = ScriptedProvider::new(engine.clone());
    let mut session = TranscriptionSession::new(&provider, engine_config);

    if !session.supported() {
        if let Some(error) = session.last_error() {
            eprintln!("{}", error.user_message());
        }
        return Ok(());
    }

    // Print the transcript as it lands.
    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::ListeningStarted { .. } => println!("listening..."),
                SessionEvent::ProvisionalUpdated { text, .. } if !text.is_empty() => {
                    println!("  ~ {text}");
                }
                SessionEvent::TranscriptCommitted { text, .. } => println!("  + {text}"),
                SessionEvent::RecognitionFailed { error, .. } => {
                    eprintln!("  ! {}", error.user_message());
                }
                SessionEvent::ListeningEnded { final_len, .. } => {
                    println!("stopped ({final_len} chars committed)");
                }
                _ => {}
            }
        }
    });

    // Replay: start, confirm, refine, a benign silence fault, graceful stop.
    session.start();
    engine.emit_start();

    for batch in dictation_script(recognition.interim_results) {
        tokio::time::sleep(tokio::time::Duration::from_millis(BATCH_INTERVAL_MS)).await;
        engine.emit_results(batch);
    }

    engine.emit_fault(EngineFault::NoSpeech);
    session.stop();
    engine.emit_end();

    // Let the printer drain before the summary line.
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    let snapshot = session.snapshot();
    println!();
    println!("transcript: {}", snapshot.final_text);

    // Dropping the session tears it down and closes the event channel.
    drop(session);
    printer.await?;

    Ok(())
}
