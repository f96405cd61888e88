//! Transcription session owning one recognition engine handle.
//!
//! The session is created once per owning context and lives until teardown.
//! Within that lifetime it may be started and stopped arbitrarily many
//! times; the single engine handle is created at construction and only its
//! armed/disarmed state toggles. `start()`/`stop()` are requests whose
//! effects land asynchronously through the engine's own confirmations, and
//! the on-end confirmation is the sole writer that takes the session out of
//! the listening phase.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use parlance_core::events::SessionEvent;
use parlance_core::types::{EngineFault, SessionError};
use parlance_engine::{EngineConfig, EngineProvider, RecognitionEngine};

use crate::state::{SessionPhase, StateMachine};

/// Capacity of the observer event channel. Lagging receivers drop the
/// oldest events; the session itself never blocks on them.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Mutable transcript state shared with the engine callbacks.
#[derive(Debug, Default)]
struct SessionCore {
    final_text: String,
    provisional_text: String,
    last_error: Option<SessionError>,
    torn_down: bool,
}

/// Read-only view of a session, the only thing callers ever see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// All text confirmed as final so far in this session.
    pub final_text: String,
    /// Best current guess for the utterance still being spoken.
    pub provisional_text: String,
    /// True strictly between engine-confirmed start and engine-confirmed end.
    pub is_listening: bool,
    /// Most recent surfaced error, if any.
    pub last_error: Option<SessionError>,
    /// Whether the environment supports recognition at all. Fixed at
    /// construction.
    pub supported: bool,
}

/// One continuous dictation session.
///
/// Owns its engine handle exclusively; callers interact only through the
/// control operations and snapshots. Dropping the session tears it down,
/// so a dangling engine can never deliver events into disposed state.
pub struct TranscriptionSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    supported: bool,
    phase: StateMachine,
    core: Arc<Mutex<SessionCore>>,
    engine: Option<Box<dyn RecognitionEngine>>,
    events: broadcast::Sender<SessionEvent>,
}

impl TranscriptionSession {
    /// Create a session, probing the provider for recognition capability.
    ///
    /// If the probe fails, the session is permanently unsupported: no engine
    /// handle is created, `last_error` is pinned to
    /// [`SessionError::Unsupported`], and `start()`/`stop()` are no-ops.
    /// Otherwise exactly one engine handle is created with the given
    /// configuration and reused for the session's whole life.
    pub fn new(provider: &dyn EngineProvider, config: EngineConfig) -> Self {
        let id = Uuid::new_v4();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        if !provider.available() {
            tracing::warn!(session_id = %id, "Continuous dictation unsupported in this environment");
            return Self {
                id,
                created_at: Utc::now(),
                supported: false,
                phase: StateMachine::unsupported(),
                core: Arc::new(Mutex::new(SessionCore {
                    last_error: Some(SessionError::Unsupported),
                    ..SessionCore::default()
                })),
                engine: None,
                events,
            };
        }

        let mut engine = provider.create(&config);
        let phase = StateMachine::new();
        let core = Arc::new(Mutex::new(SessionCore::default()));

        Self::register_handlers(id, engine.as_mut(), &phase, &core, &events);

        tracing::info!(
            session_id = %id,
            locale = %config.locale,
            continuous = config.continuous,
            interim_results = config.interim_results,
            "Transcription session created"
        );

        Self {
            id,
            created_at: Utc::now(),
            supported: true,
            phase,
            core,
            engine: Some(engine),
            events,
        }
    }

    /// Wire the four engine callback slots to the shared session state.
    fn register_handlers(
        id: Uuid,
        engine: &mut dyn RecognitionEngine,
        phase: &StateMachine,
        core: &Arc<Mutex<SessionCore>>,
        events: &broadcast::Sender<SessionEvent>,
    ) {
        // Result batches: finals append, non-finals replace. Both folds are
        // computed from the batch alone, so provisional text never repeats
        // content committed by the same batch.
        {
            let core = Arc::clone(core);
            let events = events.clone();
            engine.on_result(Box::new(move |batch| {
                let mut state = core.lock().expect("session state poisoned");
                if state.torn_down {
                    return;
                }
                let committed = batch.final_text();
                if !committed.is_empty() {
                    state.final_text.push_str(&committed);
                    let _ = events.send(SessionEvent::TranscriptCommitted {
                        session_id: id,
                        text: committed,
                        timestamp: Utc::now(),
                    });
                }
                state.provisional_text = batch.provisional_text();
                let _ = events.send(SessionEvent::ProvisionalUpdated {
                    session_id: id,
                    text: state.provisional_text.clone(),
                    timestamp: Utc::now(),
                });
                tracing::trace!(
                    session_id = %id,
                    final_len = state.final_text.len(),
                    provisional_len = state.provisional_text.len(),
                    "Result batch folded"
                );
            }));
        }

        // Faults: classified here, surfaced as state. The phase never moves
        // on a fault — engines disagree about auto-ending after errors, so
        // the end confirmation below stays the sole authority.
        {
            let core = Arc::clone(core);
            let events = events.clone();
            engine.on_fault(Box::new(move |fault| {
                let error = match fault {
                    EngineFault::NoSpeech => {
                        tracing::debug!(session_id = %id, "No speech detected — benign, state unchanged");
                        return;
                    }
                    EngineFault::PermissionDenied => SessionError::PermissionDenied,
                    EngineFault::Other(code) => SessionError::Engine(code),
                };
                let mut state = core.lock().expect("session state poisoned");
                if state.torn_down {
                    return;
                }
                tracing::warn!(session_id = %id, error = %error, "Recognition fault");
                state.last_error = Some(error.clone());
                let _ = events.send(SessionEvent::RecognitionFailed {
                    session_id: id,
                    error,
                    timestamp: Utc::now(),
                });
            }));
        }

        // Start confirmation: the only writer that enters Listening.
        {
            let core = Arc::clone(core);
            let events = events.clone();
            let phase = phase.clone();
            engine.on_start(Box::new(move || {
                let mut state = core.lock().expect("session state poisoned");
                if state.torn_down {
                    return;
                }
                if let Err(e) = phase.transition(SessionPhase::Listening) {
                    tracing::warn!(session_id = %id, error = %e, "Ignoring unexpected start confirmation");
                    return;
                }
                state.provisional_text.clear();
                tracing::info!(session_id = %id, "Listening");
                let _ = events.send(SessionEvent::ListeningStarted {
                    session_id: id,
                    timestamp: Utc::now(),
                });
            }));
        }

        // End confirmation: the only writer that leaves Listening, whether
        // the end was caller-requested or engine-initiated (e.g. silence).
        {
            let core = Arc::clone(core);
            let events = events.clone();
            let phase = phase.clone();
            engine.on_end(Box::new(move || {
                let mut state = core.lock().expect("session state poisoned");
                if state.torn_down {
                    return;
                }
                state.provisional_text.clear();
                if let Err(e) = phase.transition(SessionPhase::Idle) {
                    tracing::warn!(session_id = %id, error = %e, "Ignoring unexpected end confirmation");
                    return;
                }
                tracing::info!(
                    session_id = %id,
                    final_len = state.final_text.len(),
                    "Listening ended"
                );
                let _ = events.send(SessionEvent::ListeningEnded {
                    session_id: id,
                    final_len: state.final_text.len(),
                    timestamp: Utc::now(),
                });
            }));
        }
    }

    /// Request that the engine begin capturing.
    ///
    /// Clears the committed transcript and the last error, then arms the
    /// engine. The listening flag only flips when the engine confirms.
    /// A no-op while unsupported or already listening.
    pub fn start(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            tracing::debug!(session_id = %self.id, "start() ignored — recognition unsupported");
            return;
        };
        if self.phase.current() == SessionPhase::Listening {
            tracing::debug!(session_id = %self.id, "start() ignored — already listening");
            return;
        }
        {
            let mut state = self.core.lock().expect("session state poisoned");
            state.final_text.clear();
            state.last_error = None;
        }
        // Lock released before arming: the confirmation may land
        // synchronously on this same call stack.
        tracing::info!(session_id = %self.id, "Start requested");
        engine.start();
    }

    /// Request a graceful end of capture.
    ///
    /// The engine flushes any pending final segment before confirming; the
    /// listening flag only flips on that confirmation. A no-op unless
    /// currently listening.
    pub fn stop(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            tracing::debug!(session_id = %self.id, "stop() ignored — recognition unsupported");
            return;
        };
        if self.phase.current() != SessionPhase::Listening {
            tracing::debug!(session_id = %self.id, "stop() ignored — not listening");
            return;
        }
        tracing::info!(session_id = %self.id, "Stop requested");
        engine.stop();
    }

    /// Tear the session down: detach the engine's handlers, abort capture,
    /// and freeze all observable state.
    ///
    /// Handlers are detached before the abort so the engine cannot deliver
    /// another event into disposed state. Idempotent; also runs on drop, so
    /// every exit path of the owning context reaches it.
    pub fn teardown(&mut self) {
        let already = {
            let state = self.core.lock().expect("session state poisoned");
            state.torn_down
        };
        if already {
            return;
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.detach();
            engine.abort();
        }
        {
            let mut state = self.core.lock().expect("session state poisoned");
            state.torn_down = true;
            state.provisional_text.clear();
        }
        // With the handlers gone the end confirmation can no longer arrive;
        // this is the one place the phase moves without it.
        if self.phase.current() == SessionPhase::Listening {
            if let Err(e) = self.phase.transition(SessionPhase::Idle) {
                tracing::warn!(session_id = %self.id, error = %e, "Teardown phase transition failed");
            }
        }
        tracing::info!(session_id = %self.id, "Session torn down");
    }

    /// Read-only snapshot of the session's observable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.core.lock().expect("session state poisoned");
        SessionSnapshot {
            final_text: state.final_text.clone(),
            provisional_text: state.provisional_text.clone(),
            is_listening: self.phase.current() == SessionPhase::Listening,
            last_error: state.last_error.clone(),
            supported: self.supported,
        }
    }

    /// All text confirmed as final so far in this session.
    pub fn final_text(&self) -> String {
        self.core
            .lock()
            .expect("session state poisoned")
            .final_text
            .clone()
    }

    /// Best current guess for the utterance still being spoken.
    pub fn provisional_text(&self) -> String {
        self.core
            .lock()
            .expect("session state poisoned")
            .provisional_text
            .clone()
    }

    /// True strictly between engine-confirmed start and end.
    pub fn is_listening(&self) -> bool {
        self.phase.current() == SessionPhase::Listening
    }

    /// Most recent surfaced error, if any.
    pub fn last_error(&self) -> Option<SessionError> {
        self.core
            .lock()
            .expect("session state poisoned")
            .last_error
            .clone()
    }

    /// Whether the environment supports recognition at all.
    pub fn supported(&self) -> bool {
        self.supported
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase.current()
    }

    /// Unique identifier of this session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session was constructed.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Subscribe to the session's observer events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

impl Drop for TranscriptionSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for TranscriptionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptionSession")
            .field("id", &self.id)
            .field("supported", &self.supported)
            .field("phase", &self.phase.current())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
