//! Parlance Session crate - the transcription session state machine.
//!
//! Wraps one continuous recognition engine handle and folds its event stream
//! into two externally observable transcripts (committed and in-progress)
//! plus a listening flag and a last-error slot. Callers drive the session
//! through `start()`/`stop()` and observe it through snapshots; the engine's
//! own confirmations are the sole authority for the listening transition.

pub mod session;
pub mod state;

pub use session::{SessionSnapshot, TranscriptionSession};
pub use state::SessionPhase;
