use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Recognition segments
// =============================================================================

/// A single recognized fragment within a result batch.
///
/// A final segment will not be revised by the engine; a provisional one may
/// still change as the utterance continues.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Recognized text fragment, including any leading whitespace the
    /// engine supplies between fragments.
    pub text: String,
    /// Whether the engine has committed to this fragment.
    pub is_final: bool,
}

impl Segment {
    /// A segment the engine has committed to.
    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    /// A segment the engine may still revise.
    pub fn provisional(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

/// An ordered batch of segments delivered by one engine result callback.
///
/// The two folds are computed independently: final segments are appended to
/// the committed transcript, non-final segments fully replace the previous
/// provisional transcript. A batch may be all-final, all-provisional, mixed,
/// or empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBatch {
    pub segments: Vec<Segment>,
}

impl ResultBatch {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concatenation of the final segments, in arrival order.
    pub fn final_text(&self) -> String {
        self.segments
            .iter()
            .filter(|s| s.is_final)
            .map(|s| s.text.as_str())
            .collect()
    }

    /// Concatenation of the non-final segments, in arrival order.
    pub fn provisional_text(&self) -> String {
        self.segments
            .iter()
            .filter(|s| !s.is_final)
            .map(|s| s.text.as_str())
            .collect()
    }
}

impl FromIterator<Segment> for ResultBatch {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Engine faults
// =============================================================================

/// Raw fault reported by a recognition engine through its fault slot.
///
/// Classification into the caller-visible [`SessionError`] taxonomy happens
/// inside the session's fault handler, not here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineFault {
    /// The engine heard nothing for its internal timeout window. Benign.
    NoSpeech,
    /// Capture device access was refused by the user or platform.
    PermissionDenied,
    /// Any other engine failure, carrying the engine's opaque code.
    Other(String),
}

impl EngineFault {
    /// Stable code string for logging and diagnostics.
    pub fn code(&self) -> &str {
        match self {
            EngineFault::NoSpeech => "no-speech",
            EngineFault::PermissionDenied => "not-allowed",
            EngineFault::Other(code) => code.as_str(),
        }
    }
}

// =============================================================================
// Caller-visible session errors
// =============================================================================

/// The error taxonomy callers observe through a session snapshot.
///
/// These are state, not propagated failures: faults arrive asynchronously,
/// long after the `start()` that triggered them returned.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionError {
    /// The environment cannot run a recognition engine at all. Detected once
    /// at construction; permanent for the session's life.
    #[error("speech recognition is not supported in this environment")]
    Unsupported,
    /// Capture device access was refused. Recoverable: the caller may prompt
    /// the user and retry `start()`.
    #[error("microphone access was denied")]
    PermissionDenied,
    /// Opaque engine failure. Recoverable: the caller may retry `start()`.
    #[error("recognition engine error: {0}")]
    Engine(String),
}

impl SessionError {
    /// Actionable text suitable for direct display to the user.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Unsupported => {
                "Speech recognition is not available here. Try a different environment.".to_string()
            }
            SessionError::PermissionDenied => {
                "Microphone access was denied. Allow microphone use and start again.".to_string()
            }
            SessionError::Engine(code) => {
                format!("Speech recognition failed ({code}). Try starting again.")
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
