use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::SessionError;

/// Observer events emitted by a transcription session.
///
/// Events are published on a broadcast channel after state changes and
/// consumed by whatever displays or records the transcript. They are purely
/// an observer surface: no session behavior depends on anyone listening.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SessionEvent {
    /// The engine confirmed it is capturing.
    ListeningStarted {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// The engine confirmed the capture ended, however it was triggered.
    ListeningEnded {
        session_id: Uuid,
        /// Length of the committed transcript at the end transition.
        final_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// Final text was appended to the committed transcript.
    TranscriptCommitted {
        session_id: Uuid,
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// The in-progress transcript was replaced.
    ProvisionalUpdated {
        session_id: Uuid,
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// A surfaced recognition error was recorded.
    RecognitionFailed {
        session_id: Uuid,
        error: SessionError,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            SessionEvent::ListeningStarted { timestamp, .. }
            | SessionEvent::ListeningEnded { timestamp, .. }
            | SessionEvent::TranscriptCommitted { timestamp, .. }
            | SessionEvent::ProvisionalUpdated { timestamp, .. }
            | SessionEvent::RecognitionFailed { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a human-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionEvent::ListeningStarted { .. } => "listening_started",
            SessionEvent::ListeningEnded { .. } => "listening_ended",
            SessionEvent::TranscriptCommitted { .. } => "transcript_committed",
            SessionEvent::ProvisionalUpdated { .. } => "provisional_updated",
            SessionEvent::RecognitionFailed { .. } => "recognition_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_timestamp() {
        let ts = Utc::now();
        let event = SessionEvent::ListeningStarted {
            session_id: Uuid::new_v4(),
            timestamp: ts,
        };
        assert_eq!(event.timestamp(), ts);
    }

    #[test]
    fn test_event_names() {
        let ts = Utc::now();
        let id = Uuid::new_v4();

        let events: Vec<(SessionEvent, &str)> = vec![
            (
                SessionEvent::ListeningStarted {
                    session_id: id,
                    timestamp: ts,
                },
                "listening_started",
            ),
            (
                SessionEvent::ListeningEnded {
                    session_id: id,
                    final_len: 12,
                    timestamp: ts,
                },
                "listening_ended",
            ),
            (
                SessionEvent::TranscriptCommitted {
                    session_id: id,
                    text: "hello".to_string(),
                    timestamp: ts,
                },
                "transcript_committed",
            ),
            (
                SessionEvent::ProvisionalUpdated {
                    session_id: id,
                    text: "hel".to_string(),
                    timestamp: ts,
                },
                "provisional_updated",
            ),
            (
                SessionEvent::RecognitionFailed {
                    session_id: id,
                    error: crate::types::SessionError::PermissionDenied,
                    timestamp: ts,
                },
                "recognition_failed",
            ),
        ];

        for (event, name) in events {
            assert_eq!(event.event_name(), name);
        }
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = SessionEvent::TranscriptCommitted {
            session_id: Uuid::new_v4(),
            text: "hello world".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_name(), "transcript_committed");
        assert_eq!(back.timestamp(), event.timestamp());
    }
}
