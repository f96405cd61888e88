//! Session phase machine with thread-safe transitions.
//!
//! Enforces valid transitions for the session lifecycle:
//! - Idle -> Listening (engine confirmed capture start)
//! - Listening -> Idle (engine confirmed capture end, or forced teardown)
//!
//! `Unsupported` is terminal: a session whose environment failed the
//! capability probe never leaves it.

use std::fmt;
use std::sync::{Arc, Mutex};

use parlance_core::error::ParlanceError;

/// Lifecycle phase of a transcription session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// The environment cannot run a recognition engine. Terminal.
    Unsupported,
    /// Not listening. Ready for a start request.
    Idle,
    /// The engine confirmed it is capturing.
    Listening,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Unsupported => write!(f, "Unsupported"),
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::Listening => write!(f, "Listening"),
        }
    }
}

impl SessionPhase {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionPhase) -> bool {
        matches!(
            (self, target),
            (SessionPhase::Idle, SessionPhase::Listening)
                | (SessionPhase::Listening, SessionPhase::Idle)
        )
    }
}

/// Thread-safe phase machine for session transitions.
///
/// Wraps `SessionPhase` in an `Arc<Mutex<>>` so the session and its engine
/// callbacks can share it. All transitions are validated before being
/// applied, returning an error if the requested transition is not permitted.
#[derive(Debug, Clone)]
pub struct StateMachine {
    phase: Arc<Mutex<SessionPhase>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new phase machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            phase: Arc::new(Mutex::new(SessionPhase::Idle)),
        }
    }

    /// Create a phase machine pinned to the terminal `Unsupported` phase.
    pub fn unsupported() -> Self {
        Self {
            phase: Arc::new(Mutex::new(SessionPhase::Unsupported)),
        }
    }

    /// Returns the current phase.
    pub fn current(&self) -> SessionPhase {
        *self.phase.lock().expect("phase mutex poisoned")
    }

    /// Attempt to transition to the target phase.
    ///
    /// Returns `Ok(())` if the transition is valid, or a
    /// `ParlanceError::Session` if it is not allowed from the current phase.
    pub fn transition(&self, target: SessionPhase) -> Result<(), ParlanceError> {
        let mut phase = self.phase.lock().expect("phase mutex poisoned");
        if phase.can_transition_to(&target) {
            tracing::debug!("Session phase: {} -> {}", *phase, target);
            *phase = target;
            Ok(())
        } else {
            Err(ParlanceError::Session(format!(
                "Invalid phase transition: {} -> {}",
                *phase, target
            )))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(SessionPhase::Unsupported.to_string(), "Unsupported");
        assert_eq!(SessionPhase::Idle.to_string(), "Idle");
        assert_eq!(SessionPhase::Listening.to_string(), "Listening");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(SessionPhase::Idle.can_transition_to(&SessionPhase::Listening));
        assert!(SessionPhase::Listening.can_transition_to(&SessionPhase::Idle));
    }

    #[test]
    fn test_unsupported_is_terminal() {
        assert!(!SessionPhase::Unsupported.can_transition_to(&SessionPhase::Idle));
        assert!(!SessionPhase::Unsupported.can_transition_to(&SessionPhase::Listening));
    }

    #[test]
    fn test_no_self_transitions() {
        assert!(!SessionPhase::Idle.can_transition_to(&SessionPhase::Idle));
        assert!(!SessionPhase::Listening.can_transition_to(&SessionPhase::Listening));
        assert!(!SessionPhase::Unsupported.can_transition_to(&SessionPhase::Unsupported));
    }

    #[test]
    fn test_cannot_enter_unsupported() {
        assert!(!SessionPhase::Idle.can_transition_to(&SessionPhase::Unsupported));
        assert!(!SessionPhase::Listening.can_transition_to(&SessionPhase::Unsupported));
    }

    #[test]
    fn test_state_machine_round_trip() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), SessionPhase::Idle);

        sm.transition(SessionPhase::Listening).unwrap();
        assert_eq!(sm.current(), SessionPhase::Listening);

        sm.transition(SessionPhase::Idle).unwrap();
        assert_eq!(sm.current(), SessionPhase::Idle);
    }

    #[test]
    fn test_state_machine_invalid_transition() {
        let sm = StateMachine::new();
        let result = sm.transition(SessionPhase::Idle);
        assert!(result.is_err());
        assert_eq!(sm.current(), SessionPhase::Idle);
    }

    #[test]
    fn test_state_machine_unsupported_rejects_everything() {
        let sm = StateMachine::unsupported();
        assert!(sm.transition(SessionPhase::Idle).is_err());
        assert!(sm.transition(SessionPhase::Listening).is_err());
        assert_eq!(sm.current(), SessionPhase::Unsupported);
    }

    #[test]
    fn test_state_machine_clone_is_shared() {
        let sm1 = StateMachine::new();
        let sm2 = sm1.clone();

        sm1.transition(SessionPhase::Listening).unwrap();
        assert_eq!(sm2.current(), SessionPhase::Listening);
    }

    #[test]
    fn test_transition_error_message() {
        let sm = StateMachine::unsupported();
        let result = sm.transition(SessionPhase::Listening);
        match result {
            Err(ParlanceError::Session(msg)) => {
                assert!(msg.contains("Unsupported"));
                assert!(msg.contains("Listening"));
            }
            _ => panic!("Expected Session error variant"),
        }
    }
}
