//! Parlance Engine crate - the recognition engine seam.
//!
//! Defines the narrow interface a continuous dictation engine must expose:
//! three fire-and-forget commands plus four single-subscriber callback slots.
//! Engines are obtained through an [`EngineProvider`], which also answers the
//! capability probe, so sessions can be driven by the deterministic
//! [`ScriptedEngine`] in tests and demos.

use parlance_core::config::RecognitionConfig;
use parlance_core::types::{EngineFault, ResultBatch};

pub mod scripted;

pub use scripted::{EngineCommand, ScriptedEngine, ScriptedProvider};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for one recognition engine handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Keep capturing across utterance boundaries instead of stopping after
    /// the first final result.
    pub continuous: bool,
    /// Deliver provisional segments while an utterance is in progress.
    pub interim_results: bool,
    /// BCP 47 locale tag (e.g. "en-US").
    pub locale: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            locale: "en-US".to_string(),
        }
    }
}

impl From<&RecognitionConfig> for EngineConfig {
    fn from(config: &RecognitionConfig) -> Self {
        Self {
            continuous: config.continuous,
            interim_results: config.interim_results,
            locale: config.locale.clone(),
        }
    }
}

// =============================================================================
// Callback slots
// =============================================================================

/// Handler for a batch of recognized segments.
pub type ResultHandler = Box<dyn FnMut(ResultBatch) + Send>;

/// Handler for an engine fault.
pub type FaultHandler = Box<dyn FnMut(EngineFault) + Send>;

/// Handler for a start or end lifecycle confirmation.
pub type LifecycleHandler = Box<dyn FnMut() + Send>;

// =============================================================================
// Traits
// =============================================================================

/// A continuous dictation engine handle.
///
/// Commands are asynchronous requests: their effects are observed only
/// through the callback slots, never through a synchronous return value.
/// Each slot holds a single subscriber; registering a handler replaces any
/// previous one. Callbacks for one handle are delivered strictly in the
/// order the engine emits them.
pub trait RecognitionEngine: Send {
    /// Register the handler for result batches.
    fn on_result(&mut self, handler: ResultHandler);

    /// Register the handler for engine faults.
    fn on_fault(&mut self, handler: FaultHandler);

    /// Register the handler for the capture-started confirmation.
    fn on_start(&mut self, handler: LifecycleHandler);

    /// Register the handler for the capture-ended confirmation.
    fn on_end(&mut self, handler: LifecycleHandler);

    /// Request that the engine begin capturing. Confirmed via the start slot.
    fn start(&mut self);

    /// Request a graceful end: the engine flushes any pending final segment
    /// before confirming via the end slot.
    fn stop(&mut self);

    /// Hard stop with no flush guarantee.
    fn abort(&mut self);

    /// Drop all registered handlers. After this call the handle must not
    /// deliver any further event.
    fn detach(&mut self);
}

/// Supplies recognition engines for the hosting environment.
pub trait EngineProvider {
    /// Whether continuous, interim-result dictation is available at all.
    fn available(&self) -> bool;

    /// Construct a new engine handle with the given configuration.
    fn create(&self, config: &EngineConfig) -> Box<dyn RecognitionEngine>;
}

// =============================================================================
// Tests
// =============================================================================
