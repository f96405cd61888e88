//! Deterministic scripted engine for tests and demos.
//!
//! `ScriptedEngine` implements [`RecognitionEngine`](crate::RecognitionEngine)
//! without any real audio capture: a driver replays start/end confirmations,
//! result batches, and faults through the `emit_*` methods, in whatever order
//! a test scenario calls for. Every command the session issues is recorded so
//! tests can assert on the request sequence.

use std::sync::{Arc, Mutex};

use parlance_core::types::{EngineFault, ResultBatch};

use crate::{
    EngineConfig, EngineProvider, FaultHandler, LifecycleHandler, RecognitionEngine, ResultHandler,
};

/// A command issued to the engine by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    Stop,
    Abort,
}

#[derive(Default)]
struct ScriptedInner {
    on_result: Option<ResultHandler>,
    on_fault: Option<FaultHandler>,
    on_start: Option<LifecycleHandler>,
    on_end: Option<LifecycleHandler>,
    commands: Vec<EngineCommand>,
    /// Confirm start/stop/abort synchronously instead of waiting for the
    /// driver to emit the confirmation.
    auto_confirm: bool,
    /// Capturing, as the engine itself sees it.
    armed: bool,
    detached: bool,
}

/// Scripted recognition engine.
///
/// Cloning yields another handle to the same engine, so a test can hand one
/// clone to the session and keep another to drive events. All emits are
/// dropped once the owner has detached.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    inner: Arc<Mutex<ScriptedInner>>,
}

impl ScriptedEngine {
    /// Engine that waits for the driver to emit every confirmation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that confirms `start()`/`stop()`/`abort()` synchronously.
    pub fn auto_confirming() -> Self {
        let engine = Self::default();
        engine
            .inner
            .lock()
            .expect("engine state poisoned")
            .auto_confirm = true;
        engine
    }

    /// Commands received so far, in call order.
    pub fn commands(&self) -> Vec<EngineCommand> {
        self.inner
            .lock()
            .expect("engine state poisoned")
            .commands
            .clone()
    }

    /// Whether the engine currently considers itself capturing.
    pub fn is_armed(&self) -> bool {
        self.inner.lock().expect("engine state poisoned").armed
    }

    /// Deliver the capture-started confirmation.
    ///
    /// The handler is taken out of its slot and called with the lock
    /// released, then restored unless it was re-registered or detached in
    /// the meantime. The same discipline applies to every emit below.
    pub fn emit_start(&self) {
        let handler = {
            let mut inner = self.inner.lock().expect("engine state poisoned");
            if inner.detached {
                tracing::debug!("Scripted engine detached — dropping start confirmation");
                return;
            }
            inner.armed = true;
            inner.on_start.take()
        };
        if let Some(mut h) = handler {
            h();
            let mut inner = self.inner.lock().expect("engine state poisoned");
            if inner.on_start.is_none() && !inner.detached {
                inner.on_start = Some(h);
            }
        }
    }

    /// Deliver the capture-ended confirmation.
    pub fn emit_end(&self) {
        let handler = {
            let mut inner = self.inner.lock().expect("engine state poisoned");
            if inner.detached {
                tracing::debug!("Scripted engine detached — dropping end confirmation");
                return;
            }
            inner.armed = false;
            inner.on_end.take()
        };
        if let Some(mut h) = handler {
            h();
            let mut inner = self.inner.lock().expect("engine state poisoned");
            if inner.on_end.is_none() && !inner.detached {
                inner.on_end = Some(h);
            }
        }
    }

    /// Deliver a batch of recognized segments.
    pub fn emit_results(&self, batch: ResultBatch) {
        let handler = {
            let mut inner = self.inner.lock().expect("engine state poisoned");
            if inner.detached {
                tracing::debug!("Scripted engine detached — dropping result batch");
                return;
            }
            inner.on_result.take()
        };
        if let Some(mut h) = handler {
            h(batch);
            let mut inner = self.inner.lock().expect("engine state poisoned");
            if inner.on_result.is_none() && !inner.detached {
                inner.on_result = Some(h);
            }
        }
    }

    /// Deliver an engine fault.
    pub fn emit_fault(&self, fault: EngineFault) {
        let handler = {
            let mut inner = self.inner.lock().expect("engine state poisoned");
            if inner.detached {
                tracing::debug!("Scripted engine detached — dropping fault");
                return;
            }
            inner.on_fault.take()
        };
        if let Some(mut h) = handler {
            h(fault);
            let mut inner = self.inner.lock().expect("engine state poisoned");
            if inner.on_fault.is_none() && !inner.detached {
                inner.on_fault = Some(h);
            }
        }
    }
}

impl RecognitionEngine for ScriptedEngine {
    fn on_result(&mut self, handler: ResultHandler) {
        self.inner.lock().expect("engine state poisoned").on_result = Some(handler);
    }

    fn on_fault(&mut self, handler: FaultHandler) {
        self.inner.lock().expect("engine state poisoned").on_fault = Some(handler);
    }

    fn on_start(&mut self, handler: LifecycleHandler) {
        self.inner.lock().expect("engine state poisoned").on_start = Some(handler);
    }

    fn on_end(&mut self, handler: LifecycleHandler) {
        self.inner.lock().expect("engine state poisoned").on_end = Some(handler);
    }

    fn start(&mut self) {
        let auto = {
            let mut inner = self.inner.lock().expect("engine state poisoned");
            inner.commands.push(EngineCommand::Start);
            inner.auto_confirm
        };
        if auto {
            self.emit_start();
        }
    }

    fn stop(&mut self) {
        let auto = {
            let mut inner = self.inner.lock().expect("engine state poisoned");
            inner.commands.push(EngineCommand::Stop);
            inner.auto_confirm
        };
        if auto {
            self.emit_end();
        }
    }

    fn abort(&mut self) {
        let auto = {
            let mut inner = self.inner.lock().expect("engine state poisoned");
            inner.commands.push(EngineCommand::Abort);
            inner.armed = false;
            inner.auto_confirm
        };
        // No flush: abort never delivers pending results, only the end
        // confirmation when one can still be delivered.
        if auto {
            self.emit_end();
        }
    }

    fn detach(&mut self) {
        let mut inner = self.inner.lock().expect("engine state poisoned");
        inner.detached = true;
        inner.on_result = None;
        inner.on_fault = None;
        inner.on_start = None;
        inner.on_end = None;
    }
}

/// Engine provider backed by a prebuilt [`ScriptedEngine`].
///
/// Records every configuration passed to `create` so tests can assert both
/// the engine contract (continuous, interim results, locale) and that a
/// session constructs exactly one handle.
pub struct ScriptedProvider {
    engine: ScriptedEngine,
    available: bool,
    created: Mutex<Vec<EngineConfig>>,
}

impl ScriptedProvider {
    pub fn new(engine: ScriptedEngine) -> Self {
        Self {
            engine,
            available: true,
            created: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose capability probe answers false.
    pub fn unavailable() -> Self {
        Self {
            engine: ScriptedEngine::new(),
            available: false,
            created: Mutex::new(Vec::new()),
        }
    }

    /// Number of engine handles handed out.
    pub fn engines_created(&self) -> usize {
        self.created.lock().expect("provider state poisoned").len()
    }

    /// Configurations passed to `create`, in call order.
    pub fn created_configs(&self) -> Vec<EngineConfig> {
        self.created
            .lock()
            .expect("provider state poisoned")
            .clone()
    }
}

impl EngineProvider for ScriptedProvider {
    fn available(&self) -> bool {
        self.available
    }

    fn create(&self, config: &EngineConfig) -> Box<dyn RecognitionEngine> {
        self.created
            .lock()
            .expect("provider state poisoned")
            .push(config.clone());
        tracing::debug!(locale = %config.locale, "Scripted engine handle created");
        Box::new(self.engine.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parlance_core::types::Segment;

    use super::*;

    #[test]
    fn test_commands_are_recorded_in_order() {
        let mut engine = ScriptedEngine::new();
        engine.start();
        engine.stop();
        engine.abort();
        assert_eq!(
            engine.commands(),
            vec![
                EngineCommand::Start,
                EngineCommand::Stop,
                EngineCommand::Abort
            ]
        );
    }

    #[test]
    fn test_manual_engine_does_not_self_confirm() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);

        let mut engine = ScriptedEngine::new();
        engine.on_start(Box::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));

        engine.start();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!engine.is_armed());

        engine.emit_start();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(engine.is_armed());
    }

    #[test]
    fn test_auto_confirming_engine() {
        let starts = Arc::new(AtomicUsize::new(0));
        let ends = Arc::new(AtomicUsize::new(0));
        let starts_clone = Arc::clone(&starts);
        let ends_clone = Arc::clone(&ends);

        let mut engine = ScriptedEngine::auto_confirming();
        engine.on_start(Box::new(move || {
            starts_clone.fetch_add(1, Ordering::SeqCst);
        }));
        engine.on_end(Box::new(move || {
            ends_clone.fetch_add(1, Ordering::SeqCst);
        }));

        engine.start();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(engine.is_armed());

        engine.stop();
        assert_eq!(ends.load(Ordering::SeqCst), 1);
        assert!(!engine.is_armed());
    }

    #[test]
    fn test_result_batches_reach_the_handler() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = Arc::clone(&received);

        let mut engine = ScriptedEngine::new();
        engine.on_result(Box::new(move |batch| {
            received_clone.lock().unwrap().push(batch);
        }));

        engine.emit_results(ResultBatch::new(vec![Segment::provisional("hel")]));
        engine.emit_results(ResultBatch::new(vec![Segment::finalized("hello")]));

        let batches = received.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].provisional_text(), "hel");
        assert_eq!(batches[1].final_text(), "hello");
    }

    #[test]
    fn test_registering_replaces_previous_handler() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let first_clone = Arc::clone(&first);
        let second_clone = Arc::clone(&second);

        let mut engine = ScriptedEngine::new();
        engine.on_fault(Box::new(move |_| {
            first_clone.fetch_add(1, Ordering::SeqCst);
        }));
        engine.on_fault(Box::new(move |_| {
            second_clone.fetch_add(1, Ordering::SeqCst);
        }));

        engine.emit_fault(EngineFault::NoSpeech);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detached_engine_drops_all_events() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);

        let mut engine = ScriptedEngine::new();
        engine.on_result(Box::new({
            let fired = Arc::clone(&fired_clone);
            move |_| {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        }));
        engine.on_end(Box::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));

        engine.detach();
        engine.emit_results(ResultBatch::new(vec![Segment::finalized("late")]));
        engine.emit_end();
        engine.emit_start();
        engine.emit_fault(EngineFault::PermissionDenied);

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_abort_disarms_without_flush() {
        let results = Arc::new(AtomicUsize::new(0));
        let results_clone = Arc::clone(&results);

        let mut engine = ScriptedEngine::new();
        engine.on_result(Box::new(move |_| {
            results_clone.fetch_add(1, Ordering::SeqCst);
        }));

        engine.emit_start();
        assert!(engine.is_armed());
        engine.abort();
        assert!(!engine.is_armed());
        assert_eq!(results.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let mut engine = ScriptedEngine::new();
        let driver = engine.clone();
        engine.start();
        assert_eq!(driver.commands(), vec![EngineCommand::Start]);
    }

    #[test]
    fn test_provider_records_configs() {
        let provider = ScriptedProvider::new(ScriptedEngine::new());
        assert!(provider.available());
        assert_eq!(provider.engines_created(), 0);

        let config = EngineConfig {
            continuous: true,
            interim_results: true,
            locale: "en-GB".to_string(),
        };
        let _handle = provider.create(&config);

        assert_eq!(provider.engines_created(), 1);
        assert_eq!(provider.created_configs(), vec![config]);
    }

    #[test]
    fn test_unavailable_provider() {
        let provider = ScriptedProvider::unavailable();
        assert!(!provider.available());
    }
}
