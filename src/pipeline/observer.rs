//! Hooks for watching a pipeline run from outside the runner.

use parking_lot::Mutex;

use crate::filter::{FilterMessage, FilterState};

/// Receives stage transitions and filter messages as a run progresses.
///
/// Observers are shared (`Arc`) and may be read from another thread while the
/// run is in progress, so implementations use interior mutability.
pub trait PipelineObserver: Send + Sync {
    fn on_message(&self, stage: usize, message: &FilterMessage);

    fn on_state(&self, _stage: usize, _filter: &str, _state: FilterState) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_message(&self, _stage: usize, _message: &FilterMessage) {}
}

/// Records every message and state transition it sees.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    messages: Mutex<Vec<(usize, FilterMessage)>>,
    states: Mutex<Vec<(usize, FilterState)>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages seen so far, in arrival order.
    pub fn messages(&self) -> Vec<FilterMessage> {
        self.messages.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    /// Messages emitted by stage `stage`.
    pub fn messages_for(&self, stage: usize) -> Vec<FilterMessage> {
        self.messages
            .lock()
            .iter()
            .filter(|(s, _)| *s == stage)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// State transitions seen so far, as `(stage, state)`.
    pub fn states(&self) -> Vec<(usize, FilterState)> {
        self.states.lock().clone()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
        self.states.lock().clear();
    }
}

impl PipelineObserver for CollectingObserver {
    fn on_message(&self, stage: usize, message: &FilterMessage) {
        self.messages.lock().push((stage, message.clone()));
    }

    fn on_state(&self, stage: usize, _filter: &str, state: FilterState) {
        self.states.lock().push((stage, state));
    }
}
