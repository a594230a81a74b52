//! Sequential pipeline runner.
//!
//! A [`Pipeline`] owns an ordered list of filters and runs them one at a time
//! against a shared [`DataContainerArray`]. The first error stops the run;
//! every message raised up to and including that error is kept in the
//! returned [`PipelineReport`]. A failed execution is not rolled back: stages
//! before the failing one have already mutated the store.

pub mod observer;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info};

use crate::data::data_container_array::DataContainerArray;
use crate::filter::{Filter, FilterContext, FilterMessage, FilterState, ParameterValue, Severity};
use crate::pipeline_error::PipelineError;

pub use observer::{CollectingObserver, NoopObserver, PipelineObserver};

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "Pipeline".to_string(),
        }
    }
}

/// One filter and where it is in its lifecycle.
pub struct FilterStage {
    filter: Box<dyn Filter>,
    state: FilterState,
}

impl FilterStage {
    pub fn new(filter: Box<dyn Filter>) -> Self {
        Self {
            filter,
            state: FilterState::Constructed,
        }
    }

    pub fn filter(&self) -> &dyn Filter {
        self.filter.as_ref()
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Set a parameter of the wrapped filter.
    pub fn set_parameter(&mut self, key: &str, value: ParameterValue) -> Result<(), PipelineError> {
        self.filter.set_parameter(key, value)?;
        self.state = FilterState::ParametersConfigured;
        Ok(())
    }
}

impl std::fmt::Debug for FilterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStage")
            .field("filter", &self.filter.human_label())
            .field("state", &self.state)
            .finish()
    }
}

/// The stage that stopped a run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineFailure {
    pub stage: usize,
    pub filter: String,
    pub error: PipelineError,
}

impl PipelineFailure {
    pub fn code(&self) -> i32 {
        self.error.code()
    }
}

/// Outcome of a preflight or execute run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineReport {
    /// Every message raised during the run, in order.
    pub messages: Vec<FilterMessage>,
    pub failure: Option<PipelineFailure>,
    /// Number of stages that finished successfully.
    pub completed: usize,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// 0 on success, otherwise the failing stage's negative code.
    pub fn error_code(&self) -> i32 {
        self.failure.as_ref().map_or(0, PipelineFailure::code)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &FilterMessage> + '_ {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Warning)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Preflight,
    Execute,
}

/// Ordered filters sharing one interrupt flag.
pub struct Pipeline {
    config: PipelineConfig,
    stages: Vec<FilterStage>,
    interrupt: Arc<AtomicBool>,
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            stages: Vec::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
            observers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Append a filter (builder style).
    pub fn push<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.push_boxed(Box::new(filter));
        self
    }

    pub fn push_boxed(&mut self, filter: Box<dyn Filter>) {
        self.stages.push(FilterStage::new(filter));
    }

    pub fn add_observer(&mut self, observer: Arc<dyn PipelineObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn stage_mut(&mut self, index: usize) -> Option<&mut FilterStage> {
        self.stages.get_mut(index)
    }

    /// Handle to the interrupt flag; raising it cancels the current run at
    /// the next poll point.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub fn cancel(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    /// Lower the interrupt flag so the pipeline can run again.
    pub fn reset_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }

    /// Validate every filter in order, stopping at the first failure.
    ///
    /// Placeholder outputs declared by earlier filters stay in `dca`, so
    /// later filters can validate against them.
    pub fn preflight(&mut self, dca: &mut DataContainerArray) -> PipelineReport {
        self.run(dca, Phase::Preflight)
    }

    /// Execute every filter in order, stopping at the first failure.
    pub fn execute(&mut self, dca: &mut DataContainerArray) -> PipelineReport {
        self.run(dca, Phase::Execute)
    }

    fn set_state(&mut self, index: usize, state: FilterState) {
        let stage = &mut self.stages[index];
        stage.state = state;
        let label = stage.filter.human_label();
        for observer in &self.observers {
            observer.on_state(index, label, state);
        }
    }

    fn run(&mut self, dca: &mut DataContainerArray, phase: Phase) -> PipelineReport {
        info!(
            "{}: {:?} of {} filters",
            self.config.name,
            phase,
            self.stages.len()
        );
        let mut report = PipelineReport::default();
        for index in 0..self.stages.len() {
            let label = self.stages[index].filter.human_label();
            let mut ctx = FilterContext::with_interrupt(label, self.interrupt_flag());

            let started = !ctx.is_canceled();
            let result = if !started {
                ctx.error(&PipelineError::Canceled);
                Err(PipelineError::Canceled)
            } else {
                match phase {
                    Phase::Preflight => {
                        self.set_state(index, FilterState::Validating);
                        self.stages[index].filter.preflight(dca, &mut ctx)
                    }
                    Phase::Execute => {
                        self.set_state(index, FilterState::Executing);
                        self.stages[index].filter.execute(dca, &mut ctx)
                    }
                }
            };

            for message in ctx.take_messages() {
                for observer in &self.observers {
                    observer.on_message(index, &message);
                }
                report.messages.push(message);
            }

            match result {
                Ok(()) => {
                    let done = match phase {
                        Phase::Preflight => FilterState::ValidationPassed,
                        Phase::Execute => FilterState::Completed,
                    };
                    self.set_state(index, done);
                    report.completed += 1;
                }
                Err(err) => {
                    // a failed re-check during execute is still a validation failure
                    let failed = match phase {
                        Phase::Preflight => FilterState::ValidationFailed,
                        Phase::Execute if started && !ctx.passed_validation() => {
                            FilterState::ValidationFailed
                        }
                        Phase::Execute => FilterState::ExecutionFailed,
                    };
                    self.set_state(index, failed);
                    error!(
                        "{}: stage {} ({}) failed with {}: {}",
                        self.config.name,
                        index,
                        label,
                        err.code(),
                        err
                    );
                    report.failure = Some(PipelineFailure {
                        stage: index,
                        filter: label.to_string(),
                        error: err,
                    });
                    return report;
                }
            }
        }
        info!(
            "{}: {:?} finished, {} filters",
            self.config.name, phase, report.completed
        );
        report
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("stages", &self.stages)
            .field("observers", &self.observers.len())
            .finish()
    }
}
