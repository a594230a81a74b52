//! The two-phase filter contract.
//!
//! A filter resolves and validates its dependencies in [`Filter::data_check`]
//! and performs its computation in [`Filter::execute_unchecked`]. The provided
//! [`Filter::preflight`] and [`Filter::execute`] methods wire the two together:
//! `execute` always re-runs the data check against the current store, because
//! an upstream filter may have changed its shape since the last preflight, and
//! stops before touching any data if the check fails.
//!
//! A data check may only create placeholder outputs (zero-filled arrays sized
//! to their matrix, see [`create_output_array`]) and must do so only after
//! every input and parameter check has passed.
//!
//! [`create_output_array`]: crate::data::DataContainerArray::create_output_array

pub mod message;
pub mod parameter;
pub mod requirement;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::data::data_container_array::DataContainerArray;
use crate::pipeline_error::PipelineError;

pub use message::{FilterMessage, Severity};
pub use parameter::{FilterParameter, ParameterConstraint, ParameterKind, ParameterValue};
pub use requirement::DataArrayRequirement;

/// Lifecycle of one filter inside a pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum FilterState {
    Constructed,
    ParametersConfigured,
    Validating,
    ValidationFailed,
    ValidationPassed,
    Executing,
    Completed,
    ExecutionFailed,
}

/// Per-invocation status channel handed to a filter.
///
/// Collects `(severity, code, message)` events, tracks the current error code
/// and exposes the pipeline's interrupt flag.
#[derive(Debug)]
pub struct FilterContext {
    label: String,
    messages: Vec<FilterMessage>,
    error_code: i32,
    in_preflight: bool,
    validated: bool,
    interrupt: Arc<AtomicBool>,
}

impl FilterContext {
    pub fn new(label: &str) -> Self {
        Self::with_interrupt(label, Arc::new(AtomicBool::new(false)))
    }

    pub fn with_interrupt(label: &str, interrupt: Arc<AtomicBool>) -> Self {
        Self {
            label: label.to_string(),
            messages: Vec::new(),
            error_code: 0,
            in_preflight: false,
            validated: false,
            interrupt,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current error code; negative after a failure.
    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    /// True while running a preflight (validation only).
    pub fn in_preflight(&self) -> bool {
        self.in_preflight
    }

    /// True once the data check of the current invocation has passed.
    pub fn passed_validation(&self) -> bool {
        self.validated
    }

    pub fn messages(&self) -> &[FilterMessage] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<FilterMessage> {
        std::mem::take(&mut self.messages)
    }

    fn push(&mut self, severity: Severity, code: i32, message: String) {
        self.messages.push(FilterMessage {
            filter: self.label.clone(),
            severity,
            code,
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, 0, message.into());
    }

    /// Non-fatal event; never stops a pipeline regardless of `code`.
    pub fn warning(&mut self, code: i32, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}: {}", self.label, message);
        self.push(Severity::Warning, code, message);
    }

    /// Record `err` as the current error condition.
    pub fn error(&mut self, err: &PipelineError) {
        self.error_code = err.code();
        log::error!("{}: {} ({})", self.label, err, self.error_code);
        self.push(Severity::Error, self.error_code, err.to_string());
    }

    /// True once the pipeline's interrupt flag has been raised.
    pub fn is_canceled(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// `Err(Canceled)` once the interrupt flag has been raised.
    pub fn check_canceled(&self) -> Result<(), PipelineError> {
        if self.is_canceled() {
            return Err(PipelineError::Canceled);
        }
        Ok(())
    }

    /// Shared handle to the interrupt flag, for algorithms that poll it directly.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    fn begin(&mut self, in_preflight: bool) {
        self.error_code = 0;
        self.in_preflight = in_preflight;
        self.validated = false;
    }

    fn finish(&mut self, result: Result<(), PipelineError>) -> Result<(), PipelineError> {
        if let Err(err) = &result {
            self.error(err);
        }
        self.in_preflight = false;
        result
    }
}

/// A unit of computation over a [`DataContainerArray`].
pub trait Filter: Send {
    /// Human-readable name, also used as the message source.
    fn human_label(&self) -> &'static str;

    fn group_name(&self) -> &'static str {
        "Core"
    }

    /// Parameter descriptors in display order.
    fn parameters(&self) -> Vec<FilterParameter>;

    /// Current value of the parameter `key`.
    ///
    /// # Errors
    /// `InvalidKey` for an unknown key.
    fn get_parameter(&self, key: &str) -> Result<ParameterValue, PipelineError>;

    /// Set parameter `key`.
    ///
    /// # Errors
    /// `InvalidKey` for an unknown key, `InvalidValue` for a value of the wrong kind.
    fn set_parameter(&mut self, key: &str, value: ParameterValue) -> Result<(), PipelineError>;

    /// Input requirements, derived from the `ArrayPath` parameters.
    fn requirements(&self) -> Vec<DataArrayRequirement> {
        self.parameters()
            .into_iter()
            .filter_map(|p| match p.kind {
                ParameterKind::ArrayPath(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    /// Check every numeric parameter against its declared constraint.
    ///
    /// # Errors
    /// `ParameterOutOfRange` for the first value outside its bounds.
    fn check_constraints(&self) -> Result<(), PipelineError> {
        for param in self.parameters() {
            let Some(constraint) = param.constraint else {
                continue;
            };
            let value = self
                .get_parameter(&param.property_key)?
                .into_f64(&param.property_key)?;
            constraint.check(&param.property_key, value)?;
        }
        Ok(())
    }

    /// Validate parameters, resolve inputs, then declare outputs.
    fn data_check(
        &mut self,
        dca: &mut DataContainerArray,
        ctx: &mut FilterContext,
    ) -> Result<(), PipelineError>;

    /// The computation proper; only called after a passing data check.
    fn execute_unchecked(
        &mut self,
        dca: &mut DataContainerArray,
        ctx: &mut FilterContext,
    ) -> Result<(), PipelineError>;

    /// A fresh instance, optionally carrying over this one's parameters.
    fn new_instance(&self, copy_parameters: bool) -> Box<dyn Filter>;

    /// Validation only.
    fn preflight(
        &mut self,
        dca: &mut DataContainerArray,
        ctx: &mut FilterContext,
    ) -> Result<(), PipelineError> {
        debug!("preflight {}", self.human_label());
        ctx.begin(true);
        let result = self.data_check(dca, ctx);
        ctx.validated = result.is_ok();
        ctx.finish(result)
    }

    /// Re-validate against the current store, then compute.
    fn execute(
        &mut self,
        dca: &mut DataContainerArray,
        ctx: &mut FilterContext,
    ) -> Result<(), PipelineError> {
        debug!("execute {}", self.human_label());
        ctx.begin(false);
        if let Err(err) = self.data_check(dca, ctx) {
            return ctx.finish(Err(err));
        }
        ctx.validated = true;
        let result = self.execute_unchecked(dca, ctx);
        if result.is_ok() {
            info!("{} complete", self.human_label());
            ctx.info("Complete");
        }
        ctx.finish(result)
    }
}

/// Copies every parameter value of `from` onto `to`.
pub fn copy_parameters(from: &dyn Filter, to: &mut dyn Filter) -> Result<(), PipelineError> {
    for param in from.parameters() {
        if matches!(param.kind, ParameterKind::Separator) {
            continue;
        }
        let value = from.get_parameter(&param.property_key)?;
        to.set_parameter(&param.property_key, value)?;
    }
    Ok(())
}
