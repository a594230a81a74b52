//! Structural self-checks for the store.
//!
//! Arrays, matrices and containers re-check their shape after every mutation
//! when built with `debug_assertions` or the `check-invariants` feature.

use crate::pipeline_error::PipelineError;

pub trait DebugInvariants {
    /// Panic on a broken invariant when checking is compiled in; no-op otherwise.
    fn debug_assert_invariants(&self);

    /// First broken invariant, if any.
    fn validate_invariants(&self) -> Result<(), PipelineError>;
}

/// Run a fallible check and panic with `context` and the error code when
/// checking is compiled in.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($context:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($context)*, ": {} (code {})"), e, e.code());
        }
    };
}
