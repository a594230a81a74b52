//! Status/error events emitted by filters.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One `(severity, code, message)` event, tagged with the emitting filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterMessage {
    pub filter: String,
    pub severity: Severity,
    pub code: i32,
    pub message: String,
}

impl FilterMessage {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for FilterMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}] {} ({}): {}",
            self.severity, self.filter, self.code, self.message
        )
    }
}
