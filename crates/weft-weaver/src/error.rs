//! Error and diagnostic types for the weaving pass

use std::fmt;

use thiserror::Error;
use weft_ast::Span;

use crate::WeaveState;

/// Problems found while weaving a single element.
///
/// None of these abort a build: the session turns them into
/// [`WeaveDiagnostic`]s on the host's channel and skips the element.
#[derive(Debug, Clone, Error)]
pub enum WeaveError {
    /// W-WEAVE-001: the method's owner is not present in the unit arena
    #[error("method '{method}' refers to an owner type that is not in the unit")]
    MissingOwner { method: String, span: Span },

    /// W-WEAVE-002: a concrete method arrived without a body tree
    #[error("no syntax tree for the body of method '{method}'")]
    MissingTree { method: String, span: Span },

    /// W-WEAVE-003: a user field already occupies a metadata cache slot name
    #[error("field '{field}' on '{owner}' clashes with a metadata cache slot")]
    CacheSlotClash {
        owner: String,
        field: String,
        span: Span,
    },

    /// W-WEAVE-004: strategy attribute present but unusable; default applied
    #[error("'{attribute}' on @{annotation} is not a non-empty string, default strategy used")]
    MalformedStrategy {
        annotation: String,
        attribute: String,
        span: Span,
    },

    /// E-WEAVE-001: the host handed over a method handle the unit does not hold
    #[error("unknown method handle #{id}")]
    UnknownMethod { id: u32 },

    /// E-WEAVE-002: illegal weave lifecycle transition
    #[error("illegal weave state transition {from:?} -> {to:?}")]
    InvalidTransition { from: WeaveState, to: WeaveState },

    /// E-WEAVE-003: a stage ran before the stage that produces its input
    #[error("stage '{stage}' ran without its {input}")]
    MissingStageInput {
        stage: &'static str,
        input: &'static str,
    },
}

impl WeaveError {
    /// Error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            WeaveError::MissingOwner { .. } => "W-WEAVE-001",
            WeaveError::MissingTree { .. } => "W-WEAVE-002",
            WeaveError::CacheSlotClash { .. } => "W-WEAVE-003",
            WeaveError::MalformedStrategy { .. } => "W-WEAVE-004",
            WeaveError::UnknownMethod { .. } => "E-WEAVE-001",
            WeaveError::InvalidTransition { .. } => "E-WEAVE-002",
            WeaveError::MissingStageInput { .. } => "E-WEAVE-003",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            WeaveError::MalformedStrategy { .. } => Severity::Note,
            WeaveError::UnknownMethod { .. }
            | WeaveError::InvalidTransition { .. }
            | WeaveError::MissingStageInput { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            WeaveError::MissingOwner { span, .. }
            | WeaveError::MissingTree { span, .. }
            | WeaveError::CacheSlotClash { span, .. }
            | WeaveError::MalformedStrategy { span, .. } => *span,
            WeaveError::UnknownMethod { .. }
            | WeaveError::InvalidTransition { .. }
            | WeaveError::MissingStageInput { .. } => Span::synthetic(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A report for the host's diagnostic channel
#[derive(Debug, Clone)]
pub struct WeaveDiagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    /// Path of the compilation unit
    pub unit: String,
    /// `Owner.method` of the element that was skipped or degraded
    pub element: String,
    pub span: Span,
}

impl WeaveDiagnostic {
    pub fn from_error(error: &WeaveError, unit: &str, element: &str) -> Self {
        Self {
            code: error.code(),
            severity: error.severity(),
            message: error.to_string(),
            unit: unit.to_string(),
            element: element.to_string(),
            span: error.span(),
        }
    }
}

impl fmt::Display for WeaveDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}:{}: {} ({})",
            self.severity, self.code, self.unit, self.span.start, self.message, self.element
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_carry_code_and_severity() {
        let err = WeaveError::MissingTree {
            method: "run".into(),
            span: Span::new(40, 60),
        };
        let diag = WeaveDiagnostic::from_error(&err, "Job.java", "Job.run");
        assert_eq!(diag.code, "W-WEAVE-002");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(
            diag.to_string(),
            concat!(
                "warning[W-WEAVE-002] Job.java:40: ",
                "no syntax tree for the body of method 'run' (Job.run)"
            )
        );
    }

    #[test]
    fn malformed_strategy_is_only_a_note() {
        let err = WeaveError::MalformedStrategy {
            annotation: "Aspect".into(),
            attribute: "builder".into(),
            span: Span::synthetic(),
        };
        assert_eq!(err.severity(), Severity::Note);
        assert_eq!(err.code(), "W-WEAVE-004");
    }
}
