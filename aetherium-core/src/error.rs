//! Core error types.

use crate::variable::VariableType;
use thiserror::Error;

/// Errors from the automata core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("type mismatch on '{variable}': locked to {expected}, got {actual}")]
    TypeMismatch {
        variable: String,
        expected: VariableType,
        actual: VariableType,
    },

    #[error("wrong variant on '{variable}': requested {requested}, holds {actual}")]
    WrongVariant {
        variable: String,
        requested: VariableType,
        actual: String,
    },

    #[error("unknown automata type: '{0}' (expected 'inline' or 'folder')")]
    UnknownAutomataType(String),

    #[error("transition '{transition}' references unknown state '{state}'")]
    UnresolvedStateReference { transition: String, state: String },

    #[error("structural validation failed: {reason}")]
    StructuralValidationFailure { reason: String },

    #[error("duplicate state name: '{name}'")]
    DuplicateState { name: String },

    #[error("invalid automata document: {reason}")]
    InvalidDocument { reason: String },

    #[error("evaluation failed: {reason}")]
    Evaluation { reason: String },

    #[error("state '{state}' has no input named '{name}'")]
    UnknownInput { state: String, name: String },

    #[error("automata is not loaded")]
    NotLoaded,

    #[error("invalid phase: expected {expected}, actual {actual}")]
    InvalidPhase {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Creates an evaluation failure.
    pub fn evaluation(reason: impl Into<String>) -> Self {
        CoreError::Evaluation {
            reason: reason.into(),
        }
    }

    /// Creates an invalid document error.
    pub fn invalid_document(reason: impl Into<String>) -> Self {
        CoreError::InvalidDocument {
            reason: reason.into(),
        }
    }

    /// Returns whether a run can continue after this error.
    ///
    /// Only per-message delivery errors are recoverable; everything else
    /// aborts the load or the step that raised it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::TypeMismatch { .. } | CoreError::UnknownInput { .. }
        )
    }

    /// Returns a stable error code for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::TypeMismatch { .. } => "TYPE_MISMATCH",
            CoreError::WrongVariant { .. } => "WRONG_VARIANT",
            CoreError::UnknownAutomataType(_) => "UNKNOWN_AUTOMATA_TYPE",
            CoreError::UnresolvedStateReference { .. } => "UNRESOLVED_STATE_REFERENCE",
            CoreError::StructuralValidationFailure { .. } => "STRUCTURAL_VALIDATION_FAILURE",
            CoreError::DuplicateState { .. } => "DUPLICATE_STATE",
            CoreError::InvalidDocument { .. } => "INVALID_DOCUMENT",
            CoreError::Evaluation { .. } => "EVALUATOR_FAILURE",
            CoreError::UnknownInput { .. } => "UNKNOWN_INPUT",
            CoreError::NotLoaded => "NOT_LOADED",
            CoreError::InvalidPhase { .. } => "INVALID_PHASE",
            CoreError::Yaml(_) => "INVALID_DOCUMENT",
            CoreError::Io(_) => "IO_ERROR",
        }
    }
}
