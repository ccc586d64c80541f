//! Opaque code fragments.

use crate::variable::VariableType;

/// A code fragment attached to a state hook or a transition.
///
/// The core never interprets `source`; it hands the fragment to an
/// [`Evaluator`](crate::evaluator::Evaluator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub source: String,
    pub return_type: VariableType,
}

impl Code {
    pub fn new(source: impl Into<String>, return_type: VariableType) -> Self {
        Self {
            source: source.into(),
            return_type,
        }
    }

    /// Creates a guard fragment (return type BOOL).
    pub fn condition(source: impl Into<String>) -> Self {
        Self::new(source, VariableType::Bool)
    }

    /// Returns true if there is nothing to evaluate.
    pub fn is_empty(&self) -> bool {
        self.source.trim().is_empty()
    }
}

impl Default for Code {
    fn default() -> Self {
        Self {
            source: String::new(),
            return_type: VariableType::Void,
        }
    }
}

impl From<&str> for Code {
    fn from(source: &str) -> Self {
        Self::new(source, VariableType::Void)
    }
}
