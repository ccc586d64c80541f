//! Code evaluation capability.
//!
//! The core decides when code runs and which variables it can see; what the
//! code means is up to the [`Evaluator`] the caller injects.

use crate::code::Code;
use crate::error::CoreError;
use crate::variable::{Value, Variable};

/// Evaluates code fragments against a set of bindings.
pub trait Evaluator: Send + Sync {
    /// Runs `code`, possibly assigning through `bindings`, and returns the
    /// value it produced (`Value::Void` if none).
    fn evaluate(&self, code: &Code, bindings: &mut Bindings) -> Result<Value, CoreError>;
}

/// Which slot list a binding comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Input,
    Local,
    Output,
    Global,
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    vars: Vec<Variable>,
}

/// Variables visible to a code fragment.
///
/// Lookup walks the scopes in the order they were added; the first
/// variable with a matching name wins. Assignments go through
/// [`Variable::set`], so type locks hold for code as well.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    scopes: Vec<Scope>,
    written: Vec<String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scope below the existing ones.
    pub fn with_scope(mut self, kind: ScopeKind, vars: Vec<Variable>) -> Self {
        self.scopes.push(Scope { kind, vars });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.scopes
            .iter()
            .flat_map(|s| s.vars.iter())
            .find(|v| v.name() == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|v| v.value())
    }

    /// Assigns to an existing variable.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), CoreError> {
        for scope in &mut self.scopes {
            if let Some(var) = scope.vars.iter_mut().find(|v| v.name() == name) {
                var.set(value)?;
                if scope.kind == ScopeKind::Output && !self.written.iter().any(|w| w == name) {
                    self.written.push(name.to_string());
                }
                return Ok(());
            }
        }

        Err(CoreError::evaluation(format!("unknown variable '{}'", name)))
    }

    /// Output names assigned so far, in first-write order.
    pub fn written_outputs(&self) -> &[String] {
        &self.written
    }

    /// Removes and returns the variables of a scope kind.
    pub fn take(&mut self, kind: ScopeKind) -> Vec<Variable> {
        self.scopes
            .iter_mut()
            .find(|s| s.kind == kind)
            .map(|s| std::mem::take(&mut s.vars))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableType;

    fn sample() -> Bindings {
        Bindings::new()
            .with_scope(ScopeKind::Input, vec![Variable::with_value("x", 1)])
            .with_scope(
                ScopeKind::Output,
                vec![Variable::declared("out", VariableType::String)],
            )
            .with_scope(
                ScopeKind::Global,
                vec![Variable::with_value("x", 99), Variable::with_value("g", true)],
            )
    }

    #[test]
    fn test_lookup_precedence() {
        let bindings = sample();
        assert_eq!(bindings.value("x"), Some(&Value::Int(1)));
        assert_eq!(bindings.value("g"), Some(&Value::Bool(true)));
        assert!(bindings.get("nope").is_none());
    }

    #[test]
    fn test_assign_tracks_outputs() {
        let mut bindings = sample();
        bindings.assign("out", Value::from("done")).unwrap();
        bindings.assign("out", Value::from("again")).unwrap();
        bindings.assign("x", Value::Int(5)).unwrap();

        assert_eq!(bindings.written_outputs(), &["out".to_string()]);
        assert_eq!(bindings.value("out"), Some(&Value::from("again")));
    }

    #[test]
    fn test_assign_respects_lock() {
        let mut bindings = sample();
        let result = bindings.assign("g", Value::Int(3));
        assert!(matches!(result, Err(CoreError::TypeMismatch { .. })));
        assert_eq!(bindings.value("g"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_assign_unknown_variable() {
        let mut bindings = sample();
        let result = bindings.assign("ghost", Value::Int(1));
        assert!(matches!(result, Err(CoreError::Evaluation { .. })));
    }

    #[test]
    fn test_take_scope() {
        let mut bindings = sample();
        let globals = bindings.take(ScopeKind::Global);
        assert_eq!(globals.len(), 2);
        assert!(bindings.take(ScopeKind::Local).is_empty());
    }
}
