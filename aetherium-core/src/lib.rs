//! # aetherium-core
//!
//! Finite-state automata engine core for aetherium.
//!
//! This crate provides:
//! - Type-locked variables
//! - Automata definitions and the two-pass YAML loader
//! - Structural document validation
//! - Execution state and the step algorithm
//! - A small default expression evaluator

pub mod automata;
pub mod code;
pub mod error;
pub mod evaluator;
pub mod execution;
pub mod expr;
pub mod loader;
pub mod validator;
pub mod variable;

pub use automata::{Automata, AutomataType, State, StateId, Transition};
pub use code::Code;
pub use error::CoreError;
pub use evaluator::{Bindings, Evaluator, ScopeKind};
pub use execution::{ExecutionState, Phase, StepOutcome};
pub use expr::ExprEvaluator;
pub use loader::Loader;
pub use validator::Validator;
pub use variable::{FromValue, Value, Variable, VariableType};
