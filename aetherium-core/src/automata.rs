//! Automata definition types.
//!
//! States live in an arena owned by the [`Automata`]; transitions refer to
//! them through [`StateId`] handles. The arena is only written by the
//! loader, so handles stay valid for as long as the automata exists.

use crate::code::Code;
use crate::variable::Variable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Stable handle of a state inside its automata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A state in the automata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub name: String,
    pub inputs: Vec<Variable>,
    pub outputs: Vec<Variable>,
    pub variables: Vec<Variable>,
    pub on_enter: Code,
    pub on_exit: Code,
    pub body: Code,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A transition between two states.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub name: String,
    pub from: StateId,
    pub to: StateId,
    /// Guard; an empty condition always holds.
    pub condition: Code,
    /// Action run when the transition fires, read from `body` or `action`.
    pub triggered: Code,
}

/// Where the automata definition lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomataType {
    /// Definition spread across files under `root_path`.
    Folder,
    /// Self-contained document.
    #[default]
    Inline,
}

impl AutomataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomataType::Folder => "folder",
            AutomataType::Inline => "inline",
        }
    }
}

impl fmt::Display for AutomataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded automata definition.
#[derive(Debug, Clone, Default)]
pub struct Automata {
    pub version: String,
    pub name: String,
    pub kind: AutomataType,
    /// Root location of the fragments, only set for folder automata.
    pub root_path: Option<PathBuf>,
    states: Vec<State>,
    transitions: Vec<Transition>,
    variables: Vec<Variable>,
    checksum: String,
    loaded: bool,
}

impl Automata {
    /// Creates an empty, unloaded automata.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Global variables.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Returns the state behind a handle.
    ///
    /// Handles are only ever produced by this automata, so indexing cannot
    /// go out of bounds.
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    /// Looks up a state by name.
    pub fn find_state(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name == name)
            .map(StateId)
    }

    /// Returns the outgoing transitions of a state in document order.
    pub fn transitions_from(&self, id: StateId) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.from == id)
    }

    pub fn has_outgoing(&self, id: StateId) -> bool {
        self.transitions.iter().any(|t| t.from == id)
    }

    /// The state a run starts in: the first one in document order.
    pub fn initial_state(&self) -> Option<StateId> {
        if self.states.is_empty() {
            None
        } else {
            Some(StateId(0))
        }
    }

    /// True once both loader passes succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// CRC32C of the document this automata was loaded from.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub(crate) fn clear(&mut self) {
        self.states.clear();
        self.transitions.clear();
        self.variables.clear();
        self.checksum.clear();
        self.loaded = false;
    }

    pub(crate) fn push_state(&mut self, state: State) -> StateId {
        self.states.push(state);
        StateId(self.states.len() - 1)
    }

    pub(crate) fn push_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub(crate) fn push_variable(&mut self, variable: Variable) {
        self.variables.push(variable);
    }

    pub(crate) fn mark_loaded(&mut self, checksum: String) {
        self.checksum = checksum;
        self.loaded = true;
    }
}
