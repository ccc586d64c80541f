//! Two-pass automata loader.
//!
//! Automata documents are YAML:
//!
//! ```yaml
//! version: 1
//! config:
//!   name: door
//!   type: inline            # or "folder" together with `location`
//! automata:
//!   variables: ["opened:int"]
//!   states:
//!     closed:
//!       inputs: ["push:bool"]
//!       on_enter: "opened = opened + 1"
//!     open:
//!       outputs: [status]
//!       code: "status = \"open\""
//!   transitions:
//!     push_open:
//!       from: closed
//!       to: open
//!       condition: "push"
//!       body: "push = false"
//! ```
//!
//! Pass A builds every state into its final slot in the arena; pass B then
//! builds transitions and resolves `from`/`to` against the finished arena.

use crate::automata::{Automata, AutomataType, State, StateId, Transition};
use crate::code::Code;
use crate::error::CoreError;
use crate::variable::{Variable, VariableType};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Builds [`Automata`] from parsed documents.
pub struct Loader;

impl Loader {
    /// Loads an automata from a parsed document tree.
    pub fn load(doc: &Value) -> Result<Automata, CoreError> {
        let mut automata = Automata::new();
        automata.reload(doc)?;
        Ok(automata)
    }

    /// Parses YAML text and loads it.
    pub fn load_str(yaml: &str) -> Result<Automata, CoreError> {
        let doc: Value = serde_yaml::from_str(yaml)?;
        Self::load(&doc)
    }

    /// Reads, parses and loads a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Automata, CoreError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::load_str(&content)
    }
}

impl Automata {
    /// Replaces the contents of this automata with the given document.
    ///
    /// States, transitions and variables are cleared first. If loading
    /// fails the automata stays cleared and unloaded.
    pub fn reload(&mut self, doc: &Value) -> Result<(), CoreError> {
        self.clear();

        match populate(self, doc) {
            Ok(()) => {
                let canonical = serde_yaml::to_string(doc)?;
                let checksum = format!("{:08x}", crc32c::crc32c(canonical.as_bytes()));
                self.mark_loaded(checksum);
                tracing::info!(
                    "Loaded automata '{}' ({} states, {} transitions)",
                    self.name,
                    self.states().len(),
                    self.transitions().len()
                );
                Ok(())
            }
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }
}

fn populate(automata: &mut Automata, doc: &Value) -> Result<(), CoreError> {
    let root = doc
        .as_mapping()
        .ok_or_else(|| CoreError::invalid_document("root must be a mapping"))?;

    read_metadata(automata, root)?;

    let Some(body) = root.get("automata") else {
        return Ok(());
    };
    let body = match body {
        Value::Null => return Ok(()),
        Value::Mapping(m) => m,
        _ => return Err(CoreError::invalid_document("'automata' must be a mapping")),
    };

    if let Some(vars) = body.get("variables") {
        for variable in parse_declarations(vars, "automata.variables")? {
            automata.push_variable(variable);
        }
    }

    // Pass A: every state reaches its final slot before any transition
    // is resolved.
    let mut seen = HashSet::new();
    for (key, node) in section(body, "states")? {
        let state = parse_state(key, node)?;
        if !seen.insert(state.name.clone()) {
            return Err(CoreError::DuplicateState { name: state.name });
        }
        tracing::debug!("Parsed state '{}'", state.name);
        automata.push_state(state);
    }

    // Pass B
    for (key, node) in section(body, "transitions")? {
        let transition = parse_transition(automata, key, node)?;
        tracing::debug!(
            "Resolved transition '{}': {} -> {}",
            transition.name,
            automata.state(transition.from).name,
            automata.state(transition.to).name
        );
        automata.push_transition(transition);
    }

    Ok(())
}

fn read_metadata(automata: &mut Automata, root: &Mapping) -> Result<(), CoreError> {
    automata.kind = AutomataType::default();
    automata.root_path = None;

    if let Some(version) = root.get("version").and_then(scalar_string) {
        automata.version = version;
    }

    let Some(Value::Mapping(config)) = root.get("config") else {
        return Ok(());
    };

    if let Some(name) = config.get("name").and_then(scalar_string) {
        automata.name = name;
    }

    if let Some(kind) = config.get("type") {
        automata.kind = match kind.as_str() {
            Some("inline") => AutomataType::Inline,
            Some("folder") => AutomataType::Folder,
            _ => return Err(CoreError::UnknownAutomataType(describe(kind))),
        };
    }

    if automata.kind == AutomataType::Folder {
        let location = config
            .get("location")
            .and_then(scalar_string)
            .ok_or_else(|| CoreError::invalid_document("folder automata requires config.location"))?;
        automata.root_path = Some(PathBuf::from(location));
    }

    Ok(())
}

/// Returns the entries of a mapping section, or nothing if it is absent.
fn section<'a>(
    parent: &'a Mapping,
    key: &str,
) -> Result<Vec<(&'a Value, &'a Value)>, CoreError> {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Mapping(m)) => Ok(m.iter().collect()),
        Some(_) => Err(CoreError::invalid_document(format!(
            "'{}' must be a mapping",
            key
        ))),
    }
}

fn parse_state(key: &Value, node: &Value) -> Result<State, CoreError> {
    let name = entry_name(key, "state")?;
    let mut state = State::new(name);

    let fields = match node {
        Value::Null => return Ok(state),
        Value::Mapping(m) => m,
        _ => {
            return Err(CoreError::invalid_document(format!(
                "state '{}' must be a mapping",
                state.name
            )))
        }
    };

    if let Some(node) = fields.get("inputs") {
        state.inputs = parse_declarations(node, &format!("{}.inputs", state.name))?;
    }
    if let Some(node) = fields.get("outputs") {
        state.outputs = parse_declarations(node, &format!("{}.outputs", state.name))?;
    }
    if let Some(node) = fields.get("variables") {
        state.variables = parse_declarations(node, &format!("{}.variables", state.name))?;
    }
    if let Some(node) = fields.get("code").or_else(|| fields.get("body")) {
        state.body = parse_code(node, &state.name)?;
    }
    if let Some(node) = fields.get("on_enter") {
        state.on_enter = parse_code(node, &state.name)?;
    }
    if let Some(node) = fields.get("on_exit") {
        state.on_exit = parse_code(node, &state.name)?;
    }

    Ok(state)
}

fn parse_transition(
    automata: &Automata,
    key: &Value,
    node: &Value,
) -> Result<Transition, CoreError> {
    let name = entry_name(key, "transition")?;
    let fields = node.as_mapping().ok_or_else(|| {
        CoreError::invalid_document(format!("transition '{}' must be a mapping", name))
    })?;

    let mut condition = match fields.get("condition") {
        Some(node) => parse_code(node, &name)?,
        None => Code::default(),
    };
    condition.return_type = VariableType::Bool;

    let triggered = match fields.get("body").or_else(|| fields.get("action")) {
        Some(node) => parse_code(node, &name)?,
        None => Code::default(),
    };

    let from = resolve(automata, &name, fields.get("from"))?;
    let to = resolve(automata, &name, fields.get("to"))?;

    Ok(Transition {
        name,
        from,
        to,
        condition,
        triggered,
    })
}

fn resolve(
    automata: &Automata,
    transition: &str,
    reference: Option<&Value>,
) -> Result<StateId, CoreError> {
    let state = reference.and_then(scalar_string).unwrap_or_default();
    automata
        .find_state(&state)
        .ok_or_else(|| CoreError::UnresolvedStateReference {
            transition: transition.to_string(),
            state,
        })
}

fn parse_declarations(node: &Value, context: &str) -> Result<Vec<Variable>, CoreError> {
    match node {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                scalar_string(item)
                    .map(|decl| Variable::parse_declaration(&decl))
                    .ok_or_else(|| {
                        CoreError::invalid_document(format!(
                            "{}: variable declarations must be scalars",
                            context
                        ))
                    })
            })
            .collect(),
        _ => Err(CoreError::invalid_document(format!(
            "{} must be a sequence",
            context
        ))),
    }
}

/// Parses a code value: either plain source text or `{source, returns}`.
fn parse_code(node: &Value, owner: &str) -> Result<Code, CoreError> {
    match node {
        Value::Null => Ok(Code::default()),
        Value::Mapping(m) => {
            let source = m
                .get("source")
                .or_else(|| m.get("code"))
                .and_then(scalar_string)
                .unwrap_or_default();
            let return_type = match m.get("returns").and_then(scalar_string) {
                Some(token) if token == "void" => VariableType::Void,
                Some(token) => VariableType::from_token(&token).ok_or_else(|| {
                    CoreError::invalid_document(format!(
                        "{}: unknown return type '{}'",
                        owner, token
                    ))
                })?,
                None => VariableType::Void,
            };
            Ok(Code::new(source, return_type))
        }
        other => scalar_string(other)
            .map(|source| Code::new(source, VariableType::Void))
            .ok_or_else(|| CoreError::invalid_document(format!("{}: invalid code", owner))),
    }
}

fn entry_name(key: &Value, what: &str) -> Result<String, CoreError> {
    match scalar_string(key) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(CoreError::invalid_document(format!(
            "{} names must be non-empty scalars",
            what
        ))),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Renders a YAML node for diagnostics.
fn describe(value: &Value) -> String {
    match scalar_string(value) {
        Some(s) => s,
        None => serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}
