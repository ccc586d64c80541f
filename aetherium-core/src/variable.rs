//! Type-locked variables.
//!
//! A [`Variable`] holds exactly one of bool, int, string or void. The type
//! is locked by the first assignment; every later assignment must carry the
//! same kind of value.
//!
//! Declarations in automata documents use the `name:type` form:
//!
//! ```yaml
//! inputs:
//!   - count:int
//!   - ready:bool
//!   - label          # string when the type is omitted
//! ```

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    Bool,
    Int,
    String,
    Void,
}

impl VariableType {
    /// Parses a declaration type token (`int`, `bool`, `string`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "int" => Some(VariableType::Int),
            "bool" => Some(VariableType::Bool),
            "string" => Some(VariableType::String),
            _ => None,
        }
    }

    /// Returns the zero value for this type.
    pub fn zero(self) -> Value {
        match self {
            VariableType::Bool => Value::Bool(false),
            VariableType::Int => Value::Int(0),
            VariableType::String => Value::String(String::new()),
            VariableType::Void => Value::Void,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::Bool => "bool",
            VariableType::Int => "int",
            VariableType::String => "string",
            VariableType::Void => "void",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A variable value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    #[default]
    Void,
}

impl Value {
    /// Returns the type tag of this value.
    pub fn var_type(&self) -> VariableType {
        match self {
            Value::Bool(_) => VariableType::Bool,
            Value::Int(_) => VariableType::Int,
            Value::String(_) => VariableType::String,
            Value::Void => VariableType::Void,
        }
    }

    /// Parses a literal as typed on a console line.
    ///
    /// `true`/`false` become bools, anything `i64` accepts becomes an int,
    /// a double-quoted token becomes its unescaped contents and everything
    /// else is taken verbatim as a string.
    pub fn parse_literal(s: &str) -> Self {
        let s = s.trim();
        match s {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }

        if let Ok(n) = s.parse::<i64>() {
            return Value::Int(n);
        }

        if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            return Value::String(unescape(&s[1..s.len() - 1]));
        }

        Value::String(s.to_string())
    }

    /// Renders the value so that [`Value::parse_literal`] reads it back.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Value::Void => "void".to_string(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Void => f.write_str("void"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// Rust types a variable can be read as.
pub trait FromValue: Sized {
    const TYPE: VariableType;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    const TYPE: VariableType = VariableType::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    const TYPE: VariableType = VariableType::Int;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromValue for String {
    const TYPE: VariableType = VariableType::String;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// A named, type-locked variable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    value: Value,
    locked: Option<VariableType>,
}

impl Variable {
    /// Creates an unlocked variable with no value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::Void,
            locked: None,
        }
    }

    /// Creates a variable locked to the type of `value`.
    pub fn with_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            locked: Some(value.var_type()),
            value,
        }
    }

    /// Creates a variable locked to `ty` holding its zero value.
    pub fn declared(name: impl Into<String>, ty: VariableType) -> Self {
        Self {
            name: name.into(),
            value: ty.zero(),
            locked: Some(ty),
        }
    }

    /// Parses a `name:type` declaration.
    ///
    /// Unknown type tokens fall back to string.
    pub fn parse_declaration(decl: &str) -> Self {
        match decl.split_once(':') {
            Some((name, token)) => {
                let ty = VariableType::from_token(token).unwrap_or_else(|| {
                    tracing::warn!(
                        "Unknown type '{}' for variable '{}', defaulting to string",
                        token.trim(),
                        name.trim()
                    );
                    VariableType::String
                });
                Self::declared(name.trim(), ty)
            }
            None => Self::declared(decl.trim(), VariableType::String),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the locked type, or `None` if never assigned.
    pub fn var_type(&self) -> Option<VariableType> {
        self.locked
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    /// Assigns a value, locking the type on first assignment.
    pub fn set(&mut self, value: impl Into<Value>) -> Result<(), CoreError> {
        let value = value.into();
        let incoming = value.var_type();

        match self.locked {
            Some(expected) if expected != incoming => Err(CoreError::TypeMismatch {
                variable: self.name.clone(),
                expected,
                actual: incoming,
            }),
            _ => {
                self.locked = Some(incoming);
                self.value = value;
                Ok(())
            }
        }
    }

    /// Reads the value as `T`.
    pub fn get<T: FromValue>(&self) -> Result<T, CoreError> {
        if self.locked.is_none() {
            return Err(CoreError::WrongVariant {
                variable: self.name.clone(),
                requested: T::TYPE,
                actual: "unset".to_string(),
            });
        }

        T::from_value(&self.value).ok_or_else(|| CoreError::WrongVariant {
            variable: self.name.clone(),
            requested: T::TYPE,
            actual: self.value.var_type().to_string(),
        })
    }

    /// Returns true if the variable currently holds a `T`.
    pub fn is<T: FromValue>(&self) -> bool {
        self.locked.is_some() && T::from_value(&self.value).is_some()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.locked {
            Some(ty) => write!(f, "{}:{}={}", self.name, ty, self.value.to_literal()),
            None => write!(f, "{}:unset", self.name),
        }
    }
}
