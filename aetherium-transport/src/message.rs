//! Message envelopes exchanged with the outside world.

use aetherium_core::Variable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Announces that an execution is starting.
    Initiate,
    /// A value for an input slot of the current state.
    Input,
    /// A value produced by the automata.
    Output,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Initiate => "initiate",
            MessageKind::Input => "input",
            MessageKind::Output => "output",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded content of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Initiate,
    Input(Variable),
    Output(Variable),
}

/// A message together with the text it was read from or rendered as.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub raw: String,
    pub payload: Payload,
}

impl Message {
    pub fn new(raw: impl Into<String>, payload: Payload) -> Self {
        Self {
            raw: raw.into(),
            payload,
        }
    }

    pub fn initiate() -> Self {
        Self::new("initiate", Payload::Initiate)
    }

    pub fn input(variable: Variable) -> Self {
        Self::new(render(&variable), Payload::Input(variable))
    }

    pub fn output(variable: Variable) -> Self {
        Self::new(render(&variable), Payload::Output(variable))
    }

    pub fn kind(&self) -> MessageKind {
        match self.payload {
            Payload::Initiate => MessageKind::Initiate,
            Payload::Input(_) => MessageKind::Input,
            Payload::Output(_) => MessageKind::Output,
        }
    }

    /// The carried variable, if any.
    pub fn variable(&self) -> Option<&Variable> {
        match &self.payload {
            Payload::Initiate => None,
            Payload::Input(v) | Payload::Output(v) => Some(v),
        }
    }

    /// Consumes the message and returns the variable of an INPUT.
    pub fn into_input(self) -> Option<Variable> {
        match self.payload {
            Payload::Input(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind(), self.raw)
    }
}

/// Shorthand `name=value` rendering.
pub(crate) fn render(variable: &Variable) -> String {
    format!("{}={}", variable.name(), variable.value().to_literal())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kinds() {
        assert_eq!(Message::initiate().kind(), MessageKind::Initiate);
        assert_eq!(
            Message::input(Variable::with_value("push", true)).kind(),
            MessageKind::Input
        );
        assert_eq!(
            Message::output(Variable::with_value("status", "open")).kind(),
            MessageKind::Output
        );
    }

    #[test]
    fn test_raw_rendering() {
        let msg = Message::output(Variable::with_value("status", "open"));
        assert_eq!(msg.raw, "status=\"open\"");
        assert_eq!(msg.to_string(), "[output] status=\"open\"");

        let msg = Message::input(Variable::with_value("count", 3));
        assert_eq!(msg.raw, "count=3");
    }

    #[test]
    fn test_into_input() {
        let var = Variable::with_value("push", true);
        assert_eq!(Message::input(var.clone()).into_input(), Some(var.clone()));
        assert_eq!(Message::output(var).into_input(), None);
        assert!(Message::initiate().variable().is_none());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&MessageKind::Input).unwrap();
        assert_eq!(json, "\"input\"");
        let kind: MessageKind = serde_json::from_str("\"output\"").unwrap();
        assert_eq!(kind, MessageKind::Output);
    }
}
