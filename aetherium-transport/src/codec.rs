//! Line codec for text transports.
//!
//! Every line is one message, in either of two forms:
//!
//! ```text
//! {"kind":"input","name":"push","value":true}   JSON line
//! push=true                                     shorthand INPUT
//! init                                          shorthand INITIATE
//! ```
//!
//! Blank lines and lines starting with `#` carry no message.

use crate::error::TransportError;
use crate::message::{render, Message, MessageKind, Payload};
use aetherium_core::{Value, Variable};
use serde::{Deserialize, Serialize};

/// How outgoing messages are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineFormat {
    /// `name=value`
    #[default]
    Shorthand,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

/// Encodes and decodes single-line messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineCodec {
    format: LineFormat,
}

impl LineCodec {
    pub fn new(format: LineFormat) -> Self {
        Self { format }
    }

    /// Decodes one line. Returns `Ok(None)` for lines that carry nothing.
    pub fn decode(&self, line: &str) -> Result<Option<Message>, TransportError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let payload = if trimmed.starts_with('{') {
            decode_json(trimmed)?
        } else {
            decode_shorthand(trimmed)?
        };

        Ok(Some(Message::new(trimmed, payload)))
    }

    /// Encodes a message as a line without the trailing newline.
    pub fn encode(&self, message: &Message) -> Result<String, TransportError> {
        match self.format {
            LineFormat::Shorthand => Ok(match &message.payload {
                Payload::Initiate => "initiate".to_string(),
                Payload::Input(v) | Payload::Output(v) => render(v),
            }),
            LineFormat::Json => {
                let wire = WireMessage {
                    kind: message.kind(),
                    name: message.variable().map(|v| v.name().to_string()),
                    value: message.variable().map(|v| v.value().clone()),
                };
                Ok(serde_json::to_string(&wire)?)
            }
        }
    }
}

fn decode_json(line: &str) -> Result<Payload, TransportError> {
    let wire: WireMessage = serde_json::from_str(line)?;

    if wire.kind == MessageKind::Initiate {
        return Ok(Payload::Initiate);
    }

    let name = wire
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| TransportError::decode(line, "missing variable name"))?;
    let value = wire
        .value
        .ok_or_else(|| TransportError::decode(line, "missing value"))?;
    let variable = Variable::with_value(name.trim(), value);

    Ok(match wire.kind {
        MessageKind::Output => Payload::Output(variable),
        _ => Payload::Input(variable),
    })
}

fn decode_shorthand(line: &str) -> Result<Payload, TransportError> {
    if line == "init" || line == "initiate" {
        return Ok(Payload::Initiate);
    }

    let (name, value) = line
        .split_once('=')
        .ok_or_else(|| TransportError::decode(line, "expected name=value"))?;
    let name = name.trim();

    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(TransportError::decode(line, "invalid variable name"));
    }

    Ok(Payload::Input(Variable::with_value(
        name,
        Value::parse_literal(value),
    )))
}
