//! # aetherium-transport
//!
//! Message and transport layer for aetherium.
//!
//! This crate provides:
//! - Message envelopes (INITIATE, INPUT, OUTPUT)
//! - The `Transport` trait the engine talks to
//! - A console transport over stdin/stdout
//! - An in-process channel transport
//! - A line codec (JSON lines or `name=value` shorthand)

pub mod channel;
pub mod codec;
pub mod console;
pub mod error;
pub mod message;
pub mod transport;

pub use channel::{ChannelPeer, ChannelTransport};
pub use codec::LineCodec;
pub use console::ConsoleTransport;
pub use error::TransportError;
pub use message::{Message, MessageKind, Payload};
pub use transport::Transport;
