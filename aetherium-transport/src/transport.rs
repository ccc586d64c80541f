//! Transport contract.

use crate::error::TransportError;
use crate::message::Message;

/// A bidirectional message channel between an execution and its peers.
///
/// Transports are polled: `receive` never waits for a message to arrive.
/// Anything delivered asynchronously is queued and handed out at the next
/// poll, so the driving loop stays single-threaded.
pub trait Transport: Send {
    /// Opens the underlying resource.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Releases the underlying resource. Closing twice is harmless.
    fn close(&mut self);

    /// Returns true if a message can be received right now. Never blocks.
    fn is_available(&mut self) -> bool;

    /// Sends a message. Returns false if it could not be delivered.
    fn send(&mut self, message: Message) -> bool;

    /// Takes the next queued message, or `TransportError::Unavailable`.
    fn receive(&mut self) -> Result<Message, TransportError>;

    /// Returns true once no further message can arrive and nothing is
    /// left to receive.
    fn is_exhausted(&mut self) -> bool {
        false
    }

    /// Human-readable description for logs.
    fn info(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self) -> Result<(), TransportError> {
        (**self).connect()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_available(&mut self) -> bool {
        (**self).is_available()
    }

    fn send(&mut self, message: Message) -> bool {
        (**self).send(message)
    }

    fn receive(&mut self) -> Result<Message, TransportError> {
        (**self).receive()
    }

    fn is_exhausted(&mut self) -> bool {
        (**self).is_exhausted()
    }

    fn info(&self) -> String {
        (**self).info()
    }
}
