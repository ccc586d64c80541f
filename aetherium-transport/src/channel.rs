//! In-process channel transport.
//!
//! Pairs a [`ChannelTransport`] handed to the engine with a [`ChannelPeer`]
//! kept by the embedder. Both directions are unbounded tokio channels, so
//! either side may live on another thread or task.

use crate::error::TransportError;
use crate::message::Message;
use crate::transport::Transport;
use std::collections::VecDeque;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Engine side of an in-process channel.
pub struct ChannelTransport {
    name: String,
    incoming: UnboundedReceiver<Message>,
    outgoing: UnboundedSender<Message>,
    inbox: VecDeque<Message>,
    connected: bool,
    peer_gone: bool,
}

/// Embedder side of an in-process channel.
pub struct ChannelPeer {
    to_engine: Option<UnboundedSender<Message>>,
    from_engine: UnboundedReceiver<Message>,
}

impl ChannelTransport {
    /// Creates a connected pair.
    pub fn pair(name: impl Into<String>) -> (ChannelTransport, ChannelPeer) {
        let (to_engine, incoming) = mpsc::unbounded_channel();
        let (outgoing, from_engine) = mpsc::unbounded_channel();

        let transport = ChannelTransport {
            name: name.into(),
            incoming,
            outgoing,
            inbox: VecDeque::new(),
            connected: false,
            peer_gone: false,
        };
        let peer = ChannelPeer {
            to_engine: Some(to_engine),
            from_engine,
        };

        (transport, peer)
    }

    fn poll(&mut self) {
        loop {
            match self.incoming.try_recv() {
                Ok(message) => self.inbox.push_back(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.peer_gone = true;
                    break;
                }
            }
        }
    }
}

impl Transport for ChannelTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        if self.outgoing.is_closed() {
            return Err(TransportError::Closed);
        }
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) {
        self.connected = false;
    }

    fn is_available(&mut self) -> bool {
        if !self.connected {
            return false;
        }
        self.poll();
        !self.inbox.is_empty()
    }

    fn send(&mut self, message: Message) -> bool {
        if !self.connected {
            return false;
        }
        self.outgoing.send(message).is_ok()
    }

    fn receive(&mut self) -> Result<Message, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.poll();
        match self.inbox.pop_front() {
            Some(message) => Ok(message),
            None if self.peer_gone => Err(TransportError::Closed),
            None => Err(TransportError::Unavailable),
        }
    }

    fn is_exhausted(&mut self) -> bool {
        self.poll();
        self.peer_gone && self.inbox.is_empty()
    }

    fn info(&self) -> String {
        format!("channel({})", self.name)
    }
}

impl ChannelPeer {
    /// Queues a message for the engine. Returns false if the transport is gone.
    pub fn send(&self, message: Message) -> bool {
        self.to_engine
            .as_ref()
            .is_some_and(|tx| tx.send(message).is_ok())
    }

    /// Ends the input direction. The engine still receives what was already
    /// sent, and this side can keep reading its outputs.
    pub fn finish_input(&mut self) {
        self.to_engine = None;
    }

    /// Takes the next message from the engine without waiting.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.from_engine.try_recv().ok()
    }

    /// Waits for the next message from the engine.
    pub async fn recv(&mut self) -> Option<Message> {
        self.from_engine.recv().await
    }

    /// Takes everything the engine sent so far.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Some(message) = self.try_recv() {
            messages.push(message);
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageKind, Payload};
    use aetherium_core::Variable;

    #[test]
    fn test_round_trip_between_sides() {
        let (mut transport, mut peer) = ChannelTransport::pair("test");
        transport.connect().unwrap();

        assert!(peer.send(Message::input(Variable::with_value("go", true))));
        assert!(transport.is_available());
        let msg = transport.receive().unwrap();
        assert_eq!(msg.payload, Payload::Input(Variable::with_value("go", true)));

        assert!(transport.send(Message::output(Variable::with_value("n", 1))));
        let out = peer.drain();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind(), MessageKind::Output);
    }

    #[test]
    fn test_unavailable_when_empty() {
        let (mut transport, _peer) = ChannelTransport::pair("test");
        transport.connect().unwrap();
        assert!(!transport.is_available());
        assert!(matches!(
            transport.receive(),
            Err(TransportError::Unavailable)
        ));
    }

    #[test]
    fn test_closed_after_peer_dropped() {
        let (mut transport, peer) = ChannelTransport::pair("test");
        transport.connect().unwrap();
        peer.send(Message::initiate());
        drop(peer);

        assert!(!transport.is_exhausted());
        assert_eq!(transport.receive().unwrap().kind(), MessageKind::Initiate);
        assert!(transport.is_exhausted());
        assert!(matches!(transport.receive(), Err(TransportError::Closed)));
        assert!(!transport.send(Message::initiate()));
    }

    #[test]
    fn test_not_connected() {
        let (mut transport, peer) = ChannelTransport::pair("test");
        peer.send(Message::initiate());
        assert!(!transport.is_available());
        assert!(!transport.send(Message::initiate()));
        assert!(matches!(
            transport.receive(),
            Err(TransportError::NotConnected)
        ));
        assert_eq!(transport.info(), "channel(test)");
    }

    #[test]
    fn test_finish_input() {
        let (mut transport, mut peer) = ChannelTransport::pair("test");
        transport.connect().unwrap();
        peer.send(Message::input(Variable::with_value("go", true)));
        peer.finish_input();
        assert!(!peer.send(Message::initiate()));

        assert!(!transport.is_exhausted());
        assert!(transport.receive().is_ok());
        assert!(transport.is_exhausted());

        assert!(transport.send(Message::output(Variable::with_value("n", 1))));
        assert_eq!(peer.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_peer_recv_from_task() {
        let (mut transport, mut peer) = ChannelTransport::pair("async");
        transport.connect().unwrap();

        let handle = tokio::spawn(async move { peer.recv().await });
        transport.send(Message::output(Variable::with_value("done", true)));

        let msg = handle.await.unwrap().unwrap();
        assert_eq!(msg.variable().unwrap().name(), "done");
    }
}
