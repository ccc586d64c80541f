//! Console transport.
//!
//! Lines are read on a dedicated thread and handed over through a channel;
//! they are only decoded and queued when the transport is polled. Outgoing
//! messages are written one per line.

use crate::codec::{LineCodec, LineFormat};
use crate::error::TransportError;
use crate::message::Message;
use crate::transport::Transport;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};

type Source = Box<dyn BufRead + Send>;
type Sink = Box<dyn Write + Send>;

/// Transport over a line-oriented reader and writer, stdin/stdout by default.
pub struct ConsoleTransport {
    codec: LineCodec,
    source: Option<Source>,
    sink: Sink,
    lines: Option<UnboundedReceiver<String>>,
    inbox: VecDeque<Message>,
    connected: bool,
    exhausted: bool,
    label: String,
}

impl ConsoleTransport {
    /// Creates a transport over stdin and stdout.
    pub fn new() -> Self {
        Self::with_io(
            Box::new(std::io::BufReader::new(std::io::stdin())),
            Box::new(std::io::stdout()),
            "stdio",
        )
    }

    /// Creates a transport over arbitrary streams.
    pub fn with_io(source: Source, sink: Sink, label: impl Into<String>) -> Self {
        Self {
            codec: LineCodec::default(),
            source: Some(source),
            sink,
            lines: None,
            inbox: VecDeque::new(),
            connected: false,
            exhausted: false,
            label: label.into(),
        }
    }

    /// Sets the format used for outgoing lines.
    pub fn with_format(mut self, format: LineFormat) -> Self {
        self.codec = LineCodec::new(format);
        self
    }

    /// Queues a message locally, as if it had been read.
    pub fn enqueue(&mut self, message: Message) {
        self.inbox.push_back(message);
    }

    /// Moves whatever the reader thread produced into the inbox.
    fn poll(&mut self) {
        let Some(lines) = self.lines.as_mut() else {
            return;
        };

        loop {
            match lines.try_recv() {
                Ok(line) => match self.codec.decode(&line) {
                    Ok(Some(message)) => self.inbox.push_back(message),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Dropping console line: {}", e),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.exhausted = true;
                    break;
                }
            }
        }
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ConsoleTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        if self.connected {
            return Ok(());
        }

        let source = self.source.take().ok_or(TransportError::Closed)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let label = self.label.clone();

        std::thread::Builder::new()
            .name(format!("console-reader-{}", label))
            .spawn(move || {
                for line in source.lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Console reader for {} failed: {}", label, e);
                            break;
                        }
                    }
                }
            })?;

        self.lines = Some(rx);
        self.connected = true;
        tracing::debug!("Connected {}", self.info());
        Ok(())
    }

    fn close(&mut self) {
        if !self.connected {
            return;
        }

        // Dropping the receiver ends the reader thread at its next line.
        self.lines = None;
        self.connected = false;
        if let Err(e) = self.sink.flush() {
            tracing::warn!("Failed to flush {}: {}", self.info(), e);
        }
        tracing::debug!("Closed {}", self.info());
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

        let line = match self.codec.encode(&message) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Cannot encode {}: {}", message, e);
                return false;
            }
        };

        match writeln!(self.sink, "{}", line).and_then(|_| self.sink.flush()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Write to {} failed: {}", self.info(), e);
                false
            }
        }
    }

    fn receive(&mut self) -> Result<Message, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.poll();
        self.inbox.pop_front().ok_or(TransportError::Unavailable)
    }

    /// True once the source reached end of input and every line read from
    /// it has been handed out.
    fn is_exhausted(&mut self) -> bool {
        self.poll();
        self.exhausted && self.inbox.is_empty()
    }

    fn info(&self) -> String {
        format!("console({})", self.label)
    }
}
