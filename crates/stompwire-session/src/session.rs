//! Per-connection session over a byte transport.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::time::Instant;

use bytes::BytesMut;
use stompwire_frame::{
    encode_frame, Frame, FrameConfig, FrameError, FrameParser, ValidatedFrame, HEARTBEAT,
};
use tracing::{debug, trace, warn};

use crate::error::{Result, SessionError};
use crate::transport::Transport;

/// Default size of one blocking read in [`Session::read_from`]: 8 KiB.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// What a session does with a protocol error found in inbound data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Queue a [`SessionEvent::Error`] and keep the connection open.
    Report,
    /// Send an ERROR frame carrying the error text, then end the connection.
    #[default]
    Reply,
}

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Protocol error handling. Default: [`ErrorPolicy::Reply`].
    pub error_policy: ErrorPolicy,
    /// Parser limits.
    pub frame: FrameConfig,
    /// Buffer size for each read in [`Session::read_from`].
    pub read_chunk_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::default(),
            frame: FrameConfig::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

/// Something the session observed on the inbound stream.
#[derive(Debug)]
pub enum SessionEvent {
    /// A fully decoded, validated frame.
    Frame(ValidatedFrame),
    /// A protocol error (only under [`ErrorPolicy::Report`]).
    Error(FrameError),
}

/// Connection lifecycle as driven by [`Session::end`] and [`Session::destroy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Reading and writing.
    Open,
    /// Gracefully closed; the transport may still deliver inbound bytes.
    Ended,
    /// Torn down immediately.
    Destroyed,
}

/// One STOMP connection.
///
/// Inbound chunks go through [`receive`](Self::receive) (or
/// [`read_from`](Self::read_from)); every frame they complete is queued, in
/// arrival order, before the call returns.
pub struct Session<T> {
    transport: T,
    parser: FrameParser,
    events: VecDeque<SessionEvent>,
    write_buf: BytesMut,
    read_buf: Vec<u8>,
    error_policy: ErrorPolicy,
    last_read: Instant,
    last_write: Instant,
    lifecycle: Lifecycle,
}

impl<T: Transport> Session<T> {
    /// Create a session with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        let now = Instant::now();
        Self {
            transport,
            parser: FrameParser::with_config(config.frame),
            events: VecDeque::new(),
            write_buf: BytesMut::new(),
            read_buf: vec![0u8; config.read_chunk_size.max(1)],
            error_policy: config.error_policy,
            last_read: now,
            last_write: now,
            lifecycle: Lifecycle::Open,
        }
    }

    /// Feed one inbound chunk and decode every frame it completes.
    ///
    /// Returns the number of events queued by this chunk.
    pub fn receive(&mut self, chunk: &[u8]) -> Result<usize> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        self.last_read = Instant::now();
        self.parser.extend_from_slice(chunk);
        trace!(len = chunk.len(), buffered = self.parser.buffered_len(), "chunk received");

        let before = self.events.len();
        loop {
            match self.parser.next_frame() {
                Ok(Some(frame)) => self.events.push_back(SessionEvent::Frame(frame)),
                Ok(None) => break,
                Err(err) => {
                    self.on_protocol_error(err)?;
                    break;
                }
            }
        }
        Ok(self.events.len() - before)
    }

    /// Perform one blocking read from `reader` and feed the data.
    ///
    /// Returns the number of bytes read; `0` means the peer closed the stream.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<usize> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        let read = loop {
            match reader.read(&mut self.read_buf) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(SessionError::Io(err)),
            }
        };
        if read == 0 {
            debug!("peer closed the stream");
            return Ok(0);
        }

        let chunk = std::mem::take(&mut self.read_buf);
        let result = self.receive(&chunk[..read]);
        self.read_buf = chunk;
        result.map(|_| read)
    }

    /// Encode and write a frame.
    pub fn send(&mut self, frame: &Frame) -> Result<()> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        self.write_buf.clear();
        encode_frame(frame, &mut self.write_buf)?;
        self.transport.write(&self.write_buf)?;
        self.last_write = Instant::now();
        debug!(command = ?frame.command(), bytes = self.write_buf.len(), "frame sent");
        Ok(())
    }

    /// Send an ERROR frame whose `message` header and body carry `message`.
    pub fn send_error(&mut self, message: impl Into<String>) -> Result<()> {
        self.send(&Frame::error(message))
    }

    /// Write a bare line-feed keep-alive.
    pub fn ping(&mut self) -> Result<()> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        self.transport.write(HEARTBEAT)?;
        self.last_write = Instant::now();
        trace!("heartbeat sent");
        Ok(())
    }

    /// Gracefully close the connection. No-op once ended or destroyed.
    pub fn end(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.lifecycle = Lifecycle::Ended;
        self.parser.reset();
        debug!("ending session");
        self.transport.end()?;
        Ok(())
    }

    /// Immediately close the connection.
    ///
    /// Still reaches the transport after [`end`](Self::end), so an ended
    /// session can be torn down fully. No-op once destroyed.
    pub fn destroy(&mut self) -> Result<()> {
        if self.lifecycle == Lifecycle::Destroyed {
            return Ok(());
        }
        self.lifecycle = Lifecycle::Destroyed;
        self.parser.reset();
        debug!("destroying session");
        self.transport.destroy()?;
        Ok(())
    }

    /// Pop the oldest queued event.
    pub fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = SessionEvent> + '_ {
        self.events.drain(..)
    }

    /// Number of queued events.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// When inbound data last arrived.
    pub fn last_read(&self) -> Instant {
        self.last_read
    }

    /// When outbound data was last written.
    pub fn last_write(&self) -> Instant {
        self.last_write
    }

    /// Current protocol error policy.
    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Change the protocol error policy for subsequent input.
    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.error_policy = policy;
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether the session was ended or destroyed.
    pub fn is_closed(&self) -> bool {
        self.lifecycle != Lifecycle::Open
    }

    /// The frame parser, for inspection.
    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session and return the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn on_protocol_error(&mut self, err: FrameError) -> Result<()> {
        match self.error_policy {
            ErrorPolicy::Report => {
                warn!(error = %err, "protocol error");
                self.events.push_back(SessionEvent::Error(err));
                Ok(())
            }
            ErrorPolicy::Reply => {
                warn!(error = %err, "protocol error, replying with ERROR frame and closing");
                let sent = self.send_error(err.to_string());
                let closed = match sent {
                    Ok(()) => self.end(),
                    Err(_) => self.destroy(),
                };
                sent.and(closed)
            }
        }
    }
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("parser", &self.parser)
            .field("pending_events", &self.events.len())
            .field("error_policy", &self.error_policy)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
