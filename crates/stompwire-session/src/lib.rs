//! Per-connection STOMP session management.
//!
//! A [`Session`] binds a frame parser to one connection: feed it raw chunks
//! as they arrive, pull decoded frames and protocol errors out of its event
//! queue, and send frames back through its [`Transport`].

pub mod error;
pub mod session;
pub mod transport;

pub use error::{Result, SessionError};
pub use session::{
    ErrorPolicy, Lifecycle, Session, SessionConfig, SessionEvent, DEFAULT_READ_CHUNK_SIZE,
};
pub use transport::Transport;
