//! STOMP wire protocol over any ordered byte stream.
//!
//! # Crate Structure
//!
//! - [`frame`]: Frame model, header escaping, wire encoding, incremental parser
//! - [`session`]: Per-connection session with error policy and lifecycle
//!
//! ```
//! use stompwire::frame::{Command, Frame, FrameParser};
//!
//! let wire = Frame::new(Command::Send)
//!     .with_header("destination", "/queue/a")
//!     .with_body("hello")
//!     .to_bytes()
//!     .unwrap();
//!
//! let mut parser = FrameParser::new();
//! parser.extend_from_slice(&wire[..7]);
//! assert!(parser.next_frame().unwrap().is_none());
//! parser.extend_from_slice(&wire[7..]);
//! let frame = parser.next_frame().unwrap().unwrap();
//! assert_eq!(frame.destination(), Some("/queue/a"));
//! ```

/// Re-export frame types.
pub mod frame {
    pub use stompwire_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use stompwire_session::*;
}

pub use stompwire_frame::{Body, Command, Frame, FrameError, FrameParser, ValidatedFrame};
pub use stompwire_session::{
    ErrorPolicy, Lifecycle, Session, SessionConfig, SessionError, SessionEvent,
};
