//! STOMP frame model, header escaping, and incremental frame parsing.
//!
//! This is the core layer of stompwire. A frame on the wire is:
//! - A command line (`SEND\n`)
//! - Zero or more escaped `name:value\n` header lines
//! - A blank line
//! - The body, terminated by a NUL byte (optionally sized by `content-length`)
//!
//! The parser never blocks: feed it whatever bytes arrived and pull out the
//! frames they complete.

pub mod codec;
pub mod command;
pub mod error;
pub mod escape;
pub mod frame;
pub mod parser;
pub mod validate;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{encode_frame, FrameConfig, DEFAULT_MAX_FRAME_SIZE, HEARTBEAT};
pub use command::Command;
pub use error::{FrameError, Result};
pub use escape::{escape, unescape};
pub use frame::{Body, Frame};
pub use parser::{FrameParser, Frames, Stage};
pub use validate::{mandatory_headers, AckMode, HeartBeat, ValidatedFrame};

#[cfg(feature = "async")]
pub use tokio_codec::StompCodec;
