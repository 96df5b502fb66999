use crate::command::Command;

/// Errors that can occur while building, encoding, or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The command token is not one of the STOMP verbs.
    #[error("unrecognized STOMP command {0}")]
    UnknownCommand(String),

    /// A header required by the frame's command is absent.
    #[error("missing mandatory header {header} in {command} frame")]
    MissingMandatoryHeader {
        header: &'static str,
        command: Command,
    },

    /// A structurally-constrained header holds a value outside its grammar.
    #[error("invalid value for header {header} in {command} frame: {value:?}")]
    InvalidHeaderValue {
        header: String,
        command: Command,
        value: String,
    },

    /// A `content-length` body was not followed by the NUL terminator.
    #[error("missing NUL terminator after {command} frame body")]
    MissingTerminator { command: Command },

    /// The in-flight frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error surfaced through a codec adapter.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
