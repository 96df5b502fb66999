/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] stompwire_frame::FrameError),

    /// An I/O error occurred on the transport.
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session was ended or destroyed.
    #[error("session closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, SessionError>;
