use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::codec::encode_frame;
use crate::command::Command;
use crate::error::Result;

/// Header carrying the body's byte length.
pub const CONTENT_LENGTH: &str = "content-length";
/// Header carrying the body's media type.
pub const CONTENT_TYPE: &str = "content-type";

/// A frame body: UTF-8 text or opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Body {
    Text(String),
    Binary(Bytes),
}

impl Body {
    /// Type raw received bytes according to the frame's `content-type`.
    ///
    /// `text/*`, `application/json` and an absent content type decode as
    /// (lossy) UTF-8 text; anything else stays binary.
    pub fn from_wire(raw: Bytes, content_type: Option<&str>) -> Self {
        let textual = match content_type {
            None => true,
            Some(ct) => ct.starts_with("text/") || ct.starts_with("application/json"),
        };
        if !textual {
            return Body::Binary(raw);
        }
        match String::from_utf8(raw.to_vec()) {
            Ok(text) => Body::Text(text),
            Err(err) => Body::Text(String::from_utf8_lossy(err.as_bytes()).into_owned()),
        }
    }

    /// The body's wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(text) => text.as_bytes(),
            Body::Binary(bytes) => bytes.as_ref(),
        }
    }

    /// The body as text, if it was typed as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            Body::Binary(_) => None,
        }
    }

    /// Whether this is a text body.
    pub fn is_text(&self) -> bool {
        matches!(self, Body::Text(_))
    }

    /// Byte length on the wire.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the body has no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Binary(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Binary(Bytes::from(value))
    }
}

impl From<&[u8]> for Body {
    fn from(value: &[u8]) -> Self {
        Body::Binary(Bytes::copy_from_slice(value))
    }
}

/// One STOMP message: command, headers, optional body.
///
/// Header values are held unescaped; escaping happens only at the wire
/// boundary. Headers keep insertion order so encoding is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    command: Option<Command>,
    headers: Vec<(String, String)>,
    body: Option<Body>,
}

impl Frame {
    /// Create a frame with a command and no headers or body.
    pub fn new(command: Command) -> Self {
        Self {
            command: Some(command),
            ..Self::default()
        }
    }

    /// An ERROR frame whose `message` header and body both carry `message`.
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(Command::Error)
            .with_header("message", message.clone())
            .with_body(message)
    }

    /// Set the command from its wire token.
    ///
    /// Fails with [`FrameError::UnknownCommand`](crate::FrameError::UnknownCommand)
    /// and leaves the frame untouched when the token is not a STOMP verb.
    pub fn set_command(&mut self, value: &str) -> Result<()> {
        self.command = Some(value.parse()?);
        Ok(())
    }

    /// Set the command directly.
    pub fn set_command_kind(&mut self, command: Command) {
        self.command = Some(command);
    }

    /// The command, or `None` for a freshly constructed empty frame.
    pub fn command(&self) -> Option<Command> {
        self.command
    }

    /// Set a header, replacing any existing value for the same name in place.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.headers.push((key, value)),
        }
    }

    /// First value of header `key`.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether header `key` is present.
    pub fn has_header(&self, key: &str) -> bool {
        self.header(key).is_some()
    }

    /// Remove a header, returning its value.
    pub fn remove_header(&mut self, key: &str) -> Option<String> {
        let idx = self.headers.iter().position(|(k, _)| k == key)?;
        Some(self.headers.remove(idx).1)
    }

    /// Headers in insertion order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers.
    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    /// The `content-type` header, which selects text or binary bodies.
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// Attach a body.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
    }

    /// The body, if any.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Detach and return the body.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Drop the body.
    pub fn clear_body(&mut self) {
        self.body = None;
    }

    /// Builder-style [`set_header`](Self::set_header).
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(key, value);
        self
    }

    /// Builder-style [`set_body`](Self::set_body).
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.set_body(body);
        self
    }

    /// Serialize to a standalone buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        encode_frame(self, &mut buf)?;
        Ok(buf.freeze())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.command {
            Some(cmd) => writeln!(f, "{cmd}")?,
            None => writeln!(f, "<no command>")?,
        }
        for (k, v) in &self.headers {
            writeln!(f, "{k}: {v}")?;
        }
        match &self.body {
            Some(body) if body.is_text() => write!(f, "body: text ({} bytes)", body.len()),
            Some(body) => write!(f, "body: binary ({} bytes)", body.len()),
            None => write!(f, "body: none"),
        }
    }
}
