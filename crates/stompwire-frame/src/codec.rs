use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::escape::escape;
use crate::frame::{Frame, CONTENT_LENGTH};

/// Default maximum size of one in-flight frame: 16 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// A bare line-feed: the keep-alive heartbeat.
pub const HEARTBEAT: &[u8] = b"\n";

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// COMMAND\n
/// name:value\n      (zero or more, escaped)
/// \n
/// body\0
/// ```
///
/// With a body, `content-length` is computed and emitted (overwriting any
/// caller-supplied value in place). Without one, the NUL is the only
/// terminator and no `content-length` is written.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    let command = frame
        .command()
        .ok_or_else(|| FrameError::UnknownCommand(String::new()))?;
    let body = frame.body();
    let content_length = body.map(|b| b.len().to_string());

    dst.reserve(64 + body.map_or(0, |b| b.len()));
    dst.put_slice(command.as_str().as_bytes());
    dst.put_u8(b'\n');

    let mut wrote_length = false;
    for (key, value) in frame.headers() {
        let value = if key == CONTENT_LENGTH {
            match &content_length {
                Some(len) => {
                    wrote_length = true;
                    len.as_str()
                }
                None => continue,
            }
        } else {
            value
        };
        put_header(dst, key, value);
    }
    if let (Some(len), false) = (&content_length, wrote_length) {
        put_header(dst, CONTENT_LENGTH, len);
    }

    dst.put_u8(b'\n');
    if let Some(body) = body {
        dst.put_slice(body.as_bytes());
    }
    dst.put_u8(0);
    Ok(())
}

fn put_header(dst: &mut BytesMut, key: &str, value: &str) {
    dst.put_slice(escape(key).as_bytes());
    dst.put_u8(b':');
    dst.put_slice(escape(value).as_bytes());
    dst.put_u8(b'\n');
}

/// Configuration for frame parsing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum encoded size of one frame: command line, headers, body and
    /// NUL terminator. Leading heartbeat lines are not counted. Default: 16 MiB.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
