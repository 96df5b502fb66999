//! Incremental frame parser.
//!
//! State machine over an owned, growable buffer with a read cursor:
//!
//! ```text
//! Init -> Headers -> BodyDecide -> BodyByLength | BodyUntilNul -> (emit) -> Init
//! ```
//!
//! Bytes are only dropped from the buffer once a frame (or an error)
//! resolves, so a frame split across any number of chunks parses exactly
//! as if it had arrived whole.

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::codec::FrameConfig;
use crate::command::Command;
use crate::error::{FrameError, Result};
use crate::escape::unescape;
use crate::frame::{Body, Frame, CONTENT_LENGTH};
use crate::validate::ValidatedFrame;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Current position within one frame's grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for a command line; blank lines are skipped.
    Init,
    /// Reading header lines until a blank line.
    Headers(Command),
    /// Headers closed; choosing the body termination strategy.
    BodyDecide(Command),
    /// Body sized by `content-length`, followed by NUL.
    BodyByLength { command: Command, len: usize },
    /// Body terminated by the first NUL.
    BodyUntilNul(Command),
}

/// Reassembles frames from arbitrarily chunked input.
pub struct FrameParser {
    buf: BytesMut,
    cursor: usize,
    stage: Stage,
    in_frame: Frame,
    /// Offset up to which the buffer is known to hold no NUL.
    nul_scan: usize,
    heartbeats: u64,
    config: FrameConfig,
}

impl FrameParser {
    /// Create a parser with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a parser with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            cursor: 0,
            stage: Stage::Init,
            in_frame: Frame::default(),
            nul_scan: 0,
            heartbeats: 0,
            config,
        }
    }

    /// Append received bytes. Does not parse.
    pub fn extend_from_slice(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Advance the state machine until a frame completes or more input is needed.
    ///
    /// Returns `Ok(None)` when the buffered bytes do not complete a frame.
    /// On error the parser has already been reset: buffered input is
    /// discarded and the next byte is expected to start a new frame.
    pub fn next_frame(&mut self) -> Result<Option<ValidatedFrame>> {
        loop {
            match self.stage {
                Stage::Init => {
                    let Some(line) = self.read_line() else {
                        return self.need_more();
                    };
                    if line.is_empty() {
                        self.heartbeats += 1;
                        self.commit();
                        trace!("heartbeat line");
                        continue;
                    }
                    let command = match line.parse::<Command>() {
                        Ok(command) => command,
                        Err(err) => return Err(self.fail(err)),
                    };
                    self.in_frame.set_command_kind(command);
                    self.stage = Stage::Headers(command);
                    trace!(%command, "command line read");
                }
                Stage::Headers(command) => {
                    let Some(line) = self.read_line() else {
                        return self.need_more();
                    };
                    if line.is_empty() {
                        self.stage = Stage::BodyDecide(command);
                    } else {
                        self.add_header_line(&line);
                    }
                }
                Stage::BodyDecide(command) => {
                    let declared = self.in_frame.header(CONTENT_LENGTH).map(str::to_string);
                    self.stage = match declared {
                        Some(raw) => {
                            let len = match raw.parse::<usize>() {
                                Ok(len) => len,
                                Err(_) => {
                                    let err = FrameError::InvalidHeaderValue {
                                        header: CONTENT_LENGTH.to_string(),
                                        command,
                                        value: raw,
                                    };
                                    return Err(self.fail(err));
                                }
                            };
                            // Head, body and NUL must fit in one frame budget.
                            let size = self.cursor.saturating_add(len).saturating_add(1);
                            if size > self.config.max_frame_size {
                                let err = FrameError::FrameTooLarge {
                                    size,
                                    max: self.config.max_frame_size,
                                };
                                return Err(self.fail(err));
                            }
                            Stage::BodyByLength { command, len }
                        }
                        None => {
                            self.nul_scan = self.cursor;
                            Stage::BodyUntilNul(command)
                        }
                    };
                    trace!(stage = ?self.stage, "body strategy chosen");
                }
                Stage::BodyByLength { command, len } => {
                    // `len` body bytes plus the NUL.
                    if self.buf.len() - self.cursor <= len {
                        return Ok(None);
                    }
                    if self.buf[self.cursor + len] != 0 {
                        return Err(self.fail(FrameError::MissingTerminator { command }));
                    }
                    return self.complete(len, true);
                }
                Stage::BodyUntilNul(_) => {
                    match self.buf[self.nul_scan..].iter().position(|&b| b == 0) {
                        Some(rel) => {
                            let len = self.nul_scan + rel - self.cursor;
                            let size = self.cursor + len + 1;
                            if size > self.config.max_frame_size {
                                let err = FrameError::FrameTooLarge {
                                    size,
                                    max: self.config.max_frame_size,
                                };
                                return Err(self.fail(err));
                            }
                            return self.complete(len, false);
                        }
                        None => {
                            self.nul_scan = self.buf.len();
                            return self.need_more();
                        }
                    }
                }
            }
        }
    }

    /// Iterate over every frame the buffered bytes complete.
    ///
    /// The iterator ends when more input is needed, or right after yielding
    /// an error.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames {
            parser: self,
            done: false,
        }
    }

    /// Discard all buffered input and any partially assembled frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.cursor = 0;
        self.nul_scan = 0;
        self.stage = Stage::Init;
        self.in_frame = Frame::default();
    }

    /// Current grammar stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Bytes held for the frame in progress.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Blank keep-alive lines seen between frames.
    pub fn heartbeats_seen(&self) -> u64 {
        self.heartbeats
    }

    /// Active parser limits.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Update maximum frame size for subsequent parsing.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.config.max_frame_size = max_frame_size;
    }

    /// Read one LF-terminated, trimmed line starting at the cursor.
    fn read_line(&mut self) -> Option<String> {
        let rel = self.buf[self.cursor..].iter().position(|&b| b == b'\n')?;
        let raw = &self.buf[self.cursor..self.cursor + rel];
        let line = String::from_utf8_lossy(raw).trim().to_string();
        self.cursor += rel + 1;
        Some(line)
    }

    fn add_header_line(&mut self, line: &str) {
        let Some((key, value)) = line.split_once(':') else {
            trace!(line, "ignoring header line without separator");
            return;
        };
        let key = unescape(key.trim());
        let value = unescape(value.trim());
        self.in_frame.set_header(key.into_owned(), value.into_owned());
    }

    /// Slice the body, drop the consumed prefix, validate and emit.
    fn complete(&mut self, body_len: usize, sized: bool) -> Result<Option<ValidatedFrame>> {
        self.buf.advance(self.cursor);
        let raw = self.buf.split_to(body_len).freeze();
        self.buf.advance(1);
        self.cursor = 0;
        self.nul_scan = 0;
        self.stage = Stage::Init;

        let mut frame = std::mem::take(&mut self.in_frame);
        if sized || !raw.is_empty() {
            let body = Body::from_wire(raw, frame.content_type());
            frame.set_body(body);
        }

        match frame.validate() {
            Ok(valid) => {
                debug!(
                    command = %valid.command(),
                    headers = valid.frame().header_count(),
                    body_len,
                    "frame decoded"
                );
                Ok(Some(valid))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Wait for input while the frame's terminator has not been seen.
    ///
    /// Every buffered byte belongs to the frame in progress here, and the
    /// frame needs at least one more byte, so a full buffer already exceeds
    /// the limit.
    fn need_more(&mut self) -> Result<Option<ValidatedFrame>> {
        if !self.buf.is_empty() && self.buf.len() >= self.config.max_frame_size {
            let err = FrameError::FrameTooLarge {
                size: self.buf.len() + 1,
                max: self.config.max_frame_size,
            };
            return Err(self.fail(err));
        }
        Ok(None)
    }

    fn commit(&mut self) {
        self.buf.advance(self.cursor);
        self.cursor = 0;
    }

    fn fail(&mut self, err: FrameError) -> FrameError {
        debug!(error = %err, buffered = self.buf.len(), "frame parse failed, resetting");
        self.reset();
        err
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameParser")
            .field("stage", &self.stage)
            .field("buffered", &self.buf.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// Iterator returned by [`FrameParser::frames`].
pub struct Frames<'a> {
    parser: &'a mut FrameParser,
    done: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<ValidatedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parser.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
