//! `tokio_util::codec` adapter over [`FrameParser`].

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::parser::FrameParser;
use crate::validate::ValidatedFrame;

/// Codec for `FramedRead` / `FramedWrite`.
///
/// Decoding moves every received byte into the inner parser, so protocol
/// errors surface as stream items and leave the parser reset.
#[derive(Debug, Default)]
pub struct StompCodec {
    parser: FrameParser,
}

impl StompCodec {
    /// Create a codec with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit limits.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            parser: FrameParser::with_config(config),
        }
    }

    /// The inner parser, for inspection.
    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }
}

impl Decoder for StompCodec {
    type Item = ValidatedFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<ValidatedFrame>> {
        if !src.is_empty() {
            let chunk = src.split();
            self.parser.extend_from_slice(&chunk);
        }
        self.parser.next_frame()
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<ValidatedFrame>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if self.parser.buffered_len() == 0 => Ok(None),
            None => Err(FrameError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed (incomplete frame)",
            ))),
        }
    }
}

impl Encoder<Frame> for StompCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<()> {
        encode_frame(&frame, dst)
    }
}

impl Encoder<&Frame> for StompCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: &Frame, dst: &mut BytesMut) -> Result<()> {
        encode_frame(frame, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::command::Command;

    #[tokio::test]
    async fn frames_roundtrip_over_duplex() {
        let (client, server) = tokio::io::duplex(64);
        let mut writer = FramedWrite::new(client, StompCodec::new());
        let mut reader = FramedRead::new(server, StompCodec::new());

        let sent = Frame::new(Command::Send)
            .with_header("destination", "/queue/a")
            .with_body("x".repeat(500));
        let writer_task = tokio::spawn(async move {
            writer.send(sent).await.unwrap();
            writer
                .send(Frame::new(Command::Disconnect))
                .await
                .unwrap();
        });

        let first = reader.next().await.unwrap().unwrap();
        assert_eq!(first.destination(), Some("/queue/a"));
        assert_eq!(first.body().unwrap().len(), 500);

        let second = reader.next().await.unwrap().unwrap();
        assert_eq!(second.command(), Command::Disconnect);

        writer_task.await.unwrap();
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn protocol_error_is_a_stream_item() {
        let (mut client, server) = tokio::io::duplex(256);
        let mut reader = FramedRead::new(server, StompCodec::new());

        client.write_all(b"nonvalid\n\n\0").await.unwrap();
        let err = reader.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::UnknownCommand(_)));
    }

    #[tokio::test]
    async fn eof_mid_frame_is_an_error() {
        let (mut client, server) = tokio::io::duplex(256);
        let mut reader = FramedRead::new(server, StompCodec::new());

        client.write_all(b"SEND\ndestination:/q\n\npartial").await.unwrap();
        drop(client);

        let err = reader.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
    }
}
