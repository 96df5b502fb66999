#![allow(dead_code)]

use std::io;

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use stompwire_frame::{mandatory_headers, Command, Frame, ValidatedFrame};
use stompwire_session::{SessionEvent, Transport};

/// Captures everything a session writes.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub written: Vec<u8>,
    pub ended: bool,
    pub destroyed: bool,
}

impl Transport for MemoryTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.written.extend_from_slice(bytes);
        Ok(())
    }

    fn end(&mut self) -> io::Result<()> {
        self.ended = true;
        Ok(())
    }

    fn destroy(&mut self) -> io::Result<()> {
        self.destroyed = true;
        Ok(())
    }
}

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

pub fn word(rng: &mut SmallRng) -> String {
    let len = rng.random_range(2..10);
    (0..len)
        .map(|_| LETTERS[rng.random_range(0..LETTERS.len())] as char)
        .collect()
}

pub fn paragraph(rng: &mut SmallRng) -> String {
    let mut sentences = Vec::new();
    for _ in 0..rng.random_range(1..6) {
        let words: Vec<String> = (0..rng.random_range(3..15)).map(|_| word(rng)).collect();
        sentences.push(format!("{}.", words.join(" ")));
    }
    sentences.join(" ")
}

/// A frame with a random command, its mandatory headers, random extra
/// headers and a random text body.
pub fn random_frame(rng: &mut SmallRng) -> Frame {
    let command = *Command::ALL.choose(rng).expect("command table is not empty");
    let mut frame = Frame::new(command);

    for header in mandatory_headers(command) {
        let value = match *header {
            "accept-version" => "1.1,1.2".to_string(),
            _ => word(rng),
        };
        frame.set_header(*header, value);
    }
    for _ in 0..rng.random_range(0..20) {
        frame.set_header(format!("x-{}", word(rng)), word(rng));
    }
    frame.set_body(paragraph(rng));
    frame
}

/// What the peer decodes for `frame`: the same frame plus the computed
/// `content-length`, validated.
pub fn expected_decode(frame: &Frame) -> ValidatedFrame {
    let mut expected = frame.clone();
    if let Some(body) = frame.body() {
        expected.set_header("content-length", body.len().to_string());
    }
    expected.validate().expect("generated frame should validate")
}

pub fn frames_of(events: impl IntoIterator<Item = SessionEvent>) -> Vec<ValidatedFrame> {
    events
        .into_iter()
        .map(|event| match event {
            SessionEvent::Frame(frame) => frame,
            SessionEvent::Error(err) => panic!("unexpected protocol error: {err}"),
        })
        .collect()
}
