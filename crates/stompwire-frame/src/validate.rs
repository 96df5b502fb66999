//! Semantic validation: mandatory headers, aliasing, and structured header values.

use std::collections::BTreeSet;
use std::fmt;

use crate::command::Command;
use crate::error::{FrameError, Result};
use crate::frame::{Body, Frame};

pub const ACCEPT_VERSION: &str = "accept-version";
pub const HEART_BEAT: &str = "heart-beat";
pub const ACK: &str = "ack";

/// Headers a frame must carry for its command (checked after aliasing).
pub fn mandatory_headers(command: Command) -> &'static [&'static str] {
    match command {
        Command::Connect | Command::Stomp => &["accept-version", "host"],
        Command::Connected => &["version"],
        Command::Send => &["destination"],
        Command::Subscribe => &["destination", "id"],
        Command::Unsubscribe => &["id"],
        Command::Ack | Command::Nack => &["id"],
        Command::Begin | Command::Commit | Command::Abort => &["transaction"],
        Command::Message => &["destination", "message-id", "subscription"],
        Command::Receipt => &["receipt-id"],
        Command::Disconnect | Command::Error => &[],
    }
}

/// Negotiated heartbeat intervals in milliseconds, as `<client>,<server>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeartBeat {
    pub client: u32,
    pub server: u32,
}

impl HeartBeat {
    /// Parse the strict `<digits>,<digits>` grammar.
    pub fn parse(value: &str) -> Option<Self> {
        let (client, server) = value.split_once(',')?;
        Some(Self {
            client: parse_digits(client)?,
            server: parse_digits(server)?,
        })
    }
}

impl fmt::Display for HeartBeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.client, self.server)
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// SUBSCRIBE acknowledgement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckMode {
    Auto,
    Client,
    ClientIndividual,
}

impl AckMode {
    /// Parse an `ack` header value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(AckMode::Auto),
            "client" => Some(AckMode::Client),
            "client-individual" => Some(AckMode::ClientIndividual),
            _ => None,
        }
    }

    /// Wire form of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            AckMode::Auto => "auto",
            AckMode::Client => "client",
            AckMode::ClientIndividual => "client-individual",
        }
    }
}

/// A frame that passed semantic validation.
///
/// Mandatory headers for the command are guaranteed present and exposed
/// through named accessors; structured headers are pre-parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFrame {
    frame: Frame,
    command: Command,
    accept_version: Option<BTreeSet<String>>,
    heart_beat: Option<HeartBeat>,
    ack: Option<AckMode>,
}

impl ValidatedFrame {
    /// Validate a frame, resolving aliases and parsing structured headers.
    pub fn validate(mut frame: Frame) -> Result<Self> {
        let command = frame
            .command()
            .ok_or_else(|| FrameError::UnknownCommand(String::new()))?;

        // Legacy clients acknowledge by message-id.
        if matches!(command, Command::Ack | Command::Nack) && !frame.has_header("id") {
            if let Some(message_id) = frame.header("message-id").map(str::to_string) {
                frame.set_header("id", message_id);
            }
        }

        for &header in mandatory_headers(command) {
            if !frame.has_header(header) {
                return Err(FrameError::MissingMandatoryHeader { header, command });
            }
        }

        let accept_version = frame.header(ACCEPT_VERSION).map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
        });

        let heart_beat = match frame.header(HEART_BEAT) {
            Some(value) if command.is_connect() => {
                Some(HeartBeat::parse(value).ok_or_else(|| invalid(HEART_BEAT, command, value))?)
            }
            _ => None,
        };

        let ack = match frame.header(ACK) {
            Some(value) if command == Command::Subscribe => {
                Some(AckMode::parse(value).ok_or_else(|| invalid(ACK, command, value))?)
            }
            _ => None,
        };

        Ok(Self {
            frame,
            command,
            accept_version,
            heart_beat,
            ack,
        })
    }

    /// The validated command.
    pub fn command(&self) -> Command {
        self.command
    }

    /// The underlying frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Unwrap into the underlying frame.
    pub fn into_frame(self) -> Frame {
        self.frame
    }

    /// First value of header `key`.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.frame.header(key)
    }

    /// The body, if any.
    pub fn body(&self) -> Option<&Body> {
        self.frame.body()
    }

    /// Value of `name` if it is a mandatory header for this command.
    pub fn mandatory_header(&self, name: &str) -> Option<&str> {
        if mandatory_headers(self.command).contains(&name) {
            self.frame.header(name)
        } else {
            None
        }
    }

    /// `destination` (SEND, SUBSCRIBE, MESSAGE).
    pub fn destination(&self) -> Option<&str> {
        self.mandatory_header("destination")
    }

    /// `id` (SUBSCRIBE, UNSUBSCRIBE, ACK, NACK).
    pub fn id(&self) -> Option<&str> {
        self.mandatory_header("id")
    }

    /// `host` (CONNECT, STOMP).
    pub fn host(&self) -> Option<&str> {
        self.mandatory_header("host")
    }

    /// `version` (CONNECTED).
    pub fn version(&self) -> Option<&str> {
        self.mandatory_header("version")
    }

    /// `transaction` (BEGIN, COMMIT, ABORT).
    pub fn transaction(&self) -> Option<&str> {
        self.mandatory_header("transaction")
    }

    /// `message-id` (MESSAGE).
    pub fn message_id(&self) -> Option<&str> {
        self.mandatory_header("message-id")
    }

    /// `subscription` (MESSAGE).
    pub fn subscription(&self) -> Option<&str> {
        self.mandatory_header("subscription")
    }

    /// `receipt-id` (RECEIPT).
    pub fn receipt_id(&self) -> Option<&str> {
        self.mandatory_header("receipt-id")
    }

    /// Accepted protocol versions from `accept-version`.
    pub fn accept_version(&self) -> Option<&BTreeSet<String>> {
        self.accept_version.as_ref()
    }

    /// Parsed `heart-beat` (CONNECT, STOMP and CONNECTED only).
    pub fn heart_beat(&self) -> Option<HeartBeat> {
        self.heart_beat
    }

    /// Parsed `ack` mode (SUBSCRIBE only).
    pub fn ack_mode(&self) -> Option<AckMode> {
        self.ack
    }
}

impl Frame {
    /// Run semantic validation, consuming the frame.
    pub fn validate(self) -> Result<ValidatedFrame> {
        ValidatedFrame::validate(self)
    }
}

impl From<ValidatedFrame> for Frame {
    fn from(value: ValidatedFrame) -> Self {
        value.frame
    }
}

fn invalid(header: &str, command: Command, value: &str) -> FrameError {
    FrameError::InvalidHeaderValue {
        header: header.to_string(),
        command,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_missing_id_is_rejected() {
        let frame = Frame::new(Command::Subscribe).with_header("destination", "/queue/a");
        let err = frame.validate().unwrap_err();
        assert!(matches!(
            err,
            FrameError::MissingMandatoryHeader {
                header: "id",
                command: Command::Subscribe
            }
        ));
    }

    #[test]
    fn subscribe_with_destination_and_id_validates() {
        let frame = Frame::new(Command::Subscribe)
            .with_header("destination", "/queue/a")
            .with_header("id", "sub-0");
        let valid = frame.validate().unwrap();

        assert_eq!(valid.destination(), Some("/queue/a"));
        assert_eq!(valid.id(), Some("sub-0"));
        assert_eq!(valid.ack_mode(), None);
    }

    #[test]
    fn ack_aliases_message_id_to_id() {
        let valid = Frame::new(Command::Ack)
            .with_header("message-id", "m-42")
            .validate()
            .unwrap();
        assert_eq!(valid.id(), Some("m-42"));
        assert_eq!(valid.header("id"), Some("m-42"));
    }

    #[test]
    fn nack_prefers_explicit_id() {
        let valid = Frame::new(Command::Nack)
            .with_header("id", "a")
            .with_header("message-id", "b")
            .validate()
            .unwrap();
        assert_eq!(valid.id(), Some("a"));
    }

    #[test]
    fn alias_only_applies_to_ack_and_nack() {
        let err = Frame::new(Command::Unsubscribe)
            .with_header("message-id", "m")
            .validate()
            .unwrap_err();
        assert!(matches!(err, FrameError::MissingMandatoryHeader { header: "id", .. }));
    }

    #[test]
    fn every_command_requires_its_table() {
        for cmd in Command::ALL {
            let mut frame = Frame::new(cmd);
            for header in mandatory_headers(cmd) {
                frame.set_header(*header, "v");
            }
            if cmd.is_connect() {
                frame.set_header(HEART_BEAT, "0,0");
            }
            assert!(frame.clone().validate().is_ok(), "{cmd} should validate");

            if let Some(first) = mandatory_headers(cmd).first() {
                frame.remove_header(first);
                assert!(frame.validate().is_err(), "{cmd} without {first}");
            }
        }
    }

    #[test]
    fn accept_version_becomes_set() {
        let valid = Frame::new(Command::Connect)
            .with_header("accept-version", "1.0, 1.1 ,1.2,1.2")
            .with_header("host", "localhost")
            .validate()
            .unwrap();

        let versions = valid.accept_version().unwrap();
        assert_eq!(versions.len(), 3);
        assert!(versions.contains("1.1"));
        assert!(!versions.contains("2.0"));
        assert_eq!(valid.host(), Some("localhost"));
    }

    #[test]
    fn heart_beat_parsed_for_connect_family() {
        let valid = Frame::new(Command::Connected)
            .with_header("version", "1.2")
            .with_header("heart-beat", "1000,5000")
            .validate()
            .unwrap();
        assert_eq!(
            valid.heart_beat(),
            Some(HeartBeat {
                client: 1000,
                server: 5000
            })
        );
    }

    #[test]
    fn malformed_heart_beat_rejected() {
        for bad in ["1000", "a,b", "1, 2", ",5", "1,2,3", "-1,0", "99999999999,0"] {
            let err = Frame::new(Command::Stomp)
                .with_header("accept-version", "1.2")
                .with_header("host", "h")
                .with_header("heart-beat", bad)
                .validate()
                .unwrap_err();
            match err {
                FrameError::InvalidHeaderValue {
                    header, command, ..
                } => {
                    assert_eq!(header, "heart-beat");
                    assert_eq!(command, Command::Stomp);
                }
                other => panic!("unexpected error for {bad:?}: {other}"),
            }
        }
    }

    #[test]
    fn heart_beat_ignored_outside_connect_family() {
        let valid = Frame::new(Command::Send)
            .with_header("destination", "/q")
            .with_header("heart-beat", "garbage")
            .validate()
            .unwrap();
        assert_eq!(valid.heart_beat(), None);
    }

    #[test]
    fn subscribe_ack_modes() {
        for (raw, mode) in [
            ("auto", AckMode::Auto),
            ("client", AckMode::Client),
            ("client-individual", AckMode::ClientIndividual),
        ] {
            let valid = Frame::new(Command::Subscribe)
                .with_header("destination", "/q")
                .with_header("id", "1")
                .with_header("ack", raw)
                .validate()
                .unwrap();
            assert_eq!(valid.ack_mode(), Some(mode));
            assert_eq!(mode.as_str(), raw);
        }

        let err = Frame::new(Command::Subscribe)
            .with_header("destination", "/q")
            .with_header("id", "1")
            .with_header("ack", "sometimes")
            .validate()
            .unwrap_err();
        assert!(matches!(err, FrameError::InvalidHeaderValue { ref header, .. } if header == "ack"));
    }

    #[test]
    fn accessors_answer_only_for_mandatory_headers() {
        let valid = Frame::new(Command::Send)
            .with_header("destination", "/q")
            .with_header("id", "not-mandatory-here")
            .validate()
            .unwrap();
        assert_eq!(valid.destination(), Some("/q"));
        assert_eq!(valid.id(), None);
        assert_eq!(valid.header("id"), Some("not-mandatory-here"));
    }

    #[test]
    fn frame_without_command_fails_validation() {
        let err = Frame::default().validate().unwrap_err();
        assert!(matches!(err, FrameError::UnknownCommand(_)));
    }

    #[test]
    fn heart_beat_display_roundtrip() {
        let hb = HeartBeat {
            client: 10,
            server: 20,
        };
        assert_eq!(HeartBeat::parse(&hb.to_string()), Some(hb));
    }
}
