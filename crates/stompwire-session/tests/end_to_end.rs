mod common;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use stompwire_frame::Frame;
use stompwire_session::{ErrorPolicy, Session, SessionConfig};

use common::{expected_decode, frames_of, random_frame, MemoryTransport};

fn encode_all(frames: &[Frame]) -> Vec<u8> {
    let mut sender = Session::new(MemoryTransport::default());
    for frame in frames {
        sender.send(frame).expect("frame should encode");
    }
    sender.into_transport().written
}

fn receiver() -> Session<MemoryTransport> {
    Session::with_config(
        MemoryTransport::default(),
        SessionConfig {
            error_policy: ErrorPolicy::Report,
            ..SessionConfig::default()
        },
    )
}

#[test]
fn random_frames_survive_random_chunking() {
    let mut rng = SmallRng::seed_from_u64(0x5707_1111);
    let originals: Vec<Frame> = (0..1111).map(|_| random_frame(&mut rng)).collect();
    let wire = encode_all(&originals);

    let mut session = receiver();
    let mut decoded = Vec::new();
    let mut offset = 0;
    while offset < wire.len() {
        let len = rng.random_range(1..=512).min(wire.len() - offset);
        session
            .receive(&wire[offset..offset + len])
            .expect("receive should succeed");
        decoded.extend(frames_of(session.drain_events()));
        offset += len;
    }

    assert_eq!(decoded.len(), 1111);
    for (got, original) in decoded.iter().zip(&originals) {
        assert_eq!(*got, expected_decode(original));
    }
    assert_eq!(session.parser().buffered_len(), 0);
}

#[test]
fn chunked_and_whole_delivery_agree() {
    let mut rng = SmallRng::seed_from_u64(42);
    let originals: Vec<Frame> = (0..64).map(|_| random_frame(&mut rng)).collect();
    let wire = encode_all(&originals);

    let mut whole = receiver();
    whole.receive(&wire).unwrap();
    let expected = frames_of(whole.drain_events());

    for seed in 0..8u64 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut session = receiver();
        let mut got = Vec::new();
        let mut rest = wire.as_slice();
        while !rest.is_empty() {
            let len = rng.random_range(1..=rest.len().min(7));
            let (chunk, tail) = rest.split_at(len);
            session.receive(chunk).unwrap();
            got.extend(frames_of(session.drain_events()));
            rest = tail;
        }
        assert_eq!(got, expected, "seed {seed}");
    }
}

#[test]
fn heartbeats_between_frames_are_ignored() {
    let mut rng = SmallRng::seed_from_u64(7);
    let originals: Vec<Frame> = (0..10).map(|_| random_frame(&mut rng)).collect();

    let mut sender = Session::new(MemoryTransport::default());
    for frame in &originals {
        sender.ping().unwrap();
        sender.send(frame).unwrap();
        sender.ping().unwrap();
    }
    let wire = sender.into_transport().written;

    let mut session = receiver();
    session.receive(&wire).unwrap();
    let decoded = frames_of(session.drain_events());

    assert_eq!(decoded.len(), originals.len());
    assert_eq!(session.parser().heartbeats_seen(), 20);
}
