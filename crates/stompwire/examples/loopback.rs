//! Client and server sessions talking over a socket pair.
//!
//! Run with:
//!   cargo run --example loopback

use std::os::unix::net::UnixStream;
use std::thread;

use stompwire::{Command, ErrorPolicy, Frame, Session, SessionConfig, SessionEvent};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .init();

    let (client_stream, server_stream) = UnixStream::pair()?;

    let server = thread::spawn(move || -> Result<(), stompwire::SessionError> {
        let mut reader = server_stream.try_clone()?;
        let mut session = Session::new(server_stream);

        while session.read_from(&mut reader)? > 0 {
            while let Some(event) = session.next_event() {
                let SessionEvent::Frame(frame) = event else {
                    continue;
                };
                info!(command = %frame.command(), "server received frame");
                match frame.command() {
                    Command::Connect | Command::Stomp => {
                        session.send(
                            &Frame::new(Command::Connected)
                                .with_header("version", "1.2")
                                .with_header("heart-beat", "0,0"),
                        )?;
                    }
                    Command::Send => {
                        let destination = frame.destination().unwrap_or_default().to_string();
                        let mut message = Frame::new(Command::Message)
                            .with_header("destination", destination)
                            .with_header("message-id", "1")
                            .with_header("subscription", "0");
                        if let Some(body) = frame.body() {
                            message.set_body(body.clone());
                        }
                        session.send(&message)?;
                    }
                    Command::Disconnect => {
                        if let Some(receipt) = frame.header("receipt") {
                            let receipt = receipt.to_string();
                            session.send(
                                &Frame::new(Command::Receipt).with_header("receipt-id", receipt),
                            )?;
                        }
                        session.end()?;
                        return Ok(());
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    });

    let mut reader = client_stream.try_clone()?;
    let mut client = Session::with_config(
        client_stream,
        SessionConfig {
            error_policy: ErrorPolicy::Report,
            ..SessionConfig::default()
        },
    );

    client.send(
        &Frame::new(Command::Connect)
            .with_header("accept-version", "1.2")
            .with_header("host", "localhost"),
    )?;
    client.ping()?;
    client.send(
        &Frame::new(Command::Send)
            .with_header("destination", "/queue/echo")
            .with_header("content-type", "text/plain")
            .with_body("hello over stomp"),
    )?;
    client.send(&Frame::new(Command::Disconnect).with_header("receipt", "bye"))?;

    while client.read_from(&mut reader)? > 0 {
        for event in client.drain_events() {
            match event {
                SessionEvent::Frame(frame) => eprintln!("client got:\n{}\n", frame.frame()),
                SessionEvent::Error(err) => eprintln!("client protocol error: {err}"),
            }
        }
    }

    server
        .join()
        .map_err(|_| "server thread panicked")??;
    Ok(())
}
