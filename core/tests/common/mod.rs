//! Helpers for driving the protocol engine without sockets

#![allow(dead_code)]

use relayircd_core::{ClientId, Config, Server};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const PASSWORD: &str = "secret";

/// Default test configuration
pub fn config() -> Config {
    let mut config = Config::default();
    config.server.name = "irc.test".to_string();
    config.connection.bind_address = "127.0.0.1".to_string();
    config.connection.port = 0;
    config.security.password = Some(PASSWORD.to_string());
    config
}

pub fn server() -> Server {
    Server::new(config())
}

/// One fake connection: its id and the receiving end of its outbox
pub struct TestClient {
    pub id: ClientId,
    rx: mpsc::Receiver<Arc<str>>,
}

impl TestClient {
    /// Everything queued for this client so far, CRLF stripped
    pub fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.rx.try_recv() {
            lines.push(line.trim_end_matches("\r\n").to_string());
        }
        lines
    }

    /// Whether the engine dropped its end of the outbox
    pub fn is_closed(&mut self) -> bool {
        matches!(
            self.rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        )
    }
}

/// Accept a connection with the default outbox capacity
pub fn connect(server: &mut Server) -> TestClient {
    connect_with_capacity(server, 64)
}

pub fn connect_with_capacity(server: &mut Server, capacity: usize) -> TestClient {
    let (tx, rx) = mpsc::channel(capacity);
    let id = Uuid::new_v4();
    let addr: SocketAddr = "127.0.0.1:50000".parse().unwrap();
    server.accept(id, addr, tx).expect("accept");
    TestClient { id, rx }
}

/// Feed one line, terminated with CRLF
pub fn send(server: &mut Server, client: &TestClient, line: &str) {
    server.receive(client.id, format!("{}\r\n", line).as_bytes());
}

/// Connect and register with `nick` (username `u<nick>`), discarding replies
pub fn register(server: &mut Server, nick: &str) -> TestClient {
    let mut client = connect(server);
    send(server, &client, &format!("PASS {}", PASSWORD));
    send(server, &client, &format!("NICK {}", nick));
    send(server, &client, &format!("USER u{} 0 * :Test User", nick));
    let lines = client.drain();
    assert!(
        lines.iter().any(|l| code(l) == Some("001")),
        "registration failed: {:?}",
        lines
    );
    client
}

/// Register and join `channel`, discarding replies
pub fn register_in(server: &mut Server, nick: &str, channel: &str) -> TestClient {
    let mut client = register(server, nick);
    send(server, &client, &format!("JOIN {}", channel));
    client.drain();
    client
}

/// Numeric code of a server reply line, if it is one
pub fn code(line: &str) -> Option<&str> {
    let mut parts = line.split(' ');
    let _prefix = parts.next()?;
    let code = parts.next()?;
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_digit()) {
        Some(code)
    } else {
        None
    }
}

/// Numeric codes of all reply lines
pub fn codes(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|l| code(l).map(str::to_string))
        .collect()
}
