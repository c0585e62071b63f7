//! Per-connection session state

use crate::{Error, Prefix, Result};
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::AbortHandle;
use uuid::Uuid;

/// Unique, never reused identifier of one accepted connection
pub type ClientId = Uuid;

/// Sending half of a session's bounded outbound line queue
pub type Outbox = mpsc::Sender<Arc<str>>;

/// Connection-scoped state of one client
#[derive(Debug)]
pub struct Session {
    /// Connection identifier
    pub id: ClientId,
    /// Peer address
    pub addr: SocketAddr,
    /// Nickname, once NICK succeeded
    pub nickname: Option<String>,
    /// Username from USER
    pub username: Option<String>,
    /// Real name from USER
    pub realname: Option<String>,
    /// Bytes received but not yet terminated by a line feed
    pub inbound: BytesMut,
    /// PASS accepted
    pub sent_pass: bool,
    /// NICK accepted at least once
    pub sent_nick: bool,
    /// USER accepted
    pub sent_user: bool,
    /// Password matched the server password
    pub registered: bool,
    /// Fully registered; may use channel and messaging commands
    pub authenticated: bool,
    /// Connection time
    pub connected_at: DateTime<Utc>,
    outbox: Outbox,
    reader: Option<AbortHandle>,
}

impl Session {
    /// Create a new session for an accepted connection
    pub fn new(id: ClientId, addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            id,
            addr,
            nickname: None,
            username: None,
            realname: None,
            inbound: BytesMut::new(),
            sent_pass: false,
            sent_nick: false,
            sent_user: false,
            registered: false,
            authenticated: false,
            connected_at: Utc::now(),
            outbox,
            reader: None,
        }
    }

    /// Queue one serialized line for the writer task.
    ///
    /// Never waits: a full queue means the peer is not draining its socket.
    pub fn send(&self, line: Arc<str>) -> Result<()> {
        self.outbox.try_send(line).map_err(|e| match e {
            TrySendError::Full(_) => Error::Connection("SendQ exceeded".to_string()),
            TrySendError::Closed(_) => Error::Connection("Connection closed".to_string()),
        })
    }

    /// Remember the reader task so teardown can stop it
    pub fn set_reader(&mut self, handle: AbortHandle) {
        self.reader = Some(handle);
    }

    /// Stop the reader task, if one is attached
    pub fn abort_reader(&mut self) {
        if let Some(handle) = self.reader.take() {
            handle.abort();
        }
    }

    /// Nickname, or `*` while none is set
    pub fn nick(&self) -> &str {
        self.nickname.as_deref().unwrap_or("*")
    }

    /// Host part of the prefix: the peer IP
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// User prefix used when relaying this session's actions
    pub fn prefix(&self) -> Prefix {
        Prefix::User {
            nick: self.nick().to_string(),
            user: self.username.clone().unwrap_or_else(|| "*".to_string()),
            host: self.host(),
        }
    }

    /// PASS, NICK and USER have all been accepted
    pub fn can_authenticate(&self) -> bool {
        self.sent_pass && self.sent_nick && self.sent_user
    }

    /// Check if session is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.abort_reader();
    }
}
