//! Protocol engine
//!
//! `Server` owns the registry and the configuration. It is fed accepted
//! connections, raw input bytes and disconnects by the event loop and answers
//! by queueing lines on each session's outbox. It performs no I/O itself, so
//! every call runs to completion before the next event is looked at.

use crate::framer::LineCodec;
use crate::registry::Registry;
use crate::session::{ClientId, Outbox, Session};
use crate::{Config, Error, Message, MessageType, NumericReply, Prefix, Result};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::AbortHandle;

/// Outcome of a command handler: `Err` carries the numeric for the issuer
pub type CommandResult = std::result::Result<(), Message>;

/// The relay's protocol engine
#[derive(Debug)]
pub struct Server {
    config: Config,
    registry: Registry,
    codec: LineCodec,
    started: DateTime<Utc>,
    /// Sessions to close once the current line is finished, with the reason
    pending_close: Vec<(ClientId, String)>,
}

impl Server {
    /// Create a new server
    pub fn new(config: Config) -> Self {
        let codec = LineCodec::new(config.connection.recvq_size);
        Self {
            config,
            registry: Registry::new(),
            codec,
            started: Utc::now(),
            pending_close: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn server_name(&self) -> &str {
        &self.config.server.name
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    /// Whether a session is still registered with the engine
    pub fn is_connected(&self, id: &ClientId) -> bool {
        self.registry.session(id).is_some()
    }

    /// Admit a freshly accepted connection.
    ///
    /// Refuses it with an ERROR line when the server is full; the caller then
    /// drops its end of the connection.
    pub fn accept(&mut self, id: ClientId, addr: SocketAddr, outbox: Outbox) -> Result<()> {
        if self.registry.session_count() >= self.config.connection.max_clients {
            tracing::warn!(
                "Refusing connection from {}: {} clients connected",
                addr,
                self.registry.session_count()
            );
            let _ = outbox.try_send(closing_link("Server full"));
            return Err(Error::Connection("Server full".to_string()));
        }

        tracing::info!("Accepted connection {} from {}", id, addr);
        self.registry.insert_session(Session::new(id, addr, outbox));
        Ok(())
    }

    /// Attach the reader task of a session so teardown can stop it
    pub fn attach_reader(&mut self, id: &ClientId, handle: AbortHandle) {
        match self.registry.session_mut(id) {
            Some(session) => session.set_reader(handle),
            None => handle.abort(),
        }
    }

    /// Feed bytes read from a session's socket.
    ///
    /// Every complete line is handled in arrival order. Lines stop being
    /// handled as soon as the session is closed or marked for closing.
    pub fn receive(&mut self, id: ClientId, data: &[u8]) {
        let mut codec = self.codec;
        let (lines, overflow) = match self.registry.session_mut(&id) {
            Some(session) => {
                session.inbound.extend_from_slice(data);
                codec.drain_lines(&mut session.inbound)
            }
            None => return,
        };

        for line in lines {
            if !self.is_connected(&id) || self.is_closing(&id) {
                break;
            }
            self.handle_line(id, &line);
            self.process_pending();
        }

        if let Some(err) = overflow {
            if self.is_connected(&id) {
                tracing::warn!("Session {} input overflow: {}", id, err);
                self.close_link(id, "RecvQ exceeded", "RecvQ exceeded");
            }
        }
        self.process_pending();
    }

    /// The peer closed the connection or the socket failed
    pub fn disconnect(&mut self, id: ClientId) {
        if !self.is_connected(&id) {
            return;
        }
        let peers = self.registry.peers_of(&id);
        if let Some(prefix) = self.prefix(&id) {
            let quit = Message::with_prefix(
                prefix,
                MessageType::Quit,
                vec!["Connection closed".to_string()],
            );
            self.send_to_all(&peers, &quit);
        }
        self.teardown(id);
        self.process_pending();
    }

    /// Close every session, e.g. on shutdown
    pub fn close_all(&mut self, reason: &str) {
        for id in self.registry.session_ids() {
            if let Some(session) = self.registry.session(&id) {
                let _ = session.send(closing_link(reason));
            }
            self.teardown(id);
        }
        self.pending_close.clear();
    }

    fn handle_line(&mut self, id: ClientId, line: &str) {
        tracing::debug!("{} >> {}", id, line);
        match Message::parse(line) {
            Ok(message) => self.dispatch(id, message),
            Err(e) => tracing::debug!("Ignoring line from {}: {}", id, e),
        }
    }

    /// Route one parsed command to its handler and report a refusal
    fn dispatch(&mut self, id: ClientId, message: Message) {
        let authenticated = match self.registry.session(&id) {
            Some(session) => session.is_authenticated(),
            None => return,
        };
        let nick = self.nick(&id);

        let result = match message.command {
            MessageType::Custom(ref verb) => Err(NumericReply::unknown_command(&nick, verb)),
            ref command if !authenticated && !command.allowed_before_registration() => {
                Err(NumericReply::not_registered(&nick, "You have not registered"))
            }
            MessageType::Password => self.handle_pass(id, &message),
            MessageType::Nick => self.handle_nick(id, &message),
            MessageType::User => self.handle_user(id, &message),
            MessageType::Authenticate => self.handle_authenticate(id, &message),
            MessageType::Join => self.handle_join(id, &message),
            MessageType::Part => self.handle_part(id, &message),
            MessageType::Kick => self.handle_kick(id, &message),
            MessageType::Invite => self.handle_invite(id, &message),
            MessageType::Topic => self.handle_topic(id, &message),
            MessageType::Mode => self.handle_mode(id, &message),
            MessageType::PrivMsg => self.handle_privmsg(id, &message),
            MessageType::Notice => self.handle_notice(id, &message),
            MessageType::Ping => self.handle_ping(id, &message),
            MessageType::Pong => Ok(()),
            MessageType::Quit => self.handle_quit(id, &message),
            ref other => Err(NumericReply::unknown_command(&nick, &other.to_string())),
        };

        if let Err(reply) = result {
            if message.command == MessageType::Notice {
                tracing::debug!("Dropping NOTICE refusal for {}: {}", nick, reply);
            } else {
                self.send_numeric(id, reply);
            }
        }
    }

    /// Nickname of a session, `*` if unset or unknown
    pub(crate) fn nick(&self, id: &ClientId) -> String {
        self.registry
            .session(id)
            .map(|s| s.nick().to_string())
            .unwrap_or_else(|| "*".to_string())
    }

    /// User prefix of a session
    pub(crate) fn prefix(&self, id: &ClientId) -> Option<Prefix> {
        self.registry.session(id).map(|s| s.prefix())
    }

    /// Stamp the server prefix on a numeric and queue it for one session
    pub(crate) fn send_numeric(&mut self, id: ClientId, reply: Message) {
        let reply = reply.prefixed(Prefix::Server(self.config.server.name.clone()));
        self.send_to(id, &reply);
    }

    /// Queue a message for one session
    pub(crate) fn send_to(&mut self, id: ClientId, message: &Message) {
        self.send_line(id, Arc::from(message.to_wire()));
    }

    /// Queue a message for each of `ids`
    pub(crate) fn send_to_all(&mut self, ids: &[ClientId], message: &Message) {
        let line: Arc<str> = Arc::from(message.to_wire());
        for id in ids {
            self.send_line(*id, line.clone());
        }
    }

    /// Queue a message for every member of a channel, optionally skipping one
    pub(crate) fn broadcast(&mut self, channel: &str, message: &Message, except: Option<ClientId>) {
        let members = match self.registry.channel(channel) {
            Some(chan) => chan.member_ids(),
            None => return,
        };
        let line: Arc<str> = Arc::from(message.to_wire());
        for member in members {
            if Some(member) != except {
                self.send_line(member, line.clone());
            }
        }
    }

    fn send_line(&mut self, id: ClientId, line: Arc<str>) {
        let failure = match self.registry.session(&id) {
            Some(session) => session.send(line).err(),
            None => return,
        };
        if let Some(err) = failure {
            if !self.is_closing(&id) {
                tracing::warn!("Session {} outbound queue: {}", id, err);
                let reason = match err {
                    Error::Connection(reason) => reason,
                    other => other.to_string(),
                };
                self.pending_close.push((id, reason));
            }
        }
    }

    fn is_closing(&self, id: &ClientId) -> bool {
        self.pending_close.iter().any(|(pending, _)| pending == id)
    }

    fn process_pending(&mut self) {
        while let Some((id, reason)) = self.pending_close.pop() {
            self.close_link(id, &reason, &reason);
        }
    }

    /// Server-side close: tell peers, send the ERROR line, tear down
    pub(crate) fn close_link(&mut self, id: ClientId, quit_message: &str, reason: &str) {
        let prefix = match self.prefix(&id) {
            Some(prefix) => prefix,
            None => return,
        };
        tracing::info!("Closing link to {} ({}): {}", self.nick(&id), id, reason);

        let peers = self.registry.peers_of(&id);
        let quit = Message::with_prefix(prefix, MessageType::Quit, vec![quit_message.to_string()]);
        self.send_to_all(&peers, &quit);

        if let Some(session) = self.registry.session(&id) {
            let _ = session.send(closing_link(reason));
        }
        self.teardown(id);
    }

    /// Remove a session and every reference to it. Safe to call twice.
    fn teardown(&mut self, id: ClientId) {
        let (mut session, channels) = match self.registry.remove_session(&id) {
            Some(removed) => removed,
            None => return,
        };
        session.abort_reader();
        self.pending_close.retain(|(pending, _)| *pending != id);

        for name in &channels {
            self.maybe_reap(name);
        }

        tracing::info!(
            "Session {} ({}) from {} removed, {} remaining",
            session.nick(),
            id,
            session.addr,
            self.registry.session_count()
        );
    }

    /// Delete a channel after someone left it, if configured to
    pub(crate) fn maybe_reap(&mut self, channel: &str) {
        if self.config.channels.reap_empty && self.registry.reap_channel(channel) {
            tracing::info!("Channel {} is empty, removing it", channel);
        }
    }
}

/// The line sent right before the server drops a connection
pub fn closing_link(reason: &str) -> Arc<str> {
    let message = Message::new(
        MessageType::Error,
        vec![format!("Closing link ({})", reason)],
    );
    Arc::from(message.to_wire())
}
