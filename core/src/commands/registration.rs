//! PASS, NICK, USER and AUTHENTICATE

use super::expect_params;
use crate::server::CommandResult;
use crate::session::ClientId;
use crate::utils::string::is_valid_nickname;
use crate::{Message, MessageType, NumericReply, Prefix, Server};

impl Server {
    /// Handle PASS command
    pub(crate) fn handle_pass(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        expect_params(&nick, message, 1, usize::MAX)?;

        let (registered, started) = match self.registry().session(&id) {
            Some(s) => (s.registered, s.sent_nick || s.sent_user),
            None => return Ok(()),
        };
        if registered || started {
            return Err(NumericReply::already_registered(&nick));
        }

        if message.params[0] != self.config().password() {
            tracing::warn!("Password mismatch from session {}", id);
            return Err(NumericReply::password_mismatch(&nick));
        }

        if let Some(session) = self.registry_mut().session_mut(&id) {
            session.sent_pass = true;
            session.registered = true;
        }

        let notice = Message::with_prefix(
            Prefix::Server(self.server_name().to_string()),
            MessageType::Notice,
            vec![nick, "Password accepted".to_string()],
        );
        self.send_to(id, &notice);
        Ok(())
    }

    /// Handle NICK command
    pub(crate) fn handle_nick(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        let (sent_pass, authenticated) = match self.registry().session(&id) {
            Some(s) => (s.sent_pass, s.authenticated),
            None => return Ok(()),
        };
        if !sent_pass {
            return Err(NumericReply::not_registered(&nick, "PASS required before NICK"));
        }

        let requested = match message.params.first() {
            Some(requested) if !requested.is_empty() => requested.as_str(),
            _ => return Err(NumericReply::no_nickname_given(&nick)),
        };
        if !is_valid_nickname(requested) {
            return Err(NumericReply::erroneous_nickname(&nick, requested));
        }

        match self.registry().find_by_nick(requested) {
            Some(owner) if owner == id => return Ok(()),
            Some(_) => return Err(NumericReply::nickname_in_use(&nick, requested)),
            None => {}
        }

        let old_prefix = self.prefix(&id);
        let old = self
            .registry_mut()
            .set_nickname(&id, requested)
            .map_err(|_| NumericReply::nickname_in_use(&nick, requested))?;
        if let Some(session) = self.registry_mut().session_mut(&id) {
            session.sent_nick = true;
        }

        match (old, old_prefix) {
            (Some(old), Some(prefix)) if authenticated => {
                tracing::info!("{} is now known as {}", old, requested);
                let change =
                    Message::with_prefix(prefix, MessageType::Nick, vec![requested.to_string()]);
                let mut recipients = vec![id];
                recipients.extend(self.registry().peers_of(&id));
                self.send_to_all(&recipients, &change);
            }
            _ => self.try_complete_registration(id),
        }
        Ok(())
    }

    /// Handle USER command
    pub(crate) fn handle_user(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        let (ready, authenticated) = match self.registry().session(&id) {
            Some(s) => (s.sent_pass && s.sent_nick, s.authenticated),
            None => return Ok(()),
        };
        if authenticated {
            return Err(NumericReply::already_registered(&nick));
        }
        if !ready {
            return Err(NumericReply::not_registered(
                &nick,
                "PASS and NICK required before USER",
            ));
        }
        expect_params(&nick, message, 4, 4)?;

        if let Some(session) = self.registry_mut().session_mut(&id) {
            session.username = Some(message.params[0].clone());
            session.realname = Some(message.params[3].clone());
            session.sent_user = true;
        }
        self.try_complete_registration(id);
        Ok(())
    }

    /// Handle AUTHENTICATE command
    pub(crate) fn handle_authenticate(&mut self, id: ClientId, _message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        let (authenticated, complete) = match self.registry().session(&id) {
            Some(s) => (s.authenticated, s.can_authenticate()),
            None => return Ok(()),
        };
        if authenticated {
            return Err(NumericReply::already_registered(&nick));
        }
        if !complete {
            return Err(NumericReply::not_registered(&nick, "authentication incomplete"));
        }
        self.complete_registration(id);
        Ok(())
    }

    fn try_complete_registration(&mut self, id: ClientId) {
        if !self.config().registration.auto_authenticate {
            return;
        }
        let ready = self
            .registry()
            .session(&id)
            .map_or(false, |s| !s.authenticated && s.can_authenticate());
        if ready {
            self.complete_registration(id);
        }
    }

    /// Mark a session authenticated and send the welcome burst
    fn complete_registration(&mut self, id: ClientId) {
        let (nick, user, host) = match self.registry_mut().session_mut(&id) {
            Some(session) => {
                session.authenticated = true;
                (
                    session.nick().to_string(),
                    session.username.clone().unwrap_or_default(),
                    session.host(),
                )
            }
            None => return,
        };
        tracing::info!("Session {} registered as {}!{}@{}", id, nick, user, host);

        let config = self.config();
        let server = config.server.name.clone();
        let version = config.server.version.clone();
        let network = config.server.network.clone();
        let created = self.started().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let isupport = vec![
            "CHANTYPES=#".to_string(),
            "CHANMODES=,k,l,it".to_string(),
            "PREFIX=(o)@".to_string(),
            format!("NICKLEN={}", crate::utils::string::MAX_NICKNAME_LENGTH),
            format!("NETWORK={}", network),
            "CASEMAPPING=ascii".to_string(),
        ];

        let burst = [
            NumericReply::welcome(&nick, &user, &host, &network),
            NumericReply::your_host(&nick, &server, &version),
            NumericReply::created(&nick, &created),
            NumericReply::my_info(&nick, &server, &version, "iklot"),
            NumericReply::isupport(&nick, &isupport),
        ];
        for reply in burst {
            self.send_numeric(id, reply);
        }
    }
}
