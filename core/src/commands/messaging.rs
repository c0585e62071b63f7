//! PRIVMSG, NOTICE, PING and QUIT

use crate::server::CommandResult;
use crate::session::ClientId;
use crate::utils::string::is_channel_name;
use crate::{Message, MessageType, NumericReply, Prefix, Server};

impl Server {
    /// Handle PRIVMSG command
    pub(crate) fn handle_privmsg(&mut self, id: ClientId, message: &Message) -> CommandResult {
        self.relay_text(id, message)
    }

    /// Handle NOTICE command. Refusals are dropped by the dispatcher.
    pub(crate) fn handle_notice(&mut self, id: ClientId, message: &Message) -> CommandResult {
        self.relay_text(id, message)
    }

    /// Deliver a PRIVMSG or NOTICE to a channel's other members or to one nickname
    fn relay_text(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        let verb = message.command.to_string();
        let (target, text) = match message.params.as_slice() {
            [] => return Err(NumericReply::no_recipients(&nick, &verb)),
            [_] => return Err(NumericReply::no_text_to_send(&nick)),
            [target, text] => (target.as_str(), text),
            _ => return Err(NumericReply::need_more_params(&nick, &verb)),
        };
        if text.is_empty() {
            return Err(NumericReply::no_text_to_send(&nick));
        }

        let prefix = match self.prefix(&id) {
            Some(prefix) => prefix,
            None => return Ok(()),
        };
        let relayed = Message::with_prefix(
            prefix,
            message.command.clone(),
            vec![target.to_string(), text.clone()],
        );

        if is_channel_name(target) {
            let channel = self
                .registry()
                .channel(target)
                .ok_or_else(|| NumericReply::no_such_channel(&nick, target))?;
            if !channel.has_member(&id) {
                return Err(NumericReply::cannot_send_to_chan(&nick, target));
            }
            self.broadcast(target, &relayed, Some(id));
        } else {
            let recipient = self
                .registry()
                .find_by_nick(target)
                .ok_or_else(|| NumericReply::no_such_nick(&nick, target))?;
            self.send_to(recipient, &relayed);
        }
        Ok(())
    }

    /// Handle PING command
    pub(crate) fn handle_ping(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        let token = message
            .params
            .first()
            .ok_or_else(|| NumericReply::no_origin(&nick))?;

        let server = self.server_name().to_string();
        let pong = Message::with_prefix(
            Prefix::Server(server.clone()),
            MessageType::Pong,
            vec![server, token.clone()],
        );
        self.send_to(id, &pong);
        Ok(())
    }

    /// Handle QUIT command
    pub(crate) fn handle_quit(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let reason = message
            .params
            .first()
            .cloned()
            .unwrap_or_else(|| "Client Quit".to_string());
        self.close_link(id, &reason, &format!("Quit: {}", reason));
        Ok(())
    }
}
