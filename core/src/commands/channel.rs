//! JOIN, PART, KICK, INVITE and TOPIC

use super::expect_params;
use crate::channel::{Channel, JoinRefusal};
use crate::message::MAX_LINE_LENGTH;
use crate::server::CommandResult;
use crate::session::ClientId;
use crate::utils::string::{is_channel_name, is_valid_channel_key, is_valid_channel_name};
use crate::{Message, MessageType, NumericReply, Server};

impl Server {
    /// Handle JOIN command
    pub(crate) fn handle_join(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        expect_params(&nick, message, 1, 2)?;

        let name = message.params[0].as_str();
        let key = message.params.get(1).map(String::as_str);
        if !is_channel_name(name) {
            return Err(NumericReply::no_such_channel(&nick, name));
        }
        if !is_valid_channel_name(name) {
            return Err(NumericReply::bad_chan_mask(&nick, name));
        }

        match self.registry().channel(name) {
            Some(channel) => {
                if channel.has_member(&id) {
                    return Ok(());
                }
                channel.check_join(&id, key).map_err(|refusal| match refusal {
                    JoinRefusal::InviteOnly => NumericReply::invite_only_chan(&nick, name),
                    JoinRefusal::BadKey => NumericReply::bad_channel_key(&nick, name),
                    JoinRefusal::Full => NumericReply::channel_is_full(&nick, name),
                })?;

                if let Some(channel) = self.registry_mut().channel_mut(name) {
                    channel.add_member(id);
                    channel.uninvite(&id);
                }
            }
            None => {
                let mut channel = Channel::new(name.to_string());
                channel.add_member(id);
                channel.set_operator(&id, true);
                if let Some(key) = key.filter(|k| is_valid_channel_key(k)) {
                    channel.set_key(Some(key.to_string()));
                }
                self.registry_mut().insert_channel(channel);
                tracing::info!("Channel {} created by {}", name, nick);
            }
        }
        tracing::info!("{} joined {}", nick, name);

        if let Some(prefix) = self.prefix(&id) {
            let join = Message::with_prefix(prefix, MessageType::Join, vec![name.to_string()]);
            self.broadcast(name, &join, None);
        }
        self.send_topic(id, name);
        self.send_names(id, name);
        Ok(())
    }

    /// Handle PART command
    pub(crate) fn handle_part(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        expect_params(&nick, message, 1, 2)?;

        let name = message.params[0].as_str();
        let channel = self
            .registry()
            .channel(name)
            .ok_or_else(|| NumericReply::no_such_channel(&nick, name))?;
        if !channel.has_member(&id) {
            return Err(NumericReply::not_on_channel(&nick, name));
        }

        if let Some(prefix) = self.prefix(&id) {
            let mut params = vec![name.to_string()];
            params.extend(message.params.get(1).cloned());
            let part = Message::with_prefix(prefix, MessageType::Part, params);
            self.broadcast(name, &part, None);
        }
        if let Some(channel) = self.registry_mut().channel_mut(name) {
            channel.remove_member(&id);
        }
        tracing::info!("{} left {}", nick, name);
        self.maybe_reap(name);
        Ok(())
    }

    /// Handle KICK command
    pub(crate) fn handle_kick(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        expect_params(&nick, message, 2, 3)?;

        let name = message.params[0].as_str();
        let target_nick = message.params[1].as_str();
        let channel = self
            .registry()
            .channel(name)
            .ok_or_else(|| NumericReply::no_such_channel(&nick, name))?;
        if !channel.has_member(&id) {
            return Err(NumericReply::not_on_channel(&nick, name));
        }
        if !channel.is_operator(&id) {
            return Err(NumericReply::chan_op_privs_needed(&nick, name));
        }
        if target_nick == nick {
            return Err(NumericReply::unknown_error(
                &nick,
                "KICK",
                "You cannot kick yourself",
            ));
        }
        let target = self
            .registry()
            .find_by_nick(target_nick)
            .ok_or_else(|| NumericReply::no_such_nick(&nick, target_nick))?;
        if !channel.has_member(&target) {
            return Err(NumericReply::user_not_in_channel(&nick, target_nick, name));
        }

        let comment = message.params.get(2).cloned().unwrap_or_else(|| nick.clone());
        if let Some(prefix) = self.prefix(&id) {
            let kick = Message::with_prefix(
                prefix,
                MessageType::Kick,
                vec![name.to_string(), target_nick.to_string(), comment],
            );
            self.broadcast(name, &kick, None);
        }
        if let Some(channel) = self.registry_mut().channel_mut(name) {
            channel.remove_member(&target);
        }
        tracing::info!("{} kicked {} from {}", nick, target_nick, name);
        self.maybe_reap(name);
        Ok(())
    }

    /// Handle INVITE command
    pub(crate) fn handle_invite(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        expect_params(&nick, message, 2, 2)?;

        let target_nick = message.params[0].as_str();
        let name = message.params[1].as_str();
        let channel = self
            .registry()
            .channel(name)
            .ok_or_else(|| NumericReply::no_such_channel(&nick, name))?;
        if !channel.has_member(&id) {
            return Err(NumericReply::not_on_channel(&nick, name));
        }
        if !channel.is_operator(&id) {
            return Err(NumericReply::chan_op_privs_needed(&nick, name));
        }
        let target = self
            .registry()
            .find_by_nick(target_nick)
            .ok_or_else(|| NumericReply::no_such_nick(&nick, target_nick))?;
        if channel.has_member(&target) {
            return Err(NumericReply::user_on_channel(&nick, target_nick, name));
        }
        if channel.is_invited(&target) {
            return Err(NumericReply::unknown_error(
                &nick,
                "INVITE",
                &format!("{} is already invited to {}", target_nick, name),
            ));
        }

        if let Some(channel) = self.registry_mut().channel_mut(name) {
            channel.invite(target);
        }
        tracing::info!("{} invited {} to {}", nick, target_nick, name);

        self.send_numeric(id, NumericReply::inviting(&nick, target_nick, name));
        if let Some(prefix) = self.prefix(&id) {
            let invite = Message::with_prefix(
                prefix,
                MessageType::Invite,
                vec![target_nick.to_string(), name.to_string()],
            );
            self.send_to(target, &invite);
        }
        Ok(())
    }

    /// Handle TOPIC command
    pub(crate) fn handle_topic(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        expect_params(&nick, message, 1, 2)?;

        let name = message.params[0].as_str();
        let channel = self
            .registry()
            .channel(name)
            .ok_or_else(|| NumericReply::no_such_channel(&nick, name))?;
        if !channel.has_member(&id) {
            return Err(NumericReply::not_on_channel(&nick, name));
        }
        let locked = channel.topic_ops_only() && !channel.is_operator(&id);

        let text = match message.params.get(1) {
            Some(text) => text.clone(),
            None => {
                self.send_topic(id, name);
                return Ok(());
            }
        };
        if locked {
            return Err(NumericReply::chan_op_privs_needed(&nick, name));
        }

        if let Some(channel) = self.registry_mut().channel_mut(name) {
            if text.is_empty() {
                channel.clear_topic();
            } else {
                channel.set_topic(text.clone(), nick.clone());
            }
        }
        tracing::debug!("{} set the topic of {}", nick, name);

        if let Some(prefix) = self.prefix(&id) {
            let topic = Message::with_prefix(prefix, MessageType::Topic, vec![name.to_string(), text]);
            self.broadcast(name, &topic, None);
        }
        Ok(())
    }

    /// Send the topic (332 and 333) or 331 to one session
    fn send_topic(&mut self, id: ClientId, name: &str) {
        let nick = self.nick(&id);
        let replies = match self.registry().channel(name) {
            Some(channel) => match (&channel.topic, &channel.topic_setter, channel.topic_time) {
                (Some(topic), Some(setter), Some(time)) => vec![
                    NumericReply::topic(&nick, name, topic),
                    NumericReply::topic_who_time(&nick, name, setter, time.timestamp()),
                ],
                (Some(topic), _, _) => vec![NumericReply::topic(&nick, name, topic)],
                _ => vec![NumericReply::no_topic(&nick, name)],
            },
            None => return,
        };
        for reply in replies {
            self.send_numeric(id, reply);
        }
    }

    /// Send the names list (353 and 366) to one session; operators carry `@`
    fn send_names(&mut self, id: ClientId, name: &str) {
        let nick = self.nick(&id);
        let names: Vec<String> = match self.registry().channel(name) {
            Some(channel) => channel
                .members()
                .into_iter()
                .filter_map(|member| {
                    let session = self.registry().session(&member.client_id)?;
                    let flag = if member.operator { "@" } else { "" };
                    Some(format!("{}{}", flag, session.nick()))
                })
                .collect(),
            None => return,
        };
        let overhead = format!(":{} 353 {} = {} :\r\n", self.server_name(), nick, name).len();
        for batch in batch_names(names, MAX_LINE_LENGTH.saturating_sub(overhead)) {
            self.send_numeric(id, NumericReply::name_reply(&nick, name, &batch));
        }
        self.send_numeric(id, NumericReply::end_of_names(&nick, name));
    }
}

/// Group names so each space-joined group fits in `budget` bytes.
/// A name longer than the budget still gets a group of its own.
fn batch_names(names: Vec<String>, budget: usize) -> Vec<Vec<String>> {
    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut used = 0;
    for name in names {
        if !current.is_empty() && used + 1 + name.len() > budget {
            batches.push(std::mem::take(&mut current));
            used = 0;
        }
        used += if current.is_empty() { name.len() } else { name.len() + 1 };
        current.push(name);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
