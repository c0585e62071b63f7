//! MODE

use crate::channel::ChannelMode;
use crate::server::CommandResult;
use crate::session::ClientId;
use crate::utils::string::{is_channel_name, is_valid_channel_key};
use crate::{Message, MessageType, NumericReply, Server};

/// One mode change that took effect
#[derive(Debug, Clone, PartialEq, Eq)]
struct AppliedMode {
    adding: bool,
    mode: char,
    arg: Option<String>,
}

/// Render applied changes as MODE parameters, e.g. `+it-k` followed by args
fn render_changes(changes: &[AppliedMode]) -> Vec<String> {
    let mut flags = String::new();
    let mut args = Vec::new();
    let mut current = None;
    for change in changes {
        if current != Some(change.adding) {
            flags.push(if change.adding { '+' } else { '-' });
            current = Some(change.adding);
        }
        flags.push(change.mode);
        args.extend(change.arg.clone());
    }
    std::iter::once(flags).chain(args).collect()
}

impl Server {
    /// Handle MODE command
    pub(crate) fn handle_mode(&mut self, id: ClientId, message: &Message) -> CommandResult {
        let nick = self.nick(&id);
        let target = message
            .params
            .first()
            .ok_or_else(|| NumericReply::need_more_params(&nick, "MODE"))?;

        if !is_channel_name(target) {
            return self.user_mode(id, &nick, target);
        }

        let name = target.as_str();
        let channel = self
            .registry()
            .channel(name)
            .ok_or_else(|| NumericReply::no_such_channel(&nick, name))?;
        let is_operator = channel.is_operator(&id);

        let flags = match message.params.get(1) {
            Some(flags) => flags.as_str(),
            None => {
                let modes = channel.modes_string();
                let params = channel.mode_params(channel.has_member(&id));
                let created = channel.created_at.timestamp();
                self.send_numeric(id, NumericReply::channel_mode_is(&nick, name, &modes, &params));
                self.send_numeric(id, NumericReply::creation_time(&nick, name, created));
                return Ok(());
            }
        };
        if !is_operator {
            return Err(NumericReply::chan_op_privs_needed(&nick, name));
        }
        match flags.chars().next() {
            None => return Err(NumericReply::need_more_params(&nick, "MODE")),
            Some('+') | Some('-') => {}
            Some(other) => return Err(NumericReply::unknown_mode(&nick, other)),
        }

        let mut args = message.params[2..].iter();
        let mut applied = Vec::new();
        let mut outcome = Ok(());
        let mut adding = true;

        for c in flags.chars() {
            let step = match c {
                '+' => {
                    adding = true;
                    continue;
                }
                '-' => {
                    adding = false;
                    continue;
                }
                _ => match ChannelMode::from_char(c) {
                    Some(mode) => self.apply_channel_mode(id, &nick, name, mode, adding, &mut args),
                    None => Err(NumericReply::unknown_mode(&nick, c)),
                },
            };
            match step {
                Ok(Some(change)) => applied.push(change),
                Ok(None) => {}
                Err(reply) => {
                    outcome = Err(reply);
                    break;
                }
            }
        }

        if !applied.is_empty() {
            tracing::info!("{} set mode {} on {}", nick, render_changes(&applied).join(" "), name);
            if let Some(prefix) = self.prefix(&id) {
                let mut params = vec![name.to_string()];
                params.extend(render_changes(&applied));
                let aggregate = Message::with_prefix(prefix, MessageType::Mode, params);
                self.broadcast(name, &aggregate, None);
            }
        }
        outcome
    }

    /// MODE on a nickname: only the issuer's own, which has no modes
    fn user_mode(&mut self, id: ClientId, nick: &str, target: &str) -> CommandResult {
        match self.registry().find_by_nick(target) {
            Some(owner) if owner == id => {
                self.send_numeric(id, NumericReply::umode_is(nick, "+"));
                Ok(())
            }
            Some(_) => Err(NumericReply::users_dont_match(nick)),
            None => Err(NumericReply::no_such_nick(nick, target)),
        }
    }

    /// Apply one mode letter, consuming its argument if it takes one
    fn apply_channel_mode<'a, I>(
        &mut self,
        id: ClientId,
        nick: &str,
        name: &str,
        mode: ChannelMode,
        adding: bool,
        args: &mut I,
    ) -> Result<Option<AppliedMode>, Message>
    where
        I: Iterator<Item = &'a String>,
    {
        let letter = mode.as_char();
        let change = |arg: Option<String>| {
            Some(AppliedMode {
                adding,
                mode: letter,
                arg,
            })
        };

        match mode {
            ChannelMode::InviteOnly | ChannelMode::TopicOps => {
                let channel = match self.registry_mut().channel_mut(name) {
                    Some(channel) => channel,
                    None => return Ok(None),
                };
                let changed = channel.set_flag(mode, adding);
                if changed && mode == ChannelMode::TopicOps && !adding {
                    channel.clear_topic();
                }
                Ok(if changed { change(None) } else { None })
            }
            ChannelMode::Keyed if adding => {
                let key = args
                    .next()
                    .ok_or_else(|| NumericReply::need_more_params(nick, "MODE"))?;
                if !is_valid_channel_key(key) {
                    return Err(NumericReply::invalid_key(nick, name));
                }
                if let Some(channel) = self.registry_mut().channel_mut(name) {
                    channel.set_key(Some(key.clone()));
                }
                Ok(change(Some(key.clone())))
            }
            ChannelMode::Keyed => {
                if let Some(channel) = self.registry_mut().channel_mut(name) {
                    channel.set_key(None);
                }
                Ok(change(None))
            }
            ChannelMode::UserLimit if adding => {
                let limit = args
                    .next()
                    .and_then(|arg| arg.parse::<usize>().ok())
                    .ok_or_else(|| NumericReply::need_more_params(nick, "MODE"))?;
                if let Some(channel) = self.registry_mut().channel_mut(name) {
                    channel.set_user_limit(Some(limit));
                }
                Ok(change(Some(limit.to_string())))
            }
            ChannelMode::UserLimit => {
                if let Some(channel) = self.registry_mut().channel_mut(name) {
                    channel.set_user_limit(None);
                }
                Ok(change(None))
            }
            ChannelMode::Operator => {
                let target_nick = args
                    .next()
                    .ok_or_else(|| NumericReply::need_more_params(nick, "MODE"))?;
                let target = self
                    .registry()
                    .find_by_nick(target_nick)
                    .ok_or_else(|| NumericReply::no_such_nick(nick, target_nick))?;
                let is_member = self
                    .registry()
                    .channel(name)
                    .map_or(false, |channel| channel.has_member(&target));
                if !is_member {
                    return Err(NumericReply::user_not_in_channel(nick, target_nick, name));
                }
                if !adding && target == id {
                    return Err(NumericReply::unknown_error(
                        nick,
                        "MODE",
                        "You cannot remove your own operator status",
                    ));
                }

                if let Some(channel) = self.registry_mut().channel_mut(name) {
                    channel.set_operator(&target, adding);
                }
                if let Some(prefix) = self.prefix(&id) {
                    let sign = if adding { "+o" } else { "-o" };
                    let single = Message::with_prefix(
                        prefix,
                        MessageType::Mode,
                        vec![name.to_string(), sign.to_string(), target_nick.clone()],
                    );
                    self.broadcast(name, &single, None);
                }
                Ok(change(Some(target_nick.clone())))
            }
        }
    }
}
