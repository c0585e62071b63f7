//! Numeric replies as defined in RFC 1459 / RFC 2812
//!
//! The constructors return prefix-less messages; the server stamps its own name
//! on them when they are queued for a session.

use crate::{Message, MessageType};

/// Numeric reply codes used by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum NumericReply {
    // Connection registration
    RplWelcome = 1,
    RplYourHost = 2,
    RplCreated = 3,
    RplMyInfo = 4,
    RplISupport = 5,

    // Command responses
    RplUmodeIs = 221,
    RplChannelModeIs = 324,
    RplCreationTime = 329,
    RplNoTopic = 331,
    RplTopic = 332,
    RplTopicWhoTime = 333,
    RplInviting = 341,
    RplNameReply = 353,
    RplEndOfNames = 366,

    // Error replies
    ErrUnknownError = 400,
    ErrNoSuchNick = 401,
    ErrNoSuchChannel = 403,
    ErrCannotSendToChan = 404,
    ErrNoOrigin = 409,
    ErrNoRecipients = 411,
    ErrNoTextToSend = 412,
    ErrUnknownCommand = 421,
    ErrNoNicknameGiven = 431,
    ErrErroneousNickname = 432,
    ErrNicknameInUse = 433,
    ErrUserNotInChannel = 441,
    ErrNotOnChannel = 442,
    ErrUserOnChannel = 443,
    ErrNotRegistered = 451,
    ErrNeedMoreParams = 461,
    ErrAlreadyRegistered = 462,
    ErrPasswordMismatch = 464,
    ErrChannelIsFull = 471,
    ErrUnknownMode = 472,
    ErrInviteOnlyChan = 473,
    ErrBadChannelKey = 475,
    ErrBadChanMask = 476,
    ErrChanOpPrivsNeeded = 482,
    ErrUsersDontMatch = 502,
    ErrInvalidKey = 525,
}

impl NumericReply {
    /// Get the numeric code
    pub fn numeric_code(&self) -> u16 {
        *self as u16
    }

    /// Get the numeric code as a zero-padded string
    pub fn code(&self) -> String {
        format!("{:03}", self.numeric_code())
    }

    /// Create a numeric reply message addressed to `target`
    pub fn reply(&self, target: &str, params: Vec<String>) -> Message {
        let mut all_params = vec![target.to_string()];
        all_params.extend(params);

        Message::new(MessageType::Numeric(self.numeric_code()), all_params)
    }
}

/// Registration replies
impl NumericReply {
    /// RPL_WELCOME
    pub fn welcome(nick: &str, user: &str, host: &str, network: &str) -> Message {
        Self::RplWelcome.reply(
            nick,
            vec![format!("Welcome to the {} Network, {}!{}@{}", network, nick, user, host)],
        )
    }

    /// RPL_YOURHOST
    pub fn your_host(nick: &str, server: &str, version: &str) -> Message {
        Self::RplYourHost.reply(
            nick,
            vec![format!("Your host is {}, running version {}", server, version)],
        )
    }

    /// RPL_CREATED
    pub fn created(nick: &str, date: &str) -> Message {
        Self::RplCreated.reply(nick, vec![format!("This server was created {}", date)])
    }

    /// RPL_MYINFO
    pub fn my_info(nick: &str, server: &str, version: &str, channel_modes: &str) -> Message {
        Self::RplMyInfo.reply(
            nick,
            vec![
                server.to_string(),
                version.to_string(),
                "-".to_string(),
                channel_modes.to_string(),
            ],
        )
    }

    /// RPL_ISUPPORT
    pub fn isupport(nick: &str, tokens: &[String]) -> Message {
        let mut params = tokens.to_vec();
        params.push("are supported by this server".to_string());
        Self::RplISupport.reply(nick, params)
    }

    /// ERR_NOTREGISTERED
    pub fn not_registered(nick: &str, text: &str) -> Message {
        Self::ErrNotRegistered.reply(nick, vec![text.to_string()])
    }

    /// ERR_ALREADYREGISTRED
    pub fn already_registered(nick: &str) -> Message {
        Self::ErrAlreadyRegistered.reply(nick, vec!["You may not reregister".to_string()])
    }

    /// ERR_PASSWDMISMATCH
    pub fn password_mismatch(nick: &str) -> Message {
        Self::ErrPasswordMismatch.reply(nick, vec!["Password incorrect".to_string()])
    }

    /// ERR_NONICKNAMEGIVEN
    pub fn no_nickname_given(nick: &str) -> Message {
        Self::ErrNoNicknameGiven.reply(nick, vec!["No nickname given".to_string()])
    }

    /// ERR_ERRONEUSNICKNAME
    pub fn erroneous_nickname(nick: &str, attempted: &str) -> Message {
        Self::ErrErroneousNickname.reply(
            nick,
            vec![attempted.to_string(), "Erroneous nickname".to_string()],
        )
    }

    /// ERR_NICKNAMEINUSE
    pub fn nickname_in_use(nick: &str, attempted: &str) -> Message {
        Self::ErrNicknameInUse.reply(
            nick,
            vec![attempted.to_string(), "Nickname is already in use".to_string()],
        )
    }
}

/// Channel replies
impl NumericReply {
    /// RPL_UMODEIS
    pub fn umode_is(nick: &str, modes: &str) -> Message {
        Self::RplUmodeIs.reply(nick, vec![modes.to_string()])
    }

    /// RPL_CHANNELMODEIS
    pub fn channel_mode_is(nick: &str, channel: &str, modes: &str, mode_params: &[String]) -> Message {
        let mut params = vec![channel.to_string(), modes.to_string()];
        params.extend_from_slice(mode_params);
        Self::RplChannelModeIs.reply(nick, params)
    }

    /// RPL_CREATIONTIME
    pub fn creation_time(nick: &str, channel: &str, timestamp: i64) -> Message {
        Self::RplCreationTime.reply(nick, vec![channel.to_string(), timestamp.to_string()])
    }

    /// RPL_NOTOPIC
    pub fn no_topic(nick: &str, channel: &str) -> Message {
        Self::RplNoTopic.reply(nick, vec![channel.to_string(), "No topic is set".to_string()])
    }

    /// RPL_TOPIC
    pub fn topic(nick: &str, channel: &str, topic: &str) -> Message {
        Self::RplTopic.reply(nick, vec![channel.to_string(), topic.to_string()])
    }

    /// RPL_TOPICWHOTIME
    pub fn topic_who_time(nick: &str, channel: &str, setter: &str, timestamp: i64) -> Message {
        Self::RplTopicWhoTime.reply(
            nick,
            vec![channel.to_string(), setter.to_string(), timestamp.to_string()],
        )
    }

    /// RPL_INVITING
    pub fn inviting(nick: &str, target: &str, channel: &str) -> Message {
        Self::RplInviting.reply(nick, vec![target.to_string(), channel.to_string()])
    }

    /// RPL_NAMREPLY
    pub fn name_reply(nick: &str, channel: &str, names: &[String]) -> Message {
        Self::RplNameReply.reply(
            nick,
            vec!["=".to_string(), channel.to_string(), names.join(" ")],
        )
    }

    /// RPL_ENDOFNAMES
    pub fn end_of_names(nick: &str, channel: &str) -> Message {
        Self::RplEndOfNames.reply(
            nick,
            vec![channel.to_string(), "End of /NAMES list".to_string()],
        )
    }
}

/// Command errors
impl NumericReply {
    /// ERR_UNKNOWNERROR, used for refusals without a dedicated numeric
    pub fn unknown_error(nick: &str, command: &str, text: &str) -> Message {
        Self::ErrUnknownError.reply(nick, vec![command.to_string(), text.to_string()])
    }

    /// ERR_NOSUCHNICK
    pub fn no_such_nick(nick: &str, target: &str) -> Message {
        Self::ErrNoSuchNick.reply(nick, vec![target.to_string(), "No such nick".to_string()])
    }

    /// ERR_NOSUCHCHANNEL
    pub fn no_such_channel(nick: &str, channel: &str) -> Message {
        Self::ErrNoSuchChannel.reply(nick, vec![channel.to_string(), "No such channel".to_string()])
    }

    /// ERR_CANNOTSENDTOCHAN
    pub fn cannot_send_to_chan(nick: &str, channel: &str) -> Message {
        Self::ErrCannotSendToChan.reply(
            nick,
            vec![channel.to_string(), "Cannot send to channel".to_string()],
        )
    }

    /// ERR_NOORIGIN
    pub fn no_origin(nick: &str) -> Message {
        Self::ErrNoOrigin.reply(nick, vec!["No origin specified".to_string()])
    }

    /// ERR_NORECIPIENT
    pub fn no_recipients(nick: &str, command: &str) -> Message {
        Self::ErrNoRecipients.reply(nick, vec![format!("No recipient given ({})", command)])
    }

    /// ERR_NOTEXTTOSEND
    pub fn no_text_to_send(nick: &str) -> Message {
        Self::ErrNoTextToSend.reply(nick, vec!["No text to send".to_string()])
    }

    /// ERR_UNKNOWNCOMMAND
    pub fn unknown_command(nick: &str, command: &str) -> Message {
        Self::ErrUnknownCommand.reply(nick, vec![command.to_string(), "Unknown command".to_string()])
    }

    /// ERR_USERNOTINCHANNEL
    pub fn user_not_in_channel(nick: &str, target: &str, channel: &str) -> Message {
        Self::ErrUserNotInChannel.reply(
            nick,
            vec![
                target.to_string(),
                channel.to_string(),
                "They aren't on that channel".to_string(),
            ],
        )
    }

    /// ERR_NOTONCHANNEL
    pub fn not_on_channel(nick: &str, channel: &str) -> Message {
        Self::ErrNotOnChannel.reply(
            nick,
            vec![channel.to_string(), "You're not on that channel".to_string()],
        )
    }

    /// ERR_USERONCHANNEL
    pub fn user_on_channel(nick: &str, target: &str, channel: &str) -> Message {
        Self::ErrUserOnChannel.reply(
            nick,
            vec![target.to_string(), channel.to_string(), "is already on channel".to_string()],
        )
    }

    /// ERR_NEEDMOREPARAMS
    pub fn need_more_params(nick: &str, command: &str) -> Message {
        Self::ErrNeedMoreParams.reply(
            nick,
            vec![command.to_string(), "Not enough parameters".to_string()],
        )
    }

    /// ERR_CHANNELISFULL
    pub fn channel_is_full(nick: &str, channel: &str) -> Message {
        Self::ErrChannelIsFull.reply(
            nick,
            vec![channel.to_string(), "Cannot join channel (+l)".to_string()],
        )
    }

    /// ERR_UNKNOWNMODE
    pub fn unknown_mode(nick: &str, mode: char) -> Message {
        Self::ErrUnknownMode.reply(
            nick,
            vec![mode.to_string(), "is unknown mode char to me".to_string()],
        )
    }

    /// ERR_INVITEONLYCHAN
    pub fn invite_only_chan(nick: &str, channel: &str) -> Message {
        Self::ErrInviteOnlyChan.reply(
            nick,
            vec![channel.to_string(), "Cannot join channel (+i)".to_string()],
        )
    }

    /// ERR_BADCHANNELKEY
    pub fn bad_channel_key(nick: &str, channel: &str) -> Message {
        Self::ErrBadChannelKey.reply(
            nick,
            vec![channel.to_string(), "Cannot join channel (+k)".to_string()],
        )
    }

    /// ERR_BADCHANMASK
    pub fn bad_chan_mask(nick: &str, channel: &str) -> Message {
        Self::ErrBadChanMask.reply(nick, vec![channel.to_string(), "Bad Channel Mask".to_string()])
    }

    /// ERR_CHANOPRIVSNEEDED
    pub fn chan_op_privs_needed(nick: &str, channel: &str) -> Message {
        Self::ErrChanOpPrivsNeeded.reply(
            nick,
            vec![channel.to_string(), "You're not channel operator".to_string()],
        )
    }

    /// ERR_USERSDONTMATCH
    pub fn users_dont_match(nick: &str) -> Message {
        Self::ErrUsersDontMatch.reply(
            nick,
            vec!["Cannot change mode for other users".to_string()],
        )
    }

    /// ERR_INVALIDKEY
    pub fn invalid_key(nick: &str, channel: &str) -> Message {
        Self::ErrInvalidKey.reply(
            nick,
            vec![channel.to_string(), "Key is not well-formed".to_string()],
        )
    }
}
