//! Protocol line tokenizing and serialization
//!
//! Inbound lines carry a verb and parameters only. A parameter starting with `:`
//! swallows the rest of the line, spaces included. Outbound lines may carry a
//! server or user prefix.

use std::fmt;

/// Longest outbound line, CRLF included
pub const MAX_LINE_LENGTH: usize = 512;

/// Message prefix (server or user)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefix {
    /// Server name
    Server(String),
    /// User prefix (nick!user@host)
    User {
        nick: String,
        user: String,
        host: String,
    },
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Server(name) => write!(f, "{}", name),
            Prefix::User { nick, user, host } => write!(f, "{}!{}@{}", nick, user, host),
        }
    }
}

/// Command verbs understood by the relay, plus the outbound-only forms
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    // Registration
    Password,
    Nick,
    User,
    Authenticate,

    // Channel operations
    Join,
    Part,
    Kick,
    Invite,
    Topic,
    Mode,

    // Messaging
    PrivMsg,
    Notice,

    // Connection upkeep
    Ping,
    Pong,
    Quit,
    Error,

    /// Three-digit numeric reply
    Numeric(u16),
    /// Anything else, kept verbatim so it can be reported back
    Custom(String),
}

impl MessageType {
    /// Look a verb up in the command table. Matching is case-sensitive.
    pub fn from_verb(verb: &str) -> Self {
        match verb {
            "PASS" => MessageType::Password,
            "NICK" => MessageType::Nick,
            "USER" => MessageType::User,
            "AUTHENTICATE" => MessageType::Authenticate,
            "JOIN" => MessageType::Join,
            "PART" => MessageType::Part,
            "KICK" => MessageType::Kick,
            "INVITE" => MessageType::Invite,
            "TOPIC" => MessageType::Topic,
            "MODE" => MessageType::Mode,
            "PRIVMSG" => MessageType::PrivMsg,
            "NOTICE" => MessageType::Notice,
            "PING" => MessageType::Ping,
            "PONG" => MessageType::Pong,
            "QUIT" => MessageType::Quit,
            "ERROR" => MessageType::Error,
            _ => MessageType::Custom(verb.to_string()),
        }
    }

    /// Whether a session may issue this command before it is authenticated
    pub fn allowed_before_registration(&self) -> bool {
        matches!(
            self,
            MessageType::Password
                | MessageType::Nick
                | MessageType::User
                | MessageType::Authenticate
                | MessageType::Ping
                | MessageType::Pong
                | MessageType::Quit
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageType::Password => "PASS",
            MessageType::Nick => "NICK",
            MessageType::User => "USER",
            MessageType::Authenticate => "AUTHENTICATE",
            MessageType::Join => "JOIN",
            MessageType::Part => "PART",
            MessageType::Kick => "KICK",
            MessageType::Invite => "INVITE",
            MessageType::Topic => "TOPIC",
            MessageType::Mode => "MODE",
            MessageType::PrivMsg => "PRIVMSG",
            MessageType::Notice => "NOTICE",
            MessageType::Ping => "PING",
            MessageType::Pong => "PONG",
            MessageType::Quit => "QUIT",
            MessageType::Error => "ERROR",
            MessageType::Numeric(code) => return write!(f, "{:03}", code),
            MessageType::Custom(cmd) => cmd,
        };
        write!(f, "{}", s)
    }
}

/// Split one line into tokens.
///
/// Leading spaces before each token are skipped. A token starting with `:` takes
/// the remainder of the line (without the colon) and ends tokenizing.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = line;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            tokens.push(trailing.to_string());
            break;
        }
        match rest.find(' ') {
            Some(end) => {
                tokens.push(rest[..end].to_string());
                rest = &rest[end + 1..];
            }
            None => {
                tokens.push(rest.to_string());
                break;
            }
        }
    }

    tokens
}

/// One protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Optional prefix (server or user)
    pub prefix: Option<Prefix>,
    /// Message command/type
    pub command: MessageType,
    /// Message parameters
    pub params: Vec<String>,
}

impl Message {
    /// Create a new message
    pub fn new(command: MessageType, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command,
            params,
        }
    }

    /// Create a new message with prefix
    pub fn with_prefix(prefix: Prefix, command: MessageType, params: Vec<String>) -> Self {
        Self {
            prefix: Some(prefix),
            command,
            params,
        }
    }

    /// Replace the prefix, keeping command and parameters
    pub fn prefixed(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Parse one framed line. The first token is the verb.
    ///
    /// A line still carrying a CR or NUL byte is refused whole, so neither can
    /// end up inside a relayed parameter.
    pub fn parse(line: &str) -> crate::Result<Self> {
        if line.contains(['\r', '\0']) {
            return Err(crate::Error::MessageParse(
                "Control character inside line".to_string(),
            ));
        }
        let mut tokens = tokenize(line).into_iter();
        let verb = tokens
            .next()
            .ok_or_else(|| crate::Error::MessageParse("Empty message".to_string()))?;

        Ok(Message::new(MessageType::from_verb(&verb), tokens.collect()))
    }

    /// Serialize to wire form, CRLF included
    pub fn to_wire(&self) -> String {
        format!("{}\r\n", self)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command)?;

        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            let needs_colon =
                i == last && (param.is_empty() || param.contains(' ') || param.starts_with(':'));
            if needs_colon {
                write!(f, " :{}", param)?;
            } else {
                write!(f, " {}", param)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_trailing_parameter() {
        assert_eq!(
            tokenize("USER a 0 0 :Alice Liddell"),
            vec!["USER", "a", "0", "0", "Alice Liddell"]
        );
    }

    #[test]
    fn test_tokenize_collapses_spaces() {
        assert_eq!(tokenize("  JOIN   #test  key  "), vec!["JOIN", "#test", "key"]);
    }

    #[test]
    fn test_tokenize_empty_trailing() {
        assert_eq!(tokenize("TOPIC #test :"), vec!["TOPIC", "#test", ""]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("    ").is_empty());
    }

    #[test]
    fn test_tokenize_colon_inside_token_is_literal() {
        assert_eq!(tokenize("PRIVMSG bob a:b :c d"), vec!["PRIVMSG", "bob", "a:b", "c d"]);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        let msg = Message::parse("JOIN #chan").unwrap();
        assert_eq!(msg.command, MessageType::Join);
        assert_eq!(msg.params, vec!["#chan"]);

        let msg = Message::parse("join #chan").unwrap();
        assert_eq!(msg.command, MessageType::Custom("join".to_string()));
    }

    #[test]
    fn test_parse_empty_line_fails() {
        assert!(Message::parse("").is_err());
    }

    #[test]
    fn test_parse_refuses_embedded_cr_and_nul() {
        assert!(Message::parse("PRIVMSG bob :hi\r:irc.test 001 bob :spoofed").is_err());
        assert!(Message::parse("TOPIC #test :a\0b").is_err());
        assert!(Message::parse("PRIVMSG bob :tab\tis fine").is_ok());
    }

    #[test]
    fn test_serialize_with_user_prefix() {
        let msg = Message::with_prefix(
            Prefix::User {
                nick: "alice".to_string(),
                user: "a".to_string(),
                host: "127.0.0.1".to_string(),
            },
            MessageType::PrivMsg,
            vec!["#test".to_string(), "hello there".to_string()],
        );
        assert_eq!(msg.to_wire(), ":alice!a@127.0.0.1 PRIVMSG #test :hello there\r\n");
    }

    #[test]
    fn test_serialize_numeric_pads_code() {
        let msg = Message::with_prefix(
            Prefix::Server("irc.test".to_string()),
            MessageType::Numeric(1),
            vec!["alice".to_string(), "Welcome".to_string()],
        );
        assert_eq!(msg.to_string(), ":irc.test 001 alice Welcome");
    }

    #[test]
    fn test_serialize_empty_last_param_gets_colon() {
        let msg = Message::new(MessageType::Topic, vec!["#test".to_string(), String::new()]);
        assert_eq!(msg.to_string(), "TOPIC #test :");
    }
}
