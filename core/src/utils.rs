//! Utility functions and helpers

/// Name grammar checks
pub mod string {
    /// Characters a nickname may not start with (digits are refused separately)
    const NICK_FORBIDDEN_FIRST: &str = ":$#&+~@%";
    /// Characters a nickname may not contain anywhere
    const NICK_FORBIDDEN: &str = "* ,.@?!\t\r\n\0";

    /// Maximum nickname length in characters
    pub const MAX_NICKNAME_LENGTH: usize = 9;

    /// Check if a string is a valid nickname
    pub fn is_valid_nickname(nick: &str) -> bool {
        let mut chars = nick.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return false,
        };

        if nick.chars().count() > MAX_NICKNAME_LENGTH {
            return false;
        }
        if first.is_ascii_digit() || NICK_FORBIDDEN_FIRST.contains(first) {
            return false;
        }

        nick.chars().all(|c| !NICK_FORBIDDEN.contains(c))
    }

    /// Whether a name addresses a channel rather than a nickname
    pub fn is_channel_name(name: &str) -> bool {
        name.starts_with('#')
    }

    /// Check if a channel name is well formed: `#` plus at least one character,
    /// with no comma, BEL, space, CR, LF or NUL anywhere
    pub fn is_valid_channel_name(name: &str) -> bool {
        is_channel_name(name)
            && name.len() >= 2
            && !name.contains(',')
            && !name.contains('\x07')
            && !name.contains([' ', '\r', '\n', '\0'])
    }

    /// Check if a channel key is usable: non-empty, no whitespace
    pub fn is_valid_channel_key(key: &str) -> bool {
        !key.is_empty() && !key.contains(' ') && !key.contains('\t')
    }
}
