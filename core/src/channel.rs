//! Channel state: membership, operators, invitations, topic and modes

use crate::session::ClientId;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Channel modes understood by MODE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    /// Invite only
    InviteOnly = 'i' as isize,
    /// Topic settable by channel operator only
    TopicOps = 't' as isize,
    /// Channel is keyed (password protected)
    Keyed = 'k' as isize,
    /// User limit
    UserLimit = 'l' as isize,
    /// Channel operator status (applies to a member, not the channel)
    Operator = 'o' as isize,
}

impl ChannelMode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(ChannelMode::InviteOnly),
            't' => Some(ChannelMode::TopicOps),
            'k' => Some(ChannelMode::Keyed),
            'l' => Some(ChannelMode::UserLimit),
            'o' => Some(ChannelMode::Operator),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        self as u8 as char
    }
}

/// Why a JOIN was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRefusal {
    InviteOnly,
    BadKey,
    Full,
}

/// Channel member
#[derive(Debug, Clone)]
pub struct ChannelMember {
    pub client_id: ClientId,
    /// Join order within the channel
    pub joined: u64,
    pub operator: bool,
}

/// Channel information and state
#[derive(Debug, Clone)]
pub struct Channel {
    /// Channel name, `#` included
    pub name: String,
    /// Channel topic
    pub topic: Option<String>,
    /// Topic setter
    pub topic_setter: Option<String>,
    /// Topic set time
    pub topic_time: Option<DateTime<Utc>>,
    /// Channel key (password)
    pub key: Option<String>,
    /// User limit
    pub user_limit: Option<usize>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    modes: HashSet<char>,
    members: HashMap<ClientId, ChannelMember>,
    invited: HashSet<ClientId>,
    next_seq: u64,
}

impl Channel {
    /// Create a new, empty channel
    pub fn new(name: String) -> Self {
        Self {
            name,
            topic: None,
            topic_setter: None,
            topic_time: None,
            key: None,
            user_limit: None,
            created_at: Utc::now(),
            modes: HashSet::new(),
            members: HashMap::new(),
            invited: HashSet::new(),
            next_seq: 0,
        }
    }

    /// Check if channel has a specific mode
    pub fn has_mode(&self, mode: ChannelMode) -> bool {
        self.modes.contains(&mode.as_char())
    }

    /// Get channel modes as a string, e.g. `+ikt`
    pub fn modes_string(&self) -> String {
        let mut modes: Vec<char> = self.modes.iter().cloned().collect();
        modes.sort();
        std::iter::once('+').chain(modes).collect()
    }

    /// Arguments belonging to the set modes, in `modes_string` order.
    ///
    /// The key is only revealed when `reveal_key` is set; otherwise it is left out.
    pub fn mode_params(&self, reveal_key: bool) -> Vec<String> {
        let mut params = Vec::new();
        if let Some(key) = self.key.as_ref().filter(|_| reveal_key) {
            params.push(key.clone());
        }
        if let Some(limit) = self.user_limit {
            params.push(limit.to_string());
        }
        params
    }

    /// Add a member. Returns false if already present.
    pub fn add_member(&mut self, client_id: ClientId) -> bool {
        if self.members.contains_key(&client_id) {
            return false;
        }
        let joined = self.next_seq;
        self.next_seq += 1;
        self.members.insert(
            client_id,
            ChannelMember {
                client_id,
                joined,
                operator: false,
            },
        );
        true
    }

    /// Remove a member, and with it any operator status
    pub fn remove_member(&mut self, client_id: &ClientId) -> bool {
        self.members.remove(client_id).is_some()
    }

    /// Drop every trace of a client: membership, operator status, invitation
    pub fn purge(&mut self, client_id: &ClientId) -> bool {
        let was_member = self.remove_member(client_id);
        let was_invited = self.invited.remove(client_id);
        was_member || was_invited
    }

    /// Check if user is in channel
    pub fn has_member(&self, client_id: &ClientId) -> bool {
        self.members.contains_key(client_id)
    }

    /// Get member count
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in join order
    pub fn members(&self) -> Vec<&ChannelMember> {
        let mut members: Vec<&ChannelMember> = self.members.values().collect();
        members.sort_by_key(|m| m.joined);
        members
    }

    /// Member ids in join order
    pub fn member_ids(&self) -> Vec<ClientId> {
        self.members().into_iter().map(|m| m.client_id).collect()
    }

    /// Check if user is an operator
    pub fn is_operator(&self, client_id: &ClientId) -> bool {
        self.members
            .get(client_id)
            .map(|member| member.operator)
            .unwrap_or(false)
    }

    /// Grant or revoke operator status. Fails for non-members.
    pub fn set_operator(&mut self, client_id: &ClientId, is_op: bool) -> bool {
        match self.members.get_mut(client_id) {
            Some(member) => {
                member.operator = is_op;
                true
            }
            None => false,
        }
    }

    /// Record an invitation. Returns false if already invited.
    pub fn invite(&mut self, client_id: ClientId) -> bool {
        self.invited.insert(client_id)
    }

    /// Forget an invitation. Returns false if there was none.
    pub fn uninvite(&mut self, client_id: &ClientId) -> bool {
        self.invited.remove(client_id)
    }

    pub fn is_invited(&self, client_id: &ClientId) -> bool {
        self.invited.contains(client_id)
    }

    /// Set topic
    pub fn set_topic(&mut self, topic: String, setter: String) {
        self.topic = Some(topic);
        self.topic_setter = Some(setter);
        self.topic_time = Some(Utc::now());
    }

    /// Clear topic
    pub fn clear_topic(&mut self) {
        self.topic = None;
        self.topic_setter = None;
        self.topic_time = None;
    }

    /// Check if channel is invite only
    pub fn is_invite_only(&self) -> bool {
        self.has_mode(ChannelMode::InviteOnly)
    }

    /// Check if topic is ops only
    pub fn topic_ops_only(&self) -> bool {
        self.has_mode(ChannelMode::TopicOps)
    }

    /// Check if channel is keyed
    pub fn is_keyed(&self) -> bool {
        self.has_mode(ChannelMode::Keyed)
    }

    /// Check if the member limit is reached
    pub fn is_full(&self) -> bool {
        self.user_limit
            .map_or(false, |limit| self.members.len() >= limit)
    }

    /// Toggle a flag mode (`i` or `t`). Returns whether anything changed.
    pub fn set_flag(&mut self, mode: ChannelMode, on: bool) -> bool {
        let c = mode.as_char();
        if on {
            self.modes.insert(c)
        } else {
            self.modes.remove(&c)
        }
    }

    /// Set channel key
    pub fn set_key(&mut self, key: Option<String>) {
        let has_key = key.is_some();
        self.key = key;
        self.set_flag(ChannelMode::Keyed, has_key);
    }

    /// Set user limit
    pub fn set_user_limit(&mut self, limit: Option<usize>) {
        self.user_limit = limit;
        self.set_flag(ChannelMode::UserLimit, limit.is_some());
    }

    /// Decide whether `client_id` may join with the supplied key.
    ///
    /// Checks run invite-only, then key, then limit; an invitation does not
    /// bypass a full channel.
    pub fn check_join(&self, client_id: &ClientId, key: Option<&str>) -> Result<(), JoinRefusal> {
        if self.is_invite_only() && !self.is_invited(client_id) {
            return Err(JoinRefusal::InviteOnly);
        }
        if self.is_keyed() && self.key.as_deref() != key {
            return Err(JoinRefusal::BadKey);
        }
        if self.has_mode(ChannelMode::UserLimit) && self.is_full() {
            return Err(JoinRefusal::Full);
        }
        Ok(())
    }
}
