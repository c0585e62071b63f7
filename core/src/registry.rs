//! Authoritative tables of sessions, nicknames and channels
//!
//! Owned by the server engine and only mutated through it. The nickname index
//! always agrees with `Session::nickname`, and channel membership never refers
//! to a session that has been removed.

use crate::channel::Channel;
use crate::session::{ClientId, Session};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Refused registry updates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("nickname {0} is already in use")]
    NicknameInUse(String),
    #[error("no such session")]
    NoSuchSession,
}

/// Everything the event loop knows about connected clients and channels
#[derive(Debug, Default)]
pub struct Registry {
    sessions: HashMap<ClientId, Session>,
    nicknames: HashMap<String, ClientId>,
    channels: HashMap<String, Channel>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_session(&mut self, session: Session) {
        self.sessions.insert(session.id, session);
    }

    pub fn session(&self, id: &ClientId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn session_mut(&mut self, id: &ClientId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn session_ids(&self) -> Vec<ClientId> {
        self.sessions.keys().copied().collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Look up a session by nickname (case-sensitive)
    pub fn find_by_nick(&self, nick: &str) -> Option<ClientId> {
        self.nicknames.get(nick).copied()
    }

    pub fn nick_in_use(&self, nick: &str) -> bool {
        self.nicknames.contains_key(nick)
    }

    /// Give a session a nickname, releasing its previous one.
    ///
    /// Fails without touching anything if the name belongs to another session.
    /// Returns the previous nickname on success.
    pub fn set_nickname(
        &mut self,
        id: &ClientId,
        nick: &str,
    ) -> Result<Option<String>, RegistryError> {
        if let Some(owner) = self.nicknames.get(nick) {
            if owner != id {
                return Err(RegistryError::NicknameInUse(nick.to_string()));
            }
        }
        let session = self
            .sessions
            .get_mut(id)
            .ok_or(RegistryError::NoSuchSession)?;

        let old = session.nickname.replace(nick.to_string());
        if let Some(ref old_nick) = old {
            self.nicknames.remove(old_nick);
        }
        self.nicknames.insert(nick.to_string(), *id);
        Ok(old)
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(name)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Insert a freshly created channel
    pub fn insert_channel(&mut self, channel: Channel) {
        self.channels.insert(channel.name.clone(), channel);
    }

    /// Delete a channel if it has no members left
    pub fn reap_channel(&mut self, name: &str) -> bool {
        match self.channels.get(name) {
            Some(channel) if channel.is_empty() => {
                self.channels.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Every other session sharing at least one channel with `id`, each once
    pub fn peers_of(&self, id: &ClientId) -> Vec<ClientId> {
        let mut seen = HashSet::new();
        let mut peers = Vec::new();
        for channel in self.channels.values().filter(|c| c.has_member(id)) {
            for member in channel.member_ids() {
                if member != *id && seen.insert(member) {
                    peers.push(member);
                }
            }
        }
        peers
    }

    /// Remove a session and every reference to it.
    ///
    /// Returns the session together with the channels it was purged from, or
    /// `None` if it was already gone.
    pub fn remove_session(&mut self, id: &ClientId) -> Option<(Session, Vec<String>)> {
        let session = self.sessions.remove(id)?;

        if let Some(ref nick) = session.nickname {
            if self.nicknames.get(nick) == Some(id) {
                self.nicknames.remove(nick);
            }
        }

        let mut touched = Vec::new();
        for channel in self.channels.values_mut() {
            if channel.purge(id) {
                touched.push(channel.name.clone());
            }
        }
        touched.sort();

        Some((session, touched))
    }
}
