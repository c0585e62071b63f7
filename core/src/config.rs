//! Configuration management

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest receive queue accepted by validation
pub const MIN_RECVQ_SIZE: usize = 512;

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server information
    pub server: ServerConfig,
    /// Listener and per-connection limits
    pub connection: ConnectionConfig,
    /// Security settings
    pub security: SecurityConfig,
    /// Registration behaviour
    pub registration: RegistrationConfig,
    /// Channel lifecycle
    pub channels: ChannelsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server name, used as the prefix of every numeric reply
    pub name: String,
    /// Network name announced in the welcome burst
    pub network: String,
    /// Server description
    pub description: String,
    /// Server version
    pub version: String,
}

/// Connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Bind address
    pub bind_address: String,
    /// Listening port
    pub port: u16,
    /// Maximum number of simultaneous sessions
    pub max_clients: usize,
    /// Largest single read from a socket, in bytes
    pub read_chunk_size: usize,
    /// Largest amount of unterminated input kept per session, in bytes
    pub recvq_size: usize,
    /// Outbound queue capacity per session, in lines
    pub sendq_lines: usize,
    /// Seconds a socket write may stall before the connection is dropped
    pub write_timeout_secs: u64,
}

/// Security settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Shared password every client must present with PASS
    pub password: Option<String>,
}

/// Registration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Complete registration as soon as PASS, NICK and USER are accepted
    pub auto_authenticate: bool,
}

/// Channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Delete a channel once its last member is gone
    pub reap_empty: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "irc.localhost".to_string(),
            network: "RelayNet".to_string(),
            description: "Rust IRC relay".to_string(),
            version: format!("relayircd-{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 6667,
            max_clients: 1024,
            read_chunk_size: 4096,
            recvq_size: 8192,
            sendq_lines: 1024,
            write_timeout_secs: 30,
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            auto_authenticate: true,
        }
    }
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self { reap_empty: true }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Address the listener binds to
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.connection.bind_address, self.connection.port)
    }

    /// The configured password, or an empty string if none is set
    pub fn password(&self) -> &str {
        self.security.password.as_deref().unwrap_or("")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.name.is_empty() {
            return Err(Error::Config("Server name cannot be empty".to_string()));
        }
        if self.server.name.contains(' ') {
            return Err(Error::Config("Server name cannot contain spaces".to_string()));
        }

        if self.connection.port == 0 {
            return Err(Error::Config("Port cannot be 0".to_string()));
        }

        match self.security.password.as_deref() {
            None | Some("") => {
                return Err(Error::Config("A server password is required".to_string()));
            }
            Some(password) if password.contains(' ') || password.contains('\t') => {
                return Err(Error::Config(
                    "Server password cannot contain whitespace".to_string(),
                ));
            }
            Some(_) => {}
        }

        if self.connection.max_clients == 0 {
            return Err(Error::Config("Max clients must be greater than 0".to_string()));
        }
        if self.connection.read_chunk_size == 0 {
            return Err(Error::Config("Read chunk size must be greater than 0".to_string()));
        }
        if self.connection.sendq_lines == 0 {
            return Err(Error::Config("SendQ must be greater than 0".to_string()));
        }
        if self.connection.write_timeout_secs == 0 {
            return Err(Error::Config("Write timeout must be greater than 0".to_string()));
        }
        if self.connection.recvq_size < MIN_RECVQ_SIZE {
            return Err(Error::Config(format!(
                "RecvQ must be at least {} bytes",
                MIN_RECVQ_SIZE
            )));
        }

        Ok(())
    }
}
