//! Server configuration, loaded from TOML.
//!
//! Every section and every key is optional; an empty file yields
//! [`LobbyConfig::default`].
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3003"
//! idle_timeout_secs = 0
//! log_level = "info"
//!
//! [rooms]
//! capacity = 6
//! max_nickname_len = 32
//! max_code_attempts = 32
//! reconnect_bypasses_capacity = true
//! reconnect_grace_secs = 0
//!
//! [storage]
//! backend = "memory"
//! path = "lobbyforge.db"
//! recovery = "purge"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use lobbyforge_room::{RecoveryMode, RoomConfig};
use serde::{Deserialize, Serialize};

/// Errors from loading a [`LobbyConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LobbyConfig {
    pub server: ServerSection,
    pub rooms: RoomsSection,
    pub storage: StorageSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub bind: String,
    /// Seconds without a frame before a connection is dropped. 0 disables.
    pub idle_timeout_secs: u64,
    /// Default `tracing` filter; `RUST_LOG` overrides it.
    pub log_level: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3003".to_string(),
            idle_timeout_secs: 0,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoomsSection {
    pub capacity: usize,
    pub max_nickname_len: usize,
    pub max_code_attempts: u32,
    pub reconnect_bypasses_capacity: bool,
    pub reconnect_grace_secs: u64,
}

impl Default for RoomsSection {
    fn default() -> Self {
        let defaults = RoomConfig::default();
        Self {
            capacity: defaults.capacity,
            max_nickname_len: defaults.max_nickname_len,
            max_code_attempts: defaults.max_code_attempts,
            reconnect_bypasses_capacity: defaults.reconnect_bypasses_capacity,
            reconnect_grace_secs: defaults.reconnect_grace.as_secs(),
        }
    }
}

/// Where rooms and match history live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; nothing survives a restart.
    #[default]
    Memory,
    /// A SQLite file at `storage.path`.
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    pub backend: StorageBackend,
    pub path: String,
    pub recovery: RecoveryMode,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: "lobbyforge.db".to_string(),
            recovery: RecoveryMode::Purge,
        }
    }
}

impl LobbyConfig {
    /// Reads and validates the TOML file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        content.parse()
    }

    /// Rejects values no room could work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rooms.capacity == 0 {
            return Err(ConfigError::Invalid("rooms.capacity must be at least 1".into()));
        }
        if self.rooms.max_nickname_len == 0 {
            return Err(ConfigError::Invalid(
                "rooms.max_nickname_len must be at least 1".into(),
            ));
        }
        if self.rooms.max_code_attempts == 0 {
            return Err(ConfigError::Invalid(
                "rooms.max_code_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The room settings handed to the router.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            capacity: self.rooms.capacity,
            max_nickname_len: self.rooms.max_nickname_len,
            max_code_attempts: self.rooms.max_code_attempts,
            reconnect_bypasses_capacity: self.rooms.reconnect_bypasses_capacity,
            reconnect_grace: Duration::from_secs(self.rooms.reconnect_grace_secs),
        }
    }

    /// `None` when idle connections are never dropped.
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.server.idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl std::str::FromStr for LobbyConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: LobbyConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
