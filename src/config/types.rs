//! Root configuration types.

use super::defaults::{
    default_admin_table, default_admin_token, default_audio_max_distance,
    default_audio_min_distance,
};
use super::logging::LoggingConfig;
use super::server::{SchedulerConfig, ServerConfig, TransportConfig};
use serde::{Deserialize, Serialize};

/// Root configuration struct for Muster Hub.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            server: ServerConfig::default(),
            scheduler: SchedulerConfig::default(),
            audio: AudioConfig::default(),
            admin: AdminConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Positional audio falloff configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AudioConfig {
    /// Distance under which voice gain is full (1.0).
    #[serde(default = "default_audio_min_distance")]
    pub min_distance: f32,
    /// Distance beyond which voice gain is zero.
    #[serde(default = "default_audio_max_distance")]
    pub max_distance: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            min_distance: default_audio_min_distance(),
            max_distance: default_audio_max_distance(),
        }
    }
}

/// Admin subsystem configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    /// `Store` table name used for ban records.
    #[serde(default = "default_admin_table")]
    pub ban_table: String,
    /// Shared secret admin messages must present. Compared in constant time;
    /// empty (the default) accepts no admin action.
    #[serde(default = "default_admin_token")]
    pub token: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            ban_table: default_admin_table(),
            token: default_admin_token(),
        }
    }
}
