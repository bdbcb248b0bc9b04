//! Configuration module for Muster Hub.
//!
//! This module provides layered configuration management with support for:
//! - JSON configuration files
//! - Environment variable overrides
//! - Stdin input
//! - Sensible defaults
//!
//! # Module Structure
//!
//! - [`types`]: Root `Config` struct, `AudioConfig`, `AdminConfig`
//! - [`server`]: Transport, lobby and scheduler configuration
//! - [`logging`]: Logging configuration
//! - [`loader`]: Configuration loading functions
//! - [`validation`]: Configuration validation functions
//! - [`defaults`]: Default value functions

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod server;
pub mod types;
pub mod validation;

pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use server::{SchedulerConfig, ServerConfig, TransportConfig};
pub use types::{AdminConfig, AudioConfig, Config};
pub use validation::validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.transport.reliable_port, 7710);
        assert_eq!(config.transport.datagram_port, 7711);
        assert_eq!(config.server.max_players_per_room, 16);
        assert_eq!(config.server.max_rooms, 1000);
        assert_eq!(config.scheduler.immediate_interval_ms, 100);
        assert!(config.scheduler.autostart);

        assert_eq!(config.logging.dir, "logs");
        assert_eq!(config.logging.filename, "server.log");
        assert_eq!(config.logging.rotation, "daily");
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(
            config.transport.reliable_port,
            deserialized.transport.reliable_port
        );
        assert_eq!(
            config.server.max_players_per_room,
            deserialized.server.max_players_per_room
        );
        assert_eq!(config.audio.min_distance, deserialized.audio.min_distance);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_log_level_as_str() {
        assert_eq!(LogLevel::Trace.as_str(), "trace");
        assert_eq!(LogLevel::Debug.as_str(), "debug");
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(LogLevel::Error.as_str(), "error");
    }

    #[test]
    fn test_validate_rejects_equal_ports() {
        let mut config = Config::default();
        config.transport.datagram_port = config.transport.reliable_port;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_audio_distance() {
        let mut config = Config::default();
        config.audio.max_distance = config.audio.min_distance;
        assert!(validate(&config).is_err());
    }
}
