//! Default value functions for configuration fields.
//!
//! This module contains all the default value functions used by serde's `#[serde(default = ...)]`
//! attributes throughout the configuration system. Functions are organized by category for
//! easier maintenance.

use super::logging::LogFormat;

// =============================================================================
// Transport Defaults
// =============================================================================

pub const fn default_reliable_port() -> u16 {
    7710
}

pub const fn default_datagram_port() -> u16 {
    7711
}

pub const fn default_idle_timeout_secs() -> u64 {
    60
}

pub const fn default_write_timeout_secs() -> u64 {
    5
}

pub const fn default_max_frame_bytes() -> usize {
    65536
}

// =============================================================================
// Server / Lobby Defaults
// =============================================================================

pub const fn default_max_players_per_room() -> u8 {
    16
}

pub const fn default_max_rooms() -> usize {
    1000
}

pub const fn default_room_name_max_len() -> usize {
    64
}

pub const fn default_player_name_max_len() -> usize {
    32
}

pub const fn default_late_join_allowed() -> bool {
    false
}

pub const fn default_datagram_staleness_window_ms() -> u64 {
    500
}

pub const fn default_room_cleanup_interval_secs() -> u64 {
    60
}

pub const fn default_empty_room_timeout_secs() -> u64 {
    300
}

// =============================================================================
// Scheduler Defaults
// =============================================================================

pub const fn default_scheduler_autostart() -> bool {
    true
}

pub const fn default_scheduler_immediate_interval_ms() -> u64 {
    100
}

pub fn default_scheduler_worker_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
}

// =============================================================================
// Positional Audio Defaults
// =============================================================================

pub const fn default_audio_min_distance() -> f32 {
    1.0
}

pub const fn default_audio_max_distance() -> f32 {
    30.0
}

// =============================================================================
// Admin / Store Defaults
// =============================================================================

pub fn default_admin_table() -> String {
    "bans".to_string()
}

pub fn default_admin_token() -> String {
    String::new()
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
