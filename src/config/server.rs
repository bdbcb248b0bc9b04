//! Server behavior configuration types: transport, lobby and scheduler knobs.

use super::defaults::{
    default_datagram_port, default_datagram_staleness_window_ms, default_empty_room_timeout_secs,
    default_idle_timeout_secs, default_late_join_allowed, default_max_frame_bytes,
    default_max_players_per_room, default_max_rooms, default_player_name_max_len,
    default_reliable_port, default_room_cleanup_interval_secs, default_room_name_max_len,
    default_scheduler_autostart, default_scheduler_immediate_interval_ms,
    default_scheduler_worker_concurrency, default_write_timeout_secs,
};
use serde::{Deserialize, Serialize};

/// Transport (reliable stream + datagram) configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TransportConfig {
    /// TCP port accepting reliable, length-prefixed frames.
    #[serde(default = "default_reliable_port")]
    pub reliable_port: u16,
    /// UDP port for best-effort datagrams.
    #[serde(default = "default_datagram_port")]
    pub datagram_port: u16,
    /// Soft idle read timeout per session (seconds).
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Hard write timeout per session (seconds).
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
    /// Maximum accepted reliable frame size, in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            reliable_port: default_reliable_port(),
            datagram_port: default_datagram_port(),
            idle_timeout_secs: default_idle_timeout_secs(),
            write_timeout_secs: default_write_timeout_secs(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

/// Lobby configuration: room/player limits and join rules.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Default maximum players per room.
    #[serde(default = "default_max_players_per_room")]
    pub max_players_per_room: u8,
    /// Maximum number of concurrently open rooms.
    #[serde(default = "default_max_rooms")]
    pub max_rooms: usize,
    /// Maximum accepted room name length.
    #[serde(default = "default_room_name_max_len")]
    pub room_name_max_len: usize,
    /// Maximum accepted player name length.
    #[serde(default = "default_player_name_max_len")]
    pub player_name_max_len: usize,
    /// Whether rooms accept late joiners by default (overridable per room).
    #[serde(default = "default_late_join_allowed")]
    pub late_join_allowed: bool,
    /// Width of the acceptance window for out-of-order datagram position updates.
    #[serde(default = "default_datagram_staleness_window_ms")]
    pub datagram_staleness_window_ms: u64,
    /// Interval between sweeps that close empty/expired rooms (seconds).
    #[serde(default = "default_room_cleanup_interval_secs")]
    pub room_cleanup_interval_secs: u64,
    /// Time an empty room may remain open before the cleanup sweep closes it (seconds).
    #[serde(default = "default_empty_room_timeout_secs")]
    pub empty_room_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_players_per_room: default_max_players_per_room(),
            max_rooms: default_max_rooms(),
            room_name_max_len: default_room_name_max_len(),
            player_name_max_len: default_player_name_max_len(),
            late_join_allowed: default_late_join_allowed(),
            datagram_staleness_window_ms: default_datagram_staleness_window_ms(),
            room_cleanup_interval_secs: default_room_cleanup_interval_secs(),
            empty_room_timeout_secs: default_empty_room_timeout_secs(),
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulerConfig {
    /// Start the scheduler's ticker loop automatically on server startup.
    #[serde(default = "default_scheduler_autostart")]
    pub autostart: bool,
    /// Poll interval for the immediate (FIFO) queue, in milliseconds.
    #[serde(default = "default_scheduler_immediate_interval_ms")]
    pub immediate_interval_ms: u64,
    /// Number of concurrent event-handler workers.
    #[serde(default = "default_scheduler_worker_concurrency")]
    pub worker_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            autostart: default_scheduler_autostart(),
            immediate_interval_ms: default_scheduler_immediate_interval_ms(),
            worker_concurrency: default_scheduler_worker_concurrency(),
        }
    }
}
