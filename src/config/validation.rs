//! Configuration validation functions.

use super::Config;

/// Validate configuration invariants the type system can't express on its own.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.transport.reliable_port == config.transport.datagram_port {
        anyhow::bail!(
            "transport.reliable_port and transport.datagram_port must differ (both {})",
            config.transport.reliable_port
        );
    }

    if config.server.max_players_per_room == 0 {
        anyhow::bail!("server.max_players_per_room must be at least 1");
    }

    if config.audio.min_distance < 0.0 {
        anyhow::bail!("audio.min_distance must not be negative");
    }

    if config.audio.max_distance <= config.audio.min_distance {
        anyhow::bail!(
            "audio.max_distance ({}) must be greater than audio.min_distance ({})",
            config.audio.max_distance,
            config.audio.min_distance
        );
    }

    if config.scheduler.worker_concurrency == 0 {
        anyhow::bail!("scheduler.worker_concurrency must be at least 1");
    }

    Ok(())
}
