#![cfg_attr(not(test), deny(clippy::panic))]

use clap::Parser;
use muster_server::config;
use muster_server::logging;
use muster_server::server::MusterServer;

/// Muster Hub -- dual-transport (TCP + UDP) real-time multiplayer lobby and
/// scheduler server.
#[derive(Parser, Debug)]
#[command(name = "muster-server")]
#[command(about = "A dual-transport real-time multiplayer game server hub")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server. Useful
    /// for CI/CD pipelines and pre-deployment checks.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit. Useful
    /// for debugging configuration loading from multiple sources.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load();

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Reliable port: {}", cfg.transport.reliable_port);
                println!("  Datagram port: {}", cfg.transport.datagram_port);
                println!("  Max players per room: {}", cfg.server.max_players_per_room);
                println!("  Max rooms: {}", cfg.server.max_rooms);
                println!("  Scheduler autostart: {}", cfg.scheduler.autostart);
                println!(
                    "  Admin token configured: {}",
                    !cfg.admin.token.is_empty()
                );
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result?;

    logging::init_with_config(&cfg.logging);

    tracing::info!(
        reliable_port = cfg.transport.reliable_port,
        datagram_port = cfg.transport.datagram_port,
        "starting muster hub"
    );

    let server = MusterServer::new(cfg);
    if let Err(err) = server.run().await {
        tracing::error!(error = %err, "muster hub exited with a fatal error");
        std::process::exit(2);
    }
    Ok(())
}
