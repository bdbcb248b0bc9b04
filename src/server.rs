//! Top-level wiring: construct every subsystem once, start both transport
//! listeners, and run the scheduler's room-cleanup sweep alongside them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::info;

use crate::admin::AdminService;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::handlers;
use crate::lobby::Lobby;
use crate::metrics::Metrics;
use crate::scheduler::event::ScheduledEvent;
use crate::scheduler::{EventHandler, Scheduler};
use crate::store::memory::MemoryStore;
use crate::store::Store;
use crate::transport;

const ROOM_CLEANUP_EVENT: &str = "room_cleanup_sweep";

/// Owns every long-lived subsystem. Built once in `main`, then consumed by
/// [`MusterServer::run`].
pub struct MusterServer {
    config: Config,
    lobby: Arc<Lobby>,
    dispatcher: Arc<Dispatcher>,
    admin: Arc<AdminService>,
    scheduler: Arc<Scheduler>,
    metrics: Arc<Metrics>,
}

impl MusterServer {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let metrics = Arc::new(Metrics::new());
        let lobby = Lobby::with_metrics(
            config.server.clone(),
            config.audio.clone(),
            Arc::clone(&metrics),
        );
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let admin = Arc::new(
            AdminService::new(Arc::clone(&lobby), store, config.admin.ban_table.clone())
                .with_token(config.admin.token.clone()),
        );
        let scheduler = Scheduler::new(config.scheduler.clone());
        let dispatcher = Arc::new(Dispatcher::new());
        handlers::register_all(&dispatcher);

        Self {
            config,
            lobby,
            dispatcher,
            admin,
            scheduler,
            metrics,
        }
    }

    #[must_use]
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Bind both transports, start the scheduler, and run until a listener
    /// exits (which only happens on a fatal accept/bind error).
    pub async fn run(self) -> anyhow::Result<()> {
        let (reliable, datagram_listener, hub) = transport::bind(
            self.config.transport.clone(),
            Arc::clone(&self.lobby),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.admin),
            Arc::clone(&self.scheduler),
            Arc::clone(&self.metrics),
        )
        .await?;

        if self.config.scheduler.autostart {
            let cleanup: Arc<dyn EventHandler> = Arc::new(RoomCleanupHandler {
                lobby: Arc::clone(&self.lobby),
                metrics: Arc::clone(&self.metrics),
                empty_room_timeout: Duration::seconds(
                    self.config.server.empty_room_timeout_secs as i64,
                ),
            });
            self.scheduler.run(cleanup);
            self.scheduler
                .schedule_every(
                    ROOM_CLEANUP_EVENT,
                    Duration::seconds(self.config.server.room_cleanup_interval_secs as i64),
                    0,
                )
                .await;
        }

        info!(
            reliable_port = self.config.transport.reliable_port,
            datagram_port = self.config.transport.datagram_port,
            "muster hub starting"
        );

        let reliable_task = tokio::spawn(async move { reliable.run().await });
        let datagram_task = tokio::spawn(async move { datagram_listener.run(hub).await });

        tokio::select! {
            result = reliable_task => result??,
            result = datagram_task => result??,
        }
        Ok(())
    }
}

/// Fired on `room_cleanup_sweep`'s recurring schedule to close rooms stuck
/// in `Finished` whose members never explicitly left.
struct RoomCleanupHandler {
    lobby: Arc<Lobby>,
    metrics: Arc<Metrics>,
    empty_room_timeout: Duration,
}

#[async_trait]
impl EventHandler for RoomCleanupHandler {
    async fn handle(&self, _event: ScheduledEvent) {
        self.metrics.record_scheduler_tick();
        let closed = self.lobby.sweep_expired_rooms(self.empty_room_timeout).await;
        if closed > 0 {
            info!(closed, "cleanup sweep closed expired rooms");
        }
    }
}
