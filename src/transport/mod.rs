//! Transport layer: the reliable (TCP) listener and the shared datagram
//! (UDP) socket, run side by side against the same dispatcher and lobby.

pub mod datagram;
pub mod reliable;

use std::sync::Arc;

use crate::admin::AdminService;
use crate::config::TransportConfig;
use crate::dispatch::Dispatcher;
use crate::lobby::Lobby;
use crate::metrics::Metrics;
use crate::scheduler::Scheduler;

pub use datagram::DatagramHub;

/// Bind both sockets and return their run futures plus the datagram send
/// handle handlers use to push datagrams back out.
pub async fn bind(
    config: TransportConfig,
    lobby: Arc<Lobby>,
    dispatcher: Arc<Dispatcher>,
    admin: Arc<AdminService>,
    scheduler: Arc<Scheduler>,
    metrics: Arc<Metrics>,
) -> anyhow::Result<(
    Arc<reliable::ReliableListener>,
    datagram::DatagramListener,
    Arc<DatagramHub>,
)> {
    let datagram_listener = datagram::DatagramListener {
        lobby: Arc::clone(&lobby),
        dispatcher: Arc::clone(&dispatcher),
        admin: Arc::clone(&admin),
        scheduler: Arc::clone(&scheduler),
        config: config.clone(),
    };
    let (datagram_listener, hub) = datagram_listener.bind().await?;

    let reliable = Arc::new(reliable::ReliableListener {
        lobby,
        dispatcher,
        admin,
        scheduler,
        datagram: Arc::clone(&hub),
        metrics,
        config,
    });
    Ok((reliable, datagram_listener, hub))
}
