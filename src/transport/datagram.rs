//! Shared datagram (UDP) socket: one bind for every session, self-identified
//! by the 128-bit session id carried in each datagram's header.

use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::admin::AdminService;
use crate::codec;
use crate::config::TransportConfig;
use crate::dispatch::{Channel, Dispatcher, HandlerContext};
use crate::lobby::Lobby;
use crate::protocol::types::PlayerId;
use crate::scheduler::Scheduler;

/// Send-side handle to the shared UDP socket, keyed off each session's last
/// observed peer address.
pub struct DatagramHub {
    socket: Arc<UdpSocket>,
    lobby: Arc<Lobby>,
}

impl DatagramHub {
    /// Bind an ephemeral socket for tests and standalone construction; the
    /// non-test path goes through [`DatagramListener::bind`] instead, which
    /// binds the configured port.
    pub async fn bind_ephemeral(lobby: Arc<Lobby>) -> anyhow::Result<Arc<Self>> {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await?);
        Ok(Arc::new(Self { socket, lobby }))
    }

    /// Encode and send `body` under `id` to `player_id`'s last-known UDP
    /// peer address. Silently drops if the session has never sent a
    /// datagram yet — there is nowhere to send to.
    pub async fn send_to(&self, player_id: PlayerId, id: &str, body: &[u8]) {
        let Some(session) = self.lobby.session(player_id) else {
            return;
        };
        let Some(addr) = session.datagram_addr() else {
            return;
        };
        let frame = match codec::encode_datagram(id, player_id.0, body) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(%id, error = %err, "failed to frame outgoing datagram");
                return;
            }
        };
        if let Err(err) = self.socket.send_to(&frame, addr).await {
            debug!(%player_id, error = %err, "datagram send failed");
        }
    }
}

pub struct DatagramListener {
    pub lobby: Arc<Lobby>,
    pub dispatcher: Arc<Dispatcher>,
    pub admin: Arc<AdminService>,
    pub scheduler: Arc<Scheduler>,
    pub config: TransportConfig,
}

impl DatagramListener {
    /// Bind the shared socket and return both the run future and the hub
    /// handlers use to send datagrams back out.
    pub async fn bind(self) -> anyhow::Result<(Self, Arc<DatagramHub>)> {
        let addr = format!("0.0.0.0:{}", self.config.datagram_port);
        let socket = Arc::new(UdpSocket::bind(&addr).await?);
        info!(%addr, "datagram listener bound");
        let hub = Arc::new(DatagramHub {
            socket,
            lobby: Arc::clone(&self.lobby),
        });
        Ok((self, hub))
    }

    pub async fn run(self, hub: Arc<DatagramHub>) -> anyhow::Result<()> {
        let mut buf = vec![0u8; codec::MAX_DATAGRAM_BYTES];
        loop {
            let (len, peer) = match hub.socket.recv_from(&mut buf).await {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(error = %err, "datagram recv failed");
                    continue;
                }
            };
            let datagram = &buf[..len];
            let parsed = match codec::parse_datagram(datagram) {
                Ok(parsed) => parsed,
                Err(_) => {
                    warn!(%peer, "dropping oversized or malformed datagram");
                    continue;
                }
            };
            let player_id = PlayerId(parsed.session_id);
            let Some(session) = self.lobby.session(player_id) else {
                debug!(%peer, session_id = %parsed.session_id, "datagram from unknown session, dropping");
                continue;
            };
            session.set_datagram_addr(peer);
            session.touch();

            let ctx = HandlerContext {
                caller: player_id,
                channel: Channel::Datagram,
                lobby: Arc::clone(&self.lobby),
                admin: Arc::clone(&self.admin),
                scheduler: Arc::clone(&self.scheduler),
                datagram: Arc::clone(&hub),
            };
            self.dispatcher.dispatch(parsed.id, ctx, parsed.body).await;
        }
    }
}
