//! Reliable (TCP) listener: accept loop, per-session read/write tasks.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::admin::AdminService;
use crate::codec;
use crate::config::TransportConfig;
use crate::dispatch::{Channel, Dispatcher, HandlerContext};
use crate::lobby::Lobby;
use crate::metrics::Metrics;
use crate::player::{Player, PlayerState};
use crate::protocol::SessionEstablished;
use crate::scheduler::Scheduler;
use crate::session::{Session, SessionState};
use crate::transport::DatagramHub;

pub struct ReliableListener {
    pub lobby: Arc<Lobby>,
    pub dispatcher: Arc<Dispatcher>,
    pub admin: Arc<AdminService>,
    pub scheduler: Arc<Scheduler>,
    pub datagram: Arc<DatagramHub>,
    pub metrics: Arc<Metrics>,
    pub config: TransportConfig,
}

impl ReliableListener {
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let addr = format!("0.0.0.0:{}", self.config.reliable_port);
        let listener = TcpListener::bind(&addr).await?;
        info!(%addr, "reliable listener bound");
        loop {
            let (stream, peer) = listener.accept().await?;
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(err) = this.handle_connection(stream).await {
                    debug!(%peer, error = %err, "reliable connection ended");
                }
            });
        }
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream) -> anyhow::Result<()> {
        let _ = stream.set_nodelay(true);
        let (mut read_half, mut write_half) = stream.into_split();
        let (tx, mut rx) = mpsc::channel::<Bytes>(256);

        let player = Player::new(String::new());
        let player_id = player.id;
        let session = Session::new(player_id, tx);
        self.lobby.register_session(Arc::clone(&session), player);
        self.metrics.record_connect();

        let write_timeout = Duration::from_secs(self.config.write_timeout_secs);
        let writer = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                let write = write_half.write_all(&frame);
                if tokio::time::timeout(write_timeout, write).await.is_err() {
                    warn!("write timed out, closing session");
                    break;
                }
            }
            let _ = write_half.shutdown().await;
        });

        let established = codec::encode_body(&SessionEstablished {
            session_id: player_id.0,
        })?;
        let frame = codec::encode_reliable_frame("SessionEstablished", &established);
        if !session.send_reliable(frame) {
            anyhow::bail!("failed to queue handshake frame");
        }
        session.transition(SessionState::Active);
        self.lobby
            .set_player_state(player_id, PlayerState::Active)
            .await;

        let idle_timeout = Duration::from_secs(self.config.idle_timeout_secs);
        let max_frame_bytes = self.config.max_frame_bytes;
        let read_result = self.read_loop(&mut read_half, &session, idle_timeout, max_frame_bytes).await;
        if let Err(err) = &read_result {
            debug!(%player_id, error = %err, "reliable read loop exited");
        }

        session.transition(SessionState::Draining);
        session.transition(SessionState::Closed);
        self.lobby
            .set_player_state(player_id, PlayerState::Closed)
            .await;
        self.lobby.remove_session(player_id).await;
        self.metrics.record_disconnect();
        drop(session);
        let _ = writer.await;
        read_result
    }

    async fn read_loop(
        &self,
        read_half: &mut tokio::net::tcp::OwnedReadHalf,
        session: &Arc<Session>,
        idle_timeout: Duration,
        max_frame_bytes: usize,
    ) -> anyhow::Result<()> {
        loop {
            let len = match tokio::time::timeout(idle_timeout, read_half.read_u32_le()).await {
                Ok(Ok(len)) => len as usize,
                Ok(Err(err)) => return Err(err.into()),
                Err(_) => anyhow::bail!("idle read timeout"),
            };
            if len > max_frame_bytes {
                anyhow::bail!("frame exceeds max_frame_bytes ({len} > {max_frame_bytes})");
            }
            let mut buf = BytesMut::with_capacity(len);
            buf.resize(len, 0);
            tokio::time::timeout(idle_timeout, read_half.read_exact(&mut buf[..])).await??;
            session.touch();

            let parsed = match codec::parse_reliable_payload(&buf) {
                Ok(parsed) => parsed,
                Err(_) => {
                    warn!("dropping truncated/malformed reliable frame");
                    continue;
                }
            };
            let id = parsed.id.to_string();
            let body = parsed.body.to_vec();

            let ctx = HandlerContext {
                caller: session.id,
                channel: Channel::Reliable,
                lobby: Arc::clone(&self.lobby),
                admin: Arc::clone(&self.admin),
                scheduler: Arc::clone(&self.scheduler),
                datagram: Arc::clone(&self.datagram),
            };
            let outcome = self.dispatcher.dispatch(&id, ctx, &body).await;
            if outcome.is_some() {
                self.metrics.record_handler_error();
            }
            if matches!(outcome, Some(crate::error::ErrorKind::ProtocolViolation)) {
                anyhow::bail!("protocol violation on message {id}");
            }
        }
    }
}
