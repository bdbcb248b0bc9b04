//! Admin authorization and the server-wide broadcast's token sanitization:
//! the wire frame every session receives must never carry the secret that
//! authorized it.

use std::sync::Arc;

use bytes::Bytes;
use muster_server::admin::AdminService;
use muster_server::codec;
use muster_server::config::{AudioConfig, ServerConfig};
use muster_server::dispatch::{Channel, Dispatcher, HandlerContext};
use muster_server::error::ErrorKind;
use muster_server::lobby::Lobby;
use muster_server::player::Player;
use muster_server::protocol::messages::{AdminResponse, KickPlayer, ServerBroadcast};
use muster_server::protocol::types::PlayerId;
use muster_server::scheduler::Scheduler;
use muster_server::session::Session;
use muster_server::store::memory::MemoryStore;
use muster_server::transport::DatagramHub;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

const TOKEN: &str = "topsecret-admin-token";

struct Rig {
    lobby: Arc<Lobby>,
    dispatcher: Arc<Dispatcher>,
    admin: Arc<AdminService>,
    scheduler: Arc<Scheduler>,
    datagram: Arc<DatagramHub>,
}

impl Rig {
    async fn new() -> Self {
        let lobby = Lobby::new(ServerConfig::default(), AudioConfig::default());
        let dispatcher = Arc::new(Dispatcher::new());
        muster_server::handlers::register_all(&dispatcher);
        let admin = Arc::new(
            AdminService::new(Arc::clone(&lobby), Arc::new(MemoryStore::new()), "bans".into())
                .with_token(TOKEN.into()),
        );
        let scheduler = Scheduler::new(Default::default());
        let datagram = DatagramHub::bind_ephemeral(Arc::clone(&lobby)).await.unwrap();
        Self {
            lobby,
            dispatcher,
            admin,
            scheduler,
            datagram,
        }
    }

    fn ctx(&self, caller: PlayerId) -> HandlerContext {
        HandlerContext {
            caller,
            channel: Channel::Reliable,
            lobby: Arc::clone(&self.lobby),
            admin: Arc::clone(&self.admin),
            scheduler: Arc::clone(&self.scheduler),
            datagram: Arc::clone(&self.datagram),
        }
    }

    async fn register(&self) -> (PlayerId, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(64);
        let player = Player::new(String::new());
        let player_id = player.id;
        let session = Session::new(player_id, tx);
        self.lobby.register_session(session, player);
        (player_id, rx)
    }

    async fn dispatch<T: serde::Serialize>(&self, caller: PlayerId, id: &str, body: &T) -> Option<ErrorKind> {
        let encoded = codec::encode_body(body).unwrap();
        self.dispatcher.dispatch(id, self.ctx(caller), &encoded).await
    }
}

fn decode_frame<T: DeserializeOwned>(frame: Bytes) -> (String, T) {
    let inner = &frame[4..];
    let parsed = codec::parse_reliable_payload(inner).unwrap();
    (parsed.id.to_string(), codec::decode_body(parsed.body).unwrap())
}

#[tokio::test]
async fn kick_with_wrong_token_is_rejected() {
    let rig = Rig::new().await;
    let (admin_caller, mut admin_rx) = rig.register().await;
    let (target, _target_rx) = rig.register().await;

    rig.dispatch(
        admin_caller,
        "KickPlayer",
        &KickPlayer {
            admin_token: "not-the-token".into(),
            target,
        },
    )
    .await;

    let (id, response): (String, AdminResponse) = decode_frame(admin_rx.recv().await.unwrap());
    assert_eq!(id, "AdminResponse");
    assert!(!response.ack.ok);
    assert_eq!(response.ack.error_kind, Some(ErrorKind::Unauthorized));
}

#[tokio::test]
async fn kick_with_valid_token_removes_player_from_their_room() {
    let rig = Rig::new().await;
    let (admin_caller, mut admin_rx) = rig.register().await;
    let (target, _target_rx) = rig.register().await;

    let room_id = rig
        .lobby
        .create_room(target, "to-be-kicked".into(), None, 4, false)
        .await
        .unwrap();

    rig.dispatch(
        admin_caller,
        "KickPlayer",
        &KickPlayer {
            admin_token: TOKEN.into(),
            target,
        },
    )
    .await;

    let (id, response): (String, AdminResponse) = decode_frame(admin_rx.recv().await.unwrap());
    assert_eq!(id, "AdminResponse");
    assert!(response.ack.ok);
    assert_eq!(rig.lobby.player_room(target).await, None);
    let _ = room_id;
}

#[tokio::test]
async fn server_broadcast_reaches_everyone_without_leaking_the_token() {
    let rig = Rig::new().await;
    let (admin_caller, mut admin_rx) = rig.register().await;
    let (bystander, mut bystander_rx) = rig.register().await;

    rig.dispatch(
        admin_caller,
        "ServerBroadcast",
        &ServerBroadcast {
            admin_token: TOKEN.into(),
            text: "maintenance starting in 5 minutes".into(),
        },
    )
    .await;

    for rx in [&mut admin_rx, &mut bystander_rx] {
        let frame = rx.recv().await.unwrap();
        let raw = frame.to_vec();
        assert!(
            !raw.windows(TOKEN.len()).any(|w| w == TOKEN.as_bytes()),
            "admin token leaked onto the wire"
        );
        let (id, body): (String, muster_server::protocol::messages::ServerBroadcastMessage) =
            decode_frame(frame);
        assert_eq!(id, "ServerBroadcastMessage");
        assert_eq!(body.text, "maintenance starting in 5 minutes");
    }

    // The sender also receives an AdminResponse ack after the broadcast.
    let (id, response): (String, AdminResponse) = decode_frame(admin_rx.recv().await.unwrap());
    assert_eq!(id, "AdminResponse");
    assert!(response.ack.ok);
    let _ = bystander;
}
