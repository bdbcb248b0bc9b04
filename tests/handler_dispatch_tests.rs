//! End-to-end handler coverage: drive real wire frames through the
//! `Dispatcher` exactly as the transport listeners would, and read the
//! replies back off each player's own session queue.

use std::sync::Arc;

use bytes::Bytes;
use muster_server::admin::AdminService;
use muster_server::codec;
use muster_server::config::{AudioConfig, ServerConfig};
use muster_server::dispatch::{Channel, Dispatcher, HandlerContext};
use muster_server::error::ErrorKind;
use muster_server::lobby::Lobby;
use muster_server::player::Player;
use muster_server::protocol::messages::{
    ChatMessage, ChatMessageBroadcast, CreateRoomRequest, CreateRoomResponse, GetRoomListRequest,
    GetRoomListResponse, JoinRoomRequest, JoinRoomResponse, LeaveRoomRequest, LeaveRoomResponse,
    PlayerLeftRoom, PlayerPositionUpdate,
};
use muster_server::protocol::types::{PlayerId, Vec3};
use muster_server::scheduler::Scheduler;
use muster_server::session::Session;
use muster_server::store::memory::MemoryStore;
use muster_server::transport::DatagramHub;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

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
        let admin = Arc::new(AdminService::new(
            Arc::clone(&lobby),
            Arc::new(MemoryStore::new()),
            "bans".into(),
        ));
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

    fn ctx(&self, caller: PlayerId, channel: Channel) -> HandlerContext {
        HandlerContext {
            caller,
            channel,
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

    async fn send_reliable<T: serde::Serialize>(
        &self,
        caller: PlayerId,
        id: &str,
        body: &T,
    ) -> Option<ErrorKind> {
        let encoded = codec::encode_body(body).unwrap();
        self.dispatcher
            .dispatch(id, self.ctx(caller, Channel::Reliable), &encoded)
            .await
    }

    async fn send_datagram<T: serde::Serialize>(
        &self,
        caller: PlayerId,
        id: &str,
        body: &T,
    ) -> Option<ErrorKind> {
        let encoded = codec::encode_body(body).unwrap();
        self.dispatcher
            .dispatch(id, self.ctx(caller, Channel::Datagram), &encoded)
            .await
    }
}

/// Strip the outer `u32` length prefix and decode `(id, body)` the way the
/// reliable transport's writer would have framed it.
fn decode_frame<T: DeserializeOwned>(frame: Bytes) -> (String, T) {
    let inner = &frame[4..];
    let parsed = codec::parse_reliable_payload(inner).unwrap();
    let id = parsed.id.to_string();
    let body = codec::decode_body(parsed.body).unwrap();
    (id, body)
}

#[tokio::test]
async fn create_and_join_round_trip_with_broadcast() {
    let rig = Rig::new().await;
    let (owner, mut owner_rx) = rig.register().await;
    let (guest, mut guest_rx) = rig.register().await;

    let outcome = rig
        .send_reliable(
            owner,
            "CreateRoomRequest",
            &CreateRoomRequest {
                name: "dispatch-test".into(),
                password: None,
                max_players: 4,
                late_join: false,
            },
        )
        .await;
    assert_eq!(outcome, None);

    let (id, response): (String, CreateRoomResponse) = decode_frame(owner_rx.recv().await.unwrap());
    assert_eq!(id, "CreateRoomResponse");
    assert!(response.ack.ok);
    let room_id = response.room_id.unwrap();

    let outcome = rig
        .send_reliable(
            guest,
            "JoinRoomRequest",
            &JoinRoomRequest {
                room_id,
                password: None,
            },
        )
        .await;
    assert_eq!(outcome, None);

    let (id, response): (String, JoinRoomResponse) = decode_frame(guest_rx.recv().await.unwrap());
    assert_eq!(id, "JoinRoomResponse");
    assert!(response.ack.ok);
    assert_eq!(response.members.len(), 2);

    // The owner, already in the room, gets told about the new member.
    let (id, _body): (String, muster_server::protocol::messages::PlayerJoinedRoom) =
        decode_frame(owner_rx.recv().await.unwrap());
    assert_eq!(id, "PlayerJoinedRoom");
}

#[tokio::test]
async fn chat_message_reaches_every_room_member() {
    let rig = Rig::new().await;
    let (owner, mut owner_rx) = rig.register().await;
    let (guest, mut guest_rx) = rig.register().await;

    let room_id = rig
        .lobby
        .create_room(owner, "chat-room".into(), None, 4, false)
        .await
        .unwrap();
    rig.lobby.join_room(guest, room_id, None).await.unwrap();
    // Drain the PlayerJoinedRoom broadcast the owner just received.
    let _ = owner_rx.recv().await.unwrap();

    rig.send_reliable(
        guest,
        "ChatMessage",
        &ChatMessage {
            room_id,
            text: "gg".into(),
        },
    )
    .await;

    let (id, body): (String, ChatMessageBroadcast) = decode_frame(owner_rx.recv().await.unwrap());
    assert_eq!(id, "ChatMessageBroadcast");
    assert_eq!(body.text, "gg");
    assert_eq!(body.player_id, guest);

    let (id, body): (String, ChatMessageBroadcast) = decode_frame(guest_rx.recv().await.unwrap());
    assert_eq!(id, "ChatMessageBroadcast");
    assert_eq!(body.text, "gg");
}

#[tokio::test]
async fn stale_datagram_sequence_does_not_move_the_player() {
    let rig = Rig::new().await;
    let (player, _rx) = rig.register().await;

    let first = Vec3 { x: 1.0, y: 1.0, z: 1.0 };
    let outcome = rig
        .send_datagram(
            player,
            "PlayerPositionUpdate",
            &PlayerPositionUpdate {
                sequence: 10,
                position: first,
                rotation: Vec3::zero(),
                velocity: Vec3::zero(),
            },
        )
        .await;
    assert_eq!(outcome, None);
    assert_eq!(rig.lobby.player_position(player).await, Some(first));

    let stale = Vec3 { x: 9.0, y: 9.0, z: 9.0 };
    rig.send_datagram(
        player,
        "PlayerPositionUpdate",
        &PlayerPositionUpdate {
            sequence: 10,
            position: stale,
            rotation: Vec3::zero(),
            velocity: Vec3::zero(),
        },
    )
    .await;

    // Sequence 10 was already accepted once; the repeat must not overwrite it.
    assert_eq!(rig.lobby.player_position(player).await, Some(first));
}

#[tokio::test]
async fn leaving_updates_the_public_room_listing() {
    let rig = Rig::new().await;
    let (owner, mut owner_rx) = rig.register().await;
    let (guest, mut guest_rx) = rig.register().await;

    let room_id = rig
        .lobby
        .create_room(owner, "leave-test".into(), None, 4, false)
        .await
        .unwrap();
    rig.lobby.join_room(guest, room_id, None).await.unwrap();
    let _ = owner_rx.recv().await.unwrap(); // PlayerJoinedRoom

    rig.send_reliable(guest, "LeaveRoomRequest", &LeaveRoomRequest { room_id })
        .await;

    let (id, response): (String, LeaveRoomResponse) = decode_frame(guest_rx.recv().await.unwrap());
    assert_eq!(id, "LeaveRoomResponse");
    assert!(response.ack.ok);

    let (id, body): (String, PlayerLeftRoom) = decode_frame(owner_rx.recv().await.unwrap());
    assert_eq!(id, "PlayerLeftRoom");
    assert_eq!(body.player_id, guest);
    assert_eq!(body.members.len(), 1);

    rig.send_reliable(owner, "GetRoomListRequest", &GetRoomListRequest)
        .await;
    let (id, response): (String, GetRoomListResponse) = decode_frame(owner_rx.recv().await.unwrap());
    assert_eq!(id, "GetRoomListResponse");
    assert!(response.rooms.iter().any(|r| r.room_id == room_id));
    assert_eq!(
        response.rooms.iter().find(|r| r.room_id == room_id).unwrap().player_count,
        1
    );
}
