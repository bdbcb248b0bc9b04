//! Wire message bodies for the handler catalogue. Each type's name is also
//! its wire id, sent verbatim as the ASCII `id` field of every frame.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::protocol::types::{PlayerId, RoomId, RoomSummary, Vec3};

/// Generic acknowledgement shape every request-style response carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
    pub error_kind: Option<ErrorKind>,
    pub message: Option<String>,
}

impl Ack {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            ok: true,
            error_kind: None,
            message: None,
        }
    }

    #[must_use]
    pub fn err(kind: ErrorKind) -> Self {
        Self {
            ok: false,
            error_kind: Some(kind),
            message: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Lobby
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub password: Option<String>,
    pub max_players: u8,
    pub late_join: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub ack: Ack,
    pub room_id: Option<RoomId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub room_id: RoomId,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub ack: Ack,
    pub members: Vec<PlayerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRoomRequest {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRoomResponse {
    pub ack: Ack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRoomListRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRoomListResponse {
    pub rooms: Vec<RoomSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerReadyRequest {
    pub room_id: RoomId,
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerReadyResponse {
    pub ack: Ack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGameRequest {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGameResponse {
    pub ack: Ack,
}

/// Broadcast to existing members when a new player joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerJoinedRoom {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub members: Vec<PlayerId>,
}

/// Broadcast to remaining members when a player leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLeftRoom {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub members: Vec<PlayerId>,
}

/// Broadcast whenever a member's ready state changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerReadyBroadcast {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub ready: bool,
}

/// Broadcast once a room transitions from `Starting` to `InProgress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStartedBroadcast {
    pub room_id: RoomId,
    pub members: Vec<PlayerId>,
}

/// Sent by the room owner to suspend an in-progress match without ending it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseGameRequest {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseGameResponse {
    pub ack: Ack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamePausedBroadcast {
    pub room_id: RoomId,
}

/// Sent by the room owner to resume a paused match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeGameRequest {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeGameResponse {
    pub ack: Ack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResumedBroadcast {
    pub room_id: RoomId,
}

/// Sent by the room owner to explicitly end a match. The room stays open
/// (members are not evicted) but moves to `Finished`, stops accepting joins,
/// and becomes eligible for the cleanup sweep once it has sat idle long
/// enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndGameRequest {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndGameResponse {
    pub ack: Ack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEndedBroadcast {
    pub room_id: RoomId,
}

// ---------------------------------------------------------------------------
// Gameplay (datagram)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerPositionUpdate {
    pub sequence: u32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub velocity: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerAction {
    pub sequence: u32,
    pub action: String,
    pub payload: Vec<u8>,
}

/// Relayed to other room members; carries the originating player so
/// recipients can attribute it without a lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerActionBroadcast {
    pub player_id: PlayerId,
    pub action: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerPositionBroadcast {
    pub player_id: PlayerId,
    pub position: Vec3,
    pub rotation: Vec3,
    pub velocity: Vec3,
}

// ---------------------------------------------------------------------------
// Chat / presence (reliable)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageBroadcast {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub text: String,
    pub server_timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PingRequest {
    pub client_ts: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PongResponse {
    pub client_ts: i64,
    pub server_ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatAck;

// ---------------------------------------------------------------------------
// Voice relay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioPacket {
    pub sequence: u32,
    pub codec: String,
    pub samples: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioPacketRelay {
    pub player_id: PlayerId,
    pub sequence: u32,
    pub codec: String,
    pub samples: Vec<u8>,
    /// Linear gain in `[0.0, 1.0]` computed from positional falloff.
    pub gain: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoiceStateUpdate {
    pub muted: bool,
    pub deafened: bool,
    pub speaking: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PushToTalkState {
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettingsUpdate {
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub input_gain: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoiceQualityMetrics {
    pub packet_loss_pct: f32,
    pub jitter_ms: f32,
    pub round_trip_ms: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDeviceRequest {
    pub requested_device: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDeviceResponse {
    pub ack: Ack,
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KickPlayer {
    pub admin_token: String,
    pub target: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanPlayer {
    pub admin_token: String,
    pub target: PlayerId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnbanPlayer {
    pub admin_token: String,
    pub target: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutePlayer {
    pub admin_token: String,
    pub target: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmutePlayer {
    pub admin_token: String,
    pub target: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerBroadcast {
    pub admin_token: String,
    pub text: String,
}

/// What actually goes out over the wire to every session; unlike
/// [`ServerBroadcast`] it carries no admin token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerBroadcastMessage {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseRoom {
    pub admin_token: String,
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminResponse {
    pub ack: Ack,
}

/// Control frame sent immediately after accept, carrying the session's id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionEstablished {
    pub session_id: uuid::Uuid,
}
