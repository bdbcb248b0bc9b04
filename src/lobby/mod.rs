//! The lobby: room and player registries plus the operations handlers call
//! into. Rooms and players live directly in `DashMap`s here rather than
//! behind a pluggable storage trait — neither survives a restart.

pub mod broadcast;
pub mod positional;

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::{AudioConfig, ServerConfig};
use crate::error::ErrorKind;
use crate::metrics::Metrics;
use crate::player::{Player, PlayerState};
use crate::protocol::room::{Room, RoomState};
use crate::protocol::types::{PlayerId, RoomId, RoomSummary, Vec3};
use crate::protocol::{
    GameEndedBroadcast, GamePausedBroadcast, GameResumedBroadcast, GameStartedBroadcast,
    PlayerJoinedRoom, PlayerLeftRoom,
};
use crate::session::Session;

/// Shared lobby state: every room, every player, and the live session
/// handles used to push broadcasts back out.
pub struct Lobby {
    rooms: DashMap<RoomId, Mutex<Room>>,
    players: DashMap<PlayerId, Mutex<Player>>,
    sessions: DashMap<PlayerId, Arc<Session>>,
    server: ServerConfig,
    audio: AudioConfig,
    metrics: Arc<Metrics>,
}

impl Lobby {
    #[must_use]
    pub fn new(server: ServerConfig, audio: AudioConfig) -> Arc<Self> {
        Self::with_metrics(server, audio, Arc::new(Metrics::new()))
    }

    #[must_use]
    pub fn with_metrics(server: ServerConfig, audio: AudioConfig, metrics: Arc<Metrics>) -> Arc<Self> {
        Arc::new(Self {
            rooms: DashMap::new(),
            players: DashMap::new(),
            sessions: DashMap::new(),
            server,
            audio,
            metrics,
        })
    }

    pub fn register_session(&self, session: Arc<Session>, player: Player) {
        self.players.insert(player.id, Mutex::new(player));
        self.sessions.insert(session.id, session);
    }

    /// Tear down a disconnected player: leaves its room (if any) and drops
    /// both registry entries. Returns the room it was in, if any, so the
    /// caller can broadcast the departure.
    pub async fn remove_session(&self, player_id: PlayerId) -> Option<RoomId> {
        self.sessions.remove(&player_id);
        let Some((_, player_lock)) = self.players.remove(&player_id) else {
            return None;
        };
        let player = player_lock.into_inner();
        if let Some(room_id) = player.room {
            self.leave_room_internal(room_id, player_id).await;
            return Some(room_id);
        }
        None
    }

    pub fn session(&self, player_id: PlayerId) -> Option<Arc<Session>> {
        self.sessions.get(&player_id).map(|entry| entry.value().clone())
    }

    pub async fn create_room(
        &self,
        owner: PlayerId,
        name: String,
        password: Option<String>,
        max_players: u8,
        late_join: bool,
    ) -> Result<RoomId, ErrorKind> {
        if self.rooms.len() >= self.server.max_rooms {
            return Err(ErrorKind::Full);
        }
        if name.is_empty() || name.len() > self.server.room_name_max_len {
            return Err(ErrorKind::ProtocolViolation);
        }
        let max_players = max_players.min(self.server.max_players_per_room).max(1);
        let mut room = Room::new(owner, name, password, max_players, late_join);
        room.members.insert(owner);
        let room_id = room.id;
        self.rooms.insert(room_id, Mutex::new(room));
        self.set_player_room(owner, Some(room_id)).await;
        self.metrics.record_room_created();
        info!(%room_id, %owner, "room created");
        Ok(room_id)
    }

    pub async fn join_room(
        &self,
        player_id: PlayerId,
        room_id: RoomId,
        password: Option<&str>,
    ) -> Result<Vec<PlayerId>, ErrorKind> {
        let room_entry = self.rooms.get(&room_id).ok_or(ErrorKind::NotFound)?;
        let mut room = room_entry.lock().await;
        if !room.check_password(password) {
            return Err(ErrorKind::WrongPassword);
        }
        room.add_member(player_id)?;
        let members: Vec<PlayerId> = room.members.iter().copied().collect();
        drop(room);
        self.set_player_room(player_id, Some(room_id)).await;
        self.metrics.record_room_joined();
        self.broadcast_joined(room_id, player_id, &members).await;
        Ok(members)
    }

    pub async fn leave_room(&self, player_id: PlayerId, room_id: RoomId) -> Result<(), ErrorKind> {
        self.leave_room_internal(room_id, player_id).await;
        Ok(())
    }

    async fn leave_room_internal(&self, room_id: RoomId, player_id: PlayerId) {
        let Some(room_entry) = self.rooms.get(&room_id) else {
            return;
        };
        let mut room = room_entry.lock().await;
        let now_empty = room.remove_member(player_id);
        let members: Vec<PlayerId> = room.members.iter().copied().collect();
        drop(room);
        self.set_player_room(player_id, None).await;
        if now_empty {
            self.rooms.remove(&room_id);
            self.metrics.record_room_closed();
            info!(%room_id, "room closed, empty after departure");
        } else {
            self.broadcast_left(room_id, player_id, &members).await;
        }
    }

    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut summaries = Vec::with_capacity(self.rooms.len());
        for entry in self.rooms.iter() {
            if let Ok(room) = entry.value().try_lock() {
                summaries.push(RoomSummary {
                    room_id: room.id,
                    name: room.name.clone(),
                    player_count: room.members.len() as u8,
                    max_players: room.max_players,
                    is_private: room.is_private(),
                    state: room.state,
                });
            }
        }
        summaries
    }

    pub async fn set_ready(
        &self,
        player_id: PlayerId,
        room_id: RoomId,
        ready: bool,
    ) -> Result<(), ErrorKind> {
        let room_entry = self.rooms.get(&room_id).ok_or(ErrorKind::NotFound)?;
        let mut room = room_entry.lock().await;
        room.set_ready(player_id, ready)
    }

    pub async fn start_game(&self, player_id: PlayerId, room_id: RoomId) -> Result<(), ErrorKind> {
        let room_entry = self.rooms.get(&room_id).ok_or(ErrorKind::NotFound)?;
        let mut room = room_entry.lock().await;
        if room.owner != player_id {
            return Err(ErrorKind::Unauthorized);
        }
        if !room.all_ready() {
            return Err(ErrorKind::ProtocolViolation);
        }
        room.transition(RoomState::Starting)?;
        room.transition(RoomState::InProgress)?;
        let members: Vec<PlayerId> = room.members.iter().copied().collect();
        drop(room);
        self.broadcast_started(room_id, &members).await;
        Ok(())
    }

    /// Suspend an in-progress match. Only the room owner may pause it.
    pub async fn pause_game(&self, player_id: PlayerId, room_id: RoomId) -> Result<(), ErrorKind> {
        let room_entry = self.rooms.get(&room_id).ok_or(ErrorKind::NotFound)?;
        let mut room = room_entry.lock().await;
        if room.owner != player_id {
            return Err(ErrorKind::Unauthorized);
        }
        room.transition(RoomState::Paused)?;
        drop(room);
        self.broadcast_to_room(room_id, "GamePausedBroadcast", &GamePausedBroadcast { room_id }, None)
            .await;
        Ok(())
    }

    /// Resume a paused match. Only the room owner may resume it.
    pub async fn resume_game(&self, player_id: PlayerId, room_id: RoomId) -> Result<(), ErrorKind> {
        let room_entry = self.rooms.get(&room_id).ok_or(ErrorKind::NotFound)?;
        let mut room = room_entry.lock().await;
        if room.owner != player_id {
            return Err(ErrorKind::Unauthorized);
        }
        room.transition(RoomState::InProgress)?;
        drop(room);
        self.broadcast_to_room(
            room_id,
            "GameResumedBroadcast",
            &GameResumedBroadcast { room_id },
            None,
        )
        .await;
        Ok(())
    }

    /// Explicitly end a match. The room stays open with its members intact
    /// but moves to `Finished`, stops accepting joins, and becomes eligible
    /// for [`Lobby::sweep_expired_rooms`] once it has sat idle long enough.
    /// Only the room owner may end it.
    pub async fn end_game(&self, player_id: PlayerId, room_id: RoomId) -> Result<(), ErrorKind> {
        let room_entry = self.rooms.get(&room_id).ok_or(ErrorKind::NotFound)?;
        let mut room = room_entry.lock().await;
        if room.owner != player_id {
            return Err(ErrorKind::Unauthorized);
        }
        room.transition(RoomState::Finished)?;
        drop(room);
        self.broadcast_to_room(room_id, "GameEndedBroadcast", &GameEndedBroadcast { room_id }, None)
            .await;
        Ok(())
    }

    /// Look up a room's current membership, used by handlers that need to
    /// fan a message out to everyone in a player's current room.
    pub async fn room_members(&self, room_id: RoomId) -> Option<HashSet<PlayerId>> {
        let entry = self.rooms.get(&room_id)?;
        let room = entry.lock().await;
        Some(room.members.clone())
    }

    pub async fn player_room(&self, player_id: PlayerId) -> Option<RoomId> {
        let entry = self.players.get(&player_id)?;
        let room = entry.lock().await.room;
        room
    }

    pub async fn update_position(
        &self,
        player_id: PlayerId,
        sequence: u32,
        position: Vec3,
        rotation: Vec3,
        velocity: Vec3,
    ) -> Option<bool> {
        let entry = self.players.get(&player_id)?;
        let mut player = entry.lock().await;
        if !player.accept_sequence(sequence) {
            return Some(false);
        }
        player.position = position;
        player.rotation = rotation;
        player.velocity = velocity;
        Some(true)
    }

    pub async fn player_position(&self, player_id: PlayerId) -> Option<Vec3> {
        let entry = self.players.get(&player_id)?;
        let position = entry.lock().await.position;
        Some(position)
    }

    pub async fn set_player_state(&self, player_id: PlayerId, state: PlayerState) {
        if let Some(entry) = self.players.get(&player_id) {
            let mut player = entry.lock().await;
            if !player.state.can_transition_to(state) {
                warn!(%player_id, ?state, "ignoring invalid player state transition");
                return;
            }
            player.state = state;
        }
    }

    /// Apply `PlayerAction`'s kill/death bookkeeping for `player_id`, if the
    /// action string names one.
    pub async fn record_action_stat(&self, player_id: PlayerId, action: &str) {
        if let Some(entry) = self.players.get(&player_id) {
            entry.lock().await.apply_action_stats(action);
        }
    }

    pub async fn mute(&self, player_id: PlayerId, muted: bool) {
        if let Some(entry) = self.players.get(&player_id) {
            entry.lock().await.muted = muted;
        }
    }

    pub async fn is_muted(&self, player_id: PlayerId) -> bool {
        let Some(entry) = self.players.get(&player_id) else {
            return false;
        };
        let muted = entry.lock().await.muted;
        muted
    }

    pub async fn set_deafened(&self, player_id: PlayerId, deafened: bool) {
        if let Some(entry) = self.players.get(&player_id) {
            entry.lock().await.deafened = deafened;
        }
    }

    /// Members of `room_id` other than `exclude` that are not deafened,
    /// used to gate voice relay fan-out.
    pub async fn hearing_members(&self, room_id: RoomId, exclude: PlayerId) -> HashSet<PlayerId> {
        let Some(members) = self.room_members(room_id).await else {
            return HashSet::new();
        };
        let mut listeners = HashSet::with_capacity(members.len());
        for member in members {
            if member == exclude {
                continue;
            }
            if let Some(entry) = self.players.get(&member) {
                if !entry.lock().await.deafened {
                    listeners.insert(member);
                }
            }
        }
        listeners
    }

    #[must_use]
    pub const fn audio(&self) -> &AudioConfig {
        &self.audio
    }

    async fn set_player_room(&self, player_id: PlayerId, room_id: Option<RoomId>) {
        if let Some(entry) = self.players.get(&player_id) {
            entry.lock().await.room = room_id;
        }
    }

    async fn broadcast_joined(&self, room_id: RoomId, player_id: PlayerId, members: &[PlayerId]) {
        let targets: HashSet<PlayerId> = members.iter().copied().collect();
        let event = PlayerJoinedRoom {
            room_id,
            player_id,
            members: members.to_vec(),
        };
        broadcast::broadcast_to(&self.sessions, &targets, None, "PlayerJoinedRoom", &event);
        self.metrics.record_broadcast();
    }

    async fn broadcast_left(&self, room_id: RoomId, player_id: PlayerId, members: &[PlayerId]) {
        let targets: HashSet<PlayerId> = members.iter().copied().collect();
        let event = PlayerLeftRoom {
            room_id,
            player_id,
            members: members.to_vec(),
        };
        broadcast::broadcast_to(&self.sessions, &targets, None, "PlayerLeftRoom", &event);
        self.metrics.record_broadcast();
    }

    async fn broadcast_started(&self, room_id: RoomId, members: &[PlayerId]) {
        let targets: HashSet<PlayerId> = members.iter().copied().collect();
        let event = GameStartedBroadcast {
            room_id,
            members: members.to_vec(),
        };
        broadcast::broadcast_to(&self.sessions, &targets, None, "GameStartedBroadcast", &event);
        self.metrics.record_broadcast();
    }

    /// Broadcast an arbitrary reliable message to a room's members, excluding
    /// `exclude` if given. Used by handlers for chat and ready-state events
    /// that don't otherwise mutate Lobby-owned state.
    pub async fn broadcast_to_room<T: serde::Serialize>(
        &self,
        room_id: RoomId,
        message_id: &str,
        body: &T,
        exclude: Option<PlayerId>,
    ) {
        let Some(members) = self.room_members(room_id).await else {
            return;
        };
        broadcast::broadcast_to(&self.sessions, &members, exclude, message_id, body);
        self.metrics.record_broadcast();
    }

    /// Broadcast an arbitrary reliable message to every connected session,
    /// used by the admin `ServerBroadcast` action.
    pub fn broadcast_to_all<T: serde::Serialize>(&self, message_id: &str, body: &T) {
        let targets: HashSet<PlayerId> = self.sessions.iter().map(|entry| *entry.key()).collect();
        broadcast::broadcast_to(&self.sessions, &targets, None, message_id, body);
        self.metrics.record_broadcast();
    }

    /// Forcibly remove every member from a room, used by admin `CloseRoom`.
    /// Returns the removed members so the caller can notify them if desired.
    pub async fn force_close_room(&self, room_id: RoomId) -> Option<Vec<PlayerId>> {
        let members = self.room_members(room_id).await?;
        let members: Vec<PlayerId> = members.into_iter().collect();
        for member in &members {
            self.leave_room_internal(room_id, *member).await;
        }
        self.rooms.remove(&room_id);
        Some(members)
    }

    /// Close rooms that finished more than `timeout` ago and were never
    /// explicitly left by their remaining members. Rooms empty out and
    /// self-remove on the last member's departure, so this only catches
    /// the "game over, nobody bothered to leave" case. Returns how many
    /// rooms were closed.
    pub async fn sweep_expired_rooms(&self, timeout: chrono::Duration) -> usize {
        let now = chrono::Utc::now();
        let mut expired = Vec::new();
        for entry in self.rooms.iter() {
            let room = entry.value().lock().await;
            if room.state == RoomState::Finished && now - room.state_changed_at > timeout {
                expired.push(room.id);
            }
        }
        for room_id in &expired {
            self.force_close_room(*room_id).await;
            info!(%room_id, "room closed by cleanup sweep");
        }
        expired.len()
    }
}
