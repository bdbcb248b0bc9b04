//! Room state machine and membership.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::ErrorKind;
use crate::protocol::types::{PlayerId, RoomId};

fn hash_password(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

/// A room's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Waiting,
    Starting,
    InProgress,
    Paused,
    Finished,
}

impl RoomState {
    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::Starting)
                | (Self::Starting, Self::InProgress)
                | (Self::InProgress, Self::Paused)
                | (Self::Paused, Self::InProgress)
                | (Self::InProgress, Self::Finished)
                | (Self::Paused, Self::Finished)
                | (Self::Starting, Self::Finished)
        )
    }
}

/// In-memory room record. Lives behind a `tokio::sync::Mutex<Room>` in the
/// Lobby's room registry; never persisted.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    password_hash: Option<[u8; 32]>,
    pub max_players: u8,
    pub late_join: bool,
    pub state: RoomState,
    /// The player who created the room; the only member `start_game`
    /// authorizes to transition the room out of `Waiting`.
    pub owner: PlayerId,
    pub members: HashSet<PlayerId>,
    pub ready: HashSet<PlayerId>,
    pub settings: BTreeMap<String, String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Timestamp of the room's last state transition, used by the periodic
    /// cleanup sweep to find rooms that finished and were never explicitly
    /// torn down.
    pub state_changed_at: chrono::DateTime<chrono::Utc>,
}

impl Room {
    #[must_use]
    pub fn new(
        owner: PlayerId,
        name: String,
        password: Option<String>,
        max_players: u8,
        late_join: bool,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: RoomId::new(),
            name,
            password_hash: password.as_deref().map(hash_password),
            max_players,
            late_join,
            state: RoomState::Waiting,
            owner,
            members: HashSet::new(),
            ready: HashSet::new(),
            settings: BTreeMap::new(),
            created_at: now,
            state_changed_at: now,
        }
    }

    #[must_use]
    pub fn is_private(&self) -> bool {
        self.password_hash.is_some()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_players as usize
    }

    #[must_use]
    pub fn check_password(&self, supplied: Option<&str>) -> bool {
        match &self.password_hash {
            None => true,
            Some(expected) => match supplied {
                Some(given) => hash_password(given).ct_eq(expected).into(),
                None => false,
            },
        }
    }

    /// Whether a new player may join given the room's current state.
    #[must_use]
    pub fn accepts_joins(&self) -> bool {
        match self.state {
            RoomState::Waiting => true,
            RoomState::Starting | RoomState::InProgress => self.late_join,
            RoomState::Paused | RoomState::Finished => false,
        }
    }

    pub fn add_member(&mut self, player: PlayerId) -> Result<(), ErrorKind> {
        if self.members.contains(&player) {
            return Err(ErrorKind::AlreadyInRoom);
        }
        if !self.accepts_joins() {
            return Err(ErrorKind::ProtocolViolation);
        }
        if self.is_full() {
            return Err(ErrorKind::Full);
        }
        self.members.insert(player);
        Ok(())
    }

    /// Remove a member. Returns `true` if the room is now empty.
    pub fn remove_member(&mut self, player: PlayerId) -> bool {
        self.members.remove(&player);
        self.ready.remove(&player);
        self.members.is_empty()
    }

    pub fn set_ready(&mut self, player: PlayerId, ready: bool) -> Result<(), ErrorKind> {
        if !self.members.contains(&player) {
            return Err(ErrorKind::NotFound);
        }
        if ready {
            self.ready.insert(player);
        } else {
            self.ready.remove(&player);
        }
        Ok(())
    }

    #[must_use]
    pub fn all_ready(&self) -> bool {
        !self.members.is_empty() && self.ready.len() == self.members.len()
    }

    pub fn transition(&mut self, next: RoomState) -> Result<(), ErrorKind> {
        if !self.state.can_transition_to(next) {
            return Err(ErrorKind::ProtocolViolation);
        }
        self.state = next;
        self.state_changed_at = chrono::Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new(PlayerId::new(), "test".into(), None, 2, false)
    }

    #[test]
    fn capacity_enforced() {
        let mut room = room();
        room.add_member(PlayerId::new()).unwrap();
        room.add_member(PlayerId::new()).unwrap();
        assert!(matches!(
            room.add_member(PlayerId::new()),
            Err(ErrorKind::Full)
        ));
    }

    #[test]
    fn duplicate_join_rejected() {
        let mut room = room();
        let p = PlayerId::new();
        room.add_member(p).unwrap();
        assert!(matches!(room.add_member(p), Err(ErrorKind::AlreadyInRoom)));
    }

    #[test]
    fn late_join_gate_is_strict_by_default() {
        let mut room = room();
        room.transition(RoomState::Starting).unwrap();
        assert!(matches!(
            room.add_member(PlayerId::new()),
            Err(ErrorKind::ProtocolViolation)
        ));
    }

    #[test]
    fn late_join_allowed_when_configured() {
        let mut room = Room::new(PlayerId::new(), "test".into(), None, 4, true);
        room.transition(RoomState::Starting).unwrap();
        room.transition(RoomState::InProgress).unwrap();
        assert!(room.add_member(PlayerId::new()).is_ok());
    }

    #[test]
    fn state_machine_rejects_invalid_transitions() {
        let mut room = room();
        assert!(matches!(
            room.transition(RoomState::InProgress),
            Err(ErrorKind::ProtocolViolation)
        ));
        room.transition(RoomState::Starting).unwrap();
        room.transition(RoomState::InProgress).unwrap();
        room.transition(RoomState::Finished).unwrap();
        assert!(matches!(
            room.transition(RoomState::InProgress),
            Err(ErrorKind::ProtocolViolation)
        ));
    }

    #[test]
    fn password_check() {
        let room = Room::new(PlayerId::new(), "p".into(), Some("secret".into()), 4, false);
        assert!(room.check_password(Some("secret")));
        assert!(!room.check_password(Some("wrong")));
        assert!(!room.check_password(None));
    }

    #[test]
    fn all_ready_tracks_membership() {
        let mut room = room();
        let a = PlayerId::new();
        let b = PlayerId::new();
        room.add_member(a).unwrap();
        room.add_member(b).unwrap();
        assert!(!room.all_ready());
        room.set_ready(a, true).unwrap();
        assert!(!room.all_ready());
        room.set_ready(b, true).unwrap();
        assert!(room.all_ready());
    }
}
