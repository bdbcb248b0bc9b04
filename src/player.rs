//! Per-session game state that rides alongside a [`crate::session::Session`].

use crate::protocol::types::{PlayerId, RoomId, Vec3};

/// Connection lifecycle state for a session's owning player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Accepting,
    Active,
    Draining,
    Closed,
}

impl PlayerState {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Accepting, Self::Active)
                | (Self::Active, Self::Draining)
                | (Self::Draining, Self::Closed)
                | (Self::Active, Self::Closed)
        )
    }
}

/// Gameplay + voice state for one connected player.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub room: Option<RoomId>,
    pub position: Vec3,
    pub rotation: Vec3,
    pub velocity: Vec3,
    pub ready: bool,
    pub state: PlayerState,
    pub muted: bool,
    pub deafened: bool,
    pub kills: u32,
    pub deaths: u32,
    pub last_sequence: u32,
    pub last_position_at: chrono::DateTime<chrono::Utc>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl Player {
    #[must_use]
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: PlayerId::new(),
            name,
            room: None,
            position: Vec3::zero(),
            rotation: Vec3::zero(),
            velocity: Vec3::zero(),
            ready: false,
            state: PlayerState::Accepting,
            muted: false,
            deafened: false,
            kills: 0,
            deaths: 0,
            last_sequence: 0,
            last_position_at: now,
            joined_at: now,
        }
    }

    /// Accept a position update if its sequence number is newer than the
    /// last accepted one. Returns `false` for stale/duplicate updates, which
    /// callers should silently drop rather than error on.
    pub fn accept_sequence(&mut self, sequence: u32) -> bool {
        if sequence <= self.last_sequence && self.last_sequence != 0 {
            return false;
        }
        self.last_sequence = sequence;
        self.last_position_at = chrono::Utc::now();
        true
    }

    /// Update kill/death counters for actions that report them. Unknown
    /// action strings are relayed as-is without affecting stats.
    pub fn apply_action_stats(&mut self, action: &str) {
        match action {
            "kill" => self.kills += 1,
            "death" => self.deaths += 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_sequence_rejected() {
        let mut p = Player::new("a".into());
        assert!(p.accept_sequence(5));
        assert!(!p.accept_sequence(5));
        assert!(!p.accept_sequence(3));
        assert!(p.accept_sequence(6));
    }

    #[test]
    fn state_machine_is_one_way() {
        assert!(PlayerState::Accepting.can_transition_to(PlayerState::Active));
        assert!(!PlayerState::Closed.can_transition_to(PlayerState::Active));
        assert!(!PlayerState::Active.can_transition_to(PlayerState::Accepting));
    }
}
