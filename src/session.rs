//! Per-client session bookkeeping: a queue handle to the reliable send task,
//! the datagram peer address, and the lifecycle state machine.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::mpsc;

use crate::protocol::types::PlayerId;

/// Session lifecycle. One-way transitions only: a closed session never
/// reopens — a reconnecting client gets a brand new session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Accepting,
    Active,
    Draining,
    Closed,
}

impl SessionState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Accepting => 0,
            Self::Active => 1,
            Self::Draining => 2,
            Self::Closed => 3,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Accepting,
            1 => Self::Active,
            2 => Self::Draining,
            _ => Self::Closed,
        }
    }

    const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Accepting, Self::Active)
                | (Self::Active, Self::Draining)
                | (Self::Draining, Self::Closed)
                | (Self::Active, Self::Closed)
        )
    }
}

/// Handle to one connected client's reliable channel and liveness metadata.
/// The session id doubles as the player id: the first control frame after
/// accept (`SessionEstablished`) hands the client this same value, and every
/// subsequent datagram is tagged with it.
pub struct Session {
    pub id: PlayerId,
    reliable_tx: mpsc::Sender<Bytes>,
    datagram_addr: parking_lot_addr::AddrCell,
    state: AtomicU8,
    last_seen_epoch_ms: AtomicI64,
}

/// A tiny lock-free cell for the session's last-known UDP peer address;
/// datagrams arrive self-identified but the server still needs somewhere to
/// send datagrams back to.
mod parking_lot_addr {
    use super::SocketAddr;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct AddrCell(Mutex<Option<SocketAddr>>);

    impl AddrCell {
        pub fn get(&self) -> Option<SocketAddr> {
            *self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
        }

        pub fn set(&self, addr: SocketAddr) {
            *self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(addr);
        }
    }
}

impl Session {
    #[must_use]
    pub fn new(id: PlayerId, reliable_tx: mpsc::Sender<Bytes>) -> Arc<Self> {
        Arc::new(Self {
            id,
            reliable_tx,
            datagram_addr: parking_lot_addr::AddrCell::default(),
            state: AtomicU8::new(SessionState::Accepting.as_u8()),
            last_seen_epoch_ms: AtomicI64::new(Utc::now().timestamp_millis()),
        })
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Attempt a one-way lifecycle transition. Returns `false` if `next`
    /// isn't reachable from the current state.
    pub fn transition(&self, next: SessionState) -> bool {
        let current = self.state();
        if !current.can_transition_to(next) {
            return false;
        }
        self.state.store(next.as_u8(), Ordering::Release);
        true
    }

    pub fn touch(&self) {
        self.last_seen_epoch_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    #[must_use]
    pub fn idle_for_secs(&self) -> i64 {
        let last = self.last_seen_epoch_ms.load(Ordering::Relaxed);
        (Utc::now().timestamp_millis() - last) / 1000
    }

    pub fn set_datagram_addr(&self, addr: SocketAddr) {
        self.datagram_addr.set(addr);
    }

    #[must_use]
    pub fn datagram_addr(&self) -> Option<SocketAddr> {
        self.datagram_addr.get()
    }

    /// Queue a reliable frame for the send task to write. Non-blocking:
    /// a full queue means the session is unhealthy and the send is dropped
    /// rather than backing up the caller.
    pub fn send_reliable(&self, frame: Bytes) -> bool {
        self.reliable_tx.try_send(frame).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn state_transitions_are_one_way() {
        let (tx, _rx) = mpsc::channel(8);
        let session = Session::new(PlayerId::new(), tx);
        assert_eq!(session.state(), SessionState::Accepting);
        assert!(session.transition(SessionState::Active));
        assert!(!session.transition(SessionState::Accepting));
        assert!(session.transition(SessionState::Draining));
        assert!(session.transition(SessionState::Closed));
        assert!(!session.transition(SessionState::Active));
    }

    #[tokio::test]
    async fn full_queue_does_not_block_send() {
        let (tx, _rx) = mpsc::channel(1);
        let session = Session::new(PlayerId::new(), tx);
        assert!(session.send_reliable(Bytes::from_static(b"a")));
        assert!(!session.send_reliable(Bytes::from_static(b"b")));
    }
}
