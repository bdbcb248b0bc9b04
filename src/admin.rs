//! Admin-principal-authorized actions: kick, ban, mute, broadcast, and
//! forced room closure. Ban state is the only thing here that's persisted,
//! and it goes through [`Store`] rather than living in the Lobby.

use std::sync::Arc;

use chrono::Utc;
use subtle::ConstantTimeEq;

use crate::error::ErrorKind;
use crate::lobby::Lobby;
use crate::protocol::types::{BanRecord, PlayerId, RoomId};
use crate::store::{Store, StoreRecord, StoreValue};

/// Identifies a caller attempting an admin action. Authorization is a single
/// boolean flag rather than a role hierarchy: this server has one admin
/// principal type, not a permissions matrix.
#[derive(Debug, Clone, Copy)]
pub struct AdminPrincipal {
    pub is_admin: bool,
}

impl AdminPrincipal {
    fn require_admin(self) -> Result<(), ErrorKind> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ErrorKind::Unauthorized)
        }
    }
}

const BAN_KEY_FIELD: &str = "player_id";

pub struct AdminService {
    lobby: Arc<Lobby>,
    store: Arc<dyn Store>,
    ban_table: String,
    token: String,
}

impl AdminService {
    #[must_use]
    pub fn new(lobby: Arc<Lobby>, store: Arc<dyn Store>, ban_table: String) -> Self {
        Self {
            lobby,
            store,
            ban_table,
            token: String::new(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: String) -> Self {
        self.token = token;
        self
    }

    /// Authorize a caller from the shared secret an admin message carries.
    /// An empty configured token accepts nothing, admin-only.
    #[must_use]
    pub fn authorize(&self, supplied_token: &str) -> AdminPrincipal {
        let is_admin = !self.token.is_empty()
            && self.token.as_bytes().ct_eq(supplied_token.as_bytes()).into();
        AdminPrincipal { is_admin }
    }

    pub async fn kick(&self, caller: AdminPrincipal, target: PlayerId) -> Result<(), ErrorKind> {
        caller.require_admin()?;
        let Some(room_id) = self.lobby.player_room(target).await else {
            return Err(ErrorKind::NotFound);
        };
        self.lobby.leave_room(target, room_id).await?;
        if let Some(session) = self.lobby.session(target) {
            session.transition(crate::session::SessionState::Draining);
        }
        Ok(())
    }

    pub async fn ban(
        &self,
        caller: AdminPrincipal,
        target: PlayerId,
        reason: String,
    ) -> Result<(), ErrorKind> {
        caller.require_admin()?;
        let record = BanRecord {
            player_id: target,
            reason: reason.clone(),
            banned_at: Utc::now(),
        };
        let mut row = StoreRecord::new();
        row.insert(BAN_KEY_FIELD.into(), StoreValue::Str(target.to_string()));
        row.insert("reason".into(), StoreValue::Str(reason));
        row.insert("banned_at".into(), StoreValue::Time(record.banned_at));
        self.store.create(&self.ban_table, BAN_KEY_FIELD, row).await?;
        if let Some(room_id) = self.lobby.player_room(target).await {
            let _ = self.lobby.leave_room(target, room_id).await;
        }
        if let Some(session) = self.lobby.session(target) {
            session.transition(crate::session::SessionState::Draining);
        }
        Ok(())
    }

    pub async fn unban(&self, caller: AdminPrincipal, target: PlayerId) -> Result<(), ErrorKind> {
        caller.require_admin()?;
        let key = StoreValue::Str(target.to_string());
        Ok(self.store.delete(&self.ban_table, BAN_KEY_FIELD, &key).await?)
    }

    pub async fn is_banned(&self, target: PlayerId) -> Result<bool, ErrorKind> {
        let key = StoreValue::Str(target.to_string());
        Ok(self
            .store
            .read(&self.ban_table, BAN_KEY_FIELD, &key)
            .await?
            .is_some())
    }

    pub async fn mute(&self, caller: AdminPrincipal, target: PlayerId) -> Result<(), ErrorKind> {
        caller.require_admin()?;
        self.lobby.mute(target, true).await;
        Ok(())
    }

    pub async fn unmute(&self, caller: AdminPrincipal, target: PlayerId) -> Result<(), ErrorKind> {
        caller.require_admin()?;
        self.lobby.mute(target, false).await;
        Ok(())
    }

    pub async fn close_room(
        &self,
        caller: AdminPrincipal,
        room_id: RoomId,
    ) -> Result<(), ErrorKind> {
        caller.require_admin()?;
        self.lobby
            .force_close_room(room_id)
            .await
            .map(|_| ())
            .ok_or(ErrorKind::NotFound)
    }
}
