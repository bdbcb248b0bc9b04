//! Generic typed CRUD storage boundary, reserved for bans and other
//! long-lived records — never for in-flight room/player state.

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A scalar value storable in a [`StoreRecord`], and the type a caller keys
/// a row by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Time(DateTime<Utc>),
    Null,
}

/// A record is a flat field map; callers agree on field names per table.
pub type StoreRecord = BTreeMap<String, StoreValue>;

/// Failure raised by a `Store` backend. Collapsed to
/// [`crate::error::ErrorKind::StoreError`] at the handler boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record has no value for key field {0:?}")]
    MissingKeyField(String),
    #[error("no record found for the given key")]
    NotFound,
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Create/read/update/delete by an arbitrary key field, plus an explicit
/// flush hook for backends that buffer writes. `key_field` names which
/// column of `record` identifies the row; callers extract the key
/// themselves rather than the store reflecting into the record.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create(
        &self,
        table: &str,
        key_field: &str,
        record: StoreRecord,
    ) -> Result<(), StoreError>;

    async fn read(
        &self,
        table: &str,
        key_field: &str,
        key: &StoreValue,
    ) -> Result<Option<StoreRecord>, StoreError>;

    async fn update(
        &self,
        table: &str,
        key_field: &str,
        record: StoreRecord,
    ) -> Result<(), StoreError>;

    async fn delete(
        &self,
        table: &str,
        key_field: &str,
        key: &StoreValue,
    ) -> Result<(), StoreError>;

    async fn flush(&self) -> Result<(), StoreError>;
}

impl From<StoreError> for crate::error::ErrorKind {
    fn from(_: StoreError) -> Self {
        Self::StoreError
    }
}
