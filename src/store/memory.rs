//! In-memory `Store` implementation, the default and only backend this
//! server ships. Not durable across restarts; `flush()` is a no-op.

use dashmap::DashMap;

use async_trait::async_trait;

use crate::store::{Store, StoreError, StoreRecord, StoreValue};

#[derive(Default)]
pub struct MemoryStore {
    tables: DashMap<String, DashMap<StoreValue, StoreRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key_value(record: &StoreRecord, key_field: &str) -> Result<StoreValue, StoreError> {
        record
            .get(key_field)
            .cloned()
            .ok_or_else(|| StoreError::MissingKeyField(key_field.to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create(
        &self,
        table: &str,
        key_field: &str,
        record: StoreRecord,
    ) -> Result<(), StoreError> {
        let key = Self::key_value(&record, key_field)?;
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(key, record);
        Ok(())
    }

    async fn read(
        &self,
        table: &str,
        _key_field: &str,
        key: &StoreValue,
    ) -> Result<Option<StoreRecord>, StoreError> {
        Ok(self
            .tables
            .get(table)
            .and_then(|rows| rows.get(key).map(|row| row.value().clone())))
    }

    async fn update(
        &self,
        table: &str,
        key_field: &str,
        record: StoreRecord,
    ) -> Result<(), StoreError> {
        let key = Self::key_value(&record, key_field)?;
        let rows = self.tables.get(table).ok_or(StoreError::NotFound)?;
        if !rows.contains_key(&key) {
            return Err(StoreError::NotFound);
        }
        rows.insert(key, record);
        Ok(())
    }

    async fn delete(
        &self,
        table: &str,
        _key_field: &str,
        key: &StoreValue,
    ) -> Result<(), StoreError> {
        if let Some(rows) = self.tables.get(table) {
            rows.remove(key);
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_key(key_field: &str, key: StoreValue) -> StoreRecord {
        let mut record = StoreRecord::new();
        record.insert(key_field.to_string(), key);
        record.insert("reason".into(), StoreValue::Str("cheating".into()));
        record
    }

    #[tokio::test]
    async fn create_then_read_round_trips() {
        let store = MemoryStore::new();
        let key = StoreValue::Str("p1".into());
        let record = record_with_key("player_id", key.clone());
        store.create("bans", "player_id", record.clone()).await.unwrap();
        let fetched = store.read("bans", "player_id", &key).await.unwrap();
        assert_eq!(fetched, Some(record));
    }

    #[tokio::test]
    async fn update_missing_key_fails() {
        let store = MemoryStore::new();
        let record = record_with_key("player_id", StoreValue::Str("missing".into()));
        let result = store.update("bans", "player_id", record).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn create_without_key_field_fails() {
        let store = MemoryStore::new();
        let mut record = StoreRecord::new();
        record.insert("reason".into(), StoreValue::Str("cheating".into()));
        let result = store.create("bans", "player_id", record).await;
        assert!(matches!(result, Err(StoreError::MissingKeyField(_))));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let key = StoreValue::Str("p1".into());
        store
            .create("bans", "player_id", record_with_key("player_id", key.clone()))
            .await
            .unwrap();
        store.delete("bans", "player_id", &key).await.unwrap();
        store.delete("bans", "player_id", &key).await.unwrap();
        assert_eq!(store.read("bans", "player_id", &key).await.unwrap(), None);
    }
}
