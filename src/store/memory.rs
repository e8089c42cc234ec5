use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{SessionRecord, SessionStore};
use crate::error::StoreError;

/// Process-local store for tests and single-node development runs
///
/// Each operation runs under one lock acquisition, which gives the same
/// atomicity the SQL statements give.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    records: RwLock<HashMap<Uuid, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, SessionRecord>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Unexpected("session store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, SessionRecord>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Unexpected("session store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.write()?.insert(record.user_id, record.clone());
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.read()?.get(&user_id).cloned())
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.write()?.remove(&user_id).is_some())
    }

    async fn delete_if_current(&self, user_id: Uuid, session_id: &str) -> Result<bool, StoreError> {
        let mut records = self.write()?;
        let is_current = records
            .get(&user_id)
            .map_or(false, |record| record.session_id == session_id);
        if is_current {
            records.remove(&user_id);
        }
        Ok(is_current)
    }

    async fn rotate(&self, user_id: Uuid, current: &str, next: &str) -> Result<bool, StoreError> {
        let mut records = self.write()?;
        match records.get_mut(&user_id) {
            Some(record) if record.session_id == current => {
                record.session_id = next.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
