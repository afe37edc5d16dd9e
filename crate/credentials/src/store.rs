//! Persistence of personal access token records.
//!
//! Records hold the SHA-256 of the token value, never the value itself.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::trace;
use uuid::Uuid;

use crate::{
    credential_ensure,
    error::{CredentialError, result::CResult},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalAccessTokenRecord {
    /// Storage identity, kept across regenerations
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub scopes: Vec<String>,
    /// Hex SHA-256 of the token value
    pub value_hash: String,
    pub expiration_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PersonalAccessTokenRecord {
    /// True once `now` is strictly after the expiration time.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time < now
    }
}

/// Storage of personal access token records.
///
/// Lookups scoped by `user_id` answer `ItemNotFound` for records owned by
/// someone else, so that callers cannot probe foreign IDs.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, record: PersonalAccessTokenRecord) -> CResult<()>;

    async fn get(&self, user_id: &str, id: Uuid) -> CResult<PersonalAccessTokenRecord>;

    async fn find_by_hash(&self, value_hash: &str) -> CResult<PersonalAccessTokenRecord>;

    /// All records of a user, oldest first.
    async fn list_for_user(&self, user_id: &str) -> CResult<Vec<PersonalAccessTokenRecord>>;

    /// Swap the value hash and expiration of an existing record.
    async fn replace_secret(
        &self,
        user_id: &str,
        id: Uuid,
        value_hash: String,
        expiration_time: DateTime<Utc>,
    ) -> CResult<PersonalAccessTokenRecord>;

    async fn delete(&self, user_id: &str, id: Uuid) -> CResult<()>;
}

#[derive(Default)]
struct Tables {
    records: HashMap<Uuid, PersonalAccessTokenRecord>,
    by_hash: HashMap<String, Uuid>,
}

/// A process local [`TokenStore`].
#[derive(Default)]
pub struct InMemoryTokenStore {
    tables: RwLock<Tables>,
}

impl InMemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: Uuid) -> CredentialError {
    CredentialError::ItemNotFound(format!("personal access token {id}"))
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, record: PersonalAccessTokenRecord) -> CResult<()> {
        let mut tables = self.tables.write().await;
        credential_ensure!(
            !tables.records.contains_key(&record.id),
            CredentialError::InvalidArgument(format!(
                "personal access token {} already exists",
                record.id
            ))
        );
        credential_ensure!(
            !tables.by_hash.contains_key(&record.value_hash),
            "personal access token value hash collision"
        );
        trace!("inserting personal access token {}", record.id);
        tables.by_hash.insert(record.value_hash.clone(), record.id);
        tables.records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, user_id: &str, id: Uuid) -> CResult<PersonalAccessTokenRecord> {
        let tables = self.tables.read().await;
        tables
            .records
            .get(&id)
            .filter(|record| record.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn find_by_hash(&self, value_hash: &str) -> CResult<PersonalAccessTokenRecord> {
        let tables = self.tables.read().await;
        tables
            .by_hash
            .get(value_hash)
            .and_then(|id| tables.records.get(id))
            .cloned()
            .ok_or_else(|| {
                CredentialError::ItemNotFound("no personal access token for this value".to_owned())
            })
    }

    async fn list_for_user(&self, user_id: &str) -> CResult<Vec<PersonalAccessTokenRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<_> = tables
            .records
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn replace_secret(
        &self,
        user_id: &str,
        id: Uuid,
        value_hash: String,
        expiration_time: DateTime<Utc>,
    ) -> CResult<PersonalAccessTokenRecord> {
        let mut tables = self.tables.write().await;
        let Tables { records, by_hash } = &mut *tables;
        let record = records
            .get_mut(&id)
            .filter(|record| record.user_id == user_id)
            .ok_or_else(|| not_found(id))?;
        credential_ensure!(
            by_hash.get(&value_hash).is_none_or(|owner| *owner == id),
            "personal access token value hash collision"
        );
        by_hash.remove(&record.value_hash);
        by_hash.insert(value_hash.clone(), id);
        record.value_hash = value_hash;
        record.expiration_time = expiration_time;
        Ok(record.clone())
    }

    async fn delete(&self, user_id: &str, id: Uuid) -> CResult<()> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .records
            .get(&id)
            .is_some_and(|record| record.user_id == user_id);
        credential_ensure!(owned, not_found(id));
        if let Some(record) = tables.records.remove(&id) {
            tables.by_hash.remove(&record.value_hash);
        }
        Ok(())
    }
}
