//! Management of a user's personal access tokens.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    credential_ensure,
    credentials::Credentials,
    error::{CredentialError, result::CResult},
    pat::PersonalAccessToken,
    store::{PersonalAccessTokenRecord, TokenStore},
};

/// Parameters of a new personal access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateToken {
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub expiration_time: DateTime<Utc>,
}

pub struct PersonalAccessTokens {
    credentials: Arc<Credentials>,
    store: Arc<dyn TokenStore>,
}

impl PersonalAccessTokens {
    #[must_use]
    pub fn new(credentials: Arc<Credentials>, store: Arc<dyn TokenStore>) -> Self {
        Self { credentials, store }
    }

    fn ensure_enabled(&self) -> CResult<()> {
        credential_ensure!(
            self.credentials.personal_access_tokens_enabled(),
            CredentialError::ConfigError("personal access tokens are disabled".to_owned())
        );
        Ok(())
    }

    /// Create a token for `user_id`.
    ///
    /// The returned [`PersonalAccessToken`] is the only copy of the secret
    /// value: the stored record keeps its hash.
    ///
    /// # Errors
    ///
    /// `ConfigError` when personal access tokens are disabled,
    /// `InvalidArgument` when the name is blank.
    pub async fn create(
        &self,
        user_id: &str,
        request: CreateToken,
    ) -> CResult<(PersonalAccessTokenRecord, PersonalAccessToken)> {
        self.ensure_enabled()?;
        let name = request.name.trim();
        credential_ensure!(
            !name.is_empty(),
            CredentialError::InvalidArgument("the token name must not be empty".to_owned())
        );

        let token = self.credentials.generate_personal_access_token()?;
        let record = PersonalAccessTokenRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_owned(),
            name: name.to_owned(),
            scopes: request.scopes,
            value_hash: token.value_hash(),
            expiration_time: request.expiration_time,
            created_at: Utc::now(),
        };
        self.store.insert(record.clone()).await?;
        info!(
            "personal access token {} created for user {user_id}",
            record.id
        );
        Ok((record, token))
    }

    /// # Errors
    ///
    /// `ConfigError` when personal access tokens are disabled, `ItemNotFound`
    /// when `user_id` owns no token with this ID.
    pub async fn get(&self, user_id: &str, id: Uuid) -> CResult<PersonalAccessTokenRecord> {
        self.ensure_enabled()?;
        self.store.get(user_id, id).await
    }

    /// The tokens of `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// `ConfigError` when personal access tokens are disabled.
    pub async fn list(&self, user_id: &str) -> CResult<Vec<PersonalAccessTokenRecord>> {
        self.ensure_enabled()?;
        self.store.list_for_user(user_id).await
    }

    /// Replace the secret of an existing token; the previous value stops working.
    ///
    /// # Errors
    ///
    /// `ConfigError` when personal access tokens are disabled, `ItemNotFound`
    /// when `user_id` owns no token with this ID.
    pub async fn regenerate(
        &self,
        user_id: &str,
        id: Uuid,
        expiration_time: DateTime<Utc>,
    ) -> CResult<(PersonalAccessTokenRecord, PersonalAccessToken)> {
        self.ensure_enabled()?;
        let token = self.credentials.generate_personal_access_token()?;
        let record = self
            .store
            .replace_secret(user_id, id, token.value_hash(), expiration_time)
            .await?;
        info!("personal access token {id} regenerated for user {user_id}");
        Ok((record, token))
    }

    /// # Errors
    ///
    /// `ConfigError` when personal access tokens are disabled, `ItemNotFound`
    /// when `user_id` owns no token with this ID.
    pub async fn delete(&self, user_id: &str, id: Uuid) -> CResult<()> {
        self.ensure_enabled()?;
        self.store.delete(user_id, id).await?;
        info!("personal access token {id} deleted for user {user_id}");
        Ok(())
    }

    /// Resolve a presented token to its record.
    ///
    /// # Errors
    ///
    /// Parse and signature failures of [`PersonalAccessToken::parse`],
    /// `InvalidClaims` when no record holds this value, `Expired` once the
    /// record's expiration time has passed.
    pub async fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> CResult<PersonalAccessTokenRecord> {
        let token = self.credentials.parse_personal_access_token(token)?;
        let record = match self.store.find_by_hash(&token.value_hash()).await {
            Ok(record) => record,
            Err(CredentialError::ItemNotFound(_)) => {
                return Err(CredentialError::InvalidClaims(
                    "unknown personal access token".to_owned(),
                ));
            }
            Err(e) => return Err(e),
        };
        credential_ensure!(!record.is_expired(now), CredentialError::Expired);
        debug!(
            "personal access token {} authenticated user {}",
            record.id, record.user_id
        );
        Ok(record)
    }
}
