use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use warden_client::types::{CredentialKind, SessionResponse};
use warden_credentials::{
    AuthToken, CredentialError, Credentials, InMemoryTokenStore, PersonalAccessTokens, TokenStore,
};

use crate::{config::ServerParams, error::WardenError, result::KResult};

/// The user behind an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub credential: CredentialKind,
}

/// The state shared by all the workers of the server.
pub struct Warden {
    pub(crate) params: Arc<ServerParams>,
    pub(crate) tokens: PersonalAccessTokens,
}

impl Warden {
    /// A server keeping its personal access tokens in memory.
    #[must_use]
    pub fn instantiate(params: Arc<ServerParams>) -> Self {
        Self::with_store(params, Arc::new(InMemoryTokenStore::new()))
    }

    #[must_use]
    pub fn with_store(params: Arc<ServerParams>, store: Arc<dyn TokenStore>) -> Self {
        let tokens = PersonalAccessTokens::new(params.credentials.clone(), store);
        Self { params, tokens }
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.params.credentials
    }

    /// Resolve the credential of a request to the user it was issued to.
    ///
    /// A bearer token carrying the personal access token prefix is looked up
    /// in the token store; any other bearer token, and the session cookie, must
    /// be a valid session token. A credential of a kind this server does not
    /// issue is refused like any invalid one.
    pub async fn authenticate(&self, token: &AuthToken) -> KResult<Identity> {
        let identity = self.resolve(token).await.map_err(|e| match e {
            WardenError::ConfigurationError(reason) => WardenError::Unauthorized(reason),
            e => e,
        })?;
        debug!(
            "user {} authenticated with {:?}",
            identity.user_id, identity.credential
        );
        Ok(identity)
    }

    async fn resolve(&self, token: &AuthToken) -> KResult<Identity> {
        Ok(match token {
            AuthToken::AccessToken(value) if token.is_personal_access_token() => {
                let record = self.tokens.authenticate(value, Utc::now()).await?;
                Identity {
                    user_id: record.user_id,
                    credential: CredentialKind::PersonalAccessToken,
                }
            }
            AuthToken::AccessToken(value) => {
                let claims = self.credentials().verify_session_token(value)?;
                Identity {
                    user_id: claims.sub,
                    credential: CredentialKind::SessionToken,
                }
            }
            AuthToken::CookieToken(_) => {
                let cookie_name = &self.params.session_cookie_name;
                let value = token.cookie(cookie_name).ok_or_else(|| {
                    WardenError::from(CredentialError::InvalidClaims(format!(
                        "no {cookie_name} cookie in the request"
                    )))
                })?;
                let claims = self.credentials().verify_session_token(value)?;
                Identity {
                    user_id: claims.sub,
                    credential: CredentialKind::SessionCookie,
                }
            }
        })
    }

    /// Sign a fresh session token for an authenticated user.
    pub fn issue_session(&self, identity: &Identity) -> KResult<SessionResponse> {
        let (token, claims) = self.credentials().issue_session_token(&identity.user_id)?;
        let expires_at = claims.expires_at().ok_or_else(|| {
            WardenError::ServerError(format!("invalid expiration time: {}", claims.exp))
        })?;
        Ok(SessionResponse { token, expires_at })
    }
}
