use std::{fmt, sync::Arc};

use chrono::Duration;
use warden_credentials::Credentials;

use super::KeysParams;
use crate::{config::ClapConfig, error::WardenError, result::KResult, warden_ensure};

/// This structure is the context used by the server
/// while it is running. There is a singleton instance
/// shared between all threads.
pub struct ServerParams {
    pub hostname: String,

    pub port: u16,

    /// The name of the cookie carrying a session token
    pub session_cookie_name: String,

    /// Signers and token policy
    pub credentials: Arc<Credentials>,
}

impl ServerParams {
    /// Tries to create a `ServerParams` instance from the given `ClapConfig`.
    ///
    /// Key files are read here, once.
    ///
    /// # Errors
    ///
    /// Returns an error if a key file is missing or invalid, or if the
    /// session settings are inconsistent.
    pub fn try_from(conf: ClapConfig) -> KResult<Self> {
        let keys = KeysParams::try_from(&conf.keys)?;

        let session_lifetime = i64::try_from(conf.session.session_lifetime)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                WardenError::ConfigurationError(format!(
                    "invalid session lifetime: {}s",
                    conf.session.session_lifetime
                ))
            })?;
        warden_ensure!(
            !conf.session.session_cookie_name.trim().is_empty(),
            WardenError::ConfigurationError("the session cookie name must not be empty".to_owned())
        );

        let credentials = Credentials::new(
            &conf.session.issuer,
            session_lifetime,
            keys.session_signer,
            keys.pat_signer,
        )?;

        Ok(Self {
            hostname: conf.http.hostname,
            port: conf.http.port,
            session_cookie_name: conf.session.session_cookie_name,
            credentials: Arc::new(credentials),
        })
    }

    #[must_use]
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.hostname, self.port)
    }
}

impl fmt::Debug for ServerParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerParams")
            .field("server_url", &self.server_url())
            .field("issuer", &self.credentials.issuer())
            .field("session_lifetime", &self.credentials.session_lifetime())
            .field("session_cookie_name", &self.session_cookie_name)
            .field(
                "session tokens",
                &self
                    .credentials
                    .session_signer()
                    .map(warden_credentials::SessionSigner::algorithm),
            )
            .field(
                "personal access tokens",
                &self.credentials.personal_access_tokens_enabled(),
            )
            .finish()
    }
}
