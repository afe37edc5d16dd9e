use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::{
    credential_ensure,
    error::{CredentialError, result::CResult},
    jws::{ExpectedClaims, SessionClaims, SessionSigner, SigningAlgorithm, VerifyOptions},
    pat::PersonalAccessToken,
};

/// The longest accepted session lifetime, one year.
pub const MAX_SESSION_LIFETIME_SECS: i64 = 365 * 24 * 3600;

/// Key material and token policy, built once at startup and shared by `Arc`.
///
/// Either signer may be absent: the corresponding feature is then disabled
/// and its operations fail with `ConfigError`.
#[derive(Debug)]
pub struct Credentials {
    issuer: String,
    session_lifetime: Duration,
    session_signer: Option<SessionSigner>,
    pat_signer: Option<SessionSigner>,
}

impl Credentials {
    /// # Errors
    ///
    /// `ConfigError` when the issuer is empty, the lifetime is not positive or
    /// longer than [`MAX_SESSION_LIFETIME_SECS`], or the personal access token
    /// signer is not HS256.
    pub fn new(
        issuer: &str,
        session_lifetime: Duration,
        session_signer: Option<SessionSigner>,
        pat_signer: Option<SessionSigner>,
    ) -> CResult<Self> {
        credential_ensure!(
            !issuer.trim().is_empty(),
            CredentialError::ConfigError("the token issuer must not be empty".to_owned())
        );
        credential_ensure!(
            session_lifetime > Duration::zero(),
            CredentialError::ConfigError("the session lifetime must be positive".to_owned())
        );
        credential_ensure!(
            session_lifetime.num_seconds() <= MAX_SESSION_LIFETIME_SECS,
            CredentialError::ConfigError(format!(
                "the session lifetime must not exceed {MAX_SESSION_LIFETIME_SECS}s"
            ))
        );
        if let Some(signer) = &pat_signer {
            credential_ensure!(
                signer.algorithm() == SigningAlgorithm::HS256,
                CredentialError::ConfigError(
                    "personal access tokens must be signed with HS256".to_owned()
                )
            );
        }
        debug!(
            "credentials: issuer {issuer}, session signer: {:?}, personal access tokens enabled: {}",
            session_signer.as_ref().map(SessionSigner::algorithm),
            pat_signer.is_some()
        );
        Ok(Self {
            issuer: issuer.to_owned(),
            session_lifetime,
            session_signer,
            pat_signer,
        })
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub const fn session_lifetime(&self) -> Duration {
        self.session_lifetime
    }

    #[must_use]
    pub const fn session_signer(&self) -> Option<&SessionSigner> {
        self.session_signer.as_ref()
    }

    #[must_use]
    pub const fn pat_signer(&self) -> Option<&SessionSigner> {
        self.pat_signer.as_ref()
    }

    #[must_use]
    pub const fn personal_access_tokens_enabled(&self) -> bool {
        self.pat_signer.is_some()
    }

    /// Sign a session token for `subject`, valid from now.
    ///
    /// # Errors
    ///
    /// `ConfigError` when no session signer is configured.
    pub fn issue_session_token(&self, subject: &str) -> CResult<(String, SessionClaims)> {
        self.issue_session_token_at(subject, Utc::now())
    }

    /// Same as [`Self::issue_session_token`] with an explicit issue time.
    ///
    /// # Errors
    ///
    /// `ConfigError` when no session signer is configured, `InvalidArgument`
    /// when the subject is empty or the expiry cannot be represented.
    pub fn issue_session_token_at(
        &self,
        subject: &str,
        issued_at: DateTime<Utc>,
    ) -> CResult<(String, SessionClaims)> {
        credential_ensure!(
            !subject.is_empty(),
            CredentialError::InvalidArgument("the token subject must not be empty".to_owned())
        );
        let signer = self.require_session_signer()?;
        let claims = SessionClaims::new(&self.issuer, subject, issued_at, self.session_lifetime)?;
        let token = signer.sign(signer.algorithm(), &claims)?;
        Ok((token, claims))
    }

    /// # Errors
    ///
    /// Any verification failure of [`SessionSigner::verify`].
    pub fn verify_session_token(&self, token: &str) -> CResult<SessionClaims> {
        let signer = self.require_session_signer()?;
        signer.verify(
            token,
            &ExpectedClaims::issuer(&self.issuer),
            &VerifyOptions::default(),
        )
    }

    /// # Errors
    ///
    /// Any verification failure of [`SessionSigner::verify`].
    pub fn verify_session_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> CResult<SessionClaims> {
        let signer = self.require_session_signer()?;
        signer.verify(
            token,
            &ExpectedClaims::issuer(&self.issuer),
            &VerifyOptions::at(now),
        )
    }

    /// # Errors
    ///
    /// `ConfigError` when personal access tokens are disabled.
    pub fn generate_personal_access_token(&self) -> CResult<PersonalAccessToken> {
        PersonalAccessToken::generate(self.pat_signer.as_ref())
    }

    /// # Errors
    ///
    /// `ConfigError` when personal access tokens are disabled, otherwise any
    /// failure of [`PersonalAccessToken::parse`].
    pub fn parse_personal_access_token(&self, token: &str) -> CResult<PersonalAccessToken> {
        let signer = self.pat_signer.as_ref().ok_or_else(|| {
            CredentialError::ConfigError("personal access tokens are disabled".to_owned())
        })?;
        PersonalAccessToken::parse(token, signer)
    }

    fn require_session_signer(&self) -> CResult<&SessionSigner> {
        self.session_signer.as_ref().ok_or_else(|| {
            CredentialError::ConfigError("session tokens are disabled".to_owned())
        })
    }
}
