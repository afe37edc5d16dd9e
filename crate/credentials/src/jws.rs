//! Signed session tokens (compact JWS).
//!
//! A [`SessionSigner`] is selected once at startup: either RS256 backed by a
//! [`KeySet`], or HS256 backed by a single shared [`HmacSecret`]. Call sites
//! only ever see the enum.

use std::{
    fmt::{self, Display},
    fs,
    path::Path,
    sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use openssl::{hash::MessageDigest, pkey::PKey, sign::Signer};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::{
    credential_ensure,
    error::{
        CredentialError, MalformedReason,
        result::{CResult, CResultHelper},
    },
    keys::{Key, KeySet},
};

/// The fixed claim set carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// issuer
    pub iss: String,
    /// subject, the user ID
    pub sub: String,
    /// issued at, unix seconds
    pub iat: i64,
    /// expiry, unix seconds
    pub exp: i64,
}

impl SessionClaims {
    /// # Errors
    ///
    /// `InvalidArgument` when the expiry falls outside the representable dates.
    pub fn new(
        issuer: &str,
        subject: &str,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> CResult<Self> {
        let expires_at = issued_at.checked_add_signed(lifetime).ok_or_else(|| {
            CredentialError::InvalidArgument(format!(
                "a lifetime of {}s issued at {issued_at} overflows the expiry date",
                lifetime.num_seconds()
            ))
        })?;
        Ok(Self {
            iss: issuer.to_owned(),
            sub: subject.to_owned(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// What a verifier requires from the claims of a token it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedClaims {
    pub issuer: String,
    pub subject: Option<String>,
}

impl ExpectedClaims {
    #[must_use]
    pub fn issuer(issuer: &str) -> Self {
        Self {
            issuer: issuer.to_owned(),
            subject: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// The instant expiry is checked against, the current time when `None`
    pub now: Option<DateTime<Utc>>,
    /// Seconds of tolerance past `exp`
    pub leeway_secs: u64,
}

impl VerifyOptions {
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Some(now),
            leeway_secs: 0,
        }
    }
}

/// The two supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    RS256,
    HS256,
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(algorithm: SigningAlgorithm) -> Self {
        match algorithm {
            SigningAlgorithm::RS256 => Self::RS256,
            SigningAlgorithm::HS256 => Self::HS256,
        }
    }
}

impl Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RS256 => write!(f, "RS256"),
            Self::HS256 => write!(f, "HS256"),
        }
    }
}

/// A shared symmetric secret for HMAC-SHA256.
pub struct HmacSecret(Zeroizing<Vec<u8>>);

impl HmacSecret {
    /// # Errors
    ///
    /// `ConfigError` if the secret is empty.
    pub fn new(secret: Vec<u8>) -> CResult<Self> {
        credential_ensure!(
            !secret.is_empty(),
            CredentialError::ConfigError("the HMAC secret must not be empty".to_owned())
        );
        Ok(Self(Zeroizing::new(secret)))
    }

    /// Reuse the raw bytes of a key file as HMAC secret.
    #[must_use]
    pub fn from_key(key: &Key) -> Self {
        Self(Zeroizing::new(key.raw_bytes().to_vec()))
    }

    /// Read the secret from a file; the bytes are used as is.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the file cannot be read or is empty.
    pub fn load(path: &Path) -> CResult<Self> {
        let secret = fs::read(path).map_err(|e| {
            CredentialError::ConfigError(format!(
                "unable to read the HMAC secret {}: {e}",
                path.display()
            ))
        })?;
        Self::new(secret)
    }

    /// HMAC-SHA256 of `data`.
    ///
    /// # Errors
    ///
    /// Fails if openssl cannot compute the MAC.
    pub fn sign(&self, data: &[u8]) -> CResult<Vec<u8>> {
        let key = PKey::hmac(&self.0)?;
        let mut signer = Signer::new(MessageDigest::sha256(), &key)?;
        signer.update(data)?;
        signer.sign_to_vec().context("HMAC-SHA256 computation")
    }

    fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for HmacSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HmacSecret(***)")
    }
}

/// Signs and verifies session tokens with the algorithm chosen at construction.
#[derive(Debug)]
pub enum SessionSigner {
    Rs256(Arc<KeySet>),
    Hs256(HmacSecret),
}

impl SessionSigner {
    #[must_use]
    pub const fn algorithm(&self) -> SigningAlgorithm {
        match self {
            Self::Rs256(_) => SigningAlgorithm::RS256,
            Self::Hs256(_) => SigningAlgorithm::HS256,
        }
    }

    /// Sign `claims` into a compact token.
    ///
    /// In RS256 mode the `kid` header names the current signing key.
    ///
    /// # Errors
    ///
    /// `ConfigError` if `algorithm` is not the algorithm this signer was built for.
    pub fn sign(&self, algorithm: SigningAlgorithm, claims: &SessionClaims) -> CResult<String> {
        credential_ensure!(
            algorithm == self.algorithm(),
            CredentialError::ConfigError(format!(
                "cannot sign a {algorithm} token with a {} signer",
                self.algorithm()
            ))
        );
        let mut header = Header::new(algorithm.into());
        let token = match self {
            Self::Rs256(keys) => {
                let key = keys.signing();
                header.kid = Some(key.id().to_owned());
                encode(&header, claims, key.encoding_key())
            }
            Self::Hs256(secret) => encode(&header, claims, &EncodingKey::from_secret(secret.bytes())),
        }
        .context("unable to sign the session token")?;
        debug!(
            "session token signed with {algorithm}, kid: {:?}",
            header.kid.as_deref()
        );
        Ok(token)
    }

    /// Verify the signature and the claims of a session token.
    ///
    /// A token is valid up to and including the second of its `exp` claim.
    ///
    /// # Errors
    ///
    /// - `MalformedToken` when the token cannot be decoded or has no `kid` in RS256 mode
    /// - `SignatureMismatch` on a bad signature or a different algorithm
    /// - `UnknownKeyId` when `kid` is not in the key set
    /// - `InvalidClaims` on issuer or subject mismatch
    /// - `Expired` once `exp` has passed
    pub fn verify(
        &self,
        token: &str,
        expected: &ExpectedClaims,
        options: &VerifyOptions,
    ) -> CResult<SessionClaims> {
        credential_ensure!(
            !token.is_empty(),
            CredentialError::MalformedToken(MalformedReason::Empty)
        );
        let header = decode_header(token)?;
        let algorithm = self.algorithm();
        credential_ensure!(
            header.alg == Algorithm::from(algorithm),
            CredentialError::SignatureMismatch(format!(
                "token is signed with {:?}, expected {algorithm}",
                header.alg
            ))
        );

        let mut validation = Validation::new(algorithm.into());
        // expiry is checked below against the injected clock
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[expected.issuer.as_str()]);

        let token_data = match self {
            Self::Rs256(keys) => {
                let kid = header.kid.as_deref().ok_or_else(|| {
                    CredentialError::MalformedToken(MalformedReason::Invalid(
                        "token header carries no key ID".to_owned(),
                    ))
                })?;
                trace!("verifying session token with key {kid}");
                let key = keys.lookup(kid)?;
                decode::<SessionClaims>(token, key.decoding_key(), &validation)?
            }
            Self::Hs256(secret) => decode::<SessionClaims>(
                token,
                &DecodingKey::from_secret(secret.bytes()),
                &validation,
            )?,
        };
        let claims = token_data.claims;

        let now = options.now.unwrap_or_else(Utc::now).timestamp();
        let leeway = i64::try_from(options.leeway_secs).unwrap_or(i64::MAX);
        credential_ensure!(
            claims.exp.saturating_add(leeway) >= now,
            CredentialError::Expired
        );
        if let Some(subject) = &expected.subject {
            credential_ensure!(
                &claims.sub == subject,
                CredentialError::InvalidClaims("subject mismatch".to_owned())
            );
        }
        Ok(claims)
    }

    /// Raw HMAC-SHA256 over `data`, used for personal access token signatures.
    ///
    /// # Errors
    ///
    /// `ConfigError` in RS256 mode: the two modes never mix on one token.
    pub fn sign_bytes(&self, data: &[u8]) -> CResult<Vec<u8>> {
        match self {
            Self::Hs256(secret) => secret.sign(data),
            Self::Rs256(_) => Err(CredentialError::ConfigError(
                "raw HMAC signatures require an HS256 signer".to_owned(),
            )),
        }
    }
}
