use std::fmt;

use thiserror::Error;

pub(crate) mod result;

/// Why a token could not even be taken apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// The token string is empty.
    Empty,
    /// A personal access token does not start with the expected prefix.
    MissingPrefix,
    /// A personal access token has no `.` between signature and value.
    MissingSeparator,
    /// The signature segment is empty.
    EmptySignature,
    /// The value segment is empty.
    EmptyValue,
    /// A session token could not be decoded.
    Invalid(String),
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty token"),
            Self::MissingPrefix => write!(f, "missing personal access token prefix"),
            Self::MissingSeparator => {
                write!(f, "expected <signature>.<value>, no separator found")
            }
            Self::EmptySignature => write!(f, "empty signature"),
            Self::EmptyValue => write!(f, "empty value"),
            Self::Invalid(reason) => write!(f, "{reason}"),
        }
    }
}

// Every variant is terminal for the operation that produced it; the
// transport status is chosen by whoever sits at the request boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    // Missing or invalid key material, or a disabled feature
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Wrong prefix, wrong structure, empty fields, undecodable JWT
    #[error("Malformed token: {0}")]
    MalformedToken(MalformedReason),

    // Integrity failure: the signature does not match the content
    #[error("Signature mismatch: {0}")]
    SignatureMismatch(String),

    #[error("Token expired")]
    Expired,

    // Issuer or subject do not match what the verifier expects
    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    // The verification key named by the token is not part of the key set
    #[error("Unknown key ID: {0}")]
    UnknownKeyId(String),

    // Neither a bearer header nor a cookie was presented
    #[error("No access token")]
    NoAccessToken,

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // A failure originating from one of the cryptographic primitives
    #[error("Cryptographic error: {0}")]
    CryptographicError(String),

    #[error("Unexpected error: {0}")]
    ServerError(String),
}

impl CredentialError {
    /// True when the caller failed to prove who they are.
    ///
    /// Configuration, storage and internal failures are not authentication
    /// failures and return false.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken(_)
                | Self::SignatureMismatch(_)
                | Self::Expired
                | Self::InvalidClaims(_)
                | Self::UnknownKeyId(_)
                | Self::NoAccessToken
        )
    }
}

impl From<openssl::error::ErrorStack> for CredentialError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::CryptographicError(format!("{e}. Details: {e:?}"))
    }
}

/// Classify a `jsonwebtoken` failure.
///
/// Only decode-side kinds are expected here; encoding failures end up in
/// [`CredentialError::ServerError`].
impl From<jsonwebtoken::errors::Error> for CredentialError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::InvalidSignature => Self::SignatureMismatch("invalid signature".to_owned()),
            ErrorKind::InvalidAlgorithm => {
                Self::SignatureMismatch("token algorithm is not accepted".to_owned())
            }
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidIssuer => Self::InvalidClaims("issuer mismatch".to_owned()),
            ErrorKind::InvalidSubject => Self::InvalidClaims("subject mismatch".to_owned()),
            ErrorKind::MissingRequiredClaim(claim) => {
                Self::MalformedToken(MalformedReason::Invalid(format!("missing claim: {claim}")))
            }
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::MalformedToken(MalformedReason::Invalid(e.to_string())),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::CryptographicError(e.to_string())
            }
            _ => Self::ServerError(e.to_string()),
        }
    }
}

/// Return early with an error if a condition is not satisfied.
///
/// This macro is equivalent to `if !$cond { return Err(From::from($err)); }`.
#[macro_export]
macro_rules! credential_ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($crate::credential_error!($msg));
        }
    };
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return ::core::result::Result::Err($crate::credential_error!($fmt, $($arg)*));
        }
    };
}

/// Construct a server error from a string.
#[macro_export]
macro_rules! credential_error {
    ($msg:literal) => {
        $crate::CredentialError::ServerError(::core::format_args!($msg).to_string())
    };
    ($err:expr $(,)?) => ({
        $crate::CredentialError::ServerError($err.to_string())
    });
    ($fmt:expr, $($arg:tt)*) => {
        $crate::CredentialError::ServerError(::core::format_args!($fmt, $($arg)*).to_string())
    };
}

/// Return early with an error.
#[macro_export]
macro_rules! credential_bail {
    ($msg:literal) => {
        return ::core::result::Result::Err($crate::credential_error!($msg))
    };
    ($err:expr $(,)?) => {
        return ::core::result::Result::Err($err)
    };
    ($fmt:expr, $($arg:tt)*) => {
        return ::core::result::Result::Err($crate::credential_error!($fmt, $($arg)*))
    };
}
