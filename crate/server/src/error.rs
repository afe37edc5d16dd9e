use actix_web::{
    HttpResponse, HttpResponseBuilder,
    error::ResponseError,
    http::{StatusCode, header},
};
use thiserror::Error;
use tracing::{error, warn};
use warden_credentials::CredentialError;

// Each error type must have a corresponding HTTP status code (see `status_code`)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WardenError {
    // The caller could not be authenticated
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Missing or invalid arguments in the request
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    // Invalid configuration or a feature which is not enabled on this server
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // A failure originating from one of the cryptographic primitives
    #[error("Cryptographic error: {0}")]
    CryptographicError(String),

    // Any errors related to a bad behavior of the server but not related to the user input
    #[error("Unexpected server error: {0}")]
    ServerError(String),
}

impl From<CredentialError> for WardenError {
    fn from(e: CredentialError) -> Self {
        if e.is_unauthenticated() {
            return Self::Unauthorized(e.to_string())
        }
        match e {
            CredentialError::InvalidArgument(s) => Self::InvalidRequest(s),
            CredentialError::ItemNotFound(s) => Self::ItemNotFound(s),
            CredentialError::ConfigError(s) => Self::ConfigurationError(s),
            CredentialError::CryptographicError(s) => Self::CryptographicError(s),
            e => Self::ServerError(e.to_string()),
        }
    }
}

impl From<std::io::Error> for WardenError {
    fn from(e: std::io::Error) -> Self {
        Self::ServerError(e.to_string())
    }
}

impl From<toml::de::Error> for WardenError {
    fn from(e: toml::de::Error) -> Self {
        Self::ConfigurationError(e.to_string())
    }
}

impl ResponseError for WardenError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ItemNotFound(_) => StatusCode::NOT_FOUND,
            Self::ConfigurationError(_) | Self::CryptographicError(_) | Self::ServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let message = self.to_string();

        if status_code >= StatusCode::INTERNAL_SERVER_ERROR {
            error!("{status_code} - {message}");
        } else {
            warn!("{status_code} - {message}");
        }

        HttpResponseBuilder::new(status_code)
            .insert_header((header::CONTENT_TYPE, "text/plain; charset=utf-8"))
            .body(message)
    }
}

/// Return early with an error if a condition is not satisfied.
///
/// This macro is equivalent to `if !$cond { return Err(From::from($err)); }`.
#[macro_export]
macro_rules! warden_ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($crate::warden_error!($msg));
        }
    };
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return ::core::result::Result::Err($crate::warden_error!($fmt, $($arg)*));
        }
    };
}

/// Construct a server error from a string.
#[macro_export]
macro_rules! warden_error {
    ($msg:literal) => {
        $crate::error::WardenError::ServerError(::core::format_args!($msg).to_string())
    };
    ($err:expr $(,)?) => ({
        $crate::error::WardenError::ServerError($err.to_string())
    });
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::WardenError::ServerError(::core::format_args!($fmt, $($arg)*).to_string())
    };
}

/// Return early with an error.
#[macro_export]
macro_rules! warden_bail {
    ($msg:literal) => {
        return ::core::result::Result::Err($crate::warden_error!($msg))
    };
    ($err:expr $(,)?) => {
        return ::core::result::Result::Err($err)
    };
    ($fmt:expr, $($arg:tt)*) => {
        return ::core::result::Result::Err($crate::warden_error!($fmt, $($arg)*))
    };
}
