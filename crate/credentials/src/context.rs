use std::fmt;

use crate::pat::PERSONAL_ACCESS_TOKEN_PREFIX;

/// The credential presented with one request, kept for that request only.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthToken {
    /// From `Authorization: Bearer <token>`
    AccessToken(String),
    /// The raw `Cookie` header
    CookieToken(String),
}

impl AuthToken {
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::AccessToken(value) | Self::CookieToken(value) => value,
        }
    }

    /// True for a bearer token carrying the personal access token prefix.
    ///
    /// The signature is not checked here.
    #[must_use]
    pub fn is_personal_access_token(&self) -> bool {
        matches!(self, Self::AccessToken(value) if value.starts_with(PERSONAL_ACCESS_TOKEN_PREFIX))
    }

    /// The value of the cookie `name`, for a cookie token.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        let Self::CookieToken(header) = self else {
            return None;
        };
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim())
        })
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(***)"),
            Self::CookieToken(_) => f.write_str("CookieToken(***)"),
        }
    }
}
