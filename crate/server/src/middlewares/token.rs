use actix_web::{
    FromRequest, HttpMessage, HttpRequest,
    dev::Payload,
    http::header::{AUTHORIZATION, COOKIE, HeaderMap},
};
use futures::future::{Ready, ready};
use warden_credentials::{AuthToken, CredentialError};

use crate::error::WardenError;

const BEARER_PREFIX: &str = "Bearer ";

/// Find the credential of a request.
///
/// A non-empty `Authorization: Bearer <token>` header wins over the cookies.
/// Otherwise the whole `Cookie` header is kept, since the session cookie is
/// picked out of it at verification time.
///
/// # Errors
///
/// `NoAccessToken` when the request carries neither.
pub(crate) fn extract_token(headers: &HeaderMap) -> Result<AuthToken, CredentialError> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().strip_prefix(BEARER_PREFIX))
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Ok(AuthToken::AccessToken(token.to_owned()))
    }

    let cookie = headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty());
    if let Some(cookie) = cookie {
        return Ok(AuthToken::CookieToken(cookie.to_owned()))
    }

    Err(CredentialError::NoAccessToken)
}

/// The credential stored by the authentication middleware.
pub(crate) struct RequestToken(pub AuthToken);

impl FromRequest for RequestToken {
    type Error = WardenError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthToken>()
                .cloned()
                .map(Self)
                .ok_or_else(|| WardenError::from(CredentialError::NoAccessToken)),
        )
    }
}
