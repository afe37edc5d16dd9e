use reqwest::header::InvalidHeaderValue;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("REST Request Failed: {0}")]
    RequestFailed(String),

    #[error("REST Response Conversion Failed: {0}")]
    ResponseFailed(String),

    // The server answered 401: the configured credential was refused
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid bearer token: {0}")]
    InvalidToken(String),

    #[error("{0}")]
    Default(String),

    #[error(transparent)]
    UrlError(#[from] url::ParseError),
}

impl From<InvalidHeaderValue> for ClientError {
    fn from(e: InvalidHeaderValue) -> Self {
        Self::InvalidToken(e.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Default(e.to_string())
    }
}
