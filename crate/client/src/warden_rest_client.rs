use std::time::Duration;

use reqwest::{
    Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::trace;
use url::Url;
use uuid::Uuid;

use crate::{
    ClientResultHelper,
    error::ClientError,
    result::ClientResult,
    types::{
        CreateTokenRequest, CreatedTokenResponse, HealthResponse, RegenerateTokenRequest,
        SessionResponse, TokenResponse, WhoAmIResponse,
    },
};

/// Build the `Authorization: Bearer <token>` header value.
///
/// The value is flagged sensitive so that it is never printed by `reqwest`.
pub fn bearer_header(token: &str) -> ClientResult<HeaderValue> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ClientError::InvalidToken("empty bearer token".to_owned()));
    }
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Attach the bearer credential to a set of headers, replacing any previous one.
pub fn attach_bearer(headers: &mut HeaderMap, token: &str) -> ClientResult<()> {
    headers.insert(AUTHORIZATION, bearer_header(token)?);
    Ok(())
}

/// A client of the Warden REST API.
///
/// Every request built by this client, unary or streaming, carries the
/// configured credential.
#[derive(Clone)]
pub struct WardenClient {
    pub server_url: String,
    client: Client,
    authorization: Option<HeaderValue>,
}

impl WardenClient {
    /// Instantiate a new client.
    ///
    /// # Errors
    ///
    /// Fails when the server URL cannot be parsed or the token is not a valid header value.
    pub fn instantiate(server_url: &str, bearer_token: Option<&str>) -> ClientResult<Self> {
        let server_url = server_url
            .strip_suffix('/')
            .map_or_else(|| server_url.to_owned(), ToOwned::to_owned);
        Url::parse(&server_url)?;

        let authorization = bearer_token.map(bearer_header).transpose()?;

        Ok(Self {
            client: ClientBuilder::new()
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .context("Reqwest client builder")?,
            server_url,
            authorization,
        })
    }

    #[must_use]
    pub const fn has_credential(&self) -> bool {
        self.authorization.is_some()
    }

    /// Start a request to `endpoint` with the credential attached.
    #[must_use]
    pub fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{endpoint}", self.server_url));
        match &self.authorization {
            Some(authorization) => builder.header(AUTHORIZATION, authorization.clone()),
            None => builder,
        }
    }

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        self.send_json(self.request(Method::GET, "/health"), "/health")
            .await
    }

    pub async fn whoami(&self) -> ClientResult<WhoAmIResponse> {
        self.send_json(self.request(Method::GET, "/api/whoami"), "/api/whoami")
            .await
    }

    /// Exchange the configured credential for a session token.
    pub async fn create_session(&self) -> ClientResult<SessionResponse> {
        self.send_json(self.request(Method::POST, "/api/session"), "/api/session")
            .await
    }

    pub async fn list_tokens(&self) -> ClientResult<Vec<TokenResponse>> {
        self.send_json(self.request(Method::GET, "/api/tokens"), "/api/tokens")
            .await
    }

    pub async fn create_token(
        &self,
        request: &CreateTokenRequest,
    ) -> ClientResult<CreatedTokenResponse> {
        self.post_json("/api/tokens", request).await
    }

    pub async fn get_token(&self, id: Uuid) -> ClientResult<TokenResponse> {
        let endpoint = format!("/api/tokens/{id}");
        self.send_json(self.request(Method::GET, &endpoint), &endpoint)
            .await
    }

    pub async fn regenerate_token(
        &self,
        id: Uuid,
        request: &RegenerateTokenRequest,
    ) -> ClientResult<CreatedTokenResponse> {
        self.post_json(&format!("/api/tokens/{id}/regenerate"), request)
            .await
    }

    pub async fn delete_token(&self, id: Uuid) -> ClientResult<()> {
        let endpoint = format!("/api/tokens/{id}");
        let response = self.request(Method::DELETE, &endpoint).send().await?;
        if response.status().is_success() {
            return Ok(())
        }
        Err(handle_error(&endpoint, response).await)
    }

    async fn post_json<O, R>(&self, endpoint: &str, data: &O) -> ClientResult<R>
    where
        O: Serialize,
        R: DeserializeOwned,
    {
        trace!(
            "==>\n{}",
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "[N/A]".to_owned())
        );
        self.send_json(self.request(Method::POST, endpoint).json(data), endpoint)
            .await
    }

    async fn send_json<R>(&self, request: RequestBuilder, endpoint: &str) -> ClientResult<R>
    where
        R: DeserializeOwned,
    {
        let response = request.send().await?;
        if response.status().is_success() {
            return response
                .json::<R>()
                .await
                .map_err(|e| ClientError::ResponseFailed(format!("{endpoint}: {e}")))
        }
        Err(handle_error(endpoint, response).await)
    }
}

async fn handle_error(endpoint: &str, response: Response) -> ClientError {
    trace!("Error response received on {endpoint}: Response: {response:?}");
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = if text.is_empty() {
        match status {
            StatusCode::NOT_FOUND => "Warden server endpoint does not exist".to_owned(),
            StatusCode::UNAUTHORIZED => "Bad authorization token".to_owned(),
            _ => status.to_string(),
        }
    } else {
        text
    };
    if status == StatusCode::UNAUTHORIZED {
        ClientError::Unauthorized(format!("{endpoint}: {message}"))
    } else {
        ClientError::RequestFailed(format!("{endpoint}: {status}: {message}"))
    }
}
