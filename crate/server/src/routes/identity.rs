use std::sync::Arc;

use actix_web::{
    get, post,
    web::{Data, Json},
};
use tracing::info;
use warden_client::types::{SessionResponse, WhoAmIResponse};

use crate::{core::Warden, middlewares::RequestToken, result::KResult};

/// The user behind the credential of the request
#[get("/whoami")]
pub(crate) async fn whoami(
    token: RequestToken,
    warden: Data<Arc<Warden>>,
) -> KResult<Json<WhoAmIResponse>> {
    let identity = warden.authenticate(&token.0).await?;
    info!("GET /api/whoami {}", identity.user_id);
    Ok(Json(WhoAmIResponse {
        user_id: identity.user_id,
        credential: identity.credential,
    }))
}

/// Exchange any valid credential for a fresh session token
#[post("/session")]
pub(crate) async fn session(
    token: RequestToken,
    warden: Data<Arc<Warden>>,
) -> KResult<Json<SessionResponse>> {
    let identity = warden.authenticate(&token.0).await?;
    info!("POST /api/session {}", identity.user_id);
    Ok(Json(warden.issue_session(&identity)?))
}
