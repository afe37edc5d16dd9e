use std::sync::Arc;

use actix_web::{
    HttpResponse, delete, get, post,
    web::{Data, Json, Path},
};
use tracing::info;
use uuid::Uuid;
use warden_client::types::{
    CreateTokenRequest, CreatedTokenResponse, RegenerateTokenRequest, TokenResponse,
};
use warden_credentials::{CreateToken, PersonalAccessToken, PersonalAccessTokenRecord};

use crate::{core::Warden, middlewares::RequestToken, result::KResult};

fn token_response(record: PersonalAccessTokenRecord) -> TokenResponse {
    TokenResponse {
        id: record.id,
        name: record.name,
        scopes: record.scopes,
        expiration_time: record.expiration_time,
        created_at: record.created_at,
    }
}

fn created_token_response(
    record: PersonalAccessTokenRecord,
    token: &PersonalAccessToken,
) -> CreatedTokenResponse {
    CreatedTokenResponse {
        token: token_response(record),
        value: token.to_string(),
    }
}

#[get("/tokens")]
pub(crate) async fn list_tokens(
    token: RequestToken,
    warden: Data<Arc<Warden>>,
) -> KResult<Json<Vec<TokenResponse>>> {
    let identity = warden.authenticate(&token.0).await?;
    info!("GET /api/tokens {}", identity.user_id);
    let records = warden.tokens.list(&identity.user_id).await?;
    Ok(Json(records.into_iter().map(token_response).collect()))
}

#[post("/tokens")]
pub(crate) async fn create_token(
    token: RequestToken,
    request: Json<CreateTokenRequest>,
    warden: Data<Arc<Warden>>,
) -> KResult<Json<CreatedTokenResponse>> {
    let identity = warden.authenticate(&token.0).await?;
    let request = request.into_inner();
    info!("POST /api/tokens {} name={}", identity.user_id, request.name);
    let (record, token) = warden
        .tokens
        .create(
            &identity.user_id,
            CreateToken {
                name: request.name,
                scopes: request.scopes,
                expiration_time: request.expiration_time,
            },
        )
        .await?;
    Ok(Json(created_token_response(record, &token)))
}

#[get("/tokens/{id}")]
pub(crate) async fn get_token(
    token: RequestToken,
    id: Path<Uuid>,
    warden: Data<Arc<Warden>>,
) -> KResult<Json<TokenResponse>> {
    let identity = warden.authenticate(&token.0).await?;
    let id = id.into_inner();
    info!("GET /api/tokens/{id} {}", identity.user_id);
    let record = warden.tokens.get(&identity.user_id, id).await?;
    Ok(Json(token_response(record)))
}

#[delete("/tokens/{id}")]
pub(crate) async fn delete_token(
    token: RequestToken,
    id: Path<Uuid>,
    warden: Data<Arc<Warden>>,
) -> KResult<HttpResponse> {
    let identity = warden.authenticate(&token.0).await?;
    let id = id.into_inner();
    info!("DELETE /api/tokens/{id} {}", identity.user_id);
    warden.tokens.delete(&identity.user_id, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Replace the secret of a token: the previous value is rejected from now on
#[post("/tokens/{id}/regenerate")]
pub(crate) async fn regenerate_token(
    token: RequestToken,
    id: Path<Uuid>,
    request: Json<RegenerateTokenRequest>,
    warden: Data<Arc<Warden>>,
) -> KResult<Json<CreatedTokenResponse>> {
    let identity = warden.authenticate(&token.0).await?;
    let id = id.into_inner();
    info!("POST /api/tokens/{id}/regenerate {}", identity.user_id);
    let (record, token) = warden
        .tokens
        .regenerate(&identity.user_id, id, request.expiration_time)
        .await?;
    Ok(Json(created_token_response(record, &token)))
}
