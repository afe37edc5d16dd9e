use actix_web::{get, web::Json};
use warden_client::types::HealthResponse;

/// Liveness probe, the only route served without a credential.
#[get("/health")]
pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_owned(),
    })
}
