use actix_web::web::{self, ServiceConfig};

use crate::middlewares::AuthTransformer;

pub(crate) mod health;
pub(crate) mod identity;
pub(crate) mod tokens;

/// Mount the routes of the server.
///
/// Everything under `/api` requires a credential.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(health::health).service(
        web::scope("/api")
            .wrap(AuthTransformer::new())
            .service(identity::whoami)
            .service(identity::session)
            .service(tokens::list_tokens)
            .service(tokens::create_token)
            .service(tokens::get_token)
            .service(tokens::delete_token)
            .service(tokens::regenerate_token),
    );
}
