mod auth_middleware;
mod token;

pub(crate) use auth_middleware::AuthTransformer;
pub(crate) use token::{RequestToken, extract_token};
