use std::{
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::{BoxBody, EitherBody},
    dev::{ServiceRequest, ServiceResponse},
};
use futures::{
    Future,
    future::{Ready, ok},
};
use tracing::{debug, error, trace};

use super::extract_token;

/// Requires a credential on every request of the wrapped scope.
///
/// The bearer token or the cookie header is stored in the request
/// extensions as an [`warden_credentials::AuthToken`]; handlers verify it.
#[derive(Clone, Default)]
pub(crate) struct AuthTransformer;

impl AuthTransformer {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthTransformer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Transform = AuthMiddleware<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        debug!("Credential extraction enabled");
        ok(AuthMiddleware {
            service: Rc::new(service),
        })
    }
}

pub(crate) struct AuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Error = Error;
    #[allow(clippy::type_complexity)]
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;

    fn poll_ready(&self, cx: &mut Context) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match extract_token(req.headers()) {
            Ok(token) => {
                trace!("{} {}: found {token:?}", req.method(), req.path());
                req.extensions_mut().insert(token);
                let service = self.service.clone();
                Box::pin(async move {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                })
            }
            Err(e) => Box::pin(async move {
                error!("{:?} {} 401 unauthorized: {e}", req.method(), req.path());
                Ok(req
                    .into_response(HttpResponse::Unauthorized().body(e.to_string()))
                    .map_into_right_body())
            }),
        }
    }
}
