/// Access token middleware
///
/// Validates the access token from the `access_token` cookie (or an
/// `Authorization: Bearer` header) and injects the verified `AccessClaims`
/// into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::error::AppError;
use crate::routes::cookies::{read_bearer_token, read_cookie, ACCESS_COOKIE};
use crate::session::SessionController;

/// Guard for routes that require an authenticated session
pub struct AccessGuard {
    sessions: SessionController,
}

impl AccessGuard {
    pub fn new(sessions: SessionController) -> Self {
        Self { sessions }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AccessGuardService {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
        }))
    }
}

pub struct AccessGuardService<S> {
    service: Rc<S>,
    sessions: SessionController,
}

impl<S, B> Service<ServiceRequest> for AccessGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = read_cookie(req.request(), ACCESS_COOKIE)
            .or_else(|| read_bearer_token(req.request()));

        match self.sessions.authenticate(token.as_deref()) {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.sub, "Access token validated");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(path = %req.path(), error = %e, "Access token rejected");
                Box::pin(async move { Err(AppError::from(e).into()) })
            }
        }
    }
}
