/// CSRF middleware
///
/// Every request except GET, HEAD and OPTIONS must carry an `X-CSRF-Token`
/// header bound to the session in its refresh-token cookie.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::error::AppError;
use crate::routes::cookies::{read_cookie, read_csrf_header, REFRESH_COOKIE};
use crate::session::SessionController;

pub struct CsrfGuard {
    sessions: SessionController,
}

impl CsrfGuard {
    pub fn new(sessions: SessionController) -> Self {
        Self { sessions }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CsrfGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(CsrfGuardService {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
        }))
    }
}

pub struct CsrfGuardService<S> {
    service: Rc<S>,
    sessions: SessionController,
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

impl<S, B> Service<ServiceRequest> for CsrfGuardService<S>
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
        if !is_safe_method(req.method()) {
            let header = read_csrf_header(req.request());
            let refresh_token = read_cookie(req.request(), REFRESH_COOKIE);

            if let Err(e) = self
                .sessions
                .enforce_csrf(header.as_deref(), refresh_token.as_deref())
            {
                tracing::warn!(
                    method = %req.method(),
                    path = %req.path(),
                    has_header = header.is_some(),
                    "CSRF check failed"
                );
                return Box::pin(async move { Err(AppError::from(e).into()) });
            }
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}
