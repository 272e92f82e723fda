use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::cookie::SESSION_COOKIE;
use crate::auth::token::TokenService;
use crate::error::AppError;

/// Pages reachable without a session.
const PUBLIC_PAGES: [&str; 3] = ["/", "/login", "/register"];
/// API prefixes reachable without a session.
const PUBLIC_API_PREFIXES: [&str; 3] = ["/api/auth/login", "/api/auth/register", "/api/auth/logout"];
/// Pages a signed-in user is bounced away from.
const AUTH_PAGES: [&str; 2] = ["/login", "/register"];

pub const LOGIN_PAGE: &str = "/login";
pub const DASHBOARD_PAGE: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    PublicPage,
    PublicApi,
    ProtectedPage,
    ProtectedApi,
}

impl RouteClass {
    pub fn of(path: &str) -> Self {
        if PUBLIC_PAGES.contains(&path) {
            RouteClass::PublicPage
        } else if path == "/health"
            || PUBLIC_API_PREFIXES
                .iter()
                .any(|prefix| path.starts_with(prefix))
        {
            RouteClass::PublicApi
        } else if path == "/api" || path.starts_with("/api/") {
            RouteClass::ProtectedApi
        } else {
            RouteClass::ProtectedPage
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
    Reject,
}

/// Pure decision for one request given whether its session verified.
pub fn decide(authenticated: bool, path: &str) -> GateDecision {
    if authenticated {
        if AUTH_PAGES.contains(&path) {
            return GateDecision::Redirect(DASHBOARD_PAGE);
        }
        return GateDecision::Allow;
    }

    match RouteClass::of(path) {
        RouteClass::PublicPage | RouteClass::PublicApi => GateDecision::Allow,
        RouteClass::ProtectedPage => GateDecision::Redirect(LOGIN_PAGE),
        RouteClass::ProtectedApi => GateDecision::Reject,
    }
}

/// Verifies the session cookie on every request and enforces the route
/// table above. Verified `Claims` are stored in the request extensions for
/// the `AuthenticatedUser` extractor.
pub struct AccessGate {
    tokens: Rc<TokenService>,
}

impl AccessGate {
    pub fn new(tokens: TokenService) -> Self {
        Self {
            tokens: Rc::new(tokens),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AccessGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessGateService {
            service,
            tokens: Rc::clone(&self.tokens),
        }))
    }
}

pub struct AccessGateService<S> {
    service: S,
    tokens: Rc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for AccessGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = req
            .cookie(SESSION_COOKIE)
            .and_then(|cookie| self.tokens.verify_token(cookie.value()));

        match decide(claims.is_some(), req.path()) {
            GateDecision::Allow => {
                if let Some(claims) = claims {
                    req.extensions_mut().insert(claims);
                }
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            GateDecision::Redirect(location) => {
                log::debug!("redirecting {} to {}", req.path(), location);
                let response = HttpResponse::TemporaryRedirect()
                    .insert_header((header::LOCATION, location))
                    .finish()
                    .map_into_right_body();
                Box::pin(async move { Ok(req.into_response(response)) })
            }
            GateDecision::Reject => {
                let response = AppError::Unauthorized("Unauthorized".into())
                    .error_response()
                    .map_into_right_body();
                Box::pin(async move { Ok(req.into_response(response)) })
            }
        }
    }
}
