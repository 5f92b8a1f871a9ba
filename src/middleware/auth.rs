use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::services::identity_service::{IdentityVerifier, VerifiedIdentity};
use crate::utils::error::AppError;

/// Outcome of bearer-token decoding, stored in request extensions.
#[derive(Debug, Clone)]
pub enum IdentityState {
    Verified(VerifiedIdentity),
    Rejected(String),
    ProviderUnavailable(String),
}

/// Decodes `Authorization: Bearer <token>` when present and records the
/// outcome. Never rejects a request: handlers that need a caller take an
/// [`Identity`] argument, which does the rejecting.
pub struct IdentityMiddleware {
    verifier: Arc<dyn IdentityVerifier>,
}

impl IdentityMiddleware {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<dyn IdentityVerifier>,
}

/// Returns the token of a well-formed bearer header, `None` otherwise.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
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
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);

        let service = self.service.clone();
        let verifier = self.verifier.clone();

        Box::pin(async move {
            if let Some(token) = token {
                let state = match verifier.verify(&token).await {
                    Ok(identity) => {
                        log::debug!("🔓 Verified caller {} ({})", identity.email, identity.uid);
                        IdentityState::Verified(identity)
                    }
                    Err(AppError::UpstreamUnavailable { detail, .. }) => {
                        log::error!("❌ Identity provider unavailable: {}", detail);
                        IdentityState::ProviderUnavailable(detail)
                    }
                    Err(AppError::Unauthorized(reason)) => {
                        log::warn!("⚠️  Rejected bearer token on {}: {}", req.path(), reason);
                        IdentityState::Rejected(reason)
                    }
                    Err(e) => {
                        log::warn!("⚠️  Rejected bearer token on {}: {}", req.path(), e);
                        IdentityState::Rejected(e.to_string())
                    }
                };
                req.extensions_mut().insert(state);
            }

            service.call(req).await
        })
    }
}

/// The verified caller. Declaring it as a handler argument makes the route
/// require identity: extraction fails with 401 before the handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub VerifiedIdentity);

impl Identity {
    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.extensions().get::<IdentityState>() {
            Some(IdentityState::Verified(identity)) => Ok(Identity(identity.clone())),
            Some(IdentityState::Rejected(reason)) => Err(AppError::Unauthorized(reason.clone())),
            Some(IdentityState::ProviderUnavailable(detail)) => {
                Err(AppError::upstream("identity provider", detail))
            }
            None => Err(AppError::Unauthorized("user not authorized".to_string())),
        };
        ready(result)
    }
}
