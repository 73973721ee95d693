use crate::error::AppError;
use axum::http::header::AUTHORIZATION;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    /// Catalog mutations (create/update/delete movies) are admin-only.
    pub fn can_manage_catalog(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Resolved caller identity, attached to request extensions by
/// [`BearerAuthLayer`] once the bearer token checks out.
#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub role: Role,
}

pub fn require_catalog_admin(identity: &Identity) -> Result<(), AppError> {
    if identity.role.can_manage_catalog() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Catalog changes require an admin token".into(),
        ))
    }
}

#[derive(Clone)]
pub struct BearerAuthLayer {
    tokens: Arc<DashMap<String, Identity>>,
}

impl BearerAuthLayer {
    pub fn new(tokens: Arc<DashMap<String, Identity>>) -> Self {
        Self { tokens }
    }
}

impl<S> tower::Layer<S> for BearerAuthLayer {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            tokens: self.tokens.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BearerAuthService<S> {
    inner: S,
    tokens: Arc<DashMap<String, Identity>>,
}

impl<S, B> tower::Service<axum::http::Request<B>> for BearerAuthService<S>
where
    S: tower::Service<axum::http::Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let tokens = self.tokens.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let identity = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .and_then(|token| tokens.get(token).map(|entry| entry.value().clone()));

            let Some(identity) = identity else {
                return Ok(AppError::Unauthorized(
                    "Invalid or missing bearer token".into(),
                )
                .into_response());
            };

            req.extensions_mut().insert(identity);
            inner.call(req).await
        })
    }
}
