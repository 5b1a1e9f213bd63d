//! Bearer-token identity resolution and role extractors.
//!
//! Handlers take [`AuthUser`] to require any signed-in caller or
//! [`AdminUser`] to require an administrator. Both resolve the
//! `Authorization: Bearer <token>` header through the application's
//! [`IdentityProvider`] before the handler runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::Caller;
use document_store::DocumentStore;
use tokio::sync::RwLock;

use crate::AppState;
use crate::error::ApiError;

/// Maps opaque bearer tokens to callers.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a token, `None` if it is unknown.
    async fn resolve(&self, token: &str) -> Option<Caller>;

    /// Issues a fresh token for a caller.
    async fn issue(&self, caller: Caller) -> String;
}

/// Identity provider keeping tokens in process memory.
///
/// Tokens are random UUIDs and never expire.
#[derive(Clone, Default)]
pub struct InMemoryIdentityProvider {
    tokens: Arc<RwLock<HashMap<String, Caller>>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a caller-chosen token, replacing any previous binding.
    pub async fn bind(&self, token: impl Into<String>, caller: Caller) {
        self.tokens.write().await.insert(token.into(), caller);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn resolve(&self, token: &str) -> Option<Caller> {
        self.tokens.read().await.get(token).copied()
    }

    async fn issue(&self, caller: Caller) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.bind(token.clone(), caller).await;
        token
    }
}

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("malformed authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthorized("expected 'Bearer <token>' authorization".to_string())
            })?;

        Ok(Self(token.to_string()))
    }
}

/// Any authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Caller);

impl<S> FromRequestParts<Arc<AppState<S>>> for AuthUser
where
    S: DocumentStore + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        match state.identity.resolve(&token).await {
            Some(caller) => Ok(Self(caller)),
            None => {
                metrics::counter!("auth_rejections_total", "reason" => "unknown_token").increment(1);
                tracing::debug!("rejected unknown bearer token");
                Err(ApiError::Unauthorized("unknown token".to_string()))
            }
        }
    }
}

/// An authenticated administrator. Other callers are rejected with 403.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Caller);

impl<S> FromRequestParts<Arc<AppState<S>>> for AdminUser
where
    S: DocumentStore + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(caller) = AuthUser::from_request_parts(parts, state).await?;
        if !caller.is_admin() {
            metrics::counter!("auth_rejections_total", "reason" => "not_admin").increment(1);
            return Err(ApiError::Forbidden(
                "administrator role required".to_string(),
            ));
        }
        Ok(Self(caller))
    }
}
