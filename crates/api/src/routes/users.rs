//! Account endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use common::Role;
use document_store::DocumentStore;
use domain::{ErrorKind, User};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    pub email: String,
}

/// An account with a freshly issued bearer token.
#[derive(Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

/// POST /users: register a client account and issue its bearer token.
///
/// Administrators are never created here.
#[tracing::instrument(skip(state, body))]
pub async fn register<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<AccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let Json(req) = body?;
    let user = state.users.register(&req.email, Role::Client).await?;
    let token = state.identity.issue(user.caller()).await;
    Ok((StatusCode::CREATED, Json(SessionResponse { user, token })))
}

/// POST /users/login: issue a new bearer token for an existing client.
///
/// Earlier tokens stay valid.
#[tracing::instrument(skip(state, body))]
pub async fn login<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<AccountRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = body?;
    let user = state.users.sign_in(&req.email).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ApiError::Unauthorized("unknown account".to_string()),
        _ => e.into(),
    })?;
    let token = state.identity.issue(user.caller()).await;
    Ok(Json(SessionResponse { user, token }))
}

/// GET /users/me: the caller's own account.
#[tracing::instrument(skip(state, caller))]
pub async fn me<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.me(&caller).await?))
}
