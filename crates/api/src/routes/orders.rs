//! Order placement, lookup and administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use document_store::DocumentStore;
use domain::{Order, OrderView, PlaceOrder, TransitionStatus};
use serde::Deserialize;

use super::parse_id;
use crate::AppState;
use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// POST /orders: place an order for the caller.
#[tracing::instrument(skip(state, caller, body))]
pub async fn place<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
    body: Result<Json<PlaceOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(cmd) = body?;
    let order = state.orders.place_order(&caller, cmd).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/mine: the caller's orders, newest first.
#[tracing::instrument(skip(state, caller))]
pub async fn mine<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let orders = state.orders.list_mine(&caller).await?;
    Ok(Json(state.orders.views(orders).await?))
}

/// GET /orders/{id}: readable by its owner and by administrators.
#[tracing::instrument(skip(state, caller))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = state.orders.get_order(&caller, id).await?;
    Ok(Json(state.orders.view(order).await?))
}

/// GET /admin/orders: every order, newest first.
#[tracing::instrument(skip(state, admin))]
pub async fn admin_list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let orders = state.orders.list_all(&admin).await?;
    Ok(Json(state.orders.views(orders).await?))
}

/// GET /admin/orders/{id}
#[tracing::instrument(skip(state, admin))]
pub async fn admin_get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = state.orders.get_order(&admin, id).await?;
    Ok(Json(state.orders.view(order).await?))
}

/// PUT /admin/orders/{id}/status: record a status change.
#[tracing::instrument(skip(state, admin, body))]
pub async fn admin_transition<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    let Json(req) = body?;
    let order = state
        .orders
        .transition_status(&admin, TransitionStatus::new(id, req.status))
        .await?;
    Ok(Json(order))
}

/// DELETE /admin/orders/{id}
#[tracing::instrument(skip(state, admin))]
pub async fn admin_delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: OrderId = parse_id(&id, "order")?;
    state.orders.delete_order(&admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
