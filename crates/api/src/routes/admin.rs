//! Back-office endpoints. Every handler requires an admin session.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use store::{DashboardStats, Order, OrderStore, Store};
use tower_sessions::Session;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::orders::{OrderResponse, parse_uuid};
use crate::session::HttpSession;

/// GET /admin: row counts.
#[tracing::instrument(skip(state, session))]
pub async fn dashboard<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
) -> Result<Json<DashboardStats>, ApiError> {
    HttpSession::new(session).require_admin().await?;
    Ok(Json(state.store.dashboard_stats().await?))
}

/// GET /admin/orders: every order, newest first.
#[tracing::instrument(skip(state, session))]
pub async fn list_orders<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
) -> Result<Json<Vec<Order>>, ApiError> {
    HttpSession::new(session).require_admin().await?;
    Ok(Json(state.store.list_orders().await?))
}

/// GET /admin/orders/{id}: any order with its lines.
#[tracing::instrument(skip(state, session))]
pub async fn get_order<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    HttpSession::new(session).require_admin().await?;
    let order_id = OrderId::from_uuid(parse_uuid(&id)?);

    state
        .store
        .get_order(order_id)
        .await?
        .map(|detail| Json(detail.into()))
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))
}
