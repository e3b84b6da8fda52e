//! Session cart endpoints. Anonymous sessions may use every one of these.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{Money, ProductId};
use domain::{CartError, CartSession, CartTotals, CartView, QuantityNotice};
use serde::{Deserialize, Serialize};
use store::Store;
use tower_sessions::Session;

use crate::AppState;
use crate::error::ApiError;
use crate::session::HttpSession;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: String,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub quantities: HashMap<String, i64>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub ok: bool,
    pub granted: u32,
    pub requested: u32,
    pub message: String,
    pub total_items: u64,
    pub total_amount: Money,
}

#[derive(Debug, Serialize)]
pub struct OutOfStockResponse {
    pub ok: bool,
    pub error: String,
    pub total_items: u64,
    pub total_amount: Money,
}

#[derive(Debug, Serialize)]
pub struct NoticeResponse {
    #[serde(flatten)]
    pub notice: QuantityNotice,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub cart: CartView,
    pub notices: Vec<NoticeResponse>,
}

// -- Handlers --

/// GET /cart: cart lines with line totals.
#[tracing::instrument(skip(state, session))]
pub async fn view<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
) -> Result<Json<CartView>, ApiError> {
    let cart = HttpSession::new(session).load_cart().await?;
    Ok(Json(state.reconciler.view(&cart).await?))
}

/// GET /cart/summary: item count and amount.
#[tracing::instrument(skip(state, session))]
pub async fn summary<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
) -> Result<Json<CartTotals>, ApiError> {
    let cart = HttpSession::new(session).load_cart().await?;
    Ok(Json(state.reconciler.summary(&cart).await?))
}

/// POST /cart/add: add a product, limited by remaining stock.
#[tracing::instrument(skip(state, session))]
pub async fn add<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
    Json(req): Json<AddRequest>,
) -> Result<Response, ApiError> {
    let session = HttpSession::new(session);
    let cart = session.load_cart().await?;

    let outcome = match state
        .reconciler
        .add(&cart, ProductId::new(req.product_id), req.quantity.unwrap_or(1))
        .await
    {
        Ok(outcome) => outcome,
        Err(err @ CartError::OutOfStock { .. }) => {
            let totals = state.reconciler.summary(&cart).await?;
            let body = OutOfStockResponse {
                ok: false,
                error: err.to_string(),
                total_items: totals.total_items,
                total_amount: totals.total_amount,
            };
            return Ok((StatusCode::CONFLICT, Json(body)).into_response());
        }
        Err(err) => return Err(err.into()),
    };

    session.store_cart(&outcome.cart).await?;
    let totals = state.reconciler.summary(&outcome.cart).await?;

    Ok(Json(AddResponse {
        ok: true,
        granted: outcome.granted,
        requested: outcome.requested,
        message: outcome.message,
        total_items: totals.total_items,
        total_amount: totals.total_amount,
    })
    .into_response())
}

/// POST /cart/update: replace quantities, clamping to stock.
#[tracing::instrument(skip(state, session))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let session = HttpSession::new(session);
    let cart = session.load_cart().await?;

    let updates = req
        .quantities
        .into_iter()
        .map(|(id, qty)| (ProductId::new(id), qty));
    let outcome = state.reconciler.bulk_update(&cart, updates).await?;
    session.store_cart(&outcome.cart).await?;

    let notices = outcome
        .notices
        .into_iter()
        .map(|notice| NoticeResponse {
            message: notice.to_string(),
            notice,
        })
        .collect();

    Ok(Json(UpdateResponse {
        cart: state.reconciler.view(&outcome.cart).await?,
        notices,
    }))
}

/// POST /cart/remove/{id}: drop one product.
#[tracing::instrument(skip(state, session))]
pub async fn remove<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    let session = HttpSession::new(session);
    let cart = session.load_cart().await?;

    let cart = state.reconciler.remove(&cart, &ProductId::new(id));
    session.store_cart(&cart).await?;

    Ok(Json(state.reconciler.view(&cart).await?))
}
