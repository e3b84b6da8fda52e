//! Checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutOutcome, Rejection, ShippingDetails, StockViolation};
use common::{Money, OrderId};
use domain::{CartSession, CartView};
use serde::Serialize;
use store::Store;
use tower_sessions::Session;

use crate::AppState;
use crate::error::ApiError;
use crate::session::HttpSession;

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    /// Prefill for the shipping form.
    pub name: String,
    pub email: String,
    #[serde(flatten)]
    pub cart: CartView,
}

#[derive(Debug, Serialize)]
pub struct ConfirmedResponse {
    pub order_id: OrderId,
    pub total: Money,
}

#[derive(Debug, Serialize)]
pub struct ViolationResponse {
    #[serde(flatten)]
    pub violation: StockViolation,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RejectedResponse {
    pub error: String,
    pub violations: Vec<ViolationResponse>,
}

/// GET /checkout: order preview with the buyer's name and email prefilled.
#[tracing::instrument(skip(state, session))]
pub async fn preview<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
) -> Result<Json<PreviewResponse>, ApiError> {
    let session = HttpSession::new(session);
    let buyer = session.require_buyer().await?;

    let cart = session.load_cart().await?;
    if cart.is_empty() {
        return Err(ApiError::BadRequest("Your cart is empty.".to_string()));
    }

    Ok(Json(PreviewResponse {
        name: buyer.name,
        email: buyer.email,
        cart: state.reconciler.view(&cart).await?,
    }))
}

/// POST /checkout: place an order for the session's cart.
///
/// Responds `201` with the new order id, `409` listing every stock
/// violation, `400` for an empty cart or missing fields, `401` when no
/// buyer is signed in, and `503` when the order could not be written.
#[tracing::instrument(skip(state, session, details))]
pub async fn place<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
    Json(details): Json<ShippingDetails>,
) -> Result<Response, ApiError> {
    let session = HttpSession::new(session);

    match state.checkout.checkout(&session, details).await? {
        CheckoutOutcome::Confirmed { order_id, total } => Ok((
            StatusCode::CREATED,
            Json(ConfirmedResponse { order_id, total }),
        )
            .into_response()),
        CheckoutOutcome::Rejected(Rejection::EmptyCart) => {
            Err(ApiError::BadRequest("Your cart is empty.".to_string()))
        }
        CheckoutOutcome::Rejected(Rejection::Unauthenticated) => Err(ApiError::Unauthorized),
        CheckoutOutcome::Rejected(Rejection::Unavailable(violations)) => {
            let violations = violations
                .into_iter()
                .map(|violation| ViolationResponse {
                    message: violation.to_string(),
                    violation,
                })
                .collect();
            let body = RejectedResponse {
                error: "Some items in your cart are no longer available.".to_string(),
                violations,
            };
            Ok((StatusCode::CONFLICT, Json(body)).into_response())
        }
    }
}
