//! Order confirmation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::Serialize;
use store::{OrderDetail, OrderStore, Store};
use tower_sessions::Session;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::session::HttpSession;

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub buyer_id: Option<UserId>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub shipping_address: String,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl From<OrderDetail> for OrderResponse {
    fn from(detail: OrderDetail) -> Self {
        let items = detail
            .lines
            .into_iter()
            .map(|line| OrderItemResponse {
                line_total: line.line_total(),
                product_id: line.product_id,
                title: line.title,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        let order = detail.order;

        Self {
            id: order.id,
            buyer_id: order.buyer_id,
            buyer_name: order.buyer_name,
            buyer_email: order.buyer_email,
            shipping_address: order.shipping_address,
            total: order.total,
            created_at: order.created_at,
            items,
        }
    }
}

// -- Handlers --

/// GET /orders/{id}: order confirmation, visible to its buyer and to admins.
#[tracing::instrument(skip(state, session))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let viewer = HttpSession::new(session).require_buyer().await?;
    let order_id = OrderId::from_uuid(parse_uuid(&id)?);

    let detail = state
        .store
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    // Hide other buyers' orders behind the same 404 as missing ones.
    if !viewer.is_admin && detail.order.buyer_id != Some(viewer.id) {
        return Err(ApiError::NotFound(format!("Order {id} not found")));
    }

    Ok(Json(detail.into()))
}

pub(crate) fn parse_uuid(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
