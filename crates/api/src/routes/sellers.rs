//! Public seller profiles.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::UserId;
use serde::Serialize;
use store::{AccountStore, InventoryStore, Product, ProductQuery, Store};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::orders::parse_uuid;

#[derive(Serialize)]
pub struct SellerResponse {
    pub id: UserId,
    pub username: String,
    pub business_name: Option<String>,
    pub seller_description: Option<String>,
    pub rating: f64,
    pub total_sales: i64,
    pub products: Vec<Product>,
}

/// GET /sellers/{id}: seller profile with their listings, newest first.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<SellerResponse>, ApiError> {
    let seller_id = UserId::from_uuid(parse_uuid(&id)?);
    let seller = state
        .store
        .get_user(seller_id)
        .await?
        .filter(|user| user.is_seller)
        .ok_or_else(|| ApiError::NotFound(format!("Seller {id} not found")))?;

    let products = state
        .store
        .list_products(ProductQuery::new().seller(seller_id))
        .await?;

    Ok(Json(SellerResponse {
        id: seller.id,
        username: seller.username,
        business_name: seller.business_name,
        seller_description: seller.seller_description,
        rating: seller.rating,
        total_sales: seller.total_sales,
        products,
    }))
}
