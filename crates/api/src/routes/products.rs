//! Catalog browsing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::ProductId;
use serde::Deserialize;
use store::{InventoryStore, Product, ProductQuery, ProductSort, Store};

use crate::AppState;
use crate::error::ApiError;

/// Number of products on the landing page.
const FEATURED_COUNT: usize = 6;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

/// GET /products: search and sort the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let mut query = ProductQuery::new().sort(
        params
            .sort
            .as_deref()
            .map(ProductSort::parse)
            .unwrap_or_default(),
    );
    if let Some(term) = params.search {
        query = query.search(term);
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }

    Ok(Json(state.store.list_products(query).await?))
}

/// GET /products/featured: newest products.
#[tracing::instrument(skip(state))]
pub async fn featured<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let query = ProductQuery::new().limit(FEATURED_COUNT);
    Ok(Json(state.store.list_products(query).await?))
}

/// GET /products/{id}: product detail.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .store
        .get_product(&ProductId::new(id.as_str()))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))
}
