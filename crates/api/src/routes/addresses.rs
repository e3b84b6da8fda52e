//! Saved-address suggestions for the checkout form.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use domain::CartSession;
use serde::{Deserialize, Serialize};
use store::{AccountStore, Store};
use tower_sessions::Session;

use crate::AppState;
use crate::error::ApiError;
use crate::session::HttpSession;

const MAX_SUGGESTIONS: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub id: i64,
    pub label: Option<String>,
    pub address: String,
}

/// GET /addresses?query=: the buyer's saved addresses, newest first.
///
/// Anonymous sessions get an empty list.
#[tracing::instrument(skip(state, session))]
pub async fn suggest<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
    Query(params): Query<SuggestParams>,
) -> Result<Json<Vec<AddressResponse>>, ApiError> {
    let Some(buyer) = HttpSession::new(session).current_buyer().await? else {
        return Ok(Json(Vec::new()));
    };

    let addresses = state
        .store
        .address_suggestions(buyer.id, params.query.trim(), MAX_SUGGESTIONS)
        .await?;

    Ok(Json(
        addresses
            .into_iter()
            .map(|a| AddressResponse {
                id: a.id,
                label: a.label,
                address: a.address_text,
            })
            .collect(),
    ))
}
