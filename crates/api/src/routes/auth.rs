//! Session sign-out. Signing in belongs to the authentication layer.

use axum::http::StatusCode;
use tower_sessions::Session;

use crate::error::ApiError;
use crate::session::sign_out;

/// POST /logout: forget the signed-in buyer. The cart stays in the session.
#[tracing::instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode, ApiError> {
    sign_out(&session)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}
