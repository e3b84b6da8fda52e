//! Cookie-backed sessions holding the cart and the signed-in buyer.

use async_trait::async_trait;
use domain::{BuyerIdentity, Cart, CartSession, SessionError};
use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::{ExpiredDeletion, Expiry, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore as PostgresSessionStore;

use crate::config::Config;
use crate::error::ApiError;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "storefront_session";

/// Session keys.
pub mod keys {
    pub const CART: &str = "cart";
    pub const BUYER: &str = "buyer";
}

const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// How often expired sessions are purged from PostgreSQL.
const SESSION_CLEANUP_SECONDS: u64 = 60;

/// Creates the session layer over the given session store.
pub fn session_layer<Store>(store: Store, config: &Config) -> SessionManagerLayer<Store>
where
    Store: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.session_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Opens the PostgreSQL session store, creating its table if needed, and
/// starts a background task deleting expired sessions.
pub async fn postgres_session_store(pool: PgPool) -> Result<PostgresSessionStore, sqlx::Error> {
    let store = PostgresSessionStore::new(pool);
    store.migrate().await?;

    let cleanup = store.clone();
    tokio::task::spawn(async move {
        let period = tokio::time::Duration::from_secs(SESSION_CLEANUP_SECONDS);
        if let Err(e) = cleanup.continuously_delete_expired(period).await {
            tracing::error!(error = %e, "expired session cleanup stopped");
        }
    });

    Ok(store)
}

/// Adapts a request's [`Session`] to the [`CartSession`] collaborator.
#[derive(Debug, Clone)]
pub struct HttpSession(Session);

impl HttpSession {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Returns the signed-in buyer or `401`.
    pub async fn require_buyer(&self) -> Result<BuyerIdentity, ApiError> {
        self.current_buyer().await?.ok_or(ApiError::Unauthorized)
    }

    /// Returns the signed-in admin, `401` when anonymous or `403` otherwise.
    pub async fn require_admin(&self) -> Result<BuyerIdentity, ApiError> {
        let buyer = self.require_buyer().await?;
        if !buyer.is_admin {
            return Err(ApiError::Forbidden);
        }
        Ok(buyer)
    }
}

fn session_error(err: tower_sessions::session::Error) -> SessionError {
    SessionError(err.to_string())
}

#[async_trait]
impl CartSession for HttpSession {
    async fn load_cart(&self) -> Result<Cart, SessionError> {
        Ok(self
            .0
            .get::<Cart>(keys::CART)
            .await
            .map_err(session_error)?
            .unwrap_or_default())
    }

    async fn store_cart(&self, cart: &Cart) -> Result<(), SessionError> {
        self.0.insert(keys::CART, cart).await.map_err(session_error)
    }

    async fn clear_cart(&self) -> Result<(), SessionError> {
        self.0
            .remove::<Cart>(keys::CART)
            .await
            .map_err(session_error)?;
        Ok(())
    }

    async fn current_buyer(&self) -> Result<Option<BuyerIdentity>, SessionError> {
        self.0
            .get::<BuyerIdentity>(keys::BUYER)
            .await
            .map_err(session_error)
    }
}

/// Records the signed-in buyer. Called by the authentication layer.
pub async fn sign_in(
    session: &Session,
    buyer: &BuyerIdentity,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::BUYER, buyer).await
}

/// Forgets the signed-in buyer, keeping the cart.
pub async fn sign_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<BuyerIdentity>(keys::BUYER).await?;
    Ok(())
}
