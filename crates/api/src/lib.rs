//! HTTP API server with observability for the storefront.
//!
//! Provides JSON endpoints for catalog browsing, the session cart, checkout
//! and the admin back office, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::CheckoutOrchestrator;
use domain::CartReconciler;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_sessions::SessionStore;
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub store: S,
    pub reconciler: CartReconciler<S>,
    pub checkout: CheckoutOrchestrator<S>,
}

impl<S: Store + Clone> AppState<S> {
    /// Wires the cart reconciler and checkout orchestrator to one store.
    pub fn new(store: S) -> Self {
        Self {
            reconciler: CartReconciler::new(store.clone()),
            checkout: CheckoutOrchestrator::new(store.clone()),
            store,
        }
    }
}

/// Creates the storefront routes without middleware.
pub fn create_router<S: Store + Clone + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/featured", get(routes::products::featured::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/sellers/{id}", get(routes::sellers::get::<S>))
        .route("/cart", get(routes::cart::view::<S>))
        .route("/cart/summary", get(routes::cart::summary::<S>))
        .route("/cart/add", post(routes::cart::add::<S>))
        .route("/cart/update", post(routes::cart::update::<S>))
        .route("/cart/remove/{id}", post(routes::cart::remove::<S>))
        .route(
            "/checkout",
            get(routes::checkout::preview::<S>).post(routes::checkout::place::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/addresses", get(routes::addresses::suggest::<S>))
        .route("/logout", post(routes::auth::logout))
        .route("/admin", get(routes::admin::dashboard::<S>))
        .route("/admin/orders", get(routes::admin::list_orders::<S>))
        .route("/admin/orders/{id}", get(routes::admin::get_order::<S>))
        .with_state(state)
}

/// Adds the metrics endpoint, sessions, CORS and request tracing.
pub fn with_layers<SS: SessionStore + Clone>(
    router: Router,
    metrics_handle: PrometheusHandle,
    session_store: SS,
    config: &Config,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    router
        .merge(metrics_router)
        .layer(session::session_layer(session_store, config))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static, SS: SessionStore + Clone>(
    store: S,
    metrics_handle: PrometheusHandle,
    session_store: SS,
    config: &Config,
) -> Router {
    let state = Arc::new(AppState::new(store));
    with_layers(create_router(state), metrics_handle, session_store, config)
}
