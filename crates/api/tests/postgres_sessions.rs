//! Session persistence against PostgreSQL.
//!
//! Run with:
//!
//! ```bash
//! cargo test -p api --test postgres_sessions
//! ```

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use api::config::Config;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{Value, json};
use sqlx::PgPool;
use store::{PostgresStore, SampleData};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tower::ServiceExt;

async fn app_on(pool: &PgPool) -> Router {
    let sessions = api::session::postgres_session_store(pool.clone())
        .await
        .unwrap();
    let handle = PrometheusBuilder::new().build_recorder().handle();
    api::create_app(
        PostgresStore::new(pool.clone()),
        handle,
        sessions,
        &Config::default(),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, cookie, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let container = Postgres::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let pool = PgPool::connect(&format!("postgres://postgres:postgres@{host}:{port}/postgres"))
        .await
        .unwrap();

    let store = PostgresStore::new(pool.clone());
    store.run_migrations().await.unwrap();
    SampleData::new().seed_postgres(&store).await.unwrap();

    let first = app_on(&pool).await;
    let (status, cookie, _) = send(
        &first,
        Request::post("/cart/add")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "product_id": "SKU-003", "quantity": 3 }).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cookie = cookie.expect("session cookie");
    drop(first);

    // A fresh app on the same database stands in for a restarted server.
    let second = app_on(&pool).await;
    let (status, _, summary) = send(
        &second,
        Request::get("/cart/summary")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_items"], 3);
    assert_eq!(summary["total_amount"], "59.85");
}
