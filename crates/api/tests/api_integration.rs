//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::post;
use api::config::Config;
use api::{AppState, create_router, with_layers};
use common::ProductId;
use domain::BuyerIdentity;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::{InMemoryStore, SampleData, User};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// Stands in for the authentication layer.
async fn test_sign_in(session: Session, axum::Json(buyer): axum::Json<BuyerIdentity>) -> StatusCode {
    api::session::sign_in(&session, &buyer).await.unwrap();
    StatusCode::NO_CONTENT
}

async fn setup() -> (Router, InMemoryStore, SampleData) {
    let store = InMemoryStore::new();
    let sample = SampleData::new();
    sample.seed_memory(&store).await;

    let state = Arc::new(AppState::new(store.clone()));
    let router = Router::new()
        .route("/test/sign-in", post(test_sign_in))
        .merge(create_router(state));
    let app = with_layers(
        router,
        get_metrics_handle(),
        MemoryStore::default(),
        &Config::default(),
    );
    (app, store, sample)
}

fn identity(user: &User) -> BuyerIdentity {
    BuyerIdentity {
        id: user.id,
        name: user.username.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
    }
}

/// A browser: remembers the session cookie between requests.
struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    fn new(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
        }
    }

    async fn send(&mut self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    async fn sign_in(&mut self, user: &User) {
        let (status, _) = self
            .post("/test/sign-in", serde_json::to_value(identity(user)).unwrap())
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}

fn shipping() -> Value {
    json!({ "name": "Bob", "email": "bob@example.com", "address": "77 Quay Street, Bristol" })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = setup().await;
    let (status, json) = Client::new(&app).get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn test_list_sorted_and_searched() {
        let (app, _, _) = setup().await;
        let mut client = Client::new(&app);

        let (status, json) = client.get("/products?sort=price_low&limit=2").await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Wireless Mouse", "Vintage Clock"]);

        let (_, json) = client.get("/products?search=keyboard").await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["price"], "89.99");
    }

    #[tokio::test]
    async fn test_featured_and_detail() {
        let (app, _, _) = setup().await;
        let mut client = Client::new(&app);

        let (_, json) = client.get("/products/featured").await;
        assert_eq!(json.as_array().unwrap().len(), 4);
        assert_eq!(json[0]["title"], "Mechanical Keyboard");

        let (status, json) = client.get("/products/SKU-002").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stock"], 2);

        let (status, json) = client.get("/products/NOPE").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("NOPE"));
    }

    #[tokio::test]
    async fn test_seller_profile() {
        let (app, _, sample) = setup().await;
        let mut client = Client::new(&app);

        let (status, json) = client
            .get(&format!("/sellers/{}", sample.seller.id))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["business_name"], "Tech Haven");
        assert_eq!(json["products"].as_array().unwrap().len(), 2);

        let (status, _) = client.get(&format!("/sellers/{}", sample.buyer.id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = client.get("/sellers/not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod cart {
    use super::*;

    #[tokio::test]
    async fn test_partial_add_then_out_of_stock() {
        let (app, _, _) = setup().await;
        let mut client = Client::new(&app);

        let (status, json) = client
            .post("/cart/add", json!({ "product_id": "SKU-002", "quantity": 5 }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
        assert_eq!(json["granted"], 2);
        assert_eq!(json["requested"], 5);
        assert_eq!(
            json["message"],
            "Only 2 items were added due to limited stock."
        );
        assert_eq!(json["total_items"], 2);
        assert_eq!(json["total_amount"], "599.98");

        let (status, json) = client
            .post("/cart/add", json!({ "product_id": "SKU-002", "quantity": 1 }))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["ok"], false);
        assert_eq!(json["total_items"], 2);

        let (_, json) = client.get("/cart/summary").await;
        assert_eq!(json["total_items"], 2);
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let (app, _, _) = setup().await;
        let mut client = Client::new(&app);

        let (status, _) = client
            .post("/cart/add", json!({ "product_id": "NOPE" }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_clamps_and_removes() {
        let (app, _, _) = setup().await;
        let mut client = Client::new(&app);

        client
            .post("/cart/add", json!({ "product_id": "SKU-001" }))
            .await;
        client
            .post("/cart/add", json!({ "product_id": "SKU-003" }))
            .await;

        let (status, json) = client
            .post(
                "/cart/update",
                json!({ "quantities": { "SKU-001": 50, "SKU-003": 0 } }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["cart"]["total_items"], 5);
        assert_eq!(json["cart"]["lines"].as_array().unwrap().len(), 1);
        assert_eq!(json["notices"][0]["kind"], "clamped");
        assert_eq!(
            json["notices"][0]["message"],
            "Quantity for product SKU-001 reduced to available stock (5)."
        );

        let (status, json) = client.post("/cart/remove/SKU-001", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_items"], 0);
    }

    #[tokio::test]
    async fn test_cart_view_lines() {
        let (app, _, _) = setup().await;
        let mut client = Client::new(&app);

        client
            .post("/cart/add", json!({ "product_id": "SKU-003", "quantity": 3 }))
            .await;

        let (status, json) = client.get("/cart").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["lines"][0]["line_total"], "59.85");
        assert_eq!(json["total_amount"], "59.85");
    }
}

mod checkout {
    use super::*;

    #[tokio::test]
    async fn test_preview_prefills_buyer() {
        let (app, _, sample) = setup().await;
        let mut client = Client::new(&app);

        let (status, _) = client.get("/checkout").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        client.sign_in(&sample.buyer).await;
        let (status, json) = client.get("/checkout").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Your cart is empty.");

        client
            .post("/cart/add", json!({ "product_id": "SKU-004", "quantity": 2 }))
            .await;
        let (status, json) = client.get("/checkout").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], sample.buyer.username.as_str());
        assert_eq!(json["email"], sample.buyer.email.as_str());
        assert_eq!(json["lines"][0]["title"], "Mechanical Keyboard");
        assert_eq!(json["total_amount"], "179.98");
    }

    #[tokio::test]
    async fn test_logout_keeps_cart() {
        let (app, _, sample) = setup().await;
        let mut client = Client::new(&app);
        client.sign_in(&sample.buyer).await;
        client
            .post("/cart/add", json!({ "product_id": "SKU-003", "quantity": 2 }))
            .await;

        let (status, _) = client.post("/logout", json!({})).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, summary) = client.get("/cart/summary").await;
        assert_eq!(summary["total_items"], 2);

        let (status, _) = client.post("/checkout", shipping()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, json) = client.get("/addresses").await;
        assert_eq!(json, json!([]));
    }

    #[tokio::test]
    async fn test_requires_sign_in() {
        let (app, _, _) = setup().await;
        let mut client = Client::new(&app);

        client
            .post("/cart/add", json!({ "product_id": "SKU-003" }))
            .await;
        let (status, _) = client.post("/checkout", shipping()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, json) = client.get("/cart/summary").await;
        assert_eq!(json["total_items"], 1);
    }

    #[tokio::test]
    async fn test_empty_cart_is_bad_request() {
        let (app, _, sample) = setup().await;
        let mut client = Client::new(&app);
        client.sign_in(&sample.buyer).await;

        let (status, json) = client.post("/checkout", shipping()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Your cart is empty.");
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let (app, _, sample) = setup().await;
        let mut client = Client::new(&app);
        client.sign_in(&sample.buyer).await;
        client
            .post("/cart/add", json!({ "product_id": "SKU-003" }))
            .await;

        let (status, _) = client
            .post(
                "/checkout",
                json!({ "name": "Bob", "email": " ", "address": "somewhere" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_confirmed_order_flow() {
        let (app, store, sample) = setup().await;
        let mut client = Client::new(&app);
        client.sign_in(&sample.buyer).await;

        client
            .post("/cart/add", json!({ "product_id": "SKU-001", "quantity": 2 }))
            .await;
        client
            .post("/cart/add", json!({ "product_id": "SKU-003", "quantity": 1 }))
            .await;

        let (status, json) = client.post("/checkout", shipping()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["total"], "119.93");
        let order_id = json["order_id"].as_str().unwrap().to_string();

        let (_, summary) = client.get("/cart/summary").await;
        assert_eq!(summary["total_items"], 0);
        assert_eq!(
            store.product_stock(&ProductId::new("SKU-001")).await,
            Some(Some(3))
        );

        let (status, order) = client.get(&format!("/orders/{order_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["items"].as_array().unwrap().len(), 2);
        assert_eq!(order["shipping_address"], "77 Quay Street, Bristol");

        // Another signed-in buyer cannot see it; an admin can.
        let mut stranger = Client::new(&app);
        stranger.sign_in(&sample.seller).await;
        let (status, _) = stranger.get(&format!("/orders/{order_id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut admin = Client::new(&app);
        admin.sign_in(&sample.admin).await;
        let (status, _) = admin.get(&format!("/orders/{order_id}")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = client.get(&format!("/orders/{order_id}")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stock_violation_is_conflict() {
        let (app, store, sample) = setup().await;
        let mut client = Client::new(&app);
        client.sign_in(&sample.buyer).await;

        client
            .post("/cart/add", json!({ "product_id": "SKU-002", "quantity": 2 }))
            .await;
        store.set_stock(&ProductId::new("SKU-002"), Some(1)).await;

        let (status, json) = client.post("/checkout", shipping()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            json["violations"][0]["message"],
            "product SKU-002 only has 1 left (wanted 2)"
        );
        assert_eq!(json["violations"][0]["available"], 1);
        assert_eq!(store.order_count().await, 0);

        let (_, summary) = client.get("/cart/summary").await;
        assert_eq!(summary["total_items"], 2);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_retryable() {
        let (app, store, sample) = setup().await;
        let mut client = Client::new(&app);
        client.sign_in(&sample.buyer).await;
        client
            .post("/cart/add", json!({ "product_id": "SKU-003" }))
            .await;

        store.set_fail_on_order_items(true);
        let (status, _) = client.post("/checkout", shipping()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        store.set_fail_on_order_items(false);
        let (status, _) = client.post("/checkout", shipping()).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_metrics_record_checkouts() {
        let (app, _, sample) = setup().await;
        let mut client = Client::new(&app);
        client.sign_in(&sample.buyer).await;
        client.post("/checkout", shipping()).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("checkout_attempts_total"));
    }
}

mod accounts {
    use super::*;

    #[tokio::test]
    async fn test_address_suggestions() {
        let (app, _, sample) = setup().await;
        let mut client = Client::new(&app);

        let (status, json) = client.get("/addresses?query=harbour").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!([]));

        client.sign_in(&sample.buyer).await;
        let (_, json) = client.get("/addresses").await;
        assert_eq!(json.as_array().unwrap().len(), 2);

        let (_, json) = client.get("/addresses?query=harbour").await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["label"], "Home");
        assert_eq!(json[0]["address"], "12 Harbour Road, Portsmouth");
    }

    #[tokio::test]
    async fn test_admin_requires_admin_flag() {
        let (app, _, sample) = setup().await;

        let mut anonymous = Client::new(&app);
        let (status, _) = anonymous.get("/admin").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut buyer = Client::new(&app);
        buyer.sign_in(&sample.buyer).await;
        let (status, _) = buyer.get("/admin/orders").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut admin = Client::new(&app);
        admin.sign_in(&sample.admin).await;
        let (status, json) = admin.get("/admin").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["products"], 4);
        assert_eq!(json["users"], 3);
        assert_eq!(json["orders"], 0);
    }

    #[tokio::test]
    async fn test_admin_sees_all_orders() {
        let (app, _, sample) = setup().await;

        let mut buyer = Client::new(&app);
        buyer.sign_in(&sample.buyer).await;
        buyer
            .post("/cart/add", json!({ "product_id": "SKU-004" }))
            .await;
        let (_, placed) = buyer.post("/checkout", shipping()).await;
        let order_id = placed["order_id"].as_str().unwrap().to_string();

        let mut admin = Client::new(&app);
        admin.sign_in(&sample.admin).await;
        let (_, orders) = admin.get("/admin/orders").await;
        assert_eq!(orders.as_array().unwrap().len(), 1);
        assert_eq!(orders[0]["id"], order_id.as_str());

        let (status, detail) = admin.get(&format!("/admin/orders/{order_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["items"][0]["title"], "Mechanical Keyboard");
    }
}
