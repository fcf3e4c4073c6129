use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use order_service::api::{create_router, AppState};
use order_service::client::{ClientError, InventoryClient};
use order_service::handlers::OrderHandler;
use order_service::models::NewOrder;
use order_service::storage::OrderStore;
use serde_json::{json, Value};
use shared::middleware::HttpMetrics;
use shared::{ProductRecord, ServiceIdentity};
use tempfile::TempDir;
use tower::ServiceExt;

struct StubInventory {
    products: Option<Vec<ProductRecord>>,
    reductions: Mutex<Vec<i32>>,
}

#[async_trait]
impl InventoryClient for StubInventory {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ClientError> {
        self.products
            .clone()
            .ok_or(ClientError::Status(StatusCode::SERVICE_UNAVAILABLE))
    }

    async fn reduce_stock_best_effort(&self, product_id: i32) {
        self.reductions.lock().unwrap().push(product_id);
    }
}

struct TestApp {
    _dir: TempDir,
    store: OrderStore,
    inventory: Arc<StubInventory>,
    router: Router,
}

fn app(products: Option<Vec<ProductRecord>>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store = OrderStore::new(dir.path().join("orders.db").to_string_lossy());
    store.run_migrations().unwrap();
    let inventory = Arc::new(StubInventory {
        products,
        reductions: Mutex::new(Vec::new()),
    });

    let router = create_router(
        AppState {
            handler: Arc::new(OrderHandler::new(store.clone(), inventory.clone())),
        },
        ServiceIdentity {
            service_name: "order-service".to_string(),
            environment: "test".to_string(),
        },
        HttpMetrics::global(),
    );

    TestApp {
        _dir: dir,
        store,
        inventory,
        router,
    }
}

fn widget(stock: i32) -> Vec<ProductRecord> {
    vec![ProductRecord {
        id: 1,
        name: "Widget".to_string(),
        stock,
    }]
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn order(username: &str, product_id: i32) -> Request<Body> {
    Request::post(format!(
        "/order-product?username={username}&product_id={product_id}"
    ))
    .body(Body::empty())
    .unwrap()
}

#[tokio::test]
async fn health_reports_service() {
    let app = app(Some(Vec::new()));

    let (status, body) = send(&app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "ok", "environment": "test", "service_name": "order-service"})
    );
}

#[tokio::test]
async fn list_orders_exposes_only_public_fields_in_insertion_order() {
    let app = app(Some(Vec::new()));
    for (username, product_name) in [("bob", "Widget"), ("alice", "Gadget")] {
        app.store
            .insert(NewOrder {
                username: username.to_string(),
                product_name: product_name.to_string(),
                product_id: 1,
                order_date: "2024-05-01T12:00:00.000000".to_string(),
            })
            .await
            .unwrap();
    }

    let (status, body) = send(&app.router, get("/list-orders")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"username": "bob", "product_name": "Widget", "order_date": "2024-05-01T12:00:00.000000"},
            {"username": "alice", "product_name": "Gadget", "order_date": "2024-05-01T12:00:00.000000"},
        ])
    );
}

#[tokio::test]
async fn list_orders_storage_failure_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    // Never migrated, so the orders table is missing.
    let store = OrderStore::new(dir.path().join("orders.db").to_string_lossy());
    let inventory = Arc::new(StubInventory {
        products: Some(Vec::new()),
        reductions: Mutex::new(Vec::new()),
    });
    let router = create_router(
        AppState {
            handler: Arc::new(OrderHandler::new(store, inventory)),
        },
        ServiceIdentity {
            service_name: "order-service".to_string(),
            environment: "test".to_string(),
        },
        HttpMetrics::global(),
    );

    let (status, body) = send(&router, get("/list-orders")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Failed to fetch orders"}));
}

#[tokio::test]
async fn list_products_proxies_inventory() {
    let app = app(Some(widget(4)));

    let (status, body) = send(&app.router, get("/list-products")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": 1, "name": "Widget", "stock": 4}]));
}

#[tokio::test]
async fn list_products_upstream_failure_is_internal_error() {
    let app = app(None);

    let (status, body) = send(&app.router, get("/list-products")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Failed to fetch product list"}));
}

#[tokio::test]
async fn order_product_places_order() {
    let app = app(Some(widget(1)));

    let (status, body) = send(&app.router, order("alice", 1)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Order placed successfully"}));
    assert_eq!(app.store.list().await.unwrap().len(), 1);
    assert_eq!(*app.inventory.reductions.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn order_product_of_exhausted_product_is_bad_request() {
    let app = app(Some(widget(0)));

    let (status, body) = send(&app.router, order("alice", 1)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"detail": "Product unavailable"}));
    assert!(app.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn order_product_upstream_failure_is_internal_error() {
    let app = app(None);

    let (status, body) = send(&app.router, order("alice", 1)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Failed to place order"}));
    assert!(app.store.list().await.unwrap().is_empty());
}
