use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use shared::api::ApiError;
use shared::middleware::{trace_request, HttpMetrics};
use shared::{health, telemetry, MessageResponse, ProductRecord, ServiceIdentity};
use tracing::{error, field::Empty, info, instrument, Span};

use crate::error::OrderError;
use crate::handlers::OrderHandler;
use crate::models::OrderSummary;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<OrderHandler>,
}

#[derive(Debug, Deserialize)]
pub struct OrderProductRequest {
    pub username: String,
    pub product_id: i32,
}

pub fn create_router(state: AppState, identity: ServiceIdentity, metrics: HttpMetrics) -> Router {
    Router::new()
        .route("/list-orders", get(list_orders))
        .route("/list-products", get(list_products))
        .route("/order-product", post(order_product))
        .with_state(state)
        .merge(health::router(identity))
        .layer(axum::middleware::from_fn_with_state(metrics, trace_request))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

#[instrument(
    name = "list_orders_endpoint",
    skip_all,
    fields(orders_count = Empty, otel.status_code = Empty, otel.status_description = Empty)
)]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    match state.handler.list_orders().await {
        Ok(orders) => {
            Span::current().record("orders_count", orders.len());
            telemetry::mark_span_ok();
            Ok(Json(orders.into_iter().map(OrderSummary::from).collect()))
        }
        Err(e) => Err(fail(e, "Failed to fetch orders")),
    }
}

#[instrument(
    name = "list_products_endpoint",
    skip_all,
    fields(otel.status_code = Empty, otel.status_description = Empty)
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductRecord>>, ApiError> {
    match state.handler.list_products().await {
        Ok(products) => {
            telemetry::mark_span_ok();
            Ok(Json(products))
        }
        Err(e) => Err(fail(e, "Failed to fetch product list")),
    }
}

#[instrument(
    name = "order_product_endpoint",
    skip_all,
    fields(
        username = %request.username,
        product_id = request.product_id,
        otel.status_code = Empty,
        otel.status_description = Empty,
    )
)]
pub async fn order_product(
    State(state): State<AppState>,
    Query(request): Query<OrderProductRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    info!(
        username = %request.username,
        product_id = request.product_id,
        "Received order request"
    );

    match state
        .handler
        .order_product(&request.username, request.product_id)
        .await
    {
        Ok(()) => {
            telemetry::mark_span_ok();
            Ok(Json(MessageResponse::new("Order placed successfully")))
        }
        Err(e) => Err(fail(e, "Failed to place order")),
    }
}

fn fail(err: OrderError, detail: &str) -> ApiError {
    telemetry::mark_span_error(&err);
    if !err.is_rejection() {
        error!(error = %err, "{}", detail);
    }
    err.into_api_error(detail)
}
