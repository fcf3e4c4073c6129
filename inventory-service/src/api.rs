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

use crate::error::InventoryError;
use crate::handlers::InventoryHandler;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<InventoryHandler>,
}

#[derive(Debug, Deserialize)]
pub struct ReduceStockParams {
    pub product_id: i32,
}

pub fn create_router(state: AppState, identity: ServiceIdentity, metrics: HttpMetrics) -> Router {
    Router::new()
        .route("/list-products", get(list_products))
        .route("/reduce-stock", post(reduce_stock))
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
    name = "list_products_endpoint",
    skip_all,
    fields(products_count = Empty, otel.status_code = Empty, otel.status_description = Empty)
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductRecord>>, ApiError> {
    match state.handler.list_products().await {
        Ok(products) => {
            Span::current().record("products_count", products.len());
            telemetry::mark_span_ok();
            Ok(Json(products.into_iter().map(ProductRecord::from).collect()))
        }
        Err(e) => Err(fail(e)),
    }
}

#[instrument(
    name = "reduce_stock_endpoint",
    skip_all,
    fields(product_id = params.product_id, otel.status_code = Empty, otel.status_description = Empty)
)]
pub async fn reduce_stock(
    State(state): State<AppState>,
    Query(params): Query<ReduceStockParams>,
) -> Result<Json<MessageResponse>, ApiError> {
    info!(
        "Received request to reduce stock for product_id={}.",
        params.product_id
    );

    match state.handler.reduce_stock(params.product_id).await {
        Ok(()) => {
            telemetry::mark_span_ok();
            Ok(Json(MessageResponse::new("Stock reduced")))
        }
        Err(e) => Err(fail(e)),
    }
}

fn fail(err: InventoryError) -> ApiError {
    telemetry::mark_span_error(&err);
    if !err.is_rejection() {
        error!(error = %err, "Inventory request failed");
    }
    ApiError::from(err)
}
