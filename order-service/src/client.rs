use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use shared::{propagation, ProductRecord};
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to inventory service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inventory service responded with {0}")]
    Status(StatusCode),
}

/// The order service's view of the inventory service.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ClientError>;

    /// Asks inventory to take one unit of stock, without reporting the outcome.
    ///
    /// Best effort: callers cannot observe failure, so an order already
    /// persisted stays in place even when inventory never decrements. This is
    /// a known consistency gap between the two stores.
    async fn reduce_stock_best_effort(&self, product_id: i32);
}

/// HTTP adapter that forwards the current trace context on every call.
pub struct HttpInventoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpInventoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn traced_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        propagation::inject_current_context(&mut headers);
        headers
    }

    async fn reduce_stock(&self, product_id: i32) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/reduce-stock", self.base_url))
            .query(&[("product_id", product_id)])
            .headers(Self::traced_headers())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    #[instrument(name = "inventory.list_products", skip_all, fields(otel.kind = "client"))]
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ClientError> {
        let response = self
            .http
            .get(format!("{}/list-products", self.base_url))
            .headers(Self::traced_headers())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::Status(status));
        }
        Ok(response.json().await?)
    }

    #[instrument(
        name = "inventory.reduce_stock",
        skip(self),
        fields(otel.kind = "client")
    )]
    async fn reduce_stock_best_effort(&self, product_id: i32) {
        match self.reduce_stock(product_id).await {
            Ok(()) => info!("Inventory reduced stock for product_id={}", product_id),
            Err(e) => warn!(error = %e, "Stock reduction for product_id={} was not applied", product_id),
        }
    }
}
