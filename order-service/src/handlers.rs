use std::sync::Arc;

use shared::ProductRecord;
use tracing::{info, warn};

use crate::client::InventoryClient;
use crate::error::OrderError;
use crate::models::{NewOrder, Order};
use crate::storage::OrderStore;

pub struct OrderHandler {
    store: OrderStore,
    inventory: Arc<dyn InventoryClient>,
}

impl OrderHandler {
    pub fn new(store: OrderStore, inventory: Arc<dyn InventoryClient>) -> Self {
        Self { store, inventory }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        info!("Fetching all orders from the database.");
        let orders = self.store.list().await?;
        info!("Fetched {} orders.", orders.len());
        Ok(orders)
    }

    pub async fn list_products(&self) -> Result<Vec<ProductRecord>, OrderError> {
        info!("Fetching product list from inventory service.");
        let products = self.inventory.list_products().await?;
        info!("Successfully fetched product list.");
        Ok(products)
    }

    /// Places an order for one unit of `product_id`.
    ///
    /// Checks availability against a fresh inventory listing, records the
    /// order with the product name as it is right now, then asks inventory to
    /// decrement stock. The last step is best effort: the order stands even if
    /// the decrement never happens, and nothing is rolled back.
    pub async fn order_product(&self, username: &str, product_id: i32) -> Result<(), OrderError> {
        let products = self.inventory.list_products().await?;

        let product = match products.into_iter().find(|p| p.id == product_id) {
            Some(product) if product.stock > 0 => product,
            _ => {
                warn!("Product with id={} is unavailable.", product_id);
                return Err(OrderError::Unavailable);
            }
        };

        self.store
            .insert(NewOrder {
                username: username.to_string(),
                product_name: product.name,
                product_id,
                order_date: order_timestamp(),
            })
            .await?;
        info!(
            "Order placed successfully for product_id={} by username={}.",
            product_id, username
        );

        self.inventory.reduce_stock_best_effort(product_id).await;
        Ok(())
    }
}

/// Local wall-clock time in ISO-8601 with microseconds, e.g. `2024-05-01T12:00:00.123456`.
fn order_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
