use tracing::{info, warn};

use crate::error::InventoryError;
use crate::models::Product;
use crate::storage::ProductStore;

pub struct InventoryHandler {
    store: ProductStore,
}

impl InventoryHandler {
    pub fn new(store: ProductStore) -> Self {
        Self { store }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, InventoryError> {
        info!("Fetching all products from the database.");
        let products = self.store.list().await?;
        info!("Fetched {} products from the database.", products.len());
        Ok(products)
    }

    /// Takes one unit of stock for `product_id`.
    ///
    /// The availability check and the decrement run on separate connections
    /// without a lock, so concurrent calls for the last unit can both succeed
    /// and drive stock below zero.
    pub async fn reduce_stock(&self, product_id: i32) -> Result<(), InventoryError> {
        let product = match self.store.find(product_id).await? {
            Some(product) => product,
            None => {
                warn!("Product with id={} does not exist.", product_id);
                return Err(InventoryError::NotFound);
            }
        };

        if product.stock <= 0 {
            warn!("Product with id={} is out of stock.", product_id);
            return Err(InventoryError::Unavailable);
        }

        self.store.decrement_stock(product_id).await?;
        info!("Stock successfully reduced for product_id={}.", product_id);
        Ok(())
    }
}
