use diesel::prelude::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use shared::storage::{SqliteStore, StorageError};

use crate::models::Product;
use crate::schema::products;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Clone)]
pub struct ProductStore {
    db: SqliteStore,
}

impl ProductStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            db: SqliteStore::new(database_url),
        }
    }

    /// Creates the `products` table if it does not exist yet.
    pub fn run_migrations(&self) -> Result<(), StorageError> {
        self.db.run_migrations(MIGRATIONS)
    }

    pub async fn list(&self) -> Result<Vec<Product>, StorageError> {
        self.db
            .with_connection(|conn| {
                products::table
                    .select(Product::as_select())
                    .order(products::id.asc())
                    .load(conn)
            })
            .await
    }

    pub async fn find(&self, product_id: i32) -> Result<Option<Product>, StorageError> {
        self.db
            .with_connection(move |conn| {
                products::table
                    .find(product_id)
                    .select(Product::as_select())
                    .first(conn)
                    .optional()
            })
            .await
    }

    /// Unconditionally decrements stock by one, returning the number of rows touched.
    ///
    /// Callers check availability with a separate read; the two are not atomic.
    pub async fn decrement_stock(&self, product_id: i32) -> Result<usize, StorageError> {
        self.db
            .with_connection(move |conn| {
                diesel::update(products::table.find(product_id))
                    .set(products::stock.eq(products::stock - 1))
                    .execute(conn)
            })
            .await
    }

    /// Inserts the product or replaces the row with the same id.
    pub async fn upsert(&self, product: Product) -> Result<(), StorageError> {
        self.db
            .with_connection(move |conn| {
                diesel::replace_into(products::table)
                    .values(&product)
                    .execute(conn)
            })
            .await?;
        Ok(())
    }
}
