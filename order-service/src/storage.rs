use diesel::prelude::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use shared::storage::{SqliteStore, StorageError};

use crate::models::{NewOrder, Order};
use crate::schema::orders;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Clone)]
pub struct OrderStore {
    db: SqliteStore,
}

impl OrderStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            db: SqliteStore::new(database_url),
        }
    }

    pub fn run_migrations(&self) -> Result<(), StorageError> {
        self.db.run_migrations(MIGRATIONS)
    }

    /// All orders in insertion order.
    pub async fn list(&self) -> Result<Vec<Order>, StorageError> {
        self.db
            .with_connection(|conn| {
                orders::table
                    .select(Order::as_select())
                    .order(orders::id.asc())
                    .load(conn)
            })
            .await
    }

    pub async fn insert(&self, order: NewOrder) -> Result<(), StorageError> {
        self.db
            .with_connection(move |conn| {
                diesel::insert_into(orders::table)
                    .values(&order)
                    .execute(conn)
            })
            .await?;
        Ok(())
    }
}
