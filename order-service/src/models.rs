use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Order {
    pub id: i32,
    pub username: String,
    pub product_name: String,
    pub product_id: i32,
    pub order_date: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder {
    pub username: String,
    pub product_name: String,
    pub product_id: i32,
    pub order_date: String,
}

/// Public view of an order. Row id and product id stay internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub username: String,
    pub product_name: String,
    pub order_date: String,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        Self {
            username: order.username,
            product_name: order.product_name,
            order_date: order.order_date,
        }
    }
}
