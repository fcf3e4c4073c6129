pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod storage;
