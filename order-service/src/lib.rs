pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod storage;
