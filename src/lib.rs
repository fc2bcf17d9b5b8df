pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod fare;
pub mod geocode;
pub mod handlers;
pub mod models;
pub mod routes;

pub use routes::{configure, AppState};
