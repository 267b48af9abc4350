pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod services;
pub mod store;
pub mod tracking;
