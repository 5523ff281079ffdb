pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod services;
pub mod state;

pub use error::ApiError;
