//! # HTTP Server Module
//!
//! HTTP API over the form service, built on Axum.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/forms/*` - Form records of every registered type
//! - `/uploads/*` - Stored attachments

pub mod config;
pub mod form_routes;
pub mod health_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use form_routes::FormsState;
pub use server::HttpServer;
