//! # HTTP Server
//!
//! Main HTTP server combining the health, forms and upload routers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::config::HttpServerConfig;
use super::form_routes::{form_routes, FormsState};
use super::health_routes::health_routes;
use crate::uploads::UPLOADS_ROUTE;

/// Room for the non-file parts of a multipart submission.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// HTTP Server for the forms API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server around shared form state. The request body limit
    /// follows the upload size limit.
    pub fn new(config: HttpServerConfig, state: Arc<FormsState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, state: Arc<FormsState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let uploads = state.service.uploads();
        let upload_root = uploads.backend().root().to_path_buf();
        let body_limit = usize::try_from(uploads.max_bytes())
            .unwrap_or(usize::MAX)
            .saturating_add(BODY_LIMIT_SLACK);

        Router::new()
            .merge(health_routes())
            .nest("/forms", form_routes(state))
            // Stored attachments are served read-only
            .nest_service(UPLOADS_ROUTE, ServeDir::new(upload_root))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "shipforms HTTP server listening");
        tracing::info!("forms API at http://{}/forms, uploads at {}", addr, UPLOADS_ROUTE);

        axum::serve(listener, self.router).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormService;
    use crate::storage::MemoryStore;
    use crate::uploads::{LocalBackend, UploadService};
    use tempfile::TempDir;

    fn state(dir: &TempDir, max_upload_bytes: u64) -> Arc<FormsState> {
        let uploads =
            UploadService::new(LocalBackend::new(dir.path().to_path_buf()), max_upload_bytes)
                .unwrap();
        let service = FormService::new(Arc::new(MemoryStore::new()), uploads);
        Arc::new(FormsState::new(service))
    }

    #[test]
    fn test_server_creation() {
        let dir = TempDir::new().unwrap();
        let server = HttpServer::new(HttpServerConfig::default(), state(&dir, 1024));
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_server_with_custom_port() {
        let dir = TempDir::new().unwrap();
        let server = HttpServer::new(HttpServerConfig::with_port(9090), state(&dir, 1024));
        assert_eq!(server.socket_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn test_router_builds_with_open_cors() {
        let dir = TempDir::new().unwrap();
        let config = HttpServerConfig {
            cors_origins: Vec::new(),
            ..Default::default()
        };
        let _router = HttpServer::new(config, state(&dir, u64::MAX)).router();
    }
}
