//! API server

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::catalog::AppCatalog;
use crate::config::ApiConfig;
use crate::router::build_router;

/// API server
pub struct ApiServer {
    config: ApiConfig,
    catalog: Arc<dyn AppCatalog>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, catalog: Arc<dyn AppCatalog>) -> Self {
        Self { config, catalog }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind
    }

    /// Serve until `shutdown` resolves
    pub async fn run_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let addr = self.config.bind;
        let router = build_router(&self.config, self.catalog)?;

        info!(
            bind = %addr,
            registry = %self.config.registry_host,
            mint_path = %self.config.internal.mint_path,
            swagger = self.config.swagger_enabled,
            rate_limit = self.config.rate_limit.enabled,
            "Starting PullGate API server"
        );

        let listener = TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server shut down");
        Ok(())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;

    #[test]
    fn test_server_custom_bind() {
        let config = ApiConfig {
            bind: "127.0.0.1:9090".parse().unwrap(),
            ..Default::default()
        };
        let server = ApiServer::new(config, Arc::new(InMemoryCatalog::new()));
        assert_eq!(server.bind_addr(), "127.0.0.1:9090".parse().unwrap());
    }

    #[tokio::test]
    async fn test_run_refuses_unconfigured_secrets() {
        let config = ApiConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = ApiServer::new(config, Arc::new(InMemoryCatalog::new()));
        assert!(server.run().await.is_err());
    }
}
