use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::adapters::storage::LocalStorage;
use crate::api::{build_router, AppState};
use crate::config::AppSettings;
use crate::core::ingest::IngestionService;
use crate::utils::error::{AppError, Result};
use crate::utils::monitor::SystemMonitor;

/// A bound, not yet serving, API service.
pub struct ApiServer {
    listener: TcpListener,
    router: Router,
}

impl ApiServer {
    /// Binds the configured address; fails immediately if it is unavailable.
    pub async fn bind(settings: AppSettings, monitor: SystemMonitor) -> Result<Self> {
        let addr = settings.bind_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AppError::BindError {
                addr: addr.to_string(),
                source,
            })?;

        let max_upload_bytes = usize::try_from(settings.server.max_upload_bytes).unwrap_or(usize::MAX);
        let storage = LocalStorage::new(settings.storage.data_dir.clone());
        let service = IngestionService::new(storage, settings)?.with_monitor(monitor);
        let state = AppState {
            service: Arc::new(service),
        };

        Ok(Self {
            listener,
            router: build_router(state, max_upload_bytes),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves requests until `shutdown` resolves, then drains open connections.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!("🚀 API listening on http://{}", addr);
        }
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("👋 API stopped");
        Ok(())
    }
}
