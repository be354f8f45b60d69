#![allow(dead_code)]

use energy_forecast::utils::monitor::SystemMonitor;
use energy_forecast::{ApiServer, AppSettings};
use std::net::SocketAddr;
use std::path::Path;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const DAILY_CSV: &str = "timestamp,value\n\
    2024-01-01,10\n\
    2024-01-02,12.5\n\
    2024-01-03,11\n";

pub fn test_settings(data_dir: &Path) -> AppSettings {
    let mut settings = AppSettings::default();
    settings.server.host = "127.0.0.1".to_string();
    settings.server.port = 0;
    settings.storage.data_dir = data_dir.to_path_buf();
    settings
}

/// A running API service bound to an ephemeral port.
pub struct RunningServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl RunningServer {
    pub async fn start(settings: AppSettings) -> Self {
        let server = ApiServer::bind(settings, SystemMonitor::new(false))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .serve(async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });
        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn api_base(&self) -> String {
        self.url("/api/v1")
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}
