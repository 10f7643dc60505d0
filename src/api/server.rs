//! HTTP server lifecycle.
//!
//! Binds the configured address, mounts `api_router()`, and runs
//! axum in a background tokio task. The returned handle carries the
//! bound address and a shutdown channel; `main` wires the channel to
//! Ctrl-C.
//!
//! `into_make_service_with_connect_info` is required so the rate-limit
//! middleware can read the peer `SocketAddr`.

use std::io;
use std::net::SocketAddr;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Signal the server to stop accepting connections and drain.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

/// Bind `bind_addr` and spawn the server in a background task.
pub async fn start(ctx: ApiContext, bind_addr: SocketAddr) -> io::Result<ApiServer> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let app = api_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AppConfig;
    use crate::db::open_database;
    use crate::llm::ollama::MockLlm;

    async fn test_server() -> (ApiServer, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            db_path: tmp.path().join("test.db"),
            ollama_url: "http://localhost:11434".into(),
            ollama_model: "llama3:8b".into(),
            ollama_timeout_secs: 5,
        };
        open_database(&config.db_path).unwrap();
        let ctx = ApiContext::new(&config, Arc::new(MockLlm::replying("ok")));
        let server = start(ctx, config.bind_addr).await.expect("server should start");
        (server, tmp)
    }

    #[tokio::test]
    async fn serves_health_without_auth() {
        let (mut server, _tmp) = test_server().await;

        let url = format!("http://{}/api/health", server.addr);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        server.shutdown();
    }

    #[tokio::test]
    async fn unknown_route_is_404_and_protected_route_is_401() {
        let (mut server, _tmp) = test_server().await;

        let resp = reqwest::get(format!("http://{}/nonexistent", server.addr))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let resp = reqwest::get(format!("http://{}/api/doctors", server.addr))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        server.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_and_drains() {
        let (mut server, _tmp) = test_server().await;

        server.shutdown();
        server.shutdown();
        server.wait().await;
    }
}
