use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::http::router::Router;
use crate::server::pool::WorkerPool;
use crate::server::stats::ConnectionStats;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Owns the listening socket and hands each connection to the worker pool.
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    stats: Arc<ConnectionStats>,
    pool: WorkerPool,
    grace: Duration,
}

impl Server {
    pub async fn bind(
        cfg: &ServerConfig,
        router: Arc<Router>,
        stats: Arc<ConnectionStats>,
    ) -> anyhow::Result<Self> {
        let addr = cfg.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!(
            addr = %listener.local_addr()?,
            pool_size = cfg.pool_size,
            "Listening"
        );

        Ok(Self {
            listener,
            router,
            stats,
            pool: WorkerPool::new(cfg.pool_size),
            grace: Duration::from_secs(cfg.shutdown_grace_secs),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` resolves, then drains the pool.
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let Server {
            listener,
            router,
            stats,
            mut pool,
            grace,
        } = self;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }

                accepted = listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            back_off_after_accept_error(&e).await;
                            continue;
                        }
                    };

                    let guard = stats.accept();
                    let router = Arc::clone(&router);

                    pool.submit(async move {
                        let _guard = guard;
                        let mut conn = Connection::new(socket, peer, router);
                        if let Err(e) = conn.run().await {
                            tracing::error!(peer = %peer, error = %e, "Connection error");
                        }
                    });
                }
            }
        }

        drop(listener);

        let in_flight = pool.pending();
        if in_flight > 0 {
            info!(in_flight, grace_secs = grace.as_secs(), "Draining connection workers");
        }
        pool.drain(grace).await;
        info!("Server stopped");

        Ok(())
    }
}

/// Logs a failed accept and pauses before the next one. Errors such as
/// EMFILE repeat until a descriptor frees up.
async fn back_off_after_accept_error(error: &std::io::Error) {
    tracing::error!(error = %error, "Accept failed");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}
