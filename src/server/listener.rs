use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionSettings};
use crate::router::Router;

/// Bound listening socket plus the limit on concurrent connections.
pub struct Listener {
    inner: TcpListener,
    permits: Arc<Semaphore>,
    settings: ConnectionSettings,
}

impl Listener {
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let inner = TcpListener::bind(&cfg.server.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", cfg.server.listen_addr))?;

        Ok(Self {
            inner,
            permits: Arc::new(Semaphore::new(cfg.server.max_connections)),
            settings: ConnectionSettings::from(&cfg.server),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }

    /// Accepts connections forever, one task each.
    ///
    /// A connection permit is taken before `accept`, so once the limit is
    /// reached new clients wait in the kernel backlog.
    pub async fn serve(self, router: Arc<Router>) -> anyhow::Result<()> {
        info!("Listening on {}", self.local_addr()?);

        loop {
            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .context("Connection limiter closed")?;

            let (socket, peer) = match self.inner.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            };
            info!("Accepted connection from {}", peer);

            let router = Arc::clone(&router);
            let settings = self.settings;
            let span = info_span!("conn", %peer);

            tokio::spawn(
                async move {
                    let mut conn = Connection::with_settings(socket, router, settings);
                    if let Err(e) = conn.run().await {
                        error!("Connection error from {}: {}", peer, e);
                    }
                    drop(permit);
                }
                .instrument(span),
            );
        }
    }
}

pub async fn run(cfg: &Config, router: Arc<Router>) -> anyhow::Result<()> {
    Listener::bind(cfg).await?.serve(router).await
}
