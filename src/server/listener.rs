use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionSettings};
use crate::router::Router;
use crate::store::EntityStore;

const LISTEN_BACKLOG: u32 = 1024;

/// Pause after a failed accept (e.g. out of file descriptors) before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound listener plus everything a connection needs.
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    settings: ConnectionSettings,
    limiter: Arc<Semaphore>,
}

impl Server {
    /// Opens the entity store, builds the routing table and binds the
    /// configured address.
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let store = EntityStore::open(&cfg.data_path)
            .await
            .with_context(|| format!("cannot open data directory {}", cfg.data_path.display()))?;
        let router = Router::from_config(cfg, Arc::new(store));

        let settings = ConnectionSettings {
            idle_timeout: cfg.idle_timeout(),
            request_timeout: cfg.request_timeout(),
        };

        let addr = tokio::net::lookup_host(cfg.listen_addr())
            .await
            .with_context(|| format!("cannot resolve {}", cfg.listen_addr()))?
            .next()
            .with_context(|| format!("no address for {}", cfg.listen_addr()))?;

        let listener = listen(addr).with_context(|| format!("cannot bind {addr}"))?;
        let local = listener.local_addr()?;
        info!(addr = %local, "Listening on port {}", local.port());

        Ok(Self {
            listener,
            router: Arc::new(router),
            settings,
            limiter: Arc::new(Semaphore::new(cfg.max_connections)),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `shutdown` resolves. The listening socket
    /// is closed on return; connections already accepted keep running on
    /// the runtime.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            res = self.run() => res,
            _ = shutdown => {
                info!("Shutdown signal received");
                Ok(())
            }
        }
    }

    /// Accepts connections forever, one task each. When `max_connections`
    /// are open, further clients wait in the listen backlog.
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            let permit = Arc::clone(&self.limiter).acquire_owned().await?;

            let (socket, peer) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            let _ = socket.set_nodelay(true);

            let router = Arc::clone(&self.router);
            let settings = self.settings;

            tokio::spawn(async move {
                let _permit = permit;
                let mut conn = Connection::new(socket, peer, router, settings);
                if let Err(e) = conn.run().await {
                    warn!(%peer, error = %e, "Connection error");
                }
            });
        }
    }
}

fn listen(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let sock = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };

    sock.set_reuseaddr(true)?;
    sock.bind(addr)?;
    sock.listen(LISTEN_BACKLOG)
}

/// Binds per `cfg` and serves until SIGINT/SIGTERM.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    Server::bind(cfg)
        .await?
        .run_until(super::shutdown_signal())
        .await
}
