//! # Lovebird Server
//!
//! Serves the login page, the self-test page and the status endpoint on `Axum`, backed
//! by a hosted identity service.
//!
//! ## Example
//! ```no_run
//! use lovebird_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(3000)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

mod router;
mod shutdown;

pub use router::{DOCS_PATH, build_router};

use anyhow::{Context, Result, bail};
use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use lovebird::AppState;
use lovebird::domain::config::{AppConfig, SslConfig};
use lovebird::kernel::health::check_health;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

/// Time allowed for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: AppConfig,
}

impl ServerBuilder {
    pub fn config(mut self, cfg: AppConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Consumes the builder and initializes the feature slices.
    ///
    /// Missing identity settings are logged, one warning each, and never fail the build.
    ///
    /// # Errors
    /// Returns an error if the configured TLS files are missing or a feature slice
    /// fails to initialize.
    pub fn build(self) -> Result<Server> {
        if let Some(ssl) = &self.cfg.server.ssl {
            check_tls_files(ssl)?;
        }

        for issue in check_health(&self.cfg.identity) {
            warn!(issue, "Identity configuration incomplete");
        }

        let state = lovebird::init(self.cfg).context("Platform bootstrap failed")?;
        info!(origin = %state.config.server.origin(), "Server initialized");
        Ok(Server { state })
    }
}

fn check_tls_files(ssl: &SslConfig) -> Result<()> {
    for (what, path) in [("certificate", &ssl.cert), ("key", &ssl.key)] {
        if !path.exists() {
            bail!("SSL {what} not found at: {}", path.display());
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = ssl.key.metadata()?.permissions().mode();
        if mode & 0o077 != 0 {
            warn!("SECURITY: SSL Private Key {} has insecure permissions (should be 600)", ssl.key.display());
        }
    }
    Ok(())
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Serve until Ctrl+C or SIGTERM, then drain for up to 30 seconds.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound or the TLS material cannot be loaded.
    pub async fn run(self) -> Result<()> {
        let server = &self.state.config.server;
        let address = SocketAddr::new(server.address, server.port);
        let ssl = server.ssl.clone();
        let app = build_router(self.state);

        let handle = Handle::<SocketAddr>::new();
        shutdown::watch(handle.clone(), SHUTDOWN_GRACE);

        match ssl {
            Some(ssl) => serve_tls(app, address, &ssl, handle).await?,
            None => serve_plain(app, address, handle).await?,
        }

        info!("Server shutdown complete");
        Ok(())
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }
}

async fn serve_plain(app: Router, address: SocketAddr, handle: Handle<SocketAddr>) -> Result<()> {
    info!("Starting HTTP server on http://{address}");
    axum_server::bind(address).handle(handle).serve(app.into_make_service()).await.context("HTTP server failed")
}

async fn serve_tls(app: Router, address: SocketAddr, ssl: &SslConfig, handle: Handle<SocketAddr>) -> Result<()> {
    let tls = RustlsConfig::from_pem_file(&ssl.cert, &ssl.key).await.context("Failed to load SSL/TLS certificates")?;

    info!("Starting HTTPS server on https://{address}");
    axum_server::bind_rustls(address, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("HTTPS server failed")
}
