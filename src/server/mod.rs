pub mod api;

use crate::context::AppContext;
use axum_server::tls_rustls::RustlsConfig;
use log::{ error, info };
use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

pub struct Server {
    addr: SocketAddr,
    ctx: AppContext,
}

impl Server {
    pub fn new(ctx: AppContext) -> Self {
        Self { addr: ctx.config.listen_addr, ctx }
    }

    /// Serves HTTPS when both certificate files exist, plain HTTP otherwise.
    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let config = self.ctx.config.clone();
        let app = api::create_router(self.ctx);

        if config.tls_available() {
            info!(
                "Found certificate files; starting HTTPS on {} (cert '{}', key '{}')",
                self.addr,
                config.cert_path.display(),
                config.key_path.display()
            );
            // axum-server may pull in a second rustls provider; pin ring.
            let _ = rustls::crypto::ring::default_provider().install_default();
            let tls_config = RustlsConfig::from_pem_file(&config.cert_path, &config.key_path).await?;

            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
            });

            axum_server::bind_rustls(self.addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        } else {
            info!("Certificate files not found; starting HTTP on {}", self.addr);
            let listener = tokio::net::TcpListener::bind(self.addr).await.map_err(|e| {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", self.addr, e);
                e
            })?;
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
