//! Gateway lifecycle: validate configuration, bind both listeners, serve
//! until shut down.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::middleware::GatewayMetrics;
use crate::router::{build_admin_router, build_ocpi_router, AppState};
use axum::Router;
use ocpi_credentials::{CredentialsClientApi, CredentialsServerApi};
use ocpi_types::Clock;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A configured, not yet listening gateway.
pub struct OcpiGatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl OcpiGatewayService {
    /// Create a new gateway over the two credentials roles.
    pub fn new(
        config: GatewayConfig,
        server: Arc<dyn CredentialsServerApi>,
        client: Arc<dyn CredentialsClientApi>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;
        let state = AppState::new(server, client, clock, &config);
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.state.metrics)
    }

    /// Partner-facing router, for serving on a custom listener or in tests.
    pub fn ocpi_router(&self) -> Router {
        build_ocpi_router(self.state.clone(), &self.config)
    }

    /// Operator router.
    pub fn admin_router(&self) -> Router {
        build_admin_router(self.state.clone(), &self.config)
    }

    /// Bind the listeners and start serving in the background.
    pub async fn start(self) -> Result<RunningGateway, GatewayError> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        let (http_addr, task) = serve(
            "ocpi",
            self.config.http_addr(),
            self.ocpi_router(),
            shutdown_rx.clone(),
        )
        .await?;
        tasks.push(task);

        let admin_addr = if self.config.admin.enabled {
            let (addr, task) = serve(
                "admin",
                self.config.admin_addr(),
                self.admin_router(),
                shutdown_rx,
            )
            .await?;
            tasks.push(task);
            Some(addr)
        } else {
            None
        };

        info!(
            public_url = %self.config.platform.public_url,
            version = %self.config.platform.version,
            "OCPI gateway started"
        );
        Ok(RunningGateway {
            http_addr,
            admin_addr,
            shutdown_tx,
            tasks,
        })
    }
}

async fn serve(
    name: &'static str,
    addr: SocketAddr,
    router: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(SocketAddr, JoinHandle<Result<(), GatewayError>>), GatewayError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind { addr, source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| GatewayError::Bind { addr, source })?;
    info!(listener = name, addr = %local_addr, "listening");

    let task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                // A dropped sender also ends the wait.
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            })
            .await
            .map_err(|e| {
                error!(listener = name, error = %e, "server error");
                GatewayError::Serve(e)
            })
    });
    Ok((local_addr, task))
}

/// Handle to a serving gateway.
pub struct RunningGateway {
    http_addr: SocketAddr,
    admin_addr: Option<SocketAddr>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<Result<(), GatewayError>>>,
}

impl RunningGateway {
    /// Bound address of the OCPI listener.
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Bound address of the admin listener, when enabled.
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for every listener to stop. The first listener error is returned.
    pub async fn wait(self) -> Result<(), GatewayError> {
        let mut first_error = None;
        for task in self.tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(join) => {
                    error!(error = %join, "listener task failed");
                    first_error.get_or_insert(GatewayError::Serve(std::io::Error::other(
                        join.to_string(),
                    )));
                }
            }
        }
        info!("OCPI gateway stopped");
        first_error.map_or(Ok(()), Err)
    }
}
