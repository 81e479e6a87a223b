//! # OCPI Node
//!
//! Wires the credentials services to their adapters and runs the gateway.
//! The `ocpi-node` binary is a thin shell around [`OcpiNode`].
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file, then `OCPI_*` environment, then flags)
//! 2. Build registry, transport, token source and clock
//! 3. Issue the bootstrap token A, if configured
//! 4. Bind the OCPI and admin listeners
//! 5. Register with the configured partners
//!
//! Partners call back into step 4 while step 5 runs, so registration only
//! starts once both listeners are up.

pub mod config;

pub use config::{BootstrapConfig, NodeConfig, NodeConfigError, PartnerBootstrap};

use std::net::SocketAddr;
use std::sync::Arc;

use ocpi_credentials::adapters::{InMemoryPlatformRegistry, RandomTokenGenerator, ReqwestTransport};
use ocpi_credentials::{
    CredentialsClientApi, CredentialsClientService, CredentialsError, CredentialsServerApi,
    CredentialsServerService, LocalPlatform, PlatformRegistry, TokenGenerator, TransportClient,
    TransportError,
};
use ocpi_gateway::{GatewayError, OcpiGatewayService, RunningGateway};
use ocpi_types::{Clock, SystemClock};
use thiserror::Error;
use tracing::{info, warn};

/// Node startup errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Config(#[from] NodeConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("failed to build the HTTP transport: {0}")]
    Transport(#[from] TransportError),

    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] CredentialsError),
}

/// Outbound collaborators of the credentials services.
#[derive(Clone)]
pub struct NodeDeps {
    pub registry: Arc<dyn PlatformRegistry>,
    pub transport: Arc<dyn TransportClient>,
    pub tokens: Arc<dyn TokenGenerator>,
    pub clock: Arc<dyn Clock>,
}

/// A fully wired node that is not listening yet.
pub struct OcpiNode {
    gateway: OcpiGatewayService,
    server: Arc<dyn CredentialsServerApi>,
    client: Arc<dyn CredentialsClientApi>,
    bootstrap: BootstrapConfig,
    versions_url: String,
}

impl OcpiNode {
    /// Production wiring: in-memory registry, reqwest transport, OS random
    /// tokens and the system clock.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let timeouts = &config.gateway.timeouts;
        let transport = ReqwestTransport::new(timeouts.outbound, timeouts.connect)?;
        let deps = NodeDeps {
            registry: Arc::new(InMemoryPlatformRegistry::new()),
            transport: Arc::new(transport),
            tokens: Arc::new(RandomTokenGenerator),
            clock: Arc::new(SystemClock),
        };
        Self::with_deps(config, deps)
    }

    /// Wire the node over caller-supplied adapters.
    pub fn with_deps(config: NodeConfig, deps: NodeDeps) -> Result<Self, NodeError> {
        let platform = &config.gateway.platform;
        let local = LocalPlatform {
            versions_url: platform.versions_url(),
            version: platform.version.clone(),
            roles: platform.roles.clone(),
        };
        let versions_url = local.versions_url.clone();

        let server = Arc::new(CredentialsServerService::new(
            Arc::clone(&deps.registry),
            Arc::clone(&deps.transport),
            Arc::clone(&deps.tokens),
            Arc::clone(&deps.clock),
            local.clone(),
        ));
        let client = Arc::new(CredentialsClientService::new(
            deps.registry,
            deps.transport,
            deps.tokens,
            Arc::clone(&deps.clock),
            local,
        ));

        let gateway =
            OcpiGatewayService::new(config.gateway, server.clone(), client.clone(), deps.clock)?;

        Ok(Self {
            gateway,
            server,
            client,
            bootstrap: config.bootstrap,
            versions_url,
        })
    }

    pub fn gateway(&self) -> &OcpiGatewayService {
        &self.gateway
    }

    /// Run the startup sequence. Partner registrations that fail are
    /// reported in [`RunningNode::failed_partners`], not as an error.
    pub async fn start(self) -> Result<RunningNode, NodeError> {
        let Self {
            gateway,
            server,
            client,
            bootstrap,
            versions_url,
        } = self;

        let issued_token_a = if bootstrap.issue_token_a {
            Some(server.issue_token_a(bootstrap.expected_url.clone()).await?)
        } else {
            None
        };

        let running = gateway.start().await?;

        let mut registered = Vec::new();
        let mut failed = Vec::new();
        for partner in &bootstrap.partners {
            match client.register(&partner.versions_url, &partner.token_a).await {
                Ok(credentials) => {
                    info!(
                        platform_url = %partner.versions_url,
                        roles = credentials.roles.len(),
                        "bootstrap registration completed"
                    );
                    registered.push(partner.versions_url.clone());
                }
                Err(e) => {
                    warn!(platform_url = %partner.versions_url, error = %e, "bootstrap registration failed");
                    failed.push((partner.versions_url.clone(), e));
                }
            }
        }

        Ok(RunningNode {
            gateway: running,
            issued_token_a,
            versions_url,
            registered,
            failed,
        })
    }
}

/// Handle to a started node.
pub struct RunningNode {
    gateway: RunningGateway,
    issued_token_a: Option<String>,
    versions_url: String,
    registered: Vec<String>,
    failed: Vec<(String, CredentialsError)>,
}

impl RunningNode {
    pub fn http_addr(&self) -> SocketAddr {
        self.gateway.http_addr()
    }

    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.gateway.admin_addr()
    }

    /// Token A issued at startup, to be handed to a partner out of band.
    pub fn issued_token_a(&self) -> Option<&str> {
        self.issued_token_a.as_deref()
    }

    /// Our public versions URL.
    pub fn versions_url(&self) -> &str {
        &self.versions_url
    }

    /// Partners registered during bootstrap.
    pub fn registered_partners(&self) -> &[String] {
        &self.registered
    }

    /// Partners whose bootstrap registration failed, with the reason.
    pub fn failed_partners(&self) -> &[(String, CredentialsError)] {
        &self.failed
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) {
        self.gateway.shutdown();
    }

    /// Wait for the listeners to stop.
    pub async fn wait(self) -> Result<(), NodeError> {
        Ok(self.gateway.wait().await?)
    }
}
