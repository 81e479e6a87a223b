//! # Node Configuration
//!
//! A TOML file with the gateway sections (`[http]`, `[admin]`, `[platform]`,
//! `[pagination]`, `[limits]`, `[timeouts]`, `[cors]`) plus `[bootstrap]`,
//! then `OCPI_*` environment overrides, then command line flags.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ocpi_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Listener, identity and limits.
    #[serde(flatten)]
    pub gateway: GatewayConfig,
    /// Work done once at startup.
    pub bootstrap: BootstrapConfig,
}

/// Startup actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Issue one token A and print it.
    pub issue_token_a: bool,
    /// Versions URL the bootstrap token A is bound to.
    pub expected_url: Option<String>,
    /// Partners to register with once the listeners are up.
    pub partners: Vec<PartnerBootstrap>,
}

/// A partner that handed us a token A out of band.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerBootstrap {
    pub versions_url: String,
    pub token_a: String,
}

impl std::fmt::Debug for PartnerBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartnerBootstrap")
            .field("versions_url", &self.versions_url)
            .field("token_a", &ocpi_types::redact(&self.token_a))
            .finish()
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum NodeConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    Env { key: String, reason: String },
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, NodeConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| NodeConfigError::Env {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl NodeConfig {
    /// Load from a TOML file. Missing sections take their defaults.
    pub fn load_file(path: &Path) -> Result<Self, NodeConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| NodeConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| NodeConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `OCPI_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), NodeConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `OCPI_HTTP_HOST` / `OCPI_HTTP_PORT` | `http.host` / `http.port` |
    /// | `OCPI_ADMIN_HOST` / `OCPI_ADMIN_PORT` | `admin.host` / `admin.port` |
    /// | `OCPI_ADMIN_ENABLED` | `admin.enabled` |
    /// | `OCPI_ADMIN_API_KEY` | `admin.api_key` |
    /// | `OCPI_PUBLIC_URL` | `platform.public_url` |
    /// | `OCPI_ISSUE_TOKEN_A` | `bootstrap.issue_token_a` |
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), NodeConfigError> {
        let gateway = &mut self.gateway;

        if let Some(v) = lookup("OCPI_HTTP_HOST") {
            gateway.http.host = parse_var("OCPI_HTTP_HOST", &v)?;
        }
        if let Some(v) = lookup("OCPI_HTTP_PORT") {
            gateway.http.port = parse_var("OCPI_HTTP_PORT", &v)?;
        }
        if let Some(v) = lookup("OCPI_ADMIN_HOST") {
            gateway.admin.host = parse_var("OCPI_ADMIN_HOST", &v)?;
        }
        if let Some(v) = lookup("OCPI_ADMIN_PORT") {
            gateway.admin.port = parse_var("OCPI_ADMIN_PORT", &v)?;
        }
        if let Some(v) = lookup("OCPI_ADMIN_ENABLED") {
            gateway.admin.enabled = parse_var("OCPI_ADMIN_ENABLED", &v)?;
        }
        if let Some(v) = lookup("OCPI_ADMIN_API_KEY") {
            gateway.admin.api_key = Some(v).filter(|key| !key.is_empty());
        }
        if let Some(v) = lookup("OCPI_PUBLIC_URL") {
            gateway.platform.public_url = v;
        }
        if let Some(v) = lookup("OCPI_ISSUE_TOKEN_A") {
            self.bootstrap.issue_token_a = parse_var("OCPI_ISSUE_TOKEN_A", &v)?;
        }
        Ok(())
    }
}
