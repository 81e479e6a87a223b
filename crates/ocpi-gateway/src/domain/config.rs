//! Gateway configuration with validation.

use ocpi_types::{
    BusinessDetails, CredentialRole, Credentials, Endpoint, Role, OCPI_VERSION,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Partner-facing OCPI listener
    pub http: HttpConfig,
    /// Operator listener (localhost only by default)
    pub admin: AdminConfig,
    /// Our identity as advertised to partners
    pub platform: PlatformConfig,
    /// List endpoint paging
    pub pagination: PaginationConfig,
    /// Request validation limits
    pub limits: LimitsConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.enabled && self.http.port == self.admin.port && self.http.port != 0 {
            return Err(ConfigError::DuplicatePorts);
        }

        self.platform.validate()?;

        if self.pagination.default_limit == 0 {
            return Err(ConfigError::InvalidLimit(
                "pagination.default_limit cannot be 0".into(),
            ));
        }
        if self.pagination.max_limit < self.pagination.default_limit {
            return Err(ConfigError::InvalidLimit(
                "pagination.max_limit must be at least default_limit".into(),
            ));
        }

        if self.limits.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "limits.max_body_size cannot be 0".into(),
            ));
        }

        if self.timeouts.request.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout cannot be 0".into(),
            ));
        }
        if self.timeouts.outbound.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "outbound timeout cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get OCPI server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Get Admin server bind address
    pub fn admin_addr(&self) -> SocketAddr {
        SocketAddr::new(self.admin.host, self.admin.port)
    }
}

/// Partner-facing listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
        }
    }
}

/// Admin server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bind address (localhost only by default)
    pub host: IpAddr,
    /// Port (default: 8081)
    pub port: u16,
    /// Enable admin server
    pub enabled: bool,
    /// Required API key (None = no key required)
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8081,
            enabled: true,
            api_key: None,
        }
    }
}

/// Our own platform identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Externally reachable base URL, without the `/ocpi` prefix.
    pub public_url: String,
    /// Protocol version served under `/ocpi/<version>`.
    pub version: String,
    /// Roles this platform hosts.
    pub roles: Vec<CredentialRole>,
    /// Module endpoints served elsewhere and advertised next to `credentials`.
    pub extra_endpoints: Vec<Endpoint>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            public_url: "http://127.0.0.1:8080".to_string(),
            version: OCPI_VERSION.to_string(),
            roles: vec![CredentialRole {
                role: Role::Cpo,
                business_details: Some(BusinessDetails::named("Example Operator")),
                party_id: "EXA".to_string(),
                country_code: "NL".to_string(),
            }],
            extra_endpoints: Vec::new(),
        }
    }
}

impl PlatformConfig {
    fn base(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }

    /// Public URL of `GET /ocpi/versions`.
    pub fn versions_url(&self) -> String {
        format!("{}/ocpi/versions", self.base())
    }

    /// Public URL of the version details document.
    pub fn version_url(&self) -> String {
        format!("{}/ocpi/{}", self.base(), self.version)
    }

    /// Public URL of our credentials module.
    pub fn credentials_url(&self) -> String {
        format!("{}/credentials", self.version_url())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.public_url)
            .map_err(|e| ConfigError::Invalid(format!("platform.public_url: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "platform.public_url must be http or https".into(),
            ));
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::Invalid("platform.version cannot be empty".into()));
        }

        // Our advertised credentials must pass the same checks a partner applies.
        let advertised = Credentials {
            token: "config-check".to_string(),
            url: self.versions_url(),
            roles: self.roles.clone(),
        };
        advertised
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("platform.{e}")))
    }
}

/// Paging of list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size when the request carries no `limit`
    pub default_limit: usize,
    /// Upper bound applied to any requested `limit`
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 1000,
        }
    }
}

/// Request limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 64KB)
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound for handling one inbound request, including the
    /// partner round trips a registration makes
    #[serde(with = "duration_serde")]
    pub request: Duration,
    /// Timeout of each outbound call to a partner
    #[serde(with = "duration_serde")]
    pub outbound: Duration,
    /// Connect timeout of outbound calls
    #[serde(with = "duration_serde")]
    pub connect: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            outbound: Duration::from_secs(10),
            connect: Duration::from_secs(5),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Expose headers
    pub expose_headers: Vec<String>,
    /// Max age for preflight cache
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            expose_headers: [
                "Link",
                "X-Total-Count",
                "X-Limit",
                "X-Request-ID",
                "X-Correlation-ID",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            max_age: 86400,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// OCPI and admin listeners on the same port
    #[error("duplicate ports configured")]
    DuplicatePorts,
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Durations written as `"30s"`, `"500ms"`, `"2m"` or plain seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
