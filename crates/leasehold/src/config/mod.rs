use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub identity: IdentityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("LEASEHOLD_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("LEASEHOLD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("LEASEHOLD_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("LEASEHOLD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let actor_header =
            env::var("LEASEHOLD_ACTOR_HEADER").unwrap_or_else(|_| "x-actor-id".to_string());
        if actor_header.trim().is_empty() {
            return Err(ConfigError::BlankActorHeader);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            identity: IdentityConfig { actor_header },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Request-identity settings used when attributing audit entries.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// HTTP header consulted for the acting operator's id.
    pub actor_header: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    BlankActorHeader,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "LEASEHOLD_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "LEASEHOLD_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::BlankActorHeader => {
                write!(f, "LEASEHOLD_ACTOR_HEADER must not be blank")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::BlankActorHeader => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
