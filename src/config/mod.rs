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

/// Top-level configuration for the application, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig::load()?,
            smtp: SmtpConfig::load()?,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which submission store to run against, selected explicitly via
/// `QNA_STORAGE` rather than inferred from whichever credentials happen to be
/// set. The backend-specific settings are only read for the chosen backend.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Memory,
    Postgres { database_url: String },
    Hosted { base_url: String, api_key: String },
}

impl StorageConfig {
    fn load() -> Result<Self, ConfigError> {
        let backend = env::var("QNA_STORAGE").unwrap_or_else(|_| "memory".to_string());

        match backend.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres {
                database_url: require("postgres", "DATABASE_URL")?,
            }),
            "hosted" => Ok(Self::Hosted {
                base_url: require("hosted", "HOSTED_STORAGE_URL")?,
                api_key: require("hosted", "HOSTED_STORAGE_KEY")?,
            }),
            other => Err(ConfigError::UnknownStorageBackend {
                value: other.to_string(),
            }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
            Self::Hosted { .. } => "hosted",
        }
    }
}

fn require(backend: &'static str, variable: &'static str) -> Result<String, ConfigError> {
    env::var(variable).map_err(|_| ConfigError::MissingStorageSetting { backend, variable })
}

/// Outbound SMTP settings for answer notifications. All four variables must be
/// present; a partial set leaves the notifier disabled rather than failing
/// startup, matching how the notification side effect is best-effort overall.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl SmtpConfig {
    fn load() -> Result<Option<Self>, ConfigError> {
        let host = env::var("SMTP_HOST").ok();
        let port = env::var("SMTP_PORT").ok();
        let username = env::var("SMTP_USERNAME").ok();
        let password = env::var("SMTP_PASSWORD").ok();

        match (host, port, username, password) {
            (Some(host), Some(port), Some(username), Some(password)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidSmtpPort)?;
                Ok(Some(Self {
                    host,
                    port,
                    username,
                    password,
                }))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSmtpPort,
    UnknownStorageBackend { value: String },
    MissingStorageSetting { backend: &'static str, variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSmtpPort => write!(f, "SMTP_PORT must be a valid u16"),
            ConfigError::UnknownStorageBackend { value } => {
                write!(
                    f,
                    "QNA_STORAGE must be one of memory, postgres, hosted (got '{value}')"
                )
            }
            ConfigError::MissingStorageSetting { backend, variable } => {
                write!(f, "{variable} is required when QNA_STORAGE={backend}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
