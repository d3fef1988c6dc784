use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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

/// Top-level configuration for the application, built once at startup and
/// handed to each component by reference.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub mail: Option<MailConfig>,
    pub branding: BrandingConfig,
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

        let storage = StorageConfig::from_env(environment)?;
        let mail = MailConfig::from_env(environment)?;
        let branding = BrandingConfig::from_env();

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage,
            mail,
            branding,
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

/// Connection settings for the durable entry store. The bundled store is
/// in-memory; the connection string is the surface the relational adapter
/// binds to and is mandatory in production.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_url: Option<String>,
}

impl StorageConfig {
    fn from_env(environment: AppEnvironment) -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        if database_url.is_none() && environment == AppEnvironment::Production {
            return Err(ConfigError::MissingVar("DATABASE_URL"));
        }
        Ok(Self { database_url })
    }
}

/// How the SMTP session is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTlsMode {
    /// Plain connection, no TLS. Development only.
    None,
    /// Plain connection upgraded via STARTTLS.
    StartTls,
    /// TLS from the first byte (SMTPS, typically port 465).
    Implicit,
}

impl MailTlsMode {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "starttls" => Ok(Self::StartTls),
            "implicit" | "ssl" => Ok(Self::Implicit),
            other => Err(ConfigError::InvalidTlsMode(other.to_string())),
        }
    }
}

/// Outbound mail settings. The whole block is optional outside production;
/// when absent the service logs notifications instead of sending them.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub tls: MailTlsMode,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub timeout: Duration,
}

impl MailConfig {
    fn from_env(environment: AppEnvironment) -> Result<Option<Self>, ConfigError> {
        let host = match env::var("MAIL_HOST").ok().filter(|v| !v.is_empty()) {
            Some(host) => host,
            None if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingVar("MAIL_HOST"));
            }
            None => return Ok(None),
        };

        let port = env::var("MAIL_PORT")
            .unwrap_or_else(|_| "465".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidMailPort)?;

        let tls = MailTlsMode::from_str(
            &env::var("MAIL_TLS").unwrap_or_else(|_| "implicit".to_string()),
        )?;

        let username =
            env::var("MAIL_USERNAME").map_err(|_| ConfigError::MissingVar("MAIL_USERNAME"))?;
        let password =
            env::var("MAIL_PASSWORD").map_err(|_| ConfigError::MissingVar("MAIL_PASSWORD"))?;
        let sender = env::var("MAIL_SENDER").map_err(|_| ConfigError::MissingVar("MAIL_SENDER"))?;

        let timeout_secs = env::var("MAIL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidMailTimeout)?;

        Ok(Some(Self {
            host,
            port,
            tls,
            username,
            password,
            sender,
            timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

/// Location of the certificate branding image (JPEG).
#[derive(Debug, Clone)]
pub struct BrandingConfig {
    pub asset_path: PathBuf,
}

impl BrandingConfig {
    fn from_env() -> Self {
        let asset_path =
            env::var("BRANDING_ASSET_PATH").unwrap_or_else(|_| "static/logo.jpg".to_string());
        Self {
            asset_path: PathBuf::from(asset_path),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMailPort,
    InvalidMailTimeout,
    InvalidTlsMode(String),
    MissingVar(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMailPort => write!(f, "MAIL_PORT must be a valid u16"),
            ConfigError::InvalidMailTimeout => {
                write!(f, "MAIL_TIMEOUT_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidTlsMode(value) => {
                write!(
                    f,
                    "MAIL_TLS must be one of none|starttls|implicit, got '{value}'"
                )
            }
            ConfigError::MissingVar(name) => write!(f, "required variable {name} is not set"),
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
