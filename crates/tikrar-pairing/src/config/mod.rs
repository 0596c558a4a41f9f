use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_TIMEZONE: &str = "WIB";
const DEFAULT_HALAQAH_SEATS: u32 = 20;

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
    pub pairing: PairingConfig,
    pub halaqah: HalaqahConfig,
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

        let shuffle_seed = match env::var("APP_PAIRING_SEED") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSeed)?,
            ),
            _ => None,
        };
        let default_timezone = env::var("APP_DEFAULT_TIMEZONE")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        let default_max_seats = match env::var("APP_HALAQAH_DEFAULT_SEATS") {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(seats) if seats > 0 => seats,
                _ => return Err(ConfigError::InvalidSeatCount),
            },
            Err(_) => DEFAULT_HALAQAH_SEATS,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            pairing: PairingConfig {
                shuffle_seed,
                default_timezone,
            },
            halaqah: HalaqahConfig { default_max_seats },
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

/// Knobs for the allocator and profile loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingConfig {
    /// Fixed seed for the per-tier shuffle. `None` draws from OS entropy on every run.
    pub shuffle_seed: Option<u64>,
    /// Zone assumed when neither the registration nor the account carries one.
    pub default_timezone: String,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            shuffle_seed: None,
            default_timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalaqahConfig {
    /// Seat limit applied to groups without a configured maximum.
    pub default_max_seats: u32,
}

impl Default for HalaqahConfig {
    fn default() -> Self {
        Self {
            default_max_seats: DEFAULT_HALAQAH_SEATS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSeed,
    InvalidSeatCount,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSeed => write!(f, "APP_PAIRING_SEED must be a valid u64"),
            ConfigError::InvalidSeatCount => {
                write!(f, "APP_HALAQAH_DEFAULT_SEATS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort | ConfigError::InvalidSeed | ConfigError::InvalidSeatCount => {
                None
            }
        }
    }
}
