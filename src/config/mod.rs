use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::payments::WalletShortfallPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// Minutes an unpaid hold reserves the unit before the reaper may
    /// release it.
    pub hold_minutes: i64,
    /// Hour of day (local) the cancellation tiers count down to.
    pub checkin_hour: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            hold_minutes: 20,
            checkin_hour: 14,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PaymentsConfig {
    #[serde(default)]
    pub wallet_shortfall: WalletShortfallPolicy,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("booking.hold_minutes", 20)?
            .set_default("booking.checkin_hour", 14)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (with ROOMLEDGER__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("ROOMLEDGER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://roomledger.db".to_string(),
                max_connections: 10,
            },
            booking: BookingConfig::default(),
            payments: PaymentsConfig::default(),
        }
    }
}
