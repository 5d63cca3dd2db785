use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub photos: PhotoConfig,
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
pub struct LedgerConfig {
    /// Minimum number of digits in a national ID.
    pub min_id_digits: usize,
    /// Allow editing a member's ID, rewriting their payments to the new ID.
    #[serde(default)]
    pub allow_id_rename: bool,
    /// Monthly fee for plans that match nothing in the dues plan table.
    pub fallback_fee_cents: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_id_digits: 7,
            allow_id_rename: false,
            fallback_fee_cents: 80_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PhotoConfig {
    pub max_dimension: u32,
    pub jpeg_quality: u8,
    pub max_upload_bytes: usize,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            max_dimension: 400,
            jpeg_quality: 80,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite://dojo.db")?
            .set_default("database.max_connections", 5)?
            .set_default("ledger.min_id_digits", 7)?
            .set_default("ledger.allow_id_rename", false)?
            .set_default("ledger.fallback_fee_cents", 80_000)?
            .set_default("photos.max_dimension", 400)?
            .set_default("photos.jpeg_quality", 80)?
            .set_default("photos.max_upload_bytes", 10 * 1024 * 1024)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with DOJO__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("DOJO").separator("__"))

            // Hosting platforms usually hand out a bare DATABASE_URL
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?

            .build()?;

        config.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
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
                url: "sqlite://dojo.db".to_string(),
                max_connections: 5,
            },
            ledger: LedgerConfig::default(),
            photos: PhotoConfig::default(),
        }
    }
}
