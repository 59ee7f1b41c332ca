//! Application configuration

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub providers: ProvidersConfig,
    pub public_base_url: String,
    pub timezone_default: String,
    pub rate_limit_per_minute: u32,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_read_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_signing_secret: String,
    pub access_token_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    pub psp_a: PspAConfig,
    pub psp_b: PspBConfig,
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PspAConfig {
    pub base_url: String,
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PspBConfig {
    pub base_url: String,
    pub shop_id: String,
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

/// Environment names fixed by the deployment contract; each overrides the
/// corresponding config key.
const ENV_OVERRIDES: [(&str, &str); 9] = [
    ("DATABASE_URL", "database.url"),
    ("SESSION_SIGNING_SECRET", "auth.session_signing_secret"),
    ("PSP_A_SECRET", "providers.psp_a.secret"),
    ("PSP_B_SHOP_ID", "providers.psp_b.shop_id"),
    ("PSP_B_SECRET", "providers.psp_b.secret"),
    ("PUBLIC_BASE_URL", "public_base_url"),
    ("TIMEZONE_DEFAULT", "timezone_default"),
    ("HTTP_PORT", "server.port"),
    ("RATE_LIMIT_PER_MINUTE", "rate_limit_per_minute"),
];

impl Config {
    /// Loads configuration in layers: baked-in defaults, then
    /// `config/default.toml`, then an optional custom file, then
    /// `FOODCOURTIO_`-prefixed environment variables, then the fixed
    /// deployment environment names.
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigLoader::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite://foodcourtio.db?mode=rwc")?
            .set_default("database.max_read_connections", 8)?
            .set_default("auth.session_signing_secret", "")?
            .set_default("auth.access_token_ttl_seconds", 7 * 24 * 3600)?
            .set_default("providers.psp_a.base_url", "https://api.psp-a.example")?
            .set_default("providers.psp_a.secret", "")?
            .set_default("providers.psp_b.base_url", "https://api.psp-b.example")?
            .set_default("providers.psp_b.shop_id", "")?
            .set_default("providers.psp_b.secret", "")?
            .set_default("providers.currency", "USD")?
            .set_default("public_base_url", "http://localhost:8080")?
            .set_default("timezone_default", "UTC")?
            .set_default("rate_limit_per_minute", 100)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::with_name("config/default").required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(&path));
        }

        builder = builder.add_source(Environment::with_prefix("FOODCOURTIO").separator("__"));

        for (env_name, key) in ENV_OVERRIDES {
            if let Ok(value) = std::env::var(env_name) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }
}
