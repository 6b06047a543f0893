use serde::Deserialize;
use std::fs;

use crate::stats::DeltaPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
    /// Static bearer token required on every request when set.
    pub auth_bearer_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsConfig {
    /// How to treat a consumption delta that comes out negative (meter reset or
    /// correction): surface it raw, or clamp it to zero.
    #[serde(default)]
    pub negative_delta: DeltaPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("METER_CONFIG").unwrap_or_else(|_| "meter-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let mut cfg: AppConfig = toml::from_str(&contents)?;

        // The database URL may come from the environment instead of the file.
        if let Ok(url) = env::var("DATABASE_URL") {
            cfg.database.url = url;
        }

        Ok(cfg)
    }
}
