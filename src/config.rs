use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub messaging: MessagingSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Extra allowed CORS origins. Empty means permissive CORS.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CacheSettings {
    /// Redis is optional; without it only the in-process tier is used.
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_session_ttl_days")]
    pub ttl_days: i64,
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_days: default_session_ttl_days(),
            secure_cookie: false,
        }
    }
}

fn default_session_ttl_days() -> i64 { 365 }

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingSettings {
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,
}

impl Default for MessagingSettings {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit(),
            rate_window_secs: default_rate_window_secs(),
        }
    }
}

fn default_rate_limit() -> u32 { 30 }
fn default_rate_window_secs() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_discovery_limit")]
    pub default_limit: u16,
    #[serde(default = "default_discovery_max_limit")]
    pub max_limit: u16,
    /// Filtered candidates ranked per request
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: u32,
    #[serde(default)]
    pub weights: WeightsConfig,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            default_limit: default_discovery_limit(),
            max_limit: default_discovery_max_limit(),
            candidate_pool: default_candidate_pool(),
            weights: WeightsConfig::default(),
        }
    }
}

fn default_discovery_limit() -> u16 { 20 }
fn default_discovery_max_limit() -> u16 { 100 }
fn default_candidate_pool() -> u32 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_distance_weight")]
    pub distance: f64,
    #[serde(default = "default_interests_weight")]
    pub interests: f64,
    #[serde(default = "default_verified_weight")]
    pub verified: f64,
    #[serde(default = "default_activity_weight")]
    pub activity: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            distance: default_distance_weight(),
            interests: default_interests_weight(),
            verified: default_verified_weight(),
            activity: default_activity_weight(),
        }
    }
}

fn default_distance_weight() -> f64 { 0.35 }
fn default_interests_weight() -> f64 { 0.35 }
fn default_verified_weight() -> f64 { 0.15 }
fn default_activity_weight() -> f64 { 0.15 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with COLLABR__)
    /// 5. `DATABASE_URL` / `REDIS_URL` / `PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., COLLABR__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("COLLABR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_platform_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("COLLABR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Hosting platforms hand out `DATABASE_URL`, `REDIS_URL` and `PORT` directly.
fn apply_platform_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", normalize_database_url(&url))?;
    }
    if let Ok(url) = env::var("REDIS_URL") {
        builder = builder.set_override("cache.redis_url", url)?;
    }
    if let Ok(port) = env::var("PORT") {
        if let Ok(port) = port.parse::<u16>() {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
    }

    builder.build()
}

/// Some providers still hand out the legacy `postgres://` scheme.
pub fn normalize_database_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{}", rest),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.distance, 0.35);
        assert_eq!(weights.interests, 0.35);
        assert_eq!(weights.verified, 0.15);
        assert_eq!(weights.activity, 0.15);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_default_message_rate_limit() {
        let messaging = MessagingSettings::default();
        assert_eq!(messaging.rate_limit, 30);
        assert_eq!(messaging.rate_window_secs, 60);
    }

    #[test]
    fn test_normalize_database_url() {
        assert_eq!(
            normalize_database_url("postgres://u:p@localhost/db"),
            "postgresql://u:p@localhost/db"
        );
        assert_eq!(
            normalize_database_url("postgresql://u:p@localhost/db"),
            "postgresql://u:p@localhost/db"
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("collabr-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
url = "postgresql://localhost/collabr_test"

[messaging]
rate_limit = 5
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.messaging.rate_limit, 5);
        assert_eq!(settings.messaging.rate_window_secs, 60);
        assert_eq!(settings.session.ttl_days, 365);
        assert!(settings.cache.redis_url.is_none());

        std::fs::remove_dir_all(&dir).ok();
    }
}
