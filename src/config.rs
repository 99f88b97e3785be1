use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use validator::Validate;

use crate::core::presets::WeightPreset;
use crate::core::refresh::RefreshOptions;
use crate::services::DEFAULT_EVENT_QUEUE;

const ENV_PREFIX: &str = "BLINDMATCH";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerSettings,
    #[serde(default)]
    #[validate(nested)]
    pub database: DatabaseSettings,
    #[serde(default)]
    #[validate(nested)]
    pub matching: MatchingSettings,
    #[serde(default)]
    #[validate(nested)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    #[validate(nested)]
    pub events: EventSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[validate(range(min = 1, max = 512))]
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Without a url the service runs on the in-memory store
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub max_connections: Option<u32>,
    #[validate(range(max = 1000))]
    pub min_connections: Option<u32>,
    #[validate(range(min = 1, max = 600))]
    pub acquire_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MatchingSettings {
    /// Weights for assignments without their own configuration
    #[serde(default)]
    pub default_preset: WeightPreset,
    #[serde(default = "default_fetch_timeout_ms")]
    #[validate(range(min = 1, max = 600_000))]
    pub fetch_timeout_ms: u64,
    /// Upper bound on delivering one analytics event
    #[serde(default = "default_event_timeout_ms")]
    #[validate(range(min = 1, max = 60_000))]
    pub event_timeout_ms: u64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_preset: WeightPreset::default(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            event_timeout_ms: default_event_timeout_ms(),
        }
    }
}

impl MatchingSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn event_timeout(&self) -> Duration {
        Duration::from_millis(self.event_timeout_ms)
    }
}

fn default_fetch_timeout_ms() -> u64 { 5000 }
fn default_event_timeout_ms() -> u64 { 2000 }

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshSettings {
    #[serde(default = "default_refresh_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    #[validate(range(min = 1, max = 604_800))]
    pub interval_secs: u64,
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, max = 10_000))]
    pub batch_size: usize,
    #[serde(default = "default_stale_after_hours")]
    #[validate(range(min = 1, max = 8_760))]
    pub stale_after_hours: i64,
    #[serde(default = "default_max_run_secs")]
    #[validate(range(min = 1, max = 86_400))]
    pub max_run_secs: u64,
    #[serde(default = "default_per_profile_timeout_secs")]
    #[validate(range(min = 1, max = 3_600))]
    pub per_profile_timeout_secs: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            enabled: default_refresh_enabled(),
            interval_secs: default_interval_secs(),
            batch_size: default_batch_size(),
            stale_after_hours: default_stale_after_hours(),
            max_run_secs: default_max_run_secs(),
            per_profile_timeout_secs: default_per_profile_timeout_secs(),
        }
    }
}

impl RefreshSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn options(&self, fetch_timeout: Duration) -> RefreshOptions {
        RefreshOptions {
            batch_size: self.batch_size,
            stale_after: chrono::Duration::try_hours(self.stale_after_hours).unwrap_or(chrono::Duration::MAX),
            max_run: Duration::from_secs(self.max_run_secs),
            per_profile_timeout: Duration::from_secs(self.per_profile_timeout_secs),
            fetch_timeout,
        }
    }
}

fn default_refresh_enabled() -> bool { true }
fn default_interval_secs() -> u64 { 3600 }
fn default_batch_size() -> usize { 100 }
fn default_stale_after_hours() -> i64 { 24 }
fn default_max_run_secs() -> u64 { 240 }
fn default_per_profile_timeout_secs() -> u64 { 30 }

/// Analytics collector. Without an endpoint events are only logged.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventSettings {
    #[validate(url)]
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// HTTP client timeout towards the collector
    #[serde(default = "default_event_timeout_ms")]
    #[validate(range(min = 1, max = 60_000))]
    pub timeout_ms: u64,
    /// Events waiting for delivery; further events are dropped
    #[serde(default = "default_queue_size")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub queue_size: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_ms: default_event_timeout_ms(),
            queue_size: default_queue_size(),
        }
    }
}

fn default_queue_size() -> usize { DEFAULT_EVENT_QUEUE }

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
    /// 2. Configuration files (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with BLINDMATCH__)
    /// 4. DATABASE_URL for the database url
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // local overrides for development
            .add_source(File::with_name("config/local").required(false))
            // e.g., BLINDMATCH__SERVER__PORT -> server.port
            .add_source(environment());

        with_database_url(builder)?.build()?.try_deserialize::<Self>()?.checked()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment());

        with_database_url(builder)?.build()?.try_deserialize::<Self>()?.checked()
    }

    /// Reject values the service cannot run with
    fn checked(self) -> Result<Self, ConfigError> {
        self.validate()
            .map_err(|errors| ConfigError::Message(format!("invalid settings: {}", errors)))?;
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// DATABASE_URL takes precedence over every other source
fn with_database_url(builder: ConfigBuilder<DefaultState>) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => builder.set_override("database.url", url),
        _ => Ok(builder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_refresh() {
        let refresh = RefreshSettings::default();
        assert!(refresh.enabled);
        assert_eq!(refresh.batch_size, 100);
        assert_eq!(refresh.stale_after_hours, 24);

        let options = refresh.options(Duration::from_secs(5));
        assert_eq!(options.max_run, Duration::from_secs(240));
        assert_eq!(options.per_profile_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.default_preset, WeightPreset::Balanced);
        assert_eq!(matching.fetch_timeout(), Duration::from_millis(5000));
        assert_eq!(matching.event_timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("blind-match-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\n\n[matching]\ndefault_preset = \"skills-first\"\n\n[refresh]\nenabled = false"
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.matching.default_preset, WeightPreset::SkillsFirst);
        assert!(!settings.refresh.enabled);
        assert_eq!(settings.refresh.interval_secs, 3600);
    }

    fn write_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("blind-match-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings {
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            matching: MatchingSettings::default(),
            refresh: RefreshSettings::default(),
            events: EventSettings::default(),
            logging: LoggingSettings::default(),
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_refresh_interval_rejected() {
        let path = write_config("[refresh]\ninterval_secs = 0");
        let result = Settings::load_from(&path);
        std::fs::remove_file(&path).ok();

        let message = result.unwrap_err().to_string();
        assert!(message.contains("interval_secs"), "{}", message);
    }

    #[test]
    fn test_out_of_range_refresh_limits_rejected() {
        let mut refresh = RefreshSettings::default();
        refresh.stale_after_hours = i64::MAX;
        assert!(refresh.validate().is_err());

        let mut refresh = RefreshSettings::default();
        refresh.max_run_secs = u64::MAX;
        assert!(refresh.validate().is_err());

        // options() stays total even for values validation would refuse
        refresh.stale_after_hours = i64::MAX;
        let options = refresh.options(Duration::from_secs(5));
        assert_eq!(options.stale_after, chrono::Duration::MAX);
    }

    #[test]
    fn test_event_queue_must_hold_something() {
        let mut events = EventSettings::default();
        assert_eq!(events.queue_size, DEFAULT_EVENT_QUEUE);
        events.queue_size = 0;
        assert!(events.validate().is_err());
    }
}
