//! Settings of the ledger command line. Configuration is read from an
//! optional `settings.toml`, then from `LEDGER__*` environment variables
//! (`LEDGER__APP__LEVEL=debug`, `LEDGER__ENGINE__MAX_PAGE_SIZE=50`).
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use ledger::EngineConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    /// Path of a SQLite file, created when missing.
    Sqlite(String),
    /// Any connection string sea-orm understands.
    Url(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
            Database::Url(url) => url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Engine {
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub max_conflict_retries: u32,
    pub operation_timeout_ms: Option<u64>,
}

impl Default for Engine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
            max_conflict_retries: config.max_conflict_retries,
            operation_timeout_ms: None,
        }
    }
}

impl From<&Engine> for EngineConfig {
    fn from(engine: &Engine) -> Self {
        EngineConfig {
            default_page_size: engine.default_page_size,
            max_page_size: engine.max_page_size,
            max_conflict_retries: engine.max_conflict_retries,
            operation_timeout: engine.operation_timeout_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Option<Database>,
    pub engine: Engine,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("LEDGER").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Connection string; `override_url` (the command line) wins.
    pub fn database_url(&self, override_url: Option<&str>) -> String {
        match (override_url, &self.database) {
            (Some(url), _) => url.to_string(),
            (None, Some(database)) => database.url(),
            (None, None) => String::from("sqlite:./ledger.db?mode=rwc"),
        }
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.database, None);
        assert_eq!(settings.database_url(None), "sqlite:./ledger.db?mode=rwc");
        assert_eq!(EngineConfig::from(&settings.engine), EngineConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [database]
            sqlite = "/tmp/wallets.db"

            [engine]
            max_page_size = 20
            operation_timeout_ms = 1500
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.database_url(None), "sqlite:/tmp/wallets.db?mode=rwc");
        assert_eq!(settings.database_url(Some("sqlite::memory:")), "sqlite::memory:");

        let config = EngineConfig::from(&settings.engine);
        assert_eq!(config.max_page_size, 20);
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.operation_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn memory_database_is_a_unit_variant() {
        let settings = parse(r#"database = "memory""#);
        assert_eq!(settings.database, Some(Database::Memory));
        assert_eq!(settings.database_url(None), "sqlite::memory:");
    }
}
