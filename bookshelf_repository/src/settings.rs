use anyhow::Context;
use serde::Deserialize;

use crate::books_repository::PostgresBooksRepositoryConfig;

/// Service configuration read from environment variables
/// (optionally provided through a `.env` file).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub use_in_memory_db: bool,
    pub db_host: Option<String>,
    #[serde(default = "Settings::default_db_port")]
    pub db_port: u16,
    pub db_user: Option<String>,
    pub db_pass: Option<String>,
    pub db_name: Option<String>,
    #[serde(default = "Settings::default_db_sslmode")]
    pub db_sslmode: String,
    #[serde(default = "Settings::default_server_host")]
    pub server_host: String,
    #[serde(default = "Settings::default_server_port")]
    pub server_port: u16,
}

impl Settings {
    fn default_db_port() -> u16 {
        5432
    }

    fn default_db_sslmode() -> String {
        "disable".to_string()
    }

    fn default_server_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_server_port() -> u16 {
        8080
    }

    /// Loads `.env` if present and reads settings from the environment
    pub fn load() -> anyhow::Result<Self> {
        // Missing `.env` is fine, variables may come from the process environment
        let _ = dotenvy::dotenv();

        Self::from_environment(config::Environment::default())
    }

    /// Values are kept as strings so credentials like `007` are not turned into numbers,
    /// numeric and boolean fields are converted while deserializing
    fn from_environment(environment: config::Environment) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(environment)
            .build()
            .context("Failed to read environment")?;

        Self::from_config(config)
    }

    pub fn from_config(config: config::Config) -> anyhow::Result<Self> {
        config
            .try_deserialize()
            .context("Failed to deserialize settings")
    }

    /// Connection settings for postgres, fails when any of the required variables is missing
    pub fn postgres_config(&self) -> anyhow::Result<PostgresBooksRepositoryConfig> {
        fn required(value: &Option<String>, name: &str) -> anyhow::Result<String> {
            value
                .clone()
                .with_context(|| format!("{} environment variable is not set", name))
        }

        Ok(PostgresBooksRepositoryConfig {
            hostname: required(&self.db_host, "DB_HOST")?,
            port: self.db_port,
            username: required(&self.db_user, "DB_USER")?,
            password: required(&self.db_pass, "DB_PASS")?,
            dbname: required(&self.db_name, "DB_NAME")?,
            sslmode: self.db_sslmode.clone(),
        })
    }
}
