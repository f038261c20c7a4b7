use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Engine configuration, read once at startup and passed explicitly into
/// constructors. Nothing in the engine reads the environment after this.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// PostgreSQL connection string for the durable store
    pub database_url: String,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Identifier of the watched group, handed to the presence source
    pub group_id: String,

    /// Observability
    pub log_level: String,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .set_default("db_max_connections", 5)?
            .set_default("log_level", "info")?
            .add_source(config::Environment::default())
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(anyhow!("Database URL is required"));
        }

        if self.group_id.is_empty() {
            return Err(anyhow!("Group ID is required"));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow!("Database pool must allow at least one connection"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> EngineConfig {
        EngineConfig {
            database_url: "postgres://localhost/presence_points".to_string(),
            db_max_connections: 5,
            group_id: "-1001234567890".to_string(),
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_missing_database_url() {
        let mut config = base_config();
        config.database_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_group_id() {
        let mut config = base_config();
        config.group_id = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_pool_size() {
        let mut config = base_config();
        config.db_max_connections = 0;
        assert!(config.validate().is_err());
    }
}
