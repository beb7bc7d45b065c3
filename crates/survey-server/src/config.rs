//! Configuration management for the survey server

use anyhow::Result;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,

    /// Server port (default: 8000)
    pub port: u16,

    /// MongoDB connection string (default: mongodb://localhost:27017)
    pub database_url: String,

    /// Database name (default: survey_generator)
    pub database_name: String,

    /// CORS allowed origins, comma-separated
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_database_url() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database_name() -> String {
    "survey_generator".to_string()
}

fn default_cors_origins() -> String {
    "http://localhost:3000".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| default_host());
        let port = match std::env::var("SERVER_PORT") {
            Ok(s) => s
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid SERVER_PORT '{}'", s))?,
            Err(_) => default_port(),
        };
        let database_url =
            std::env::var("MONGODB_URL").unwrap_or_else(|_| default_database_url());
        let database_name =
            std::env::var("DATABASE_NAME").unwrap_or_else(|_| default_database_name());
        let cors_origins =
            std::env::var("CORS_ORIGINS").unwrap_or_else(|_| default_cors_origins());

        Ok(Self {
            host,
            port,
            database_url,
            database_name,
            cors_origins,
        })
    }

    /// Allowed CORS origins, split from the comma-separated value
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            database_name: default_database_name(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.database_url, "mongodb://localhost:27017");
        assert_eq!(config.database_name, "survey_generator");
        assert_eq!(config.cors_origin_list(), vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_cors_origin_list_splits_and_trims() {
        let config = Config {
            cors_origins: "http://localhost:3000, https://surveys.example.com ,,".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.cors_origin_list(),
            vec!["http://localhost:3000", "https://surveys.example.com"]
        );
    }
}
