use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("SERVER_PORT is not a valid port number")?;
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://guardian:@localhost:5432/guardian".to_string());

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig { url },
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}
