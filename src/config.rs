use crate::services::github::DEFAULT_API_URL;
use anyhow::{Context, Result, bail};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub github_token: Option<String>,
    pub github_username: String,
    pub github_api_url: String,
    pub admin_token: String,
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(p) => p.parse::<u16>().with_context(|| format!("PORT is not a valid port: {}", p))?,
            None => 3001,
        };
        let Some(github_username) = var("GITHUB_USERNAME") else {
            bail!("GITHUB_USERNAME must be set");
        };
        let Some(admin_token) = var("ADMIN_TOKEN") else {
            bail!("ADMIN_TOKEN must be set");
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            github_token: var("GITHUB_TOKEN"),
            github_username,
            github_api_url: var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            admin_token,
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite://portfolio.db".to_string()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
