//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The admin token is referenced by env-var name in the config and
//! resolved at runtime. `DATABASE_URL` and `UPLOAD_FOLDER` override the
//! file when set.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use tracing::warn;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub game: GameConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Name of the environment variable holding the admin bearer token.
    pub token_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    pub dir: String,
    /// Request body cap for photo uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    pub leaderboard_limit: i64,
    /// Odds for candidates created without an explicit value.
    pub default_odds: Decimal,
    /// Seed the department catalog when the database is empty.
    pub seed_on_startup: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            leaderboard_limit: 50,
            default_odds: dec!(2.0),
            seed_on_startup: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply env overrides.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let mut config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                self.database.url = url;
            }
        }
        if let Ok(dir) = std::env::var("UPLOAD_FOLDER") {
            if !dir.trim().is_empty() {
                self.uploads.dir = dir;
            }
        }
    }

    /// Resolve the admin token. Generates a one-off token when unset so the
    /// admin surface is never open.
    pub fn admin_token(&self) -> SecretString {
        match std::env::var(&self.admin.token_env) {
            Ok(token) if !token.trim().is_empty() => SecretString::new(token.trim().to_string()),
            _ => {
                let generated = uuid::Uuid::new_v4().simple().to_string();
                warn!(
                    env = %self.admin.token_env,
                    token = %generated,
                    "No admin token configured; generated one for this run"
                );
                SecretString::new(generated)
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
