//! Application settings loading from the environment and config.toml.
//!
//! Settings come from environment variables first (the normal deployment
//! path), with an optional `config.toml` supplying defaults for anything the
//! environment leaves unset. `JWT_SECRET` has no default: the server refuses
//! to start without one.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default bind address when neither environment nor file sets one
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
/// Default SQLite database location
const DEFAULT_DATABASE_URL: &str = "sqlite://data/hearthfund.sqlite?mode=rwc";

/// Resolved runtime settings for the service
#[derive(Debug, Clone)]
pub struct Settings {
    /// Connection string handed to SeaORM
    pub database_url: String,
    /// Address the HTTP listener binds to
    pub bind_addr: String,
    /// HS256 secret used to verify bearer tokens
    pub jwt_secret: String,
}

/// Optional file-based settings, all fields overridable by the environment
#[derive(Debug, Default, Deserialize)]
pub struct FileSettings {
    /// `database_url` default
    pub database_url: Option<String>,
    /// `bind_addr` default
    pub bind_addr: Option<String>,
}

/// Loads file settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_file_settings<P: AsRef<Path>>(path: P) -> Result<FileSettings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

impl Settings {
    /// Resolves settings from the environment, falling back to the given
    /// file settings and then to built-in defaults.
    ///
    /// # Errors
    /// Returns `Error::Config` when `JWT_SECRET` is missing, since token
    /// verification cannot work without it.
    pub fn resolve(file: FileSettings) -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .or(file.database_url)
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = std::env::var("BIND_ADDR")
            .ok()
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| Error::Config {
            message: "JWT_SECRET must be set".to_string(),
        })?;

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
        })
    }

    /// Loads settings for startup: reads `./config.toml` when present, then
    /// applies environment overrides.
    ///
    /// # Errors
    /// Returns an error on an unreadable/invalid config file or a missing
    /// `JWT_SECRET`.
    pub fn load() -> Result<Self> {
        let file = if Path::new("config.toml").exists() {
            load_file_settings("config.toml")?
        } else {
            FileSettings::default()
        };
        Self::resolve(file)
    }
}

#[cfg(test)]
mod tests {
    // Rust 2024 makes env mutation unsafe; fine in a single-threaded test
    #![allow(unsafe_code)]
    use super::*;

    #[test]
    fn resolve_prefers_file_over_defaults() {
        unsafe {
            std::env::remove_var("DATABASE_URL");
            std::env::remove_var("BIND_ADDR");
            std::env::set_var("JWT_SECRET", "test-secret");
        }

        let file = FileSettings {
            database_url: Some("sqlite::memory:".to_string()),
            bind_addr: None,
        };
        let settings = Settings::resolve(file).unwrap();
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR);
    }
}
