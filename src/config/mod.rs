/// Database configuration and connection management
pub mod database;

/// Runtime settings from environment variables and config.toml
pub mod settings;

pub use settings::Settings;
