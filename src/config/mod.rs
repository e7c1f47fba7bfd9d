/// Application settings from environment variables
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Tag and ingredient seeding from a TOML file
pub mod seed;

pub use app::AppConfig;
