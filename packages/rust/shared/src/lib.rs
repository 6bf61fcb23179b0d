//! Shared types, error model, and configuration for the Lodestone converter.
//!
//! This crate is the foundation depended on by all other Lodestone crates.
//! It provides:
//! - [`LodestoneError`], the unified error type
//! - Output types ([`TimestampTag`], [`DiscordComponent`], [`MaintenanceTimestamps`])
//! - Configuration ([`AppConfig`], [`ConverterConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ConverterConfig, ConverterSection, DEFAULT_SITE_ORIGIN, DISCORD_MAX_LENGTH,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{LodestoneError, Result};
pub use types::{
    ComponentsMessage, DiscordComponent, MaintenanceTimestamps, TimestampStyle, TimestampTag,
};
