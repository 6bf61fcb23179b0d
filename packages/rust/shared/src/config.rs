//! Application configuration for the Lodestone converter.
//!
//! User config lives at `~/.lodestone/lodestone.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LodestoneError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "lodestone.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".lodestone";

/// Hard message limit imposed by Discord.
pub const DISCORD_MAX_LENGTH: usize = 2000;

/// Origin used to absolutize root-relative `/lodestone` links.
pub const DEFAULT_SITE_ORIGIN: &str = "https://eu.finalfantasyxiv.com";

// ---------------------------------------------------------------------------
// Config structs (matching lodestone.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Markdown conversion settings.
    #[serde(default)]
    pub converter: ConverterSection,
}

/// `[converter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterSection {
    /// Maximum length of a converted message, in characters.
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// How far back from the limit a word boundary may be, in characters.
    #[serde(default = "default_truncation_window")]
    pub truncation_window: usize,

    /// Lodestone origin for root-relative links.
    #[serde(default = "default_site_origin")]
    pub site_origin: String,

    /// Text of the link appended to truncated messages.
    #[serde(default = "default_continue_reading_label")]
    pub continue_reading_label: String,
}

impl Default for ConverterSection {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            truncation_window: default_truncation_window(),
            site_origin: default_site_origin(),
            continue_reading_label: default_continue_reading_label(),
        }
    }
}

fn default_max_length() -> usize {
    DISCORD_MAX_LENGTH
}
fn default_truncation_window() -> usize {
    100
}
fn default_site_origin() -> String {
    DEFAULT_SITE_ORIGIN.into()
}
fn default_continue_reading_label() -> String {
    "Continue reading".into()
}

// ---------------------------------------------------------------------------
// Converter config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime conversion settings handed to the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Maximum output length in characters.
    pub max_length: usize,
    /// Word-boundary search window below the cut point.
    pub truncation_window: usize,
    /// Origin for root-relative links, without a trailing slash.
    pub site_origin: String,
    /// Label of the "continue reading" link.
    pub continue_reading_label: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ConverterConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_length: config.converter.max_length,
            truncation_window: config.converter.truncation_window,
            site_origin: config.converter.site_origin.trim_end_matches('/').to_string(),
            continue_reading_label: config.converter.continue_reading_label.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.lodestone/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LodestoneError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.lodestone/lodestone.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LodestoneError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        LodestoneError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LodestoneError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LodestoneError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LodestoneError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject settings the truncation logic cannot honor.
fn validate(config: &AppConfig) -> Result<()> {
    let section = &config.converter;
    if section.max_length < 16 {
        return Err(LodestoneError::config(format!(
            "converter.max_length must be at least 16, got {}",
            section.max_length
        )));
    }
    if !section.site_origin.starts_with("http://") && !section.site_origin.starts_with("https://")
    {
        return Err(LodestoneError::config(format!(
            "converter.site_origin must be an http(s) origin, got '{}'",
            section.site_origin
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_length = 2000"));
        assert!(toml_str.contains("eu.finalfantasyxiv.com"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.converter.max_length, DISCORD_MAX_LENGTH);
        assert_eq!(parsed.converter.truncation_window, 100);
    }

    #[test]
    fn partial_section_uses_defaults() {
        let toml_str = r#"
[converter]
site_origin = "https://na.finalfantasyxiv.com/"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let runtime = ConverterConfig::from(&config);
        assert_eq!(runtime.site_origin, "https://na.finalfantasyxiv.com");
        assert_eq!(runtime.max_length, 2000);
        assert_eq!(runtime.continue_reading_label, "Continue reading");
    }

    #[test]
    fn load_rejects_tiny_limit() {
        let dir = std::env::temp_dir().join("lodestone-config-test-tiny");
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[converter]\nmax_length = 3\n").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("max_length"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/lodestone.toml")).unwrap_err();
        assert!(matches!(err, LodestoneError::Io { .. }));
    }
}
