//! Configuration system
//!
//! Provides centralized configuration management with:
//! - Config file loading (optional)
//! - Environment variable overrides
//! - Runtime defaults
//! - Validation
//!
//! A license rule can live in the `[rule]` section of the config file or in a separate
//! rule file (TOML or JSON) named by `paths.rule_file` or the `--rule` flag.

use crate::models::LicenseRule;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub ingestion: IngestionConfig,
    pub calculation: CalculationConfig,
    pub output: OutputConfig,
    pub paths: PathsConfig,

    /// Rule used when no rule file is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<LicenseRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Only rows for this application are imported; all rows when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<u64>,
    pub delimiter: char,
    pub has_headers: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_pretty: bool,
    pub color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            application_id: None,
            delimiter: ',',
            has_headers: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_pretty: true,
            color: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("logs"),
            rule_file: None,
        }
    }
}

impl Config {
    /// Load configuration from file, environment and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("flex-license.toml"),
            PathBuf::from(".flex-license.toml"),
            dirs::config_dir()
                .map(|d| d.join("flex-license").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("FLEX_LICENSE_APPLICATION_ID") {
            self.ingestion.application_id =
                Some(val.parse().context("Invalid FLEX_LICENSE_APPLICATION_ID")?);
        }
        if let Ok(val) = env::var("FLEX_LICENSE_DELIMITER") {
            self.ingestion.delimiter = val.parse().context("Invalid FLEX_LICENSE_DELIMITER")?;
        }

        if let Ok(val) = env::var("FLEX_LICENSE_PARALLEL") {
            self.calculation.parallel = val.parse().context("Invalid FLEX_LICENSE_PARALLEL")?;
        }

        if let Ok(val) = env::var("FLEX_LICENSE_RULE_FILE") {
            self.paths.rule_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = env::var("FLEX_LICENSE_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.ingestion.delimiter.is_ascii() {
            return Err(anyhow::anyhow!(
                "Delimiter must be a single ASCII character, got {:?}",
                self.ingestion.delimiter
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(anyhow::anyhow!(
                "Log format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            ));
        }

        if let Some(rule) = &self.rule {
            if let Err(violation) = rule.validate() {
                warn!(%violation, "Configured license rule is invalid");
            }
        }

        if matches!(self.logging.output.as_str(), "file" | "both")
            && !self.paths.log_directory.exists()
        {
            fs::create_dir_all(&self.paths.log_directory)
                .context("Failed to create log directory")?;
        }

        Ok(())
    }

    /// Rule from `rule_file` when given, otherwise from the `[rule]` section.
    pub fn resolve_rule(&self, rule_file: Option<&Path>) -> Result<LicenseRule> {
        if let Some(path) = rule_file.or(self.paths.rule_file.as_deref()) {
            return load_rule(path);
        }

        self.rule.clone().context(
            "No license rule configured; pass --rule or add a [rule] section to flex-license.toml",
        )
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}

/// Reads a rule from a `.json` file, or TOML for any other extension.
pub fn load_rule(path: &Path) -> Result<LicenseRule> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule file: {}", path.display()))?;

    let rule = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse rule file: {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse rule file: {}", path.display()))?
    };

    Ok(rule)
}

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance, loading it on first use.
pub fn get_config() -> Result<&'static Config> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let loaded = Config::load()?;
    Ok(CONFIG.get_or_init(|| loaded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "WARN");
        assert_eq!(config.ingestion.delimiter, ',');
        assert!(config.ingestion.has_headers);
        assert!(config.rule.is_none());
    }

    #[test]
    fn test_env_override() {
        env::set_var("FLEX_LICENSE_APPLICATION_ID", "374");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.ingestion.application_id, Some(374));
        env::remove_var("FLEX_LICENSE_APPLICATION_ID");
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.ingestion.delimiter = '¦';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rule_section_parses() {
        let config: Config = toml::from_str(
            r#"
            [ingestion]
            application_id = 374

            [rule]
            total_max_install = 2

            [rule.max_install_per_category]
            desktop = 1
            laptop = 1
            "#,
        )
        .unwrap();

        let rule = config.resolve_rule(None).unwrap();
        assert_eq!(rule.total_max_install, 2);
        assert_eq!(rule.cap(Category::Laptop), 1);
        assert_eq!(config.logging.format, "pretty");
    }
}
