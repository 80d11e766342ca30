use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LumenError, Result};

/// Top-level configuration for the Lumen service.
///
/// Loaded from `~/.lumen/config.toml` by default. Every section is optional
/// in the file; missing keys fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LumenConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl LumenConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LumenConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LumenError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP port for the API server.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 3040,
        }
    }
}

/// How the plan sanitizer treats expressions outside the schema whitelist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizeMode {
    /// Drop offending clauses and keep going.
    #[default]
    FailOpen,
    /// Reject the whole plan on the first offending clause.
    FailClosed,
}

/// Question interpretation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Shortest accepted question, in characters after trimming.
    pub min_question_chars: usize,
    /// Longest accepted question, in characters.
    pub max_question_chars: usize,
    /// Row limit for ranking plans when the question names none.
    pub default_limit: u32,
    /// Metric assumed for a fresh session.
    pub default_metric: String,
    /// Number of answered questions remembered per session.
    pub history_limit: usize,
    /// Sanitizer behaviour for non-whitelisted expressions.
    pub sanitize_mode: SanitizeMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_question_chars: 3,
            max_question_chars: 500,
            default_limit: 5,
            default_metric: "sales".to_string(),
            history_limit: 5,
            sanitize_mode: SanitizeMode::FailOpen,
        }
    }
}

/// Storage settings for the bundled SQLite executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path, or `:memory:` for an in-process database.
    pub database_path: String,
    /// Populate an empty `orders` table with the deterministic sample set.
    pub seed_sample_data: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: ":memory:".to_string(),
            seed_sample_data: true,
        }
    }
}

/// Optional language-model enrichment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Consult the language model for advisory hints.
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = LumenConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.analysis.min_question_chars, 3);
        assert_eq!(config.analysis.max_question_chars, 500);
        assert_eq!(config.analysis.default_limit, 5);
        assert_eq!(config.analysis.default_metric, "sales");
        assert_eq!(config.analysis.history_limit, 5);
        assert_eq!(config.analysis.sanitize_mode, SanitizeMode::FailOpen);
        assert_eq!(config.storage.database_path, ":memory:");
        assert!(config.storage.seed_sample_data);
        assert!(!config.enrichment.enabled);
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(
            r#"
[general]
log_level = "debug"
port = 8080

[analysis]
default_limit = 10
sanitize_mode = "fail_closed"
"#,
        );
        let config = LumenConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.port, 8080);
        assert_eq!(config.analysis.default_limit, 10);
        assert_eq!(config.analysis.sanitize_mode, SanitizeMode::FailClosed);
        // Unspecified keys keep their defaults
        assert_eq!(config.analysis.max_question_chars, 500);
        assert_eq!(config.storage.database_path, ":memory:");
    }

    #[test]
    fn test_load_empty_file_gives_defaults() {
        let file = create_temp_config("");
        let config = LumenConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.analysis.history_limit, 5);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let file = create_temp_config("[general\nport = ");
        let err = LumenConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, LumenError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = LumenConfig::load(Path::new("/nonexistent/lumen/config.toml")).unwrap_err();
        assert!(matches!(err, LumenError::Io(_)));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let config = LumenConfig::load_or_default(Path::new("/nonexistent/lumen/config.toml"));
        assert_eq!(config.general.port, 3040);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = LumenConfig::default();
        config.general.port = 9999;
        config.enrichment.enabled = true;
        config.save(&path).unwrap();

        let loaded = LumenConfig::load(&path).unwrap();
        assert_eq!(loaded.general.port, 9999);
        assert!(loaded.enrichment.enabled);
    }

    #[test]
    fn test_unknown_sanitize_mode_rejected() {
        let file = create_temp_config("[analysis]\nsanitize_mode = \"lenient\"\n");
        assert!(LumenConfig::load(file.path()).is_err());
    }
}
