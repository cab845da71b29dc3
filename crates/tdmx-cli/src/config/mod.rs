//! Configuration management.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tdmx_pki::IssuancePolicy;

use crate::output::OutputFormat;

/// Environment variable consulted for the key store passphrase by default.
pub const DEFAULT_PASSPHRASE_ENV: &str = "TDMX_KEYSTORE_PASSPHRASE";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Name of an environment variable holding the key store passphrase.
    pub passphrase_env: Option<String>,

    /// Issuance defaults.
    #[serde(default)]
    pub policy: IssuancePolicy,
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("org", "tdmx", "tdmx-ca")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn passphrase_env(&self) -> &str {
        self.passphrase_env.as_deref().unwrap_or(DEFAULT_PASSPHRASE_ENV)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdmx_pki::KeyAlgorithm;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.policy, IssuancePolicy::default());
        assert_eq!(config.passphrase_env(), DEFAULT_PASSPHRASE_ENV);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config {
            output_format: Some(OutputFormat::Json),
            passphrase_env: Some("ZONE_SECRET".into()),
            ..Config::default()
        };
        config.policy.key_algorithm = KeyAlgorithm::Ed25519;
        config.policy.user_validity_days = 30;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.output_format, Some(OutputFormat::Json));
        assert_eq!(loaded.passphrase_env(), "ZONE_SECRET");
        assert_eq!(loaded.policy, config.policy);
    }

    #[test]
    fn partial_policy_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[policy]\nzone_validity_days = 100\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.policy.zone_validity_days, 100);
        assert_eq!(config.policy.user_validity_days, IssuancePolicy::default().user_validity_days);
    }
}
