//! Notifier configuration
//!
//! Read from `<config_dir>/update-notifier/config.toml` when present; every field
//! has a default, so a missing or partial file is fine.
//!
//! Setting `NO_UPDATE_NOTIFIER` or `CI` in the environment disables the check.

use crate::registry::{
    npm_upgrade_hint, GithubReleases, NpmRegistry, PublishedVersionSource, DEFAULT_NPM_REGISTRY,
    DEFAULT_PACKAGE,
};
use crate::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

const OPT_OUT_VARS: &[&str] = &["NO_UPDATE_NOTIFIER", "CI"];

/// Which registry publishes the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    #[default]
    Npm,
    Github,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Package name looked up on the registry
    pub package: String,

    pub registry: RegistryKind,

    /// Base URL for npm-style registries
    pub registry_url: String,

    /// `owner/name` for GitHub releases; falls back to `package`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,

    /// File stem of the persisted store
    pub store_name: String,

    /// Command suggested in the notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_hint: Option<String>,

    pub timeout_secs: u64,

    pub enabled: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            registry: RegistryKind::Npm,
            registry_url: DEFAULT_NPM_REGISTRY.to_string(),
            github_repo: None,
            store_name: "update-notifier".to_string(),
            upgrade_hint: None,
            timeout_secs: 10,
            enabled: true,
        }
    }
}

impl NotifierConfig {
    /// Get the default config file path (<config_dir>/update-notifier/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("update-notifier").join("config.toml"))
    }

    /// Load from the default path, or defaults if there is no file
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Whether the check should run, honoring the environment opt-outs
    pub fn is_enabled(&self) -> bool {
        self.is_enabled_with(|var| std::env::var_os(var))
    }

    /// Same as [`is_enabled`](Self::is_enabled) with a caller-supplied env lookup
    pub fn is_enabled_with(&self, env: impl Fn(&str) -> Option<OsString>) -> bool {
        self.enabled && !OPT_OUT_VARS.iter().any(|var| env(var).is_some())
    }

    pub fn upgrade_hint(&self) -> String {
        match &self.upgrade_hint {
            Some(hint) => hint.clone(),
            None => match self.registry {
                RegistryKind::Npm => npm_upgrade_hint(&self.package),
                RegistryKind::Github => format!(
                    "download the latest release from https://github.com/{}/releases",
                    self.github_repo()
                ),
            },
        }
    }

    fn github_repo(&self) -> &str {
        self.github_repo.as_deref().unwrap_or(&self.package)
    }

    /// Build the registry client described by this config
    pub fn registry_source(&self) -> Box<dyn PublishedVersionSource> {
        let timeout = Duration::from_secs(self.timeout_secs);
        match self.registry {
            RegistryKind::Npm => Box::new(
                NpmRegistry::with_base_url(&self.registry_url, &self.package).timeout(timeout),
            ),
            RegistryKind::Github => {
                Box::new(GithubReleases::new(self.github_repo()).timeout(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "package = \"my-tool\"\ntimeout_secs = 3\n").unwrap();

        let config = NotifierConfig::load_from(&path).unwrap();

        assert_eq!(config.package, "my-tool");
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.registry, RegistryKind::Npm);
        assert_eq!(config.store_name, "update-notifier");
        assert!(config.enabled);
    }

    #[test]
    fn test_github_registry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "registry = \"github\"\ngithub_repo = \"owner/tool\"\n",
        )
        .unwrap();

        let config = NotifierConfig::load_from(&path).unwrap();

        assert_eq!(config.registry, RegistryKind::Github);
        assert!(config.upgrade_hint().contains("github.com/owner/tool/releases"));
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "registry = \"pypi\"").unwrap();

        let err = NotifierConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_upgrade_hint() {
        let mut config = NotifierConfig::default();
        assert_eq!(config.upgrade_hint(), "npm install -g zenn-cli@latest");

        config.upgrade_hint = Some("brew upgrade zenn".to_string());
        assert_eq!(config.upgrade_hint(), "brew upgrade zenn");
    }

    #[test]
    fn test_disabled_in_config() {
        let config = NotifierConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_env_opt_out() {
        let config = NotifierConfig::default();

        assert!(config.is_enabled_with(|_| None));
        for opt_out in ["NO_UPDATE_NOTIFIER", "CI"] {
            let env = |var: &str| (var == opt_out).then(|| OsString::from("1"));
            assert!(!config.is_enabled_with(env), "{opt_out} should disable the check");
        }
        assert!(config.is_enabled_with(|var| (var == "HOME").then(|| OsString::from("/root"))));
    }
}
