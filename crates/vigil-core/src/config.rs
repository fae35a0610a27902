use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use vigil_storage::{ConfigError, WindowKey};

/// Tracker configuration, loaded from `config.toml` under the user's
/// config directory with CLI overrides applied on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub sampling_interval_seconds: u64,
    pub flush_interval_seconds: u64,
    /// If non-empty, only these applications are recorded.
    pub include_apps: BTreeSet<String>,
    /// Applications to skip; evaluated before `include_apps`.
    pub exclude_apps: BTreeSet<String>,
    pub primary_log_path: PathBuf,
    pub incremental_log_path: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            sampling_interval_seconds: 1,
            flush_interval_seconds: 60,
            include_apps: BTreeSet::new(),
            exclude_apps: BTreeSet::new(),
            primary_log_path: data_dir.join("usage.csv"),
            incremental_log_path: data_dir.join("usage.incremental.csv"),
        }
    }
}

impl TrackerConfig {
    /// Load the config file, falling back to defaults when it does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Validate before tracking begins; violations are fatal.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on a zero interval or an application named
    /// in both filter sets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling_interval_seconds == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "sampling_interval_seconds",
            });
        }
        if self.flush_interval_seconds == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "flush_interval_seconds",
            });
        }
        if let Some(app) = self.include_apps.intersection(&self.exclude_apps).next() {
            return Err(ConfigError::ConflictingFilters { app: app.clone() });
        }
        Ok(())
    }

    /// Whether a key passes the filters. Exclusion wins; with a
    /// non-empty include set, only listed applications are recorded.
    #[must_use]
    pub fn allows(&self, key: &WindowKey) -> bool {
        if self.exclude_apps.contains(&key.application) {
            return false;
        }
        if !self.include_apps.is_empty() && !self.include_apps.contains(&key.application) {
            return false;
        }
        true
    }
}

/// Path of the config file under the user's config directory.
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined.
pub fn config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Failed to get config dir"))?;
    path.push("vigil");
    path.push("config.toml");
    Ok(path)
}

fn default_data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("vigil");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.sampling_interval_seconds, 1);
        assert_eq!(config.flush_interval_seconds, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        let config = TrackerConfig {
            sampling_interval_seconds: 0,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval { field: "sampling_interval_seconds" })
        ));

        let config = TrackerConfig {
            flush_interval_seconds: 0,
            ..TrackerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_conflicting_filters_are_rejected() {
        let mut config = TrackerConfig::default();
        config.include_apps.insert(String::from("Chrome"));
        config.exclude_apps.insert(String::from("Chrome"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConflictingFilters { app }) if app == "Chrome"
        ));
    }

    #[test]
    fn test_exclude_is_evaluated_before_include() {
        let mut config = TrackerConfig::default();
        config.exclude_apps.insert(String::from("Notepad"));
        assert!(!config.allows(&WindowKey::new("Notepad", "Untitled")));
        assert!(config.allows(&WindowKey::new("Chrome", "GitHub")));
    }

    #[test]
    fn test_nonempty_include_restricts_recording() {
        let mut config = TrackerConfig::default();
        config.include_apps.insert(String::from("Chrome"));
        assert!(config.allows(&WindowKey::new("Chrome", "GitHub")));
        assert!(!config.allows(&WindowKey::new("Notepad", "Main")));
        assert!(!config.allows(&WindowKey::no_window()));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = TrackerConfig::default();
        config.exclude_apps.insert(String::from("1Password"));
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: TrackerConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.exclude_apps, config.exclude_apps);
        assert_eq!(parsed.primary_log_path, config.primary_log_path);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let parsed: TrackerConfig = toml::from_str("sampling_interval_seconds = 5").unwrap();
        assert_eq!(parsed.sampling_interval_seconds, 5);
        assert_eq!(parsed.flush_interval_seconds, 60);
    }
}
