//! Configuration for the delivery planner.
//!
//! Provides a TOML config file at `~/.config/delivery-planner/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiConfig};

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSection {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Check route invariants on every response.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    pub dir: Option<PathBuf>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/delivery-planner` or `~/.config/delivery-planner`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("delivery-planner");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("delivery-planner")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse a config file. `Ok(None)` if it does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<Option<ConfigFile>> {
    use anyhow::Context;

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Write the config file, creating parent dirs. Permissions are 0600 on Unix
/// since the file may hold an API key.
pub fn save_config(path: &Path, config: &ConfigFile) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub strict: bool,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub storage_dir: PathBuf,
    pub strict: bool,
}

impl PlannerConfig {
    /// Resolve with the chain CLI flag > env var > config file > default.
    ///
    /// - API key: CLI > `GEMINI_API_KEY` > `API_KEY` > `service.api_key` > none
    /// - Model: CLI > `DELIVERY_PLANNER_MODEL` > `service.model` > `gemini-2.5-flash`
    /// - Base URL: `DELIVERY_PLANNER_BASE_URL` > `service.base_url` > Google endpoint
    /// - Timeout: `DELIVERY_PLANNER_TIMEOUT_SECS` > `service.timeout_secs` > 120
    /// - Storage: `DELIVERY_PLANNER_STORAGE_DIR` > `storage.dir` > `<config dir>/storage`
    pub fn resolve(cli: &CliOverrides, file: Option<ConfigFile>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let file = file.unwrap_or_default();

        let api_key = cli
            .api_key
            .clone()
            .or_else(|| env_var("GEMINI_API_KEY"))
            .or_else(|| env_var("API_KEY"))
            .or(file.service.api_key)
            .filter(|key| !key.trim().is_empty());

        let model = cli
            .model
            .clone()
            .or_else(|| env_var("DELIVERY_PLANNER_MODEL"))
            .or(file.service.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = env_var("DELIVERY_PLANNER_BASE_URL")
            .or(file.service.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match env_var("DELIVERY_PLANNER_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().with_context(|| {
                format!("DELIVERY_PLANNER_TIMEOUT_SECS {raw:?} is not a whole number of seconds")
            })?,
            None => file.service.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let storage_dir = env_var("DELIVERY_PLANNER_STORAGE_DIR")
            .map(PathBuf::from)
            .or(file.storage.dir)
            .unwrap_or_else(|| config_dir().join("storage"));

        Ok(Self {
            api_key,
            model,
            base_url,
            timeout_secs,
            storage_dir,
            strict: cli.strict || file.service.strict,
        })
    }

    /// Settings for the HTTP adapter. Fails without an API key.
    pub fn gemini(&self) -> Result<GeminiConfig, PlannerError> {
        let api_key = self.api_key.clone().ok_or(PlannerError::MissingApiKey)?;
        Ok(GeminiConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key,
            timeout_secs: self.timeout_secs,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "GEMINI_API_KEY",
        "API_KEY",
        "DELIVERY_PLANNER_MODEL",
        "DELIVERY_PLANNER_BASE_URL",
        "DELIVERY_PLANNER_TIMEOUT_SECS",
        "DELIVERY_PLANNER_STORAGE_DIR",
    ];

    fn lock_clean_env() -> MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for var in VARS {
            unsafe { std::env::remove_var(var) };
        }
        guard
    }

    fn file_with_key(key: &str) -> ConfigFile {
        ConfigFile {
            service: ServiceSection {
                api_key: Some(key.to_string()),
                model: Some("file-model".to_string()),
                timeout_secs: Some(30),
                ..ServiceSection::default()
            },
            storage: StorageSection {
                dir: Some(PathBuf::from("/tmp/plans")),
            },
        }
    }

    #[test]
    fn defaults_when_nothing_set() {
        let _lock = lock_clean_env();
        let config = PlannerConfig::resolve(&CliOverrides::default(), None).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.storage_dir.ends_with("delivery-planner/storage"));
        assert!(matches!(config.gemini(), Err(PlannerError::MissingApiKey)));
    }

    #[test]
    fn file_values_apply() {
        let _lock = lock_clean_env();
        let config = PlannerConfig::resolve(&CliOverrides::default(), Some(file_with_key("file-key"))).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.model, "file-model");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/plans"));
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let _lock = lock_clean_env();
        unsafe { std::env::set_var("GEMINI_API_KEY", "env-key") };
        unsafe { std::env::set_var("DELIVERY_PLANNER_MODEL", "env-model") };

        let config = PlannerConfig::resolve(&CliOverrides::default(), Some(file_with_key("file-key"))).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.model, "env-model");

        let cli = CliOverrides {
            api_key: Some("cli-key".to_string()),
            model: None,
            strict: true,
        };
        let config = PlannerConfig::resolve(&cli, Some(file_with_key("file-key"))).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("cli-key"));
        assert!(config.strict);

        unsafe { std::env::remove_var("GEMINI_API_KEY") };
        unsafe { std::env::remove_var("DELIVERY_PLANNER_MODEL") };
    }

    #[test]
    fn legacy_api_key_var_is_read() {
        let _lock = lock_clean_env();
        unsafe { std::env::set_var("API_KEY", "legacy") };
        let config = PlannerConfig::resolve(&CliOverrides::default(), None).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("legacy"));
        unsafe { std::env::remove_var("API_KEY") };
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let _lock = lock_clean_env();
        unsafe { std::env::set_var("DELIVERY_PLANNER_TIMEOUT_SECS", "soon") };
        let result = PlannerConfig::resolve(&CliOverrides::default(), None);
        unsafe { std::env::remove_var("DELIVERY_PLANNER_TIMEOUT_SECS") };

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("DELIVERY_PLANNER_TIMEOUT_SECS"), "{message}");
        assert!(!message.contains("form input"), "{message}");
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let original = file_with_key("secret");

        save_config(&path, &original).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, Some(original));
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        save_config(&path, &ConfigFile::default()).unwrap();

        let meta = fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn missing_file_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert_eq!(load_config(&tmp.path().join("absent.toml")).unwrap(), None);
    }
}
