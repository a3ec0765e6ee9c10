//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/medialist/config.toml)
//! 3. Environment variables (MEDIALIST_* prefix)
//!
//! Environment variables take precedence over config file values.
//! Only [`crate::Store`] reads configuration; the stores themselves are
//! handed resolved paths and pool handles.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::MediaKind;
use crate::storage::file::DEFAULT_DELIMITER;

/// Environment variable prefix
const ENV_PREFIX: &str = "MEDIALIST";

/// Persistence strategy, chosen once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Transient, lost on exit
    Memory,
    /// Delimited flat files in `data_dir`
    #[default]
    File,
    /// SQLite database in `data_dir`
    Sqlite,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Memory => "memory",
            Backend::File => "file",
            Backend::Sqlite => "sqlite",
        })
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Backend::Memory),
            "file" | "csv" => Ok(Backend::File),
            "sqlite" | "db" => Ok(Backend::Sqlite),
            other => bail!(
                "Unknown backend '{}'. Valid backends: memory, file, sqlite",
                other
            ),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (flat files or SQLite db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Which backend to open
    #[serde(default)]
    pub backend: Backend,

    /// Field delimiter for flat files
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Maximum SQLite pool connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Log file path (defaults to stderr when logging is enabled)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: Backend::default(),
            delimiter: default_delimiter(),
            pool_size: default_pool_size(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MEDIALIST_DATA_DIR, MEDIALIST_BACKEND, MEDIALIST_DELIMITER)
    /// 2. Config file (~/.config/medialist/config.toml or MEDIALIST_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // MEDIALIST_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // MEDIALIST_BACKEND
        if let Ok(val) = std::env::var(format!("{}_BACKEND", ENV_PREFIX)) {
            self.backend = val
                .parse()
                .with_context(|| format!("Invalid {}_BACKEND", ENV_PREFIX))?;
        }

        // MEDIALIST_DELIMITER
        if let Ok(val) = std::env::var(format!("{}_DELIMITER", ENV_PREFIX)) {
            let mut chars = val.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => self.delimiter = c,
                _ => bail!("{}_DELIMITER must be a single character", ENV_PREFIX),
            }
        }

        Ok(())
    }

    /// Reject settings the stores cannot work with
    pub fn validate(&self) -> Result<()> {
        let d = self.delimiter;
        if d.is_ascii_digit() || d == '-' || d == '+' || d.is_whitespace() {
            bail!(
                "Invalid delimiter {:?}: digits, signs and whitespace are part of numeric fields",
                d
            );
        }
        if self.pool_size == 0 {
            bail!("pool_size must be at least 1");
        }
        Ok(())
    }

    /// Ensure data directory exists
    pub fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with MEDIALIST_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("medialist")
            .join("config.toml")
    }

    /// Get the path to the list file
    pub fn lists_path(&self) -> PathBuf {
        self.data_dir.join("lists.csv")
    }

    /// Get the path to the entity file of a kind
    pub fn entity_path(&self, kind: MediaKind) -> PathBuf {
        self.data_dir.join(kind.entity_file_name())
    }

    /// Get the path to the membership file of a kind
    pub fn membership_path(&self, kind: MediaKind) -> PathBuf {
        self.data_dir.join(kind.membership_file_name())
    }

    /// Get the path to the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("medialist.db")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medialist")
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

fn default_pool_size() -> u32 {
    4
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "MEDIALIST_DATA_DIR",
        "MEDIALIST_BACKEND",
        "MEDIALIST_DELIMITER",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.pool_size, 4);
        assert!(config.data_dir.ends_with("medialist"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();

        assert!(config.lists_path().ends_with("lists.csv"));
        assert!(config.entity_path(MediaKind::Movie).ends_with("movies.csv"));
        assert!(config
            .membership_path(MediaKind::Anime)
            .ends_with("list_anime.csv"));
        assert!(config.sqlite_path().ends_with("medialist.db"));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("memory".parse::<Backend>().unwrap(), Backend::Memory);
        assert_eq!("FILE".parse::<Backend>().unwrap(), Backend::File);
        assert_eq!("sqlite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert!("postgres".parse::<Backend>().is_err());
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("MEDIALIST_DATA_DIR", "/tmp/medialist-test");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/medialist-test"));
    }

    #[test]
    fn test_env_override_backend() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("MEDIALIST_BACKEND", "sqlite");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.backend, Backend::Sqlite);

        env::set_var("MEDIALIST_BACKEND", "nonsense");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_env_override_delimiter() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("MEDIALIST_DELIMITER", ";");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.delimiter, ';');

        env::set_var("MEDIALIST_DELIMITER", ";;");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_validate_rejects_numeric_delimiters() {
        let mut config = Config::default();
        for bad in ['1', '-', ' ', '\t'] {
            config.delimiter = bad;
            assert!(config.validate().is_err(), "{:?} accepted", bad);
        }
        config.delimiter = '|';
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/medialist"),
            backend: Backend::Sqlite,
            delimiter: ';',
            pool_size: 8,
            log_file: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("backend = \"sqlite\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.backend, config.backend);
        assert_eq!(parsed.delimiter, config.delimiter);
        assert_eq!(parsed.pool_size, config.pool_size);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            backend = "memory"
            delimiter = "|"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.delimiter, '|');
        assert_eq!(config.pool_size, 4);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.backend, Backend::File);
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("conf").join("config.toml");

        let mut config = Config::default();
        config.backend = Backend::Sqlite;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.backend, Backend::Sqlite);
    }
}
