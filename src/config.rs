//! Layered configuration for the CLI.
//!
//! Settings resolve in order: built-in defaults, then the config file at
//! `~/.config/cvtailor/config.toml`, then `CVTAILOR_*` environment
//! variables, then CLI flags. Later layers win.
//!
//! # Configuration File Format
//!
//! ```toml
//! api_url = "http://localhost:8000"
//! timeout_secs = 30
//! user_id = "cli"
//! ```

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Contents of `config.toml`. Every field has a default so a missing or
/// partial file is never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Base URL of the backend API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Identity sent with profile comparison requests
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_id() -> String {
    "cli".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            user_id: default_user_id(),
        }
    }
}

impl ConfigFile {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config.toml")
    }

    /// Load configuration from `config.toml` in the given directory.
    /// Returns the defaults if the file does not exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Resolve the configuration directory.
///
/// `CVTAILOR_CONFIG_DIR` overrides the platform default of
/// `<config dir>/cvtailor` (e.g. `~/.config/cvtailor` on Linux).
pub fn default_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CVTAILOR_CONFIG_DIR")
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::config_dir().context("Could not determine a configuration directory")?;
    Ok(base.join("cvtailor"))
}

/// Runtime configuration combining the config file with environment
/// variables and CLI flags.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding config.toml, credentials, and the pipeline snapshot
    pub config_dir: PathBuf,
    /// Parsed config.toml contents
    pub file: ConfigFile,
    /// CLI override: verbose logging
    pub verbose: bool,
    /// CLI override: machine-readable JSON output
    pub json: bool,
    /// CLI override for the API base URL (if specified)
    pub cli_api_url: Option<String>,
}

impl Config {
    /// Load from the default configuration directory.
    pub fn load() -> Result<Self> {
        Self::from_dir(default_config_dir()?)
    }

    /// Load from an explicit configuration directory.
    pub fn from_dir(config_dir: PathBuf) -> Result<Self> {
        let file = ConfigFile::load_or_default(&config_dir)?;
        Ok(Self {
            config_dir,
            file,
            verbose: false,
            json: false,
            cli_api_url: None,
        })
    }

    /// Load with CLI overrides applied.
    pub fn with_cli_args(api_url: Option<String>, verbose: bool, json: bool) -> Result<Self> {
        let mut config = Self::load()?;
        config.cli_api_url = api_url;
        config.verbose = verbose;
        config.json = json;
        Ok(config)
    }

    /// Get the API base URL (CLI → env → file).
    pub fn api_url(&self) -> String {
        if let Some(ref url) = self.cli_api_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var("CVTAILOR_API_URL")
            && !url.is_empty()
        {
            return url;
        }
        self.file.api_url.clone()
    }

    /// Get the request timeout (env can override file).
    pub fn timeout(&self) -> Duration {
        let secs = std::env::var("CVTAILOR_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(self.file.timeout_secs);
        Duration::from_secs(secs)
    }

    /// Get the comparison identity (env can override file).
    pub fn user_id(&self) -> String {
        if let Ok(user_id) = std::env::var("CVTAILOR_USER_ID")
            && !user_id.is_empty()
        {
            return user_id;
        }
        self.file.user_id.clone()
    }

    /// Get path to config.toml.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Get path to the persisted auth token.
    pub fn credentials_path(&self) -> PathBuf {
        self.config_dir.join("credentials")
    }

    /// Get path to the pipeline snapshot.
    pub fn pipeline_cache_path(&self) -> PathBuf {
        self.config_dir.join("pipeline.json")
    }

    /// Validate the resolved configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let api_url = self.api_url();
        match Url::parse(&api_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => warnings.push(format!(
                "api_url '{}' uses scheme '{}'; expected http or https",
                api_url,
                url.scheme()
            )),
            Err(e) => warnings.push(format!("api_url '{}' is not a valid URL: {}", api_url, e)),
        }

        if self.timeout().is_zero() {
            warnings.push("timeout_secs is 0; every request will time out immediately".to_string());
        }

        if self.user_id().trim().is_empty() {
            warnings.push("user_id is empty; comparison requests will be anonymous".to_string());
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn config_in(dir: &Path) -> Config {
        Config::from_dir(dir.to_path_buf()).unwrap()
    }

    /// Clears every CVTAILOR_* variable so a test sees only the file layer.
    /// Callers must hold ENV_MUTEX.
    fn clear_cvtailor_env() {
        for key in [
            "CVTAILOR_API_URL",
            "CVTAILOR_TIMEOUT_SECS",
            "CVTAILOR_USER_ID",
            "CVTAILOR_CONFIG_DIR",
        ] {
            unsafe { std::env::remove_var(key) };
        }
    }

    // =========================================
    // ConfigFile parsing tests
    // =========================================

    #[test]
    fn test_parse_empty_uses_defaults() {
        let file = ConfigFile::parse("").unwrap();
        assert_eq!(file.api_url, "http://localhost:8000");
        assert_eq!(file.timeout_secs, 30);
        assert_eq!(file.user_id, "cli");
    }

    #[test]
    fn test_parse_full() {
        let content = r#"
api_url = "https://cv.example.com"
timeout_secs = 5
user_id = "jane"
"#;
        let file = ConfigFile::parse(content).unwrap();
        assert_eq!(file.api_url, "https://cv.example.com");
        assert_eq!(file.timeout_secs, 5);
        assert_eq!(file.user_id, "jane");
    }

    #[test]
    fn test_parse_partial_keeps_other_defaults() {
        let file = ConfigFile::parse("timeout_secs = 60").unwrap();
        assert_eq!(file.timeout_secs, 60);
        assert_eq!(file.api_url, "http://localhost:8000");
        assert_eq!(file.user_id, "cli");
    }

    #[test]
    fn test_parse_rejects_invalid_toml() {
        assert!(ConfigFile::parse("api_url = [not a string").is_err());
    }

    // =========================================
    // File I/O tests
    // =========================================

    #[test]
    fn test_load_and_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut file = ConfigFile::default();
        file.api_url = "http://127.0.0.1:9999".to_string();
        file.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.api_url, "http://127.0.0.1:9999");
        assert_eq!(loaded.timeout_secs, 30);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let file = ConfigFile::load_or_default(dir.path()).unwrap();
        assert_eq!(file.api_url, "http://localhost:8000");
    }

    #[test]
    fn test_load_or_default_with_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "user_id = \"alfred\"").unwrap();

        let file = ConfigFile::load_or_default(dir.path()).unwrap();
        assert_eq!(file.user_id, "alfred");
    }

    // =========================================
    // Layering tests
    // =========================================

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var("CVTAILOR_API_URL").ok();

        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "api_url = \"http://from-file:8000\"",
        )
        .unwrap();
        let config = config_in(dir.path());

        unsafe { std::env::remove_var("CVTAILOR_API_URL") };
        assert_eq!(config.api_url(), "http://from-file:8000");

        unsafe { std::env::set_var("CVTAILOR_API_URL", "http://from-env:8000") };
        assert_eq!(config.api_url(), "http://from-env:8000");

        match saved {
            Some(val) => unsafe { std::env::set_var("CVTAILOR_API_URL", val) },
            None => unsafe { std::env::remove_var("CVTAILOR_API_URL") },
        }
    }

    #[test]
    fn test_cli_overrides_env_and_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var("CVTAILOR_API_URL").ok();
        unsafe { std::env::set_var("CVTAILOR_API_URL", "http://from-env:8000") };

        let dir = tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.cli_api_url = Some("http://from-cli:8000".to_string());
        assert_eq!(config.api_url(), "http://from-cli:8000");

        match saved {
            Some(val) => unsafe { std::env::set_var("CVTAILOR_API_URL", val) },
            None => unsafe { std::env::remove_var("CVTAILOR_API_URL") },
        }
    }

    #[test]
    fn test_timeout_env_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var("CVTAILOR_TIMEOUT_SECS").ok();

        let dir = tempdir().unwrap();
        let config = config_in(dir.path());

        unsafe { std::env::remove_var("CVTAILOR_TIMEOUT_SECS") };
        assert_eq!(config.timeout(), Duration::from_secs(30));

        unsafe { std::env::set_var("CVTAILOR_TIMEOUT_SECS", "7") };
        assert_eq!(config.timeout(), Duration::from_secs(7));

        // Garbage falls back to the file value
        unsafe { std::env::set_var("CVTAILOR_TIMEOUT_SECS", "soon") };
        assert_eq!(config.timeout(), Duration::from_secs(30));

        match saved {
            Some(val) => unsafe { std::env::set_var("CVTAILOR_TIMEOUT_SECS", val) },
            None => unsafe { std::env::remove_var("CVTAILOR_TIMEOUT_SECS") },
        }
    }

    // =========================================
    // Path tests
    // =========================================

    #[test]
    fn test_config_paths() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());

        assert!(config.config_path().ends_with("config.toml"));
        assert!(config.credentials_path().ends_with("credentials"));
        assert!(config.pipeline_cache_path().ends_with("pipeline.json"));
    }

    #[test]
    fn test_default_config_dir_env_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var("CVTAILOR_CONFIG_DIR").ok();

        unsafe { std::env::set_var("CVTAILOR_CONFIG_DIR", "/tmp/cvtailor-test") };
        assert_eq!(
            default_config_dir().unwrap(),
            PathBuf::from("/tmp/cvtailor-test")
        );

        match saved {
            Some(val) => unsafe { std::env::set_var("CVTAILOR_CONFIG_DIR", val) },
            None => unsafe { std::env::remove_var("CVTAILOR_CONFIG_DIR") },
        }
    }

    // =========================================
    // Validation tests
    // =========================================

    #[test]
    fn test_validate_default_is_clean() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_cvtailor_env();
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_flags_bad_url_and_zero_timeout() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_cvtailor_env();
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "api_url = \"not a url\"\ntimeout_secs = 0\n",
        )
        .unwrap();
        let config = config_in(dir.path());

        let warnings = config.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("not a valid URL"));
        assert!(warnings[1].contains("timeout_secs"));
    }

    #[test]
    fn test_validate_flags_non_http_scheme() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_cvtailor_env();
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "api_url = \"ftp://example.com\"",
        )
        .unwrap();
        let config = config_in(dir.path());

        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("expected http or https"));
    }
}
