//! CLI configuration

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Top-level CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Backend connection settings
    pub api: ApiSettings,

    /// Directory holding the persisted session
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Log level filter used when `RUST_LOG` is unset
    pub log_level: String,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Backend origin, e.g. `https://api.qvick.example`
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Serialize concurrent token refreshes
    pub coalesce_refresh: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            state_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 10,
            coalesce_refresh: true,
        }
    }
}

impl ApiSettings {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and `QVICK_*` variables
    ///
    /// Nested keys use `__` in variable names, e.g. `QVICK_API__BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value has the wrong type
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("api.coalesce_refresh", defaults.api.coalesce_refresh)?
            .set_default("log_level", defaults.log_level)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("QVICK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Resolved state directory
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }

        if let Some(project_dirs) = ProjectDirs::from("com", "Qvick", "qvick") {
            project_dirs.data_dir().to_path_buf()
        } else {
            warn!("Failed to determine platform-specific directories, using ./.qvick");
            PathBuf::from("./.qvick")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Serializes tests that read or write QVICK_* variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api.base_url, "http://localhost:8080");
        assert_eq!(settings.api.timeout(), Duration::from_secs(10));
        assert!(settings.api.coalesce_refresh);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let file = toml_file(
            r#"
state_dir = "/var/lib/qvick"

[api]
base_url = "https://api.qvick.example"
coalesce_refresh = false
"#,
        );

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.api.base_url, "https://api.qvick.example");
        assert!(!settings.api.coalesce_refresh);
        assert_eq!(settings.api.timeout_secs, 10);
        assert_eq!(settings.state_dir(), PathBuf::from("/var/lib/qvick"));
    }

    #[test]
    fn test_env_overrides_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let file = toml_file(
            r#"
[api]
base_url = "https://api.qvick.example"
timeout_secs = 30
"#,
        );

        // SAFETY: ENV_LOCK keeps other tests in this module from touching the environment
        unsafe {
            std::env::set_var("QVICK_API__BASE_URL", "https://staging.qvick.example");
            std::env::set_var("QVICK_API__TIMEOUT_SECS", "5");
        }
        let result = Settings::load(Some(file.path()));
        unsafe {
            std::env::remove_var("QVICK_API__BASE_URL");
            std::env::remove_var("QVICK_API__TIMEOUT_SECS");
        }

        let settings = result.unwrap();
        assert_eq!(settings.api.base_url, "https://staging.qvick.example");
        assert_eq!(settings.api.timeout(), Duration::from_secs(5));
        assert!(settings.api.coalesce_refresh);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/qvick.toml")));
        assert!(result.is_err());
    }
}
