//! Configuration loading.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. `<config_dir>/pomodoro-flow/config.toml` (or the `--config` path)
//! 3. `POMODORO_DEBUG`
//! 4. Command-line flags, applied by the binary

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pomodoro::Settings;
use crate::session::{AutoStart, SessionOptions};
use crate::theme::{Theme, Variant};

pub const DEBUG_ENV: &str = "POMODORO_DEBUG";
pub const DEFAULT_ADDR: &str = "127.0.0.1:8765";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub variant: Variant,
    /// Overrides the variant's starting theme.
    pub theme: Option<Theme>,
    pub debug: bool,
    /// Overrides the variant's auto-start policy; 0 disables it.
    pub auto_start_delay_ms: Option<u64>,
    pub settings: Settings,
    pub notifications: NotificationConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            theme: None,
            debug: false,
            auto_start_delay_ms: None,
            settings: Settings::default(),
            notifications: NotificationConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub desktop: bool,
    pub bell: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            desktop: true,
            bell: true,
            log_file: get_data_dir().map(|dir| dir.join("activity.log")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => config_path(),
        };

        let config = match path {
            Some(ref p) if p.is_file() => {
                log::debug!("Loading config from {}", p.display());
                Self::from_file(p)?
            }
            Some(ref p) => {
                log::debug!("No config at {}, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };

        let config = config.with_debug_env(std::env::var(DEBUG_ENV).ok().as_deref());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply the debug environment flag. Accepts `1` or `true`.
    pub fn with_debug_env(mut self, value: Option<&str>) -> Self {
        if let Some(v) = value {
            if is_truthy(v) {
                self.debug = true;
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        self.listen_addr()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .addr
            .parse()
            .map_err(|_| Error::InvalidAddr(self.server.addr.clone()))
    }

    pub fn auto_start(&self) -> AutoStart {
        match self.auto_start_delay_ms {
            Some(0) => AutoStart::Disabled,
            Some(ms) => AutoStart::After(Duration::from_millis(ms)),
            None => self.variant.auto_start(),
        }
    }

    pub fn initial_theme(&self) -> Theme {
        self.theme.unwrap_or_else(|| self.variant.default_theme())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            auto_start: self.auto_start(),
            debug: self.debug,
            ..SessionOptions::default()
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true")
}

/// Default config file location.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pomodoro-flow").join("config.toml"))
}

/// Local data directory, used for the activity log.
pub fn get_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("pomodoro-flow"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.variant, Variant::Flow);
        assert_eq!(config.initial_theme(), Theme::Minimal);
        assert_eq!(config.auto_start(), AutoStart::After(Duration::from_millis(300)));
        assert_eq!(config.listen_addr().unwrap().port(), 8765);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
variant = "lofi"
theme = "ocean"

[settings]
focus_minutes = 50
sessions_per_cycle = 2

[notifications]
desktop = false
log_file = "/tmp/pomodoro.log"

[server]
addr = "0.0.0.0:9000"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.variant, Variant::Lofi);
        assert_eq!(config.initial_theme(), Theme::Ocean);
        assert_eq!(config.auto_start(), AutoStart::Disabled);
        assert_eq!(config.settings.focus_minutes, 50.0);
        assert_eq!(config.settings.short_break_minutes, 5.0);
        assert_eq!(config.settings.sessions_per_cycle, 2);
        assert!(!config.notifications.desktop);
        assert!(config.notifications.bell);
        assert_eq!(
            config.notifications.log_file,
            Some(PathBuf::from("/tmp/pomodoro.log"))
        );
        assert_eq!(config.listen_addr().unwrap().port(), 9000);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[settings]\nshort_break_minutes = 0\n").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::InvalidSettings(_)));
    }

    #[test]
    fn test_malformed_toml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "variant = [").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_debug_env_values() {
        assert!(Config::default().with_debug_env(Some("1")).debug);
        assert!(Config::default().with_debug_env(Some("TRUE")).debug);
        assert!(!Config::default().with_debug_env(Some("0")).debug);
        assert!(!Config::default().with_debug_env(None).debug);
    }

    #[test]
    fn test_explicit_auto_start_delay() {
        let config = Config {
            variant: Variant::Lofi,
            auto_start_delay_ms: Some(1000),
            ..Config::default()
        };
        assert_eq!(config.auto_start(), AutoStart::After(Duration::from_secs(1)));

        let disabled = Config {
            auto_start_delay_ms: Some(0),
            ..Config::default()
        };
        assert_eq!(disabled.auto_start(), AutoStart::Disabled);
    }
}
