//! Configuration and on-disk paths for revu.
//!
//! Everything lives under one directory: `$XDG_CONFIG_HOME/revu/` (falling
//! back to `~/.config/revu/`). `config.toml` holds user settings, `auth.json`
//! holds the stored sign-in token, and `revu.log` receives tracing output
//! while the terminal is owned by the UI.
//!
//! Config errors are soft failures: a missing or unparsable file yields the
//! defaults plus a warning on stderr (config is read before the terminal is
//! initialised, so stderr is still visible).

use std::path::PathBuf;

use serde::Deserialize;

/// Backend base URL used when the config file does not set one. Matches the
/// platform's local development gateway.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/api";

/// User settings from `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL, e.g. `https://review.example.com/api`.
    pub server_url: Option<String>,
    /// Theme name, e.g. `"dark"` or `"catppuccin-mocha"`.
    pub theme: Option<String>,
}

impl Config {
    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn theme_name(&self) -> &str {
        self.theme.as_deref().unwrap_or("catppuccin-mocha")
    }
}

/// Returns the revu config directory.
///
/// Prefers `$XDG_CONFIG_HOME/revu`; falls back to `~/.config/revu` when the
/// env var is absent.
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("revu")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn auth_path() -> PathBuf {
    config_dir().join("auth.json")
}

/// Loads `config.toml`, treating all failures as soft.
pub fn load() -> Config {
    let path = config_path();
    let raw = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(_) => return Config::default(),
    };
    match toml::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("revu: config parse error in {:?}: {}", path, e);
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_absent() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server_url(), DEFAULT_SERVER_URL);
        assert_eq!(config.theme_name(), "catppuccin-mocha");
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let config: Config = toml::from_str(
            "server_url = \"https://review.example.com/api\"\ntheme = \"dark\"\n",
        )
        .unwrap();
        assert_eq!(config.server_url(), "https://review.example.com/api");
        assert_eq!(config.theme_name(), "dark");
    }
}
