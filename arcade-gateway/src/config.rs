//! Gateway configuration: listener address plus the launcher settings.
//!
//! ```toml
//! listen_addr = "127.0.0.1:3456"
//!
//! [launcher]
//! base_dir = "/srv/arcade/games"
//! timeout_seconds = 120
//! ```

use std::path::Path;

use arcade_launcher::{ConfigError, LauncherConfig};
use serde::Deserialize;

/// Default listener: loopback only.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3456";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub launcher: LauncherConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_owned(),
            launcher: LauncherConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load from the file named by `ARCADE_CONFIG`, if set, then apply
    /// `ARCADE_*` overrides.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file is unreadable or malformed, or
    /// the final values are invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ARCADE_CONFIG").ok().filter(|p| !p.is_empty());
        let text = match &path {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.into(),
                source,
            })?),
            None => None,
        };
        let config = Self::resolve(text.as_deref(), path.as_deref().map(Path::new), |var| {
            std::env::var(var).ok()
        })?;
        tracing::info!(
            config_file = path.as_deref().unwrap_or("<defaults>"),
            base_dir = %config.launcher.base_dir.display(),
            "loaded gateway configuration"
        );
        Ok(config)
    }

    /// Build a config from optional TOML text and an environment lookup.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on parse failure, malformed overrides or
    /// invalid final values.
    pub fn resolve<F>(text: Option<&str>, origin: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match text {
            Some(text) => toml::from_str(text).map_err(|source| ConfigError::Parse {
                path: origin.unwrap_or(Path::new("<inline>")).to_owned(),
                source,
            })?,
            None => Self::default(),
        };
        if let Some(addr) = lookup("ARCADE_LISTEN_ADDR").filter(|v| !v.is_empty()) {
            config.listen_addr = addr;
        }
        config.launcher.apply_overrides(&lookup)?;
        config.launcher.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_listen_on_loopback() {
        let cfg = match GatewayConfig::resolve(None, None, no_env) {
            Ok(c) => c,
            Err(e) => panic!("defaults must resolve: {e}"),
        };
        assert_eq!(cfg.listen_addr, "127.0.0.1:3456");
        assert_eq!(cfg.launcher, LauncherConfig::default());
    }

    #[test]
    fn file_sections_are_applied() {
        let text = "listen_addr = \"0.0.0.0:8080\"\n[launcher]\nbase_dir = \"/srv/games\"\ntimeout_seconds = 9\n";
        let cfg = match GatewayConfig::resolve(Some(text), None, no_env) {
            Ok(c) => c,
            Err(e) => panic!("resolve failed: {e}"),
        };
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.launcher.base_dir, PathBuf::from("/srv/games"));
        assert_eq!(cfg.launcher.timeout_seconds, 9);
    }

    #[test]
    fn env_overrides_beat_the_file() {
        let text = "listen_addr = \"0.0.0.0:8080\"\n";
        let env = |var: &str| match var {
            "ARCADE_LISTEN_ADDR" => Some("127.0.0.1:9000".to_owned()),
            "ARCADE_TIMEOUT_SECONDS" => Some("12".to_owned()),
            _ => None,
        };
        let cfg = match GatewayConfig::resolve(Some(text), None, env) {
            Ok(c) => c,
            Err(e) => panic!("resolve failed: {e}"),
        };
        assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
        assert_eq!(cfg.launcher.timeout_seconds, 12);
    }

    #[test]
    fn invalid_launcher_values_are_rejected() {
        let text = "[launcher]\ntimeout_seconds = 0\n";
        assert!(matches!(
            GatewayConfig::resolve(Some(text), None, no_env),
            Err(ConfigError::Invalid { field: "timeout_seconds", .. })
        ));
    }
}
