// src/config.rs
//! Service configuration.
//!
//! Layered the usual way: compiled defaults, then an optional
//! `config/watch.toml`, then environment overrides. Everything the
//! operator can tune lives here; the per-source extraction rules live in
//! the source catalog instead (see [`crate::source`]).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, WatchError};

pub const ENV_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";
pub const ENV_SOURCES_PATH: &str = "WATCH_SOURCES_PATH";
pub const ENV_STATE_PATH: &str = "WATCH_STATE_PATH";
pub const ENV_BIND_ADDR: &str = "WATCH_BIND_ADDR";
pub const ENV_CHROME_PATH: &str = "WATCH_CHROME_PATH";

const DEFAULT_CONFIG_PATH: &str = "config/watch.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// TOML catalog of monitored sources.
    pub sources_path: PathBuf,
    /// JSON document holding the persisted version mapping.
    pub state_path: PathBuf,
    /// Static dashboard files served at `/`.
    pub public_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// Wall-time budget per adapter per cycle.
    pub adapter_timeout_secs: u64,
    /// UTC hours at which the scheduled cycle fires.
    pub schedule_hours: Vec<u32>,
    /// User agent for fetches; some hosts reject the default one.
    pub user_agent: Option<String>,
    /// Explicit Chrome binary for rendered sources.
    pub chrome_executable: Option<PathBuf>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            sources_path: PathBuf::from("config/sources.toml"),
            state_path: PathBuf::from("website_versions.json"),
            public_dir: PathBuf::from("public"),
            bind_addr: "0.0.0.0:3000".parse().expect("valid default bind addr"),
            adapter_timeout_secs: 60,
            schedule_hours: vec![0, 12],
            user_agent: None,
            chrome_executable: None,
        }
    }
}

impl WatchConfig {
    /// Load configuration: `$WATCH_CONFIG_PATH` or `config/watch.toml` if
    /// present, defaults otherwise, then environment overrides on top.
    pub fn load() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut cfg = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WatchError::config(format!("reading config from {}: {e}", path.display()))
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
            self.sources_path = PathBuf::from(p);
        }
        if let Ok(p) = std::env::var(ENV_STATE_PATH) {
            self.state_path = PathBuf::from(p);
        }
        if let Ok(addr) = std::env::var(ENV_BIND_ADDR) {
            self.bind_addr = addr
                .parse()
                .map_err(|e| WatchError::config(format!("{ENV_BIND_ADDR}={addr}: {e}")))?;
        }
        if let Ok(p) = std::env::var(ENV_CHROME_PATH) {
            self.chrome_executable = Some(PathBuf::from(p));
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.schedule_hours.is_empty() {
            return Err(WatchError::config("schedule_hours must not be empty"));
        }
        if let Some(h) = self.schedule_hours.iter().find(|h| **h > 23) {
            return Err(WatchError::config(format!("schedule hour {h} out of range")));
        }
        if self.adapter_timeout_secs == 0 {
            return Err(WatchError::config("adapter_timeout_secs must be positive"));
        }
        Ok(())
    }

    pub fn adapter_settings(&self) -> crate::adapter::AdapterSettings {
        let defaults = crate::adapter::AdapterSettings::default();
        crate::adapter::AdapterSettings {
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            timeout: std::time::Duration::from_secs(self.adapter_timeout_secs),
            chrome_executable: self.chrome_executable.clone(),
        }
    }

    pub fn schedule_cfg(&self) -> crate::scheduler::ScheduleCfg {
        crate::scheduler::ScheduleCfg {
            hours: self.schedule_hours.clone(),
            adapter_timeout: std::time::Duration::from_secs(self.adapter_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = WatchConfig::default();
        assert_eq!(cfg.schedule_hours, vec![0, 12]);
        assert_eq!(cfg.bind_addr.port(), 3000);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.toml");
        std::fs::write(&path, r#"adapter_timeout_secs = 30"#).unwrap();
        let cfg = WatchConfig::from_file(&path).unwrap();
        assert_eq!(cfg.adapter_timeout_secs, 30);
        assert_eq!(cfg.schedule_hours, vec![0, 12]);
    }

    #[test]
    fn out_of_range_hour_rejected() {
        let cfg = WatchConfig {
            schedule_hours: vec![0, 24],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_take_precedence() {
        std::env::set_var(ENV_STATE_PATH, "/tmp/other-state.json");
        std::env::set_var(ENV_BIND_ADDR, "127.0.0.1:8080");
        let mut cfg = WatchConfig::default();
        cfg.apply_env_overrides().unwrap();
        assert_eq!(cfg.state_path, PathBuf::from("/tmp/other-state.json"));
        assert_eq!(cfg.bind_addr.port(), 8080);
        std::env::remove_var(ENV_STATE_PATH);
        std::env::remove_var(ENV_BIND_ADDR);
    }
}
