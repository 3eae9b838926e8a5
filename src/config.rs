use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Backend used when neither the CLI, the environment nor the config file names one.
pub const DEFAULT_BACKEND_URL: &str = "https://app-crm-academy-back.onrender.com/api";

/// Environment variable selecting the backend origin.
pub const BACKEND_URL_ENV: &str = "GYMCRM_BACKEND_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  /// Backend base URL, including the `/api` prefix
  pub backend_url: Option<String>,
  /// Custom title for header (defaults to "GymCRM")
  pub title: Option<String>,
  /// Write diagnostics to this file (no logging when unset)
  pub log_file: Option<PathBuf>,
  #[serde(default)]
  pub cache: CacheConfig,
  /// UI tick rate; also bounds how quickly fetch results show up
  pub tick_millis: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Minutes an unobserved cache entry is kept before it is dropped
  #[serde(default = "default_gc_minutes")]
  pub gc_minutes: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      gc_minutes: default_gc_minutes(),
    }
  }
}

fn default_gc_minutes() -> u64 {
  5
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./gymcrm.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/gymcrm/config.yaml
  ///
  /// A missing file is not an error; every setting has a default.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("gymcrm.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("gymcrm").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty YAML document deserializes as null
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Resolve the backend URL once at startup.
  ///
  /// CLI flag, then `GYMCRM_BACKEND_URL`, then the config file, then the
  /// hardcoded default.
  pub fn resolve_backend_url(&self, cli: Option<&str>) -> String {
    let env = std::env::var(BACKEND_URL_ENV).ok();
    pick_backend_url(cli, env.as_deref(), self.backend_url.as_deref())
  }

  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("GymCRM")
  }

  pub fn gc_time(&self) -> Duration {
    Duration::from_secs(self.cache.gc_minutes * 60)
  }

  pub fn tick_rate(&self) -> Duration {
    Duration::from_millis(self.tick_millis.unwrap_or(250))
  }
}

fn pick_backend_url(cli: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
  [cli, env, file]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|s| !s.is_empty())
    .unwrap_or(DEFAULT_BACKEND_URL)
    .to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_full_config() {
    let config = Config::parse(
      r#"
backend_url: http://localhost:8000/api
title: Academia Central
log_file: /tmp/gymcrm.log
cache:
  gc_minutes: 10
tick_millis: 100
"#,
    )
    .unwrap();

    assert_eq!(config.backend_url.as_deref(), Some("http://localhost:8000/api"));
    assert_eq!(config.title(), "Academia Central");
    assert_eq!(config.gc_time(), Duration::from_secs(600));
    assert_eq!(config.tick_rate(), Duration::from_millis(100));
  }

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.title(), "GymCRM");
    assert_eq!(config.gc_time(), Duration::from_secs(300));
    assert_eq!(config.tick_rate(), Duration::from_millis(250));
  }

  #[test]
  fn test_backend_url_precedence() {
    assert_eq!(
      pick_backend_url(Some("http://cli"), Some("http://env"), Some("http://file")),
      "http://cli"
    );
    assert_eq!(
      pick_backend_url(None, Some("http://env"), Some("http://file")),
      "http://env"
    );
    assert_eq!(pick_backend_url(None, Some(" "), Some("http://file")), "http://file");
    assert_eq!(pick_backend_url(None, None, None), DEFAULT_BACKEND_URL);
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/gymcrm.yaml"))).is_err());
  }
}
