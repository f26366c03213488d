use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub ui: UiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_base_url() -> String {
  "http://localhost:4000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
  /// Rows per page for list views
  #[serde(default = "default_page_size")]
  pub page_size: u32,
  /// Search input quiescence before a query is issued
  #[serde(default = "default_debounce_ms")]
  pub debounce_ms: u64,
  /// Refetch visible lists periodically; 0 disables
  #[serde(default)]
  pub refresh_interval_secs: u64,
}

impl Default for UiConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
      debounce_ms: default_debounce_ms(),
      refresh_interval_secs: 0,
    }
  }
}

fn default_page_size() -> u32 {
  10
}

fn default_debounce_ms() -> u64 {
  300
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How long a cached page is served without refetching
  #[serde(default = "default_stale_secs")]
  pub stale_secs: u64,
  /// How long an unobserved entry survives before eviction
  #[serde(default = "default_gc_secs")]
  pub gc_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_secs: default_stale_secs(),
      gc_secs: default_gc_secs(),
    }
  }
}

fn default_stale_secs() -> u64 {
  60
}

fn default_gc_secs() -> u64 {
  300
}

impl UiConfig {
  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }

  pub fn refresh_interval(&self) -> Option<Duration> {
    (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./madmin.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/madmin/config.yaml
  ///
  /// Without a file the defaults are used. The base URL is overridden by
  /// `api_url` (the command line), else by `MADMIN_API_URL`, and validated
  /// after the override.
  pub fn load(explicit_path: Option<&Path>, api_url: Option<String>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Some(url) = api_url.or_else(|| std::env::var("MADMIN_API_URL").ok()) {
      config.api.base_url = url;
    }

    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("madmin.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("madmin").join("config.yaml");
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
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    url::Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url '{}': {}", self.api.base_url, e))?;
    if self.ui.page_size == 0 {
      return Err(eyre!("ui.page_size must be at least 1"));
    }
    Ok(())
  }

  /// Get the identity provider's publishable key.
  ///
  /// The console refuses to start without it.
  pub fn get_publishable_key() -> Result<String> {
    std::env::var("MADMIN_PUBLISHABLE_KEY")
      .ok()
      .filter(|k| !k.trim().is_empty())
      .ok_or_else(|| eyre!("Missing publishable key. Set MADMIN_PUBLISHABLE_KEY."))
  }

  /// Get the bearer token issued by the identity provider.
  ///
  /// Optional: unauthenticated calls are still attempted without it.
  pub fn get_auth_token() -> Option<String> {
    std::env::var("MADMIN_AUTH_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_partial_config_uses_defaults() {
    let config = Config::parse("api:\n  base_url: https://api.mentoons.com/api/v1\n").unwrap();
    assert_eq!(config.api.base_url, "https://api.mentoons.com/api/v1");
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.ui.page_size, 10);
    assert_eq!(config.ui.debounce(), Duration::from_millis(300));
    assert!(config.ui.refresh_interval().is_none());
    assert_eq!(config.cache.gc_secs, 300);
  }

  #[test]
  fn test_parse_ui_section() {
    let config = Config::parse(
      "title: Staging\nui:\n  page_size: 25\n  debounce_ms: 150\n  refresh_interval_secs: 10\n",
    )
    .unwrap();
    assert_eq!(config.title.as_deref(), Some("Staging"));
    assert_eq!(config.ui.page_size, 25);
    assert_eq!(config.ui.refresh_interval(), Some(Duration::from_secs(10)));
  }

  #[test]
  fn test_validate_rejects_bad_url() {
    let mut config = Config::default();
    config.api.base_url = "not a url".to_string();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_validate_rejects_zero_page_size() {
    let mut config = Config::default();
    config.ui.page_size = 0;
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_load_explicit_missing_file() {
    let result = Config::load(Some(Path::new("/nonexistent/madmin.yaml")), None);
    assert!(result.is_err());
  }

  #[test]
  fn test_load_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("madmin.yaml");
    std::fs::write(&path, "ui:\n  page_size: 5\n").unwrap();
    let config = Config::load(Some(&path), None).unwrap();
    assert_eq!(config.ui.page_size, 5);
  }

  #[test]
  fn test_api_url_override_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("madmin.yaml");
    std::fs::write(&path, "ui:\n  page_size: 5\n").unwrap();

    assert!(Config::load(Some(&path), Some("not a url".to_string())).is_err());

    let config = Config::load(Some(&path), Some("http://admin.local/api".to_string())).unwrap();
    assert_eq!(config.api.base_url, "http://admin.local/api");
  }
}
