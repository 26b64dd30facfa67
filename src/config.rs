use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable overriding `api.base_url`
pub const BASE_URL_ENV: &str = "EXEMPLAR_API_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL the collection endpoints hang off (e.g. "https://host/api")
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Per-request timeout in seconds
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
  DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

impl ApiConfig {
  /// Parse `base_url`, normalizing it to end in `/` so endpoints join under it.
  pub fn parsed_base_url(&self) -> Result<Url> {
    let mut url = Url::parse(&self.base_url)
      .map_err(|e| eyre!("Invalid API base URL '{}': {}", self.base_url, e))?;

    if !matches!(url.scheme(), "http" | "https") {
      return Err(eyre!(
        "API base URL must be http or https, got '{}'",
        self.base_url
      ));
    }

    if !url.path().ends_with('/') {
      let path = format!("{}/", url.path());
      url.set_path(&path);
    }

    Ok(url)
  }
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./exemplar.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/exemplar/config.yaml
  ///
  /// Missing files are fine: the defaults point at a local dev server.
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

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("exemplar.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("exemplar").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file deserializes to null
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents)
  }

  fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.is_empty()) {
      self.api.base_url = url;
    }
    self
  }

  /// Title for the header bar: configured title, else the API host
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    Url::parse(&self.api.base_url)
      .ok()
      .and_then(|u| {
        u.host_str().map(|h| match u.port() {
          Some(port) => format!("{}:{}", h, port),
          None => h.to_string(),
        })
      })
      .unwrap_or_else(|| self.api.base_url.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config.api.base_url, "http://localhost:3000/api");
    assert_eq!(config.api.timeout_secs, 30);
    assert!(config.title.is_none());
  }

  #[test]
  fn test_parse_yaml() {
    let config = Config::from_yaml(
      "title: Staging\napi:\n  base_url: https://example.com/v1\n  timeout_secs: 5\n",
    )
    .unwrap();
    assert_eq!(config.title.as_deref(), Some("Staging"));
    assert_eq!(config.api.base_url, "https://example.com/v1");
    assert_eq!(config.api.timeout_secs, 5);
  }

  #[test]
  fn test_env_override_base_url() {
    let config = Config::default().with_env_overrides(|name| {
      (name == BASE_URL_ENV).then(|| "https://override.test/api".to_string())
    });
    assert_eq!(config.api.base_url, "https://override.test/api");

    let config = Config::default().with_env_overrides(|_| Some(String::new()));
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
  }

  #[test]
  fn test_base_url_gets_trailing_slash() {
    let api = ApiConfig {
      base_url: "http://localhost:3000/api".to_string(),
      ..ApiConfig::default()
    };
    let url = api.parsed_base_url().unwrap();
    assert_eq!(url.as_str(), "http://localhost:3000/api/");
    assert_eq!(
      url.join("examples").unwrap().as_str(),
      "http://localhost:3000/api/examples"
    );
  }

  #[test]
  fn test_base_url_rejects_other_schemes() {
    let api = ApiConfig {
      base_url: "ftp://localhost/api".to_string(),
      ..ApiConfig::default()
    };
    assert!(api.parsed_base_url().is_err());
  }

  #[test]
  fn test_display_title() {
    let mut config = Config::default();
    assert_eq!(config.display_title(), "localhost:3000");

    config.title = Some("Mine".to_string());
    assert_eq!(config.display_title(), "Mine");
  }
}
