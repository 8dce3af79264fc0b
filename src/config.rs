use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub news: NewsConfig,
  /// Custom title for the header (defaults to the configured source)
  pub title: Option<String>,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
  /// Upstream source identifier, e.g. "bbc-news"
  pub source: String,
  /// Base URL of the headlines API
  #[serde(default = "default_base_url")]
  pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How long fetched headlines stay valid
  #[serde(default = "default_ttl_minutes")]
  pub ttl_minutes: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_minutes: default_ttl_minutes(),
    }
  }
}

fn default_base_url() -> String {
  "https://newsapi.org/v2/".to_string()
}

fn default_ttl_minutes() -> u64 {
  5
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./newsdeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/newsdeck/config.yaml
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
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/newsdeck/config.yaml\n\
                 with at least a news.source entry (e.g. bbc-news)."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("newsdeck.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("newsdeck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the headlines API key from environment variables.
  ///
  /// Checks NEWSDECK_API_KEY first, then NEWS_API_KEY as fallback. The key
  /// is never read from the config file.
  pub fn get_api_key() -> Result<String> {
    std::env::var("NEWSDECK_API_KEY")
      .or_else(|_| std::env::var("NEWS_API_KEY"))
      .map_err(|_| {
        eyre!("News API key not found. Set NEWSDECK_API_KEY or NEWS_API_KEY environment variable.")
      })
  }
}
