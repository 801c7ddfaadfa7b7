//! Watch-list configuration loading.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::WatchConfig;

const ENV_PATH: &str = "PROMO_WATCHLIST_PATH";

/// Load the watch configuration from an explicit path. Supports TOML or JSON formats.
pub fn load_watch_config_from(path: &Path) -> Result<WatchConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading watch list from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_watch_config(&content, ext.as_str())
        .with_context(|| format!("parsing watch list {}", path.display()))
}

/// Load the watch configuration using env var + fallbacks:
/// 1) $PROMO_WATCHLIST_PATH
/// 2) config/watchlist.toml
/// 3) config/watchlist.json
///
/// Nothing found means nobody watches anything.
pub fn load_watch_config_default() -> Result<WatchConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_watch_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/watchlist.toml");
    if toml_p.exists() {
        return load_watch_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/watchlist.json");
    if json_p.exists() {
        return load_watch_config_from(&json_p);
    }
    Ok(WatchConfig::default())
}

fn parse_watch_config(s: &str, hint_ext: &str) -> Result<WatchConfig> {
    let trimmed = s.trim_start();
    let looks_json = hint_ext == "json" || trimmed.starts_with('{');
    if looks_json {
        return serde_json::from_str(s).context("watch list is not valid JSON");
    }
    toml::from_str(s).context("watch list is not valid TOML")
}
