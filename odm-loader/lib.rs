//! Locations of odm's configuration and log files, and loading of the
//! configuration itself.

pub mod config;

use std::{
  path::{
    Path,
    PathBuf,
  },
  sync::OnceLock,
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};
use odm_stdx::{
  env::current_working_dir,
  path,
};

const APP_DIR: &str = "odm";

/// Marker directories that make an ancestor the root of a vault.
const VAULT_MARKERS: [&str; 3] = [".odm", ".obsidian", ".git"];

static CONFIG_FILE: OnceLock<PathBuf> = OnceLock::new();

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

pub fn initialize_config_file(specified_file: Option<PathBuf>) {
  let config_file = specified_file.unwrap_or_else(default_config_file);
  ensure_parent_dir(&config_file);
  CONFIG_FILE.set(config_file).ok();
}

pub fn initialize_log_file(specified_file: Option<PathBuf>) {
  let log_file = specified_file.unwrap_or_else(default_log_file);
  ensure_parent_dir(&log_file);
  LOG_FILE.set(log_file).ok();
}

/// User configuration directory, `ODM_CONFIG_DIR` if set.
///
/// Falls back to the system temp directory when no home directory can be
/// determined.
pub fn config_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("ODM_CONFIG_DIR") {
    return path::normalize(dir);
  }
  let mut path = match choose_base_strategy() {
    Ok(strategy) => strategy.config_dir(),
    Err(err) => {
      log::warn!("unable to find the config directory: {err}");
      std::env::temp_dir()
    },
  };
  path.push(APP_DIR);
  path
}

pub fn cache_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("ODM_CACHE_DIR") {
    return path::normalize(dir);
  }
  let mut path = match choose_base_strategy() {
    Ok(strategy) => strategy.cache_dir(),
    Err(err) => {
      log::warn!("unable to find the cache directory: {err}");
      std::env::temp_dir()
    },
  };
  path.push(APP_DIR);
  path
}

pub fn config_file() -> PathBuf {
  CONFIG_FILE
    .get_or_init(|| {
      let path = default_config_file();
      ensure_parent_dir(&path);
      path
    })
    .clone()
}

pub fn log_file() -> PathBuf {
  LOG_FILE
    .get_or_init(|| {
      let path = default_log_file();
      ensure_parent_dir(&path);
      path
    })
    .clone()
}

/// Per-vault overrides, `<vault>/.odm/config.toml`.
pub fn vault_config_file() -> PathBuf {
  find_vault().0.join(".odm").join("config.toml")
}

pub fn default_log_file() -> PathBuf {
  cache_dir().join("odm.log")
}

/// Merge two TOML documents, merging values from `right` onto `left`.
///
/// `merge_depth` sets the nesting depth up to which tables are merged instead
/// of overridden. Arrays are never merged: the right array replaces the left
/// one, so a user `extensions = ["txt"]` drops the built-in `"md"`.
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  match (left, right) {
    (Value::Table(mut left_map), Value::Table(right_map)) => {
      if merge_depth > 0 {
        for (rname, rvalue) in right_map {
          match left_map.remove(&rname) {
            Some(lvalue) => {
              let merged_value = merge_toml_values(lvalue, rvalue, merge_depth - 1);
              left_map.insert(rname, merged_value);
            },
            None => {
              left_map.insert(rname, rvalue);
            },
          }
        }
        Value::Table(left_map)
      } else {
        Value::Table(right_map)
      }
    },
    (_, value) => value,
  }
}

/// Finds the vault containing the current working directory.
///
/// Searches upward for a directory holding `.odm`, `.obsidian` or `.git`.
/// Returns `(vault, false)` when one is found and `(cwd, true)` otherwise.
pub fn find_vault() -> (PathBuf, bool) {
  match current_working_dir() {
    Ok(current_dir) => find_vault_in(current_dir),
    Err(_) => (PathBuf::new(), true),
  }
}

pub fn find_vault_in(dir: impl AsRef<Path>) -> (PathBuf, bool) {
  let dir = dir.as_ref();
  for ancestor in dir.ancestors() {
    if VAULT_MARKERS
      .iter()
      .any(|marker| ancestor.join(marker).exists())
    {
      return (ancestor.to_owned(), false);
    }
  }

  (dir.to_owned(), true)
}

fn default_config_file() -> PathBuf {
  config_dir().join("config.toml")
}

fn ensure_parent_dir(path: &Path) {
  if let Some(parent) = path.parent()
    && !parent.exists()
  {
    std::fs::create_dir_all(parent).ok();
  }
}
