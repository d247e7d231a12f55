use std::{
  path::Path,
  str::from_utf8,
};

use anyhow::{
  Context,
  Result,
};
use odm_stdx::fs::WalkOptions;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
  /// Extensions picked up when walking a folder. Empty keeps every file.
  pub extensions:   Vec<String>,
  pub hidden:       bool,
  pub follow_links: bool,
  /// Print edited buffers instead of writing them back.
  pub dry_run:      bool,
}

impl Default for Config {
  fn default() -> Self {
    let walk = WalkOptions::default();
    Self {
      extensions:   walk.extensions,
      hidden:       walk.hidden,
      follow_links: walk.follow_links,
      dry_run:      false,
    }
  }
}

impl Config {
  pub fn walk_options(&self) -> WalkOptions {
    WalkOptions {
      extensions:   self.extensions.clone(),
      hidden:       self.hidden,
      follow_links: self.follow_links,
    }
  }

  /// The built-in defaults merged with the user config file and the vault
  /// config file, later files taking precedence.
  pub fn load() -> Result<Self> {
    Self::load_from(&[crate::config_file(), crate::vault_config_file()])
  }

  /// Like [`Config::load`] with explicit override files. Missing files are
  /// skipped.
  pub fn load_from(files: &[impl AsRef<Path>]) -> Result<Self> {
    let mut merged = default_config()?;
    for file in files {
      let file = file.as_ref();
      let Some(value) = read_config(file)? else {
        continue;
      };
      log::debug!("merging config from {}", file.display());
      merged = crate::merge_toml_values(merged, value, 3);
    }
    merged
      .try_into()
      .context("invalid odm configuration")
  }
}

/// Default built-in config.toml.
pub fn default_config() -> Result<toml::Value> {
  let default_config = include_bytes!("config.toml");
  let config_str =
    from_utf8(default_config).context("built-in config.toml contains invalid UTF-8")?;
  toml::from_str(config_str).context("failed to parse built-in config.toml")
}

fn read_config(file: &Path) -> Result<Option<toml::Value>> {
  let text = match std::fs::read_to_string(file) {
    Ok(text) => text,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
    Err(err) => {
      return Err(err).with_context(|| format!("failed to read {}", file.display()));
    },
  };
  let value = toml::from_str(&text).with_context(|| format!("failed to parse {}", file.display()))?;
  Ok(Some(value))
}
