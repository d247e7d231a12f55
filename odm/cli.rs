use std::path::PathBuf;

use anyhow::{
  Context,
  Result,
};
use clap::{
  ArgAction,
  Parser,
  Subcommand,
};
use odm_lib::{
  Mode,
  Regex,
};

#[derive(Debug)]
pub struct CliOptions {
  pub verbosity:   u8,
  pub log_file:    Option<PathBuf>,
  pub config_file: Option<PathBuf>,
  pub working_dir: Option<PathBuf>,
  pub filter:      Option<Regex>,
  pub dry_run:     bool,
  pub pattern:     Regex,
  pub action:      Action,
  pub paths:       Vec<PathBuf>,
}

/// What to do with the matches of the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Grep,
  Edit { mode: Mode, text: Vec<u8> },
}

impl CliOptions {
  pub fn parse() -> Result<Self> {
    let raw = RawCli::parse();
    raw.try_into()
  }
}

#[derive(Parser, Debug)]
#[command(name = "odm", about, version, long_about = None)]
struct RawCli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count, global = true)]
  verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE", value_parser = parse_pathbuf, global = true)]
  log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE", value_parser = parse_pathbuf, global = true)]
  config_file: Option<PathBuf>,

  /// Resolve relative paths against this directory
  #[arg(short = 'w', long = "working-dir", value_name = "PATH", value_parser = parse_working_dir, global = true)]
  working_dir: Option<PathBuf>,

  /// Only touch files whose content matches REGEX
  #[arg(long = "filter", value_name = "REGEX", global = true)]
  filter: Option<String>,

  /// Print edited files instead of writing them back
  #[arg(long = "dry-run", global = true)]
  dry_run: bool,

  #[command(subcommand)]
  command: RawCommand,
}

#[derive(Subcommand, Debug)]
enum RawCommand {
  /// Print every match as `path:begin-end:text`
  Grep {
    pattern: String,
    paths:   Vec<PathBuf>,
  },
  /// Replace every match with WITH (`$1`, `${name}` expand groups)
  Replace {
    pattern: String,
    with:    String,
    paths:   Vec<PathBuf>,
  },
  /// Insert TEXT in front of every match
  InsertBefore {
    pattern: String,
    text:    String,
    paths:   Vec<PathBuf>,
  },
  /// Insert TEXT behind every match
  InsertAfter {
    pattern: String,
    text:    String,
    paths:   Vec<PathBuf>,
  },
  /// Delete every match
  Remove {
    pattern: String,
    paths:   Vec<PathBuf>,
  },
}

impl TryFrom<RawCli> for CliOptions {
  type Error = anyhow::Error;

  fn try_from(raw: RawCli) -> Result<Self> {
    let (pattern, action, paths) = match raw.command {
      RawCommand::Grep { pattern, paths } => (pattern, Action::Grep, paths),
      RawCommand::Replace {
        pattern,
        with,
        paths,
      } => (pattern, edit(Mode::Replace, with), paths),
      RawCommand::InsertBefore {
        pattern,
        text,
        paths,
      } => (pattern, edit(Mode::InsertBefore, text), paths),
      RawCommand::InsertAfter {
        pattern,
        text,
        paths,
      } => (pattern, edit(Mode::InsertAfter, text), paths),
      RawCommand::Remove { pattern, paths } => (pattern, edit(Mode::Remove, String::new()), paths),
    };

    let pattern = Regex::new(&pattern).with_context(|| format!("invalid pattern '{pattern}'"))?;
    let filter = raw
      .filter
      .map(|filter| Regex::new(&filter).with_context(|| format!("invalid filter '{filter}'")))
      .transpose()?;

    Ok(Self {
      verbosity: raw.verbosity,
      log_file: raw.log_file,
      config_file: raw.config_file,
      working_dir: raw.working_dir,
      filter,
      dry_run: raw.dry_run,
      pattern,
      action,
      paths,
    })
  }
}

fn edit(mode: Mode, text: String) -> Action {
  Action::Edit {
    mode,
    text: text.into_bytes(),
  }
}

fn parse_pathbuf(value: &str) -> std::result::Result<PathBuf, String> {
  odm_stdx::path::absolute(value).map_err(|err| format!("invalid path '{value}': {err}"))
}

fn parse_working_dir(value: &str) -> std::result::Result<PathBuf, String> {
  let path = parse_pathbuf(value)?;
  if path.is_dir() {
    Ok(path)
  } else {
    Err(format!(
      "working directory '{value}' does not exist or is not a directory"
    ))
  }
}

#[cfg(test)]
mod test {
  use clap::CommandFactory;

  use super::*;

  fn parse(args: &[&str]) -> Result<CliOptions> {
    let raw = RawCli::try_parse_from(std::iter::once("odm").chain(args.iter().copied()))?;
    raw.try_into()
  }

  #[test]
  fn cli_definition_is_valid() {
    RawCli::command().debug_assert();
  }

  #[test]
  fn replace_with_global_flags() {
    let options = parse(&[
      "-vv",
      "replace",
      "--dry-run",
      "--filter",
      "tag",
      "foo",
      "bar",
      "a.md",
      "notes",
    ])
    .unwrap();

    assert_eq!(options.verbosity, 2);
    assert!(options.dry_run);
    assert!(options.filter.is_some());
    assert_eq!(options.action, Action::Edit {
      mode: Mode::Replace,
      text: b"bar".to_vec(),
    });
    assert_eq!(options.paths, [PathBuf::from("a.md"), PathBuf::from("notes")]);
  }

  #[test]
  fn grep_without_paths() {
    let options = parse(&["grep", "TODO"]).unwrap();
    assert_eq!(options.action, Action::Grep);
    assert!(options.paths.is_empty());
    assert!(!options.dry_run);
  }

  #[test]
  fn remove_has_no_text() {
    let options = parse(&["remove", "x+", "a.md"]).unwrap();
    assert_eq!(options.action, Action::Edit {
      mode: Mode::Remove,
      text: Vec::new(),
    });
  }

  #[test]
  fn bad_pattern_is_an_error() {
    let err = parse(&["grep", "(", "a.md"]).unwrap_err();
    assert!(err.to_string().contains("invalid pattern"));
    assert!(parse(&["--filter", "[", "grep", "x"]).is_err());
  }

  #[test]
  fn working_dir_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    assert!(parse(&["-w", missing.to_str().unwrap(), "grep", "x"]).is_err());

    let options = parse(&["-w", dir.path().to_str().unwrap(), "grep", "x"]).unwrap();
    assert_eq!(options.working_dir.as_deref(), Some(dir.path()));
  }
}
