mod cli;

use std::{
  io::{
    self,
    Write,
  },
  path::{
    Path,
    PathBuf,
  },
};

use anyhow::{
  Context,
  Result,
};
use odm_lib::{
  Group,
  Match,
  Matchable,
  Mode,
  Mutable,
  Regex,
  Set,
  template,
};
use odm_loader::config::Config;
use odm_stdx::{
  env::{
    current_working_dir,
    set_current_working_dir,
  },
  fs::{
    File,
    Folder,
    WalkOptions,
  },
};

use crate::cli::{
  Action,
  CliOptions,
};

fn main() -> Result<()> {
  let options = CliOptions::parse()?;

  odm_loader::initialize_config_file(options.config_file.clone());
  odm_loader::initialize_log_file(options.log_file.clone());
  setup_logging(options.verbosity).context("failed to initialize logging")?;

  if let Some(dir) = &options.working_dir {
    set_current_working_dir(dir)
      .with_context(|| format!("failed to change directory to {}", dir.display()))?;
  }

  let config = Config::load().context("failed to load configuration")?;
  log::debug!("config: {config:?}");

  let files = collect_files(&options.paths, &config.walk_options())?;
  let mut group = Group::from_files(files).context("failed to load files")?;

  if let Some(filter) = &options.filter {
    group
      .filter(|set: &Set| set.matches(filter).map(|found| !found.is_empty()))
      .context("failed to filter files")?;
  }

  let stdout = io::stdout();
  let mut out = stdout.lock();
  match &options.action {
    Action::Grep => grep(&mut out, group.sets(), &options.pattern)?,
    Action::Edit { mode, text } => {
      let dry_run = options.dry_run || config.dry_run;
      for mut set in group.into_sets() {
        if edit(&mut set, &options.pattern, *mode, text)? {
          write_back(&mut out, &mut set, dry_run)?;
        }
      }
    },
  }

  Ok(())
}

fn setup_logging(verbosity: u8) -> Result<()> {
  let mut base_config = fern::Dispatch::new();

  base_config = match verbosity {
    0 => base_config.level(log::LevelFilter::Warn),
    1 => base_config.level(log::LevelFilter::Info),
    2 => base_config.level(log::LevelFilter::Debug),
    _ => base_config.level(log::LevelFilter::Trace),
  };

  let file_config = fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.target(),
        record.level(),
        message
      ))
    })
    .chain(fern::log_file(odm_loader::log_file())?);

  base_config.chain(file_config).apply()?;

  Ok(())
}

/// Expand `paths` into the files to work on. Folders are walked; no paths
/// means the enclosing vault.
fn collect_files(paths: &[PathBuf], walk: &WalkOptions) -> Result<Vec<File>> {
  if paths.is_empty() {
    let cwd = current_working_dir().context("failed to get the working directory")?;
    return vault_files(&cwd, walk);
  }

  let mut files = Vec::new();
  for path in paths {
    let folder = Folder::new(path).with_context(|| format!("invalid path {}", path.display()))?;
    if folder.exists()? {
      files.extend(folder_files(folder.path(), walk)?);
    } else {
      files.push(File::new(path).with_context(|| format!("invalid file {}", path.display()))?);
    }
  }
  Ok(files)
}

/// Files of the vault enclosing `start`, or of `start` itself when there is
/// none.
fn vault_files(start: &Path, walk: &WalkOptions) -> Result<Vec<File>> {
  let (vault, fallback) = odm_loader::find_vault_in(start);
  if fallback {
    log::info!("no vault found, using {}", vault.display());
  }
  folder_files(&vault, walk)
}

fn folder_files(path: &Path, walk: &WalkOptions) -> Result<Vec<File>> {
  let folder = Folder::new(path)?;
  folder
    .files(walk)
    .with_context(|| format!("failed to walk {folder}"))
}

fn grep<'a>(
  out: &mut impl Write,
  sets: impl IntoIterator<Item = &'a Set>,
  pattern: &Regex,
) -> Result<()> {
  for set in sets {
    for found in set.matches(pattern)? {
      writeln!(out, "{}", grep_line(set, found)?)?;
    }
  }
  Ok(())
}

fn grep_line(set: &Set, found: Match) -> Result<String> {
  let text = found.text(set.bytes())?;
  Ok(format!(
    "{}:{}-{}:{}",
    set.name(),
    found.begin,
    found.end,
    text.escape_debug()
  ))
}

/// Apply `mode` at every match of `pattern`. Returns `false` when nothing
/// matched and the set was left alone.
fn edit(set: &mut Set, pattern: &Regex, mode: Mode, text: &[u8]) -> Result<bool> {
  let matches = set.matches(pattern)?;
  if matches.is_empty() {
    return Ok(false);
  }

  let mapper = template(pattern, text);
  let edited = match mode {
    Mode::Replace => set.replace(&matches, mapper),
    Mode::InsertBefore => set.insert_before(&matches, mapper),
    Mode::InsertAfter => set.insert_after(&matches, mapper),
    Mode::Remove => set.remove(&matches),
  };
  edited.with_context(|| format!("failed to edit {}", set.name()))?;

  log::info!("{mode:?}: {} matches in {}", matches.len(), set.name());
  Ok(true)
}

fn write_back(out: &mut impl Write, set: &mut Set, dry_run: bool) -> Result<()> {
  if dry_run {
    writeln!(out, "==> {} <==", set.name())?;
    out.write_all(set.bytes())?;
    if !set.bytes().ends_with(b"\n") {
      writeln!(out)?;
    }
    return Ok(());
  }
  set
    .save()
    .with_context(|| format!("failed to write {}", set.name()))?;
  Ok(())
}

#[cfg(test)]
mod test {
  use super::*;

  fn note(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
  }

  #[test]
  fn collects_files_and_folders() {
    let dir = tempfile::tempdir().unwrap();
    let single = note(dir.path(), "single.txt", "x");
    let notes = dir.path().join("notes");
    std::fs::create_dir(&notes).unwrap();
    note(&notes, "b.md", "b");
    note(&notes, "a.md", "a");
    note(&notes, "skip.txt", "s");

    let files = collect_files(&[single.clone(), notes.clone()], &WalkOptions::default()).unwrap();
    let paths: Vec<&Path> = files.iter().map(File::path).collect();
    assert_eq!(paths, [
      single.as_path(),
      notes.join("a.md").as_path(),
      notes.join("b.md").as_path()
    ]);
  }

  #[test]
  fn no_paths_means_enclosing_vault() {
    let dir = tempfile::tempdir().unwrap();
    let vault = dir.path().join("vault");
    let daily = vault.join("daily");
    let projects = vault.join("projects");
    std::fs::create_dir_all(vault.join(".obsidian")).unwrap();
    std::fs::create_dir_all(&daily).unwrap();
    std::fs::create_dir_all(&projects).unwrap();
    note(&vault.join(".obsidian"), "workspace.md", "ui");
    note(&daily, "today.md", "t");
    note(&projects, "odm.md", "p");
    note(dir.path(), "outside.md", "o");

    let files = vault_files(&daily, &WalkOptions::default()).unwrap();
    let paths: Vec<&Path> = files.iter().map(File::path).collect();
    assert_eq!(paths, [
      daily.join("today.md").as_path(),
      projects.join("odm.md").as_path()
    ]);
  }

  #[test]
  fn grep_prints_offsets_and_text() {
    let set = Set::from_bytes("a TODO b\nTODO");
    let pattern = Regex::new("TODO").unwrap();
    let mut out = Vec::new();
    grep(&mut out, [&set], &pattern).unwrap();

    let name = set.name();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      format!("{name}:2-6:TODO\n{name}:9-13:TODO\n")
    );
  }

  #[test]
  fn edit_expands_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let path = note(dir.path(), "todo.md", "- [ ] milk\n- [ ] eggs\n");
    let mut set = Set::from_file(File::new(&path).unwrap()).unwrap();
    let pattern = Regex::new(r"- \[ \] (\w+)").unwrap();

    assert!(edit(&mut set, &pattern, Mode::Replace, b"- [x] $1").unwrap());
    let mut out = Vec::new();
    write_back(&mut out, &mut set, false).unwrap();

    assert!(out.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "- [x] milk\n- [x] eggs\n");
    assert_eq!(set.version(), 1);
  }

  #[test]
  fn edit_without_matches_leaves_set_alone() {
    let mut set = Set::from_bytes("nothing here");
    let pattern = Regex::new("TODO").unwrap();
    assert!(!edit(&mut set, &pattern, Mode::Remove, b"").unwrap());
    assert_eq!(set.version(), 0);
  }

  #[test]
  fn dry_run_prints_instead_of_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = note(dir.path(), "tag.md", "draft");
    let mut set = Set::from_file(File::new(&path).unwrap()).unwrap();
    let pattern = Regex::new("draft").unwrap();

    assert!(edit(&mut set, &pattern, Mode::InsertBefore, b"#").unwrap());
    let mut out = Vec::new();
    write_back(&mut out, &mut set, true).unwrap();

    assert_eq!(
      String::from_utf8(out).unwrap(),
      format!("==> {} <==\n#draft\n", path.display())
    );
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "draft");
  }
}
