//! Lexical path helpers.
//!
//! Paths are made absolute against [`current_working_dir`] once, when a file
//! or folder handle is created, so later changes of the process directory do
//! not retarget existing handles.

use std::{
  io,
  path::{
    Component,
    Path,
    PathBuf,
    is_separator,
  },
};

use crate::env::current_working_dir;

/// Normalize a path without touching the filesystem.
///
/// `.` components are dropped and `..` pops the previous normal component.
/// Leading `..` of a relative path are kept.
/// Symlinks are not resolved.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.as_ref().components() {
    match component {
      Component::CurDir => {},
      Component::ParentDir => {
        let last = normalized.components().next_back();
        let (pop, at_root) = match last {
          Some(Component::Normal(_)) => (true, false),
          Some(Component::RootDir | Component::Prefix(_)) => (false, true),
          _ => (false, false),
        };
        if pop {
          normalized.pop();
        } else if !at_root {
          // `..` at the root stays at the root; a leading `..` is kept
          normalized.push(component);
        }
      },
      Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
        normalized.push(component);
      },
    }
  }
  normalized
}

/// Trim leading spaces, normalize and make the path absolute.
pub fn absolute(path: impl AsRef<Path>) -> io::Result<PathBuf> {
  let path = trim_leading_spaces(path.as_ref());
  if path.is_absolute() {
    return Ok(normalize(path));
  }
  Ok(absolute_from(&current_working_dir()?, path))
}

/// Like [`absolute`] but rejects paths that end with a separator, since those
/// can only name directories.
pub fn absolute_file(path: impl AsRef<Path>) -> io::Result<PathBuf> {
  let path = path.as_ref();
  if ends_with_separator(path) {
    return Err(io::Error::new(
      io::ErrorKind::InvalidInput,
      format!("a file path cannot end with a separator: '{}'", path.display()),
    ));
  }
  absolute(path)
}

fn absolute_from(base: &Path, path: &Path) -> PathBuf {
  normalize(base.join(path))
}

fn trim_leading_spaces(path: &Path) -> &Path {
  match path.to_str() {
    Some(s) => Path::new(s.trim_start_matches(' ')),
    None => path,
  }
}

fn ends_with_separator(path: &Path) -> bool {
  path
    .to_string_lossy()
    .chars()
    .next_back()
    .is_some_and(is_separator)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn normalize_resolves_dots() {
    assert_eq!(normalize("/a/./b/../c"), PathBuf::from("/a/c"));
    assert_eq!(normalize("a/b/../../c"), PathBuf::from("c"));
    assert_eq!(normalize("../a"), PathBuf::from("../a"));
    assert_eq!(normalize("../../a"), PathBuf::from("../../a"));
    assert_eq!(normalize("a/../../b"), PathBuf::from("../b"));
    assert_eq!(normalize("/../a"), PathBuf::from("/a"));
  }

  #[test]
  fn relative_paths_join_onto_base() {
    let base = Path::new("/vault");
    assert_eq!(
      absolute_from(base, Path::new("notes/./todo.md")),
      PathBuf::from("/vault/notes/todo.md")
    );
    assert_eq!(
      absolute_from(base, Path::new("../other.md")),
      PathBuf::from("/other.md")
    );
  }

  #[test]
  fn leading_spaces_are_ignored() {
    assert_eq!(absolute("  /vault/a.md").unwrap(), PathBuf::from("/vault/a.md"));
  }

  #[test]
  fn file_paths_reject_trailing_separator() {
    let err = absolute_file("/vault/notes/").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert!(absolute_file("/vault/notes").is_ok());
  }
}
