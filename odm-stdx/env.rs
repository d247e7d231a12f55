//! Functions for working with the host environment.

use std::{
  io,
  path::{
    Path,
    PathBuf,
  },
};

use parking_lot::RwLock;

// Cached so relative paths keep resolving the same way even if the process
// directory is removed underneath us.
static CWD: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Get the current working directory.
///
/// Behaves like `pwd -L`: a `PWD` that points at the same directory as the
/// physical cwd is preferred, so symlinked vaults keep their logical path.
pub fn current_working_dir() -> io::Result<PathBuf> {
  if let Some(path) = &*CWD.read() {
    return Ok(path.clone());
  }

  let mut cwd = std::env::current_dir()?;

  let pwd = std::env::var_os("PWD");
  #[cfg(windows)]
  let pwd = pwd.or_else(|| std::env::var_os("CD"));

  if let Some(pwd) = pwd.map(PathBuf::from)
    && pwd.canonicalize().ok().as_ref() == Some(&cwd)
  {
    cwd = pwd;
  }

  let mut dst = CWD.write();
  *dst = Some(cwd.clone());

  Ok(cwd)
}

/// Update the current working directory.
///
/// Returns the previously cached directory, if any.
pub fn set_current_working_dir(path: impl AsRef<Path>) -> io::Result<Option<PathBuf>> {
  let path = path.as_ref().canonicalize()?;
  std::env::set_current_dir(&path)?;
  log::debug!("working directory set to {}", path.display());

  let mut cwd = CWD.write();
  Ok(cwd.replace(path))
}

#[cfg(test)]
mod tests {
  use super::{
    current_working_dir,
    set_current_working_dir,
  };

  #[test]
  fn current_dir_is_set() {
    let new_path = std::env::temp_dir().canonicalize().unwrap();
    let cwd = current_working_dir().expect("should get cwd");
    assert_ne!(cwd, new_path);

    set_current_working_dir(&new_path).expect("Couldn't set new path");

    let cwd = current_working_dir().expect("should get cwd");
    assert_eq!(cwd, new_path);
  }
}
