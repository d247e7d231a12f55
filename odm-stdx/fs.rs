//! File and folder handles.
//!
//! A handle only holds an absolute path; nothing is opened until an operation
//! needs it. A [`File`] may name a file that does not exist yet.

use std::{
  fmt,
  fs,
  io::{
    self,
    Write,
  },
  path::{
    Path,
    PathBuf,
  },
  time::SystemTime,
};

use crate::path;

/// Permission bits used when a file is created.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct File {
  path: PathBuf,
}

impl File {
  /// Create a handle for `path`, made absolute against the working directory.
  pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
    Ok(Self {
      path: path::absolute_file(path)?,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// File name including the extension.
  pub fn base_name(&self) -> Option<&str> {
    self.path.file_name().and_then(|name| name.to_str())
  }

  /// Extension without the leading dot.
  pub fn extension(&self) -> Option<&str> {
    self.path.extension().and_then(|ext| ext.to_str())
  }

  /// The directory containing this file.
  pub fn parent(&self) -> Folder {
    self.parent_times(1)
  }

  /// The folder `n` levels up. Stops at the root.
  pub fn parent_times(&self, n: usize) -> Folder {
    ancestor(&self.path, n)
  }

  pub fn exists(&self) -> io::Result<bool> {
    self.path.try_exists()
  }

  pub fn read(&self) -> io::Result<Vec<u8>> {
    fs::read(&self.path)
  }

  /// Replace the file contents, creating the file if needed.
  pub fn write(&self, bytes: &[u8]) -> io::Result<()> {
    let mut file = open_options().write(true).create(true).truncate(true).open(&self.path)?;
    file.write_all(bytes)?;
    file.flush()
  }

  /// Create an empty file. Returns `false` if it already existed.
  pub fn create(&self) -> io::Result<bool> {
    match open_options().write(true).create_new(true).open(&self.path) {
      Ok(_) => Ok(true),
      Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
      Err(err) => Err(err),
    }
  }

  /// Creation time. Falls back to the modification time on filesystems that
  /// do not record birth times.
  pub fn created(&self) -> io::Result<SystemTime> {
    let metadata = fs::metadata(&self.path)?;
    metadata.created().or_else(|_| metadata.modified())
  }

  pub fn updated(&self) -> io::Result<SystemTime> {
    fs::metadata(&self.path)?.modified()
  }

  /// Set the permission bits. Returns `false` if the file does not exist.
  pub fn set_permissions(&self, mode: u32) -> io::Result<bool> {
    if !self.exists()? {
      return Ok(false);
    }

    #[cfg(unix)]
    let permissions = {
      use std::os::unix::fs::PermissionsExt;
      fs::Permissions::from_mode(mode)
    };
    #[cfg(not(unix))]
    let permissions = {
      let mut permissions = fs::metadata(&self.path)?.permissions();
      permissions.set_readonly(mode & 0o222 == 0);
      permissions
    };

    fs::set_permissions(&self.path, permissions)?;
    Ok(true)
  }
}

impl fmt::Display for File {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.path.display())
  }
}

fn open_options() -> fs::OpenOptions {
  #[allow(unused_mut)]
  let mut options = fs::OpenOptions::new();
  #[cfg(unix)]
  {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(DEFAULT_FILE_MODE);
  }
  options
}

/// Which files [`Folder::files`] yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
  /// Extensions to keep, without the dot. Empty keeps every file.
  pub extensions:   Vec<String>,
  /// Descend into hidden files and directories.
  pub hidden:       bool,
  pub follow_links: bool,
}

impl Default for WalkOptions {
  fn default() -> Self {
    Self {
      extensions:   vec!["md".to_string()],
      hidden:       false,
      follow_links: false,
    }
  }
}

impl WalkOptions {
  fn accepts(&self, path: &Path) -> bool {
    if self.extensions.is_empty() {
      return true;
    }
    path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| self.extensions.iter().any(|want| want == ext))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Folder {
  path: PathBuf,
}

impl Folder {
  pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
    Ok(Self {
      path: path::absolute(path)?,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn base_name(&self) -> Option<&str> {
    self.path.file_name().and_then(|name| name.to_str())
  }

  /// The parent folder; the root is its own parent.
  pub fn parent(&self) -> Folder {
    self.parent_times(1)
  }

  pub fn parent_times(&self, n: usize) -> Folder {
    ancestor(&self.path, n)
  }

  pub fn is_root(&self) -> bool {
    self.path.parent().is_none()
  }

  pub fn exists(&self) -> io::Result<bool> {
    Ok(self.path.try_exists()? && self.path.is_dir())
  }

  /// Create the folder and any missing parents. Returns `false` if it already
  /// existed.
  pub fn create(&self) -> io::Result<bool> {
    if self.exists()? {
      return Ok(false);
    }
    fs::create_dir_all(&self.path)?;
    Ok(true)
  }

  /// Walk the folder recursively, honouring ignore files, and return the
  /// matching files sorted by path.
  pub fn files(&self, options: &WalkOptions) -> io::Result<Vec<File>> {
    let walker = ignore::WalkBuilder::new(&self.path)
      .hidden(!options.hidden)
      .follow_links(options.follow_links)
      .build();

    let mut files = Vec::new();
    for entry in walker {
      let entry = entry.map_err(walk_error)?;
      if !entry.file_type().is_some_and(|ty| ty.is_file()) {
        continue;
      }
      if !options.accepts(entry.path()) {
        continue;
      }
      files.push(File {
        path: entry.into_path(),
      });
    }
    files.sort();

    log::debug!("found {} files under {}", files.len(), self);
    Ok(files)
  }
}

impl fmt::Display for Folder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.path.display())
  }
}

fn ancestor(path: &Path, n: usize) -> Folder {
  let path = path
    .ancestors()
    .nth(n)
    .or_else(|| path.ancestors().last())
    .unwrap_or(path);
  Folder {
    path: path.to_path_buf(),
  }
}

fn walk_error(err: ignore::Error) -> io::Error {
  if err.is_io() {
    match err.into_io_error() {
      Some(err) => err,
      None => io::Error::other("walk failed"),
    }
  } else {
    io::Error::other(err)
  }
}
