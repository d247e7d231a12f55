//! An editable, named buffer.
//!
//! A [`Set`] pairs one buffer with one [`Attributes`] provider. The buffer is
//! only ever replaced whole: every successful edit builds a new buffer with
//! [`transform::perform`], swaps it in, bumps the version by one and stamps
//! the update time. Snapshots taken with [`Set::data`] keep observing the
//! content they were taken from.
//!
//! # Example
//!
//! ```no_run
//! use odm_lib::{
//!   Matchable,
//!   Mutable,
//!   Set,
//! };
//! use odm_stdx::fs::File;
//!
//! let mut note = Set::from_file(File::new("inbox.md").unwrap()).unwrap();
//! let todos = note.matches_str(r"(?m)^- \[ \]").unwrap();
//! note.insert_after(&todos, |_, _| Some(b" (triaged)".to_vec())).unwrap();
//! note.save().unwrap();
//! ```

use std::{
  borrow::Cow,
  io::{
    self,
    Read,
  },
  sync::Arc,
  time::SystemTime,
};

use odm_stdx::fs::File;
use regex_automata::meta::BuildError;
use thiserror::Error;

use crate::{
  attributes::{
    Attributes,
    DiskAttributes,
    MemoryAttributes,
  },
  error::ErrorKind,
  matches::Match,
  source::{
    self,
    Regex,
  },
  transform::{
    self,
    Mode,
    TransformError,
  },
};

#[derive(Debug, Error)]
pub enum SetError {
  #[error(transparent)]
  Transform(#[from] TransformError),
  #[error("invalid pattern: {0}")]
  Pattern(#[from] Box<BuildError>),
  #[error(transparent)]
  Io(#[from] io::Error),
}

impl SetError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Transform(err) => err.kind(),
      Self::Pattern(_) => ErrorKind::InvalidArgument,
      Self::Io(err) if err.kind() == io::ErrorKind::NotFound => ErrorKind::NotFound,
      Self::Io(_) => ErrorKind::Io,
    }
  }
}

pub type Result<T> = std::result::Result<T, SetError>;

/// Something whose buffer can be searched.
pub trait Matchable {
  /// All non-overlapping matches of `pattern` in the current buffer.
  ///
  /// The offsets are a snapshot: re-match after every mutation.
  fn matches(&self, pattern: &Regex) -> Result<Vec<Match>>;

  /// Compile `pattern` and match it.
  fn matches_str(&self, pattern: &str) -> Result<Vec<Match>> {
    let regex = Regex::new(pattern).map_err(Box::new)?;
    self.matches(&regex)
  }
}

/// Something whose buffer can be edited at a list of matches.
///
/// See [`transform`] for the semantics of each operation. A mapper returning
/// `None` keeps the matched bytes.
pub trait Mutable {
  fn replace<F>(&mut self, matches: &[Match], mapper: F) -> Result<()>
  where
    F: FnMut(Match, &[u8]) -> Option<Vec<u8>>;

  fn insert_before<F>(&mut self, matches: &[Match], mapper: F) -> Result<()>
  where
    F: FnMut(Match, &[u8]) -> Option<Vec<u8>>;

  fn insert_after<F>(&mut self, matches: &[Match], mapper: F) -> Result<()>
  where
    F: FnMut(Match, &[u8]) -> Option<Vec<u8>>;

  fn remove(&mut self, matches: &[Match]) -> Result<()>;
}

#[derive(Debug)]
pub struct Set {
  data:       Arc<[u8]>,
  attributes: Box<dyn Attributes>,
}

impl Set {
  /// An empty in-memory set.
  pub fn new() -> Self {
    Self::from_bytes(Vec::new())
  }

  pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
    Self::with_attributes(bytes, Box::new(MemoryAttributes::new()))
  }

  pub fn with_attributes(bytes: impl Into<Vec<u8>>, attributes: Box<dyn Attributes>) -> Self {
    Self {
      data: Arc::from(bytes.into()),
      attributes,
    }
  }

  pub fn from_reader(mut reader: impl Read) -> Result<Self> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(Self::from_bytes(bytes))
  }

  /// A set backed by `file`. A file that does not exist yet yields an empty
  /// buffer; it is created on [`Set::save`].
  pub fn from_file(file: File) -> Result<Self> {
    let bytes = if file.exists()? {
      file.read()?
    } else {
      Vec::new()
    };
    Ok(Self::with_attributes(bytes, Box::new(DiskAttributes::new(file))))
  }

  /// Like [`Set::from_file`], but any failure yields a fresh empty in-memory
  /// set instead.
  pub fn from_file_or_empty(file: File) -> Self {
    match Self::from_file(file) {
      Ok(set) => set,
      Err(err) => {
        log::debug!("falling back to an empty set: {err}");
        Self::new()
      },
    }
  }

  /// A snapshot of the buffer. It is unaffected by later edits.
  pub fn data(&self) -> Arc<[u8]> {
    Arc::clone(&self.data)
  }

  pub fn bytes(&self) -> &[u8] {
    &self.data
  }

  /// The buffer as text, replacing invalid UTF-8.
  pub fn text(&self) -> Cow<'_, str> {
    String::from_utf8_lossy(&self.data)
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn name(&self) -> &str {
    self.attributes.name()
  }

  pub fn version(&self) -> u64 {
    self.attributes.version()
  }

  pub fn attributes(&self) -> &dyn Attributes {
    self.attributes.as_ref()
  }

  /// Write the buffer to the backing file.
  ///
  /// Returns `false` for in-memory sets, which have nowhere to go.
  pub fn save(&mut self) -> Result<bool> {
    let Some(file) = self.attributes.file() else {
      return Ok(false);
    };
    file.write(&self.data)?;
    log::debug!("wrote {} bytes to {file}", self.data.len());
    self.attributes.synced();
    Ok(true)
  }

  fn perform<F>(&mut self, matches: &[Match], mode: Mode, mapper: F) -> Result<()>
  where
    F: FnMut(Match, &[u8]) -> Option<Vec<u8>>,
  {
    let output = transform::perform(&self.data, matches, mode, mapper)?;
    self.attributes.update(SystemTime::now())?;
    self.data = Arc::from(output);
    self.attributes.increment_version();

    log::debug!(
      "{mode:?} on {}: {} matches, now version {}",
      self.name(),
      matches.len(),
      self.version()
    );
    Ok(())
  }
}

impl Default for Set {
  fn default() -> Self {
    Self::new()
  }
}

/// Cloning shares the content but not the identity: the clone gets fresh
/// in-memory attributes (new name, version 0) and is independent from then on.
impl Clone for Set {
  fn clone(&self) -> Self {
    Self {
      data:       Arc::clone(&self.data),
      attributes: Box::new(MemoryAttributes::new()),
    }
  }
}

impl Matchable for Set {
  fn matches(&self, pattern: &Regex) -> Result<Vec<Match>> {
    if let Some(file) = self.attributes.file()
      && !file.exists()?
    {
      return Ok(Vec::new());
    }
    Ok(source::find_all(&self.data, pattern))
  }
}

impl Mutable for Set {
  fn replace<F>(&mut self, matches: &[Match], mapper: F) -> Result<()>
  where
    F: FnMut(Match, &[u8]) -> Option<Vec<u8>>,
  {
    self.perform(matches, Mode::Replace, mapper)
  }

  fn insert_before<F>(&mut self, matches: &[Match], mapper: F) -> Result<()>
  where
    F: FnMut(Match, &[u8]) -> Option<Vec<u8>>,
  {
    self.perform(matches, Mode::InsertBefore, mapper)
  }

  fn insert_after<F>(&mut self, matches: &[Match], mapper: F) -> Result<()>
  where
    F: FnMut(Match, &[u8]) -> Option<Vec<u8>>,
  {
    self.perform(matches, Mode::InsertAfter, mapper)
  }

  fn remove(&mut self, matches: &[Match]) -> Result<()> {
    self.perform(matches, Mode::Remove, |_, _| None)
  }
}
