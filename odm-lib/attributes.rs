//! Set metadata: name, timestamps and version.
//!
//! A [`Set`](crate::Set) only talks to the [`Attributes`] contract. Two
//! providers exist: [`MemoryAttributes`] for sets built from bytes, and
//! [`DiskAttributes`] which derive the name and timestamps from a file.
//! Versions are always kept in memory and start at zero.

use std::{
  fmt,
  io,
  sync::atomic::{
    AtomicUsize,
    Ordering,
  },
  time::SystemTime,
};

use odm_stdx::fs::File;

pub trait Attributes: fmt::Debug {
  /// Unique key of the set. For file-backed sets this is the file path.
  fn name(&self) -> &str;

  fn created(&self) -> io::Result<SystemTime>;

  fn updated(&self) -> io::Result<SystemTime>;

  /// Record a modification at `time`.
  fn update(&mut self, time: SystemTime) -> io::Result<()>;

  /// Number of successful mutations since the set was built.
  fn version(&self) -> u64;

  fn increment_version(&mut self);

  /// The file backing the set, if any.
  fn file(&self) -> Option<&File> {
    None
  }

  /// Called after the buffer was written to the backing file.
  fn synced(&mut self) {}
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryAttributes {
  name:    String,
  created: SystemTime,
  updated: SystemTime,
  version: u64,
}

impl MemoryAttributes {
  /// Attributes with a generated, process-unique name.
  pub fn new() -> Self {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    Self::with_name(format!("memory-{id}"))
  }

  pub fn with_name(name: impl Into<String>) -> Self {
    let now = SystemTime::now();
    Self {
      name:    name.into(),
      created: now,
      updated: now,
      version: 0,
    }
  }
}

impl Default for MemoryAttributes {
  fn default() -> Self {
    Self::new()
  }
}

impl Attributes for MemoryAttributes {
  fn name(&self) -> &str {
    &self.name
  }

  fn created(&self) -> io::Result<SystemTime> {
    Ok(self.created)
  }

  fn updated(&self) -> io::Result<SystemTime> {
    Ok(self.updated)
  }

  fn update(&mut self, time: SystemTime) -> io::Result<()> {
    self.updated = time;
    Ok(())
  }

  fn version(&self) -> u64 {
    self.version
  }

  fn increment_version(&mut self) {
    self.version = self.version.saturating_add(1);
  }
}

/// Attributes of a file-backed set.
///
/// Timestamps come from the file metadata. Edits that have not been written
/// back yet are reported through an in-memory touch time, which takes
/// precedence over the file's modification time until [`Attributes::synced`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskAttributes {
  file:    File,
  name:    String,
  touched: Option<SystemTime>,
  version: u64,
}

impl DiskAttributes {
  pub fn new(file: File) -> Self {
    Self {
      name: file.to_string(),
      file,
      touched: None,
      version: 0,
    }
  }
}

impl Attributes for DiskAttributes {
  fn name(&self) -> &str {
    &self.name
  }

  fn created(&self) -> io::Result<SystemTime> {
    self.file.created()
  }

  fn updated(&self) -> io::Result<SystemTime> {
    match self.touched {
      Some(time) => Ok(time),
      None => self.file.updated(),
    }
  }

  fn update(&mut self, time: SystemTime) -> io::Result<()> {
    self.touched = Some(time);
    Ok(())
  }

  fn version(&self) -> u64 {
    self.version
  }

  fn increment_version(&mut self) {
    self.version = self.version.saturating_add(1);
  }

  fn file(&self) -> Option<&File> {
    Some(&self.file)
  }

  fn synced(&mut self) {
    self.touched = None;
  }
}
