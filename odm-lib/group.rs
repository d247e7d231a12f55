//! A name-keyed collection of sets.
//!
//! Bulk operations ([`Group::filter`], [`Group::merge`],
//! [`Group::for_each`]) build a complete replacement collection first and
//! only publish it once every callback succeeded. A failing callback leaves
//! the previous collection in place.
//!
//! Members are kept sorted by name, which fixes the iteration order of the
//! pairwise merge and makes results reproducible.

use std::{
  collections::{
    BTreeMap,
    btree_map::Entry,
  },
  error::Error as StdError,
};

use odm_stdx::fs::File;
use thiserror::Error;

use crate::{
  error::ErrorKind,
  set::{
    Set,
    SetError,
  },
};

pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum GroupError {
  #[error("set has no name")]
  Unnamed,
  #[error("more than one set is named '{0}'")]
  DuplicateName(String),
  #[error("callback failed: {0}")]
  Callback(#[source] BoxError),
  #[error("failed to load set: {0}")]
  Load(#[from] SetError),
}

impl GroupError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Unnamed | Self::DuplicateName(_) => ErrorKind::InvalidArgument,
      Self::Callback(_) => ErrorKind::Callback,
      Self::Load(err) => err.kind(),
    }
  }

  fn callback(err: impl Into<BoxError>) -> Self {
    Self::Callback(err.into())
  }
}

pub type Result<T> = std::result::Result<T, GroupError>;

/// What a group needs from its members.
pub trait Member: Sized {
  fn name(&self) -> &str;

  fn bytes(&self) -> &[u8];

  /// Build a new, independently named member holding `bytes`.
  fn from_merged(bytes: Vec<u8>) -> Self;
}

impl Member for Set {
  fn name(&self) -> &str {
    Set::name(self)
  }

  fn bytes(&self) -> &[u8] {
    Set::bytes(self)
  }

  fn from_merged(bytes: Vec<u8>) -> Self {
    Set::from_bytes(bytes)
  }
}

#[derive(Debug)]
pub struct Group<S = Set> {
  sets:    BTreeMap<String, S>,
  version: u64,
}

impl<S> Default for Group<S> {
  fn default() -> Self {
    Self {
      sets:    BTreeMap::new(),
      version: 0,
    }
  }
}

impl<S: Member> Group<S> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.sets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sets.is_empty()
  }

  /// Number of published changes to the collection.
  pub fn version(&self) -> u64 {
    self.version
  }

  pub fn get(&self, name: &str) -> Option<&S> {
    self.sets.get(name)
  }

  /// All members, sorted by name.
  pub fn sets(&self) -> Vec<&S> {
    self.sets.values().collect()
  }

  pub fn into_sets(self) -> Vec<S> {
    self.sets.into_values().collect()
  }

  /// Add `set` unless a member with the same name exists.
  ///
  /// Returns whether it was added; the first member under a name wins.
  pub fn add(&mut self, set: S) -> Result<bool> {
    if set.name().is_empty() {
      return Err(GroupError::Unnamed);
    }

    match self.sets.entry(set.name().to_string()) {
      Entry::Occupied(entry) => {
        log::debug!("not adding '{}': name already present", entry.key());
        Ok(false)
      },
      Entry::Vacant(entry) => {
        entry.insert(set);
        self.version += 1;
        Ok(true)
      },
    }
  }

  /// Keep the members for which `predicate` returns `true`.
  ///
  /// Returns the number of members kept.
  pub fn filter<F, E>(&mut self, mut predicate: F) -> Result<usize>
  where
    F: FnMut(&S) -> std::result::Result<bool, E>,
    E: Into<BoxError>,
  {
    let mut keep = Vec::with_capacity(self.sets.len());
    for set in self.sets.values() {
      keep.push(predicate(set).map_err(GroupError::callback)?);
    }

    let mut keep = keep.into_iter();
    self.sets.retain(|_, _| keep.next().unwrap_or(false));
    self.version += 1;

    log::debug!("filter kept {} sets", self.sets.len());
    Ok(self.sets.len())
  }

  /// Pairwise merge.
  ///
  /// For every member `first` (in name order) and every member `second` at or
  /// after it, `second`'s bytes are appended to `first`'s row when
  /// `predicate(first, second)` holds. Each row becomes one new member built
  /// with [`Member::from_merged`], and those replace the whole collection.
  ///
  /// Only the upper triangle of the cross product is visited, so a pair is
  /// never compared twice, but every member is compared with itself first.
  /// Two rows producing the same name fail with
  /// [`GroupError::DuplicateName`]. Returns the size of the new collection.
  pub fn merge<F, E>(&mut self, mut predicate: F) -> Result<usize>
  where
    F: FnMut(&S, &S) -> std::result::Result<bool, E>,
    E: Into<BoxError>,
  {
    let members: Vec<&S> = self.sets.values().collect();
    let mut merged = BTreeMap::new();

    for (i, &first) in members.iter().enumerate() {
      let mut row = Vec::new();
      for &second in &members[i..] {
        if predicate(first, second).map_err(GroupError::callback)? {
          row.extend_from_slice(second.bytes());
        }
      }

      insert_unique(&mut merged, S::from_merged(row))?;
    }

    log::debug!("merge turned {} sets into {}", members.len(), merged.len());
    Ok(self.publish(merged))
  }

  /// Replace every member with `mapper(member)`.
  ///
  /// The new collection is keyed by the names of the returned members; two
  /// results sharing a name fail with [`GroupError::DuplicateName`].
  pub fn for_each<F, E>(&mut self, mut mapper: F) -> Result<()>
  where
    F: FnMut(&S) -> std::result::Result<S, E>,
    E: Into<BoxError>,
  {
    let mut mapped = BTreeMap::new();
    for set in self.sets.values() {
      let new = mapper(set).map_err(GroupError::callback)?;
      insert_unique(&mut mapped, new)?;
    }

    self.publish(mapped);
    Ok(())
  }

  fn publish(&mut self, sets: BTreeMap<String, S>) -> usize {
    self.sets = sets;
    self.version += 1;
    self.sets.len()
  }
}

/// Key `set` by its name in a collection being rebuilt.
fn insert_unique<S: Member>(sets: &mut BTreeMap<String, S>, set: S) -> Result<()> {
  if set.name().is_empty() {
    return Err(GroupError::Unnamed);
  }
  match sets.entry(set.name().to_string()) {
    Entry::Occupied(entry) => Err(GroupError::DuplicateName(entry.key().clone())),
    Entry::Vacant(entry) => {
      entry.insert(set);
      Ok(())
    },
  }
}

impl Group<Set> {
  /// A group of file-backed sets, one per file. A file listed twice is
  /// loaded once.
  pub fn from_files(files: impl IntoIterator<Item = File>) -> Result<Self> {
    let mut group = Self::new();
    for file in files {
      let set = Set::from_file(file)?;
      let name = set.name().to_string();
      if !group.add(set)? {
        log::debug!("skipping {name}: already loaded");
      }
    }
    Ok(group)
  }
}
