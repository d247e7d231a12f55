//! Match-driven editing of byte buffers.
//!
//! A [`Set`] owns one buffer and its [`Attributes`]. Callers locate regex
//! matches with [`Matchable`] and hand them, together with a mapper, to one of
//! the [`Mutable`] operations. A [`Group`] keeps many sets keyed by name and
//! rebuilds them in bulk.
//!
//! ```
//! use odm_lib::{
//!   Matchable,
//!   Mutable,
//!   Set,
//! };
//!
//! let mut set = Set::from_bytes("hello world");
//! let matches = set.matches_str("world").unwrap();
//! set.replace(&matches, |_, _| Some(b"earth".to_vec())).unwrap();
//!
//! assert_eq!(set.bytes(), b"hello earth");
//! assert_eq!(set.version(), 1);
//! ```

pub mod attributes;
pub mod error;
pub mod group;
pub mod matches;
pub mod set;
pub mod source;
pub mod transform;

pub use attributes::{
  Attributes,
  DiskAttributes,
  MemoryAttributes,
};
pub use error::ErrorKind;
pub use group::{
  Group,
  GroupError,
  Member,
};
pub use matches::Match;
pub use set::{
  Matchable,
  Mutable,
  Set,
  SetError,
};
pub use source::{
  Regex,
  template,
};
pub use transform::{
  Mode,
  TransformError,
};
