//! Byte ranges located in a buffer.

use std::{
  borrow::Cow,
  ops::Range,
};

use crate::transform::{
  Result,
  TransformError,
};

/// A half-open `[begin, end)` byte range into a buffer.
///
/// A match carries no data and is only meaningful for the buffer snapshot it
/// was produced from. After any mutation the offsets must be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Match {
  pub begin: usize,
  pub end:   usize,
}

impl Match {
  pub const fn new(begin: usize, end: usize) -> Self {
    Self { begin, end }
  }

  /// A zero-length match at `pos`, i.e. an insertion point.
  pub const fn point(pos: usize) -> Self {
    Self::new(pos, pos)
  }

  pub const fn len(&self) -> usize {
    self.end.saturating_sub(self.begin)
  }

  pub const fn is_empty(&self) -> bool {
    self.begin >= self.end
  }

  pub const fn range(&self) -> Range<usize> {
    self.begin..self.end
  }

  /// The matched bytes of `buffer`.
  pub fn slice<'a>(&self, buffer: &'a [u8]) -> Result<&'a [u8]> {
    self.check(buffer.len())?;
    Ok(&buffer[self.range()])
  }

  /// The matched bytes of `buffer` as text, replacing invalid UTF-8.
  pub fn text<'a>(&self, buffer: &'a [u8]) -> Result<Cow<'a, str>> {
    self.slice(buffer).map(String::from_utf8_lossy)
  }

  /// Convert a table of `[begin, end]` pairs.
  ///
  /// Every row must have exactly two elements.
  pub fn from_pairs<P: AsRef<[usize]>>(pairs: &[P]) -> Result<Vec<Match>> {
    pairs
      .iter()
      .enumerate()
      .map(|(index, pair)| {
        match *pair.as_ref() {
          [begin, end] => Ok(Match::new(begin, end)),
          ref row => {
            Err(TransformError::MalformedPair {
              index,
              len: row.len(),
            })
          },
        }
      })
      .collect()
  }

  pub(crate) fn check(&self, len: usize) -> Result<()> {
    if self.begin > self.end {
      return Err(TransformError::InvalidRange {
        begin: self.begin,
        end:   self.end,
      });
    }
    if self.end > len {
      return Err(TransformError::OutOfBounds {
        begin: self.begin,
        end: self.end,
        len,
      });
    }
    Ok(())
  }
}

impl From<Range<usize>> for Match {
  fn from(range: Range<usize>) -> Self {
    Self::new(range.start, range.end)
  }
}

impl From<Match> for Range<usize> {
  fn from(m: Match) -> Self {
    m.range()
  }
}

/// Check that `matches` can be applied to a buffer of `len` bytes: every
/// match in bounds and not inverted, sorted by `begin`, none overlapping the
/// previous one.
///
/// Zero-length matches may touch their neighbours.
pub fn validate(matches: &[Match], len: usize) -> Result<()> {
  let mut prev_end = 0;
  for m in matches {
    m.check(len)?;
    if m.begin < prev_end {
      return Err(TransformError::Overlapping {
        prev_end,
        begin: m.begin,
        end: m.end,
      });
    }
    prev_end = m.end;
  }
  Ok(())
}
