//! The buffer transformer.
//!
//! Every edit goes through [`perform`]: a single left-to-right pass over a
//! sorted, non-overlapping match list that copies the gaps between matches
//! verbatim and lets a mapper decide what becomes of each match.
//!
//! # Modes
//!
//! - **Replace** - the mapper's bytes take the place of the match
//! - **InsertBefore** - the mapper's bytes, then the matched bytes
//! - **InsertAfter** - the matched bytes, then the mapper's bytes
//! - **Remove** - the match is dropped; the mapper is never called
//!
//! A mapper declines a match by returning `None`, which keeps the matched
//! bytes unchanged in every mode. Declining is not an error.
//!
//! ```
//! use odm_lib::{
//!   Match,
//!   transform,
//! };
//!
//! let out = transform::replace(b"hello world", &[Match::new(6, 11)], |_, _| {
//!   Some(b"earth".to_vec())
//! })
//! .unwrap();
//! assert_eq!(out, b"hello earth");
//! ```
//!
//! # Ordering
//!
//! For each match the matched bytes are read before the mapper runs. The
//! mapper only ever sees the untouched source buffer, never the output being
//! built, so offsets it computes from `Match` stay valid for the whole pass.

use thiserror::Error;

use crate::{
  error::ErrorKind,
  matches::{
    Match,
    validate,
  },
};

pub type Result<T> = std::result::Result<T, TransformError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransformError {
  #[error("invalid match range: begin {begin} is after end {end}")]
  InvalidRange { begin: usize, end: usize },
  #[error("match {begin}..{end} overlaps previous end {prev_end}")]
  Overlapping {
    prev_end: usize,
    begin:    usize,
    end:      usize,
  },
  #[error("match {begin}..{end} is out of bounds for buffer length {len}")]
  OutOfBounds {
    begin: usize,
    end:   usize,
    len:   usize,
  },
  #[error("offset pair {index} has {len} elements, expected 2")]
  MalformedPair { index: usize, len: usize },
}

impl TransformError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
      Self::InvalidRange { .. } | Self::Overlapping { .. } | Self::MalformedPair { .. } => {
        ErrorKind::InvalidArgument
      },
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
  Replace,
  InsertBefore,
  InsertAfter,
  Remove,
}

/// Produce a new buffer from `buffer` by applying `mode` at every match.
///
/// `matches` must be sorted and non-overlapping; this is checked up front so
/// a bad list fails before any output is produced. An empty list yields a
/// copy of `buffer`.
pub fn perform<F>(buffer: &[u8], matches: &[Match], mode: Mode, mut mapper: F) -> Result<Vec<u8>>
where
  F: FnMut(Match, &[u8]) -> Option<Vec<u8>>,
{
  validate(matches, buffer.len())?;

  let mut output = Vec::with_capacity(buffer.len());
  let mut cursor = 0;
  let mut declined = 0;

  for &m in matches {
    // gap before the match
    if cursor < m.begin {
      output.extend_from_slice(&buffer[cursor..m.begin]);
    }
    cursor = m.end;

    if mode == Mode::Remove {
      continue;
    }

    let matched = &buffer[m.range()];
    match (mode, mapper(m, buffer)) {
      (_, None) => {
        declined += 1;
        output.extend_from_slice(matched);
      },
      (Mode::InsertBefore, Some(bytes)) => {
        output.extend_from_slice(&bytes);
        output.extend_from_slice(matched);
      },
      (Mode::InsertAfter, Some(bytes)) => {
        output.extend_from_slice(matched);
        output.extend_from_slice(&bytes);
      },
      (Mode::Replace | Mode::Remove, Some(bytes)) => output.extend_from_slice(&bytes),
    }
  }

  output.extend_from_slice(&buffer[cursor..]);

  log::trace!(
    "{mode:?}: {} matches ({declined} declined), {} -> {} bytes",
    matches.len(),
    buffer.len(),
    output.len()
  );

  Ok(output)
}

pub fn replace<F>(buffer: &[u8], matches: &[Match], mapper: F) -> Result<Vec<u8>>
where
  F: FnMut(Match, &[u8]) -> Option<Vec<u8>>,
{
  perform(buffer, matches, Mode::Replace, mapper)
}

pub fn insert_before<F>(buffer: &[u8], matches: &[Match], mapper: F) -> Result<Vec<u8>>
where
  F: FnMut(Match, &[u8]) -> Option<Vec<u8>>,
{
  perform(buffer, matches, Mode::InsertBefore, mapper)
}

pub fn insert_after<F>(buffer: &[u8], matches: &[Match], mapper: F) -> Result<Vec<u8>>
where
  F: FnMut(Match, &[u8]) -> Option<Vec<u8>>,
{
  perform(buffer, matches, Mode::InsertAfter, mapper)
}

pub fn remove(buffer: &[u8], matches: &[Match]) -> Result<Vec<u8>> {
  perform(buffer, matches, Mode::Remove, |_, _| None)
}

#[cfg(test)]
mod test {
  use quickcheck::{
    TestResult,
    quickcheck,
  };

  use super::*;
  use crate::source::{
    Regex,
    find_all,
  };

  const MODES: [Mode; 4] = [
    Mode::Replace,
    Mode::InsertBefore,
    Mode::InsertAfter,
    Mode::Remove,
  ];

  fn accept(bytes: &str) -> impl FnMut(Match, &[u8]) -> Option<Vec<u8>> + '_ {
    move |_, _| Some(bytes.as_bytes().to_vec())
  }

  /// Turn arbitrary cut points into a sorted, non-overlapping match list.
  fn matches_from_cuts(len: usize, cuts: &[usize]) -> Vec<Match> {
    let mut cuts: Vec<usize> = cuts.iter().map(|cut| cut % (len + 1)).collect();
    cuts.sort_unstable();
    cuts
      .chunks_exact(2)
      .map(|pair| Match::new(pair[0], pair[1]))
      .collect()
  }

  #[test]
  fn replace_word() {
    let out = replace(b"hello world", &[Match::new(6, 11)], accept("earth")).unwrap();
    assert_eq!(out, b"hello earth");
  }

  #[test]
  fn remove_every_match() {
    let matches = [Match::new(1, 2), Match::new(3, 4)];
    assert_eq!(remove(b"aXbXc", &matches).unwrap(), b"abc");
  }

  #[test]
  fn zero_length_insert() {
    let out = insert_before(b"ab", &[Match::point(1)], accept("-")).unwrap();
    assert_eq!(out, b"a-b");
    let out = insert_after(b"ab", &[Match::point(1)], accept("-")).unwrap();
    assert_eq!(out, b"a-b");
  }

  #[test]
  fn inserts_keep_match_on_documented_side() {
    let matches = [Match::new(0, 3), Match::new(4, 7)];
    let before = insert_before(b"foo bar", &matches, accept("<")).unwrap();
    assert_eq!(before, b"<foo <bar");
    let after = insert_after(b"foo bar", &matches, accept(">")).unwrap();
    assert_eq!(after, b"foo> bar>");
  }

  #[test]
  fn declined_matches_are_preserved() {
    let matches = [Match::new(0, 3), Match::new(4, 7)];
    for mode in MODES {
      if mode == Mode::Remove {
        continue;
      }
      let out = perform(b"foo bar", &matches, mode, |m, _| {
        (m.begin == 0).then(|| b"X".to_vec())
      })
      .unwrap();
      let expected: &[u8] = match mode {
        Mode::Replace => b"X bar",
        Mode::InsertBefore => b"Xfoo bar",
        Mode::InsertAfter => b"fooX bar",
        Mode::Remove => unreachable!(),
      };
      assert_eq!(out, expected, "{mode:?}");
    }
  }

  #[test]
  fn mapper_sees_source_buffer() {
    let buffer = b"a1b2";
    let matches = [Match::new(1, 2), Match::new(3, 4)];
    let mut seen = Vec::new();
    let out = replace(buffer, &matches, |m, source| {
      seen.push(source.to_vec());
      let digit = m.slice(source).ok()?;
      Some([digit, digit].concat())
    })
    .unwrap();
    assert_eq!(out, b"a11b22");
    assert!(seen.iter().all(|source| source == buffer));
  }

  #[test]
  fn remove_never_calls_mapper() {
    let mut calls = 0;
    let out = perform(b"xyz", &[Match::new(1, 2)], Mode::Remove, |_, _| {
      calls += 1;
      Some(b"!".to_vec())
    })
    .unwrap();
    assert_eq!(out, b"xz");
    assert_eq!(calls, 0);
  }

  #[test]
  fn out_of_bounds_fails_fast() {
    let mut calls = 0;
    let err = perform(b"abc", &[Match::new(0, 1), Match::new(2, 9)], Mode::Replace, |_, _| {
      calls += 1;
      None
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    assert_eq!(calls, 0);
  }

  #[test]
  fn unsorted_matches_are_rejected() {
    let err = remove(b"aXbXc", &[Match::new(3, 4), Match::new(1, 2)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
  }

  #[test]
  fn stale_offsets_after_mutation() {
    // offsets from the original buffer no longer describe the new one
    let matches = [Match::new(1, 2), Match::new(3, 4)];
    let once = remove(b"aXbXc", &matches).unwrap();
    assert_eq!(once, b"abc");

    let err = remove(&once, &matches).unwrap_err();
    assert_eq!(err, TransformError::OutOfBounds {
      begin: 3,
      end:   4,
      len:   3,
    });

    // in bounds but wrong: removes "b" instead of an "X"
    assert_eq!(remove(&once, &matches[..1]).unwrap(), b"ac");
  }

  #[test]
  fn remove_is_idempotent_after_rematch() {
    let pattern = Regex::new("X").unwrap();
    let buffer = b"aXbXc";

    let once = remove(buffer, &find_all(buffer, &pattern)).unwrap();
    assert_eq!(once, b"abc");

    let matches = find_all(&once, &pattern);
    assert!(matches.is_empty());
    assert_eq!(remove(&once, &matches).unwrap(), once);
  }

  quickcheck! {
    fn empty_match_list_is_identity(buffer: Vec<u8>) -> bool {
      MODES
        .iter()
        .all(|&mode| perform(&buffer, &[], mode, |_, _| Some(b"!".to_vec())).unwrap() == buffer)
    }

    fn output_length_law(buffer: Vec<u8>, cuts: Vec<usize>, replacement: Vec<u8>) -> TestResult {
      let matches = matches_from_cuts(buffer.len(), &cuts);
      let matched: usize = matches.iter().map(Match::len).sum();

      for mode in MODES {
        // accept every other match
        let out = perform(&buffer, &matches, mode, |m, _| {
          (m.begin % 2 == 0).then(|| replacement.clone())
        })
        .unwrap();

        let mut expected = buffer.len() - matched;
        if mode != Mode::Remove {
          for m in &matches {
            let accepted = m.begin % 2 == 0;
            expected += match (mode, accepted) {
              (_, false) => m.len(),
              (Mode::Replace, true) => replacement.len(),
              (_, true) => replacement.len() + m.len(),
            };
          }
        }
        if out.len() != expected {
          return TestResult::failed();
        }
      }
      TestResult::passed()
    }

    fn bytes_outside_matches_are_preserved(buffer: Vec<u8>, cuts: Vec<usize>) -> bool {
      let matches = matches_from_cuts(buffer.len(), &cuts);
      let out = remove(&buffer, &matches).unwrap();

      let mut expected = Vec::new();
      let mut cursor = 0;
      for m in &matches {
        expected.extend_from_slice(&buffer[cursor..m.begin]);
        cursor = m.end;
      }
      expected.extend_from_slice(&buffer[cursor..]);
      out == expected
    }
  }
}
