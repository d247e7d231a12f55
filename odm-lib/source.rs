//! Locating pattern matches in a buffer.

pub use regex_automata::meta::Regex;
use regex_automata::{
  Anchored,
  Input,
};

use crate::matches::Match;

/// All non-overlapping matches of `pattern` in `buffer`, leftmost-first, in
/// ascending order.
///
/// The result is a snapshot of `buffer` and satisfies the ordering required
/// by [`crate::transform::perform`].
pub fn find_all(buffer: &[u8], pattern: &Regex) -> Vec<Match> {
  pattern
    .find_iter(buffer)
    .map(|m| Match::from(m.range()))
    .collect()
}

/// A mapper that expands `replacement` for each match of `pattern`.
///
/// `$1`, `${name}` and `$$` refer to the groups of the match, re-run anchored
/// at the match start against the source buffer. A match that cannot be
/// reproduced gets `replacement` verbatim.
pub fn template<'a>(
  pattern: &'a Regex,
  replacement: &'a [u8],
) -> impl FnMut(Match, &[u8]) -> Option<Vec<u8>> + 'a {
  let mut caps = pattern.create_captures();
  move |m: Match, source: &[u8]| {
    let input = Input::new(source)
      .range(m.begin..)
      .anchored(Anchored::Yes);
    pattern.search_captures(&input, &mut caps);
    if !caps.is_match() {
      return Some(replacement.to_vec());
    }
    let mut expanded = Vec::with_capacity(replacement.len());
    caps.interpolate_bytes_into(source, replacement, &mut expanded);
    Some(expanded)
  }
}
