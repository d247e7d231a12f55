/// Coarse classification shared by every error type in this crate.
///
/// Lets callers branch on the category of a failure without matching each
/// module's variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// A malformed match list, pattern or set.
  InvalidArgument,
  /// An offset past the end of the buffer.
  OutOfBounds,
  /// A backing resource that does not exist.
  NotFound,
  /// Any other failure reported by the filesystem.
  Io,
  /// A caller supplied predicate or mapper reported an error.
  Callback,
}
