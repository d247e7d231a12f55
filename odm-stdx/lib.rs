//! Host filesystem helpers shared by the odm crates.
//!
//! Everything here is a thin, fallible wrapper over `std::fs`: errors are
//! surfaced as [`std::io::Error`] verbatim so callers can propagate them
//! unchanged.

pub mod env;
pub mod fs;
pub mod path;
