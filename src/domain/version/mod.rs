//! Dotted version numbers with an optional wildcard tail
//!
//! Versions appear in study filters (`min_version`, `max_os_version`, ...) and
//! are compared with the same rules the client uses when it evaluates a
//! filter: missing trailing components count as zero and a trailing `*`
//! matches any continuation.

mod entity;
mod parse;

pub use entity::Version;
pub use parse::{VersionOptions, VersionParseError};
