//! Builds a `breachtree` B-tree file from a sorted text corpus of hex SHA-1
//! digests.
//!
//! The expected input is the Have I Been Pwned "ordered by hash" dump, or
//! anything shaped like it: one digest per line, 40 hex characters,
//! optionally followed by `:count`, sorted ascending. Sorting the corpus is
//! out of scope here — the preparer verifies the order as it streams and
//! aborts on the first violation rather than buffering tens of gigabytes to
//! sort them itself.

pub mod corpus;
pub mod error;
pub mod preparer;

pub use corpus::line_to_sha1;
pub use error::Error;
pub use preparer::{prepare, PrepareReport};
