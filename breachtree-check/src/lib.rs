//! Looks up a SHA-1 digest in a `breachtree` B-tree file, either given
//! directly as 40 hex characters or derived from a password.

pub mod digest;
pub mod error;

pub use digest::{password_digest, resolve_digest};
pub use error::Error;
