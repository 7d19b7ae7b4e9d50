//! Persistent B-tree of SHA-1 digests for breached-password lookups.
//!
//! The engine answers one question — "is this digest in the corpus?" — with
//! a single sequential pass at build time and one root-to-leaf read path at
//! query time. It is built for the Have I Been Pwned style of corpus: a
//! pre-sorted stream of hundreds of millions of 20-byte SHA-1 digests.
//!
//! # Binary Format
//!
//! One file holds the whole tree:
//!
//! - offset 0: order `m` (u32 little-endian)
//! - offset 4: root node pointer (u32 little-endian)
//! - offset 8: node records, each exactly `Node::binary_size(m)` bytes;
//!   node `k` lives at `8 + k * binary_size(m)`
//!
//! A node of order `m` holds up to `2m` keys and `2m + 1` child pointers;
//! after finalization every non-root node holds at least `m` keys. Files
//! written with different orders are not interchangeable; the header
//! disambiguates.
//!
//! # Usage
//!
//! ```
//! use std::io::Cursor;
//! use breachtree::{sha1_from_hex, TreeBuilder, TreeReader};
//!
//! # fn main() -> Result<(), breachtree::Error> {
//! let digest = sha1_from_hex(b"CBFDAC6008F9CAB4083784CBD1874F76618D2A97").unwrap();
//!
//! let mut builder = TreeBuilder::create(Cursor::new(Vec::new()), 2)?;
//! builder.insert_sorted(&digest)?;
//! let device = builder.finalize()?;
//!
//! let mut reader = TreeReader::open(device)?;
//! assert!(reader.contains(&digest)?);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod conversion;
pub mod error;
pub mod node;
pub mod reader;
pub mod store;

pub use builder::TreeBuilder;
pub use conversion::{hex_to_nibble, sha1_from_hex, sha1_to_hex};
pub use error::{Error, Result};
pub use node::{Node, NodePointer, UNUSED_POINTER};
pub use reader::TreeReader;
pub use store::{NodeStore, StoreDevice, TREE_OFFSET};

/// Length in bytes of a binary SHA-1 digest.
pub const SHA1_SIZE: usize = 20;

/// A binary SHA-1 digest. Ordering is unsigned lexicographic, i.e. the
/// `memcmp` order of the 20 bytes.
pub type Sha1 = [u8; SHA1_SIZE];
