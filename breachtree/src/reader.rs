//! Read-only lookups against a finalized tree.

use crate::error::{Error, Result};
use crate::node::UNUSED_POINTER;
use crate::store::{NodeStore, StoreDevice};
use crate::Sha1;

/// Deepest descent the reader will follow before declaring the file corrupt.
/// Real trees stay under ten levels even for billion-key corpora.
const MAX_DEPTH: u32 = 64;

/// Tree reader: descends from the root, binary-searching each node's live
/// key prefix, until it finds the key or falls off a leaf.
pub struct TreeReader<D> {
    store: NodeStore<D>,
}

impl<D: StoreDevice> TreeReader<D> {
    /// Open a store holding a finalized tree.
    pub fn open(device: D) -> Result<Self> {
        Ok(Self {
            store: NodeStore::open(device)?,
        })
    }

    pub fn order(&self) -> u32 {
        self.store.order()
    }

    /// Whether `key` is present in the tree.
    ///
    /// Never fails on a well-formed file; I/O failures and detected
    /// corruption are surfaced as errors, not mapped to `false`.
    pub fn contains(&mut self, key: &Sha1) -> Result<bool> {
        let mut ptr = self.store.root_ptr();

        for _ in 0..MAX_DEPTH {
            let node = self.store.read_node(ptr)?;

            let child_idx = match node.search(key) {
                Ok(_) => return Ok(true),
                Err(child_idx) => child_idx,
            };

            if node.is_leaf {
                return Ok(false);
            }

            let child = node.pointers[child_idx];
            if child == UNUSED_POINTER {
                return Err(Error::Corrupt {
                    node: ptr,
                    reason: "descent reached an unused child pointer",
                });
            }
            ptr = child;
        }

        Err(Error::Corrupt {
            node: ptr,
            reason: "descent exceeded maximum plausible depth",
        })
    }

    pub fn into_device(self) -> D {
        self.store.into_device()
    }
}
