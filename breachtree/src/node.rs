//! In-memory node record and its fixed-width binary form.
//!
//! A node of order `m` serializes to exactly `binary_size(m)` bytes, field
//! order `is_leaf, keys_count, pointers, keys, parent_pointer`, all integers
//! little-endian. Only the first `keys_count` key slots are live; slots past
//! that may hold stale bytes from earlier writes.

use crate::error::{Error, Result};
use crate::{Sha1, SHA1_SIZE};

/// Node identifier: both a logical reference and the node's positional index
/// in the file.
pub type NodePointer = u32;

/// Sentinel for an absent pointer (no parent / no child in that slot).
pub const UNUSED_POINTER: NodePointer = NodePointer::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub is_leaf: bool,
    pub keys_count: u32,
    /// `2m + 1` child pointers. Leaves leave every slot `UNUSED_POINTER`.
    pub pointers: Vec<NodePointer>,
    /// `2m` key slots.
    pub keys: Vec<Sha1>,
    pub parent_pointer: NodePointer,
    /// Position in the store. Not persisted; recomputed from the read offset.
    pub this_pointer: NodePointer,
}

impl Node {
    /// Fresh empty leaf-flagged-off node for the given order.
    pub fn new(order: u32, parent_pointer: NodePointer) -> Self {
        Self {
            is_leaf: false,
            keys_count: 0,
            pointers: vec![UNUSED_POINTER; 2 * order as usize + 1],
            keys: vec![[0u8; SHA1_SIZE]; 2 * order as usize],
            parent_pointer,
            this_pointer: UNUSED_POINTER,
        }
    }

    /// Serialized size in bytes of a node of the given order.
    pub fn binary_size(order: u32) -> u64 {
        let pointers = (2 * order as u64 + 1) * 4;
        let keys = 2 * order as u64 * SHA1_SIZE as u64;
        1 + 4 + pointers + keys + 4
    }

    pub fn order(&self) -> u32 {
        (self.keys.len() / 2) as u32
    }

    pub fn max_keys(&self) -> u32 {
        self.keys.len() as u32
    }

    pub fn is_full(&self) -> bool {
        self.keys_count == self.max_keys()
    }

    /// Append a key after the current greatest. The caller guarantees `key`
    /// is greater than every live key in the node.
    pub fn push_key(&mut self, key: &Sha1) {
        debug_assert!(!self.is_full());
        debug_assert!(self.keys_count == 0 || self.keys[self.keys_count as usize - 1] < *key);
        self.keys[self.keys_count as usize] = *key;
        self.keys_count += 1;
    }

    /// Child holding keys greater than the last live key.
    pub fn rightmost_pointer(&self) -> NodePointer {
        self.pointers[self.keys_count as usize]
    }

    /// Number of live children: the leading run of used pointer slots.
    pub fn children_count(&self) -> u32 {
        self.pointers
            .iter()
            .take_while(|p| **p != UNUSED_POINTER)
            .count() as u32
    }

    /// Binary search the live key prefix. `Ok(slot)` on a hit, `Err(slot)`
    /// with the insertion index (the child to descend into) on a miss.
    pub fn search(&self, key: &Sha1) -> std::result::Result<usize, usize> {
        self.keys[..self.keys_count as usize].binary_search(key)
    }

    /// Serialize into `buf`, which must be exactly `binary_size` bytes.
    pub fn encode(&self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len() as u64, Self::binary_size(self.order()));

        buf[0] = self.is_leaf as u8;
        buf[1..5].copy_from_slice(&self.keys_count.to_le_bytes());

        let mut at = 5;
        for pointer in &self.pointers {
            buf[at..at + 4].copy_from_slice(&pointer.to_le_bytes());
            at += 4;
        }
        for key in &self.keys {
            buf[at..at + SHA1_SIZE].copy_from_slice(key);
            at += SHA1_SIZE;
        }
        buf[at..at + 4].copy_from_slice(&self.parent_pointer.to_le_bytes());
    }

    /// Deserialize a node of the given order read from position `this_pointer`.
    pub fn decode(order: u32, this_pointer: NodePointer, buf: &[u8]) -> Result<Self> {
        debug_assert_eq!(buf.len() as u64, Self::binary_size(order));

        let is_leaf = match buf[0] {
            0 => false,
            1 => true,
            _ => {
                return Err(Error::Corrupt {
                    node: this_pointer,
                    reason: "leaf flag is neither 0 nor 1",
                })
            }
        };

        let keys_count = u32::from_le_bytes(buf[1..5].try_into().unwrap());
        if keys_count > 2 * order {
            return Err(Error::Corrupt {
                node: this_pointer,
                reason: "keys_count exceeds node capacity",
            });
        }

        let mut node = Node::new(order, UNUSED_POINTER);
        node.is_leaf = is_leaf;
        node.keys_count = keys_count;
        node.this_pointer = this_pointer;

        let mut at = 5;
        for pointer in node.pointers.iter_mut() {
            *pointer = NodePointer::from_le_bytes(buf[at..at + 4].try_into().unwrap());
            at += 4;
        }
        for key in node.keys.iter_mut() {
            key.copy_from_slice(&buf[at..at + SHA1_SIZE]);
            at += SHA1_SIZE;
        }
        node.parent_pointer = NodePointer::from_le_bytes(buf[at..at + 4].try_into().unwrap());

        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> Sha1 {
        let mut k = [0u8; 20];
        k[19] = n;
        k
    }

    #[test]
    fn test_binary_size() {
        // order 2: 1 + 4 + 5*4 + 4*20 + 4
        assert_eq!(Node::binary_size(2), 109);
        assert_eq!(Node::binary_size(1), 1 + 4 + 3 * 4 + 2 * 20 + 4);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let mut node = Node::new(2, 7);
        node.is_leaf = false;
        node.this_pointer = 3;
        node.push_key(&key(10));
        node.push_key(&key(20));
        node.pointers[0] = 1;
        node.pointers[1] = 2;
        node.pointers[2] = 4;

        let mut buf = vec![0u8; Node::binary_size(2) as usize];
        node.encode(&mut buf);
        let back = Node::decode(2, 3, &buf).unwrap();

        assert_eq!(back, node);
    }

    #[test]
    fn test_decode_rejects_bad_leaf_flag() {
        let mut buf = vec![0u8; Node::binary_size(1) as usize];
        buf[0] = 2;
        assert!(matches!(
            Node::decode(1, 0, &buf),
            Err(Error::Corrupt { node: 0, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_keys_count() {
        let mut node = Node::new(1, UNUSED_POINTER);
        node.is_leaf = true;
        node.this_pointer = 0;
        let mut buf = vec![0u8; Node::binary_size(1) as usize];
        node.encode(&mut buf);
        // keys_count = 3 > 2m = 2
        buf[1..5].copy_from_slice(&3u32.to_le_bytes());
        assert!(Node::decode(1, 0, &buf).is_err());
    }

    #[test]
    fn test_search() {
        let mut node = Node::new(2, UNUSED_POINTER);
        node.is_leaf = true;
        node.push_key(&key(10));
        node.push_key(&key(20));
        node.push_key(&key(30));

        assert_eq!(node.search(&key(10)), Ok(0));
        assert_eq!(node.search(&key(30)), Ok(2));
        assert_eq!(node.search(&key(5)), Err(0));
        assert_eq!(node.search(&key(15)), Err(1));
        assert_eq!(node.search(&key(40)), Err(3));
    }

    #[test]
    fn test_search_ignores_dead_slots() {
        let mut node = Node::new(2, UNUSED_POINTER);
        node.is_leaf = true;
        node.push_key(&key(10));
        node.push_key(&key(20));
        // Stale data past keys_count must not be considered live.
        node.keys[2] = key(30);

        assert_eq!(node.search(&key(30)), Err(2));
    }

    #[test]
    fn test_children_count() {
        let mut node = Node::new(2, UNUSED_POINTER);
        assert_eq!(node.children_count(), 0);
        node.pointers[0] = 5;
        node.pointers[1] = 6;
        assert_eq!(node.children_count(), 2);
    }
}
