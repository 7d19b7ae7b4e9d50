//! One-pass bulk construction of a tree from a strictly ascending key stream.
//!
//! Because keys arrive sorted, every overflow happens at the right edge of
//! the tree: only the rightmost root-to-leaf path is mutable, and a node is
//! flushed the moment it stops being part of that path. Finalization then
//! repairs minimum occupancy on the right edge in two passes:
//!
//! 1. a fulfillment pass that pads under-filled interior nodes with fresh
//!    empty ("synthetic") children up to `m + 1` pointers, and
//! 2. a key-rebalance pass that walks the finalized shape in reverse
//!    in-order order, writing keys lent by flushed nodes to the left into
//!    every slot it passes until the occupancy deficit is paid off. The
//!    donor that covers the last of the deficit keeps its untouched key
//!    prefix and is rewritten with its reduced `keys_count`.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::node::{Node, NodePointer, UNUSED_POINTER};
use crate::store::{NodeStore, StoreDevice};
use crate::Sha1;

/// Bulk loader for a tree of order `m` over a writable byte store.
///
/// Keys must be fed in strictly ascending `memcmp` order with no duplicates;
/// feeding anything else is undefined by contract (asserted in debug
/// builds). After [`finalize`](Self::finalize) the store holds a tree in
/// which every non-root node has between `m` and `2m` live keys.
pub struct TreeBuilder<D> {
    store: NodeStore<D>,
    /// Rightmost root-to-leaf path; `path[0]` is the current root and the
    /// last element is the leaf being filled.
    path: Vec<Node>,
    next_node_id: NodePointer,
    height: u32,
    last_key: Option<Sha1>,
    created_during_rebalance: HashSet<NodePointer>,
    keys_taken_from: HashMap<NodePointer, u32>,
}

impl<D: StoreDevice> TreeBuilder<D> {
    /// Start a build: writes the header and seeds an empty root leaf.
    pub fn create(device: D, order: u32) -> Result<Self> {
        let store = NodeStore::create(device, order)?;

        let mut builder = Self {
            store,
            path: Vec::new(),
            next_node_id: 0,
            height: 1,
            last_key: None,
            created_during_rebalance: HashSet::new(),
            keys_taken_from: HashMap::new(),
        };

        let mut root = Node::new(order, UNUSED_POINTER);
        root.this_pointer = builder.alloc_node();
        root.is_leaf = true;
        builder.path.push(root);

        Ok(builder)
    }

    pub fn order(&self) -> u32 {
        self.store.order()
    }

    /// Levels in the tree so far (1 while the root is still a leaf).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Nodes allocated so far; after `finalize` this is the node count of
    /// the file.
    pub fn node_count(&self) -> u64 {
        self.next_node_id as u64
    }

    /// Insert the next key of the stream.
    ///
    /// `key` must be strictly greater than every previously inserted key;
    /// the split path relies on it when writing a carried key as a parent's
    /// new rightmost key without any rotation.
    pub fn insert_sorted(&mut self, key: &Sha1) -> Result<()> {
        debug_assert!(
            self.last_key.map_or(true, |last| last < *key),
            "insert_sorted requires strictly ascending keys"
        );
        self.last_key = Some(*key);

        if self.current().is_full() {
            self.split_node(key, 0)
        } else {
            self.current().push_key(key);
            Ok(())
        }
    }

    /// Drain a sorted key source into the builder.
    pub fn insert_all<I>(&mut self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = Sha1>,
    {
        for key in keys {
            self.insert_sorted(&key)?;
        }
        Ok(())
    }

    /// Flush the spine and repair minimum occupancy on the right edge.
    /// Returns the synced device.
    pub fn finalize(mut self) -> Result<D> {
        let path = std::mem::take(&mut self.path);
        for node in &path {
            self.store.write_node(node)?;
        }

        if self.height > 1 {
            self.create_nodes_to_fulfill(self.store.root_ptr(), 1)?;
            self.rebalance_keys()?;
        }

        self.store.sync()?;
        Ok(self.store.into_device())
    }

    fn alloc_node(&mut self) -> NodePointer {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    fn current(&mut self) -> &mut Node {
        self.path.last_mut().expect("builder path is never empty")
    }

    /// Propagate an overflow up the spine. `level_from_leaves` is how many
    /// levels above the leaf layer the overflowing node sits.
    fn split_node(&mut self, key: &Sha1, level_from_leaves: u32) -> Result<()> {
        if self.path.len() == 1 {
            return self.split_root_and_grow(key, level_from_leaves);
        }

        let node = self.path.pop().expect("builder path is never empty");
        self.store.write_node(&node)?;

        if self.current().is_full() {
            self.split_node(key, level_from_leaves + 1)
        } else {
            self.current().push_key(key);
            self.create_children_till_leaf(level_from_leaves);
            Ok(())
        }
    }

    fn split_root_and_grow(&mut self, key: &Sha1, level_from_leaves: u32) -> Result<()> {
        let new_root_ptr = self.alloc_node();

        let mut old_root = self.path.pop().expect("builder path is never empty");
        let old_root_ptr = old_root.this_pointer;
        old_root.parent_pointer = new_root_ptr;
        self.store.write_node(&old_root)?;

        let mut new_root = Node::new(self.store.order(), UNUSED_POINTER);
        new_root.this_pointer = new_root_ptr;
        new_root.push_key(key);
        new_root.pointers[0] = old_root_ptr;
        self.path.push(new_root);

        self.create_children_till_leaf(level_from_leaves);

        self.store.set_root_ptr(new_root_ptr)?;
        self.height += 1;
        Ok(())
    }

    /// Materialize an empty rightmost spine below the current back of the
    /// path: `level_from_leaves + 1` fresh nodes, the last being a leaf.
    fn create_children_till_leaf(&mut self, level_from_leaves: u32) {
        for level in (0..=level_from_leaves).rev() {
            let child_ptr = self.alloc_node();
            let order = self.store.order();

            let parent = self.path.last_mut().expect("builder path is never empty");
            let mut child = Node::new(order, parent.this_pointer);
            child.this_pointer = child_ptr;
            child.is_leaf = level == 0;
            parent.pointers[parent.keys_count as usize] = child_ptr;

            self.path.push(child);
        }
    }

    /// Fulfillment pass: descend the rightmost spine and pad every non-root
    /// interior node short of `m + 1` children with synthetic empty
    /// subtrees. Interior nodes off the spine were flushed full and need
    /// nothing.
    fn create_nodes_to_fulfill(&mut self, ptr: NodePointer, level: u32) -> Result<()> {
        let mut node = self.store.read_node(ptr)?;
        if node.is_leaf {
            return Ok(());
        }

        self.create_nodes_to_fulfill(node.rightmost_pointer(), level + 1)?;

        if ptr == self.store.root_ptr() {
            return Ok(());
        }

        let children = node.children_count();
        if children >= self.store.min_children() {
            return Ok(());
        }

        self.pad_children(&mut node, children, level)?;
        self.store.write_node(&node)
    }

    /// Append synthetic children to `node` from slot `existing` up to the
    /// `m + 1` minimum, recursing so synthetic interior nodes are themselves
    /// padded down to the leaf layer.
    fn pad_children(&mut self, node: &mut Node, existing: u32, level: u32) -> Result<()> {
        let children_are_leaves = level + 1 == self.height;

        for child_idx in existing..self.store.min_children() {
            let child_ptr = self.alloc_node();
            let mut child = Node::new(self.store.order(), node.this_pointer);
            child.this_pointer = child_ptr;
            child.is_leaf = children_are_leaves;

            self.created_during_rebalance.insert(child_ptr);
            node.pointers[child_idx as usize] = child_ptr;

            if !children_are_leaves {
                self.pad_children(&mut child, 0, level + 1)?;
            }
            self.store.write_node(&child)?;
        }

        Ok(())
    }

    fn rebalance_keys(&mut self) -> Result<()> {
        let root_ptr = self.store.root_ptr();
        let root = self.store.read_node(root_ptr)?;
        let min_keys = self.store.min_keys();

        let mut rebalancer = Rebalancer {
            donor_stack: vec![DonorFrame::new(root)],
            store: &mut self.store,
            keys_taken_from: &mut self.keys_taken_from,
            created_during_rebalance: &self.created_during_rebalance,
            lag: 0,
            min_keys,
            root: root_ptr,
        };

        rebalancer.fill_subtree(root_ptr)?;
        debug_assert_eq!(rebalancer.lag, 0, "rebalance left an occupancy deficit");
        Ok(())
    }
}

/// Donor-walk frame: a node together with the position of its reverse
/// in-order cursor. For a leaf, `child_idx` counts remaining keys; for an
/// interior node it is the index of the child about to be (or being)
/// visited, with the separator left of that child yielded on the way out.
struct DonorFrame {
    node: Node,
    child_idx: u32,
    descended: bool,
}

impl DonorFrame {
    fn new(node: Node) -> Self {
        let child_idx = node.keys_count;
        Self {
            node,
            child_idx,
            descended: false,
        }
    }
}

/// Key-rebalance pass over a fulfilled tree.
///
/// Two reverse in-order walks run in lockstep. The donor walk enumerates
/// the pre-rebalance keys greatest-first (synthetic subtrees hold no keys
/// and are never entered), charging each yielded key to `keys_taken_from`.
/// The fill walk visits the finalized shape and writes one donor key into
/// each slot it passes. `lag` is the number of slots the fill walk has
/// visited beyond the keys the region originally held; once a donor leaf
/// can absorb the whole remaining lag by giving up tail keys, everything to
/// its left is already in place and the walk stops.
struct Rebalancer<'a, D> {
    store: &'a mut NodeStore<D>,
    donor_stack: Vec<DonorFrame>,
    keys_taken_from: &'a mut HashMap<NodePointer, u32>,
    created_during_rebalance: &'a HashSet<NodePointer>,
    lag: u64,
    min_keys: u32,
    root: NodePointer,
}

impl<D: StoreDevice> Rebalancer<'_, D> {
    /// Returns `true` once the walk has converged with the untouched region.
    fn fill_subtree(&mut self, ptr: NodePointer) -> Result<bool> {
        let mut node = self.store.read_node(ptr)?;
        if node.is_leaf {
            return self.fill_leaf(&mut node);
        }

        // Interior occupancy is dictated by the fulfilled shape.
        let children = node.children_count();
        let final_keys = children - 1;
        debug_assert!(final_keys >= node.keys_count);
        self.lag += (final_keys - node.keys_count) as u64;
        node.keys_count = final_keys;

        let mut converged = false;
        for child_idx in (0..children).rev() {
            converged = self.fill_subtree(node.pointers[child_idx as usize])?;
            if converged {
                break;
            }
            if child_idx > 0 {
                if self.lag == 0 {
                    converged = true;
                    break;
                }
                node.keys[child_idx as usize - 1] = self.next_donor_key()?;
            }
        }

        self.store.write_node(&node)?;
        Ok(converged)
    }

    fn fill_leaf(&mut self, node: &mut Node) -> Result<bool> {
        let on_disk = node.keys_count;

        if on_disk < self.min_keys {
            // Right-edge leaf (spine or synthetic): top up to the minimum.
            self.lag += (self.min_keys - on_disk) as u64;
            self.refill(node)?;
            return Ok(false);
        }

        if self.lag == 0 {
            return Ok(true);
        }

        let spare = (on_disk - self.min_keys) as u64;
        if self.lag <= spare {
            // This donor's lent tail covers the rest of the deficit; its
            // remaining prefix is already in place.
            debug_assert_eq!(
                self.keys_taken_from
                    .get(&node.this_pointer)
                    .copied()
                    .unwrap_or(0) as u64,
                self.lag
            );
            node.keys_count = on_disk - self.lag as u32;
            self.store.write_node(node)?;
            self.lag = 0;
            return Ok(true);
        }

        self.refill(node)?;
        self.lag -= spare;
        Ok(false)
    }

    /// Rewrite every kept slot of `node` with the next donor keys and flush
    /// it at minimum occupancy.
    fn refill(&mut self, node: &mut Node) -> Result<()> {
        for slot in (0..self.min_keys as usize).rev() {
            node.keys[slot] = self.next_donor_key()?;
        }
        node.keys_count = self.min_keys;
        self.store.write_node(node)
    }

    /// The greatest key not yet lent to the fill walk.
    fn next_donor_key(&mut self) -> Result<Sha1> {
        loop {
            let Some(frame) = self.donor_stack.last_mut() else {
                return Err(Error::Corrupt {
                    node: self.root,
                    reason: "donor keys exhausted during rebalance",
                });
            };

            if frame.node.is_leaf {
                if frame.child_idx == 0 {
                    self.donor_stack.pop();
                    continue;
                }
                frame.child_idx -= 1;
                let key = frame.node.keys[frame.child_idx as usize];
                let donor = frame.node.this_pointer;
                *self.keys_taken_from.entry(donor).or_default() += 1;
                return Ok(key);
            }

            if !frame.descended {
                frame.descended = true;
                let child_ptr = frame.node.pointers[frame.child_idx as usize];
                debug_assert!(
                    !self.created_during_rebalance.contains(&child_ptr),
                    "donor walk entered a synthetic subtree"
                );
                let child = self.store.read_node(child_ptr)?;
                self.donor_stack.push(DonorFrame::new(child));
                continue;
            }

            // Child at child_idx is exhausted; yield the separator to its
            // left, then move on to the subtree below that separator.
            if frame.child_idx == 0 {
                self.donor_stack.pop();
                continue;
            }
            frame.child_idx -= 1;
            frame.descended = false;
            let key = frame.node.keys[frame.child_idx as usize];
            let donor = frame.node.this_pointer;
            *self.keys_taken_from.entry(donor).or_default() += 1;
            return Ok(key);
        }
    }
}
