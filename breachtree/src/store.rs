//! Byte store abstraction and node-granular access on top of it.
//!
//! The file starts with an 8-byte header: order (u32 LE) at offset 0, root
//! pointer (u32 LE) at offset 4. Node `k` of a tree of order `m` lives at
//! byte offset `8 + k * Node::binary_size(m)`.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};
use crate::node::{Node, NodePointer, UNUSED_POINTER};

/// Byte offset of the first node record.
pub const TREE_OFFSET: u64 = 8;

/// Random-access byte sink/source the engine runs against.
///
/// Reads and writes are exact: a short read or short write is an error, and
/// is surfaced to the caller unchanged. Any `Read + Write + Seek` stream
/// (notably `std::fs::File` and `std::io::Cursor<Vec<u8>>`) qualifies.
pub trait StoreDevice {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> std::io::Result<()>;
    fn write_all_at(&mut self, offset: u64, buf: &[u8]) -> std::io::Result<()>;
    fn sync(&mut self) -> std::io::Result<()>;
}

impl<T: Read + Write + Seek> StoreDevice for T {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }

    fn write_all_at(&mut self, offset: u64, buf: &[u8]) -> std::io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(buf)
    }

    fn sync(&mut self) -> std::io::Result<()> {
        self.flush()
    }
}

/// Node-granular view of a byte store: owns the header fields and the node
/// placement math. Pure serialization layer; it does not validate tree
/// invariants beyond what `Node::decode` rejects.
pub struct NodeStore<D> {
    device: D,
    order: u32,
    root_ptr: NodePointer,
    node_size: u64,
}

impl<D: StoreDevice> NodeStore<D> {
    /// Initialize a fresh store: writes the order and a zero root pointer.
    pub fn create(mut device: D, order: u32) -> Result<Self> {
        if order == 0 {
            return Err(Error::InvalidHeader {
                reason: "order must be at least 1",
            });
        }

        device.write_all_at(0, &order.to_le_bytes())?;
        device.write_all_at(4, &0u32.to_le_bytes())?;

        Ok(Self {
            device,
            order,
            root_ptr: 0,
            node_size: Node::binary_size(order),
        })
    }

    /// Open a store holding a finalized tree; reads order and root pointer.
    pub fn open(mut device: D) -> Result<Self> {
        let mut header = [0u8; 8];
        device.read_exact_at(0, &mut header)?;

        let order = u32::from_le_bytes(header[0..4].try_into().unwrap());
        let root_ptr = NodePointer::from_le_bytes(header[4..8].try_into().unwrap());

        if order == 0 {
            return Err(Error::InvalidHeader {
                reason: "order must be at least 1",
            });
        }
        if root_ptr == UNUSED_POINTER {
            return Err(Error::InvalidHeader {
                reason: "root pointer is unset",
            });
        }

        Ok(Self {
            device,
            order,
            root_ptr,
            node_size: Node::binary_size(order),
        })
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn root_ptr(&self) -> NodePointer {
        self.root_ptr
    }

    pub fn max_keys(&self) -> u32 {
        2 * self.order
    }

    /// Minimum live keys in any non-root node of a finalized tree.
    pub fn min_keys(&self) -> u32 {
        self.order
    }

    /// Minimum live children in any non-root interior node of a finalized tree.
    pub fn min_children(&self) -> u32 {
        self.order + 1
    }

    /// Point the header at a new root and persist it in place.
    pub fn set_root_ptr(&mut self, ptr: NodePointer) -> Result<()> {
        self.root_ptr = ptr;
        self.device.write_all_at(4, &ptr.to_le_bytes())?;
        Ok(())
    }

    fn node_offset(&self, ptr: NodePointer) -> u64 {
        TREE_OFFSET + ptr as u64 * self.node_size
    }

    /// Read the fixed-size record at position `ptr` into a node value.
    pub fn read_node(&mut self, ptr: NodePointer) -> Result<Node> {
        if ptr == UNUSED_POINTER {
            return Err(Error::Corrupt {
                node: ptr,
                reason: "attempted to read the unused-pointer sentinel",
            });
        }

        let mut buf = vec![0u8; self.node_size as usize];
        self.device.read_exact_at(self.node_offset(ptr), &mut buf)?;
        Node::decode(self.order, ptr, &buf)
    }

    /// Write the node's fixed-size record at its `this_pointer` position.
    pub fn write_node(&mut self, node: &Node) -> Result<()> {
        debug_assert_ne!(node.this_pointer, UNUSED_POINTER);
        debug_assert_eq!(node.order(), self.order);

        let mut buf = vec![0u8; self.node_size as usize];
        node.encode(&mut buf);
        self.device
            .write_all_at(self.node_offset(node.this_pointer), &buf)?;
        Ok(())
    }

    pub fn sync(&mut self) -> Result<()> {
        self.device.sync()?;
        Ok(())
    }

    pub fn into_device(self) -> D {
        self.device
    }
}
