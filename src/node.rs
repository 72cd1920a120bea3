//! Typed views over the bytes of a B-tree node page.
//!
//! Every node starts with the common header:
//!
//! ```text
//! offset 0 : node_type       (1 byte)
//! offset 1 : is_root         (1 byte)
//! offset 2 : parent_pointer  (4 bytes)
//! ```
//!
//! A leaf follows it with `num_cells` (4 bytes) and a packed array of
//! `key (4) | row (ROW_SIZE)` cells sorted by key. Integers are little-endian.

use crate::{
    IS_ROOT_OFFSET, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_KEY_OFFSET,
    LEAF_NODE_MAX_CELLS, LEAF_NODE_NUM_CELLS_OFFSET, LEAF_NODE_VALUE_OFFSET,
    LEAF_NODE_VALUE_SIZE, NODE_TYPE_OFFSET, PAGE_SIZE, PARENT_POINTER_OFFSET, ROW_SIZE,
};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

impl TryFrom<u8> for NodeType {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            0 => Ok(NodeType::Internal),
            1 => Ok(NodeType::Leaf),
            other => Err(other),
        }
    }
}

/// Reads the node type tag of any node page.
pub fn node_type(page: &[u8]) -> std::result::Result<NodeType, u8> {
    NodeType::try_from(page[NODE_TYPE_OFFSET])
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn cell_offset(index: usize) -> usize {
    LEAF_NODE_HEADER_SIZE + index * LEAF_NODE_CELL_SIZE
}

/// A leaf node laid over a page buffer. `B` is `&Page` for reads and
/// `&mut Page` for writes.
pub struct LeafNode<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> LeafNode<B> {
    pub fn new(buf: B) -> Self {
        debug_assert_eq!(buf.as_ref().len(), PAGE_SIZE);
        Self { buf }
    }

    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.bytes()[IS_ROOT_OFFSET] != 0
    }

    pub fn num_cells(&self) -> usize {
        read_u32(self.bytes(), LEAF_NODE_NUM_CELLS_OFFSET) as usize
    }

    pub fn is_full(&self) -> bool {
        self.num_cells() >= LEAF_NODE_MAX_CELLS
    }

    pub fn key(&self, index: usize) -> u32 {
        debug_assert!(index < self.num_cells());
        read_u32(self.bytes(), cell_offset(index) + LEAF_NODE_KEY_OFFSET)
    }

    pub fn value(&self, index: usize) -> &[u8] {
        debug_assert!(index < self.num_cells());
        let start = cell_offset(index) + LEAF_NODE_VALUE_OFFSET;
        &self.bytes()[start..start + LEAF_NODE_VALUE_SIZE]
    }

    /// Binary search for `key`: the first index whose key is not smaller.
    /// An exact match at that index means the key is already stored.
    pub fn find_position(&self, key: u32) -> usize {
        let mut lo = 0;
        let mut hi = self.num_cells();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key(mid) < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Cell count as stored, checked against what fits in a page.
    pub fn check(&self) -> std::result::Result<(), &'static str> {
        if node_type(self.bytes()) != Ok(NodeType::Leaf) {
            return Err("not a leaf node");
        }
        if self.num_cells() > LEAF_NODE_MAX_CELLS {
            return Err("cell count exceeds leaf capacity");
        }
        Ok(())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafNode<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    /// Formats the page as an empty leaf.
    pub fn initialize(&mut self, is_root: bool) {
        let bytes = self.bytes_mut();
        bytes[..LEAF_NODE_HEADER_SIZE].fill(0);
        bytes[NODE_TYPE_OFFSET] = NodeType::Leaf as u8;
        bytes[IS_ROOT_OFFSET] = u8::from(is_root);
        write_u32(bytes, PARENT_POINTER_OFFSET, 0);
        write_u32(bytes, LEAF_NODE_NUM_CELLS_OFFSET, 0);
    }

    fn set_num_cells(&mut self, n: usize) {
        write_u32(self.bytes_mut(), LEAF_NODE_NUM_CELLS_OFFSET, n as u32);
    }

    /// Inserts a cell at `index`, shifting cells `[index, n)` one slot right.
    ///
    /// The caller checks capacity and ordering first; this only moves bytes.
    pub fn insert_cell(&mut self, index: usize, key: u32, value: &[u8; ROW_SIZE]) {
        let num_cells = self.num_cells();
        assert!(num_cells < LEAF_NODE_MAX_CELLS, "leaf node is full");
        assert!(index <= num_cells, "cell index {index} past end {num_cells}");

        let start = cell_offset(index);
        let bytes = self.bytes_mut();
        if index < num_cells {
            bytes.copy_within(start..cell_offset(num_cells), start + LEAF_NODE_CELL_SIZE);
        }
        write_u32(bytes, start + LEAF_NODE_KEY_OFFSET, key);
        let value_start = start + LEAF_NODE_VALUE_OFFSET;
        bytes[value_start..value_start + LEAF_NODE_VALUE_SIZE].copy_from_slice(value);

        self.set_num_cells(num_cells + 1);
    }
}
