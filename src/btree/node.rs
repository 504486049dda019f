//! On-page node layout.
//!
//! A node is a 4096-byte page interpreted through fixed offsets. Every
//! multi-byte field is little-endian; changing any constant here breaks
//! on-disk compatibility. Accessors take the page buffer directly so the
//! pager stays the only owner of page memory.

use crate::record::ROW_SIZE;
use crate::storage::{PageNum, PAGE_SIZE};

use super::error::{BTreeError, BTreeResult};

/// Node kind tag, stored as the first byte of every node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Internal = 0,
    Leaf = 1,
}

// Common node header layout
pub const NODE_KIND_SIZE: usize = 1;
pub const NODE_KIND_OFFSET: usize = 0;
pub const IS_ROOT_SIZE: usize = 1;
pub const IS_ROOT_OFFSET: usize = NODE_KIND_OFFSET + NODE_KIND_SIZE;
pub const PARENT_POINTER_SIZE: usize = 4;
pub const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
pub const COMMON_NODE_HEADER_SIZE: usize = NODE_KIND_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

// Leaf node header layout
pub const LEAF_NODE_NUM_CELLS_SIZE: usize = 4;
pub const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const LEAF_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS_SIZE;

// Leaf node body layout: cells of (key, serialized row)
pub const LEAF_NODE_KEY_SIZE: usize = 4;
pub const LEAF_NODE_VALUE_SIZE: usize = ROW_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

// On overflow the MAX + 1 cells are divided between the two leaves
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) / 2;
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize =
    LEAF_NODE_MAX_CELLS + 1 - LEAF_NODE_RIGHT_SPLIT_COUNT;

// Internal node header layout
pub const INTERNAL_NODE_NUM_KEYS_SIZE: usize = 4;
pub const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = 4;
pub const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + INTERNAL_NODE_NUM_KEYS_SIZE + INTERNAL_NODE_RIGHT_CHILD_SIZE;

// Internal node body layout: cells of (child page, key)
pub const INTERNAL_NODE_CHILD_SIZE: usize = 4;
pub const INTERNAL_NODE_KEY_SIZE: usize = 4;
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;

fn read_u32(node: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        node[offset],
        node[offset + 1],
        node[offset + 2],
        node[offset + 3],
    ])
}

fn write_u32(node: &mut [u8], offset: usize, value: u32) {
    node[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Read the kind tag of a node.
pub fn node_kind(node: &[u8]) -> BTreeResult<NodeKind> {
    match node[NODE_KIND_OFFSET] {
        0 => Ok(NodeKind::Internal),
        1 => Ok(NodeKind::Leaf),
        other => Err(BTreeError::UnknownNodeKind(other)),
    }
}

pub fn set_node_kind(node: &mut [u8], kind: NodeKind) {
    node[NODE_KIND_OFFSET] = kind as u8;
}

pub fn is_root(node: &[u8]) -> bool {
    node[IS_ROOT_OFFSET] != 0
}

pub fn set_root(node: &mut [u8], root: bool) {
    node[IS_ROOT_OFFSET] = root as u8;
}

/// Parent page number. Written on splits, never read for navigation.
pub fn node_parent(node: &[u8]) -> PageNum {
    read_u32(node, PARENT_POINTER_OFFSET)
}

pub fn set_node_parent(node: &mut [u8], parent: PageNum) {
    write_u32(node, PARENT_POINTER_OFFSET, parent);
}

// ---------------------------------------------------------------------------
// Leaf node accessors
// ---------------------------------------------------------------------------

pub fn leaf_num_cells(node: &[u8]) -> u32 {
    read_u32(node, LEAF_NODE_NUM_CELLS_OFFSET)
}

pub fn set_leaf_num_cells(node: &mut [u8], num_cells: u32) {
    write_u32(node, LEAF_NODE_NUM_CELLS_OFFSET, num_cells);
}

pub(crate) fn leaf_cell_offset(cell_num: u32) -> usize {
    LEAF_NODE_HEADER_SIZE + cell_num as usize * LEAF_NODE_CELL_SIZE
}

pub fn leaf_cell(node: &[u8], cell_num: u32) -> &[u8] {
    let offset = leaf_cell_offset(cell_num);
    &node[offset..offset + LEAF_NODE_CELL_SIZE]
}

pub fn leaf_cell_mut(node: &mut [u8], cell_num: u32) -> &mut [u8] {
    let offset = leaf_cell_offset(cell_num);
    &mut node[offset..offset + LEAF_NODE_CELL_SIZE]
}

pub fn leaf_key(node: &[u8], cell_num: u32) -> u32 {
    read_u32(node, leaf_cell_offset(cell_num))
}

pub fn set_leaf_key(node: &mut [u8], cell_num: u32, key: u32) {
    write_u32(node, leaf_cell_offset(cell_num), key);
}

/// The serialized-row portion of a leaf cell.
pub fn leaf_value(node: &[u8], cell_num: u32) -> &[u8] {
    let offset = leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
    &node[offset..offset + LEAF_NODE_VALUE_SIZE]
}

pub fn leaf_value_mut(node: &mut [u8], cell_num: u32) -> &mut [u8] {
    let offset = leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
    &mut node[offset..offset + LEAF_NODE_VALUE_SIZE]
}

/// Stamp a page as an empty non-root leaf. Body bytes are left as-is; the
/// pager hands out zeroed buffers.
pub fn initialize_leaf_node(node: &mut [u8]) {
    set_node_kind(node, NodeKind::Leaf);
    set_root(node, false);
    set_leaf_num_cells(node, 0);
}

// ---------------------------------------------------------------------------
// Internal node accessors
// ---------------------------------------------------------------------------

pub fn internal_num_keys(node: &[u8]) -> u32 {
    read_u32(node, INTERNAL_NODE_NUM_KEYS_OFFSET)
}

pub fn set_internal_num_keys(node: &mut [u8], num_keys: u32) {
    write_u32(node, INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys);
}

pub fn internal_right_child(node: &[u8]) -> PageNum {
    read_u32(node, INTERNAL_NODE_RIGHT_CHILD_OFFSET)
}

pub fn set_internal_right_child(node: &mut [u8], page_num: PageNum) {
    write_u32(node, INTERNAL_NODE_RIGHT_CHILD_OFFSET, page_num);
}

fn internal_cell_offset(cell_num: u32) -> usize {
    INTERNAL_NODE_HEADER_SIZE + cell_num as usize * INTERNAL_NODE_CELL_SIZE
}

/// Child page for position `child_num` in `0..=num_keys`; `num_keys` itself
/// addresses the right child. Anything past that is an invariant violation.
pub fn internal_child(node: &[u8], child_num: u32) -> PageNum {
    let num_keys = internal_num_keys(node);
    if child_num > num_keys {
        panic!("tried to access child {child_num} > num_keys {num_keys}");
    } else if child_num == num_keys {
        internal_right_child(node)
    } else {
        read_u32(node, internal_cell_offset(child_num))
    }
}

pub fn set_internal_child(node: &mut [u8], child_num: u32, child: PageNum) {
    let num_keys = internal_num_keys(node);
    if child_num > num_keys {
        panic!("tried to set child {child_num} > num_keys {num_keys}");
    } else if child_num == num_keys {
        set_internal_right_child(node, child);
    } else {
        write_u32(node, internal_cell_offset(child_num), child);
    }
}

pub fn internal_key(node: &[u8], key_num: u32) -> u32 {
    read_u32(node, internal_cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE)
}

pub fn set_internal_key(node: &mut [u8], key_num: u32, key: u32) {
    write_u32(
        node,
        internal_cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE,
        key,
    );
}

pub fn initialize_internal_node(node: &mut [u8]) {
    set_node_kind(node, NodeKind::Internal);
    set_root(node, false);
    set_internal_num_keys(node, 0);
}

/// Largest key held by a node: last leaf cell or last internal cell key.
/// Must not be called on an empty or uninitialized node.
pub fn node_max_key(node: &[u8]) -> u32 {
    match node_kind(node) {
        Ok(NodeKind::Leaf) => leaf_key(node, leaf_num_cells(node) - 1),
        Ok(NodeKind::Internal) => internal_key(node, internal_num_keys(node) - 1),
        Err(_) => panic!("max key of a node with an unknown kind byte"),
    }
}
