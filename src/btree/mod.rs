//! B+ tree operations over pager-backed pages.
//!
//! The tree indexes rows by id. The root lives on page 0 and keeps that
//! page number for the life of the file; a root split copies the old root
//! aside and rewrites page 0 as an internal node in place. With only the
//! root split implemented the tree is at most two levels deep.

pub mod node;

mod error;

pub use error::{BTreeError, BTreeResult};

use crate::record::Row;
use crate::storage::{PageNum, Pager};

use node::NodeKind;

/// A position inside the tree: a page and a cell slot within it.
///
/// `end_of_table` is only meaningful for scan cursors; search cursors use
/// the position as an insertion point. Any mutating tree call invalidates
/// outstanding cursors.
#[derive(Debug, Clone)]
pub struct Cursor {
    pub page_num: PageNum,
    pub cell_num: u32,
    pub end_of_table: bool,
}

/// Find the position of `key`, or the slot where it would be inserted.
pub fn table_find(pager: &mut Pager, root_page_num: PageNum, key: u32) -> BTreeResult<Cursor> {
    let root = pager.get_page(root_page_num)?;
    match node::node_kind(root)? {
        NodeKind::Leaf => leaf_node_find(pager, root_page_num, key),
        NodeKind::Internal => internal_node_find(pager, root_page_num, key),
    }
}

fn internal_node_find(pager: &mut Pager, page_num: PageNum, key: u32) -> BTreeResult<Cursor> {
    let node_buf = pager.get_page(page_num)?;
    let num_keys = node::internal_num_keys(node_buf);

    // Binary search for the first cell whose key is >= the probe.
    let mut min_idx = 0u32;
    let mut max_idx = num_keys;
    while min_idx != max_idx {
        let idx = (min_idx + max_idx) / 2;
        if node::internal_key(node_buf, idx) >= key {
            max_idx = idx;
        } else {
            min_idx = idx + 1;
        }
    }

    let child_num = node::internal_child(node_buf, min_idx);
    let child = pager.get_page(child_num)?;
    match node::node_kind(child)? {
        NodeKind::Leaf => leaf_node_find(pager, child_num, key),
        NodeKind::Internal => internal_node_find(pager, child_num, key),
    }
}

fn leaf_node_find(pager: &mut Pager, page_num: PageNum, key: u32) -> BTreeResult<Cursor> {
    let node_buf = pager.get_page(page_num)?;
    let num_cells = node::leaf_num_cells(node_buf);

    let mut min_index = 0u32;
    let mut one_past_max_index = num_cells;
    while one_past_max_index != min_index {
        let idx = (min_index + one_past_max_index) / 2;
        let key_at_index = node::leaf_key(node_buf, idx);
        if key == key_at_index {
            return Ok(Cursor {
                page_num,
                cell_num: idx,
                end_of_table: false,
            });
        }
        if key < key_at_index {
            one_past_max_index = idx;
        } else {
            min_index = idx + 1;
        }
    }

    Ok(Cursor {
        page_num,
        cell_num: min_index,
        end_of_table: false,
    })
}

/// A cursor at the smallest key in the tree.
pub fn table_start(pager: &mut Pager, root_page_num: PageNum) -> BTreeResult<Cursor> {
    let mut page_num = root_page_num;
    loop {
        let node_buf = pager.get_page(page_num)?;
        match node::node_kind(node_buf)? {
            NodeKind::Leaf => {
                let end_of_table = node::leaf_num_cells(node_buf) == 0;
                return Ok(Cursor {
                    page_num,
                    cell_num: 0,
                    end_of_table,
                });
            }
            NodeKind::Internal => {
                page_num = node::internal_child(node_buf, 0);
            }
        }
    }
}

/// The serialized-row bytes the cursor points at.
pub fn cursor_value<'a>(pager: &'a mut Pager, cursor: &Cursor) -> BTreeResult<&'a mut [u8]> {
    let page = pager.get_page(cursor.page_num)?;
    Ok(node::leaf_value_mut(page, cursor.cell_num))
}

/// Step the cursor one cell forward in key order.
///
/// When a non-root leaf runs out, the next sibling is resolved through the
/// root's child list; the tree never exceeds two levels, so the root
/// enumerates every leaf in order.
pub fn cursor_advance(
    pager: &mut Pager,
    root_page_num: PageNum,
    cursor: &mut Cursor,
) -> BTreeResult<()> {
    let node_buf = pager.get_page(cursor.page_num)?;
    cursor.cell_num += 1;
    if cursor.cell_num < node::leaf_num_cells(node_buf) {
        return Ok(());
    }

    if cursor.page_num == root_page_num {
        cursor.end_of_table = true;
        return Ok(());
    }

    let current = cursor.page_num;
    let root = pager.get_page(root_page_num)?;
    if node::node_kind(root)? != NodeKind::Internal {
        cursor.end_of_table = true;
        return Ok(());
    }

    let num_keys = node::internal_num_keys(root);
    let position = (0..=num_keys).find(|&i| node::internal_child(root, i) == current);
    match position {
        Some(i) if i < num_keys => {
            let next = node::internal_child(root, i + 1);
            cursor.page_num = next;
            cursor.cell_num = 0;
            let next_node = pager.get_page(next)?;
            if node::leaf_num_cells(next_node) == 0 {
                cursor.end_of_table = true;
            }
        }
        _ => cursor.end_of_table = true,
    }

    Ok(())
}

/// Insert a cell at the cursor's position, splitting the leaf when full.
///
/// The caller is responsible for the duplicate-key check; by the time this
/// runs the slot is taken unconditionally.
pub fn leaf_node_insert(
    pager: &mut Pager,
    root_page_num: PageNum,
    cursor: &Cursor,
    key: u32,
    row: &Row,
) -> BTreeResult<()> {
    let node_buf = pager.get_page(cursor.page_num)?;
    let num_cells = node::leaf_num_cells(node_buf);
    if num_cells as usize >= node::LEAF_NODE_MAX_CELLS {
        return leaf_node_split_and_insert(pager, root_page_num, cursor, key, row);
    }

    if cursor.cell_num < num_cells {
        // Shift cells one slot right to make room.
        for i in (cursor.cell_num + 1..=num_cells).rev() {
            let src = node::leaf_cell_offset(i - 1);
            node_buf.copy_within(
                src..src + node::LEAF_NODE_CELL_SIZE,
                node::leaf_cell_offset(i),
            );
        }
    }

    node::set_leaf_num_cells(node_buf, num_cells + 1);
    node::set_leaf_key(node_buf, cursor.cell_num, key);
    row.serialize(node::leaf_value_mut(node_buf, cursor.cell_num));
    Ok(())
}

/// Split a full leaf, distributing the existing cells plus the new one
/// evenly between the old (left) and a freshly allocated (right) leaf.
/// Splitting the root then promotes a new internal root; splitting any
/// other leaf is not implemented.
fn leaf_node_split_and_insert(
    pager: &mut Pager,
    root_page_num: PageNum,
    cursor: &Cursor,
    key: u32,
    row: &Row,
) -> BTreeResult<()> {
    let new_page_num = pager.num_pages();
    let (old_node, new_node) = pager.get_page_pair(cursor.page_num, new_page_num)?;

    node::initialize_leaf_node(new_node);
    node::set_node_parent(new_node, node::node_parent(old_node));

    // Walk the combined MAX + 1 cells from the top, placing each in its
    // final slot. Moving right-to-left keeps in-place shifts safe.
    for i in (0..=node::LEAF_NODE_MAX_CELLS as u32).rev() {
        let in_new = i as usize >= node::LEAF_NODE_LEFT_SPLIT_COUNT;
        let index_within = i % node::LEAF_NODE_LEFT_SPLIT_COUNT as u32;

        if i == cursor.cell_num {
            let destination: &mut [u8] = if in_new {
                &mut new_node[..]
            } else {
                &mut old_node[..]
            };
            node::set_leaf_key(destination, index_within, key);
            row.serialize(node::leaf_value_mut(destination, index_within));
        } else {
            let src = if i > cursor.cell_num { i - 1 } else { i };
            if in_new {
                node::leaf_cell_mut(new_node, index_within)
                    .copy_from_slice(node::leaf_cell(old_node, src));
            } else {
                let src_offset = node::leaf_cell_offset(src);
                old_node.copy_within(
                    src_offset..src_offset + node::LEAF_NODE_CELL_SIZE,
                    node::leaf_cell_offset(index_within),
                );
            }
        }
    }

    node::set_leaf_num_cells(old_node, node::LEAF_NODE_LEFT_SPLIT_COUNT as u32);
    node::set_leaf_num_cells(new_node, node::LEAF_NODE_RIGHT_SPLIT_COUNT as u32);

    if node::is_root(old_node) {
        create_new_root(pager, root_page_num, new_page_num)
    } else {
        Err(BTreeError::NonRootSplit)
    }
}

/// Turn page 0 into an internal root over the split halves.
///
/// The old root's contents move to a new left-child page so the root keeps
/// its page number; page 0 is then rewritten in place as an internal node
/// with one key and two children.
fn create_new_root(
    pager: &mut Pager,
    root_page_num: PageNum,
    right_child_page_num: PageNum,
) -> BTreeResult<()> {
    let left_child_page_num = pager.num_pages();
    let (root, left_child) = pager.get_page_pair(root_page_num, left_child_page_num)?;

    left_child.copy_from_slice(root);
    node::set_root(left_child, false);

    node::initialize_internal_node(root);
    node::set_root(root, true);
    node::set_internal_num_keys(root, 1);
    node::set_internal_child(root, 0, left_child_page_num);
    let left_child_max_key = node::node_max_key(left_child);
    node::set_internal_key(root, 0, left_child_max_key);
    node::set_internal_right_child(root, right_child_page_num);

    node::set_node_parent(left_child, root_page_num);
    let right_child = pager.get_page(right_child_page_num)?;
    node::set_node_parent(right_child, root_page_num);

    Ok(())
}

/// Render the tree rooted at `page_num` as the `.btree` dump.
pub fn render_tree(pager: &mut Pager, page_num: PageNum) -> BTreeResult<String> {
    let mut out = String::new();
    render_node(pager, page_num, 0, &mut out)?;
    Ok(out)
}

fn render_node(
    pager: &mut Pager,
    page_num: PageNum,
    level: usize,
    out: &mut String,
) -> BTreeResult<()> {
    let node_buf = pager.get_page(page_num)?;
    match node::node_kind(node_buf)? {
        NodeKind::Leaf => {
            let num_cells = node::leaf_num_cells(node_buf);
            indent(out, level);
            out.push_str(&format!("- leaf (size {num_cells})\n"));
            for i in 0..num_cells {
                indent(out, level + 1);
                out.push_str(&format!("- key {}\n", node::leaf_key(node_buf, i)));
            }
        }
        NodeKind::Internal => {
            let num_keys = node::internal_num_keys(node_buf);
            let keys: Vec<u32> = (0..num_keys).map(|i| node::internal_key(node_buf, i)).collect();
            let children: Vec<PageNum> =
                (0..=num_keys).map(|i| node::internal_child(node_buf, i)).collect();

            indent(out, level);
            out.push_str(&format!("- internal (size {num_keys})\n"));
            for (i, key) in keys.iter().enumerate() {
                render_node(pager, children[i], level + 1, out)?;
                indent(out, level + 1);
                out.push_str(&format!("- key {key}\n"));
            }
            render_node(pager, children[num_keys as usize], level + 1, out)?;
        }
    }
    Ok(())
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}
