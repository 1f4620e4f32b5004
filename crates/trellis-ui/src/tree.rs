//! Tree identity map: id-keyed node store plus the flattened, expansion-aware
//! row sequence that maps tree structure onto a single scrollable index
//! space.
//!
//! Flattening is depth-first: a node's flattened index comes immediately
//! after its parent and before the parent's next sibling's subtree. A
//! collapsed node contributes only itself. Collapse is non-destructive —
//! descendants keep their own `expanded` flags, so re-expanding an ancestor
//! restores the previous sub-structure.

use crate::ids::{CollectionSource, ItemId};
use smallvec::SmallVec;
use std::collections::HashMap;

struct TreeNode<T> {
    data: T,
    parent: Option<ItemId>,
    children: SmallVec<[ItemId; 4]>,
    expanded: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatRow {
    pub id: ItemId,
    pub depth: usize,
}

pub struct TreeController<T> {
    nodes: HashMap<ItemId, TreeNode<T>>,
    roots: Vec<ItemId>,
    flat: Vec<FlatRow>,
    index_by_id: HashMap<ItemId, usize>,
    next_id: u64,
}

impl<T> Default for TreeController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeController<T> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            flat: Vec::new(),
            index_by_id: HashMap::new(),
            next_id: 1,
        }
    }

    fn fresh_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add an item under `parent` (`None` = root level) at `index` within
    /// its siblings (clamped). Returns `None` when `parent` is stale.
    pub fn add_item(&mut self, data: T, parent: Option<ItemId>, index: usize) -> Option<ItemId> {
        if let Some(p) = parent {
            if !self.nodes.contains_key(&p) {
                return None;
            }
        }
        let id = self.fresh_id();
        self.nodes.insert(
            id,
            TreeNode {
                data,
                parent,
                children: SmallVec::new(),
                expanded: false,
            },
        );
        match parent {
            Some(p) => {
                let children = &mut self.nodes.get_mut(&p).unwrap().children;
                let index = index.min(children.len());
                children.insert(index, id);
            }
            None => {
                let index = index.min(self.roots.len());
                self.roots.insert(index, id);
            }
        }
        self.rebuild_flat();
        Some(id)
    }

    pub fn add_root(&mut self, data: T) -> ItemId {
        let at = self.roots.len();
        self.add_item(data, None, at).unwrap()
    }

    /// Remove an item and its whole subtree. Stale ids are a no-op.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.remove(&cur) {
                stack.extend(node.children);
            }
        }
        self.rebuild_flat();
        true
    }

    fn detach(&mut self, id: ItemId) {
        match self.nodes.get(&id).and_then(|n| n.parent) {
            Some(p) => {
                if let Some(parent) = self.nodes.get_mut(&p) {
                    parent.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|c| *c != id),
        }
    }

    fn is_ancestor(&self, candidate: ItemId, of: ItemId) -> bool {
        let mut cur = self.nodes.get(&of).and_then(|n| n.parent);
        while let Some(p) = cur {
            if p == candidate {
                return true;
            }
            cur = self.nodes.get(&p).and_then(|n| n.parent);
        }
        false
    }

    /// Reparent `id` under `new_parent` at sibling position `index`.
    /// Reparenting a node under its own descendant is rejected.
    pub fn move_item_under(
        &mut self,
        id: ItemId,
        new_parent: Option<ItemId>,
        index: usize,
    ) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        if let Some(p) = new_parent {
            if !self.nodes.contains_key(&p) {
                return false;
            }
            if p == id || self.is_ancestor(id, p) {
                log::warn!("move_item_under would create a cycle; ignored");
                return false;
            }
        }
        self.detach(id);
        self.nodes.get_mut(&id).unwrap().parent = new_parent;
        match new_parent {
            Some(p) => {
                let children = &mut self.nodes.get_mut(&p).unwrap().children;
                let index = index.min(children.len());
                children.insert(index, id);
            }
            None => {
                let index = index.min(self.roots.len());
                self.roots.insert(index, id);
            }
        }
        self.rebuild_flat();
        true
    }

    pub fn data(&self, id: ItemId) -> Option<&T> {
        self.nodes.get(&id).map(|n| &n.data)
    }

    pub fn data_mut(&mut self, id: ItemId) -> Option<&mut T> {
        self.nodes.get_mut(&id).map(|n| &mut n.data)
    }

    pub fn has_children(&self, id: ItemId) -> bool {
        self.nodes.get(&id).is_some_and(|n| !n.children.is_empty())
    }

    pub fn children_ids(&self, id: ItemId) -> Vec<ItemId> {
        self.nodes
            .get(&id)
            .map(|n| n.children.to_vec())
            .unwrap_or_default()
    }

    pub fn root_ids(&self) -> &[ItemId] {
        &self.roots
    }

    pub fn parent_id(&self, id: ItemId) -> Option<ItemId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn depth_of(&self, id: ItemId) -> Option<usize> {
        if !self.nodes.contains_key(&id) {
            return None;
        }
        let mut depth = 0;
        let mut cur = self.parent_id(id);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent_id(p);
        }
        Some(depth)
    }

    pub fn is_expanded(&self, id: ItemId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.expanded)
    }

    /// Expand a node (optionally its whole subtree). Returns true when the
    /// flattened sequence changed.
    pub fn expand(&mut self, id: ItemId, recursive: bool) -> bool {
        let mut changed = false;
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let Some(node) = self.nodes.get_mut(&cur) else {
                continue;
            };
            if !node.expanded {
                node.expanded = true;
                changed = true;
            }
            if recursive {
                stack.extend(node.children.iter().copied());
            }
        }
        if changed {
            self.rebuild_flat();
        }
        changed
    }

    /// Collapse a node (optionally its whole subtree). Non-recursive
    /// collapse leaves descendant `expanded` flags untouched.
    pub fn collapse(&mut self, id: ItemId, recursive: bool) -> bool {
        let mut changed = false;
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let Some(node) = self.nodes.get_mut(&cur) else {
                continue;
            };
            if node.expanded {
                node.expanded = false;
                changed = true;
            }
            if recursive {
                stack.extend(node.children.iter().copied());
            }
        }
        if changed {
            self.rebuild_flat();
        }
        changed
    }

    pub fn toggle_expanded(&mut self, id: ItemId) -> bool {
        if self.is_expanded(id) {
            self.collapse(id, false)
        } else {
            self.expand(id, false)
        }
    }

    pub fn expand_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.expanded = true;
        }
        self.rebuild_flat();
    }

    pub fn collapse_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.expanded = false;
        }
        self.rebuild_flat();
    }

    pub fn flat_row(&self, index: usize) -> Option<FlatRow> {
        self.flat.get(index).copied()
    }

    /// Rebuild the flattened sequence after a structural change.
    pub fn rebuild_flat(&mut self) {
        self.flat.clear();
        // Depth-first over (id, depth), pushing children in reverse so they
        // pop in declaration order.
        let mut stack: Vec<(ItemId, usize)> =
            self.roots.iter().rev().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            self.flat.push(FlatRow { id, depth });
            if node.expanded {
                for child in node.children.iter().rev() {
                    stack.push((*child, depth + 1));
                }
            }
        }
        self.index_by_id = self
            .flat
            .iter()
            .enumerate()
            .map(|(i, row)| (row.id, i))
            .collect();
    }
}

impl<T> CollectionSource for TreeController<T> {
    fn item_count(&self) -> usize {
        self.flat.len()
    }

    fn id_for_index(&self, index: usize) -> Option<ItemId> {
        self.flat.get(index).map(|r| r.id)
    }

    fn index_for_id(&self, id: ItemId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    fn move_item(&mut self, from: usize, dest: usize, insert_before: bool) -> bool {
        let (Some(src), Some(dst)) = (self.flat_row(from), self.flat_row(dest)) else {
            return false;
        };
        if src.id == dst.id {
            return false;
        }
        // Dropping into the dragged node's own subtree would cycle.
        if self.is_ancestor(src.id, dst.id) {
            return false;
        }
        let new_parent = self.parent_id(dst.id);
        let siblings: Vec<ItemId> = match new_parent {
            Some(p) => self.children_ids(p),
            None => self.roots.clone(),
        };
        let Some(mut pos) = siblings.iter().position(|c| *c == dst.id) else {
            return false;
        };
        if !insert_before {
            pos += 1;
        }
        // Detaching from the same sibling list shifts the target slot.
        if self.parent_id(src.id) == new_parent {
            if let Some(old) = siblings.iter().position(|c| *c == src.id) {
                if old < pos {
                    pos -= 1;
                }
            }
        }
        self.move_item_under(src.id, new_parent, pos)
    }

    fn row_depth(&self, index: usize) -> usize {
        self.flat.get(index).map(|r| r.depth).unwrap_or(0)
    }

    fn row_has_children(&self, index: usize) -> bool {
        self.flat
            .get(index)
            .is_some_and(|r| self.has_children(r.id))
    }

    fn row_is_expanded(&self, index: usize) -> bool {
        self.flat.get(index).is_some_and(|r| self.is_expanded(r.id))
    }

    fn parent_index(&self, index: usize) -> Option<usize> {
        let row = self.flat.get(index)?;
        let parent = self.parent_id(row.id)?;
        self.index_for_id(parent)
    }

    fn try_expand_row(&mut self, index: usize) -> bool {
        match self.flat_row(index) {
            Some(row) if self.has_children(row.id) && !self.is_expanded(row.id) => {
                self.expand(row.id, false)
            }
            _ => false,
        }
    }

    fn try_collapse_row(&mut self, index: usize) -> bool {
        match self.flat_row(index) {
            Some(row) if self.is_expanded(row.id) => self.collapse(row.id, false),
            _ => false,
        }
    }

    fn expanded_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.expanded)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn restore_expanded(&mut self, ids: &[ItemId]) {
        for node in self.nodes.values_mut() {
            node.expanded = false;
        }
        for id in ids {
            if let Some(node) = self.nodes.get_mut(id) {
                node.expanded = true;
            }
        }
        self.rebuild_flat();
    }
}
