//! Retained element tree.
//!
//! This is the surface of the host visual-tree engine that the collection
//! views consume: positionable, stylable nodes that can be created, parented,
//! reparented and removed. Layout rects are *assigned* here, not computed —
//! pixel-accurate layout belongs to the host's layout engine.
//!
//! Elements live in a slotmap arena, so a handle held across a removal
//! simply stops resolving instead of dangling.

use crate::Rect;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

new_key_type! {
    pub struct ElementId;
}

#[derive(Default)]
pub struct ElementNode {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    classes: SmallVec<[String; 4]>,
    layout: Rect,
    pub focusable: bool,
    /// Opaque per-element tag, used by views to stamp rows with metadata.
    pub user_tag: u64,
}

pub struct ElementTree {
    nodes: SlotMap<ElementId, ElementNode>,
    root: ElementId,
    focused: Option<ElementId>,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(ElementNode::default());
        Self {
            nodes,
            root,
            focused: None,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Create a detached element. Attach it with [`ElementTree::add_child`].
    pub fn create(&mut self) -> ElementId {
        self.nodes.insert(ElementNode::default())
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn add_child(&mut self, parent: ElementId, child: ElementId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    pub fn insert_child(&mut self, parent: ElementId, index: usize, child: ElementId) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        if parent == child || self.is_ancestor(child, parent) {
            log::warn!("insert_child would create a cycle; ignored");
            return;
        }
        self.detach(child);
        let index = index.min(self.nodes[parent].children.len());
        self.nodes[parent].children.insert(index, child);
        self.nodes[child].parent = Some(parent);
    }

    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) {
        if self.parent(child) == Some(parent) {
            self.remove(child);
        }
    }

    /// Remove an element and its whole subtree from the arena. Stale ids
    /// into the removed subtree resolve to `None` afterwards.
    pub fn remove(&mut self, id: ElementId) {
        if !self.nodes.contains_key(id) || id == self.root {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.remove(cur) {
                if self.focused == Some(cur) {
                    self.focused = None;
                }
                stack.extend(node.children);
            }
        }
    }

    /// Detach from the current parent without destroying the subtree.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent].children.retain(|c| *c != id);
            self.nodes[id].parent = None;
        }
    }

    pub fn reparent(&mut self, id: ElementId, new_parent: ElementId, index: usize) {
        self.insert_child(new_parent, index, id);
    }

    fn is_ancestor(&self, candidate: ElementId, of: ElementId) -> bool {
        let mut cur = self.parent(of);
        while let Some(p) = cur {
            if p == candidate {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Root-to-element path, used by the dispatcher for trickle/bubble.
    pub fn path_to(&self, id: ElementId) -> Vec<ElementId> {
        let mut path = Vec::new();
        let mut cur = Some(id);
        while let Some(e) = cur {
            path.push(e);
            cur = self.parent(e);
        }
        path.reverse();
        path
    }

    pub fn layout(&self, id: ElementId) -> Rect {
        self.nodes.get(id).map(|n| n.layout).unwrap_or_default()
    }

    pub fn set_layout(&mut self, id: ElementId, rect: Rect) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.layout = rect;
        }
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(n) = self.nodes.get_mut(id) {
            if !n.classes.iter().any(|c| c == class) {
                n.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.classes.retain(|c| c != class);
        }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    pub fn set_class(&mut self, id: ElementId, class: &str, enabled: bool) {
        if enabled {
            self.add_class(id, class);
        } else {
            self.remove_class(id, class);
        }
    }

    pub fn set_focusable(&mut self, id: ElementId, focusable: bool) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.focusable = focusable;
        }
    }

    pub fn set_user_tag(&mut self, id: ElementId, tag: u64) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.user_tag = tag;
        }
    }

    pub fn user_tag(&self, id: ElementId) -> u64 {
        self.nodes.get(id).map(|n| n.user_tag).unwrap_or(0)
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    pub fn focus(&mut self, id: ElementId) {
        if self.nodes.contains_key(id) {
            self.focused = Some(id);
        }
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Hit test in root coordinates. Layout rects are stored relative to the
    /// parent; children drawn later sit on top, so the search walks children
    /// in reverse order.
    pub fn hit_test(&self, point: crate::Vec2) -> Option<ElementId> {
        self.hit_test_from(self.root, point, 0.0, 0.0)
    }

    fn hit_test_from(&self, id: ElementId, p: crate::Vec2, ox: f32, oy: f32) -> Option<ElementId> {
        let node = self.nodes.get(id)?;
        let abs = Rect::new(node.layout.x + ox, node.layout.y + oy, node.layout.w, node.layout.h);
        for child in node.children.iter().rev() {
            if let Some(hit) = self.hit_test_from(*child, p, abs.x, abs.y) {
                return Some(hit);
            }
        }
        if abs.contains(p) { Some(id) } else { None }
    }
}
