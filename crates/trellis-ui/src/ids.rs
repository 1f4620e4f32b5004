//! Item identity for collection views.
//!
//! Views address rows three ways: by *index* (position in the flattened,
//! currently-visible ordering), by *id* (stable across reorders, insertions
//! and removals), and by the underlying data entry. Within one refresh cycle
//! index→id is a bijection over visible items; id→index is undefined for
//! filtered/collapsed items. Ids — not indices — are the unit of persisted
//! state.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Stable item identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Capability seam between the façade and its controller. List and tree
/// controllers both implement this; the façade is generic over it, resolved
/// at construction (no runtime downcasts).
pub trait CollectionSource {
    fn item_count(&self) -> usize;
    fn id_for_index(&self, index: usize) -> Option<ItemId>;
    fn index_for_id(&self, id: ItemId) -> Option<usize>;

    /// Move the row at `from` so it sits before (or after) the row at
    /// `dest`. Returns false when the move is invalid or a no-op.
    fn move_item(&mut self, from: usize, dest: usize, insert_before: bool) -> bool;

    // Tree capabilities; flat lists keep the defaults.
    fn row_depth(&self, _index: usize) -> usize {
        0
    }
    fn row_has_children(&self, _index: usize) -> bool {
        false
    }
    fn row_is_expanded(&self, _index: usize) -> bool {
        false
    }
    fn parent_index(&self, _index: usize) -> Option<usize> {
        None
    }
    /// Expand/collapse the row; returns true when the flattened structure
    /// changed and the view must refresh.
    fn try_expand_row(&mut self, _index: usize) -> bool {
        false
    }
    fn try_collapse_row(&mut self, _index: usize) -> bool {
        false
    }
    fn expanded_ids(&self) -> Vec<ItemId> {
        Vec::new()
    }
    fn restore_expanded(&mut self, _ids: &[ItemId]) {}
}

/// Index/id mapping over an externally-owned flat source list.
pub struct ListController<T> {
    source: Option<Rc<RefCell<Vec<T>>>>,
    ids: Vec<ItemId>,
    index_by_id: HashMap<ItemId, usize>,
    next_id: u64,
    id_resolver: Option<Rc<dyn Fn(usize, &T) -> ItemId>>,
}

impl<T> Default for ListController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListController<T> {
    pub fn new() -> Self {
        Self {
            source: None,
            ids: Vec::new(),
            index_by_id: HashMap::new(),
            next_id: 1,
            id_resolver: None,
        }
    }

    /// Derive ids from item data instead of insertion order. Takes effect on
    /// the next id regeneration (source swap or structural edit).
    pub fn set_id_resolver(&mut self, resolver: impl Fn(usize, &T) -> ItemId + 'static) {
        self.id_resolver = Some(Rc::new(resolver));
        self.regenerate_ids();
    }

    pub fn set_items_source(&mut self, source: Rc<RefCell<Vec<T>>>) {
        self.source = Some(source);
        self.regenerate_ids();
    }

    pub fn items_source(&self) -> Option<Rc<RefCell<Vec<T>>>> {
        self.source.clone()
    }

    pub fn has_items_source(&self) -> bool {
        self.source.is_some()
    }

    /// Read access to the item behind an index. Returns `None` for stale
    /// indices or when no source is set.
    pub fn with_item<R>(&self, index: usize, f: impl FnOnce(&T) -> R) -> Option<R> {
        let source = self.source.as_ref()?;
        let items = source.borrow();
        items.get(index).map(f)
    }

    fn fresh_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Rebuild the dense index→id array and its reverse map.
    pub fn regenerate_ids(&mut self) {
        let len = self.source.as_ref().map(|s| s.borrow().len()).unwrap_or(0);
        match (&self.id_resolver, &self.source) {
            (Some(resolver), Some(source)) => {
                let resolver = resolver.clone();
                let items = source.borrow();
                self.ids = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| resolver(i, item))
                    .collect();
            }
            _ => {
                // Insertion-order ids: keep existing assignments where the
                // length still matches, extend or truncate otherwise.
                while self.ids.len() < len {
                    let id = self.fresh_id();
                    self.ids.push(id);
                }
                self.ids.truncate(len);
            }
        }
        self.rebuild_reverse();
    }

    fn rebuild_reverse(&mut self) {
        self.index_by_id = self
            .ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
    }

    /// Append items to the source. Returns the appended indices.
    pub fn add_items(&mut self, items: Vec<T>) -> Vec<usize> {
        let Some(source) = self.source.as_ref() else {
            log::warn!("add_items called with no items source");
            return Vec::new();
        };
        let mut list = source.borrow_mut();
        let start = list.len();
        let count = items.len();
        list.extend(items);
        drop(list);
        for _ in 0..count {
            let id = self.fresh_id();
            self.ids.push(id);
        }
        if self.id_resolver.is_some() {
            self.regenerate_ids();
        } else {
            self.rebuild_reverse();
        }
        (start..start + count).collect()
    }

    pub fn insert_item(&mut self, index: usize, item: T) -> Option<usize> {
        let source = self.source.as_ref()?;
        let mut list = source.borrow_mut();
        if index > list.len() {
            return None;
        }
        list.insert(index, item);
        drop(list);
        let id = self.fresh_id();
        self.ids.insert(index, id);
        if self.id_resolver.is_some() {
            self.regenerate_ids();
        } else {
            self.rebuild_reverse();
        }
        Some(index)
    }

    /// Remove a single item. Stale indices are a no-op.
    pub fn remove_item(&mut self, index: usize) -> bool {
        let Some(source) = self.source.as_ref() else {
            return false;
        };
        {
            let mut list = source.borrow_mut();
            if index >= list.len() {
                return false;
            }
            list.remove(index);
        }
        self.ids.remove(index);
        self.rebuild_reverse();
        true
    }

    /// Remove a batch of indices in one pass. Returns the indices actually
    /// removed, in descending order.
    pub fn remove_items(&mut self, indices: &[usize]) -> Vec<usize> {
        let Some(source) = self.source.as_ref() else {
            return Vec::new();
        };
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.reverse();
        let mut removed = Vec::new();
        {
            let mut list = source.borrow_mut();
            for &i in &sorted {
                if i < list.len() {
                    list.remove(i);
                    self.ids.remove(i);
                    removed.push(i);
                }
            }
        }
        self.rebuild_reverse();
        removed
    }
}

impl<T> CollectionSource for ListController<T> {
    fn item_count(&self) -> usize {
        self.ids.len()
    }

    fn id_for_index(&self, index: usize) -> Option<ItemId> {
        self.ids.get(index).copied()
    }

    fn index_for_id(&self, id: ItemId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    fn move_item(&mut self, from: usize, dest: usize, insert_before: bool) -> bool {
        let len = self.ids.len();
        if from >= len || dest >= len {
            return false;
        }
        let mut to = dest + usize::from(!insert_before);
        if to > from {
            to -= 1;
        }
        if to == from {
            return false;
        }
        let Some(source) = self.source.as_ref() else {
            return false;
        };
        {
            let mut list = source.borrow_mut();
            let item = list.remove(from);
            list.insert(to, item);
        }
        let id = self.ids.remove(from);
        self.ids.insert(to, id);
        if self.id_resolver.is_some() {
            // Resolver-provided identity wins over cached order.
            self.regenerate_ids();
        } else {
            self.rebuild_reverse();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(items: Vec<i32>) -> ListController<i32> {
        let mut c = ListController::new();
        c.set_items_source(Rc::new(RefCell::new(items)));
        c
    }

    #[test]
    fn index_id_bijection() {
        let c = controller(vec![10, 20, 30]);
        for i in 0..c.item_count() {
            let id = c.id_for_index(i).unwrap();
            assert_eq!(c.index_for_id(id), Some(i));
        }
        assert_eq!(c.id_for_index(3), None);
        assert_eq!(c.index_for_id(ItemId(999)), None);
    }

    #[test]
    fn ids_survive_removal() {
        let mut c = controller(vec![10, 20, 30]);
        let id_of_30 = c.id_for_index(2).unwrap();
        assert!(c.remove_item(0));
        assert_eq!(c.index_for_id(id_of_30), Some(1));
        assert_eq!(c.with_item(1, |v| *v), Some(30));
    }

    #[test]
    fn move_item_adjusts_for_insert_side() {
        let mut c = controller(vec![0, 1, 2, 3]);
        // Drop row 0 after row 2 -> [1, 2, 0, 3].
        assert!(c.move_item(0, 2, false));
        let items: Vec<i32> = (0..4).map(|i| c.with_item(i, |v| *v).unwrap()).collect();
        assert_eq!(items, vec![1, 2, 0, 3]);
    }

    #[test]
    fn move_back_to_origin_is_noop() {
        let mut c = controller(vec![0, 1, 2]);
        assert!(!c.move_item(1, 1, true));
        assert!(!c.move_item(1, 0, false));
        let items: Vec<i32> = (0..3).map(|i| c.with_item(i, |v| *v).unwrap()).collect();
        assert_eq!(items, vec![0, 1, 2]);
    }

    #[test]
    fn batch_removal_handles_unsorted_indices() {
        let mut c = controller(vec![0, 1, 2, 3, 4]);
        let removed = c.remove_items(&[3, 1, 3, 7]);
        assert_eq!(removed, vec![3, 1]);
        let items: Vec<i32> = (0..3).map(|i| c.with_item(i, |v| *v).unwrap()).collect();
        assert_eq!(items, vec![0, 2, 4]);
    }
}
