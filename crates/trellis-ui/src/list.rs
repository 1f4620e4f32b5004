//! Flat list view: a [`CollectionView`] over a [`ListController`], plus the
//! structural operations that notify through the façade's observer lists.

use crate::collection::CollectionView;
use crate::ids::{CollectionSource, ItemId, ListController};
use crate::style::StyleConfig;
use crate::virtualization::VirtualizationMethod;
use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

pub struct ListView<T> {
    view: CollectionView<ListController<T>>,
}

impl<T> ListView<T> {
    pub fn new(method: VirtualizationMethod, style: StyleConfig) -> Self {
        Self {
            view: CollectionView::new(ListController::new(), method, style),
        }
    }

    /// Swap the externally-owned backing vector.
    pub fn set_items_source(&mut self, source: Rc<RefCell<Vec<T>>>) {
        self.view.controller_mut().set_items_source(source);
        self.view.after_structural_change();
        self.view.events().items_source_changed.emit(&());
    }

    /// Derive ids from item data instead of insertion order.
    pub fn set_id_resolver(&mut self, resolver: impl Fn(usize, &T) -> ItemId + 'static) {
        self.view.controller_mut().set_id_resolver(resolver);
        self.view.after_structural_change();
    }

    pub fn with_item<R>(&self, index: usize, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.view.controller().with_item(index, f)
    }

    pub fn add_items(&mut self, items: Vec<T>) {
        let added = self.view.controller_mut().add_items(items);
        if !added.is_empty() {
            self.view.after_structural_change();
            self.view.events().items_added.emit(&added);
        }
    }

    pub fn insert_item(&mut self, index: usize, item: T) -> bool {
        match self.view.controller_mut().insert_item(index, item) {
            Some(at) => {
                self.view.after_structural_change();
                self.view.events().items_added.emit(&vec![at]);
                true
            }
            None => false,
        }
    }

    pub fn remove_item(&mut self, index: usize) -> bool {
        if self.view.controller_mut().remove_item(index) {
            self.view.after_structural_change();
            self.view.events().items_removed.emit(&vec![index]);
            true
        } else {
            false
        }
    }

    pub fn remove_items(&mut self, indices: &[usize]) {
        let removed = self.view.controller_mut().remove_items(indices);
        if !removed.is_empty() {
            self.view.after_structural_change();
            self.view.events().items_removed.emit(&removed);
        }
    }

    /// Programmatic counterpart of a reorder drop.
    pub fn move_item(&mut self, from: usize, dest: usize, insert_before: bool) -> bool {
        let moved_id = self.view.controller().id_for_index(from);
        if !self.view.controller_mut().move_item(from, dest, insert_before) {
            return false;
        }
        let to = moved_id
            .and_then(|id| self.view.controller().index_for_id(id))
            .unwrap_or(from);
        self.view.after_structural_change();
        self.view.events().item_index_changed.emit(&(from, to));
        true
    }
}

impl<T> Deref for ListView<T> {
    type Target = CollectionView<ListController<T>>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl<T> DerefMut for ListView<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.view
    }
}
