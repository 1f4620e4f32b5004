//! Tree view: a [`CollectionView`] over a [`TreeController`], with
//! structural and expansion operations surfaced through the façade's
//! observer lists.

use crate::collection::CollectionView;
use crate::ids::{CollectionSource, ItemId};
use crate::style::StyleConfig;
use crate::tree::TreeController;
use crate::virtualization::VirtualizationMethod;
use std::ops::{Deref, DerefMut};

pub struct TreeView<T> {
    view: CollectionView<TreeController<T>>,
}

impl<T> TreeView<T> {
    pub fn new(method: VirtualizationMethod, style: StyleConfig) -> Self {
        Self {
            view: CollectionView::new(TreeController::new(), method, style),
        }
    }

    pub fn add_root(&mut self, data: T) -> ItemId {
        let id = self.view.controller_mut().add_root(data);
        self.note_added(id);
        id
    }

    pub fn add_item(&mut self, data: T, parent: Option<ItemId>, index: usize) -> Option<ItemId> {
        let id = self.view.controller_mut().add_item(data, parent, index)?;
        self.note_added(id);
        Some(id)
    }

    fn note_added(&mut self, id: ItemId) {
        self.view.after_structural_change();
        // A child of a collapsed parent has no flattened index yet.
        if let Some(index) = self.view.controller().index_for_id(id) {
            self.view.events().items_added.emit(&vec![index]);
        }
    }

    /// Remove an item and its whole subtree.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let index = self.view.controller().index_for_id(id);
        if self.view.controller_mut().remove_item(id) {
            self.view.after_structural_change();
            if let Some(index) = index {
                self.view.events().items_removed.emit(&vec![index]);
            }
            true
        } else {
            false
        }
    }

    /// Reparent `id` under `new_parent`; rejected when it would cycle.
    pub fn move_item_under(
        &mut self,
        id: ItemId,
        new_parent: Option<ItemId>,
        index: usize,
    ) -> bool {
        let from = self.view.controller().index_for_id(id);
        if !self.view.controller_mut().move_item_under(id, new_parent, index) {
            return false;
        }
        self.view.after_structural_change();
        if let (Some(from), Some(to)) = (from, self.view.controller().index_for_id(id)) {
            self.view.events().item_index_changed.emit(&(from, to));
        }
        true
    }

    pub fn is_expanded(&self, id: ItemId) -> bool {
        self.view.controller().is_expanded(id)
    }

    pub fn expand(&mut self, id: ItemId, recursive: bool) {
        if self.view.controller_mut().expand(id, recursive) {
            self.view.after_structural_change();
        }
    }

    pub fn collapse(&mut self, id: ItemId, recursive: bool) {
        if self.view.controller_mut().collapse(id, recursive) {
            self.view.after_structural_change();
        }
    }

    pub fn toggle_expanded(&mut self, id: ItemId) {
        if self.view.controller_mut().toggle_expanded(id) {
            self.view.after_structural_change();
        }
    }

    pub fn expand_all(&mut self) {
        self.view.controller_mut().expand_all();
        self.view.after_structural_change();
    }

    pub fn collapse_all(&mut self) {
        self.view.controller_mut().collapse_all();
        self.view.after_structural_change();
    }

    pub fn data(&self, id: ItemId) -> Option<&T> {
        self.view.controller().data(id)
    }

    pub fn data_mut(&mut self, id: ItemId) -> Option<&mut T> {
        self.view.controller_mut().data_mut(id)
    }
}

impl<T> Deref for TreeView<T> {
    type Target = CollectionView<TreeController<T>>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl<T> DerefMut for TreeView<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.view
    }
}
