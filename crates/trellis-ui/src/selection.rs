//! Selection tracking for collection views.
//!
//! Ids are the source of truth; indices are a cache recomputed against the
//! current flattened ordering. Every public mutation funnels through one
//! apply-then-compare path, so a batch of changes lands as a single outcome
//! for the façade to notify on.

use crate::ids::{CollectionSource, ItemId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    None,
    Single,
    #[default]
    Multiple,
}

/// What a mutation did. `Unchanged` means the requested selection resolved
/// to the ids already selected, in the same order; the façade fires its
/// "unchanged" signal for that case (click-vs-drag disambiguation hangs off
/// it) rather than the changed pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionOutcome {
    Changed,
    Unchanged,
}

#[derive(Default)]
pub struct SelectionTracker {
    mode: SelectionMode,
    selected_ids: Vec<ItemId>,
    selected_indices: Vec<usize>,
    range_direction_up: bool,
}

impl SelectionTracker {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switching Multiple→Single truncates to the first selected item;
    /// switching to None clears.
    pub fn set_mode(&mut self, mode: SelectionMode, source: &dyn CollectionSource) -> SelectionOutcome {
        self.mode = mode;
        let indices = match mode {
            SelectionMode::None => Vec::new(),
            SelectionMode::Single => self.selected_indices.iter().take(1).copied().collect(),
            SelectionMode::Multiple => self.selected_indices.clone(),
        };
        self.apply(indices, source)
    }

    pub fn selected_ids(&self) -> &[ItemId] {
        &self.selected_ids
    }

    /// Selected indices in selection order.
    pub fn selected_indices(&self) -> &[usize] {
        &self.selected_indices
    }

    pub fn is_index_selected(&self, index: usize) -> bool {
        self.selected_indices.contains(&index)
    }

    pub fn is_id_selected(&self, id: ItemId) -> bool {
        self.selected_ids.contains(&id)
    }

    pub fn last_selected_index(&self) -> Option<usize> {
        self.selected_indices.last().copied()
    }

    pub fn set_selection(
        &mut self,
        indices: &[usize],
        source: &dyn CollectionSource,
    ) -> SelectionOutcome {
        self.apply(indices.to_vec(), source)
    }

    pub fn add_to_selection(
        &mut self,
        indices: &[usize],
        source: &dyn CollectionSource,
    ) -> SelectionOutcome {
        let mut combined = self.selected_indices.clone();
        combined.extend_from_slice(indices);
        self.apply(combined, source)
    }

    pub fn remove_from_selection(
        &mut self,
        index: usize,
        source: &dyn CollectionSource,
    ) -> SelectionOutcome {
        let remaining: Vec<usize> = self
            .selected_indices
            .iter()
            .copied()
            .filter(|i| *i != index)
            .collect();
        self.apply(remaining, source)
    }

    pub fn toggle(&mut self, index: usize, source: &dyn CollectionSource) -> SelectionOutcome {
        if self.is_index_selected(index) {
            self.remove_from_selection(index, source)
        } else {
            self.add_to_selection(&[index], source)
        }
    }

    pub fn clear_selection(&mut self, source: &dyn CollectionSource) -> SelectionOutcome {
        self.apply(Vec::new(), source)
    }

    pub fn select_all(&mut self, source: &dyn CollectionSource) -> SelectionOutcome {
        if self.mode != SelectionMode::Multiple {
            return SelectionOutcome::Unchanged;
        }
        let all: Vec<usize> = (0..source.item_count()).collect();
        self.apply(all, source)
    }

    /// Shift-extend the selection to `target`. The anchor is the most
    /// extreme selected index on the side the previous range grew from:
    /// the maximum when the last extension went upward, the minimum when
    /// it went downward. Crossing the anchor flips the direction, so
    /// 5 → shift-2 → shift-8 lands on 5..=8, not 2..=8.
    pub fn do_range_selection(
        &mut self,
        target: usize,
        source: &dyn CollectionSource,
    ) -> SelectionOutcome {
        if target >= source.item_count() {
            return SelectionOutcome::Unchanged;
        }
        if self.mode != SelectionMode::Multiple {
            return self.apply(vec![target], source);
        }
        let Some(origin) = (if self.range_direction_up {
            self.selected_indices.iter().max().copied()
        } else {
            self.selected_indices.iter().min().copied()
        }) else {
            return self.apply(vec![target], source);
        };
        self.range_direction_up = target < origin;
        let (lo, hi) = (origin.min(target), origin.max(target));
        // Anchor first so the selection extreme stays at the origin.
        let mut indices = vec![origin];
        indices.extend((lo..=hi).filter(|i| *i != origin));
        self.apply(indices, source)
    }

    /// Restore a persisted selection. Ids that no longer resolve are
    /// dropped.
    pub fn restore_ids(
        &mut self,
        ids: &[ItemId],
        source: &dyn CollectionSource,
    ) -> SelectionOutcome {
        let indices: Vec<usize> = ids
            .iter()
            .filter_map(|id| source.index_for_id(*id))
            .collect();
        self.apply(indices, source)
    }

    /// Re-resolve indices from ids after a structural change; ids no longer
    /// present in the flattened ordering are dropped silently.
    pub fn refresh(&mut self, source: &dyn CollectionSource) -> SelectionOutcome {
        let mut ids = Vec::with_capacity(self.selected_ids.len());
        let mut indices = Vec::with_capacity(self.selected_ids.len());
        for id in &self.selected_ids {
            if let Some(index) = source.index_for_id(*id) {
                ids.push(*id);
                indices.push(index);
            }
        }
        let outcome = if ids == self.selected_ids {
            SelectionOutcome::Unchanged
        } else {
            SelectionOutcome::Changed
        };
        self.selected_ids = ids;
        self.selected_indices = indices;
        outcome
    }

    fn apply(&mut self, indices: Vec<usize>, source: &dyn CollectionSource) -> SelectionOutcome {
        let mut limited = match self.mode {
            SelectionMode::None => Vec::new(),
            SelectionMode::Single => indices.into_iter().take(1).collect(),
            SelectionMode::Multiple => indices,
        };
        // Resolve to ids, dropping stale indices and duplicates while
        // keeping selection order.
        let mut ids = Vec::with_capacity(limited.len());
        let mut resolved = Vec::with_capacity(limited.len());
        for index in limited.drain(..) {
            if let Some(id) = source.id_for_index(index) {
                if !ids.contains(&id) {
                    ids.push(id);
                    resolved.push(index);
                }
            }
        }
        if ids == self.selected_ids {
            self.selected_indices = resolved;
            return SelectionOutcome::Unchanged;
        }
        self.selected_ids = ids;
        self.selected_indices = resolved;
        SelectionOutcome::Changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ListController;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn source(n: usize) -> ListController<usize> {
        let mut c = ListController::new();
        c.set_items_source(Rc::new(RefCell::new((0..n).collect())));
        c
    }

    #[test]
    fn set_selection_is_changed_then_unchanged() {
        let src = source(10);
        let mut sel = SelectionTracker::default();
        assert_eq!(sel.set_selection(&[3, 5], &src), SelectionOutcome::Changed);
        assert_eq!(sel.set_selection(&[3, 5], &src), SelectionOutcome::Unchanged);
        assert_eq!(sel.selected_indices(), &[3, 5]);
    }

    #[test]
    fn single_mode_truncates() {
        let src = source(10);
        let mut sel = SelectionTracker::default();
        sel.set_selection(&[2, 4, 6], &src);
        assert_eq!(sel.set_mode(SelectionMode::Single, &src), SelectionOutcome::Changed);
        assert_eq!(sel.selected_indices(), &[2]);
        sel.set_selection(&[7, 8], &src);
        assert_eq!(sel.selected_indices(), &[7]);
    }

    #[test]
    fn none_mode_rejects_everything() {
        let src = source(10);
        let mut sel = SelectionTracker::new(SelectionMode::None);
        assert_eq!(sel.set_selection(&[1], &src), SelectionOutcome::Unchanged);
        assert!(sel.selected_ids().is_empty());
    }

    #[test]
    fn stale_and_duplicate_indices_dropped() {
        let src = source(4);
        let mut sel = SelectionTracker::default();
        sel.set_selection(&[1, 99, 1, 3], &src);
        assert_eq!(sel.selected_indices(), &[1, 3]);
    }

    #[test]
    fn range_reanchors_when_crossing() {
        let src = source(10);
        let mut sel = SelectionTracker::default();
        sel.set_selection(&[5], &src);

        sel.do_range_selection(2, &src);
        let mut got: Vec<usize> = sel.selected_indices().to_vec();
        got.sort_unstable();
        assert_eq!(got, vec![2, 3, 4, 5]);

        sel.do_range_selection(8, &src);
        let mut got: Vec<usize> = sel.selected_indices().to_vec();
        got.sort_unstable();
        assert_eq!(got, vec![5, 6, 7, 8]);
    }

    #[test]
    fn range_extends_without_crossing() {
        let src = source(10);
        let mut sel = SelectionTracker::default();
        sel.set_selection(&[5], &src);
        sel.do_range_selection(7, &src);
        let mut got: Vec<usize> = sel.selected_indices().to_vec();
        got.sort_unstable();
        assert_eq!(got, vec![5, 6, 7]);
        // Extending further down keeps the same anchor.
        sel.do_range_selection(9, &src);
        let mut got: Vec<usize> = sel.selected_indices().to_vec();
        got.sort_unstable();
        assert_eq!(got, vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn refresh_drops_removed_ids_and_follows_moves() {
        let mut src = source(5);
        let mut sel = SelectionTracker::default();
        sel.set_selection(&[1, 3], &src);
        let ids: Vec<ItemId> = sel.selected_ids().to_vec();

        src.remove_item(0);
        assert_eq!(sel.refresh(&src), SelectionOutcome::Unchanged);
        assert_eq!(sel.selected_ids(), ids.as_slice());
        assert_eq!(sel.selected_indices(), &[0, 2]);

        src.remove_item(0);
        assert_eq!(sel.refresh(&src), SelectionOutcome::Changed);
        assert_eq!(sel.selected_ids(), &ids[1..]);
    }

    #[test]
    fn select_all_requires_multiple_mode() {
        let src = source(3);
        let mut sel = SelectionTracker::new(SelectionMode::Single);
        assert_eq!(sel.select_all(&src), SelectionOutcome::Unchanged);
        sel.set_mode(SelectionMode::Multiple, &src);
        assert_eq!(sel.select_all(&src), SelectionOutcome::Changed);
        assert_eq!(sel.selected_indices().len(), 3);
    }
}
