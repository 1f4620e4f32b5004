//! Row virtualization: a bounded pool of recycled row elements bound to
//! whichever item indices intersect the viewport.
//!
//! The pool grows to roughly the visible count plus overscan and never
//! shrinks (and never scales with the item count). Rows are created lazily
//! through the host's `make` callback, rebound (`unbind` then `bind`) when
//! their index changes, and destroyed only on method switch or teardown.
//! Binding is synchronous: by the time [`VirtualizationController::refresh`]
//! returns, every visible row is bound.

use crate::ids::{CollectionSource, ItemId};
use crate::style::StyleConfig;
use std::collections::HashMap;
use std::rc::Rc;
use trellis_core::element::{ElementId, ElementTree};
use trellis_core::error::Error;
use trellis_core::geometry::{Rect, Size};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VirtualizationMethod {
    #[default]
    FixedHeight,
    DynamicHeight,
}

/// Host hooks for row lifecycle. Missing hooks degrade: without `make` the
/// controller creates bare elements, without `bind` rows are positioned but
/// carry no content.
#[derive(Clone, Default)]
pub struct RowCallbacks {
    pub make: Option<Rc<dyn Fn(&mut ElementTree) -> ElementId>>,
    pub bind: Option<Rc<dyn Fn(&mut ElementTree, ElementId, usize)>>,
    pub unbind: Option<Rc<dyn Fn(&mut ElementTree, ElementId, usize)>>,
    pub destroy: Option<Rc<dyn Fn(&mut ElementTree, ElementId)>>,
}

struct RecycledRow {
    root: ElementId,
    bound_index: Option<usize>,
    id: Option<ItemId>,
}

/// Everything a refresh pass needs from the façade.
pub struct RefreshCtx<'a> {
    pub source: &'a dyn CollectionSource,
    pub viewport: Size,
    pub scroll_y: f32,
    pub full_rebuild: bool,
    pub style: &'a StyleConfig,
    pub selected_indices: &'a [usize],
    pub reorderable: bool,
}

pub struct VirtualizationController {
    method: VirtualizationMethod,
    content: ElementId,
    callbacks: RowCallbacks,
    pool: Vec<RecycledRow>,
    fixed_height: f32,
    default_height: f32,
    measured: HashMap<usize, f32>,
    /// Row start offsets (dynamic mode); `prefix[i]` is the top of row `i`,
    /// the final entry the content height.
    prefix: Vec<f32>,
    prefix_dirty: bool,
    overscan: usize,
    pending_focus: Option<ItemId>,
}

impl VirtualizationController {
    pub fn new(method: VirtualizationMethod, content: ElementId) -> Self {
        Self {
            method,
            content,
            callbacks: RowCallbacks::default(),
            pool: Vec::new(),
            fixed_height: 22.0,
            default_height: 22.0,
            measured: HashMap::new(),
            prefix: vec![0.0],
            prefix_dirty: true,
            overscan: 2,
            pending_focus: None,
        }
    }

    pub fn method(&self) -> VirtualizationMethod {
        self.method
    }

    /// Switching methods tears the pool down; the next refresh rebuilds it.
    pub fn set_method(&mut self, method: VirtualizationMethod, tree: &mut ElementTree) {
        if method == self.method {
            return;
        }
        self.teardown(tree);
        self.method = method;
        self.prefix_dirty = true;
    }

    pub fn set_callbacks(&mut self, callbacks: RowCallbacks) {
        self.callbacks = callbacks;
    }

    pub fn fixed_item_height(&self) -> f32 {
        self.fixed_height
    }

    pub fn set_fixed_item_height(&mut self, height: f32) -> Result<(), Error> {
        if !(height > 0.0) || !height.is_finite() {
            return Err(Error::InvalidItemHeight(height));
        }
        self.fixed_height = height;
        Ok(())
    }

    /// Height estimate used for rows that have not been measured yet
    /// (dynamic mode only).
    pub fn set_default_height(&mut self, height: f32) -> Result<(), Error> {
        if !(height > 0.0) || !height.is_finite() {
            return Err(Error::InvalidItemHeight(height));
        }
        self.default_height = height;
        self.prefix_dirty = true;
        Ok(())
    }

    fn row_height(&self, index: usize) -> f32 {
        match self.method {
            VirtualizationMethod::FixedHeight => self.fixed_height,
            VirtualizationMethod::DynamicHeight => self
                .measured
                .get(&index)
                .copied()
                .unwrap_or(self.default_height),
        }
    }

    fn row_start(&self, index: usize) -> f32 {
        match self.method {
            VirtualizationMethod::FixedHeight => index as f32 * self.fixed_height,
            VirtualizationMethod::DynamicHeight => self
                .prefix
                .get(index)
                .copied()
                .unwrap_or(index as f32 * self.default_height),
        }
    }

    pub fn content_height(&self, count: usize) -> f32 {
        match self.method {
            VirtualizationMethod::FixedHeight => count as f32 * self.fixed_height,
            VirtualizationMethod::DynamicHeight => self.prefix.last().copied().unwrap_or(0.0),
        }
    }

    /// Content height for `count` items, building row offsets as needed.
    pub fn measure_content(&mut self, count: usize) -> f32 {
        self.ensure_prefix(count);
        self.content_height(count)
    }

    fn ensure_prefix(&mut self, count: usize) {
        if self.method == VirtualizationMethod::FixedHeight {
            return;
        }
        if !self.prefix_dirty && self.prefix.len() == count + 1 {
            return;
        }
        self.prefix.clear();
        self.prefix.reserve(count + 1);
        let mut acc = 0.0f32;
        self.prefix.push(0.0);
        for i in 0..count {
            acc += self.measured.get(&i).copied().unwrap_or(self.default_height);
            self.prefix.push(acc);
        }
        self.prefix_dirty = false;
    }

    /// Item index under a content-space y position.
    pub fn row_index_at(&self, y: f32, count: usize) -> Option<usize> {
        if count == 0 || y < 0.0 {
            return None;
        }
        match self.method {
            VirtualizationMethod::FixedHeight => {
                let i = (y / self.fixed_height) as usize;
                (i < count).then_some(i)
            }
            VirtualizationMethod::DynamicHeight => {
                let upper = self.prefix.len().min(count + 1);
                if upper < 2 {
                    return None;
                }
                let i = self.prefix[1..upper].partition_point(|&end| end <= y);
                (i < count).then_some(i)
            }
        }
    }

    fn visible_bounds(&self, scroll_y: f32, viewport_h: f32, count: usize) -> (usize, usize) {
        if count == 0 || !(viewport_h > 0.0) {
            return (0, 0);
        }
        match self.method {
            VirtualizationMethod::FixedHeight => {
                let h = self.fixed_height;
                let first = (scroll_y / h).floor().max(0.0) as usize;
                let end = ((scroll_y + viewport_h) / h).ceil().max(0.0) as usize;
                (first.min(count), end.min(count))
            }
            VirtualizationMethod::DynamicHeight => {
                let first = self.prefix[1..count + 1].partition_point(|&end| end <= scroll_y);
                let end = self.prefix[..count].partition_point(|&s| s < scroll_y + viewport_h);
                (first.min(count), end.min(count))
            }
        }
    }

    /// Record a real measured row height. Returns a corrected scroll offset
    /// when the correction happened above the anchored (first visible) row,
    /// so that row keeps its exact fractional viewport position.
    pub fn set_measured_height(
        &mut self,
        index: usize,
        height: f32,
        scroll_y: f32,
    ) -> Result<Option<f32>, Error> {
        if !(height > 0.0) || !height.is_finite() {
            return Err(Error::InvalidItemHeight(height));
        }
        if self.method != VirtualizationMethod::DynamicHeight {
            return Ok(None);
        }
        if self.measured.get(&index).copied() == Some(height) {
            return Ok(None);
        }
        let count = self.prefix.len().saturating_sub(1);
        let anchor = match self.row_index_at(scroll_y.max(0.0), count) {
            Some(i) => i,
            None if count > 0 => count - 1,
            None => {
                self.measured.insert(index, height);
                self.prefix_dirty = true;
                return Ok(None);
            }
        };
        let within = scroll_y - self.row_start(anchor);
        self.measured.insert(index, height);
        self.prefix_dirty = true;
        self.ensure_prefix(count);
        if index < anchor {
            let corrected = self.row_start(anchor) + within;
            if (corrected - scroll_y).abs() > f32::EPSILON {
                return Ok(Some(corrected));
            }
        }
        Ok(None)
    }

    /// Minimal scroll offset that makes the row fully visible, or `None`
    /// when it already is. `index == -1` addresses the last item.
    pub fn scroll_to_item(
        &mut self,
        index: i64,
        scroll_y: f32,
        viewport_h: f32,
        count: usize,
    ) -> Option<f32> {
        self.ensure_prefix(count);
        let index = if index == -1 {
            count.checked_sub(1)?
        } else if index >= 0 && (index as usize) < count {
            index as usize
        } else {
            return None;
        };
        let start = self.row_start(index);
        let end = start + self.row_height(index);
        if start >= scroll_y && end <= scroll_y + viewport_h {
            return None;
        }
        if start < scroll_y {
            Some(start)
        } else {
            Some((end - viewport_h).max(0.0))
        }
    }

    /// Content-space `(top, height)` of a row.
    pub fn row_bounds(&self, index: usize) -> (f32, f32) {
        (self.row_start(index), self.row_height(index))
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn bound_rows(&self) -> impl Iterator<Item = (usize, ElementId)> + '_ {
        self.pool
            .iter()
            .filter_map(|r| r.bound_index.map(|i| (i, r.root)))
    }

    pub fn element_for_index(&self, index: usize) -> Option<ElementId> {
        self.pool
            .iter()
            .find(|r| r.bound_index == Some(index))
            .map(|r| r.root)
    }

    pub fn index_for_element(&self, element: ElementId) -> Option<usize> {
        self.pool
            .iter()
            .find(|r| r.root == element)
            .and_then(|r| r.bound_index)
    }

    /// Bind the visible window. Rows already bound to an in-range index stay
    /// put; everything else is recycled onto the missing indices.
    pub fn refresh(&mut self, tree: &mut ElementTree, ctx: &RefreshCtx<'_>) {
        let count = ctx.source.item_count();
        self.ensure_prefix(count);

        let (first, end) = self.visible_bounds(
            ctx.scroll_y.max(0.0),
            ctx.viewport.height,
            count,
        );
        let first = first.saturating_sub(self.overscan);
        let end = (end + self.overscan).min(count);
        let needed = end - first;

        // Remember which item holds focus before any recycling.
        if let Some(focused) = tree.focused() {
            if let Some(row) = self.pool.iter().find(|r| r.root == focused) {
                if row.id.is_some() {
                    self.pending_focus = row.id;
                }
            }
        }

        let bind = self.callbacks.bind.clone();
        let unbind = self.callbacks.unbind.clone();

        if ctx.full_rebuild {
            for row in &mut self.pool {
                if let Some(old) = row.bound_index.take() {
                    if let Some(unbind) = &unbind {
                        unbind(tree, row.root, old);
                    }
                    if tree.focused() == Some(row.root) {
                        tree.blur();
                    }
                }
                row.id = None;
            }
        }

        while self.pool.len() < needed {
            let root = match &self.callbacks.make {
                Some(make) => make(tree),
                None => tree.create(),
            };
            tree.add_child(self.content, root);
            tree.add_class(root, &ctx.style.row);
            tree.set_focusable(root, true);
            self.pool.push(RecycledRow {
                root,
                bound_index: None,
                id: None,
            });
        }

        // Rows keeping their index, rows to recycle.
        let mut taken = vec![false; needed];
        let mut free = Vec::new();
        for (pi, row) in self.pool.iter_mut().enumerate() {
            match row.bound_index {
                Some(i) if i >= first && i < end => taken[i - first] = true,
                Some(old) => {
                    if let Some(unbind) = &unbind {
                        unbind(tree, row.root, old);
                    }
                    // A recycled row no longer represents the focused item.
                    if tree.focused() == Some(row.root) {
                        tree.blur();
                    }
                    row.bound_index = None;
                    row.id = None;
                    free.push(pi);
                }
                None => free.push(pi),
            }
        }

        let mut free = free.into_iter();
        for slot in 0..needed {
            if taken[slot] {
                continue;
            }
            let Some(pi) = free.next() else { break };
            let index = first + slot;
            let row = &mut self.pool[pi];
            if let Some(bind) = &bind {
                bind(tree, row.root, index);
            }
            row.bound_index = Some(index);
            row.id = ctx.source.id_for_index(index);
        }

        // Content sits at -scroll so row layout stays in content space.
        tree.set_layout(
            self.content,
            Rect::new(
                0.0,
                -ctx.scroll_y,
                ctx.viewport.width.max(0.0),
                self.content_height(count),
            ),
        );

        for row in &self.pool {
            match row.bound_index {
                Some(i) => {
                    tree.set_layout(
                        row.root,
                        Rect::new(
                            0.0,
                            self.row_start(i),
                            ctx.viewport.width.max(0.0),
                            self.row_height(i),
                        ),
                    );
                    tree.set_class(row.root, &ctx.style.row_even, i % 2 == 0);
                    tree.set_class(row.root, &ctx.style.row_odd, i % 2 == 1);
                    tree.set_class(
                        row.root,
                        &ctx.style.row_selected,
                        ctx.selected_indices.contains(&i),
                    );
                    tree.set_class(row.root, &ctx.style.reorder_handle, ctx.reorderable);
                }
                None => tree.set_layout(row.root, Rect::default()),
            }
        }

        // Refocus the row now bound to the remembered item, if it came back.
        if let Some(id) = self.pending_focus {
            if let Some(row) = self
                .pool
                .iter()
                .find(|r| r.id == Some(id) && r.bound_index.is_some())
            {
                tree.focus(row.root);
                self.pending_focus = None;
            }
        }
    }

    /// Destroy every pooled row.
    pub fn teardown(&mut self, tree: &mut ElementTree) {
        let unbind = self.callbacks.unbind.clone();
        let destroy = self.callbacks.destroy.clone();
        for row in self.pool.drain(..) {
            if let Some(old) = row.bound_index {
                if let Some(unbind) = &unbind {
                    unbind(tree, row.root, old);
                }
            }
            match &destroy {
                Some(destroy) => destroy(tree, row.root),
                None => tree.remove(row.root),
            }
        }
    }
}
