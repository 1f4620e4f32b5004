//! The collection-view façade: one controller, one virtualization
//! controller, one selection tracker, one optional reorder controller,
//! composed behind a single event-driven surface.
//!
//! `CollectionView` is generic over its [`CollectionSource`]; list versus
//! tree is resolved at construction, never by downcasting. The host feeds
//! pointer/key/wheel events in viewport coordinates and advances the frame
//! tick; everything else (selection, recycling, drag-reorder, persistence)
//! happens in here.

use crate::ids::{CollectionSource, ItemId};
use crate::reorder::{MoveRequest, ReorderController, ReorderMode};
use crate::scroll::{ScrollMode, ScrollState};
use crate::selection::{SelectionMode, SelectionOutcome, SelectionTracker};
use crate::style::StyleConfig;
use crate::virtualization::{
    RefreshCtx, RowCallbacks, VirtualizationController, VirtualizationMethod,
};
use serde::{Deserialize, Serialize};
use trellis_core::element::{ElementId, ElementTree};
use trellis_core::error::Error;
use trellis_core::geometry::{Size, Vec2};
use trellis_core::input::{
    Key, KeyEvent, Modifiers, PointerEvent, PointerEventKind, PointerId, WheelEvent,
};
use trellis_core::observers::Observers;
use trellis_core::schedule::Scheduler;
use trellis_core::viewdata::ViewDataStore;

/// Two presses on the same row within this window count as a choose.
const DOUBLE_CLICK_MS: u64 = 500;

/// Observer lists the façade owns. `items_chosen` (double-click / Enter) is
/// distinct from `selection_changed`; `selection_unchanged` fires when an
/// operation resolved to the already-selected set.
#[derive(Default)]
pub struct CollectionEvents {
    pub selection_changed: Observers<Vec<ItemId>>,
    pub selected_indices_changed: Observers<Vec<usize>>,
    pub selection_unchanged: Observers<()>,
    pub items_chosen: Observers<Vec<usize>>,
    pub item_index_changed: Observers<(usize, usize)>,
    pub items_added: Observers<Vec<usize>>,
    pub items_removed: Observers<Vec<usize>>,
    pub items_source_changed: Observers<()>,
}

/// Everything a view persists under its view-data key.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub selected_ids: Vec<ItemId>,
    pub scroll_offset: (f32, f32),
    pub first_visible: usize,
    pub expanded_ids: Vec<ItemId>,
}

pub struct CollectionView<C: CollectionSource> {
    controller: C,
    tree: ElementTree,
    content: ElementId,
    virt: VirtualizationController,
    selection: SelectionTracker,
    reorder: Option<ReorderController>,
    scroll: ScrollState,
    scheduler: Scheduler,
    events: CollectionEvents,
    style: StyleConfig,
    view_data: Option<(ViewDataStore, String)>,
    /// Replace-selection deferred from pointer-down to pointer-up so an
    /// imminent drag keeps the multi-selection.
    pending_click: Option<usize>,
    last_click: Option<(u64, usize)>,
    captured: Option<PointerId>,
    viewport: Size,
}

impl<C: CollectionSource> CollectionView<C> {
    pub fn new(controller: C, method: VirtualizationMethod, style: StyleConfig) -> Self {
        let mut tree = ElementTree::new();
        let content = tree.create();
        tree.add_child(tree.root(), content);
        tree.add_class(content, &style.container);
        tree.set_focusable(content, true);
        let virt = VirtualizationController::new(method, content);
        Self {
            controller,
            tree,
            content,
            virt,
            selection: SelectionTracker::default(),
            reorder: None,
            scroll: ScrollState::default(),
            scheduler: Scheduler::new(),
            events: CollectionEvents::default(),
            style,
            view_data: None,
            pending_click: None,
            last_click: None,
            captured: None,
            viewport: Size::new(0.0, 0.0),
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Mutable controller access. Callers that change structure through this
    /// must follow up with [`CollectionView::after_structural_change`].
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn events(&self) -> &CollectionEvents {
        &self.events
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    pub fn content_element(&self) -> ElementId {
        self.content
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scroll_state(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn item_count(&self) -> usize {
        self.controller.item_count()
    }

    pub fn element_for_index(&self, index: usize) -> Option<ElementId> {
        self.virt.element_for_index(index)
    }

    pub fn scroll_offset(&self) -> Vec2 {
        self.scroll.offset()
    }

    // ---- configuration ---------------------------------------------------

    pub fn set_viewport(&mut self, size: Size) {
        if size.is_valid() {
            self.viewport = size;
        }
        self.refresh_view(false);
    }

    pub fn set_row_callbacks(&mut self, callbacks: RowCallbacks) {
        self.virt.set_callbacks(callbacks);
    }

    pub fn set_fixed_item_height(&mut self, height: f32) -> Result<(), Error> {
        self.virt.set_fixed_item_height(height)?;
        self.refresh_view(true);
        Ok(())
    }

    pub fn set_default_item_height(&mut self, height: f32) -> Result<(), Error> {
        self.virt.set_default_height(height)?;
        self.refresh_view(true);
        Ok(())
    }

    pub fn virtualization_method(&self) -> VirtualizationMethod {
        self.virt.method()
    }

    pub fn set_virtualization_method(&mut self, method: VirtualizationMethod) {
        self.virt.set_method(method, &mut self.tree);
        self.refresh_view(true);
    }

    pub fn set_scroll_mode(&mut self, mode: ScrollMode) {
        self.scroll.set_mode(mode);
    }

    /// Enable or disable drag reordering. Enabling stamps rows with the
    /// reorder-handle class on the next refresh.
    pub fn set_reorderable(&mut self, mode: Option<ReorderMode>) {
        if let Some(reorder) = self.reorder.as_mut() {
            reorder.cancel(&mut self.tree, &self.virt);
        }
        self.reorder = mode.map(|m| ReorderController::new(m, self.content));
        self.refresh_view(false);
    }

    pub fn is_reorderable(&self) -> bool {
        self.reorder.is_some()
    }

    /// Attach a persisted-state store; restores any previously saved state
    /// for this key immediately.
    pub fn set_view_data(&mut self, store: ViewDataStore, key: impl Into<String>) {
        self.view_data = Some((store, key.into()));
        self.restore_state();
    }

    // ---- selection -------------------------------------------------------

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        let outcome = self.selection.set_mode(mode, &self.controller);
        self.finish_selection(outcome);
    }

    pub fn selected_indices(&self) -> &[usize] {
        self.selection.selected_indices()
    }

    pub fn selected_ids(&self) -> &[ItemId] {
        self.selection.selected_ids()
    }

    pub fn set_selection(&mut self, indices: &[usize]) {
        let outcome = self.selection.set_selection(indices, &self.controller);
        self.finish_selection(outcome);
    }

    pub fn add_to_selection(&mut self, indices: &[usize]) {
        let outcome = self.selection.add_to_selection(indices, &self.controller);
        self.finish_selection(outcome);
    }

    pub fn remove_from_selection(&mut self, index: usize) {
        let outcome = self.selection.remove_from_selection(index, &self.controller);
        self.finish_selection(outcome);
    }

    pub fn toggle_selection(&mut self, index: usize) {
        let outcome = self.selection.toggle(index, &self.controller);
        self.finish_selection(outcome);
    }

    pub fn clear_selection(&mut self) {
        let outcome = self.selection.clear_selection(&self.controller);
        self.finish_selection(outcome);
    }

    pub fn select_all(&mut self) {
        let outcome = self.selection.select_all(&self.controller);
        self.finish_selection(outcome);
    }

    pub fn do_range_selection(&mut self, target: usize) {
        let outcome = self.selection.do_range_selection(target, &self.controller);
        self.finish_selection(outcome);
    }

    fn finish_selection(&mut self, outcome: SelectionOutcome) {
        match outcome {
            SelectionOutcome::Changed => {
                self.refresh_view(false);
                self.emit_selection_changed();
                self.save_state();
            }
            SelectionOutcome::Unchanged => self.events.selection_unchanged.emit(&()),
        }
    }

    fn emit_selection_changed(&self) {
        self.events
            .selection_changed
            .emit(&self.selection.selected_ids().to_vec());
        self.events
            .selected_indices_changed
            .emit(&self.selection.selected_indices().to_vec());
    }

    // ---- scrolling -------------------------------------------------------

    /// Minimal scroll to bring a row fully into view; `-1` is the last item.
    /// Already-visible rows are left alone.
    pub fn scroll_to_item(&mut self, index: i64) {
        let count = self.controller.item_count();
        if let Some(y) =
            self.virt
                .scroll_to_item(index, self.scroll.offset().y, self.viewport.height, count)
        {
            let x = self.scroll.offset().x;
            self.scroll.scroll_to(Vec2::new(x, y));
            self.refresh_view(false);
            self.save_state();
        }
    }

    pub fn handle_wheel(&mut self, event: &WheelEvent) {
        self.scroll.scroll_by(event.delta);
        self.refresh_view(false);
        self.save_state();
    }

    // ---- rebuild / refresh -----------------------------------------------

    /// Full teardown-free rebuild: every pooled row is unbound and rebound,
    /// class lists reapplied.
    pub fn rebuild(&mut self) {
        self.refresh_view(true);
    }

    /// Cheap pass: only rows whose bound index changed are rebound.
    pub fn refresh_items(&mut self) {
        self.refresh_view(false);
    }

    /// Re-resolve selection and rebind after the controller's structure
    /// changed (insert/remove/expand/collapse/move).
    pub fn after_structural_change(&mut self) {
        let outcome = self.selection.refresh(&self.controller);
        self.refresh_view(true);
        if outcome == SelectionOutcome::Changed {
            self.emit_selection_changed();
        }
        self.save_state();
    }

    fn refresh_view(&mut self, full_rebuild: bool) {
        let count = self.controller.item_count();
        let content_height = self.virt.measure_content(count);
        self.scroll.set_viewport(self.viewport);
        self.scroll
            .set_content(Size::new(self.viewport.width, content_height));
        let ctx = RefreshCtx {
            source: &self.controller,
            viewport: self.viewport,
            scroll_y: self.scroll.offset().y,
            full_rebuild,
            style: &self.style,
            selected_indices: self.selection.selected_indices(),
            reorderable: self.reorder.is_some(),
        };
        self.virt.refresh(&mut self.tree, &ctx);
        // A refresh mid-drag re-lays the pooled rows at their resting
        // positions; put the drag feedback back on top of them.
        if let Some(reorder) = self.reorder.as_mut() {
            reorder.apply_feedback(&mut self.tree, &self.virt, &self.style);
        }
    }

    /// Advance the frame tick: run due deferred tasks, then integrate scroll
    /// inertia/springback and rebind if the offset moved.
    pub fn tick(&mut self, dt_ms: u64) {
        self.scheduler.advance(dt_ms);
        let before = self.scroll.offset();
        self.scroll.tick(dt_ms);
        if self.scroll.offset() != before {
            self.refresh_view(false);
        }
    }

    // ---- input -----------------------------------------------------------

    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        if let Some(captured) = self.captured {
            if captured != event.id {
                return;
            }
        }
        let count = self.controller.item_count();
        let content_pos = Vec2::new(
            event.position.x,
            event.position.y + self.scroll.offset().y,
        );
        match event.kind {
            PointerEventKind::Down if event.is_primary => {
                self.captured = Some(event.id);
                match self.virt.row_index_at(content_pos.y, count) {
                    Some(index) => self.press_row(index, event, content_pos),
                    None => self.clear_selection(),
                }
            }
            PointerEventKind::Move => {
                if let Some(reorder) = self.reorder.as_mut() {
                    reorder.pointer_move(
                        &mut self.tree,
                        &self.virt,
                        &self.style,
                        count,
                        event.id,
                        content_pos,
                    );
                }
            }
            PointerEventKind::Up => {
                let mut was_dragging = false;
                let mut request = None;
                if let Some(reorder) = self.reorder.as_mut() {
                    was_dragging = reorder.is_dragging();
                    request = reorder.pointer_up(&mut self.tree, &self.virt, event.id);
                }
                if let Some(req) = request {
                    self.apply_move(req);
                }
                if let Some(index) = self.pending_click.take() {
                    if !was_dragging {
                        let outcome = self.selection.set_selection(&[index], &self.controller);
                        self.finish_selection(outcome);
                    }
                }
                if self.captured == Some(event.id) {
                    self.captured = None;
                }
            }
            PointerEventKind::Cancel => {
                if let Some(reorder) = self.reorder.as_mut() {
                    reorder.cancel(&mut self.tree, &self.virt);
                }
                self.pending_click = None;
                if self.captured == Some(event.id) {
                    self.captured = None;
                }
            }
            _ => {}
        }
    }

    fn press_row(&mut self, index: usize, event: &PointerEvent, content_pos: Vec2) {
        if let Some(reorder) = self.reorder.as_mut() {
            reorder.pointer_down(event.id, index, content_pos);
        }
        let now = self.scheduler.now_ms();
        let double = matches!(
            self.last_click,
            Some((t, i)) if i == index && now.saturating_sub(t) <= DOUBLE_CLICK_MS
        );
        self.last_click = Some((now, index));

        let mods = event.modifiers;
        if mods.contains(Modifiers::SHIFT) {
            let outcome = self.selection.do_range_selection(index, &self.controller);
            self.finish_selection(outcome);
        } else if mods.is_action() {
            let outcome = self.selection.toggle(index, &self.controller);
            self.finish_selection(outcome);
        } else if self.selection.is_index_selected(index)
            && self.selection.selected_indices().len() > 1
        {
            self.pending_click = Some(index);
        } else {
            let outcome = self.selection.set_selection(&[index], &self.controller);
            self.finish_selection(outcome);
        }

        if double {
            self.events
                .items_chosen
                .emit(&self.selection.selected_indices().to_vec());
            self.last_click = None;
        }
    }

    fn apply_move(&mut self, req: MoveRequest) {
        let moved_id = self.controller.id_for_index(req.from);
        if !self
            .controller
            .move_item(req.from, req.dest, req.insert_before)
        {
            self.refresh_view(false);
            return;
        }
        let to = moved_id
            .and_then(|id| self.controller.index_for_id(id))
            .unwrap_or(req.from);
        let outcome = self.selection.refresh(&self.controller);
        self.refresh_view(true);
        self.events.item_index_changed.emit(&(req.from, to));
        if outcome == SelectionOutcome::Changed {
            self.emit_selection_changed();
        }
        self.save_state();
    }

    pub fn handle_key(&mut self, event: &KeyEvent) {
        let count = self.controller.item_count();
        match event.key {
            Key::ArrowUp => self.navigate(-1, event.modifiers),
            Key::ArrowDown => self.navigate(1, event.modifiers),
            Key::PageUp => self.navigate(-self.visible_rows(), event.modifiers),
            Key::PageDown => self.navigate(self.visible_rows(), event.modifiers),
            Key::Home if count > 0 => self.navigate_to(0, event.modifiers),
            Key::End if count > 0 => self.navigate_to(count - 1, event.modifiers),
            Key::Enter => {
                if !self.selection.selected_indices().is_empty() {
                    self.events
                        .items_chosen
                        .emit(&self.selection.selected_indices().to_vec());
                }
            }
            Key::Escape => {
                let dragging = self.reorder.as_ref().is_some_and(|r| r.is_dragging());
                if dragging {
                    if let Some(reorder) = self.reorder.as_mut() {
                        reorder.cancel(&mut self.tree, &self.virt);
                    }
                } else {
                    self.clear_selection();
                }
            }
            Key::ArrowRight => self.expand_or_descend(),
            Key::ArrowLeft => self.collapse_or_ascend(),
            Key::Character(c) if (c == 'a' || c == 'A') && event.modifiers.is_action() => {
                self.select_all();
            }
            _ => {}
        }
    }

    fn visible_rows(&self) -> i64 {
        let (_, row_h) = self.virt.row_bounds(0);
        if row_h > 0.0 {
            ((self.viewport.height / row_h).floor().max(1.0)) as i64
        } else {
            1
        }
    }

    /// Step from the selection extreme in the pressed direction.
    fn navigate(&mut self, delta: i64, mods: Modifiers) {
        let count = self.controller.item_count();
        if count == 0 {
            return;
        }
        let base = if delta < 0 {
            self.selection.selected_indices().iter().min().copied()
        } else {
            self.selection.selected_indices().iter().max().copied()
        };
        let target = match base {
            Some(b) => (b as i64 + delta).clamp(0, count as i64 - 1) as usize,
            None if delta > 0 => 0,
            None => count - 1,
        };
        self.navigate_to(target, mods);
    }

    fn navigate_to(&mut self, target: usize, mods: Modifiers) {
        let outcome = if mods.contains(Modifiers::SHIFT)
            && self.selection.mode() == SelectionMode::Multiple
        {
            self.selection.do_range_selection(target, &self.controller)
        } else {
            self.selection.set_selection(&[target], &self.controller)
        };
        self.finish_selection(outcome);
        self.scroll_to_item(target as i64);
    }

    /// Right arrow on a tree row: expand a collapsed branch, otherwise step
    /// into its first child. Flat lists ignore it.
    fn expand_or_descend(&mut self) {
        let Some(index) = self.selection.last_selected_index() else {
            return;
        };
        if self.controller.try_expand_row(index) {
            self.after_structural_change();
        } else if self.controller.row_is_expanded(index)
            && self.controller.row_has_children(index)
        {
            self.navigate_to(index + 1, Modifiers::empty());
        }
    }

    /// Left arrow: collapse an expanded branch, otherwise step to the parent.
    fn collapse_or_ascend(&mut self) {
        let Some(index) = self.selection.last_selected_index() else {
            return;
        };
        if self.controller.try_collapse_row(index) {
            self.after_structural_change();
        } else if let Some(parent) = self.controller.parent_index(index) {
            self.navigate_to(parent, Modifiers::empty());
        }
    }

    // ---- persistence -----------------------------------------------------

    pub fn view_state(&self) -> ViewState {
        let count = self.controller.item_count();
        ViewState {
            selected_ids: self.selection.selected_ids().to_vec(),
            scroll_offset: (self.scroll.offset().x, self.scroll.offset().y),
            first_visible: self
                .virt
                .row_index_at(self.scroll.offset().y.max(0.0), count)
                .unwrap_or(0),
            expanded_ids: self.controller.expanded_ids(),
        }
    }

    fn save_state(&self) {
        if let Some((store, key)) = &self.view_data {
            store.save(key, &self.view_state());
        }
    }

    fn restore_state(&mut self) {
        let Some((store, key)) = self.view_data.clone() else {
            return;
        };
        let Some(state) = store.load::<ViewState>(&key) else {
            return;
        };
        self.controller.restore_expanded(&state.expanded_ids);
        self.selection.restore_ids(&state.selected_ids, &self.controller);
        let count = self.controller.item_count();
        let content_height = self.virt.measure_content(count);
        self.scroll
            .set_content(Size::new(self.viewport.width, content_height));
        self.scroll
            .scroll_to(Vec2::new(state.scroll_offset.0, state.scroll_offset.1));
        self.refresh_view(true);
    }
}
