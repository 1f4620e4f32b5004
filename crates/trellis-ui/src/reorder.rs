//! Drag-and-drop row reordering.
//!
//! Pointer-down on a row only *arms* a candidate drag; the drag starts once
//! the pointer travels past a small threshold, so short presses stay
//! selection clicks. While dragging, the drop slot is recomputed from the
//! pointer's content-space y against row midpoints: above a row's vertical
//! center inserts before it, at or below inserts after. The drop itself is
//! reported as a [`MoveRequest`] for the façade to apply; a drop that would
//! land the row back where it started reports nothing.

use crate::style::StyleConfig;
use crate::virtualization::VirtualizationController;
use trellis_core::element::{ElementId, ElementTree};
use trellis_core::geometry::{Rect, Vec2};
use trellis_core::input::PointerId;

/// Movement needed before an armed press becomes a drag, in pixels.
const DRAG_THRESHOLD: f32 = 5.0;
const INDICATOR_HEIGHT: f32 = 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReorderMode {
    /// Insertion-point indicator line.
    #[default]
    Simple,
    /// Ghost row under the pointer plus displaced siblings.
    Animated,
}

/// A completed drop, ready to apply to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: usize,
    pub dest: usize,
    pub insert_before: bool,
}

#[derive(Clone, Copy)]
enum Phase {
    Idle,
    Pending {
        pointer: PointerId,
        start: Vec2,
        index: usize,
    },
    Dragging {
        pointer: PointerId,
        index: usize,
        dest: usize,
        insert_before: bool,
        grab_offset: f32,
        last_y: f32,
    },
}

pub struct ReorderController {
    mode: ReorderMode,
    content: ElementId,
    phase: Phase,
    indicator: Option<ElementId>,
    ghost: Option<ElementId>,
}

impl ReorderController {
    pub fn new(mode: ReorderMode, content: ElementId) -> Self {
        Self {
            mode,
            content,
            phase: Phase::Idle,
            indicator: None,
            ghost: None,
        }
    }

    pub fn mode(&self) -> ReorderMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    /// Arm a candidate drag on a row press. Any gesture already in flight
    /// keeps the controller; a second pointer is ignored.
    pub fn pointer_down(&mut self, pointer: PointerId, index: usize, position: Vec2) {
        if matches!(self.phase, Phase::Idle) {
            self.phase = Phase::Pending {
                pointer,
                start: position,
                index,
            };
        }
    }

    /// Track pointer movement. Crossing the threshold promotes the armed
    /// press to a drag; while dragging, the drop slot and feedback follow
    /// the pointer. `position` is in content space.
    pub fn pointer_move(
        &mut self,
        tree: &mut ElementTree,
        virt: &VirtualizationController,
        style: &StyleConfig,
        count: usize,
        pointer: PointerId,
        position: Vec2,
    ) {
        match self.phase {
            Phase::Pending {
                pointer: p,
                start,
                index,
            } if p == pointer => {
                let dx = position.x - start.x;
                let dy = position.y - start.y;
                if (dx * dx + dy * dy).sqrt() >= DRAG_THRESHOLD {
                    let (row_top, _) = virt.row_bounds(index);
                    let (dest, insert_before) = drop_slot(virt, count, position.y);
                    self.phase = Phase::Dragging {
                        pointer,
                        index,
                        dest,
                        insert_before,
                        grab_offset: start.y - row_top,
                        last_y: position.y,
                    };
                    self.update_feedback(tree, virt, style, position);
                }
            }
            Phase::Dragging { pointer: p, .. } if p == pointer => {
                let (dest, insert_before) = drop_slot(virt, count, position.y);
                if let Phase::Dragging {
                    dest: d,
                    insert_before: b,
                    last_y,
                    ..
                } = &mut self.phase
                {
                    *d = dest;
                    *b = insert_before;
                    *last_y = position.y;
                }
                self.update_feedback(tree, virt, style, position);
            }
            _ => {}
        }
    }

    /// Finish the gesture. Returns the move to apply, or `None` when the
    /// gesture was a click or the drop lands the row where it already is.
    pub fn pointer_up(
        &mut self,
        tree: &mut ElementTree,
        virt: &VirtualizationController,
        pointer: PointerId,
    ) -> Option<MoveRequest> {
        match self.phase {
            Phase::Pending { pointer: p, .. } if p == pointer => {
                self.phase = Phase::Idle;
                None
            }
            Phase::Dragging {
                pointer: p,
                index,
                dest,
                insert_before,
                ..
            } if p == pointer => {
                self.clear_feedback(tree, virt);
                self.phase = Phase::Idle;
                // Insertion slot in the pre-removal ordering; the slots just
                // before and just after the dragged row are both no-ops.
                let slot = dest + usize::from(!insert_before);
                if slot == index || slot == index + 1 {
                    return None;
                }
                Some(MoveRequest {
                    from: index,
                    dest,
                    insert_before,
                })
            }
            _ => None,
        }
    }

    /// Abort the gesture (Escape, pointer-capture loss). Idempotent; all
    /// feedback is removed synchronously and the order stays untouched.
    pub fn cancel(&mut self, tree: &mut ElementTree, virt: &VirtualizationController) {
        self.clear_feedback(tree, virt);
        self.phase = Phase::Idle;
    }

    /// Reapply drag feedback after a refresh pass re-laid the rows.
    pub fn apply_feedback(
        &mut self,
        tree: &mut ElementTree,
        virt: &VirtualizationController,
        style: &StyleConfig,
    ) {
        if let Phase::Dragging { last_y, .. } = self.phase {
            self.update_feedback(tree, virt, style, Vec2::new(0.0, last_y));
        }
    }

    fn update_feedback(
        &mut self,
        tree: &mut ElementTree,
        virt: &VirtualizationController,
        style: &StyleConfig,
        position: Vec2,
    ) {
        let Phase::Dragging {
            index,
            dest,
            insert_before,
            grab_offset,
            ..
        } = self.phase
        else {
            return;
        };
        let width = tree.layout(self.content).w;
        match self.mode {
            ReorderMode::Simple => {
                let indicator = *self.indicator.get_or_insert_with(|| {
                    let el = tree.create();
                    tree.add_child(self.content, el);
                    tree.add_class(el, &style.drag_indicator);
                    el
                });
                let (top, height) = virt.row_bounds(dest);
                let line_y = if insert_before { top } else { top + height };
                tree.set_layout(
                    indicator,
                    Rect::new(0.0, line_y - INDICATOR_HEIGHT * 0.5, width, INDICATOR_HEIGHT),
                );
            }
            ReorderMode::Animated => {
                let ghost = *self.ghost.get_or_insert_with(|| {
                    let el = tree.create();
                    tree.add_child(self.content, el);
                    tree.add_class(el, &style.drag_ghost);
                    el
                });
                let (_, height) = virt.row_bounds(index);
                tree.set_layout(
                    ghost,
                    Rect::new(0.0, position.y - grab_offset, width, height),
                );
                // Displace the rows between the source and the drop slot so
                // the gap tracks the ghost. Positions are rebuilt from the
                // authoritative row bounds on every pass, so repeated move
                // events at the same slot are idempotent and rows that left
                // the gap fall back to their own slot.
                let slot = dest + usize::from(!insert_before);
                for (i, el) in virt.bound_rows() {
                    if i == index {
                        continue;
                    }
                    let (top, _) = virt.row_bounds(i);
                    let mut rect = tree.layout(el);
                    rect.y = if index < i && i < slot {
                        top - height
                    } else if slot <= i && i < index {
                        top + height
                    } else {
                        top
                    };
                    tree.set_layout(el, rect);
                }
            }
        }
    }

    fn clear_feedback(&mut self, tree: &mut ElementTree, virt: &VirtualizationController) {
        if let Some(el) = self.indicator.take() {
            tree.remove(el);
        }
        if let Some(el) = self.ghost.take() {
            tree.remove(el);
        }
        // Displaced siblings go back to their authoritative positions as part
        // of ending the gesture, not on some later refresh.
        if self.mode == ReorderMode::Animated {
            for (i, el) in virt.bound_rows() {
                let (top, _) = virt.row_bounds(i);
                let mut rect = tree.layout(el);
                rect.y = top;
                tree.set_layout(el, rect);
            }
        }
    }
}

/// Resolve the drop slot for a content-space y: the row under the pointer,
/// split at its vertical midpoint. Past the last row drops after it.
fn drop_slot(virt: &VirtualizationController, count: usize, y: f32) -> (usize, bool) {
    if count == 0 {
        return (0, true);
    }
    match virt.row_index_at(y.max(0.0), count) {
        Some(i) => {
            let (top, height) = virt.row_bounds(i);
            (i, y < top + height * 0.5)
        }
        None => (count - 1, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CollectionSource, ListController};
    use crate::virtualization::{RefreshCtx, VirtualizationMethod};
    use std::cell::RefCell;
    use std::rc::Rc;
    use trellis_core::geometry::Size;

    fn harness(n: usize) -> (ElementTree, VirtualizationController, ListController<usize>) {
        let mut tree = ElementTree::new();
        let content = tree.create();
        tree.add_child(tree.root(), content);
        let mut src = ListController::new();
        src.set_items_source(Rc::new(RefCell::new((0..n).collect())));
        let mut virt = VirtualizationController::new(VirtualizationMethod::FixedHeight, content);
        virt.set_fixed_item_height(20.0).unwrap();
        let style = StyleConfig::default();
        virt.refresh(
            &mut tree,
            &RefreshCtx {
                source: &src,
                viewport: Size::new(300.0, 200.0),
                scroll_y: 0.0,
                full_rebuild: true,
                style: &style,
                selected_indices: &[],
                reorderable: true,
            },
        );
        (tree, virt, src)
    }

    fn content(tree: &ElementTree) -> ElementId {
        tree.children(tree.root())[0]
    }

    #[test]
    fn short_press_stays_a_click() {
        let (mut tree, virt, src) = harness(10);
        let mut reorder = ReorderController::new(ReorderMode::Simple, content(&tree));
        let style = StyleConfig::default();
        let p = PointerId(1);

        reorder.pointer_down(p, 2, Vec2::new(10.0, 45.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(12.0, 47.0));
        assert!(!reorder.is_dragging());
        assert_eq!(reorder.pointer_up(&mut tree, &virt, p), None);
    }

    #[test]
    fn midpoint_splits_before_and_after() {
        let (mut tree, virt, src) = harness(10);
        let mut reorder = ReorderController::new(ReorderMode::Simple, content(&tree));
        let style = StyleConfig::default();
        let p = PointerId(1);

        // Row 5 spans 100..120; its midpoint is 110.
        reorder.pointer_down(p, 0, Vec2::new(10.0, 5.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 109.0));
        assert!(reorder.is_dragging());
        let req = {
            reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 110.5));
            reorder.pointer_up(&mut tree, &virt, p).unwrap()
        };
        assert_eq!(req, MoveRequest { from: 0, dest: 5, insert_before: false });
    }

    #[test]
    fn drop_back_at_origin_is_nothing() {
        let (mut tree, virt, src) = harness(10);
        let mut reorder = ReorderController::new(ReorderMode::Simple, content(&tree));
        let style = StyleConfig::default();
        let p = PointerId(1);

        // Drag row 3 (60..80) around, release just above its own midpoint.
        reorder.pointer_down(p, 3, Vec2::new(10.0, 65.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 140.0));
        assert!(reorder.is_dragging());
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 62.0));
        assert_eq!(reorder.pointer_up(&mut tree, &virt, p), None);

        // Releasing above the next row's midpoint (slot directly after the
        // dragged row) is equally a no-op.
        reorder.pointer_down(p, 3, Vec2::new(10.0, 65.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 140.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 85.0));
        assert_eq!(reorder.pointer_up(&mut tree, &virt, p), None);
    }

    #[test]
    fn indicator_appears_and_cancel_is_idempotent() {
        let (mut tree, virt, src) = harness(10);
        let c = content(&tree);
        let mut reorder = ReorderController::new(ReorderMode::Simple, c);
        let style = StyleConfig::default();
        let p = PointerId(1);

        reorder.pointer_down(p, 0, Vec2::new(10.0, 5.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 90.0));
        let indicator = tree
            .children(c)
            .iter()
            .copied()
            .find(|e| tree.has_class(*e, &style.drag_indicator));
        assert!(indicator.is_some());

        reorder.cancel(&mut tree, &virt);
        assert!(!tree.contains(indicator.unwrap()));
        assert!(!reorder.is_dragging());
        reorder.cancel(&mut tree, &virt);
        assert!(!reorder.is_dragging());
    }

    #[test]
    fn second_pointer_cannot_steal_the_gesture() {
        let (mut tree, virt, src) = harness(10);
        let mut reorder = ReorderController::new(ReorderMode::Simple, content(&tree));
        let style = StyleConfig::default();

        reorder.pointer_down(PointerId(1), 2, Vec2::new(10.0, 45.0));
        reorder.pointer_down(PointerId(2), 7, Vec2::new(10.0, 150.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), PointerId(2), Vec2::new(10.0, 190.0));
        assert!(!reorder.is_dragging());
        assert_eq!(reorder.pointer_up(&mut tree, &virt, PointerId(2)), None);

        // The first pointer's gesture is still armed.
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), PointerId(1), Vec2::new(10.0, 100.0));
        assert!(reorder.is_dragging());
        reorder.cancel(&mut tree, &virt);
    }

    #[test]
    fn past_the_last_row_drops_after_it() {
        let (mut tree, virt, src) = harness(5);
        let mut reorder = ReorderController::new(ReorderMode::Simple, content(&tree));
        let style = StyleConfig::default();
        let p = PointerId(1);

        reorder.pointer_down(p, 0, Vec2::new(10.0, 5.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 500.0));
        let req = reorder.pointer_up(&mut tree, &virt, p).unwrap();
        assert_eq!(req, MoveRequest { from: 0, dest: 4, insert_before: false });
    }

    #[test]
    fn animated_mode_shows_ghost() {
        let (mut tree, virt, src) = harness(10);
        let c = content(&tree);
        let mut reorder = ReorderController::new(ReorderMode::Animated, c);
        let style = StyleConfig::default();
        let p = PointerId(1);

        reorder.pointer_down(p, 1, Vec2::new(10.0, 25.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 120.0));
        let ghost = tree
            .children(c)
            .iter()
            .copied()
            .find(|e| tree.has_class(*e, &style.drag_ghost))
            .unwrap();
        // Ghost tracks the pointer, offset by the in-row grab point.
        assert_eq!(tree.layout(ghost).y, 120.0 - 5.0);
        reorder.cancel(&mut tree, &virt);
        assert!(!tree.contains(ghost));
    }

    #[test]
    fn animated_gap_is_stable_while_the_pointer_hovers() {
        let (mut tree, virt, src) = harness(10);
        let mut reorder = ReorderController::new(ReorderMode::Animated, content(&tree));
        let style = StyleConfig::default();
        let p = PointerId(1);

        // Drag row 0 past row 4's midpoint: rows 1..=4 shift up one height.
        reorder.pointer_down(p, 0, Vec2::new(10.0, 5.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 90.0));
        let row2 = virt.element_for_index(2).unwrap();
        assert_eq!(tree.layout(row2).y, 20.0);

        // Further move events at the same slot must not stack displacement.
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 90.0));
        assert_eq!(tree.layout(row2).y, 20.0);

        // Retreating above row 2's midpoint drops it out of the gap.
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 45.0));
        assert_eq!(tree.layout(row2).y, 40.0);
        reorder.cancel(&mut tree, &virt);
    }

    #[test]
    fn cancel_puts_displaced_rows_back() {
        let (mut tree, virt, src) = harness(10);
        let mut reorder = ReorderController::new(ReorderMode::Animated, content(&tree));
        let style = StyleConfig::default();
        let p = PointerId(1);

        reorder.pointer_down(p, 0, Vec2::new(10.0, 5.0));
        reorder.pointer_move(&mut tree, &virt, &style, src.item_count(), p, Vec2::new(10.0, 90.0));
        let row2 = virt.element_for_index(2).unwrap();
        assert_eq!(tree.layout(row2).y, 20.0);

        reorder.cancel(&mut tree, &virt);
        assert_eq!(tree.layout(row2).y, 40.0);
        assert!(!reorder.is_dragging());
    }
}
