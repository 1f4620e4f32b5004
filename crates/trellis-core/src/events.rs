//! Hierarchical event dispatch over the element tree.
//!
//! Pointer events hit-test from the root and run three phases along the
//! root→target path: trickle (root towards target), target, bubble (target
//! back to root). Any handler can stop the remaining phases with
//! [`EventCtx::stop_propagation`].
//!
//! Pointer capture is exclusive per pointer id: while an element holds the
//! capture, every event for that pointer goes straight to the captor (target
//! phase only) and no other element can take the capture until it is
//! released or a `Cancel` event arrives.

use crate::element::{ElementId, ElementTree};
use crate::input::{KeyEvent, PointerEvent, PointerEventKind, PointerId};
use slotmap::SecondaryMap;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPhase {
    Trickle,
    Target,
    Bubble,
}

pub struct EventCtx {
    pub phase: EventPhase,
    pub target: ElementId,
    pub current: ElementId,
    stopped: bool,
}

impl EventCtx {
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }
}

type PointerHandler = Rc<dyn Fn(&mut EventCtx, &PointerEvent)>;
type KeyHandler = Rc<dyn Fn(&mut EventCtx, &KeyEvent)>;

#[derive(Default)]
struct Handlers {
    pointer: Vec<PointerHandler>,
    key: Vec<KeyHandler>,
}

#[derive(Default)]
pub struct Dispatcher {
    handlers: SecondaryMap<ElementId, Handlers>,
    captures: HashMap<PointerId, ElementId>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pointer(&mut self, id: ElementId, f: impl Fn(&mut EventCtx, &PointerEvent) + 'static) {
        if let Some(entry) = self.handlers.entry(id) {
            entry.or_default().pointer.push(Rc::new(f));
        }
    }

    pub fn on_key(&mut self, id: ElementId, f: impl Fn(&mut EventCtx, &KeyEvent) + 'static) {
        if let Some(entry) = self.handlers.entry(id) {
            entry.or_default().key.push(Rc::new(f));
        }
    }

    pub fn clear_handlers(&mut self, id: ElementId) {
        self.handlers.remove(id);
    }

    /// Take exclusive capture of a pointer. Fails (returns false) if another
    /// element already holds it — a second pointer cannot steal an active
    /// gesture's capture, and vice versa.
    pub fn set_pointer_capture(&mut self, id: ElementId, pointer: PointerId) -> bool {
        match self.captures.get(&pointer) {
            Some(existing) if *existing != id => false,
            _ => {
                self.captures.insert(pointer, id);
                true
            }
        }
    }

    pub fn release_pointer_capture(&mut self, id: ElementId, pointer: PointerId) {
        if self.captures.get(&pointer) == Some(&id) {
            self.captures.remove(&pointer);
        }
    }

    pub fn pointer_capture(&self, pointer: PointerId) -> Option<ElementId> {
        self.captures.get(&pointer).copied()
    }

    /// Dispatch a pointer event. Returns the target element, if any.
    pub fn dispatch_pointer(
        &mut self,
        tree: &ElementTree,
        event: &PointerEvent,
    ) -> Option<ElementId> {
        if let Some(captor) = self.captures.get(&event.id).copied() {
            if !tree.contains(captor) {
                self.captures.remove(&event.id);
            } else {
                let mut ctx = EventCtx {
                    phase: EventPhase::Target,
                    target: captor,
                    current: captor,
                    stopped: false,
                };
                self.run_pointer(captor, &mut ctx, event);
                if matches!(event.kind, PointerEventKind::Up | PointerEventKind::Cancel) {
                    self.captures.remove(&event.id);
                }
                return Some(captor);
            }
        }

        let target = tree.hit_test(event.position)?;
        let path = tree.path_to(target);

        let mut ctx = EventCtx {
            phase: EventPhase::Trickle,
            target,
            current: target,
            stopped: false,
        };

        for id in path.iter().take(path.len().saturating_sub(1)) {
            ctx.phase = EventPhase::Trickle;
            ctx.current = *id;
            self.run_pointer(*id, &mut ctx, event);
            if ctx.stopped {
                return Some(target);
            }
        }

        ctx.phase = EventPhase::Target;
        ctx.current = target;
        self.run_pointer(target, &mut ctx, event);
        if ctx.stopped {
            return Some(target);
        }

        for id in path.iter().rev().skip(1) {
            ctx.phase = EventPhase::Bubble;
            ctx.current = *id;
            self.run_pointer(*id, &mut ctx, event);
            if ctx.stopped {
                break;
            }
        }
        Some(target)
    }

    /// Dispatch a key event to the focused element, bubbling to ancestors.
    pub fn dispatch_key(&mut self, tree: &ElementTree, event: &KeyEvent) -> Option<ElementId> {
        let target = tree.focused()?;
        let path = tree.path_to(target);
        let mut ctx = EventCtx {
            phase: EventPhase::Target,
            target,
            current: target,
            stopped: false,
        };
        for id in path.iter().rev() {
            ctx.phase = if *id == target {
                EventPhase::Target
            } else {
                EventPhase::Bubble
            };
            ctx.current = *id;
            self.run_key(*id, &mut ctx, event);
            if ctx.stopped {
                break;
            }
        }
        Some(target)
    }

    fn run_pointer(&self, id: ElementId, ctx: &mut EventCtx, event: &PointerEvent) {
        let snapshot: Vec<PointerHandler> = match self.handlers.get(id) {
            Some(h) => h.pointer.clone(),
            None => return,
        };
        for f in snapshot {
            f(ctx, event);
            if ctx.stopped {
                break;
            }
        }
    }

    fn run_key(&self, id: ElementId, ctx: &mut EventCtx, event: &KeyEvent) {
        let snapshot: Vec<KeyHandler> = match self.handlers.get(id) {
            Some(h) => h.key.clone(),
            None => return,
        };
        for f in snapshot {
            f(ctx, event);
            if ctx.stopped {
                break;
            }
        }
    }
}
