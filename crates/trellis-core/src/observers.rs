//! Explicit observer lists for view events.
//!
//! Dispatch iterates a snapshot of the subscriber list taken when `emit`
//! begins: a handler that subscribes or unsubscribes during dispatch changes
//! the *next* emit, never the current pass.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription(u64);

pub struct Observers<T> {
    subs: RefCell<Vec<(u64, Rc<dyn Fn(&T)>)>>,
    next: Cell<u64>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Observers<T> {
    pub fn new() -> Self {
        Self {
            subs: RefCell::new(Vec::new()),
            next: Cell::new(1),
        }
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let id = self.next.get();
        self.next.set(id + 1);
        self.subs.borrow_mut().push((id, Rc::new(f)));
        Subscription(id)
    }

    pub fn unsubscribe(&self, sub: Subscription) {
        self.subs.borrow_mut().retain(|(id, _)| *id != sub.0);
    }

    pub fn is_empty(&self) -> bool {
        self.subs.borrow().is_empty()
    }

    pub fn emit(&self, value: &T) {
        // Snapshot so handlers can re-enter subscribe/unsubscribe.
        let snapshot: Vec<Rc<dyn Fn(&T)>> =
            self.subs.borrow().iter().map(|(_, f)| f.clone()).collect();
        for f in snapshot {
            f(value);
        }
    }
}
