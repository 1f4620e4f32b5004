//! Virtual-clock deferred task queue.
//!
//! All "later" work in trellis is cooperative re-entry into the host's frame
//! tick, never an OS timer or thread. The host advances the clock once per
//! frame; due tasks run synchronously, in scheduling order, during
//! [`Scheduler::advance`]. Tests drive the clock directly, which makes every
//! time-dependent behavior deterministic.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskId(u64);

struct Task {
    id: TaskId,
    due_ms: u64,
    seq: u64,
    f: Box<dyn FnOnce()>,
}

struct Inner {
    now_ms: u64,
    next_id: u64,
    next_seq: u64,
    tasks: Vec<Task>,
}

/// Cloneable handle to a single-threaded task queue keyed by a virtual clock.
#[derive(Clone)]
pub struct Scheduler(Rc<RefCell<Inner>>);

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Inner {
            now_ms: 0,
            next_id: 1,
            next_seq: 0,
            tasks: Vec::new(),
        })))
    }

    pub fn now_ms(&self) -> u64 {
        self.0.borrow().now_ms
    }

    /// Schedule `f` to run once `delay_ms` has elapsed on the virtual clock.
    pub fn execute_later(&self, delay_ms: u64, f: impl FnOnce() + 'static) -> TaskId {
        let mut inner = self.0.borrow_mut();
        let id = TaskId(inner.next_id);
        inner.next_id += 1;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due_ms = inner.now_ms + delay_ms;
        inner.tasks.push(Task {
            id,
            due_ms,
            seq,
            f: Box::new(f),
        });
        id
    }

    /// Cancel a pending task. Idempotent; a task that already ran is gone.
    pub fn cancel(&self, id: TaskId) {
        self.0.borrow_mut().tasks.retain(|t| t.id != id);
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.0.borrow().tasks.iter().any(|t| t.id == id)
    }

    /// Advance the clock by `dt_ms` and run every task that became due, in
    /// (due time, scheduling order). Tasks scheduled during the drain run in
    /// the same call if they are already due.
    pub fn advance(&self, dt_ms: u64) {
        {
            let mut inner = self.0.borrow_mut();
            inner.now_ms += dt_ms;
        }
        loop {
            // Pull one due task at a time so re-entrant scheduling during a
            // task body cannot conflict with the queue borrow.
            let task = {
                let mut inner = self.0.borrow_mut();
                let now = inner.now_ms;
                let best = inner
                    .tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due_ms <= now)
                    .min_by_key(|(_, t)| (t.due_ms, t.seq))
                    .map(|(i, _)| i);
                best.map(|i| inner.tasks.remove(i))
            };
            match task {
                Some(t) => (t.f)(),
                None => break,
            }
        }
    }
}
