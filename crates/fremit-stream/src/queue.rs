//! Deferred task queue.
//!
//! Work that must not run inline (buffered replay, re-entrant emission) is
//! queued here and runs once the current unit of work has unwound. Tasks
//! run in FIFO order, including tasks queued while a drain is in progress.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Clears a flag when dropped, including during unwinding.
pub(crate) struct FlagGuard<'a>(&'a Cell<bool>);

impl<'a> FlagGuard<'a> {
    /// Set `flag`, or return `None` when it was already set.
    pub(crate) fn raise(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[derive(Default)]
struct QueueInner {
    tasks: RefCell<VecDeque<Task>>,
    draining: Cell<bool>,
}

/// FIFO queue of deferred tasks.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct TaskQueue {
    inner: Rc<QueueInner>,
}

impl TaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run on the next drain.
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        let mut tasks = self.inner.tasks.borrow_mut();
        tasks.push_back(Box::new(task));
        trace!(pending = tasks.len(), "Task deferred");
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.tasks.borrow().is_empty()
    }

    /// Drop every queued task without running it.
    ///
    /// Returns the number of tasks discarded.
    pub fn clear(&self) -> usize {
        let discarded = std::mem::take(&mut *self.inner.tasks.borrow_mut());
        discarded.len()
    }

    /// Whether a drain is currently running.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.inner.draining.get()
    }

    /// Run queued tasks until the queue is empty or `limit` tasks have run.
    ///
    /// A `limit` of zero means no limit. Calling this from inside a task is
    /// a no-op: the outer drain picks up anything queued meanwhile.
    ///
    /// Returns the number of tasks run. If a task panics the panic
    /// propagates, and the remaining tasks stay queued.
    pub fn drain(&self, limit: usize) -> usize {
        let Some(_draining) = FlagGuard::raise(&self.inner.draining) else {
            return 0;
        };

        let mut ran: usize = 0;
        loop {
            if limit != 0 && ran >= limit {
                let left = self.len();
                if left > 0 {
                    warn!(limit, left, "Drain limit reached, leaving tasks queued");
                }
                break;
            }
            let Some(task) = self.inner.tasks.borrow_mut().pop_front() else {
                break;
            };
            task();
            ran = ran.saturating_add(1);
        }

        if ran > 0 {
            trace!(ran, "Deferred tasks drained");
        }
        ran
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .field("draining", &self.is_draining())
            .finish()
    }
}
