//! Stream nodes and the pipeline operators.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::chain::{self, Chain};
use crate::error::StreamResult;
use crate::path::FieldPath;
use crate::queue::TaskQueue;
use crate::stage::Stage;

/// Identifier for a stream node, used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(Uuid);

impl StreamId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct Node {
    id: StreamId,
    stages: Vec<Stage>,
    chain: Option<Chain>,
    children: Vec<Stream>,
    shared: bool,
    buffered: Vec<Value>,
}

/// Handle to a stream node.
///
/// Operators append a stage and return the stream further stages should be
/// attached to: the same node while it is private, or a new child once it
/// has been [shared](Stream::share). Cloning a `Stream` yields another
/// handle to the same node.
///
/// Parents own their children; children never point back. A stage closure
/// that captures a handle to one of its own ancestors creates a reference
/// cycle and keeps the whole subtree alive.
#[derive(Clone)]
pub struct Stream {
    node: Rc<RefCell<Node>>,
    tasks: TaskQueue,
}

impl Stream {
    /// Create an empty, private stream that defers work onto `tasks`.
    #[must_use]
    pub fn new(tasks: TaskQueue) -> Self {
        Self {
            node: Rc::new(RefCell::new(Node {
                id: StreamId::new(),
                stages: Vec::new(),
                chain: None,
                children: Vec::new(),
                shared: false,
                buffered: Vec::new(),
            })),
            tasks,
        }
    }

    /// Keep only values for which `predicate` holds.
    pub fn filter<F>(&self, predicate: F) -> Stream
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.attach(Stage::filter(predicate))
    }

    /// Replace each value with `transform(value)`.
    pub fn map<F>(&self, transform: F) -> Stream
    where
        F: Fn(Value) -> Value + 'static,
    {
        self.attach(Stage::map(transform))
    }

    /// Run `effect` on each value, passing the value on unchanged.
    pub fn for_each<F>(&self, effect: F) -> Stream
    where
        F: Fn(&Value) + 'static,
    {
        self.attach(Stage::for_each(effect))
    }

    /// Fan out the array at `path` into one value per element.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidPath`](crate::StreamError::InvalidPath)
    /// if `path` does not parse. Nothing is attached in that case.
    pub fn unwind(&self, path: &str) -> StreamResult<Stream> {
        Ok(self.unwind_path(FieldPath::parse(path)?))
    }

    /// Fan out the array at an already parsed `path`.
    pub fn unwind_path(&self, path: FieldPath) -> Stream {
        self.attach(Stage::unwind(path))
    }

    /// Mark this stream as shared.
    ///
    /// From now on every attachment creates a new child of this node, and
    /// this node's own stages stay as they are. Calling it again has no
    /// further effect.
    pub fn share(&self) -> Stream {
        let mut node = self.node.borrow_mut();
        if !node.shared {
            node.shared = true;
            debug!(stream_id = %node.id, "Stream shared");
        }
        self.clone()
    }

    /// Append `stage` and return the stream to continue building on.
    ///
    /// On a private stream the stage is appended in place and `self` is
    /// returned. On a shared stream a new child holding only `stage` is
    /// created and returned.
    pub fn attach(&self, stage: Stage) -> Stream {
        let shared = self.node.borrow().shared;

        if !shared {
            {
                let mut node = self.node.borrow_mut();
                debug!(stream_id = %node.id, stage = stage.name(), "Stage attached");
                node.stages.push(stage);
            }
            self.rebuild();
            return self.clone();
        }

        let child = Stream::new(self.tasks.clone());
        {
            let mut child_node = child.node.borrow_mut();
            debug!(
                parent_id = %self.id(),
                stream_id = %child_node.id,
                stage = stage.name(),
                "Forked child stream"
            );
            child_node.stages.push(stage);
        }
        child.rebuild();
        self.node.borrow_mut().children.push(child.clone());
        // The parent's stages are untouched; the rebuild only refreshes its
        // fan-out and realizes the chain if the parent had none yet.
        self.rebuild();
        child
    }

    /// Push `value` through this stream.
    ///
    /// Before the stream has a chain the value is buffered. Each buffered
    /// value is replayed once, through its own deferred task, after the next
    /// attachment.
    pub fn deliver(&self, value: Value) {
        deliver_to(&self.node, value);
    }

    fn rebuild(&self) {
        let pending = {
            let mut node = self.node.borrow_mut();
            let terminal = chain::fan_out(node.children.clone());
            node.chain = Some(chain::compose(&node.stages, terminal));
            trace!(
                stream_id = %node.id,
                stages = node.stages.len(),
                children = node.children.len(),
                "Chain rebuilt"
            );
            std::mem::take(&mut node.buffered)
        };

        if pending.is_empty() {
            return;
        }

        debug!(
            stream_id = %self.id(),
            count = pending.len(),
            "Scheduling replay of buffered values"
        );
        // Tasks hold the node weakly: the queue must not keep it alive.
        let weak = Rc::downgrade(&self.node);
        for value in pending {
            let node = Weak::clone(&weak);
            self.tasks.defer(move || match node.upgrade() {
                Some(node) => deliver_to(&node, value),
                None => trace!("Stream dropped before replay"),
            });
        }
    }

    /// This node's identifier.
    #[must_use]
    pub fn id(&self) -> StreamId {
        self.node.borrow().id
    }

    /// Names of this node's own stages, in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<String> {
        self.node
            .borrow()
            .stages
            .iter()
            .map(|stage| stage.name().to_string())
            .collect()
    }

    /// Number of children forked from this node.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.node.borrow().children.len()
    }

    /// Number of values waiting for a pipeline.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.node.borrow().buffered.len()
    }

    /// Whether [`share`](Stream::share) has been called on this node.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.node.borrow().shared
    }

    /// Whether this node has a realized chain.
    #[must_use]
    pub fn has_chain(&self) -> bool {
        self.node.borrow().chain.is_some()
    }

    /// Whether two handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Stream) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

fn deliver_to(node: &Rc<RefCell<Node>>, value: Value) {
    let chain = node.borrow().chain.clone();
    match chain {
        Some(chain) => chain(value),
        None => {
            let mut node = node.borrow_mut();
            node.buffered.push(value);
            trace!(
                stream_id = %node.id,
                buffered = node.buffered.len(),
                "No pipeline yet, value buffered"
            );
        },
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.borrow();
        f.debug_struct("Stream")
            .field("id", &node.id)
            .field("stages", &node.stages)
            .field("children", &node.children)
            .field("shared", &node.shared)
            .field("buffered", &node.buffered.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fremit_test::Recorder;
    use std::cell::Cell;
    use serde_json::json;

    fn stream() -> (Stream, TaskQueue) {
        let tasks = TaskQueue::new();
        (Stream::new(tasks.clone()), tasks)
    }

    #[test]
    fn test_new_stream_is_empty_and_private() {
        let (s, _) = stream();
        assert!(s.stage_names().is_empty());
        assert!(!s.has_chain());
        assert!(!s.is_shared());
        assert_eq!(s.child_count(), 0);
    }

    #[test]
    fn test_private_attach_returns_same_node() {
        let (s, _) = stream();
        let next = s.filter(|_| true).map(|v| v);
        assert!(next.ptr_eq(&s));
        assert_eq!(s.stage_names(), vec!["filter", "map"]);
        assert!(s.has_chain());
    }

    #[test]
    fn test_share_is_idempotent_marker() {
        let (s, _) = stream();
        let shared = s.share().share();
        assert!(shared.ptr_eq(&s));
        assert!(s.is_shared());
        assert_eq!(s.child_count(), 0);
        assert!(s.stage_names().is_empty());
    }

    #[test]
    fn test_shared_attach_forks_child() {
        let (s, _) = stream();
        let base = s.map(|v| v).share();

        let child = base.filter(|_| true);
        let grandchild_host = child.for_each(|_| {});

        assert!(!child.ptr_eq(&s));
        assert!(grandchild_host.ptr_eq(&child));
        assert_eq!(s.stage_names(), vec!["map"]);
        assert_eq!(child.stage_names(), vec!["filter", "for_each"]);
        assert_eq!(s.child_count(), 1);
        assert!(!child.is_shared());
    }

    #[test]
    fn test_deliver_without_chain_buffers() {
        let (s, tasks) = stream();
        s.deliver(json!(1));
        s.deliver(json!(2));
        assert_eq!(s.buffered_len(), 2);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_buffered_values_replay_once_after_attach() {
        let (s, tasks) = stream();
        s.deliver(json!(1));
        s.deliver(json!(2));

        let out = Recorder::new();
        s.for_each(out.sink());

        assert!(out.is_empty(), "replay must not run inline with attach");
        assert_eq!(s.buffered_len(), 0);
        assert_eq!(tasks.len(), 2);

        tasks.drain(0);
        assert_eq!(out.values(), vec![json!(1), json!(2)]);

        s.for_each(|_| {});
        tasks.drain(0);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_replay_uses_chain_current_at_replay_time() {
        let (s, tasks) = stream();
        s.deliver(json!(5));

        let out = Recorder::new();
        s.for_each(out.sink());
        s.map(|v| json!(v.as_i64().unwrap_or(0).saturating_mul(2)));
        let doubled = Recorder::new();
        s.for_each(doubled.sink());

        tasks.drain(0);

        assert_eq!(out.values(), vec![json!(5)]);
        assert_eq!(doubled.values(), vec![json!(10)]);
    }

    #[test]
    fn test_shared_root_without_stages_forwards_to_children() {
        let (s, tasks) = stream();
        s.deliver(json!("early"));

        let left = Recorder::new();
        let right = Recorder::new();
        let root = s.share();
        root.for_each(left.sink());
        root.for_each(right.sink());

        tasks.drain(0);
        root.deliver(json!("late"));

        assert_eq!(left.values(), vec![json!("early"), json!("late")]);
        assert_eq!(right.values(), vec![json!("early"), json!("late")]);
    }

    #[test]
    fn test_filter_rejection_stops_fan_out() {
        let (s, _) = stream();
        let shared = s.filter(|v| v != &json!("drop")).share();
        let out = Recorder::new();
        shared.for_each(out.sink());

        s.deliver(json!("drop"));
        s.deliver(json!("keep"));

        assert_eq!(out.values(), vec![json!("keep")]);
    }

    #[test]
    fn test_attach_does_not_rerun_delivered_values() {
        let (s, tasks) = stream();
        let first = Recorder::new();
        s.for_each(first.sink());
        s.deliver(json!(1));

        let second = Recorder::new();
        s.for_each(second.sink());
        tasks.drain(0);

        assert_eq!(first.values(), vec![json!(1)]);
        assert!(second.is_empty());

        s.deliver(json!(2));
        assert_eq!(first.values(), vec![json!(1), json!(2)]);
        assert_eq!(second.values(), vec![json!(2)]);
    }

    #[test]
    fn test_unwind_rejects_bad_path_without_attaching() {
        let (s, _) = stream();
        assert!(s.unwind("a..b").is_err());
        assert!(s.stage_names().is_empty());
    }

    #[test]
    fn test_stage_may_attach_during_delivery() {
        let (s, _) = stream();
        let shared = s.share();
        let out = Recorder::new();
        let host = shared.clone();
        let sink = out.sink();
        shared.for_each(move |_| {
            if host.child_count() == 1 {
                host.for_each(sink.clone());
            }
        });

        s.deliver(json!(1));
        assert_eq!(s.child_count(), 2);
        assert!(out.is_empty());

        s.deliver(json!(2));
        assert_eq!(out.values(), vec![json!(2)]);
    }

    #[test]
    fn test_debug_lists_stages() {
        let (s, _) = stream();
        s.filter(|_| true);
        let rendered = format!("{s:?}");
        assert!(rendered.contains("filter"));
        assert!(rendered.contains("shared: false"));
    }

    #[test]
    fn test_panicking_replay_keeps_later_values() {
        use std::panic::{AssertUnwindSafe, catch_unwind};

        let (s, tasks) = stream();
        for n in 0..3 {
            s.deliver(json!(n));
        }

        let out = Recorder::new();
        s.for_each(|v| assert_ne!(v, &json!(0), "stage rejected value"))
            .for_each(out.sink());

        let result = catch_unwind(AssertUnwindSafe(|| tasks.drain(0)));
        assert!(result.is_err());
        assert!(!tasks.is_draining());
        assert_eq!(tasks.len(), 2);

        tasks.drain(0);
        assert_eq!(out.values(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_pending_replay_does_not_keep_stream_alive() {
        struct DropNotify(Rc<Cell<usize>>);
        impl Drop for DropNotify {
            fn drop(&mut self) {
                self.0.set(self.0.get().saturating_add(1));
            }
        }

        let drops = Rc::new(Cell::new(0));
        let notifier = DropNotify(Rc::clone(&drops));
        let (s, tasks) = stream();
        s.deliver(json!(1));
        s.for_each(move |_| {
            let _ = &notifier;
        });
        assert_eq!(tasks.len(), 1);

        drop(s);
        assert_eq!(drops.get(), 1);

        assert_eq!(tasks.drain(0), 1);
    }
}
