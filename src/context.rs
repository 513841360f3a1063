//! Per-call execution context threaded explicitly through a call graph.
//!
//! A [`Context`] is an immutable node in a parent-linked chain. Deriving a child
//! never mutates the parent, so one parent can be shared by any number of
//! concurrently running call chains, each deriving its own children.
//!
//! Each node carries at most one of:
//!
//! - a typed value (the generic attachment slot, keyed by `TypeId`)
//! - a cancellation scope
//!
//! Lookups walk from the innermost node outward, so the value attached last
//! shadows any value of the same type further up the chain.
//!
//! # Example
//!
//! ```rust
//! use stamped_errors::Context;
//!
//! #[derive(Debug, PartialEq)]
//! struct RequestId(u64);
//!
//! let root = Context::background();
//! let (ctx, cancel) = root.with_cancel();
//! let ctx = ctx.with_value(RequestId(7));
//!
//! assert_eq!(ctx.value::<RequestId>(), Some(&RequestId(7)));
//! assert!(root.value::<RequestId>().is_none());
//!
//! cancel.cancel();
//! assert!(ctx.is_cancelled());
//! assert!(!root.is_cancelled());
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Immutable per-call context.
///
/// Cloning is an `Arc` increment; clones refer to the same node and compare
/// equal under [`Context::ptr_eq`].
#[derive(Clone)]
pub struct Context {
    node: Arc<Node>,
}

struct Node {
    parent: Option<Context>,
    slot: Slot,
}

impl Drop for Node {
    fn drop(&mut self) {
        // Unlink iteratively; a recursive drop of a long chain overflows the stack.
        let mut next = self.parent.take();
        while let Some(ctx) = next {
            match Arc::try_unwrap(ctx.node) {
                Ok(mut node) => next = node.parent.take(),
                Err(_) => break,
            }
        }
    }
}

enum Slot {
    Root,
    Value {
        key: TypeId,
        value: Arc<dyn Any + Send + Sync>,
    },
    Cancel(Arc<CancelState>),
}

impl Context {
    /// Root context: no values, never cancelled.
    pub fn background() -> Self {
        Self {
            node: Arc::new(Node {
                parent: None,
                slot: Slot::Root,
            }),
        }
    }

    fn derive(&self, slot: Slot) -> Self {
        Self {
            node: Arc::new(Node {
                parent: Some(self.clone()),
                slot,
            }),
        }
    }

    /// Derive a child carrying `value` in the typed attachment slot.
    ///
    /// The parent is untouched; only the returned context (and its own
    /// descendants) observe the value.
    pub fn with_value<T>(&self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.derive(Slot::Value {
            key: TypeId::of::<T>(),
            value: Arc::new(value),
        })
    }

    /// Innermost value of type `T` attached along this chain.
    pub fn value<T>(&self) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        let key = TypeId::of::<T>();
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Slot::Value { key: k, value } = &ctx.node.slot {
                if *k == key {
                    return value.downcast_ref::<T>();
                }
            }
            current = ctx.node.parent.as_ref();
        }
        None
    }

    /// Derive a cancellable child.
    ///
    /// The child is cancelled when the returned handle is cancelled, or when
    /// the nearest cancellable ancestor is. Cancelling the child never affects
    /// the parent or siblings.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let state = Arc::new(CancelState::new());
        if let Some(parent) = self.cancel_state() {
            parent.adopt(&state);
        }
        let handle = CancelHandle {
            state: Arc::clone(&state),
        };
        (self.derive(Slot::Cancel(state)), handle)
    }

    fn cancel_state(&self) -> Option<&Arc<CancelState>> {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Slot::Cancel(state) = &ctx.node.slot {
                return Some(state);
            }
            current = ctx.node.parent.as_ref();
        }
        None
    }

    /// Whether this context (or a cancellable ancestor) has been cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_state().is_some_and(|s| s.is_cancelled())
    }

    /// Resolves once this context is cancelled.
    ///
    /// Never resolves for a context without a cancellable ancestor.
    #[cfg(feature = "tokio")]
    pub async fn cancelled(&self) {
        let Some(state) = self.cancel_state() else {
            std::future::pending::<()>().await;
            return;
        };
        loop {
            let notified = state.notify.notified();
            if state.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Whether two contexts are the same node.
    #[inline]
    pub fn ptr_eq(a: &Context, b: &Context) -> bool {
        Arc::ptr_eq(&a.node, &b.node)
    }

    /// Number of nodes between this context and its root (root is 0).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.node.parent.as_ref();
        while let Some(ctx) = current {
            depth += 1;
            current = ctx.node.parent.as_ref();
        }
        depth
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// ============================================================================
// Cancellation
// ============================================================================

struct CancelState {
    cancelled: AtomicBool,
    children: Mutex<Vec<Weak<CancelState>>>,
    #[cfg(feature = "tokio")]
    notify: tokio::sync::Notify,
}

impl CancelState {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            children: Mutex::new(Vec::new()),
            #[cfg(feature = "tokio")]
            notify: tokio::sync::Notify::new(),
        }
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    #[inline]
    fn lock_children(&self) -> MutexGuard<'_, Vec<Weak<CancelState>>> {
        match self.children.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn adopt(&self, child: &Arc<CancelState>) {
        let mut children = self.lock_children();
        // Checked under the lock so a concurrent cancel() cannot miss the child.
        if self.is_cancelled() {
            drop(children);
            child.cancel();
            return;
        }
        children.retain(|w| w.strong_count() > 0);
        children.push(Arc::downgrade(child));
    }

    fn cancel(&self) {
        let children = {
            let mut children = self.lock_children();
            if self.cancelled.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *children)
        };

        #[cfg(feature = "tokio")]
        self.notify.notify_waiters();

        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
///
/// Dropping the handle does not cancel.
#[derive(Clone)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    /// Cancel the scope and every cancellable scope derived from it.
    /// Idempotent.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Whether this scope has been cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct Tag(&'static str);

    #[test]
    fn background_is_empty_and_live() {
        let ctx = Context::background();
        assert_eq!(ctx.depth(), 0);
        assert!(!ctx.is_cancelled());
        assert!(ctx.value::<Tag>().is_none());
    }

    #[test]
    fn inner_value_shadows_outer() {
        let outer = Context::background().with_value(Tag("outer"));
        let inner = outer.with_value(Tag("inner"));

        assert_eq!(inner.value::<Tag>(), Some(&Tag("inner")));
        assert_eq!(outer.value::<Tag>(), Some(&Tag("outer")));
    }

    #[test]
    fn values_of_different_types_coexist() {
        let ctx = Context::background()
            .with_value(Tag("a"))
            .with_value(42u32);

        assert_eq!(ctx.value::<Tag>(), Some(&Tag("a")));
        assert_eq!(ctx.value::<u32>(), Some(&42));
        assert!(ctx.value::<u64>().is_none());
    }

    #[test]
    fn clone_shares_node() {
        let ctx = Context::background().with_value(Tag("x"));
        let copy = ctx.clone();
        assert!(Context::ptr_eq(&ctx, &copy));
        assert!(!Context::ptr_eq(&ctx, &Context::background()));
    }

    #[test]
    fn cancel_propagates_down_not_up() {
        let root = Context::background();
        let (parent, parent_cancel) = root.with_cancel();
        let (child, child_cancel) = parent.with_cancel();
        let (sibling, _sibling_cancel) = parent.with_cancel();

        child_cancel.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
        assert!(!sibling.is_cancelled());

        parent_cancel.cancel();
        assert!(parent.is_cancelled());
        assert!(sibling.is_cancelled());
        assert!(!root.is_cancelled());
    }

    #[test]
    fn child_of_cancelled_parent_starts_cancelled() {
        let (parent, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let (child, _) = parent.with_cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn values_below_cancel_scope_see_cancellation() {
        let (ctx, cancel) = Context::background().with_cancel();
        let ctx = ctx.with_value(Tag("below"));
        cancel.cancel();
        assert!(ctx.is_cancelled());
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent() {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        cancel.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn concurrent_derivation_from_shared_parent() {
        let parent = Context::background().with_value(Tag("shared"));
        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let parent = parent.clone();
                thread::spawn(move || {
                    let mut ctx = parent;
                    for j in 0..1000u32 {
                        ctx = ctx.with_value(i * 10_000 + j);
                    }
                    *ctx.value::<u32>().expect("value attached")
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let last = handle.join().expect("thread panicked");
            assert_eq!(last, i as u32 * 10_000 + 999);
        }
        assert!(parent.value::<u32>().is_none());
    }

    #[test]
    fn long_chain_drops_without_overflow() {
        let mut ctx = Context::background();
        for i in 0..200_000u32 {
            ctx = ctx.with_value(i);
        }
        assert_eq!(ctx.depth(), 200_000);
        drop(ctx);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn cancelled_future_resolves() {
        let (ctx, cancel) = Context::background().with_cancel();
        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.cancelled().await })
        };
        cancel.cancel();
        waiter.await.expect("task panicked");
        assert!(ctx.is_cancelled());
    }
}
