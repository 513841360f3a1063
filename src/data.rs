//! Debug data attached along a call chain.
//!
//! Every attachment creates a new immutable [`DataLayer`] whose parent is the
//! layer the context already carried. Layers are shared read-only between all
//! contexts derived from the same ancestor, so concurrent branches never see
//! each other's attachments and no lock is taken on either path.
//!
//! Resolution flattens the chain innermost-first: the first value seen for a
//! key wins, outer layers only fill in keys that are still missing.
//!
//! ```rust
//! use stamped_errors::{Context, error_data, resolve_data};
//!
//! let ctx = Context::background()
//!     .with_data(error_data! { "a" => 1 })
//!     .with_data(error_data! { "a" => 2, "b" => 3 });
//!
//! assert_eq!(resolve_data(Some(&ctx)), error_data! { "a" => 2, "b" => 3 });
//! ```

use crate::Context;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Flattened debug key/value data.
pub type ErrorData = BTreeMap<String, Value>;

/// One immutable attachment of debug data.
///
/// Its own keys shadow identically-named keys in every ancestor layer.
#[derive(Debug)]
pub struct DataLayer {
    data: ErrorData,
    parent: Option<Arc<DataLayer>>,
}

impl DataLayer {
    /// Data attached by this layer only.
    #[inline]
    pub fn own(&self) -> &ErrorData {
        &self.data
    }

    /// The layer this one was stacked on.
    #[inline]
    pub fn parent(&self) -> Option<&DataLayer> {
        self.parent.as_deref()
    }

    /// Number of layers from this one to the root, inclusive.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.parent.as_deref();
        while let Some(layer) = current {
            depth += 1;
            current = layer.parent.as_deref();
        }
        depth
    }

    /// Flatten this layer and its ancestors, child wins.
    pub fn resolve(&self) -> ErrorData {
        // Inlined walk: attachment chains are short in practice.
        let mut chain: SmallVec<[&DataLayer; 8]> = SmallVec::new();
        let mut current = Some(self);
        while let Some(layer) = current {
            chain.push(layer);
            current = layer.parent.as_deref();
        }

        let mut merged = ErrorData::new();
        for layer in chain {
            for (key, value) in &layer.data {
                if !merged.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        merged
    }
}

impl Drop for DataLayer {
    fn drop(&mut self) {
        // Unlink iteratively; a recursive drop of a long chain overflows the stack.
        let mut next = self.parent.take();
        while let Some(layer) = next {
            match Arc::try_unwrap(layer) {
                Ok(mut layer) => next = layer.parent.take(),
                Err(_) => break,
            }
        }
    }
}

/// Slot wrapper so the layer chain has its own `TypeId` in the context.
#[derive(Clone)]
struct LayerSlot(Arc<DataLayer>);

impl Context {
    /// Stack `data` on top of whatever debug data this context carries.
    ///
    /// Empty data returns a clone of `self` (same node, no new layer).
    pub fn with_data(&self, data: ErrorData) -> Context {
        if data.is_empty() {
            return self.clone();
        }
        let parent = self.data_layer().cloned();
        self.with_value(LayerSlot(Arc::new(DataLayer { data, parent })))
    }

    /// Innermost data layer, if any data was ever attached.
    #[inline]
    pub fn data_layer(&self) -> Option<&Arc<DataLayer>> {
        self.value::<LayerSlot>().map(|slot| &slot.0)
    }

    /// Flattened debug data; empty when none was attached.
    #[inline]
    pub fn data(&self) -> ErrorData {
        self.data_layer()
            .map(|layer| layer.resolve())
            .unwrap_or_default()
    }
}

/// Attach `data` to `ctx`.
///
/// - absent context: returns `None`
/// - empty data: returns the input context unchanged
/// - otherwise: a derived context with one more layer
pub fn attach_data(ctx: Option<&Context>, data: ErrorData) -> Option<Context> {
    ctx.map(|ctx| ctx.with_data(data))
}

/// Flattened view of all data attached along `ctx`'s chain.
///
/// The returned map is an owned copy; mutating it never touches stored layers.
pub fn resolve_data(ctx: Option<&Context>) -> ErrorData {
    ctx.map(Context::data).unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_data;
    use serde_json::json;
    use std::thread;

    #[test]
    fn absent_context_stays_absent() {
        assert!(attach_data(None, error_data! { "foo" => "bar" }).is_none());
        assert!(resolve_data(None).is_empty());
    }

    #[test]
    fn empty_data_returns_same_context() {
        let ctx = Context::background().with_data(error_data! { "foo" => "bar" });
        let same = attach_data(Some(&ctx), ErrorData::new()).expect("context present");
        assert!(Context::ptr_eq(&ctx, &same));
        assert_eq!(same.data_layer().map(|l| l.depth()), Some(1));
    }

    #[test]
    fn nothing_attached_resolves_empty() {
        let ctx = Context::background();
        assert!(ctx.data_layer().is_none());
        assert!(resolve_data(Some(&ctx)).is_empty());
    }

    #[test]
    fn appended_keys_merge() {
        let ctx = Context::background()
            .with_data(error_data! { "foo" => "bar" })
            .with_data(error_data! { "bar" => "baz" });

        assert_eq!(
            resolve_data(Some(&ctx)),
            error_data! { "foo" => "bar", "bar" => "baz" }
        );
    }

    #[test]
    fn inner_layer_wins_on_collision() {
        let ctx = Context::background()
            .with_data(error_data! { "a" => 1 })
            .with_data(error_data! { "a" => 2, "b" => 3 });

        assert_eq!(resolve_data(Some(&ctx)), error_data! { "a" => 2, "b" => 3 });
    }

    #[test]
    fn ancestors_are_not_mutated() {
        let parent = Context::background().with_data(error_data! { "k" => "parent" });
        let child = parent.with_data(error_data! { "k" => "child", "extra" => true });

        assert_eq!(parent.data(), error_data! { "k" => "parent" });
        assert_eq!(child.data(), error_data! { "k" => "child", "extra" => true });
        assert_eq!(child.data_layer().map(|l| l.depth()), Some(2));
    }

    #[test]
    fn resolved_map_is_independent_of_storage() {
        let ctx = Context::background().with_data(error_data! { "k" => "v" });

        let mut resolved = ctx.data();
        resolved.insert("k".into(), json!("tampered"));
        resolved.insert("new".into(), json!(1));

        assert_eq!(ctx.data(), error_data! { "k" => "v" });
    }

    #[test]
    fn data_survives_unrelated_values_in_between() {
        let ctx = Context::background()
            .with_data(error_data! { "a" => 1 })
            .with_value(7u8);
        let (ctx, _cancel) = ctx.with_cancel();
        let ctx = ctx.with_data(error_data! { "b" => 2 });

        assert_eq!(ctx.data(), error_data! { "a" => 1, "b" => 2 });
    }

    #[test]
    fn cancelled_context_still_accepts_data() {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let ctx = ctx.with_data(error_data! { "after" => "cancel" });
        assert_eq!(ctx.data(), error_data! { "after" => "cancel" });
    }

    #[test]
    fn concurrent_branches_never_leak() {
        let ctx = Context::background().with_data(error_data! { "test1" => "test1" });
        let (scope, cancel) = ctx.with_cancel();

        let spawn_branch = |name: &'static str| {
            let scope = scope.clone();
            thread::spawn(move || {
                let mut branch = scope.clone();
                let mut rounds = 0u32;
                while !scope.is_cancelled() || rounds < 100 {
                    branch = branch.with_data(ErrorData::new());
                    branch = branch.with_data(error_data! { "test1" => name });
                    assert_eq!(branch.data()["test1"], json!(name));
                    rounds += 1;
                    if rounds > 2_000 {
                        break;
                    }
                }
                branch
            })
        };

        let first = spawn_branch("branch1");
        let second = spawn_branch("branch2");
        thread::sleep(std::time::Duration::from_millis(20));
        cancel.cancel();

        let first = first.join().expect("branch panicked");
        let second = second.join().expect("branch panicked");

        let ctx = ctx.with_data(error_data! { "test1" => "ctx" });
        let first = first.with_data(error_data! { "test1" => "ctx1" });
        let second = second.with_data(error_data! { "test1" => "ctx2" });

        assert_eq!(ctx.data()["test1"], json!("ctx"));
        assert_eq!(first.data()["test1"], json!("ctx1"));
        assert_eq!(second.data()["test1"], json!("ctx2"));
    }
}
