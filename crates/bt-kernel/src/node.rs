//! Core node abstraction.
//!
//! This module defines the [`Node`] trait implemented by every behavior tree
//! node, together with the identity and bookkeeping state ([`NodeCore`]) the
//! kernel maintains for each of them. Nodes never tick themselves directly:
//! the kernel functions [`crate::tick`] and [`crate::abort`] drive the
//! lifecycle hooks declared here in a fixed order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use serde::Serialize;

use crate::ambient;
use crate::context::TickContext;
use crate::error::{Result, TreeError};
use crate::status::NodeResult;

/// Boxed, type-erased node. Composites and decorators own their children
/// through this type.
pub type BoxedNode = Box<dyn Node>;

/// Small serializable snapshot of a node's internal state, used for
/// debugging and trace events. Never read back by the kernel.
pub type DisplayState = BTreeMap<&'static str, serde_json::Value>;

/// Predicate evaluated against the current tick context.
pub type Predicate = Box<dyn FnMut(&TickContext) -> bool + Send>;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identifier, assigned monotonically on creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw identifier. Only useful for lookups and tests; ids handed
    /// out to nodes always come from the internal counter.
    pub const fn from_raw(raw: u64) -> Self {
        NodeId(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Role and capability markers of a node.
    ///
    /// Flags are informational: inspectors use them to group nodes, the
    /// kernel never branches on them.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u16 {
        const LEAF               = 1 << 0;
        const COMPOSITE          = 1 << 1;
        const DECORATOR          = 1 << 2;
        const GUARD              = 1 << 3;
        const STATEFUL           = 1 << 4;
        const REPEATING          = 1 << 5;
        const RESULT_TRANSFORMER = 1 << 6;
        const LIFECYCLE          = 1 << 7;
        const MEMORY             = 1 << 8;
        const UTILITY            = 1 << 9;
    }
}

/// Ordered, de-duplicated set of string tags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    /// Inserts a tag, keeping first-insertion order. Returns `false` if the
    /// tag was already present.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> Extend<S> for TagSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag);
        }
    }
}

/// Identity and lifecycle bookkeeping shared by every node.
///
/// The kernel owns `was_running`; node implementations must not touch it.
#[derive(Debug)]
pub struct NodeCore {
    id: NodeId,
    name: Option<String>,
    flags: NodeFlags,
    tags: TagSet,
    parent: Option<NodeId>,
    pub(crate) was_running: bool,
}

impl NodeCore {
    /// Creates bookkeeping for a new node with a fresh id.
    pub fn new(flags: NodeFlags) -> Self {
        Self {
            id: NodeId::next(),
            name: None,
            flags,
            tags: TagSet::default(),
            parent: None,
            was_running: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagSet {
        &mut self.tags
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn was_running(&self) -> bool {
        self.was_running
    }

    /// Records `parent` as this node's owner.
    ///
    /// A node belongs to at most one parent; a second attachment is a
    /// configuration error.
    pub fn attach(&mut self, parent: NodeId) -> Result<()> {
        if let Some(existing) = self.parent {
            tracing::debug!(
                node = %self.id,
                %existing,
                %parent,
                mutator = ?ambient::current_mutator(),
                "rejected second parent"
            );
            return Err(TreeError::AlreadyAttached {
                node: self.id,
                parent: existing,
                new_parent: parent,
            });
        }
        self.parent = Some(parent);
        Ok(())
    }
}

/// A behavior tree node.
///
/// Implementors provide [`Node::on_tick`] and whichever lifecycle hooks they
/// need; every hook defaults to a no-op. Hooks are invoked exclusively by
/// [`crate::tick`] and [`crate::abort`]:
///
/// 1. `on_enter` (first tick of a run) or `on_resume` (continuation)
/// 2. `on_tick`
/// 3. `on_reset` when the node leaves `Running`
/// 4. `on_ticked`, then the result-specific hooks
///
/// `on_abort` is only ever called by [`crate::abort`], and must tolerate
/// being called more than once.
pub trait Node: Send {
    fn core(&self) -> &NodeCore;

    fn core_mut(&mut self) -> &mut NodeCore;

    /// Name used when no custom name was given.
    fn default_name(&self) -> &'static str;

    /// The node's own logic for a single tick.
    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult>;

    fn on_enter(&mut self, _ctx: &TickContext) {}

    fn on_resume(&mut self, _ctx: &TickContext) {}

    /// Cleanup after leaving `Running`, by completion or by abort.
    fn on_reset(&mut self, _ctx: &TickContext) {}

    fn on_abort(&mut self, _ctx: &TickContext) {}

    fn on_ticked(&mut self, _result: NodeResult, _ctx: &TickContext) {}

    fn on_success(&mut self, _ctx: &TickContext) {}

    fn on_failed(&mut self, _ctx: &TickContext) {}

    fn on_finished(&mut self, _result: NodeResult, _ctx: &TickContext) {}

    fn on_running(&mut self, _ctx: &TickContext) {}

    fn on_success_or_running(&mut self, _ctx: &TickContext) {}

    fn on_failed_or_running(&mut self, _ctx: &TickContext) {}

    /// Owned children, in tick order.
    fn children(&self) -> &[BoxedNode] {
        &[]
    }

    fn display_state(&self) -> Option<DisplayState> {
        None
    }

    /// Tags of this node. Decorators forward to their child so tags always
    /// live on the innermost concrete node.
    fn tags(&self) -> &TagSet {
        self.core().tags()
    }

    fn tags_mut(&mut self) -> &mut TagSet {
        self.core_mut().tags_mut()
    }

    fn id(&self) -> NodeId {
        self.core().id()
    }

    /// Custom name if one was set, otherwise [`Node::default_name`].
    fn name(&self) -> &str {
        self.core().name().unwrap_or(self.default_name())
    }

    fn flags(&self) -> NodeFlags {
        self.core().flags()
    }

    fn was_running(&self) -> bool {
        self.core().was_running()
    }
}

/// Convenience methods available on every node, including trait objects.
pub trait NodeExt: Node {
    /// Adds tags in place. Identity-preserving: the node itself is mutated,
    /// nothing is wrapped.
    fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _mutation = ambient::mutating(self.id());
        self.tags_mut().extend(tags);
    }

    fn has_tag(&self, tag: &str) -> bool {
        self.tags().contains(tag)
    }

    /// Builder-style [`NodeExt::add_tags`].
    fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_tags(tags);
        self
    }

    /// Sets a custom display name.
    fn named(mut self, name: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().set_name(name);
        self
    }

    fn boxed(self) -> BoxedNode
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }

    /// Wraps the node in `decorations`; the first becomes the outermost
    /// decorator. See [`crate::decoration::decorate`].
    fn decorate(self, decorations: Vec<crate::decoration::Decoration>) -> Result<BoxedNode>
    where
        Self: Sized + 'static,
    {
        crate::decoration::decorate(self.boxed(), decorations)
    }
}

impl<N: Node + ?Sized> NodeExt for N {}

/// Takes ownership of `child` on behalf of the node identified by `parent`.
pub(crate) fn adopt(parent: NodeId, mut child: BoxedNode) -> Result<BoxedNode> {
    let _mutation = ambient::mutating(parent);
    child.core_mut().attach(parent)?;
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = NodeCore::new(NodeFlags::LEAF);
        let b = NodeCore::new(NodeFlags::LEAF);
        assert!(b.id() > a.id());
    }

    #[test]
    fn tags_are_ordered_and_deduplicated() {
        let mut tags = TagSet::default();
        tags.extend(["combat", "melee", "combat"]);
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["combat", "melee"]);
        assert!(tags.remove("combat"));
        assert!(!tags.contains("combat"));
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn second_attach_is_rejected() {
        let mut core = NodeCore::new(NodeFlags::LEAF);
        let first = NodeId::from_raw(1_000_001);
        let second = NodeId::from_raw(1_000_002);

        core.attach(first).unwrap();
        let err = core.attach(second).unwrap_err();
        assert!(matches!(
            err,
            TreeError::AlreadyAttached { parent, new_parent, .. }
                if parent == first && new_parent == second
        ));
        assert_eq!(core.parent(), Some(first));
    }
}
