//! Composite nodes.
//!
//! Composites own an ordered list of children and decide which of them to
//! tick and how to combine their results. Ticking a composite without
//! children is a configuration error. Aborting a composite aborts every
//! child that is currently running.
//!
//! - [`Sequence`] / [`Fallback`]: reactive AND / OR, restarting from the
//!   first child every tick
//! - [`MemorySequence`] / [`MemoryFallback`]: resume from the running child
//! - [`Parallel`]: ticks every child and aggregates through a
//!   [`ParallelPolicy`]
//! - [`UtilitySelector`] / [`UtilitySequence`]: order children by score
//!   every tick and preempt a running child that lost its rank

use crate::context::TickContext;
use crate::error::{Result, TreeError};
use crate::kernel;
use crate::node::{BoxedNode, Node, NodeCore, NodeFlags, adopt};
use crate::status::NodeResult;

/// Implements the parts of [`Node`] every composite shares: bookkeeping in
/// `self.base`, the children slice, and aborting running children.
macro_rules! composite_node {
    () => {
        fn core(&self) -> &$crate::node::NodeCore {
            &self.base.core
        }

        fn core_mut(&mut self) -> &mut $crate::node::NodeCore {
            &mut self.base.core
        }

        fn children(&self) -> &[$crate::node::BoxedNode] {
            &self.base.children
        }

        fn on_abort(&mut self, ctx: &$crate::context::TickContext) {
            self.base.abort_all(ctx);
        }
    };
}

pub mod parallel;
pub mod sequence;
pub mod utility;

pub use parallel::{Parallel, ParallelPolicy};
pub use sequence::{Fallback, MemoryFallback, MemorySequence, Selector, Sequence};
pub use utility::{ScoredOption, Scorer, UtilitySelector, UtilitySequence};

/// Shared state of a composite: its own bookkeeping and its children.
pub struct CompositeBase {
    pub(crate) core: NodeCore,
    pub(crate) children: Vec<BoxedNode>,
}

impl CompositeBase {
    /// Takes ownership of `children`. Fails if any child already has a
    /// parent.
    pub fn new(children: Vec<BoxedNode>, flags: NodeFlags) -> Result<Self> {
        let core = NodeCore::new(NodeFlags::COMPOSITE | flags);
        let id = core.id();
        let children = children
            .into_iter()
            .map(|child| adopt(id, child))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { core, children })
    }

    pub fn core(&self) -> &NodeCore {
        &self.core
    }

    pub fn push_child(&mut self, child: BoxedNode) -> Result<()> {
        let child = adopt(self.core.id(), child)?;
        self.children.push(child);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn tick_child(&mut self, index: usize, ctx: &TickContext) -> Result<NodeResult> {
        kernel::tick(self.children[index].as_mut(), ctx)
    }

    /// Aborts one child; a no-op unless it is running.
    pub fn abort_child(&mut self, index: usize, ctx: &TickContext) {
        kernel::abort(self.children[index].as_mut(), ctx);
    }

    /// Aborts every running child after `index`.
    pub fn abort_after(&mut self, index: usize, ctx: &TickContext) {
        for child in self.children.iter_mut().skip(index + 1) {
            kernel::abort(child.as_mut(), ctx);
        }
    }

    /// Aborts every running child.
    pub fn abort_all(&mut self, ctx: &TickContext) {
        for child in &mut self.children {
            kernel::abort(child.as_mut(), ctx);
        }
    }
}

/// Fails with [`TreeError::EmptyComposite`] if `node` has no children.
pub(crate) fn ensure_children(node: &dyn Node) -> Result<()> {
    if node.children().is_empty() {
        tracing::debug!(node = %node.id(), name = node.name(), "ticked empty composite");
        return Err(TreeError::EmptyComposite {
            node: node.id(),
            name: node.name().to_owned(),
        });
    }
    Ok(())
}
