//! Ordered composites: sequence and fallback, reactive and with memory.

use serde_json::json;

use super::{CompositeBase, ensure_children};
use crate::context::TickContext;
use crate::error::Result;
use crate::node::{BoxedNode, DisplayState, Node, NodeFlags};
use crate::status::NodeResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Sequence,
    Fallback,
}

impl Flow {
    /// Child result that lets the walk move on to the next child.
    fn continues_on(self) -> NodeResult {
        match self {
            Flow::Sequence => NodeResult::Succeeded,
            Flow::Fallback => NodeResult::Failed,
        }
    }
}

/// Ticks children left to right from `start` until one returns something
/// other than the flow's "continue" result. Children after the stopping
/// child are aborted. Returns the result and the stopping index.
fn walk(
    base: &mut CompositeBase,
    flow: Flow,
    start: usize,
    ctx: &TickContext,
) -> Result<(NodeResult, Option<usize>)> {
    for index in start..base.children.len() {
        let result = base.tick_child(index, ctx)?;
        if result != flow.continues_on() {
            base.abort_after(index, ctx);
            return Ok((result, Some(index)));
        }
    }
    Ok((flow.continues_on(), None))
}

/// Executes children in order until one does not succeed.
///
/// # Semantics
///
/// A `Sequence` starts from its first child on **every** tick:
/// - If a child returns `Failed` or `Running`, the sequence stops, aborts
///   any running child after it, and returns that result
/// - If a child returns `Succeeded`, the sequence continues to the next child
/// - If all children succeed, the sequence returns `Succeeded`
///
/// This is analogous to a short-circuited logical AND (&&) operation.
pub struct Sequence {
    base: CompositeBase,
}

impl Sequence {
    /// Creates a new sequence with the given children.
    pub fn new(children: Vec<BoxedNode>) -> Result<Self> {
        Ok(Self {
            base: CompositeBase::new(children, NodeFlags::empty())?,
        })
    }

    pub fn push_child(&mut self, child: BoxedNode) -> Result<()> {
        self.base.push_child(child)
    }
}

impl Node for Sequence {
    composite_node!();

    fn default_name(&self) -> &'static str {
        "Sequence"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        ensure_children(self)?;
        Ok(walk(&mut self.base, Flow::Sequence, 0, ctx)?.0)
    }
}

/// Executes children in order until one does not fail.
///
/// # Semantics
///
/// Mirror image of [`Sequence`]:
/// - If a child returns `Succeeded` or `Running`, the fallback stops,
///   aborts any running child after it, and returns that result
/// - If a child returns `Failed`, the fallback tries the next child
/// - If all children fail, the fallback returns `Failed`
///
/// This is analogous to a short-circuited logical OR (||) operation.
pub struct Fallback {
    base: CompositeBase,
}

/// Traditional name for [`Fallback`].
pub type Selector = Fallback;

impl Fallback {
    /// Creates a new fallback with the given children.
    pub fn new(children: Vec<BoxedNode>) -> Result<Self> {
        Ok(Self {
            base: CompositeBase::new(children, NodeFlags::empty())?,
        })
    }

    pub fn push_child(&mut self, child: BoxedNode) -> Result<()> {
        self.base.push_child(child)
    }
}

impl Node for Fallback {
    composite_node!();

    fn default_name(&self) -> &'static str {
        "Fallback"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        ensure_children(self)?;
        Ok(walk(&mut self.base, Flow::Fallback, 0, ctx)?.0)
    }
}

/// Ordered walk that remembers the running child across ticks.
struct MemoryWalk {
    base: CompositeBase,
    flow: Flow,
    running_index: Option<usize>,
}

impl MemoryWalk {
    fn new(children: Vec<BoxedNode>, flow: Flow) -> Result<Self> {
        Ok(Self {
            base: CompositeBase::new(children, NodeFlags::STATEFUL | NodeFlags::MEMORY)?,
            flow,
            running_index: None,
        })
    }

    fn tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        let start = self.running_index.unwrap_or(0);
        let (result, stopped_at) = walk(&mut self.base, self.flow, start, ctx)?;
        self.running_index = if result.is_running() { stopped_at } else { None };
        Ok(result)
    }

    fn display_state(&self) -> DisplayState {
        DisplayState::from([("running_index", json!(self.running_index))])
    }
}

/// [`Sequence`] that resumes from the child that was running instead of
/// restarting at the first child.
///
/// Children before the running one are not re-evaluated while the run is
/// in progress, trading reactivity for not repeating expensive work. The
/// remembered index is cleared on completion and on abort.
pub struct MemorySequence {
    inner: MemoryWalk,
}

impl MemorySequence {
    pub fn new(children: Vec<BoxedNode>) -> Result<Self> {
        Ok(Self {
            inner: MemoryWalk::new(children, Flow::Sequence)?,
        })
    }

    pub fn running_index(&self) -> Option<usize> {
        self.inner.running_index
    }
}

/// [`Fallback`] that resumes from the child that was running.
pub struct MemoryFallback {
    inner: MemoryWalk,
}

impl MemoryFallback {
    pub fn new(children: Vec<BoxedNode>) -> Result<Self> {
        Ok(Self {
            inner: MemoryWalk::new(children, Flow::Fallback)?,
        })
    }

    pub fn running_index(&self) -> Option<usize> {
        self.inner.running_index
    }
}

macro_rules! memory_node {
    ($name:ident) => {
        impl Node for $name {
            fn core(&self) -> &$crate::node::NodeCore {
                &self.inner.base.core
            }

            fn core_mut(&mut self) -> &mut $crate::node::NodeCore {
                &mut self.inner.base.core
            }

            fn children(&self) -> &[BoxedNode] {
                &self.inner.base.children
            }

            fn default_name(&self) -> &'static str {
                stringify!($name)
            }

            fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
                ensure_children(self)?;
                self.inner.tick(ctx)
            }

            fn on_abort(&mut self, ctx: &TickContext) {
                self.inner.base.abort_all(ctx);
            }

            fn on_reset(&mut self, _ctx: &TickContext) {
                self.inner.running_index = None;
            }

            fn display_state(&self) -> Option<DisplayState> {
                Some(self.inner.display_state())
            }
        }
    };
}

memory_node!(MemorySequence);
memory_node!(MemoryFallback);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::test_support::{at, switches};
    use crate::error::TreeError;
    use crate::{abort, tick};

    use NodeResult::{Failed, Running, Succeeded};

    #[test]
    fn sequence_stops_on_failure() {
        let (children, handles) = switches(&[Succeeded, Failed, Succeeded]);
        let mut seq = Sequence::new(children).unwrap();

        assert_eq!(tick(&mut seq, &at(1)).unwrap(), Failed);
        assert_eq!(handles[0].ticks(), 1);
        assert_eq!(handles[1].ticks(), 1);
        assert_eq!(handles[2].ticks(), 0);
        assert_eq!(handles[2].aborts(), 0);
    }

    #[test]
    fn sequence_is_reactive() {
        let (children, handles) = switches(&[Succeeded, Running]);
        let mut seq = Sequence::new(children).unwrap();

        assert_eq!(tick(&mut seq, &at(1)).unwrap(), Running);
        assert_eq!(tick(&mut seq, &at(2)).unwrap(), Running);
        assert_eq!(handles[0].ticks(), 2);

        // The first child failing now aborts the running second one.
        handles[0].set(Failed);
        assert_eq!(tick(&mut seq, &at(3)).unwrap(), Failed);
        assert_eq!(handles[1].aborts(), 1);
    }

    #[test]
    fn fallback_aborts_lower_priority_runner() {
        let (children, handles) = switches(&[Failed, Running]);
        let mut fallback = Fallback::new(children).unwrap();

        assert_eq!(tick(&mut fallback, &at(1)).unwrap(), Running);
        handles[0].set(Succeeded);
        assert_eq!(tick(&mut fallback, &at(2)).unwrap(), Succeeded);
        assert_eq!(handles[1].aborts(), 1);
        assert_eq!(handles[1].ticks(), 1);

        assert_eq!(tick(&mut fallback, &at(3)).unwrap(), Succeeded);
        assert_eq!(handles[1].aborts(), 1);
    }

    #[test]
    fn fallback_fails_when_all_fail() {
        let (children, _) = switches(&[Failed, Failed]);
        let mut fallback = Selector::new(children).unwrap();
        assert_eq!(tick(&mut fallback, &at(1)).unwrap(), Failed);
    }

    #[test]
    fn empty_composite_fails_on_tick() {
        let mut seq = Sequence::new(Vec::new()).unwrap();
        let err = tick(&mut seq, &at(1)).unwrap_err();
        assert!(matches!(err, TreeError::EmptyComposite { ref name, .. } if name == "Sequence"));
    }

    #[test]
    fn memory_sequence_skips_completed_children() {
        let (children, handles) = switches(&[Succeeded, Running, Succeeded]);
        let mut seq = MemorySequence::new(children).unwrap();

        assert_eq!(tick(&mut seq, &at(1)).unwrap(), Running);
        assert_eq!(seq.running_index(), Some(1));

        handles[0].set(Failed);
        assert_eq!(tick(&mut seq, &at(2)).unwrap(), Running);
        assert_eq!(handles[0].ticks(), 1);

        handles[1].set(Succeeded);
        assert_eq!(tick(&mut seq, &at(3)).unwrap(), Succeeded);
        assert_eq!(seq.running_index(), None);
        assert_eq!(handles[2].ticks(), 1);

        // Completed: the next run starts from the first child again.
        assert_eq!(tick(&mut seq, &at(4)).unwrap(), Failed);
        assert_eq!(handles[0].ticks(), 2);
    }

    #[test]
    fn memory_fallback_resumes_and_abort_clears_index() {
        let (children, handles) = switches(&[Failed, Running]);
        let mut fallback = MemoryFallback::new(children).unwrap();

        assert_eq!(tick(&mut fallback, &at(1)).unwrap(), Running);
        assert_eq!(fallback.running_index(), Some(1));
        assert_eq!(tick(&mut fallback, &at(2)).unwrap(), Running);
        assert_eq!(handles[0].ticks(), 1);

        abort(&mut fallback, &at(3));
        assert_eq!(fallback.running_index(), None);
        assert_eq!(handles[1].aborts(), 1);

        assert_eq!(tick(&mut fallback, &at(4)).unwrap(), Running);
        assert_eq!(handles[0].ticks(), 2);
    }
}
