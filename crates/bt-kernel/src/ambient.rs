//! Ambient execution context.
//!
//! The kernel pushes a frame for every [`crate::tick`] and [`crate::abort`]
//! call so that code nested inside a node (most notably [`crate::Ref`]
//! writes) can find the context and node currently executing without having
//! it threaded through every call.
//!
//! The stacks are thread-local. A tree must be ticked from one thread at a
//! time; two trees ticked concurrently on different threads each see their
//! own stack. Frames are popped by guards, so a panicking hook leaves the
//! stack exactly as it was found.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::context::TickContext;
use crate::node::NodeId;

/// The context and node of one active tick or abort call.
#[derive(Clone, Debug)]
pub struct Frame {
    pub ctx: TickContext,
    pub node: NodeId,
}

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
    static MUTATION_STACK: RefCell<Vec<NodeId>> = const { RefCell::new(Vec::new()) };
}

/// Pops the frame pushed by [`enter`] when dropped.
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub(crate) struct FrameGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            debug_assert_eq!(stack.len(), self.depth, "ambient stack out of balance");
            stack.truncate(self.depth - 1);
        });
    }
}

pub(crate) fn enter(ctx: &TickContext, node: NodeId) -> FrameGuard {
    let depth = CONTEXT_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.push(Frame {
            ctx: ctx.clone(),
            node,
        });
        stack.len()
    });
    FrameGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// Runs `f` with the innermost active frame, if any.
pub fn with_current<R>(f: impl FnOnce(Option<&Frame>) -> R) -> R {
    CONTEXT_STACK.with(|stack| f(stack.borrow().last()))
}

/// Returns a copy of the innermost active frame.
pub fn current() -> Option<Frame> {
    with_current(|frame| frame.cloned())
}

/// Number of nested tick/abort calls currently executing on this thread.
pub fn depth() -> usize {
    CONTEXT_STACK.with(|stack| stack.borrow().len())
}

/// Marks the node performing a structural mutation (attaching children,
/// editing tags) for diagnostics.
#[must_use = "the mutation marker is cleared as soon as the guard is dropped"]
pub(crate) struct MutationGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        MUTATION_STACK.with(|stack| stack.borrow_mut().truncate(self.depth - 1));
    }
}

pub(crate) fn mutating(node: NodeId) -> MutationGuard {
    let depth = MUTATION_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.push(node);
        stack.len()
    });
    MutationGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// Node currently performing a structural mutation, if any.
pub fn current_mutator() -> Option<NodeId> {
    MUTATION_STACK.with(|stack| stack.borrow().last().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_nest_and_unwind() {
        assert_eq!(depth(), 0);
        let outer = enter(&TickContext::new(1, 10), NodeId::from_raw(1));
        {
            let _inner = enter(&TickContext::new(1, 10), NodeId::from_raw(2));
            assert_eq!(depth(), 2);
            assert_eq!(current().map(|f| f.node), Some(NodeId::from_raw(2)));
        }
        assert_eq!(current().map(|f| f.node), Some(NodeId::from_raw(1)));
        drop(outer);
        assert!(current().is_none());
    }

    #[test]
    fn panic_inside_frame_restores_stack() {
        let caught = std::panic::catch_unwind(|| {
            let _frame = enter(&TickContext::new(3, 0), NodeId::from_raw(9));
            panic!("hook exploded");
        });
        assert!(caught.is_err());
        assert_eq!(depth(), 0);
    }

    #[test]
    fn mutator_is_scoped() {
        assert_eq!(current_mutator(), None);
        {
            let _guard = mutating(NodeId::from_raw(4));
            assert_eq!(current_mutator(), Some(NodeId::from_raw(4)));
        }
        assert_eq!(current_mutator(), None);
    }
}
