//! Decorator nodes.
//!
//! Decorators own exactly one child and modify its result, gate its
//! execution, shape its timing, loop it, or observe its lifecycle. Unless
//! stated otherwise a decorator forwards aborts to its child.
//!
//! - Result transformers: [`Inverter`], [`ForceSuccess`], [`ForceFailure`],
//!   [`RunningIsSuccess`], [`RunningIsFailure`]
//! - Guards: [`Precondition`], [`ConditionGate`], [`SucceedIf`], [`FailIf`]
//! - Timing: [`Throttle`], [`HardThrottle`], [`Cooldown`], [`Debounce`],
//!   [`Timeout`], [`Delay`]
//! - Loops: [`Repeat`], [`Retry`], [`UntilSuccess`], [`UntilFail`],
//!   [`KeepRunningUntilFailure`]
//! - Lifecycle: [`LifecycleHook`], [`NonAbortable`]

use crate::context::TickContext;
use crate::error::Result;
use crate::kernel;
use crate::node::{BoxedNode, Node, NodeCore, NodeFlags, adopt};
use crate::status::NodeResult;

/// Implements the parts of [`Node`] every decorator shares: bookkeeping in
/// `self.base`, the single child, tags proxied to the child and, unless
/// invoked as `decorator_node!(custom_abort)`, abort forwarding.
macro_rules! decorator_node {
    () => {
        decorator_node!(@delegate);

        fn on_abort(&mut self, ctx: &$crate::context::TickContext) {
            self.base.abort_child(ctx);
        }
    };
    (custom_abort) => {
        decorator_node!(@delegate);
    };
    (@delegate) => {
        fn core(&self) -> &$crate::node::NodeCore {
            &self.base.core
        }

        fn core_mut(&mut self) -> &mut $crate::node::NodeCore {
            &mut self.base.core
        }

        fn children(&self) -> &[$crate::node::BoxedNode] {
            std::slice::from_ref(&self.base.child)
        }

        fn tags(&self) -> &$crate::node::TagSet {
            self.base.child.tags()
        }

        fn tags_mut(&mut self) -> &mut $crate::node::TagSet {
            self.base.child.tags_mut()
        }
    };
}

pub mod guard;
pub mod lifecycle;
pub mod loops;
pub mod timing;
pub mod transform;

pub use guard::{ConditionGate, FailIf, Precondition, SucceedIf};
pub use lifecycle::{Hook, HookFn, LifecycleHook, NonAbortable};
pub use loops::{KeepRunningUntilFailure, Repeat, Retry, RetryUntilSuccessful, UntilFail, UntilSuccess};
pub use timing::{Cooldown, Debounce, Delay, HardThrottle, Throttle, Timeout};
pub use transform::{
    AlwaysFail, AlwaysSucceed, ForceFailure, ForceSuccess, Inverter, RunningIsFailure,
    RunningIsSuccess,
};

/// Shared state of a decorator: its own bookkeeping and its child.
///
/// Custom decorators embed this and drive the child through
/// [`DecoratorBase::tick_child`] / [`DecoratorBase::abort_child`].
pub struct DecoratorBase {
    pub(crate) core: NodeCore,
    pub(crate) child: BoxedNode,
}

impl DecoratorBase {
    /// Takes ownership of `child`. Fails if the child already has a parent.
    pub fn new(child: BoxedNode, flags: NodeFlags) -> Result<Self> {
        let core = NodeCore::new(NodeFlags::DECORATOR | flags);
        let child = adopt(core.id(), child)?;
        Ok(Self { core, child })
    }

    pub fn core(&self) -> &NodeCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    pub fn child(&self) -> &dyn Node {
        self.child.as_ref()
    }

    pub fn tick_child(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        kernel::tick(self.child.as_mut(), ctx)
    }

    /// Aborts the child; a no-op unless it is running.
    pub fn abort_child(&mut self, ctx: &TickContext) {
        kernel::abort(self.child.as_mut(), ctx);
    }

    pub fn child_running(&self) -> bool {
        self.child.was_running()
    }
}

/// Validates a loop count where `-1` means "forever".
pub(crate) fn loop_limit(decorator: &'static str, count: i64) -> Result<Option<u64>> {
    match count {
        -1 => Ok(None),
        n if n >= 1 => Ok(Some(n as u64)),
        n => Err(crate::error::TreeError::invalid_decoration(
            decorator,
            format!("count must be positive or -1, got {n}"),
        )),
    }
}
