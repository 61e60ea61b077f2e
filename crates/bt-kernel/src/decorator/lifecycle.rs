//! Lifecycle adapters and abort shielding.

use super::DecoratorBase;
use crate::context::TickContext;
use crate::error::Result;
use crate::node::{BoxedNode, Node, NodeFlags};
use crate::status::NodeResult;

/// Kernel hook a [`LifecycleHook`] decorator listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
pub enum Hook {
    OnEnter,
    OnResume,
    OnReset,
    OnAbort,
    OnTicked,
    OnSuccess,
    OnFailure,
    OnRunning,
    OnSuccessOrRunning,
    OnFailedOrRunning,
    OnFinished,
}

/// Callback run by a [`LifecycleHook`]. Result-carrying hooks (`OnTicked`,
/// `OnFinished`) pass the result; the others pass `None`.
pub type HookFn = Box<dyn FnMut(&TickContext, Option<NodeResult>) + Send>;

/// Forwards ticking to its child unchanged and runs a callback from one
/// kernel hook. Attaches side effects without writing a bespoke node.
pub struct LifecycleHook {
    base: DecoratorBase,
    hook: Hook,
    callback: HookFn,
}

impl LifecycleHook {
    pub fn new<F>(child: BoxedNode, hook: Hook, callback: F) -> Result<Self>
    where
        F: FnMut(&TickContext, Option<NodeResult>) + Send + 'static,
    {
        Ok(Self {
            base: DecoratorBase::new(child, NodeFlags::LIFECYCLE)?,
            hook,
            callback: Box::new(callback),
        })
    }

    pub fn hook(&self) -> Hook {
        self.hook
    }

    fn fire(&mut self, hook: Hook, ctx: &TickContext, result: Option<NodeResult>) {
        if self.hook == hook {
            (self.callback)(ctx, result);
        }
    }
}

impl Node for LifecycleHook {
    decorator_node!(custom_abort);

    fn default_name(&self) -> &'static str {
        self.hook.into()
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        self.base.tick_child(ctx)
    }

    fn on_enter(&mut self, ctx: &TickContext) {
        self.fire(Hook::OnEnter, ctx, None);
    }

    fn on_resume(&mut self, ctx: &TickContext) {
        self.fire(Hook::OnResume, ctx, None);
    }

    fn on_reset(&mut self, ctx: &TickContext) {
        self.fire(Hook::OnReset, ctx, None);
    }

    fn on_abort(&mut self, ctx: &TickContext) {
        self.fire(Hook::OnAbort, ctx, None);
        self.base.abort_child(ctx);
    }

    fn on_ticked(&mut self, result: NodeResult, ctx: &TickContext) {
        self.fire(Hook::OnTicked, ctx, Some(result));
    }

    fn on_success(&mut self, ctx: &TickContext) {
        self.fire(Hook::OnSuccess, ctx, None);
    }

    fn on_failed(&mut self, ctx: &TickContext) {
        self.fire(Hook::OnFailure, ctx, None);
    }

    fn on_finished(&mut self, result: NodeResult, ctx: &TickContext) {
        self.fire(Hook::OnFinished, ctx, Some(result));
    }

    fn on_running(&mut self, ctx: &TickContext) {
        self.fire(Hook::OnRunning, ctx, None);
    }

    fn on_success_or_running(&mut self, ctx: &TickContext) {
        self.fire(Hook::OnSuccessOrRunning, ctx, None);
    }

    fn on_failed_or_running(&mut self, ctx: &TickContext) {
        self.fire(Hook::OnFailedOrRunning, ctx, None);
    }
}

/// Shields its subtree from external aborts.
///
/// Ticking is forwarded unchanged, but aborts stop here: an interrupted
/// child keeps its running state and simply resumes on the next tick.
pub struct NonAbortable {
    base: DecoratorBase,
}

impl NonAbortable {
    pub fn new(child: BoxedNode) -> Result<Self> {
        Ok(Self {
            base: DecoratorBase::new(child, NodeFlags::empty())?,
        })
    }
}

impl Node for NonAbortable {
    decorator_node!(custom_abort);

    fn default_name(&self) -> &'static str {
        "NonAbortable"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        self.base.tick_child(ctx)
    }

    fn on_abort(&mut self, _ctx: &TickContext) {}
}
