//! Guards: decorators that decide, before ticking, whether the child runs.

use super::DecoratorBase;
use crate::context::TickContext;
use crate::error::Result;
use crate::node::{BoxedNode, Node, NodeFlags, Predicate};
use crate::status::NodeResult;

fn guard_base(child: BoxedNode) -> Result<DecoratorBase> {
    DecoratorBase::new(child, NodeFlags::GUARD)
}

/// Ticks the child only while `predicate` holds.
///
/// When the predicate fails the child is aborted (it may have been running
/// from an earlier tick) and the guard returns `Failed` without ticking it.
pub struct Precondition {
    base: DecoratorBase,
    predicate: Predicate,
}

impl Precondition {
    pub fn new<F>(child: BoxedNode, predicate: F) -> Result<Self>
    where
        F: FnMut(&TickContext) -> bool + Send + 'static,
    {
        Ok(Self {
            base: guard_base(child)?,
            predicate: Box::new(predicate),
        })
    }
}

impl Node for Precondition {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "Precondition"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        if (self.predicate)(ctx) {
            return self.base.tick_child(ctx);
        }
        self.base.abort_child(ctx);
        Ok(NodeResult::Failed)
    }
}

/// Plain gate: ticks the child only if `predicate` holds, otherwise returns
/// `Failed`. Unlike [`Precondition`] it never aborts the child.
pub struct ConditionGate {
    base: DecoratorBase,
    predicate: Predicate,
}

impl ConditionGate {
    pub fn new<F>(child: BoxedNode, predicate: F) -> Result<Self>
    where
        F: FnMut(&TickContext) -> bool + Send + 'static,
    {
        Ok(Self {
            base: guard_base(child)?,
            predicate: Box::new(predicate),
        })
    }
}

impl Node for ConditionGate {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "ConditionGate"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        if (self.predicate)(ctx) {
            self.base.tick_child(ctx)
        } else {
            Ok(NodeResult::Failed)
        }
    }
}

/// Ticks the child while `predicate` is false. Once it holds, aborts the
/// child and returns `outcome` without ticking.
fn short_circuit(
    base: &mut DecoratorBase,
    predicate: &mut Predicate,
    outcome: NodeResult,
    ctx: &TickContext,
) -> Result<NodeResult> {
    if predicate(ctx) {
        base.abort_child(ctx);
        Ok(outcome)
    } else {
        base.tick_child(ctx)
    }
}

/// Short-circuits to `Succeeded` once `predicate` holds.
pub struct SucceedIf {
    base: DecoratorBase,
    predicate: Predicate,
}

impl SucceedIf {
    pub fn new<F>(child: BoxedNode, predicate: F) -> Result<Self>
    where
        F: FnMut(&TickContext) -> bool + Send + 'static,
    {
        Ok(Self {
            base: guard_base(child)?,
            predicate: Box::new(predicate),
        })
    }
}

impl Node for SucceedIf {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "SucceedIf"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        short_circuit(&mut self.base, &mut self.predicate, NodeResult::Succeeded, ctx)
    }
}

/// Short-circuits to `Failed` once `predicate` holds.
pub struct FailIf {
    base: DecoratorBase,
    predicate: Predicate,
}

impl FailIf {
    pub fn new<F>(child: BoxedNode, predicate: F) -> Result<Self>
    where
        F: FnMut(&TickContext) -> bool + Send + 'static,
    {
        Ok(Self {
            base: guard_base(child)?,
            predicate: Box::new(predicate),
        })
    }
}

impl Node for FailIf {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "FailIf"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        short_circuit(&mut self.base, &mut self.predicate, NodeResult::Failed, ctx)
    }
}
