//! Synchronous leaves.

use crate::context::TickContext;
use crate::error::{BoxError, Result, TreeError};
use crate::node::{Node, NodeCore, NodeFlags};
use crate::status::NodeResult;

type ActionFn =
    Box<dyn FnMut(&TickContext) -> std::result::Result<NodeResult, BoxError> + Send>;

/// Adapts a function of the tick context into a node.
///
/// The function may return any [`NodeResult`], including `Running`. An
/// action built with [`Action::fallible`] can also fail hard: its error
/// aborts the whole tick call as [`TreeError::Leaf`].
pub struct Action {
    core: NodeCore,
    run: ActionFn,
}

impl Action {
    pub fn new<F>(mut run: F) -> Self
    where
        F: FnMut(&TickContext) -> NodeResult + Send + 'static,
    {
        Self::fallible(move |ctx| Ok(run(ctx)))
    }

    pub fn fallible<F>(run: F) -> Self
    where
        F: FnMut(&TickContext) -> std::result::Result<NodeResult, BoxError> + Send + 'static,
    {
        Self {
            core: NodeCore::new(NodeFlags::LEAF),
            run: Box::new(run),
        }
    }
}

impl Node for Action {
    node_core!();

    fn default_name(&self) -> &'static str {
        "Action"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        (self.run)(ctx).map_err(|source| {
            tracing::debug!(node = %self.core.id(), error = %source, "action faulted");
            TreeError::Leaf {
                node: self.core.id(),
                source,
            }
        })
    }
}

/// Adapts a predicate into a node: `true` is `Succeeded`, `false` is
/// `Failed`. Never returns `Running`.
pub struct Condition {
    core: NodeCore,
    predicate: Box<dyn FnMut(&TickContext) -> bool + Send>,
}

impl Condition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: FnMut(&TickContext) -> bool + Send + 'static,
    {
        Self {
            core: NodeCore::new(NodeFlags::LEAF),
            predicate: Box::new(predicate),
        }
    }
}

impl Node for Condition {
    node_core!();

    fn default_name(&self) -> &'static str {
        "Condition"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        Ok(NodeResult::from((self.predicate)(ctx)))
    }
}

/// Leaf that always returns the same result.
pub struct Constant {
    core: NodeCore,
    result: NodeResult,
}

impl Constant {
    pub fn new(result: NodeResult) -> Self {
        Self {
            core: NodeCore::new(NodeFlags::LEAF),
            result,
        }
    }

    pub fn succeed() -> Self {
        Self::new(NodeResult::Succeeded)
    }

    pub fn fail() -> Self {
        Self::new(NodeResult::Failed)
    }

    pub fn running() -> Self {
        Self::new(NodeResult::Running)
    }
}

impl Node for Constant {
    node_core!();

    fn default_name(&self) -> &'static str {
        match self.result {
            NodeResult::Succeeded => "Succeed",
            NodeResult::Failed => "Fail",
            NodeResult::Running => "Running",
        }
    }

    fn on_tick(&mut self, _ctx: &TickContext) -> Result<NodeResult> {
        Ok(self.result)
    }
}
