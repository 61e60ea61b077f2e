//! Concurrent composite.

use std::fmt;

use serde_json::json;

use super::{CompositeBase, ensure_children};
use crate::context::TickContext;
use crate::error::Result;
use crate::node::{BoxedNode, DisplayState, Node, NodeFlags};
use crate::status::NodeResult;

/// Aggregation function for [`ParallelPolicy::Custom`]: receives the number
/// of succeeded, failed and running children of the current tick.
pub type PolicyFn = Box<dyn Fn(usize, usize, usize) -> NodeResult + Send>;

/// How a [`Parallel`] turns its children's results into its own.
#[derive(Default)]
pub enum ParallelPolicy {
    /// Always `Succeeded`.
    #[default]
    Default,
    /// `Succeeded` once at least `k` children succeeded this tick, `Failed`
    /// once fewer than `k` can still succeed, `Running` otherwise.
    SuccessThreshold(usize),
    /// Always `Running`; the parallel never completes on its own.
    AlwaysRunning,
    Custom(PolicyFn),
}

impl ParallelPolicy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(usize, usize, usize) -> NodeResult + Send + 'static,
    {
        Self::Custom(Box::new(f))
    }

    pub fn evaluate(&self, succeeded: usize, failed: usize, running: usize) -> NodeResult {
        match self {
            Self::Default => NodeResult::Succeeded,
            Self::SuccessThreshold(k) => {
                if succeeded >= *k {
                    NodeResult::Succeeded
                } else if succeeded + running < *k {
                    NodeResult::Failed
                } else {
                    NodeResult::Running
                }
            }
            Self::AlwaysRunning => NodeResult::Running,
            Self::Custom(f) => f(succeeded, failed, running),
        }
    }
}

impl fmt::Debug for ParallelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::SuccessThreshold(k) => f.debug_tuple("SuccessThreshold").field(k).finish(),
            Self::AlwaysRunning => f.write_str("AlwaysRunning"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Counts {
    succeeded: usize,
    failed: usize,
    running: usize,
}

/// Ticks every child on every tick, in order, and aggregates the results
/// through its [`ParallelPolicy`].
///
/// Children that completed are ticked again on the next tick; the parallel
/// keeps no per-child memory. When the aggregate result is terminal, any
/// child still running is aborted.
pub struct Parallel {
    base: CompositeBase,
    policy: ParallelPolicy,
    last: Counts,
}

impl Parallel {
    pub fn new(children: Vec<BoxedNode>, policy: ParallelPolicy) -> Result<Self> {
        Ok(Self {
            base: CompositeBase::new(children, NodeFlags::empty())?,
            policy,
            last: Counts::default(),
        })
    }

    pub fn policy(&self) -> &ParallelPolicy {
        &self.policy
    }

    pub fn push_child(&mut self, child: BoxedNode) -> Result<()> {
        self.base.push_child(child)
    }
}

impl Node for Parallel {
    composite_node!();

    fn default_name(&self) -> &'static str {
        "Parallel"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        ensure_children(self)?;

        let mut counts = Counts::default();
        for index in 0..self.base.len() {
            match self.base.tick_child(index, ctx)? {
                NodeResult::Succeeded => counts.succeeded += 1,
                NodeResult::Failed => counts.failed += 1,
                NodeResult::Running => counts.running += 1,
            }
        }
        self.last = counts;

        let result = self
            .policy
            .evaluate(counts.succeeded, counts.failed, counts.running);
        if result.is_terminal() && counts.running > 0 {
            tracing::trace!(node = %self.id(), running = counts.running, "parallel settled, aborting runners");
            self.base.abort_all(ctx);
        }
        Ok(result)
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("policy", json!(format!("{:?}", self.policy))),
            ("succeeded", json!(self.last.succeeded)),
            ("failed", json!(self.last.failed)),
            ("running", json!(self.last.running)),
        ]))
    }
}
