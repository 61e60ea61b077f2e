//! Looping decorators.
//!
//! A loop iteration ends when the child reaches a terminal result; the
//! decorator then reports `Running` and the next tick starts a fresh run of
//! the child. The kernel has already reset the child at that point, so no
//! explicit abort is needed between iterations.

use serde_json::json;

use super::{DecoratorBase, loop_limit};
use crate::context::TickContext;
use crate::error::Result;
use crate::node::{BoxedNode, DisplayState, Node, NodeFlags};
use crate::status::NodeResult;

fn loop_base(child: BoxedNode) -> Result<DecoratorBase> {
    DecoratorBase::new(child, NodeFlags::STATEFUL | NodeFlags::REPEATING)
}

/// Repeats a succeeding child.
///
/// # Semantics
///
/// - Each `Succeeded` increments the count; the decorator returns `Running`
///   until the count reaches `times`, then `Succeeded`
/// - `times == -1` repeats forever
/// - `Failed` propagates immediately
/// - The count restarts whenever the decorator leaves `Running`
pub struct Repeat {
    base: DecoratorBase,
    limit: Option<u64>,
    count: u64,
}

impl Repeat {
    pub fn new(child: BoxedNode, times: i64) -> Result<Self> {
        Ok(Self {
            limit: loop_limit("Repeat", times)?,
            base: loop_base(child)?,
            count: 0,
        })
    }

    pub fn forever(child: BoxedNode) -> Result<Self> {
        Self::new(child, -1)
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Node for Repeat {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "Repeat"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        match self.base.tick_child(ctx)? {
            NodeResult::Succeeded => {
                self.count += 1;
                if self.limit.is_some_and(|limit| self.count >= limit) {
                    self.count = 0;
                    Ok(NodeResult::Succeeded)
                } else {
                    Ok(NodeResult::Running)
                }
            }
            NodeResult::Failed => {
                self.count = 0;
                Ok(NodeResult::Failed)
            }
            NodeResult::Running => Ok(NodeResult::Running),
        }
    }

    fn on_reset(&mut self, _ctx: &TickContext) {
        self.count = 0;
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("count", json!(self.count)),
            ("limit", json!(self.limit)),
        ]))
    }
}

/// Retries a failing child.
///
/// Mirror image of [`Repeat`]: each `Failed` increments the attempt count
/// and the decorator returns `Running` until `max_attempts` failures were
/// seen, then `Failed`. `Succeeded` propagates immediately; `-1` retries
/// forever.
pub struct Retry {
    base: DecoratorBase,
    limit: Option<u64>,
    failures: u64,
}

/// Alias matching the common "retry until successful" naming.
pub type RetryUntilSuccessful = Retry;

impl Retry {
    pub fn new(child: BoxedNode, max_attempts: i64) -> Result<Self> {
        Ok(Self {
            limit: loop_limit("Retry", max_attempts)?,
            base: loop_base(child)?,
            failures: 0,
        })
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl Node for Retry {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "Retry"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        match self.base.tick_child(ctx)? {
            NodeResult::Failed => {
                self.failures += 1;
                if self.limit.is_some_and(|limit| self.failures >= limit) {
                    self.failures = 0;
                    Ok(NodeResult::Failed)
                } else {
                    Ok(NodeResult::Running)
                }
            }
            NodeResult::Succeeded => {
                self.failures = 0;
                Ok(NodeResult::Succeeded)
            }
            NodeResult::Running => Ok(NodeResult::Running),
        }
    }

    fn on_reset(&mut self, _ctx: &TickContext) {
        self.failures = 0;
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("failures", json!(self.failures)),
            ("limit", json!(self.limit)),
        ]))
    }
}

/// Loops until the child succeeds; failures keep the loop going.
pub struct UntilSuccess {
    base: DecoratorBase,
}

impl UntilSuccess {
    pub fn new(child: BoxedNode) -> Result<Self> {
        Ok(Self {
            base: loop_base(child)?,
        })
    }
}

impl Node for UntilSuccess {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "UntilSuccess"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        Ok(match self.base.tick_child(ctx)? {
            NodeResult::Succeeded => NodeResult::Succeeded,
            NodeResult::Failed | NodeResult::Running => NodeResult::Running,
        })
    }
}

/// Loops until the child fails, then reports `Succeeded`.
pub struct UntilFail {
    base: DecoratorBase,
}

impl UntilFail {
    pub fn new(child: BoxedNode) -> Result<Self> {
        Ok(Self {
            base: loop_base(child)?,
        })
    }
}

impl Node for UntilFail {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "UntilFail"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        Ok(match self.base.tick_child(ctx)? {
            NodeResult::Failed => NodeResult::Succeeded,
            NodeResult::Succeeded | NodeResult::Running => NodeResult::Running,
        })
    }
}

/// Loops while the child succeeds and propagates its first failure.
pub struct KeepRunningUntilFailure {
    base: DecoratorBase,
}

impl KeepRunningUntilFailure {
    pub fn new(child: BoxedNode) -> Result<Self> {
        Ok(Self {
            base: loop_base(child)?,
        })
    }
}

impl Node for KeepRunningUntilFailure {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "KeepRunningUntilFailure"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        Ok(match self.base.tick_child(ctx)? {
            NodeResult::Failed => NodeResult::Failed,
            NodeResult::Succeeded | NodeResult::Running => NodeResult::Running,
        })
    }
}
