//! Timing decorators.
//!
//! All timestamps come from [`TickContext::now`]; no decorator reads a wall
//! clock. Zero is a valid timestamp, so "unset" is always `None`.

use serde_json::json;

use super::DecoratorBase;
use crate::context::TickContext;
use crate::error::{Result, TreeError};
use crate::node::{BoxedNode, DisplayState, Node, NodeFlags};
use crate::status::NodeResult;

fn elapsed_since(since: u64, ctx: &TickContext) -> u64 {
    ctx.now.saturating_sub(since)
}

/// Rejects zero-length windows for decorators where they would be a no-op.
fn nonzero(decorator: &'static str, window: u64) -> Result<u64> {
    if window == 0 {
        return Err(TreeError::invalid_decoration(
            decorator,
            "window must be greater than zero",
        ));
    }
    Ok(window)
}

/// Limits how often the child may start.
///
/// # Semantics
///
/// - The first tick always reaches the child
/// - After the child completes (any terminal result), ticks within `window`
///   return `Failed` without ticking it
/// - While the child is running, ticks always reach it so its run is never
///   interrupted
pub struct Throttle {
    base: DecoratorBase,
    window: u64,
    last_completed: Option<u64>,
}

impl Throttle {
    pub fn new(child: BoxedNode, window: u64) -> Result<Self> {
        let window = nonzero("Throttle", window)?;
        Ok(Self {
            base: DecoratorBase::new(child, NodeFlags::STATEFUL)?,
            window,
            last_completed: None,
        })
    }
}

impl Node for Throttle {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "Throttle"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        if !self.base.child_running()
            && let Some(last) = self.last_completed
            && elapsed_since(last, ctx) < self.window
        {
            return Ok(NodeResult::Failed);
        }

        let result = self.base.tick_child(ctx)?;
        if result.is_terminal() {
            self.last_completed = Some(ctx.now);
        }
        Ok(result)
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("window", json!(self.window)),
            ("last_completed", json!(self.last_completed)),
        ]))
    }
}

/// Strict rate limit on ticks reaching the child.
///
/// A tick is admitted at most once per `window`, measured from the previous
/// admitted tick. A throttled tick returns `Failed`; if the child was
/// running it is aborted, since it would otherwise be left `Running` without
/// receiving ticks.
pub struct HardThrottle {
    base: DecoratorBase,
    window: u64,
    last_admitted: Option<u64>,
}

impl HardThrottle {
    pub fn new(child: BoxedNode, window: u64) -> Result<Self> {
        let window = nonzero("HardThrottle", window)?;
        Ok(Self {
            base: DecoratorBase::new(child, NodeFlags::STATEFUL)?,
            window,
            last_admitted: None,
        })
    }
}

impl Node for HardThrottle {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "HardThrottle"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        if let Some(last) = self.last_admitted
            && elapsed_since(last, ctx) < self.window
        {
            if self.base.child_running() {
                tracing::debug!(
                    node = %self.base.core.id(),
                    child = %self.base.child.id(),
                    "hard throttle aborted starved child"
                );
                self.base.abort_child(ctx);
            }
            return Ok(NodeResult::Failed);
        }

        self.last_admitted = Some(ctx.now);
        self.base.tick_child(ctx)
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("window", json!(self.window)),
            ("last_admitted", json!(self.last_admitted)),
        ]))
    }
}

/// After the child completes, refuses to tick it for `duration`.
///
/// The cooldown only starts on a terminal result; a running child keeps
/// being ticked.
pub struct Cooldown {
    base: DecoratorBase,
    duration: u64,
    finished_at: Option<u64>,
}

impl Cooldown {
    pub fn new(child: BoxedNode, duration: u64) -> Result<Self> {
        let duration = nonzero("Cooldown", duration)?;
        Ok(Self {
            base: DecoratorBase::new(child, NodeFlags::STATEFUL)?,
            duration,
            finished_at: None,
        })
    }
}

impl Node for Cooldown {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "Cooldown"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        if let Some(finished_at) = self.finished_at
            && elapsed_since(finished_at, ctx) < self.duration
        {
            return Ok(NodeResult::Failed);
        }

        let result = self.base.tick_child(ctx)?;
        if result.is_terminal() {
            self.finished_at = Some(ctx.now);
        }
        Ok(result)
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("duration", json!(self.duration)),
            ("finished_at", json!(self.finished_at)),
        ]))
    }
}

/// Reports `Succeeded` only once the child has succeeded continuously for
/// `duration`.
///
/// While successes accumulate the decorator returns `Failed`. A `Failed` or
/// `Running` child result restarts the window and is passed through.
pub struct Debounce {
    base: DecoratorBase,
    duration: u64,
    stable_since: Option<u64>,
}

impl Debounce {
    pub fn new(child: BoxedNode, duration: u64) -> Result<Self> {
        Ok(Self {
            base: DecoratorBase::new(child, NodeFlags::STATEFUL)?,
            duration,
            stable_since: None,
        })
    }
}

impl Node for Debounce {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "Debounce"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        match self.base.tick_child(ctx)? {
            NodeResult::Succeeded => {
                let since = *self.stable_since.get_or_insert(ctx.now);
                if elapsed_since(since, ctx) >= self.duration {
                    Ok(NodeResult::Succeeded)
                } else {
                    Ok(NodeResult::Failed)
                }
            }
            other => {
                self.stable_since = None;
                Ok(other)
            }
        }
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("duration", json!(self.duration)),
            ("stable_since", json!(self.stable_since)),
        ]))
    }
}

/// Fails a child that keeps running for `limit` or longer.
///
/// The timer starts on the first tick of a fresh run. Once the limit is
/// reached while the child is still running, the child is aborted and the
/// decorator returns `Failed` without ticking it again.
pub struct Timeout {
    base: DecoratorBase,
    limit: u64,
    started_at: Option<u64>,
}

impl Timeout {
    pub fn new(child: BoxedNode, limit: u64) -> Result<Self> {
        let limit = nonzero("Timeout", limit)?;
        Ok(Self {
            base: DecoratorBase::new(child, NodeFlags::STATEFUL)?,
            limit,
            started_at: None,
        })
    }
}

impl Node for Timeout {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "Timeout"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        if !self.base.child_running() {
            self.started_at = Some(ctx.now);
        } else if let Some(started_at) = self.started_at
            && elapsed_since(started_at, ctx) >= self.limit
        {
            tracing::debug!(
                node = %self.base.core.id(),
                started_at,
                now = ctx.now,
                limit = self.limit,
                "child timed out"
            );
            self.base.abort_child(ctx);
            self.started_at = None;
            return Ok(NodeResult::Failed);
        }

        let result = self.base.tick_child(ctx)?;
        if result.is_terminal() {
            self.started_at = None;
        }
        Ok(result)
    }

    fn on_reset(&mut self, _ctx: &TickContext) {
        self.started_at = None;
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("limit", json!(self.limit)),
            ("started_at", json!(self.started_at)),
        ]))
    }
}

/// Returns `Running` for `delay` after its own first tick, then ticks the
/// child on every tick. Completing or aborting restarts the delay.
pub struct Delay {
    base: DecoratorBase,
    delay: u64,
    started_at: Option<u64>,
}

impl Delay {
    pub fn new(child: BoxedNode, delay: u64) -> Result<Self> {
        Ok(Self {
            base: DecoratorBase::new(child, NodeFlags::STATEFUL)?,
            delay,
            started_at: None,
        })
    }
}

impl Node for Delay {
    decorator_node!();

    fn default_name(&self) -> &'static str {
        "Delay"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        let started_at = *self.started_at.get_or_insert(ctx.now);
        if elapsed_since(started_at, ctx) < self.delay {
            return Ok(NodeResult::Running);
        }
        self.base.tick_child(ctx)
    }

    fn on_reset(&mut self, _ctx: &TickContext) {
        self.started_at = None;
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("delay", json!(self.delay)),
            ("started_at", json!(self.started_at)),
        ]))
    }
}
