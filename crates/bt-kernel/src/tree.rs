//! Host-side tree runner.
//!
//! [`BehaviorTree`] owns a root node and drives it from a host loop: it
//! numbers ticks, builds the [`TickContext`] from its [`TreeConfig`],
//! enforces the tick contract and offers a read-only index over the nodes.

use std::fmt;
use std::sync::Arc;

use crate::config::TreeConfig;
use crate::context::{Clock, RefSink, TickContext, TraceSink};
use crate::error::{Result, TreeError};
use crate::kernel;
use crate::node::{BoxedNode, Node, NodeId};
use crate::status::NodeResult;

/// A root node plus the state a host loop needs to tick it.
///
/// # Example
///
/// ```rust,ignore
/// let mut tree = BehaviorTree::new(root).with_config(TreeConfig::new().with_trace(true));
/// loop {
///     let result = tree.tick(clock.now_ms())?;
/// }
/// ```
pub struct BehaviorTree {
    root: BoxedNode,
    config: TreeConfig,
    trace_sink: Option<Arc<dyn TraceSink>>,
    ref_sink: Option<Arc<dyn RefSink>>,
    clock: Option<Clock>,
    last_tick: Option<LastTick>,
    last_result: Option<NodeResult>,
}

#[derive(Clone, Copy, Debug)]
struct LastTick {
    id: u64,
    now: u64,
}

impl BehaviorTree {
    pub fn new(root: BoxedNode) -> Self {
        Self {
            root,
            config: TreeConfig::default(),
            trace_sink: None,
            ref_sink: None,
            clock: None,
            last_tick: None,
            last_result: None,
        }
    }

    pub fn with_config(mut self, config: TreeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    pub fn with_ref_sink(mut self, sink: Arc<dyn RefSink>) -> Self {
        self.ref_sink = Some(sink);
        self
    }

    /// Clock used for trace timestamps when profiling is enabled.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn root(&self) -> &dyn Node {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> &mut dyn Node {
        self.root.as_mut()
    }

    /// Result of the most recent successful tick.
    pub fn last_result(&self) -> Option<NodeResult> {
        self.last_result
    }

    /// Id of the most recent tick, if any.
    pub fn last_tick_id(&self) -> Option<u64> {
        self.last_tick.map(|last| last.id)
    }

    /// Builds the context for one tick from the tree's configuration.
    pub fn context(&self, tick_id: u64, now: u64) -> TickContext {
        let mut ctx = TickContext::new(tick_id, now).with_capture_state(self.config.capture_state);
        if self.config.trace
            && let Some(sink) = &self.trace_sink
        {
            ctx = ctx.with_trace_sink(sink.clone());
        }
        if self.config.profile
            && let Some(clock) = &self.clock
        {
            ctx = ctx.with_clock(clock.clone());
        }
        if let Some(sink) = &self.ref_sink {
            ctx = ctx.with_ref_sink(sink.clone());
        }
        ctx
    }

    /// Ticks the root with the next tick id.
    ///
    /// # Errors
    ///
    /// [`TreeError::NonMonotonicTick`] once the tick id space is exhausted,
    /// plus everything [`BehaviorTree::tick_with`] returns.
    pub fn tick(&mut self, now: u64) -> Result<NodeResult> {
        let tick_id = match self.last_tick {
            None => 1,
            Some(last) => last.id.checked_add(1).ok_or(TreeError::NonMonotonicTick {
                previous: last.id,
                provided: last.id,
            })?,
        };
        let ctx = self.context(tick_id, now);
        self.tick_with(&ctx)
    }

    /// Ticks the root with a caller-built context.
    ///
    /// # Errors
    ///
    /// With `strict_monotonic` set, a tick id that does not increase or a
    /// time value that decreases is rejected before anything is ticked.
    /// Otherwise, errors raised by the tree are returned unchanged.
    pub fn tick_with(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        if self.config.strict_monotonic {
            self.check_monotonic(ctx)?;
        }
        self.last_tick = Some(LastTick {
            id: ctx.tick_id,
            now: ctx.now,
        });

        let result = kernel::tick(self.root.as_mut(), ctx)?;
        self.last_result = Some(result);
        Ok(result)
    }

    /// Aborts the root if it is running.
    pub fn abort(&mut self, now: u64) {
        let tick_id = self.last_tick.map_or(0, |last| last.id);
        let ctx = self.context(tick_id, now);
        tracing::debug!(tick = tick_id, now, "aborting tree");
        kernel::abort(self.root.as_mut(), &ctx);
    }

    fn check_monotonic(&self, ctx: &TickContext) -> Result<()> {
        let Some(last) = self.last_tick else {
            return Ok(());
        };
        if ctx.tick_id <= last.id {
            tracing::warn!(previous = last.id, provided = ctx.tick_id, "rejected non-increasing tick id");
            return Err(TreeError::NonMonotonicTick {
                previous: last.id,
                provided: ctx.tick_id,
            });
        }
        if ctx.now < last.now {
            tracing::warn!(previous = last.now, provided = ctx.now, "rejected decreasing tick time");
            return Err(TreeError::NonMonotonicTime {
                previous: last.now,
                provided: ctx.now,
            });
        }
        Ok(())
    }

    /// Visits every node depth-first, parents before children, yielding
    /// each with its depth (the root is at depth 0).
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self.root.as_ref())],
        }
    }

    pub fn find(&self, id: NodeId) -> Option<&dyn Node> {
        self.walk().map(|(_, node)| node).find(|node| node.id() == id)
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<&dyn Node> {
        self.walk()
            .map(|(_, node)| node)
            .filter(|node| node.tags().contains(tag))
            .collect()
    }
}

impl fmt::Debug for BehaviorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorTree")
            .field("root", &self.root.id())
            .field("config", &self.config)
            .field("last_tick", &self.last_tick)
            .field("last_result", &self.last_result)
            .finish()
    }
}

/// Depth-first iterator returned by [`BehaviorTree::walk`].
pub struct Walk<'a> {
    stack: Vec<(usize, &'a dyn Node)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a dyn Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children().iter().rev().map(|child| (depth + 1, child.as_ref())));
        Some((depth, node))
    }
}
