//! Timed wait leaf, measured against the caller-supplied `now` of each tick.

use serde_json::json;

use crate::context::TickContext;
use crate::error::Result;
use crate::node::{DisplayState, Node, NodeCore, NodeFlags};
use crate::status::NodeResult;

/// Returns `Running` until `duration` has elapsed since its first tick, then
/// `Succeeded`. Aborting restarts the wait.
pub struct Wait {
    core: NodeCore,
    duration: u64,
    started_at: Option<u64>,
}

impl Wait {
    pub fn new(duration: u64) -> Self {
        Self {
            core: NodeCore::new(NodeFlags::LEAF | NodeFlags::STATEFUL),
            duration,
            started_at: None,
        }
    }
}

impl Node for Wait {
    node_core!();

    fn default_name(&self) -> &'static str {
        "Wait"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        let started_at = *self.started_at.get_or_insert(ctx.now);
        if ctx.now.saturating_sub(started_at) >= self.duration {
            self.started_at = None;
            Ok(NodeResult::Succeeded)
        } else {
            Ok(NodeResult::Running)
        }
    }

    fn on_reset(&mut self, _ctx: &TickContext) {
        self.started_at = None;
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("duration", json!(self.duration)),
            ("started_at", json!(self.started_at)),
        ]))
    }
}
