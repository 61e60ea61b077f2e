//! The tick/abort protocol.
//!
//! Every node, regardless of family, is driven through these two functions.
//! They own the `was_running` bookkeeping and the hook call order; node
//! implementations only supply hooks.

use crate::ambient;
use crate::context::{TickContext, TraceEvent};
use crate::error::Result;
use crate::node::Node;
use crate::status::NodeResult;

/// Ticks `node` once.
///
/// # Hook Order
///
/// 1. `on_enter` if the node was not running, `on_resume` otherwise
/// 2. `on_tick`
/// 3. `on_reset` if the node was running and the result is terminal
/// 4. `on_ticked`, `on_success` / `on_failed`, `on_finished`,
///    `on_running`, `on_success_or_running`, `on_failed_or_running`
///
/// A trace event is emitted afterwards when tracing is enabled.
///
/// # Errors
///
/// Errors from `on_tick` propagate unchanged. The node's `was_running`
/// flag is left as it was before the failed call and the ambient stack is
/// unwound.
pub fn tick(node: &mut dyn Node, ctx: &TickContext) -> Result<NodeResult> {
    let id = node.id();
    let _frame = ambient::enter(ctx, id);
    let started_at = ctx.timestamp();

    let was_running = node.core().was_running;
    if was_running {
        node.on_resume(ctx);
    } else {
        node.on_enter(ctx);
    }

    let result = node.on_tick(ctx)?;

    if was_running && result.is_terminal() {
        node.on_reset(ctx);
    }
    node.core_mut().was_running = result.is_running();

    node.on_ticked(result, ctx);
    match result {
        NodeResult::Succeeded => node.on_success(ctx),
        NodeResult::Failed => node.on_failed(ctx),
        NodeResult::Running => {}
    }
    if result.is_terminal() {
        node.on_finished(result, ctx);
    }
    if result.is_running() {
        node.on_running(ctx);
    }
    if !result.is_failed() {
        node.on_success_or_running(ctx);
    }
    if !result.is_succeeded() {
        node.on_failed_or_running(ctx);
    }

    tracing::trace!(tick = ctx.tick_id, node = %id, name = node.name(), %result, "ticked");

    if ctx.trace_enabled() {
        let state = if ctx.capture_state {
            node.display_state()
        } else {
            None
        };
        ctx.emit_trace(TraceEvent {
            tick_id: ctx.tick_id,
            node: id,
            result,
            started_at,
            finished_at: started_at.and_then(|_| ctx.timestamp()),
            state,
        });
    }

    Ok(result)
}

/// Interrupts `node` if it is running; a no-op otherwise.
///
/// Calls `on_abort` then `on_reset`, and clears `was_running`.
pub fn abort(node: &mut dyn Node, ctx: &TickContext) {
    if !node.core().was_running {
        return;
    }
    let _frame = ambient::enter(ctx, node.id());

    node.on_abort(ctx);
    node.on_reset(ctx);
    node.core_mut().was_running = false;

    tracing::trace!(tick = ctx.tick_id, node = %node.id(), name = node.name(), "aborted");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::context::TraceBuffer;
    use crate::error::TreeError;
    use crate::node::{NodeCore, NodeFlags};

    /// Leaf that replays scripted results and logs every hook call.
    struct Scripted {
        core: NodeCore,
        script: Vec<NodeResult>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Scripted {
        fn new(script: &[NodeResult]) -> (Self, Arc<Mutex<Vec<&'static str>>>) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let node = Self {
                core: NodeCore::new(NodeFlags::LEAF),
                script: script.iter().rev().copied().collect(),
                log: log.clone(),
            };
            (node, log)
        }

        fn push(&self, entry: &'static str) {
            self.log.lock().push(entry);
        }
    }

    impl Node for Scripted {
        fn core(&self) -> &NodeCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut NodeCore {
            &mut self.core
        }
        fn default_name(&self) -> &'static str {
            "Scripted"
        }
        fn on_tick(&mut self, _ctx: &TickContext) -> Result<NodeResult> {
            self.push("tick");
            match self.script.pop() {
                Some(result) => Ok(result),
                None => Err(TreeError::Leaf {
                    node: self.id(),
                    source: "script exhausted".into(),
                }),
            }
        }
        fn on_enter(&mut self, _ctx: &TickContext) {
            self.push("enter");
        }
        fn on_resume(&mut self, _ctx: &TickContext) {
            self.push("resume");
        }
        fn on_reset(&mut self, _ctx: &TickContext) {
            self.push("reset");
        }
        fn on_abort(&mut self, _ctx: &TickContext) {
            self.push("abort");
        }
        fn on_ticked(&mut self, _result: NodeResult, _ctx: &TickContext) {
            self.push("ticked");
        }
        fn on_success(&mut self, _ctx: &TickContext) {
            self.push("success");
        }
        fn on_failed(&mut self, _ctx: &TickContext) {
            self.push("failed");
        }
        fn on_finished(&mut self, _result: NodeResult, _ctx: &TickContext) {
            self.push("finished");
        }
        fn on_running(&mut self, _ctx: &TickContext) {
            self.push("running");
        }
        fn on_success_or_running(&mut self, _ctx: &TickContext) {
            self.push("success_or_running");
        }
        fn on_failed_or_running(&mut self, _ctx: &TickContext) {
            self.push("failed_or_running");
        }
    }

    use NodeResult::{Failed, Running, Succeeded};

    #[test]
    fn hooks_fire_in_protocol_order() {
        let (mut node, log) = Scripted::new(&[Running, Succeeded]);
        let ctx = TickContext::new(1, 0);

        assert_eq!(tick(&mut node, &ctx).unwrap(), Running);
        assert!(node.was_running());
        assert_eq!(
            std::mem::take(&mut *log.lock()),
            vec!["enter", "tick", "ticked", "running", "success_or_running", "failed_or_running"]
        );

        assert_eq!(tick(&mut node, &ctx).unwrap(), Succeeded);
        assert!(!node.was_running());
        assert_eq!(
            std::mem::take(&mut *log.lock()),
            vec!["resume", "tick", "reset", "ticked", "success", "finished", "success_or_running"]
        );
    }

    #[test]
    fn reset_skipped_for_terminal_to_terminal() {
        let (mut node, log) = Scripted::new(&[Failed, Failed]);
        let ctx = TickContext::new(1, 0);
        tick(&mut node, &ctx).unwrap();
        tick(&mut node, &ctx).unwrap();
        assert!(!log.lock().contains(&"reset"));
        assert_eq!(log.lock().iter().filter(|e| **e == "enter").count(), 2);
    }

    #[test]
    fn abort_only_affects_running_nodes() {
        let (mut node, log) = Scripted::new(&[Succeeded, Running]);
        let ctx = TickContext::new(1, 0);

        tick(&mut node, &ctx).unwrap();
        abort(&mut node, &ctx);
        assert!(!log.lock().contains(&"abort"));

        tick(&mut node, &ctx).unwrap();
        log.lock().clear();
        abort(&mut node, &ctx);
        abort(&mut node, &ctx);
        assert_eq!(*log.lock(), vec!["abort", "reset"]);
        assert!(!node.was_running());
    }

    #[test]
    fn failed_tick_keeps_bookkeeping_and_stack() {
        let (mut node, _log) = Scripted::new(&[Running]);
        let ctx = TickContext::new(1, 0);
        tick(&mut node, &ctx).unwrap();

        let err = tick(&mut node, &ctx).unwrap_err();
        assert!(matches!(err, TreeError::Leaf { .. }));
        assert!(node.was_running());
        assert_eq!(ambient::depth(), 0);
    }

    #[test]
    fn trace_event_carries_timestamps_and_state() {
        let (mut node, _log) = Scripted::new(&[Succeeded]);
        let buffer = TraceBuffer::new();
        let ctx = TickContext::new(42, 0)
            .with_trace_sink(buffer.clone())
            .with_clock(Arc::new(|| 1.0));

        tick(&mut node, &ctx).unwrap();
        let events = buffer.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tick_id, 42);
        assert_eq!(events[0].node, node.id());
        assert_eq!(events[0].started_at, Some(1.0));
        assert_eq!(events[0].finished_at, Some(1.0));
    }
}
