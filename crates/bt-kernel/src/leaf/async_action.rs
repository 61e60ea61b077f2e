//! Bridge from non-blocking operations to the tick model.
//!
//! An [`AsyncAction`] starts its operation on the first tick of a run and
//! returns `Running` until a later tick observes the settlement. Ticks never
//! block: an inline operation is polled once per tick with a no-op waker,
//! while an operation handed to a tokio runtime settles out-of-band and
//! deposits its outcome in an inbox the next tick inspects.
//!
//! Every started operation is tagged with a generation. Aborting bumps the
//! generation, so a settlement from a superseded operation can never be
//! mistaken for the result of a fresh run.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;
use serde_json::json;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::cancel::{CancelHandle, CancelSignal, cancel_pair};
use crate::context::TickContext;
use crate::error::{BoxError, Result};
use crate::node::{DisplayState, Node, NodeCore, NodeFlags};
use crate::status::NodeResult;

/// Settled value of an operation: nothing or an explicit terminal result on
/// success, or the error it failed with.
pub type AsyncOutcome = std::result::Result<Option<NodeResult>, BoxError>;

pub type OperationFuture = Pin<Box<dyn Future<Output = AsyncOutcome> + Send>>;

type StartFn = Box<
    dyn FnMut(&TickContext, CancelSignal) -> std::result::Result<OperationFuture, BoxError>
        + Send,
>;

/// Where the node is in its start/settle cycle.
///
/// `Resolved` and `Rejected` describe the last settled run; the next tick in
/// either phase starts a fresh operation, exactly like `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AsyncPhase {
    Idle,
    Pending,
    Resolved,
    Rejected,
}

struct Settlement {
    generation: u64,
    outcome: AsyncOutcome,
}

enum Executor {
    Inline,
    Runtime(Handle),
}

enum Driver {
    Inline(OperationFuture),
    Spawned(JoinHandle<()>),
    /// Inline future already completed; its outcome is in the inbox.
    Drained,
}

struct PendingTask {
    generation: u64,
    cancel: CancelHandle,
    driver: Driver,
}

/// Leaf running a non-blocking operation across ticks.
pub struct AsyncAction {
    core: NodeCore,
    start: StartFn,
    executor: Executor,
    phase: AsyncPhase,
    generation: u64,
    task: Option<PendingTask>,
    inbox: Arc<Mutex<Vec<Settlement>>>,
    last_error: Option<BoxError>,
}

impl AsyncAction {
    /// Creates an action whose operation is polled inline, once per tick.
    ///
    /// `start` runs synchronously on the first tick of every run. Returning
    /// an error fails the node on that same tick.
    pub fn new<F>(start: F) -> Self
    where
        F: FnMut(&TickContext, CancelSignal) -> std::result::Result<OperationFuture, BoxError>
            + Send
            + 'static,
    {
        Self::with_executor(Executor::Inline, Box::new(start))
    }

    /// Creates an action whose operation is spawned on `handle` and settles
    /// independently of ticking.
    pub fn on_runtime<F>(handle: Handle, start: F) -> Self
    where
        F: FnMut(&TickContext, CancelSignal) -> std::result::Result<OperationFuture, BoxError>
            + Send
            + 'static,
    {
        Self::with_executor(Executor::Runtime(handle), Box::new(start))
    }

    fn with_executor(executor: Executor, start: StartFn) -> Self {
        Self {
            core: NodeCore::new(NodeFlags::LEAF | NodeFlags::STATEFUL),
            start,
            executor,
            phase: AsyncPhase::Idle,
            generation: 0,
            task: None,
            inbox: Arc::new(Mutex::new(Vec::new())),
            last_error: None,
        }
    }

    pub fn phase(&self) -> AsyncPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Error of the most recent failed start or rejected operation.
    pub fn last_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.last_error.as_deref()
    }

    fn start_operation(&mut self, ctx: &TickContext) -> NodeResult {
        self.generation += 1;
        let generation = self.generation;
        let (cancel, signal) = cancel_pair();

        let future = match (self.start)(ctx, signal) {
            Ok(future) => future,
            Err(error) => {
                tracing::debug!(node = %self.core.id(), %error, "async operation failed to start");
                self.phase = AsyncPhase::Rejected;
                self.last_error = Some(error);
                return NodeResult::Failed;
            }
        };

        let driver = match &self.executor {
            Executor::Inline => Driver::Inline(future),
            Executor::Runtime(handle) => {
                let inbox = self.inbox.clone();
                Driver::Spawned(handle.spawn(async move {
                    let outcome = future.await;
                    inbox.lock().push(Settlement {
                        generation,
                        outcome,
                    });
                }))
            }
        };

        self.task = Some(PendingTask {
            generation,
            cancel,
            driver,
        });
        self.phase = AsyncPhase::Pending;
        // Immediate completions are still only reported on a later tick.
        self.drive();
        NodeResult::Running
    }

    /// Polls an inline operation once without blocking.
    fn drive(&mut self) {
        let Some(task) = self.task.as_mut() else {
            return;
        };
        let Driver::Inline(future) = &mut task.driver else {
            return;
        };

        let mut cx = Context::from_waker(Waker::noop());
        if let Poll::Ready(outcome) = future.as_mut().poll(&mut cx) {
            self.inbox.lock().push(Settlement {
                generation: task.generation,
                outcome,
            });
            task.driver = Driver::Drained;
        }
    }

    /// Takes the settlement of the current generation, discarding stale ones.
    fn take_settlement(&mut self) -> Option<AsyncOutcome> {
        let mut current = None;
        for settlement in self.inbox.lock().drain(..) {
            if settlement.generation == self.generation && current.is_none() {
                current = Some(settlement.outcome);
            } else {
                tracing::debug!(
                    node = %self.core.id(),
                    stale = settlement.generation,
                    current = self.generation,
                    "discarded superseded async settlement"
                );
            }
        }
        current
    }

    fn settle(&mut self, outcome: AsyncOutcome) -> NodeResult {
        self.task = None;
        match outcome {
            Ok(None | Some(NodeResult::Succeeded)) => {
                self.phase = AsyncPhase::Resolved;
                NodeResult::Succeeded
            }
            Ok(Some(NodeResult::Failed)) => {
                self.phase = AsyncPhase::Resolved;
                NodeResult::Failed
            }
            Ok(Some(NodeResult::Running)) => {
                self.phase = AsyncPhase::Rejected;
                self.last_error = Some("async operation settled with a non-terminal result".into());
                NodeResult::Failed
            }
            Err(error) => {
                tracing::debug!(node = %self.core.id(), %error, "async operation rejected");
                self.phase = AsyncPhase::Rejected;
                self.last_error = Some(error);
                NodeResult::Failed
            }
        }
    }
}

impl Node for AsyncAction {
    node_core!();

    fn default_name(&self) -> &'static str {
        "AsyncAction"
    }

    fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
        if self.task.is_none() {
            return Ok(self.start_operation(ctx));
        }

        self.drive();
        match self.take_settlement() {
            Some(outcome) => Ok(self.settle(outcome)),
            None => Ok(NodeResult::Running),
        }
    }

    fn on_abort(&mut self, _ctx: &TickContext) {
        if let Some(task) = self.task.take() {
            task.cancel.cancel();
            if let Driver::Spawned(join) = task.driver {
                join.abort();
            }
            tracing::debug!(
                node = %self.core.id(),
                generation = task.generation,
                "async operation cancelled"
            );
        }
        self.generation += 1;
        self.phase = AsyncPhase::Idle;
    }

    fn display_state(&self) -> Option<DisplayState> {
        Some(DisplayState::from([
            ("phase", json!(self.phase.as_ref())),
            ("generation", json!(self.generation)),
        ]))
    }
}
