//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bt_kernel::{BoxedNode, Node, NodeCore, NodeFlags, NodeResult, Result, TickContext};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

/// Routes kernel logs to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn ctx(tick_id: u64, now: u64) -> TickContext {
    TickContext::new(tick_id, now)
}

struct ProbeState {
    next: NodeResult,
    fault: Option<String>,
    ticks: usize,
    aborts: usize,
    resets: usize,
    log: Vec<&'static str>,
}

/// Leaf whose result is controlled from the test and which records every
/// hook the kernel calls on it.
pub struct Probe {
    core: NodeCore,
    state: Arc<Mutex<ProbeState>>,
}

/// Test-side view of a [`Probe`].
#[derive(Clone)]
pub struct ProbeHandle {
    state: Arc<Mutex<ProbeState>>,
}

pub fn probe(initial: NodeResult) -> (BoxedNode, ProbeHandle) {
    let state = Arc::new(Mutex::new(ProbeState {
        next: initial,
        fault: None,
        ticks: 0,
        aborts: 0,
        resets: 0,
        log: Vec::new(),
    }));
    let node = Probe {
        core: NodeCore::new(NodeFlags::LEAF),
        state: state.clone(),
    };
    (Box::new(node), ProbeHandle { state })
}

pub fn probes(initial: &[NodeResult]) -> (Vec<BoxedNode>, Vec<ProbeHandle>) {
    initial.iter().map(|result| probe(*result)).unzip()
}

impl ProbeHandle {
    pub fn set(&self, result: NodeResult) {
        self.state.lock().next = result;
    }

    /// Makes the next ticks fail hard with `message`.
    pub fn fault(&self, message: &str) {
        self.state.lock().fault = Some(message.to_owned());
    }

    pub fn heal(&self) {
        self.state.lock().fault = None;
    }

    pub fn ticks(&self) -> usize {
        self.state.lock().ticks
    }

    pub fn aborts(&self) -> usize {
        self.state.lock().aborts
    }

    pub fn resets(&self) -> usize {
        self.state.lock().resets
    }

    /// Drains the hook log.
    pub fn take_log(&self) -> Vec<&'static str> {
        std::mem::take(&mut self.state.lock().log)
    }
}

impl Node for Probe {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn default_name(&self) -> &'static str {
        "Probe"
    }

    fn on_tick(&mut self, _ctx: &TickContext) -> Result<NodeResult> {
        let mut state = self.state.lock();
        state.ticks += 1;
        state.log.push("tick");
        if let Some(message) = state.fault.clone() {
            return Err(bt_kernel::TreeError::Leaf {
                node: self.core.id(),
                source: message.into(),
            });
        }
        Ok(state.next)
    }

    fn on_enter(&mut self, _ctx: &TickContext) {
        self.state.lock().log.push("enter");
    }

    fn on_resume(&mut self, _ctx: &TickContext) {
        self.state.lock().log.push("resume");
    }

    fn on_reset(&mut self, _ctx: &TickContext) {
        let mut state = self.state.lock();
        state.resets += 1;
        state.log.push("reset");
    }

    fn on_abort(&mut self, _ctx: &TickContext) {
        let mut state = self.state.lock();
        state.aborts += 1;
        state.log.push("abort");
    }
}
