//! Per-tick context and the event sinks it carries.
//!
//! A [`TickContext`] is built by the host once per external tick and passed
//! to every [`crate::tick`] / [`crate::abort`] call. It is cheap to clone:
//! sinks and the clock are shared handles.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::node::{DisplayState, NodeId};
use crate::status::NodeResult;

/// High-resolution clock used for profiling timestamps.
pub type Clock = Arc<dyn Fn() -> f64 + Send + Sync>;

/// One record per ticked node per tick, emitted after the node's own tick
/// completes (innermost first, root last).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceEvent {
    pub tick_id: u64,
    pub node: NodeId,
    pub result: NodeResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<DisplayState>,
}

/// A write performed on a [`crate::Ref`] while a node was ticking.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RefChange {
    pub tick_id: u64,
    pub node: NodeId,
    pub ref_name: String,
    pub value: serde_json::Value,
}

/// Receiver of trace events.
pub trait TraceSink: Send + Sync {
    fn record(&self, event: TraceEvent);
}

/// Receiver of ref-change events.
pub trait RefSink: Send + Sync {
    fn record(&self, change: RefChange);
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&self, _event: TraceEvent) {}
}

impl RefSink for NullSink {
    fn record(&self, _change: RefChange) {}
}

/// In-memory trace sink, typically shared between the host and an inspector.
#[derive(Debug, Default)]
pub struct TraceBuffer {
    events: Mutex<Vec<TraceEvent>>,
}

impl TraceBuffer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Removes and returns all buffered events in emission order.
    pub fn drain(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl TraceSink for TraceBuffer {
    fn record(&self, event: TraceEvent) {
        self.events.lock().push(event);
    }
}

/// In-memory ref-change sink.
#[derive(Debug, Default)]
pub struct RefChangeBuffer {
    changes: Mutex<Vec<RefChange>>,
}

impl RefChangeBuffer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn drain(&self) -> Vec<RefChange> {
        std::mem::take(&mut *self.changes.lock())
    }
}

impl RefSink for RefChangeBuffer {
    fn record(&self, change: RefChange) {
        self.changes.lock().push(change);
    }
}

/// Caller-supplied value object describing one external tick.
///
/// `now` is in a caller-defined unit and must be non-decreasing across
/// ticks; timing decorators read it and never consult a wall clock.
#[derive(Clone, Default)]
pub struct TickContext {
    pub tick_id: u64,
    pub now: u64,
    pub tracing: bool,
    pub capture_state: bool,
    trace_sink: Option<Arc<dyn TraceSink>>,
    clock: Option<Clock>,
    ref_sink: Option<Arc<dyn RefSink>>,
}

impl TickContext {
    pub fn new(tick_id: u64, now: u64) -> Self {
        Self {
            tick_id,
            now,
            ..Self::default()
        }
    }

    /// Attaches a trace sink and enables tracing.
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self.tracing = true;
        self
    }

    /// Attaches a profiling clock; trace events then carry start and finish
    /// timestamps.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_ref_sink(mut self, sink: Arc<dyn RefSink>) -> Self {
        self.ref_sink = Some(sink);
        self
    }

    /// Attaches each node's display state to its trace event.
    pub fn with_capture_state(mut self, capture: bool) -> Self {
        self.capture_state = capture;
        self
    }

    /// Reads the profiling clock, if one is attached.
    pub fn timestamp(&self) -> Option<f64> {
        self.clock.as_ref().map(|clock| clock())
    }

    pub(crate) fn trace_enabled(&self) -> bool {
        self.tracing && self.trace_sink.is_some()
    }

    pub(crate) fn emit_trace(&self, event: TraceEvent) {
        if !self.tracing {
            return;
        }
        if let Some(sink) = &self.trace_sink {
            sink.record(event);
        }
    }

    pub(crate) fn emit_ref_change(&self, change: RefChange) {
        if let Some(sink) = &self.ref_sink {
            sink.record(change);
        }
    }
}

impl fmt::Debug for TickContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickContext")
            .field("tick_id", &self.tick_id)
            .field("now", &self.now)
            .field("tracing", &self.tracing)
            .field("capture_state", &self.capture_state)
            .field("trace_sink", &self.trace_sink.is_some())
            .field("clock", &self.clock.is_some())
            .field("ref_sink", &self.ref_sink.is_some())
            .finish()
    }
}
