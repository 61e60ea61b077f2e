//! Declarative decoration.
//!
//! A [`Decoration`] names a decorator and carries its arguments; [`decorate`]
//! applies a list of them to a node. Builders and templating layers use
//! this instead of calling every decorator constructor by hand.

use std::fmt;

use crate::context::TickContext;
use crate::decorator::{
    ConditionGate, Cooldown, Debounce, Delay, FailIf, ForceFailure, ForceSuccess, HardThrottle,
    Hook, HookFn, Inverter, KeepRunningUntilFailure, LifecycleHook, NonAbortable, Precondition,
    Repeat, Retry, RunningIsFailure, RunningIsSuccess, SucceedIf, Throttle, Timeout, UntilFail,
    UntilSuccess,
};
use crate::error::Result;
use crate::node::{BoxedNode, NodeExt, Predicate};
use crate::status::NodeResult;

/// Wraps a node in a decorator not covered by the built-in variants.
pub type CustomDecorator = Box<dyn FnOnce(BoxedNode) -> Result<BoxedNode> + Send>;

/// One decorator with its arguments.
pub enum Decoration {
    Inverter,
    ForceSuccess,
    ForceFailure,
    RunningIsSuccess,
    RunningIsFailure,
    Precondition(Predicate),
    ConditionGate(Predicate),
    SucceedIf(Predicate),
    FailIf(Predicate),
    Throttle(u64),
    HardThrottle(u64),
    Cooldown(u64),
    Debounce(u64),
    Timeout(u64),
    Delay(u64),
    /// `-1` repeats forever.
    Repeat(i64),
    /// `-1` retries forever.
    Retry(i64),
    UntilSuccess,
    UntilFail,
    KeepRunningUntilFailure,
    Hook(Hook, HookFn),
    NonAbortable,
    Custom(CustomDecorator),
}

impl Decoration {
    pub fn precondition<F>(predicate: F) -> Self
    where
        F: FnMut(&TickContext) -> bool + Send + 'static,
    {
        Self::Precondition(Box::new(predicate))
    }

    pub fn condition_gate<F>(predicate: F) -> Self
    where
        F: FnMut(&TickContext) -> bool + Send + 'static,
    {
        Self::ConditionGate(Box::new(predicate))
    }

    pub fn succeed_if<F>(predicate: F) -> Self
    where
        F: FnMut(&TickContext) -> bool + Send + 'static,
    {
        Self::SucceedIf(Box::new(predicate))
    }

    pub fn fail_if<F>(predicate: F) -> Self
    where
        F: FnMut(&TickContext) -> bool + Send + 'static,
    {
        Self::FailIf(Box::new(predicate))
    }

    pub fn hook<F>(hook: Hook, callback: F) -> Self
    where
        F: FnMut(&TickContext, Option<NodeResult>) + Send + 'static,
    {
        Self::Hook(hook, Box::new(callback))
    }

    pub fn custom<F>(wrap: F) -> Self
    where
        F: FnOnce(BoxedNode) -> Result<BoxedNode> + Send + 'static,
    {
        Self::Custom(Box::new(wrap))
    }

    /// Name of the decorator this entry produces.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inverter => "Inverter",
            Self::ForceSuccess => "ForceSuccess",
            Self::ForceFailure => "ForceFailure",
            Self::RunningIsSuccess => "RunningIsSuccess",
            Self::RunningIsFailure => "RunningIsFailure",
            Self::Precondition(_) => "Precondition",
            Self::ConditionGate(_) => "ConditionGate",
            Self::SucceedIf(_) => "SucceedIf",
            Self::FailIf(_) => "FailIf",
            Self::Throttle(_) => "Throttle",
            Self::HardThrottle(_) => "HardThrottle",
            Self::Cooldown(_) => "Cooldown",
            Self::Debounce(_) => "Debounce",
            Self::Timeout(_) => "Timeout",
            Self::Delay(_) => "Delay",
            Self::Repeat(_) => "Repeat",
            Self::Retry(_) => "Retry",
            Self::UntilSuccess => "UntilSuccess",
            Self::UntilFail => "UntilFail",
            Self::KeepRunningUntilFailure => "KeepRunningUntilFailure",
            Self::Hook(hook, _) => (*hook).into(),
            Self::NonAbortable => "NonAbortable",
            Self::Custom(_) => "Custom",
        }
    }

    /// Wraps `node` in the decorator this entry names.
    ///
    /// # Errors
    ///
    /// [`crate::TreeError::InvalidDecoration`] for out-of-range arguments,
    /// and whatever a [`Decoration::Custom`] wrapper returns.
    pub fn apply(self, node: BoxedNode) -> Result<BoxedNode> {
        Ok(match self {
            Self::Inverter => Inverter::new(node)?.boxed(),
            Self::ForceSuccess => ForceSuccess::new(node)?.boxed(),
            Self::ForceFailure => ForceFailure::new(node)?.boxed(),
            Self::RunningIsSuccess => RunningIsSuccess::new(node)?.boxed(),
            Self::RunningIsFailure => RunningIsFailure::new(node)?.boxed(),
            Self::Precondition(predicate) => Precondition::new(node, predicate)?.boxed(),
            Self::ConditionGate(predicate) => ConditionGate::new(node, predicate)?.boxed(),
            Self::SucceedIf(predicate) => SucceedIf::new(node, predicate)?.boxed(),
            Self::FailIf(predicate) => FailIf::new(node, predicate)?.boxed(),
            Self::Throttle(window) => Throttle::new(node, window)?.boxed(),
            Self::HardThrottle(window) => HardThrottle::new(node, window)?.boxed(),
            Self::Cooldown(duration) => Cooldown::new(node, duration)?.boxed(),
            Self::Debounce(duration) => Debounce::new(node, duration)?.boxed(),
            Self::Timeout(limit) => Timeout::new(node, limit)?.boxed(),
            Self::Delay(delay) => Delay::new(node, delay)?.boxed(),
            Self::Repeat(times) => Repeat::new(node, times)?.boxed(),
            Self::Retry(attempts) => Retry::new(node, attempts)?.boxed(),
            Self::UntilSuccess => UntilSuccess::new(node)?.boxed(),
            Self::UntilFail => UntilFail::new(node)?.boxed(),
            Self::KeepRunningUntilFailure => KeepRunningUntilFailure::new(node)?.boxed(),
            Self::Hook(hook, callback) => LifecycleHook::new(node, hook, callback)?.boxed(),
            Self::NonAbortable => NonAbortable::new(node)?.boxed(),
            Self::Custom(wrap) => wrap(node)?,
        })
    }
}

impl fmt::Debug for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Throttle(n)
            | Self::HardThrottle(n)
            | Self::Cooldown(n)
            | Self::Debounce(n)
            | Self::Timeout(n)
            | Self::Delay(n) => f.debug_tuple(self.name()).field(n).finish(),
            Self::Repeat(n) | Self::Retry(n) => f.debug_tuple(self.name()).field(n).finish(),
            _ => f.write_str(self.name()),
        }
    }
}

/// Applies `decorations` to `node`, right to left.
///
/// The last entry wraps `node` directly and the first ends up
/// outermost, so `[A, B]` yields `A(B(node))`. An empty list returns `node`
/// unchanged.
pub fn decorate(node: BoxedNode, decorations: Vec<Decoration>) -> Result<BoxedNode> {
    decorations.into_iter().rev().try_fold(node, |node, decoration| {
        let name = decoration.name();
        decoration.apply(node).inspect_err(|err| {
            tracing::debug!(decorator = name, %err, "decoration rejected");
        })
    })
}
