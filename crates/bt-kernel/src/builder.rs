//! Builder utilities for ergonomic tree construction.
//!
//! Helper functions that reduce boilerplate when assembling trees. Instead
//! of writing `Box::new(Sequence::new(vec![...])?)`, use
//! `sequence(vec![...])?`. Every helper that takes children returns
//! `Result` because a child that already has a parent is rejected.

use crate::composite::{
    Fallback, MemoryFallback, MemorySequence, Parallel, ParallelPolicy, ScoredOption, Scorer,
    Sequence, UtilitySelector, UtilitySequence,
};
use crate::context::TickContext;
use crate::decoration::{Decoration, decorate};
use crate::decorator::{ForceFailure, ForceSuccess, Inverter, Repeat, Retry};
use crate::error::Result;
use crate::leaf::{Action, Condition};
use crate::node::{BoxedNode, NodeExt};
use crate::status::NodeResult;

/// Shorthand for `Box::new(Sequence::new(children)?)`.
#[inline]
pub fn sequence(children: Vec<BoxedNode>) -> Result<BoxedNode> {
    Ok(Sequence::new(children)?.boxed())
}

/// Shorthand for `Box::new(Fallback::new(children)?)`.
#[inline]
pub fn fallback(children: Vec<BoxedNode>) -> Result<BoxedNode> {
    Ok(Fallback::new(children)?.boxed())
}

/// Alias of [`fallback`].
#[inline]
pub fn selector(children: Vec<BoxedNode>) -> Result<BoxedNode> {
    fallback(children)
}

#[inline]
pub fn memory_sequence(children: Vec<BoxedNode>) -> Result<BoxedNode> {
    Ok(MemorySequence::new(children)?.boxed())
}

#[inline]
pub fn memory_fallback(children: Vec<BoxedNode>) -> Result<BoxedNode> {
    Ok(MemoryFallback::new(children)?.boxed())
}

#[inline]
pub fn parallel(children: Vec<BoxedNode>, policy: ParallelPolicy) -> Result<BoxedNode> {
    Ok(Parallel::new(children, policy)?.boxed())
}

#[inline]
pub fn utility_selector(options: Vec<ScoredOption>) -> Result<BoxedNode> {
    Ok(UtilitySelector::new(options)?.boxed())
}

#[inline]
pub fn utility_sequence(options: Vec<ScoredOption>) -> Result<BoxedNode> {
    Ok(UtilitySequence::new(options)?.boxed())
}

/// Pairs a child with a scoring function for the utility composites.
pub fn scored<F>(child: BoxedNode, scorer: F) -> ScoredOption
where
    F: FnMut(&TickContext) -> f64 + Send + 'static,
{
    let scorer: Scorer = Box::new(scorer);
    (child, scorer)
}

#[inline]
pub fn inverter(child: BoxedNode) -> Result<BoxedNode> {
    Ok(Inverter::new(child)?.boxed())
}

#[inline]
pub fn always_succeed(child: BoxedNode) -> Result<BoxedNode> {
    Ok(ForceSuccess::new(child)?.boxed())
}

#[inline]
pub fn always_fail(child: BoxedNode) -> Result<BoxedNode> {
    Ok(ForceFailure::new(child)?.boxed())
}

/// `times == -1` repeats forever.
#[inline]
pub fn repeat(child: BoxedNode, times: i64) -> Result<BoxedNode> {
    Ok(Repeat::new(child, times)?.boxed())
}

#[inline]
pub fn retry(child: BoxedNode, max_attempts: i64) -> Result<BoxedNode> {
    Ok(Retry::new(child, max_attempts)?.boxed())
}

/// Shorthand for [`decorate`].
#[inline]
pub fn decorated(child: BoxedNode, decorations: Vec<Decoration>) -> Result<BoxedNode> {
    decorate(child, decorations)
}

#[inline]
pub fn action<F>(run: F) -> BoxedNode
where
    F: FnMut(&TickContext) -> NodeResult + Send + 'static,
{
    Action::new(run).boxed()
}

#[inline]
pub fn condition<F>(predicate: F) -> BoxedNode
where
    F: FnMut(&TickContext) -> bool + Send + 'static,
{
    Condition::new(predicate).boxed()
}
