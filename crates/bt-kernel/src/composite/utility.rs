//! Utility-ranked composites.
//!
//! Every tick, each child is scored by its scorer, and the children are
//! ticked in descending score order. Ties keep the original child order, so
//! the ranking is deterministic for a given set of scores.
//!
//! Both composites remember which child is active. When a different child
//! becomes active, the previous one is aborted: a running low-priority
//! action is interrupted as soon as a better-scored alternative runs.

use serde_json::json;

use super::{CompositeBase, ensure_children};
use crate::context::TickContext;
use crate::error::Result;
use crate::node::{BoxedNode, DisplayState, Node, NodeFlags};
use crate::status::NodeResult;

/// Computes a child's priority for the current tick. Higher runs first.
pub type Scorer = Box<dyn FnMut(&TickContext) -> f64 + Send>;

/// A child together with its scorer.
pub type ScoredOption = (BoxedNode, Scorer);

/// Score/rank scratch space, reused across ticks.
#[derive(Debug, Default)]
struct Ranking {
    order: Vec<(usize, f64)>,
}

impl Ranking {
    fn rank(&mut self, scorers: &mut [Scorer], ctx: &TickContext) {
        self.order.clear();
        self.order.extend(
            scorers
                .iter_mut()
                .enumerate()
                .map(|(index, scorer)| (index, rankable(scorer(ctx)))),
        );
        self.order
            .sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    }

    fn index_at(&self, rank: usize) -> usize {
        self.order[rank].0
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Maps NaN to `-inf` so it ranks last; ties still break by index.
fn rankable(score: f64) -> f64 {
    if score.is_nan() { f64::NEG_INFINITY } else { score }
}

/// Shared state of both utility composites.
struct Utility {
    base: CompositeBase,
    scorers: Vec<Scorer>,
    ranking: Ranking,
    active: Option<usize>,
}

impl Utility {
    fn new(options: Vec<ScoredOption>) -> Result<Self> {
        let (children, scorers): (Vec<_>, Vec<_>) = options.into_iter().unzip();
        Ok(Self {
            base: CompositeBase::new(children, NodeFlags::UTILITY)?,
            ranking: Ranking {
                order: Vec::with_capacity(scorers.len()),
            },
            scorers,
            active: None,
        })
    }

    fn push_option(&mut self, child: BoxedNode, scorer: Scorer) -> Result<()> {
        self.base.push_child(child)?;
        self.scorers.push(scorer);
        Ok(())
    }

    /// Ticks children in rank order until one returns something other than
    /// `continue_on`. Falls through to `continue_on` when none does.
    fn tick(&mut self, continue_on: NodeResult, ctx: &TickContext) -> Result<NodeResult> {
        self.ranking.rank(&mut self.scorers, ctx);

        let mut outcome = (continue_on, None);
        for rank in 0..self.ranking.len() {
            let index = self.ranking.index_at(rank);
            let result = self.base.tick_child(index, ctx)?;
            if result != continue_on {
                outcome = (result, Some(index));
                break;
            }
        }

        let (result, active) = outcome;
        self.preempt(active, ctx);
        Ok(result)
    }

    fn preempt(&mut self, active: Option<usize>, ctx: &TickContext) {
        if let Some(previous) = self.active
            && self.active != active
        {
            if self.base.children[previous].was_running() {
                tracing::debug!(
                    node = %self.base.core.id(),
                    previous,
                    active = ?active,
                    "preempting previously active child"
                );
            }
            self.base.abort_child(previous, ctx);
        }
        self.active = active;
    }

    fn display_state(&self) -> DisplayState {
        let scores: Vec<_> = self
            .ranking
            .order
            .iter()
            .map(|(index, score)| json!([index, score]))
            .collect();
        DisplayState::from([
            ("scores", json!(scores)),
            ("active", json!(self.active)),
        ])
    }
}

/// Fallback over children ranked by score.
///
/// Stops at the first child that returns `Succeeded` or `Running`; fails
/// if every child fails.
///
/// # Example
///
/// ```rust,ignore
/// use bt_kernel::composite::UtilitySelector;
///
/// let selector = UtilitySelector::new(vec![
///     (flee_behavior(), Box::new(|ctx| flee_score(ctx))),
///     (attack_behavior(), Box::new(|ctx| attack_score(ctx))),
/// ])?;
/// ```
pub struct UtilitySelector {
    inner: Utility,
}

impl UtilitySelector {
    pub fn new(options: Vec<ScoredOption>) -> Result<Self> {
        Ok(Self {
            inner: Utility::new(options)?,
        })
    }

    pub fn push_option(&mut self, child: BoxedNode, scorer: Scorer) -> Result<()> {
        self.inner.push_option(child, scorer)
    }

    /// Index of the child that stopped the last walk, if any.
    pub fn active(&self) -> Option<usize> {
        self.inner.active
    }
}

/// Sequence over children ranked by score.
///
/// Stops at the first child that returns `Failed` or `Running`; succeeds
/// if every child succeeds.
pub struct UtilitySequence {
    inner: Utility,
}

impl UtilitySequence {
    pub fn new(options: Vec<ScoredOption>) -> Result<Self> {
        Ok(Self {
            inner: Utility::new(options)?,
        })
    }

    pub fn push_option(&mut self, child: BoxedNode, scorer: Scorer) -> Result<()> {
        self.inner.push_option(child, scorer)
    }

    pub fn active(&self) -> Option<usize> {
        self.inner.active
    }
}

macro_rules! utility_node {
    ($name:ident, $continue_on:expr) => {
        impl Node for $name {
            fn core(&self) -> &$crate::node::NodeCore {
                &self.inner.base.core
            }

            fn core_mut(&mut self) -> &mut $crate::node::NodeCore {
                &mut self.inner.base.core
            }

            fn children(&self) -> &[BoxedNode] {
                &self.inner.base.children
            }

            fn default_name(&self) -> &'static str {
                stringify!($name)
            }

            fn on_tick(&mut self, ctx: &TickContext) -> Result<NodeResult> {
                ensure_children(self)?;
                self.inner.tick($continue_on, ctx)
            }

            fn on_abort(&mut self, ctx: &TickContext) {
                self.inner.base.abort_all(ctx);
            }

            fn on_reset(&mut self, _ctx: &TickContext) {
                self.inner.active = None;
            }

            fn display_state(&self) -> Option<DisplayState> {
                Some(self.inner.display_state())
            }
        }
    };
}

utility_node!(UtilitySelector, NodeResult::Failed);
utility_node!(UtilitySequence, NodeResult::Succeeded);
