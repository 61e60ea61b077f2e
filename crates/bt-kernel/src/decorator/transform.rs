//! Result transformers.
//!
//! Each transformer ticks its child every tick and rewrites the result.
//! `Running` passes through untouched except in [`RunningIsSuccess`] and
//! [`RunningIsFailure`], which break the child's run and therefore abort it.

use super::DecoratorBase;
use crate::context::TickContext;
use crate::error::Result;
use crate::node::{BoxedNode, Node, NodeFlags};
use crate::status::NodeResult;

macro_rules! result_transformer {
    (
        $(#[$meta:meta])*
        $name:ident, |$base:ident, $ctx:ident, $result:ident| $map:expr
    ) => {
        $(#[$meta])*
        pub struct $name {
            base: DecoratorBase,
        }

        impl $name {
            pub fn new(child: BoxedNode) -> Result<Self> {
                Ok(Self {
                    base: DecoratorBase::new(child, NodeFlags::RESULT_TRANSFORMER)?,
                })
            }
        }

        impl Node for $name {
            decorator_node!();

            fn default_name(&self) -> &'static str {
                stringify!($name)
            }

            #[allow(unused_variables)]
            fn on_tick(&mut self, $ctx: &TickContext) -> Result<NodeResult> {
                let $result = self.base.tick_child($ctx)?;
                let $base = &mut self.base;
                Ok($map)
            }
        }
    };
}

result_transformer! {
    /// Swaps `Succeeded` and `Failed`, like a logical NOT.
    Inverter, |base, ctx, result| result.invert()
}

result_transformer! {
    /// Reports `Failed` as `Succeeded`.
    ///
    /// Useful for optional behaviors that must not fail an enclosing
    /// sequence.
    ForceSuccess, |base, ctx, result| match result {
        NodeResult::Failed => NodeResult::Succeeded,
        other => other,
    }
}

result_transformer! {
    /// Reports `Succeeded` as `Failed`.
    ForceFailure, |base, ctx, result| match result {
        NodeResult::Succeeded => NodeResult::Failed,
        other => other,
    }
}

result_transformer! {
    /// Turns a running child into an immediate `Succeeded`, aborting it.
    RunningIsSuccess, |base, ctx, result| match result {
        NodeResult::Running => {
            base.abort_child(ctx);
            NodeResult::Succeeded
        }
        other => other,
    }
}

result_transformer! {
    /// Turns a running child into an immediate `Failed`, aborting it.
    RunningIsFailure, |base, ctx, result| match result {
        NodeResult::Running => {
            base.abort_child(ctx);
            NodeResult::Failed
        }
        other => other,
    }
}

pub type AlwaysSucceed = ForceSuccess;
pub type AlwaysFail = ForceFailure;
