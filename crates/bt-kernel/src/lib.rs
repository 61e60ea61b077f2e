//! Tick-driven behavior tree kernel.
//!
//! A host loop calls [`tick`] on a root node once per external tick with a
//! [`TickContext`] describing that tick. Nodes answer with a
//! [`NodeResult`]: `Succeeded`, `Failed`, or `Running` when they need more
//! ticks. The kernel owns the lifecycle bookkeeping; nodes only implement
//! hooks.
//!
//! - **Deterministic timing**: every timing decorator reads
//!   [`TickContext::now`], never a wall clock
//! - **Explicit interruption**: [`abort`] unwinds a running subtree through
//!   its abort and reset hooks
//! - **Cooperative async**: [`leaf::AsyncAction`] turns an eventually
//!   settling operation into per-tick results, discarding stale settlements
//!
//! # Architecture
//!
//! - [`Node`]: core trait for all nodes, with default no-op hooks
//! - [`kernel`]: the [`tick`] / [`abort`] protocol
//! - [`leaf`]: actions, conditions, waits and async actions
//! - [`decorator`]: single-child wrappers (guards, transforms, timing,
//!   loops, lifecycle)
//! - [`composite`]: sequence, fallback, parallel, memory and utility
//!   composites
//! - [`ambient`]: the per-thread stack of executing contexts
//! - [`BehaviorTree`]: host-side runner with tick numbering and a node index
//!
//! # Example
//!
//! ```rust,ignore
//! use bt_kernel::builder::{action, condition, fallback, sequence};
//! use bt_kernel::{BehaviorTree, NodeResult};
//!
//! let root = fallback(vec![
//!     sequence(vec![condition(|ctx| ctx.now > 100), action(|_| NodeResult::Succeeded)])?,
//!     action(|_| NodeResult::Running),
//! ])?;
//! let mut tree = BehaviorTree::new(root);
//! tree.tick(0)?;
//! ```

#[macro_use]
mod macros;

pub mod ambient;
pub mod builder;
pub mod composite;
pub mod config;
pub mod context;
pub mod decoration;
pub mod decorator;
pub mod error;
pub mod kernel;
pub mod leaf;
pub mod node;
pub mod refs;
pub mod status;
pub mod tree;

// Re-export core types for ergonomic API
pub use config::TreeConfig;
pub use context::{
    Clock, NullSink, RefChange, RefChangeBuffer, RefSink, TickContext, TraceBuffer, TraceEvent,
    TraceSink,
};
pub use decoration::{Decoration, decorate};
pub use error::{BoxError, ErrorKind, Result, TreeError};
pub use kernel::{abort, tick};
pub use node::{BoxedNode, DisplayState, Node, NodeCore, NodeExt, NodeFlags, NodeId, TagSet};
pub use refs::Ref;
pub use status::NodeResult;
pub use tree::BehaviorTree;
