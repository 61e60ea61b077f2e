//! Leaf nodes.
//!
//! Leaves carry the user's logic: synchronous [`Action`]s and
//! [`Condition`]s, fixed-result [`Constant`]s, the time-based [`Wait`], and
//! [`AsyncAction`], which bridges a non-blocking operation into the tick
//! model.

pub mod action;
pub mod async_action;
pub mod cancel;
pub mod wait;

pub use action::{Action, Condition, Constant};
pub use async_action::{AsyncAction, AsyncOutcome, AsyncPhase, OperationFuture};
pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use wait::Wait;
