//! Error types raised while building and ticking behavior trees.

use thiserror::Error;

use crate::node::NodeId;

/// Boxed error produced by user code (leaf logic, async operations).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors surfaced by the kernel.
///
/// Configuration errors fail fast at the point of misuse. Execution errors
/// come from synchronous leaf logic and abort the tick that raised them;
/// the tree stays usable for later ticks.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("node {node} is already attached to {parent}, cannot attach to {new_parent}")]
    AlreadyAttached {
        node: NodeId,
        parent: NodeId,
        new_parent: NodeId,
    },

    #[error("composite {name} ({node}) has no children")]
    EmptyComposite { node: NodeId, name: String },

    #[error("invalid {decorator} decoration: {reason}")]
    InvalidDecoration {
        decorator: &'static str,
        reason: String,
    },

    #[error("tick id {provided} does not follow previous tick {previous}")]
    NonMonotonicTick { previous: u64, provided: u64 },

    #[error("tick time {provided} is earlier than previous time {previous}")]
    NonMonotonicTime { previous: u64, provided: u64 },

    #[error("leaf {node} failed")]
    Leaf {
        node: NodeId,
        #[source]
        source: BoxError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Broad classification of a [`TreeError`], used to decide how to react.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The tree was assembled or decorated incorrectly.
    Configuration,
    /// User logic inside a node faulted during a tick.
    Execution,
    /// The host loop broke the tick contract (ordering of ids or time).
    Caller,
}

impl TreeError {
    pub(crate) fn invalid_decoration(decorator: &'static str, reason: impl Into<String>) -> Self {
        TreeError::InvalidDecoration {
            decorator,
            reason: reason.into(),
        }
    }

    /// Returns the broad category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyAttached { .. }
            | Self::EmptyComposite { .. }
            | Self::InvalidDecoration { .. }
            | Self::Config(_) => ErrorKind::Configuration,
            Self::Leaf { .. } => ErrorKind::Execution,
            Self::NonMonotonicTick { .. } | Self::NonMonotonicTime { .. } => ErrorKind::Caller,
        }
    }

    /// Returns true if this error indicates a badly assembled tree.
    pub const fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration)
    }
}
