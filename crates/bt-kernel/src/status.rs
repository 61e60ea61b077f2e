//! Result returned by behavior nodes.

use serde::{Deserialize, Serialize};

/// The result of ticking a behavior node.
///
/// # Tick Semantics
///
/// Every tick resolves to exactly one of three values:
/// - Terminal results (`Succeeded`, `Failed`) end the node's current run
/// - `Running` suspends the node; the host is expected to tick it again
///   later, and the next tick is treated as a continuation of this run
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
pub enum NodeResult {
    /// The node completed successfully.
    ///
    /// For conditions: The predicate held.
    /// For actions: The action finished its work.
    Succeeded,

    /// The node failed.
    ///
    /// For conditions: The predicate did not hold.
    /// For actions: The action could not be carried out.
    Failed,

    /// The node has not finished yet and expects another tick.
    Running,
}

impl NodeResult {
    /// Returns `true` if this result is `Succeeded`.
    #[inline]
    pub fn is_succeeded(self) -> bool {
        matches!(self, NodeResult::Succeeded)
    }

    /// Returns `true` if this result is `Failed`.
    #[inline]
    pub fn is_failed(self) -> bool {
        matches!(self, NodeResult::Failed)
    }

    /// Returns `true` if this result is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, NodeResult::Running)
    }

    /// Returns `true` for `Succeeded` and `Failed`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }

    /// Swaps `Succeeded` and `Failed`; `Running` is left untouched.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            NodeResult::Succeeded => NodeResult::Failed,
            NodeResult::Failed => NodeResult::Succeeded,
            NodeResult::Running => NodeResult::Running,
        }
    }
}

impl From<bool> for NodeResult {
    /// Maps `true` to `Succeeded` and `false` to `Failed`.
    #[inline]
    fn from(value: bool) -> Self {
        if value {
            NodeResult::Succeeded
        } else {
            NodeResult::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn invert_keeps_running() {
        assert_eq!(NodeResult::Succeeded.invert(), NodeResult::Failed);
        assert_eq!(NodeResult::Failed.invert(), NodeResult::Succeeded);
        assert_eq!(NodeResult::Running.invert(), NodeResult::Running);
    }

    #[test]
    fn exactly_one_predicate_holds() {
        for result in NodeResult::iter() {
            let hits = [
                result.is_succeeded(),
                result.is_failed(),
                result.is_running(),
            ];
            assert_eq!(hits.iter().filter(|hit| **hit).count(), 1, "{result}");
        }
    }

    #[test]
    fn bool_maps_to_terminal_results() {
        assert_eq!(NodeResult::from(true), NodeResult::Succeeded);
        assert_eq!(NodeResult::from(false), NodeResult::Failed);
    }
}
