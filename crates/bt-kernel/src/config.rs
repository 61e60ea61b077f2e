//! Tree runner configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};

/// Tunable parameters of a [`crate::BehaviorTree`].
///
/// Loaded from RON, for example:
///
/// ```ron
/// (trace: true, capture_state: true)
/// ```
///
/// Missing fields keep their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Emit one trace event per ticked node to the tree's trace sink.
    pub trace: bool,
    /// Stamp trace events with the tree's clock.
    pub profile: bool,
    /// Attach display-state snapshots to trace events.
    pub capture_state: bool,
    /// Reject non-increasing tick ids and decreasing time values.
    pub strict_monotonic: bool,
}

impl TreeConfig {
    // ===== defaults =====
    pub const DEFAULT_TRACE: bool = false;
    pub const DEFAULT_PROFILE: bool = false;
    pub const DEFAULT_CAPTURE_STATE: bool = false;
    pub const DEFAULT_STRICT_MONOTONIC: bool = true;

    pub const fn new() -> Self {
        Self {
            trace: Self::DEFAULT_TRACE,
            profile: Self::DEFAULT_PROFILE,
            capture_state: Self::DEFAULT_CAPTURE_STATE,
            strict_monotonic: Self::DEFAULT_STRICT_MONOTONIC,
        }
    }

    pub const fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub const fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub const fn with_capture_state(mut self, capture_state: bool) -> Self {
        self.capture_state = capture_state;
        self
    }

    pub const fn with_strict_monotonic(mut self, strict: bool) -> Self {
        self.strict_monotonic = strict;
        self
    }

    /// Parses a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| TreeError::Config(format!("failed to parse config RON: {e}")))
    }

    /// Reads and parses a RON configuration file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TreeError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_ron(&text)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}
