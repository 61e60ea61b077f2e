//! Named mutable state that reports its writes.

use std::fmt;

use serde::Serialize;

use crate::ambient;
use crate::context::RefChange;

/// A named value owned by leaf code.
///
/// Writes made while a node is ticking are attributed to the innermost
/// active tick: a [`RefChange`] carrying the tick id, the node id and the
/// new value is sent to that context's ref sink. Writes outside any tick
/// are allowed and go unreported.
///
/// # Example
///
/// ```rust,ignore
/// let mut target = Ref::new("target", None::<u32>);
/// let action = Action::new(move |_ctx| {
///     target.set(Some(7));
///     NodeResult::Succeeded
/// });
/// ```
pub struct Ref<T> {
    name: String,
    value: T,
}

impl<T> Ref<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Serialize> Ref<T> {
    /// Replaces the value and reports the write.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.report();
    }

    /// Mutates the value in place and reports the write.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.value);
        self.report();
    }

    fn report(&self) {
        ambient::with_current(|frame| {
            let Some(frame) = frame else {
                return;
            };
            let value = serde_json::to_value(&self.value).unwrap_or_else(|err| {
                tracing::debug!(ref_name = %self.name, %err, "ref value not serializable");
                serde_json::Value::Null
            });
            frame.ctx.emit_ref_change(RefChange {
                tick_id: frame.ctx.tick_id,
                node: frame.node,
                ref_name: self.name.clone(),
                value,
            });
        });
    }
}

impl<T: Clone> Ref<T> {
    /// Returns a copy of the value.
    pub fn cloned(&self) -> T {
        self.value.clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}
