//! Internal helper macros shared by node implementations.

/// Implements [`crate::Node::core`] and [`crate::Node::core_mut`] for nodes
/// that keep their bookkeeping in a `core` field.
macro_rules! node_core {
    () => {
        fn core(&self) -> &$crate::node::NodeCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut $crate::node::NodeCore {
            &mut self.core
        }
    };
}
