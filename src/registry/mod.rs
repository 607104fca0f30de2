//! Node registry: the single source of truth for live node state.
//!
//! Every selection strategy and the post-dispatch accounting read and
//! mutate node state exclusively through this module. Strategies get an
//! immutable [`NodeSnapshot`] view via [`NodeRegistry::snapshot`]; only
//! the dispatch coordinator calls [`NodeRegistry::commit`].

mod node;
mod store;

pub use node::{NodeId, NodeSnapshot, NodeSpec};
pub use store::NodeRegistry;
