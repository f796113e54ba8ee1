//! The display tree: containers, quads and prebuilt batches arranged in paint order.

mod node;
mod tree;

pub use node::{Container, DisplayProps, FlattenCache, Invalidation, NodeId, NodeKind};
pub use tree::DisplayTree;
