//! Arena storage for the display tree.
//!
//! Nodes live in a dense `Vec` for cache-friendly traversal, with a sparse map from
//! stable [`NodeId`]s to dense slots. Removal is a swap-remove that patches the moved
//! node's sparse entry.
//!
//! Containers own their children exclusively: [`DisplayTree::destroy`] frees a node
//! together with its whole subtree. The parent link is only used for upward queries
//! and never keeps anything alive.

use crate::error::{Error, Result};
use crate::geom::{Matrix, Point, Rect};
use crate::render::{Quad, QuadBatch};

use super::node::{Container, DisplayProps, FlattenCache, Invalidation, NodeId, NodeKind};

struct SparseEntry {
    /// `None` while the slot is free
    dense_index: Option<usize>,
    generation: u32,
}

pub(crate) struct Node {
    pub(crate) props: DisplayProps,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
    sparse_index: u32,
}

#[derive(Default)]
pub struct DisplayTree {
    dense: Vec<Node>,
    sparse: Vec<SparseEntry>,
    free_indices: Vec<u32>,
}

impl DisplayTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let sparse_index = match self.free_indices.pop() {
            Some(index) => index,
            None => {
                self.sparse.push(SparseEntry {
                    dense_index: None,
                    generation: 0,
                });
                (self.sparse.len() - 1) as u32
            }
        };
        let entry = &mut self.sparse[sparse_index as usize];
        entry.dense_index = Some(self.dense.len());
        let id = NodeId {
            index: sparse_index,
            generation: entry.generation,
        };
        self.dense.push(Node {
            props: DisplayProps::default(),
            parent: None,
            kind,
            sparse_index,
        });
        id
    }

    pub fn create_container(&mut self) -> NodeId {
        self.insert(NodeKind::Container(Container::default()))
    }

    pub fn create_quad(&mut self, quad: Quad) -> NodeId {
        self.insert(NodeKind::Quad(quad))
    }

    pub fn create_batch(&mut self, batch: QuadBatch) -> NodeId {
        self.insert(NodeKind::Batch(batch))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    fn dense_index(&self, id: NodeId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.dense_index)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.dense_index(id).is_some()
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.dense_index(id)
            .map(|idx| &self.dense[idx])
            .ok_or(Error::StaleNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        match self.dense_index(id) {
            Some(idx) => Ok(&mut self.dense[idx]),
            None => Err(Error::StaleNode(id)),
        }
    }

    fn container(&self, id: NodeId) -> Result<&Container> {
        self.node(id)?
            .kind
            .as_container()
            .ok_or(Error::NotAContainer(id))
    }

    fn container_mut(&mut self, id: NodeId) -> Result<&mut Container> {
        self.node_mut(id)?
            .kind
            .as_container_mut()
            .ok_or(Error::NotAContainer(id))
    }

    pub fn props(&self, id: NodeId) -> Result<&DisplayProps> {
        Ok(&self.node(id)?.props)
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        Ok(&self.node(id)?.kind)
    }

    /// Mutate a node's display properties.
    pub fn with_props_mut<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut DisplayProps) -> R,
    ) -> Result<R> {
        let node = self.node_mut(id)?;
        let result = f(&mut node.props);
        let parent = node.parent;
        self.invalidate_from(parent, Invalidation::GEOMETRY | Invalidation::STATE);
        Ok(result)
    }

    /// Mutate the geometry of a quad node.
    pub fn with_quad_mut<R>(&mut self, id: NodeId, f: impl FnOnce(&mut Quad) -> R) -> Result<R> {
        let node = self.node_mut(id)?;
        let NodeKind::Quad(quad) = &mut node.kind else {
            return Err(Error::InvalidOperation(format!("node {id:?} is not a quad")));
        };
        let result = f(quad);
        let parent = node.parent;
        self.invalidate_from(parent, Invalidation::GEOMETRY | Invalidation::STATE);
        Ok(result)
    }

    /// Mutate the content of a batch node.
    pub fn with_batch_mut<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut QuadBatch) -> R,
    ) -> Result<R> {
        let node = self.node_mut(id)?;
        let NodeKind::Batch(batch) = &mut node.kind else {
            return Err(Error::InvalidOperation(format!("node {id:?} is not a batch")));
        };
        let result = f(batch);
        let parent = node.parent;
        self.invalidate_from(parent, Invalidation::GEOMETRY | Invalidation::STATE);
        Ok(result)
    }

    /// Children of a container in paint order.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.container(id)?.children())
    }

    pub fn num_children(&self, id: NodeId) -> Result<usize> {
        Ok(self.container(id)?.children.len())
    }

    pub fn child_at(&self, parent: NodeId, index: usize) -> Result<NodeId> {
        let children = &self.container(parent)?.children;
        children
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                index,
                len: children.len(),
            })
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(|n| n.parent)
    }

    /// Topmost ancestor, or the node itself if it has no parent.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.node(id).ok().map(|_| id)?;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        Some(current)
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let len = self.num_children(parent)?;
        let len = if self.parent(child) == Some(parent) {
            len - 1
        } else {
            len
        };
        self.add_child_at(parent, child, len)
    }

    /// Insert `child` at `index`. A child of another container is moved; a child of
    /// `parent` itself is reordered.
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<()> {
        let len = self.num_children(parent)?;
        self.node(child)?;
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(Error::InvalidOperation(format!(
                "cannot add {child:?} to its own subtree"
            )));
        }
        if self.parent(child) == Some(parent) {
            return self.set_child_index(parent, child, index);
        }
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }

        self.remove_from_parent(child)?;
        self.container_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.invalidate_from(Some(parent), Invalidation::MEMBERSHIP);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.child_index(parent, child)?;
        self.remove_child_at(parent, index).map(|_| ())
    }

    /// Detach the child at `index`. The child stays alive as a new root.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Result<NodeId> {
        let children = &mut self.container_mut(parent)?.children;
        if index >= children.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: children.len(),
            });
        }
        let child = children.remove(index);
        self.node_mut(child)?.parent = None;
        self.invalidate_from(Some(parent), Invalidation::MEMBERSHIP);
        Ok(child)
    }

    /// Detach a node from its parent, if it has one.
    pub fn remove_from_parent(&mut self, id: NodeId) -> Result<()> {
        match self.node(id)?.parent {
            Some(parent) => self.remove_child(parent, id),
            None => Ok(()),
        }
    }

    /// Free a node and its whole subtree. Ids into the subtree become stale.
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        self.remove_from_parent(id)?;
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Ok(container) = self.container(current) {
                pending.extend_from_slice(&container.children);
            }
            self.free(current);
        }
        Ok(())
    }

    fn free(&mut self, id: NodeId) {
        let Some(dense_index) = self.dense_index(id) else {
            return;
        };
        let last = self.dense.len() - 1;
        self.dense.swap_remove(dense_index);
        if dense_index != last {
            let moved = self.dense[dense_index].sparse_index;
            self.sparse[moved as usize].dense_index = Some(dense_index);
        }
        let entry = &mut self.sparse[id.index as usize];
        entry.dense_index = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free_indices.push(id.index);
    }

    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        self.container(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| {
                Error::InvalidOperation(format!("{child:?} is not a child of {parent:?}"))
            })
    }

    /// Move a child to a new position among its siblings.
    pub fn set_child_index(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<()> {
        let old = self.child_index(parent, child)?;
        let children = &mut self.container_mut(parent)?.children;
        if index >= children.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: children.len(),
            });
        }
        if old != index {
            children.remove(old);
            children.insert(index, child);
            self.invalidate_from(Some(parent), Invalidation::MEMBERSHIP);
        }
        Ok(())
    }

    pub fn swap_children(&mut self, parent: NodeId, a: NodeId, b: NodeId) -> Result<()> {
        let i = self.child_index(parent, a)?;
        let j = self.child_index(parent, b)?;
        self.swap_children_at(parent, i, j)
    }

    pub fn swap_children_at(&mut self, parent: NodeId, i: usize, j: usize) -> Result<()> {
        let children = &mut self.container_mut(parent)?.children;
        let len = children.len();
        if let Some(index) = [i, j].into_iter().find(|&index| index >= len) {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        children.swap(i, j);
        self.invalidate_from(Some(parent), Invalidation::MEMBERSHIP);
        Ok(())
    }

    /// Local matrix of a node, from its space to its parent's.
    pub fn transformation_matrix(&self, id: NodeId) -> Result<Matrix> {
        Ok(self.props(id)?.transformation_matrix())
    }

    /// Matrix from `id`'s space to `target`'s space. `None` targets the space the
    /// root itself is placed in, i.e. every ancestor's transform is applied.
    ///
    /// Fails with [`Error::NotRelated`] if the nodes are in different trees and with
    /// [`Error::InvalidOperation`] if `target`'s transform cannot be inverted.
    pub fn transformation_matrix_to(&self, id: NodeId, target: Option<NodeId>) -> Result<Matrix> {
        self.node(id)?;
        let Some(target) = target else {
            return self.matrix_up_to(id, None);
        };
        if target == id {
            return Ok(Matrix::IDENTITY);
        }
        self.node(target)?;
        if self.parent(id) == Some(target) {
            return self.transformation_matrix(id);
        }

        let common = self.common_ancestor(id, target).ok_or(Error::NotRelated)?;
        let mut matrix = self.matrix_up_to(id, Some(common))?;
        let target_to_common = self.matrix_up_to(target, Some(common))?;
        matrix.append(&target_to_common.inverse()?);
        Ok(matrix)
    }

    /// Product of local matrices from `id` up to, not including, `stop`.
    fn matrix_up_to(&self, id: NodeId, stop: Option<NodeId>) -> Result<Matrix> {
        let mut matrix = Matrix::IDENTITY;
        let mut current = Some(id);
        while let Some(node) = current {
            if Some(node) == stop {
                break;
            }
            matrix.append(&self.transformation_matrix(node)?);
            current = self.parent(node);
        }
        Ok(matrix)
    }

    fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let mut ancestors = vec![a];
        let mut current = self.parent(a);
        while let Some(node) = current {
            ancestors.push(node);
            current = self.parent(node);
        }
        let mut current = Some(b);
        while let Some(node) = current {
            if ancestors.contains(&node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Axis-aligned bounds of a node and its subtree in `target`'s space.
    pub fn bounds_in(&self, id: NodeId, target: Option<NodeId>) -> Result<Rect> {
        let matrix = self.transformation_matrix_to(id, target)?;
        self.bounds_with(id, &matrix)
    }

    fn bounds_with(&self, id: NodeId, matrix: &Matrix) -> Result<Rect> {
        match &self.node(id)?.kind {
            NodeKind::Quad(quad) => Ok(quad.bounds(Some(matrix))),
            NodeKind::Batch(batch) => Ok(batch.bounds(Some(matrix))),
            NodeKind::Container(container) => {
                let mut bounds: Option<Rect> = None;
                for &child in &container.children {
                    let child_matrix = matrix.prepended(&self.transformation_matrix(child)?);
                    let child_bounds = self.bounds_with(child, &child_matrix)?;
                    bounds = Some(match bounds {
                        Some(b) => b.union(&child_bounds),
                        None => child_bounds,
                    });
                }
                Ok(bounds.unwrap_or_else(|| {
                    let origin = matrix.transform_point(Point::ORIGIN);
                    Rect::new(origin.x, origin.y, 0.0, 0.0)
                }))
            }
        }
    }

    /// Cache the compiled batches of a container's subtree. The cache is built on the
    /// next refresh and rebuilt whenever anything below the container changes.
    pub fn flatten(&mut self, id: NodeId) -> Result<()> {
        let container = self.container_mut(id)?;
        match &mut container.flattened {
            Some(cache) => cache.invalidation = Invalidation::all(),
            None => container.flattened = Some(FlattenCache::new()),
        }
        let parent = self.node(id)?.parent;
        self.invalidate_from(parent, Invalidation::STATE);
        Ok(())
    }

    pub fn unflatten(&mut self, id: NodeId) -> Result<()> {
        self.container_mut(id)?.flattened = None;
        let parent = self.node(id)?.parent;
        self.invalidate_from(parent, Invalidation::STATE);
        Ok(())
    }

    pub fn is_flattened(&self, id: NodeId) -> bool {
        self.container(id)
            .map(|c| c.flattened.is_some())
            .unwrap_or(false)
    }

    pub fn flatten_cache(&self, id: NodeId) -> Option<&FlattenCache> {
        self.container(id).ok().and_then(|c| c.flattened.as_ref())
    }

    /// Flattened containers at or below `root` whose cache is stale, children before
    /// their ancestors.
    pub(crate) fn stale_flattened(&self, root: NodeId) -> Vec<NodeId> {
        let mut stale = Vec::new();
        self.collect_stale(root, &mut stale);
        stale
    }

    fn collect_stale(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Ok(container) = self.container(id) else {
            return;
        };
        for &child in &container.children {
            self.collect_stale(child, out);
        }
        if container.flattened.as_ref().is_some_and(|c| !c.is_valid()) {
            out.push(id);
        }
    }

    pub(crate) fn take_flattened_batches(&mut self, id: NodeId) -> Vec<QuadBatch> {
        self.container_mut(id)
            .ok()
            .and_then(|c| c.flattened.as_mut())
            .map(|cache| std::mem::take(&mut cache.batches))
            .unwrap_or_default()
    }

    pub(crate) fn store_flattened_batches(&mut self, id: NodeId, batches: Vec<QuadBatch>) {
        if let Some(cache) = self
            .container_mut(id)
            .ok()
            .and_then(|c| c.flattened.as_mut())
        {
            cache.batches = batches;
            cache.invalidation = Invalidation::empty();
        }
    }

    /// Mark the flatten caches of `start` and all its ancestors stale.
    fn invalidate_from(&mut self, start: Option<NodeId>, flags: Invalidation) {
        let mut current = start;
        while let Some(id) = current {
            let Ok(node) = self.node_mut(id) else {
                return;
            };
            if let Some(cache) = node
                .kind
                .as_container_mut()
                .and_then(|c| c.flattened.as_mut())
            {
                if cache.is_valid() {
                    log::trace!("Flatten cache of {id:?} invalidated ({flags:?})");
                }
                cache.invalidation |= flags;
            }
            current = node.parent;
        }
    }
}
