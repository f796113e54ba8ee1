//! Compilation of a display tree into quad batches.
//!
//! The tree is walked depth-first in paint order. Each leaf is checked against the
//! open batch; a state change or a full batch opens the next one. Transforms and
//! alpha are accumulated on the way down and applied to vertices as they are copied,
//! so every batch lives in the coordinate space of the compiled root.

use crate::blend::BlendMode;
use crate::config::RenderConfig;
use crate::display::{DisplayTree, NodeId, NodeKind};
use crate::error::Result;
use crate::geom::Matrix;

use super::quad::Quad;
use super::quad_batch::{QuadBatch, DEFAULT_CAPACITY, MAX_NUM_QUADS};

#[derive(Clone, Debug, PartialEq)]
pub struct BatchCompiler {
    max_quads_per_batch: usize,
    initial_capacity: usize,
    blend_override: Option<BlendMode>,
}

impl Default for BatchCompiler {
    fn default() -> Self {
        Self {
            max_quads_per_batch: MAX_NUM_QUADS,
            initial_capacity: DEFAULT_CAPACITY,
            blend_override: None,
        }
    }
}

impl BatchCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            max_quads_per_batch: config.max_quads_per_batch.clamp(1, MAX_NUM_QUADS),
            initial_capacity: config.initial_batch_capacity,
            blend_override: None,
        }
    }

    /// Force one blend mode onto every leaf, whatever the tree says.
    pub fn with_blend_override(mut self, blend_mode: Option<BlendMode>) -> Self {
        self.blend_override = blend_mode;
        self
    }

    pub fn blend_override(&self) -> Option<BlendMode> {
        self.blend_override
    }

    pub fn max_quads_per_batch(&self) -> usize {
        self.max_quads_per_batch
    }

    /// Compile the subtree below `root` into a new list of batches.
    pub fn compile(&self, tree: &DisplayTree, root: NodeId) -> Result<Vec<QuadBatch>> {
        let mut batches = Vec::new();
        self.compile_into(tree, root, &mut batches)?;
        Ok(batches)
    }

    /// Compile the subtree below `root`, reusing the batches already in `batches`.
    ///
    /// Batches are reset and refilled by position; surplus ones are dropped. The
    /// root's own transform, alpha and visibility are not applied. Its blend mode is
    /// inherited by the subtree.
    ///
    /// A flattened root with a valid cache is compiled from its cached batches.
    pub fn compile_into(
        &self,
        tree: &DisplayTree,
        root: NodeId,
        batches: &mut Vec<QuadBatch>,
    ) -> Result<()> {
        let base_blend = tree.props(root)?.blend_mode;
        self.compile_root(tree, root, base_blend, true, batches)
    }

    fn compile_root(
        &self,
        tree: &DisplayTree,
        root: NodeId,
        base_blend: BlendMode,
        use_flatten_cache: bool,
        batches: &mut Vec<QuadBatch>,
    ) -> Result<()> {
        match batches.first_mut() {
            Some(first) => first.reset(),
            None => batches.push(self.new_batch()),
        }
        let mut pass = Pass {
            compiler: self,
            tree,
            batches,
            cursor: 0,
        };
        pass.visit_content(
            root,
            &Matrix::IDENTITY,
            1.0,
            base_blend,
            base_blend,
            use_flatten_cache,
        )?;

        let cursor = pass.cursor;
        let used = if batches[cursor].is_empty() {
            cursor
        } else {
            cursor + 1
        };
        batches.truncate(used);

        log::debug!(
            "Compiled {:?} into {} batches ({} quads)",
            root,
            batches.len(),
            batches.iter().map(QuadBatch::num_quads).sum::<usize>()
        );
        Ok(())
    }

    /// Rebuild every stale flatten cache at or below `root`. Returns the number of
    /// caches rebuilt.
    pub fn refresh_flattened(&self, tree: &mut DisplayTree, root: NodeId) -> Result<usize> {
        let stale = tree.stale_flattened(root);
        for &id in &stale {
            let mut batches = tree.take_flattened_batches(id);
            self.compile_root(tree, id, BlendMode::Auto, false, &mut batches)?;
            log::debug!("Rebuilt flatten cache of {:?} ({} batches)", id, batches.len());
            tree.store_flattened_batches(id, batches);
        }
        Ok(stale.len())
    }

    fn new_batch(&self) -> QuadBatch {
        QuadBatch::with_limits(self.initial_capacity, self.max_quads_per_batch)
    }
}

/// Compile the subtree below `root` with default settings.
pub fn compile(tree: &DisplayTree, root: NodeId) -> Result<Vec<QuadBatch>> {
    BatchCompiler::default().compile(tree, root)
}

/// Like [`compile`], reusing the batches in `batches`.
pub fn compile_into(tree: &DisplayTree, root: NodeId, batches: &mut Vec<QuadBatch>) -> Result<()> {
    BatchCompiler::default().compile_into(tree, root, batches)
}

struct Pass<'a> {
    compiler: &'a BatchCompiler,
    tree: &'a DisplayTree,
    batches: &'a mut Vec<QuadBatch>,
    cursor: usize,
}

impl Pass<'_> {
    fn visit_child(
        &mut self,
        id: NodeId,
        parent_matrix: &Matrix,
        parent_alpha: f32,
        parent_blend: BlendMode,
    ) -> Result<()> {
        let props = self.tree.props(id)?;
        if !props.has_visible_area() {
            return Ok(());
        }
        let matrix = parent_matrix.prepended(&props.transformation_matrix());
        let alpha = parent_alpha * props.alpha;
        let blend = props.blend_mode.inherit(parent_blend);
        self.visit_content(id, &matrix, alpha, blend, props.blend_mode, true)
    }

    /// `blend` is the effective mode of `id`, `own_blend` the one set on the node
    /// itself.
    fn visit_content(
        &mut self,
        id: NodeId,
        matrix: &Matrix,
        alpha: f32,
        blend: BlendMode,
        own_blend: BlendMode,
        use_flatten_cache: bool,
    ) -> Result<()> {
        let tree = self.tree;
        match &tree.node(id)?.kind {
            NodeKind::Quad(quad) => self.add_quad(quad, matrix, alpha, blend),
            NodeKind::Batch(batch) => {
                // the node's own mode beats the one stored in the batch
                let blend = match own_blend {
                    BlendMode::Auto => batch.blend_mode().inherit(blend),
                    _ => blend,
                };
                self.add_batch(batch, matrix, alpha, blend);
            }
            NodeKind::Container(container) => {
                let cache = container
                    .flatten_cache()
                    .filter(|cache| use_flatten_cache && cache.is_valid());
                match cache {
                    Some(cache) => {
                        for batch in cache.batches() {
                            self.add_batch(batch, matrix, alpha, batch.blend_mode().inherit(blend));
                        }
                    }
                    None => {
                        for &child in container.children() {
                            self.visit_child(child, matrix, alpha, blend)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn advance(&mut self) {
        self.cursor += 1;
        if self.cursor == self.batches.len() {
            self.batches.push(self.compiler.new_batch());
        } else {
            self.batches[self.cursor].reset();
        }
    }

    fn add_quad(&mut self, quad: &Quad, matrix: &Matrix, alpha: f32, blend: BlendMode) {
        let blend = self.compiler.blend_override.unwrap_or(blend);
        let state = QuadBatch::quad_state(quad, alpha, blend);
        if self.batches[self.cursor].is_state_change_to(&state, 1) {
            log::trace!(
                "Batch {} closed at {} quads",
                self.cursor,
                self.batches[self.cursor].num_quads()
            );
            self.advance();
        }
        self.batches[self.cursor].add_quad(quad, alpha, blend, Some(matrix));
    }

    fn add_batch(&mut self, other: &QuadBatch, matrix: &Matrix, alpha: f32, blend: BlendMode) {
        let blend = self.compiler.blend_override.unwrap_or(blend);
        let state = QuadBatch::batch_state(other, alpha, blend);
        let total = other.num_quads();
        let mut first = 0;
        while first < total {
            let remaining = total - first;
            if self.batches[self.cursor].is_state_change_to(&state, remaining) {
                log::trace!(
                    "Batch {} closed at {} quads",
                    self.cursor,
                    self.batches[self.cursor].num_quads()
                );
                self.advance();
            }
            let current = &mut self.batches[self.cursor];
            let count = remaining.min(current.max_quads() - current.num_quads());
            current.add_quad_range(other, first, count, alpha, blend, Some(matrix));
            first += count;
        }
    }
}
