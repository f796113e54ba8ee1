//! Per-frame driver: projection, flatten cache refresh, compilation and drawing.

use crate::blend::BlendMode;
use crate::config::RenderConfig;
use crate::display::{DisplayTree, NodeId};
use crate::effect::EffectBinding;
use crate::error::Result;
use crate::geom::Matrix;

use super::compiler::BatchCompiler;
use super::quad_batch::QuadBatch;

/// Counters for one rendered frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub batches: usize,
    pub quads: usize,
    pub draw_calls: usize,
    /// Flatten caches rebuilt during the frame
    pub flatten_rebuilds: usize,
}

/// Renders a display tree through an [`EffectBinding`], keeping compiled batches
/// between frames.
pub struct StageRenderer {
    config: RenderConfig,
    compiler: BatchCompiler,
    batches: Vec<QuadBatch>,
    projection: Matrix,
}

impl StageRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            compiler: BatchCompiler::from_config(&config),
            config,
            batches: Vec::new(),
            projection: Matrix::IDENTITY,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn compiler(&self) -> &BatchCompiler {
        &self.compiler
    }

    pub fn set_compiler(&mut self, compiler: BatchCompiler) {
        self.compiler = compiler;
    }

    /// Map the rectangle `(x, y, width, height)` of stage space onto clip space,
    /// y pointing down.
    pub fn set_projection(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.projection = orthographic(x, y, width, height);
    }

    pub fn projection(&self) -> &Matrix {
        &self.projection
    }

    /// Batches compiled for the last frame.
    pub fn batches(&self) -> &[QuadBatch] {
        &self.batches
    }

    /// Draw the subtree below `root`.
    ///
    /// Unlike plain compilation, the root's own transform and alpha apply here: the
    /// transform goes into the MVP matrix and the alpha into the tint of every batch.
    pub fn render<B: EffectBinding + ?Sized>(
        &mut self,
        tree: &mut DisplayTree,
        root: NodeId,
        binding: &mut B,
    ) -> Result<FrameStats> {
        let props = tree.props(root)?;
        if !props.has_visible_area() {
            self.batches.clear();
            return Ok(FrameStats::default());
        }
        let alpha = props.alpha;
        let mvp = self.projection.prepended(&props.transformation_matrix());

        let flatten_rebuilds = self.compiler.refresh_flattened(tree, root)?;
        self.compiler.compile_into(tree, root, &mut self.batches)?;

        let mut stats = FrameStats {
            flatten_rebuilds,
            ..FrameStats::default()
        };
        for batch in &self.batches {
            batch.render(binding, &mvp, alpha, BlendMode::Auto)?;
            stats.batches += 1;
            stats.quads += batch.num_quads();
            if !batch.is_empty() {
                stats.draw_calls += 1;
            }
        }

        if self.config.log_frame_stats {
            log::debug!(
                "Frame: {} batches, {} quads, {} draw calls, {} flatten rebuilds",
                stats.batches,
                stats.quads,
                stats.draw_calls,
                stats.flatten_rebuilds
            );
        }
        Ok(stats)
    }
}

/// Orthographic projection of a stage rectangle onto clip space.
pub fn orthographic(x: f32, y: f32, width: f32, height: f32) -> Matrix {
    Matrix::new(
        2.0 / width,
        0.0,
        0.0,
        -2.0 / height,
        -(2.0 * x + width) / width,
        (2.0 * y + height) / height,
    )
}
