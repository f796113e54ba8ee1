//! A retained-mode 2D display tree that renders through quad batches.
//!
//! Quads and prebuilt [`QuadBatch`]es are arranged in a [`DisplayTree`]. Each frame the
//! tree is compiled in paint order into the shortest list of batches that preserves
//! z-order, where a new batch starts whenever the render state (effect, texture,
//! tint, alpha convention, blend mode) changes or a batch is full. Every batch is then
//! drawn with a single indexed draw call through an [`EffectBinding`]; [`gpu`] provides
//! the wgpu implementation.
//!
//! ```
//! use perch::prelude::*;
//!
//! let mut tree = DisplayTree::new();
//! let root = tree.create_container();
//! for x in 0..3 {
//!     let quad = tree.create_quad(Quad::new(10.0, 10.0, Color::WHITE));
//!     tree.with_props_mut(quad, |p| p.x = x as f32 * 20.0).unwrap();
//!     tree.add_child(root, quad).unwrap();
//! }
//!
//! let batches = compile(&tree, root).unwrap();
//! assert_eq!(batches.len(), 1);
//! assert_eq!(batches[0].num_quads(), 3);
//! ```

pub mod blend;
pub mod color;
pub mod config;
pub mod display;
pub mod effect;
pub mod error;
pub mod geom;
pub mod gpu;
pub mod render;
pub mod texture;

pub use blend::BlendMode;
pub use color::Color;
pub use config::RenderConfig;
pub use display::{DisplayProps, DisplayTree, NodeId, NodeKind};
pub use effect::{
    DrawState, Effect, EffectBinding, Program, ProgramAttributes, Uniform, UniformType,
    UniformValue,
};
pub use error::{Error, Result};
pub use geom::{Matrix, Point, Rect};
pub use render::{
    compile, compile_into, BatchCompiler, FrameStats, Quad, QuadBatch, StageRenderer,
};
pub use texture::{Texture, TextureOptions, TextureSmoothing};

pub mod prelude {
    pub use crate::blend::BlendMode;
    pub use crate::color::Color;
    pub use crate::config::RenderConfig;
    pub use crate::display::{DisplayProps, DisplayTree, NodeId, NodeKind};
    pub use crate::effect::{
        add_global_uniform, base_effect, clear_global_uniforms, DrawState, Effect, EffectBinding,
        Program, ProgramAttributes, Uniform, UniformType, UniformValue,
    };
    pub use crate::error::{Error, Result};
    pub use crate::geom::{Matrix, Point, Rect};
    pub use crate::render::{
        compile, compile_into, BatchCompiler, BatchGeometry, FrameStats, Quad, QuadBatch,
        StageRenderer, VertexData,
    };
    pub use crate::texture::{Texture, TextureOptions, TextureSmoothing};
}
