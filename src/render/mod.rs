//! Quads, batches and the compiler that turns a display tree into batches.

mod compiler;
mod quad;
mod quad_batch;
mod state;
mod support;
mod vertex;
mod vertex_data;

pub use compiler::{compile, compile_into, BatchCompiler};
pub use quad::Quad;
pub use quad_batch::{BatchGeometry, BatchId, QuadBatch, DEFAULT_CAPACITY, MAX_NUM_QUADS};
pub use state::{is_state_change, BatchState, TextureKey};
pub use support::{orthographic, FrameStats, StageRenderer};
pub use vertex::{Vertex, QUAD_INDICES};
pub use vertex_data::VertexData;
