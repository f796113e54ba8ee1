//! wgpu backend: device setup, pipelines and the [`EffectBinding`](crate::effect::EffectBinding)
//! that records batch draws into a render pass.

mod binding;
mod context;
mod pipeline;

pub use binding::WgpuBinding;
pub use context::{GpuContext, RenderTarget, TARGET_FORMAT};
pub use pipeline::PipelineCache;
