//! [`EffectBinding`] implementation recording draws for a wgpu render pass.
//!
//! Draws are collected by `prepare_to_draw`/`draw` and replayed by
//! [`WgpuBinding::encode`] in one render pass, in submission order.

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use wgpu::{BindGroup, Buffer, BufferUsages, Device, Queue, RenderPipeline, Sampler, TextureView};

use crate::blend::BlendMode;
use crate::effect::{DrawState, Effect, EffectBinding, UniformValue, UNIFORM_SLOT_SIZE};
use crate::error::{Error, Result};
use crate::render::{BatchGeometry, BatchId};
use crate::texture::{Texture, TextureId, TextureSmoothing};

use super::context::GpuContext;
use super::pipeline::PipelineCache;

struct GeometryBuffers {
    generation: u64,
    vertex: Buffer,
    index: Buffer,
    index_count: u32,
    used_this_frame: bool,
}

struct Prepared {
    pipeline: RenderPipeline,
    bind_group: BindGroup,
}

struct PendingDraw {
    pipeline: RenderPipeline,
    bind_group: BindGroup,
    vertex: Buffer,
    index: Buffer,
    index_count: u32,
}

pub struct WgpuBinding {
    device: Arc<Device>,
    queue: Arc<Queue>,
    pipelines: PipelineCache,
    textures: HashMap<TextureId, TextureView>,
    samplers: HashMap<(TextureSmoothing, bool), Sampler>,
    geometry: HashMap<BatchId, GeometryBuffers>,
    uniform_pool: Vec<Buffer>,
    uniform_cursor: usize,
    uniform_bytes: Vec<u8>,
    prepared: Option<Prepared>,
    pending: Vec<PendingDraw>,
}

impl WgpuBinding {
    pub fn new(context: &GpuContext, format: wgpu::TextureFormat) -> Self {
        Self {
            device: context.device.clone(),
            queue: context.queue.clone(),
            pipelines: PipelineCache::new(format),
            textures: HashMap::new(),
            samplers: HashMap::new(),
            geometry: HashMap::new(),
            uniform_pool: Vec::new(),
            uniform_cursor: 0,
            uniform_bytes: Vec::new(),
            prepared: None,
            pending: Vec::new(),
        }
    }

    /// Upload the pixels of `texture`'s base texture as tightly packed RGBA8 rows.
    /// Sub-textures share the upload of their base.
    pub fn upload_texture(&mut self, texture: &Texture, rgba: &[u8]) -> Result<()> {
        let width = texture.native_width();
        let height = texture.native_height();
        let expected = 4 * width as usize * height as usize;
        if rgba.len() != expected {
            return Err(Error::InvalidOperation(format!(
                "texture data is {} bytes, expected {expected}",
                rgba.len()
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let gpu_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Perch Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures.insert(texture.id(), view);
        log::debug!("Uploaded texture {:?} ({}x{})", texture.id(), width, height);
        Ok(())
    }

    pub fn release_texture(&mut self, id: TextureId) -> bool {
        self.textures.remove(&id).is_some()
    }

    pub fn num_pending_draws(&self) -> usize {
        self.pending.len()
    }

    pub fn pipelines(&self) -> &PipelineCache {
        &self.pipelines
    }

    /// Replay every recorded draw into one render pass on `view`, then start a new
    /// frame. `clear` clears the target first; `None` keeps its content.
    pub fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &TextureView,
        clear: Option<wgpu::Color>,
    ) {
        {
            let load = match clear {
                Some(color) => wgpu::LoadOp::Clear(color),
                None => wgpu::LoadOp::Load,
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Perch Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &self.pending {
                render_pass.set_pipeline(&draw.pipeline);
                render_pass.set_bind_group(0, &draw.bind_group, &[]);
                render_pass.set_vertex_buffer(0, draw.vertex.slice(..));
                render_pass.set_index_buffer(draw.index.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        log::trace!("Encoded {} draws", self.pending.len());
        self.pending.clear();
        self.prepared = None;
        self.uniform_cursor = 0;
        // batches not drawn this frame give up their buffers
        self.geometry.retain(|_, buffers| buffers.used_this_frame);
        for buffers in self.geometry.values_mut() {
            buffers.used_this_frame = false;
        }
    }

    /// Encode and submit the recorded draws in their own command buffer.
    pub fn submit(&mut self, view: &TextureView, clear: Option<wgpu::Color>) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Perch Encoder"),
            });
        self.encode(&mut encoder, view, clear);
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn sampler(&mut self, smoothing: TextureSmoothing, repeat: bool) -> Sampler {
        let device = &self.device;
        self.samplers
            .entry((smoothing, repeat))
            .or_insert_with(|| {
                let address_mode = if repeat {
                    wgpu::AddressMode::Repeat
                } else {
                    wgpu::AddressMode::ClampToEdge
                };
                let (filter, mipmap_filter) = match smoothing {
                    TextureSmoothing::None => {
                        (wgpu::FilterMode::Nearest, wgpu::MipmapFilterMode::Nearest)
                    }
                    TextureSmoothing::Bilinear => {
                        (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Nearest)
                    }
                    TextureSmoothing::Trilinear => {
                        (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Linear)
                    }
                };
                device.create_sampler(&wgpu::SamplerDescriptor {
                    label: Some("Perch Sampler"),
                    address_mode_u: address_mode,
                    address_mode_v: address_mode,
                    address_mode_w: address_mode,
                    mag_filter: filter,
                    min_filter: filter,
                    mipmap_filter,
                    ..Default::default()
                })
            })
            .clone()
    }

    /// A uniform buffer holding `self.uniform_bytes`, taken from the frame's pool.
    fn uniform_buffer(&mut self) -> Buffer {
        let size = self.uniform_bytes.len() as u64;
        let index = self.uniform_cursor;
        self.uniform_cursor += 1;

        let reusable = self
            .uniform_pool
            .get(index)
            .is_some_and(|buffer| buffer.size() >= size);
        if !reusable {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Perch Uniform Buffer"),
                size,
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            if index < self.uniform_pool.len() {
                self.uniform_pool[index] = buffer;
            } else {
                self.uniform_pool.push(buffer);
            }
        }
        let buffer = self.uniform_pool[index].clone();
        self.queue.write_buffer(&buffer, 0, &self.uniform_bytes);
        buffer
    }

    fn geometry_buffers(&mut self, geometry: &BatchGeometry<'_>) -> (Buffer, Buffer) {
        let vertices: &[u8] = bytemuck::cast_slice(geometry.vertices);
        let indices: &[u8] = bytemuck::cast_slice(geometry.indices);

        if let Some(cached) = self.geometry.get_mut(&geometry.batch) {
            if cached.generation == geometry.generation
                && cached.index_count as usize == geometry.indices.len()
            {
                cached.used_this_frame = true;
                return (cached.vertex.clone(), cached.index.clone());
            }
            // a buffer already queued this frame must keep its content
            if cached.used_this_frame {
                log::trace!("Batch {:?} changed mid-frame, using transient buffers", geometry.batch);
                return (
                    create_buffer(&self.device, vertices, BufferUsages::VERTEX),
                    create_buffer(&self.device, indices, BufferUsages::INDEX),
                );
            }
            if cached.vertex.size() >= vertices.len() as u64
                && cached.index.size() >= indices.len() as u64
            {
                self.queue.write_buffer(&cached.vertex, 0, vertices);
                self.queue.write_buffer(&cached.index, 0, indices);
                cached.generation = geometry.generation;
                cached.index_count = geometry.indices.len() as u32;
                cached.used_this_frame = true;
                return (cached.vertex.clone(), cached.index.clone());
            }
        }

        let buffers = GeometryBuffers {
            generation: geometry.generation,
            vertex: create_buffer(&self.device, vertices, BufferUsages::VERTEX),
            index: create_buffer(&self.device, indices, BufferUsages::INDEX),
            index_count: geometry.indices.len() as u32,
            used_this_frame: true,
        };
        let result = (buffers.vertex.clone(), buffers.index.clone());
        self.geometry.insert(geometry.batch, buffers);
        result
    }
}

fn create_buffer(device: &Device, contents: &[u8], usage: BufferUsages) -> Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Perch Geometry Buffer"),
        contents,
        usage: usage | BufferUsages::COPY_DST,
    })
}

impl EffectBinding for WgpuBinding {
    fn prepare_to_draw(&mut self, effect: &Effect, state: &DrawState) -> Result<()> {
        let program = effect.program();
        program.validate()?;
        let uniforms = effect.resolve_uniforms(state)?;

        self.uniform_bytes.clear();
        let mut texture = None;
        for decl in program.uniforms() {
            match uniforms.iter().find(|u| u.name() == decl.name) {
                Some(uniform) => match uniform.value() {
                    UniformValue::Texture(t) => texture = Some(t.clone()),
                    value => value.write_slots(&mut self.uniform_bytes),
                },
                None => {
                    log::warn!(
                        "Uniform '{}' of program '{}' has no value, uploading zeros",
                        decl.name,
                        program.name()
                    );
                    let len = self.uniform_bytes.len() + decl.ty.slots() * UNIFORM_SLOT_SIZE;
                    self.uniform_bytes.resize(len, 0);
                }
            }
        }
        if state.blend_mode == BlendMode::Auto {
            log::warn!("Drawing with an unresolved blend mode, using Normal");
        }

        let pipeline = self.pipelines.get_or_create(
            &self.device,
            program,
            state.blend_mode.resolve(),
            state.premultiplied_alpha,
        );
        let layout = self.pipelines.bind_group_layout(&self.device, program);

        let uniform_buffer = if program.uniform_buffer_size() > 0 {
            Some(self.uniform_buffer())
        } else {
            None
        };

        let texture_binding = if program.has_texture() {
            let texture = texture.ok_or_else(|| {
                Error::InvalidOperation(format!(
                    "program '{}' samples a texture but none is set",
                    program.name()
                ))
            })?;
            let view = self
                .textures
                .get(&texture.id())
                .cloned()
                .ok_or(Error::UnknownTexture(texture.id()))?;
            let sampler = self.sampler(texture.smoothing(), texture.repeat());
            Some((view, sampler))
        } else {
            None
        };

        let mut entries = Vec::with_capacity(3);
        if let Some(buffer) = &uniform_buffer {
            entries.push(wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            });
        }
        if let Some((view, sampler)) = &texture_binding {
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(program.name()),
            layout: &layout,
            entries: &entries,
        });

        self.prepared = Some(Prepared {
            pipeline,
            bind_group,
        });
        Ok(())
    }

    fn draw(&mut self, geometry: BatchGeometry<'_>) -> Result<()> {
        if geometry.indices.is_empty() {
            return Ok(());
        }
        let Some(prepared) = self.prepared.take() else {
            return Err(Error::InvalidOperation(
                "draw called without prepare_to_draw".into(),
            ));
        };
        let (vertex, index) = self.geometry_buffers(&geometry);
        self.pending.push(PendingDraw {
            pipeline: prepared.pipeline,
            bind_group: prepared.bind_group,
            vertex,
            index,
            index_count: geometry.indices.len() as u32,
        });
        Ok(())
    }
}
