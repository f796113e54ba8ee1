//! Render pipelines per program, blend mode and alpha convention.

use std::collections::HashMap;

use wgpu::{BindGroupLayout, Device, RenderPipeline, TextureFormat, VertexAttribute};

use crate::blend::BlendMode;
use crate::effect::{Program, ProgramId};
use crate::render::Vertex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    blend_mode: BlendMode,
    premultiplied_alpha: bool,
}

/// Per-program objects shared by all of its pipelines.
struct ProgramResources {
    shader: wgpu::ShaderModule,
    bind_group_layout: BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    attributes: Vec<VertexAttribute>,
}

pub struct PipelineCache {
    format: TextureFormat,
    programs: HashMap<ProgramId, ProgramResources>,
    pipelines: HashMap<PipelineKey, RenderPipeline>,
}

impl PipelineCache {
    pub fn new(format: TextureFormat) -> Self {
        Self {
            format,
            programs: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Layout of bind group 0 for `program`.
    pub fn bind_group_layout(&mut self, device: &Device, program: &Program) -> BindGroupLayout {
        self.program_resources(device, program)
            .bind_group_layout
            .clone()
    }

    /// The pipeline drawing `program` with an already resolved `blend_mode`.
    pub fn get_or_create(
        &mut self,
        device: &Device,
        program: &Program,
        blend_mode: BlendMode,
        premultiplied_alpha: bool,
    ) -> RenderPipeline {
        let key = PipelineKey {
            program: program.id(),
            blend_mode,
            premultiplied_alpha,
        };
        if let Some(pipeline) = self.pipelines.get(&key) {
            return pipeline.clone();
        }

        let format = self.format;
        let resources = self.program_resources(device, program);
        log::debug!(
            "Creating pipeline for program '{}' ({:?}, premultiplied: {})",
            program.name(),
            blend_mode,
            premultiplied_alpha
        );
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(program.name()),
            layout: Some(&resources.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &resources.shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(&resources.attributes)],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &resources.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend_mode.blend_state(premultiplied_alpha)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        self.pipelines.insert(key, pipeline.clone());
        pipeline
    }

    fn program_resources(&mut self, device: &Device, program: &Program) -> &ProgramResources {
        self.programs
            .entry(program.id())
            .or_insert_with(|| create_program_resources(device, program))
    }
}

fn create_program_resources(device: &Device, program: &Program) -> ProgramResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(program.name()),
        source: wgpu::ShaderSource::Wgsl(program.source().into()),
    });

    let mut entries = Vec::with_capacity(3);
    if program.uniform_buffer_size() > 0 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    }
    if program.has_texture() {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(program.name()),
        entries: &entries,
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(program.name()),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    ProgramResources {
        shader,
        bind_group_layout,
        pipeline_layout,
        attributes: Vertex::attributes(program.attributes()),
    }
}
