use std::sync::Arc;

use wgpu::{Device, Instance, Queue, TextureFormat};

use crate::error::{Error, Result};

/// Format of offscreen targets created by [`GpuContext::create_target`].
pub const TARGET_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

pub struct GpuContext {
    pub instance: Instance,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Open a device without any surface, for offscreen rendering.
    pub fn new_headless() -> Result<Self> {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| {
            log::error!("Failed to find GPU adapter: {e}");
            Error::Gpu(format!("Failed to find GPU adapter: {e}"))
        })?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using adapter {} ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Perch Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| {
            log::error!("Failed to create device: {e}");
            Error::Gpu(format!("Failed to create device: {e}"))
        })?;

        Ok(Self {
            instance,
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        })
    }

    /// An offscreen colour target of `width` x `height` pixels.
    pub fn create_target(&self, width: u32, height: u32) -> RenderTarget {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Perch Render Target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        RenderTarget {
            texture,
            view,
            width,
            height,
        }
    }
}

pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn format(&self) -> TextureFormat {
        TARGET_FORMAT
    }
}
