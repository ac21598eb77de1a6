use anyhow::{Context as AnyhowContext, Result};
use image::RgbaImage;

use crate::types::Resolution;

/// Format of every texture the trail reads or writes. Unorm rather than
/// sRGB so captured bytes reach the shader unchanged.
pub const FRAME_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Device and queue without a presentation surface, for offscreen use.
pub struct HeadlessGpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    adapter_name: String,
}

impl HeadlessGpu {
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        tracing::debug!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            "selected GPU adapter"
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("motiontrail device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        Ok(Self {
            device,
            queue,
            adapter_name: info.name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Texture a host scene could render into; also accepts CPU uploads so
    /// recorded frames can stand in for a live render.
    pub fn create_render_target(&self, resolution: Resolution) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("trail render target"),
            size: extent(resolution),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    pub fn upload_image(&self, texture: &wgpu::Texture, image: &RgbaImage) {
        let resolution = image_resolution(image);
        let data = image.as_raw();
        let used = data.len().min(resolution.pixel_count() * 4);
        write_rgba(&self.queue, texture, &data[..used], resolution);
    }
}

pub(crate) fn extent(resolution: Resolution) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: resolution.width,
        height: resolution.height,
        depth_or_array_layers: 1,
    }
}

fn image_resolution(image: &RgbaImage) -> Resolution {
    Resolution::new(image.width(), image.height())
}

/// Writes tightly packed RGBA8 rows into mip 0 of `texture`.
pub(crate) fn write_rgba(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    data: &[u8],
    resolution: Resolution,
) {
    let expected_len = resolution.pixel_count() * 4;
    if data.len() != expected_len
        || texture.width() != resolution.width
        || texture.height() != resolution.height
    {
        tracing::warn!(
            expected_len,
            actual_len = data.len(),
            texture_width = texture.width(),
            texture_height = texture.height(),
            "texture upload ignored due to mismatched payload size"
        );
        return;
    }

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(resolution.width * 4),
            rows_per_image: Some(resolution.height),
        },
        extent(resolution),
    );
}
