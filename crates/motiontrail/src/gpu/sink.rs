use crate::frame::FrameSlot;
use crate::sink::ShaderParameterSink;
use crate::types::{
    parse_frame_parameter, Resolution, Rgba, COLORS_PARAM, DELAY_FRAMES_PARAM,
    FRAME_DELAY_LIMIT, MAX_COLOR_PARAM, SECTION_CAPACITY, SECTION_COUNT_PARAM, THRESHOLDS_PARAM,
};

use super::context::{extent, write_rgba, FRAME_TEXTURE_FORMAT};
use super::uniforms::TrailUniforms;

pub const UNIFORM_BINDING: u32 = 0;
pub const SAMPLER_BINDING: u32 = 1;
/// `_Frame<N>` is bound at `FIRST_FRAME_BINDING + N`.
pub const FIRST_FRAME_BINDING: u32 = 2;

struct FrameTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Sink that writes trail parameters into wgpu resources: one texture per
/// history slot plus a uniform block for the gradient and counters.
///
/// Texture uploads go straight to the queue; uniform changes are batched
/// until [`GpuParameterSink::flush`].
pub struct GpuParameterSink {
    queue: wgpu::Queue,
    resolution: Resolution,
    frames: Vec<FrameTexture>,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    uniforms: TrailUniforms,
    uniforms_dirty: bool,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GpuParameterSink {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, resolution: Resolution) -> Self {
        let frames: Vec<FrameTexture> = (0..FRAME_DELAY_LIMIT)
            .map(|index| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&format!("trail frame texture #{index}")),
                    size: extent(resolution),
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: FRAME_TEXTURE_FORMAT,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::COPY_DST
                        | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                FrameTexture { texture, view }
            })
            .collect();

        // Nearest everywhere: the shader compares exact pixel colors.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("trail frame sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniforms = TrailUniforms::new();
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trail uniforms"),
            size: std::mem::size_of::<TrailUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = create_bind_group_layout(device);

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: UNIFORM_BINDING,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ];
        entries.extend(frames.iter().enumerate().map(|(index, frame)| {
            wgpu::BindGroupEntry {
                binding: FIRST_FRAME_BINDING + index as u32,
                resource: wgpu::BindingResource::TextureView(&frame.view),
            }
        }));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("trail bind group"),
            layout: &layout,
            entries: &entries,
        });

        let mut sink = Self {
            queue: queue.clone(),
            resolution,
            frames,
            sampler,
            uniform_buffer,
            uniforms,
            uniforms_dirty: true,
            layout,
            bind_group,
        };
        sink.flush();
        sink
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn frame_texture(&self, index: usize) -> Option<&wgpu::Texture> {
        self.frames.get(index).map(|frame| &frame.texture)
    }

    /// Writes the uniform block if any parameter changed since the last
    /// flush. Call once per tick before submitting the compositing pass.
    pub fn flush(&mut self) {
        if !self.uniforms_dirty {
            return;
        }
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );
        self.uniforms_dirty = false;
    }

    fn ignore(name: &str, kind: &str) {
        tracing::warn!(parameter = name, kind, "unknown trail shader parameter; ignoring");
    }
}

fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        wgpu::BindGroupLayoutEntry {
            binding: UNIFORM_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
            count: None,
        },
    ];
    entries.extend((0..FRAME_DELAY_LIMIT as u32).map(|index| wgpu::BindGroupLayoutEntry {
        binding: FIRST_FRAME_BINDING + index,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }));

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("trail bind group layout"),
        entries: &entries,
    })
}

impl ShaderParameterSink for GpuParameterSink {
    fn set_int(&mut self, name: &str, value: i32) {
        match name {
            DELAY_FRAMES_PARAM => {
                self.uniforms.delay_frames = value.clamp(0, FRAME_DELAY_LIMIT as i32);
            }
            SECTION_COUNT_PARAM => self.uniforms.set_section_count(value),
            _ => return Self::ignore(name, "int"),
        }
        self.uniforms_dirty = true;
    }

    fn set_color(&mut self, name: &str, color: Rgba) {
        if name != MAX_COLOR_PARAM {
            return Self::ignore(name, "color");
        }
        self.uniforms.set_max_color(color);
        self.uniforms_dirty = true;
    }

    fn set_color_array(&mut self, name: &str, colors: &[Rgba]) {
        if name != COLORS_PARAM {
            return Self::ignore(name, "color array");
        }
        let dropped = self.uniforms.set_colors(colors);
        if dropped > 0 {
            tracing::warn!(dropped, capacity = SECTION_CAPACITY, "gradient colors truncated");
        }
        self.uniforms_dirty = true;
    }

    fn set_float_array(&mut self, name: &str, values: &[f32]) {
        if name != THRESHOLDS_PARAM {
            return Self::ignore(name, "float array");
        }
        let dropped = self.uniforms.set_thresholds(values);
        if dropped > 0 {
            tracing::warn!(dropped, capacity = SECTION_CAPACITY, "gradient thresholds truncated");
        }
        self.uniforms_dirty = true;
    }

    fn set_frame(&mut self, name: &str, slot: &FrameSlot) {
        let Some(index) = parse_frame_parameter(name) else {
            return Self::ignore(name, "frame");
        };
        if slot.resolution() != self.resolution {
            tracing::warn!(
                parameter = name,
                slot = %slot.resolution(),
                textures = %self.resolution,
                "frame upload ignored due to resolution mismatch"
            );
            return;
        }
        write_rgba(
            &self.queue,
            &self.frames[index].texture,
            slot.pixels(),
            self.resolution,
        );
        self.uniforms.latest_frame = index as i32;
        self.uniforms_dirty = true;
    }
}
