use std::sync::mpsc;

use anyhow::{anyhow, bail, ensure, Result};
use image::RgbaImage;

use crate::error::CaptureError;
use crate::frame::FrameSource;
use crate::types::Resolution;

use super::context::extent;

fn align_bytes_per_row(value: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    value.div_ceil(align) * align
}

/// Blocking copy of an RGBA8 texture into a tightly packed CPU buffer.
pub fn read_texture_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> Result<Vec<u8>> {
    let resolution = Resolution::new(texture.width(), texture.height());
    ensure!(!resolution.is_empty(), "readback size must be positive");
    ensure!(
        texture.sample_count() == 1,
        "readback requires a single-sample texture, got {}",
        texture.sample_count()
    );
    match texture.format() {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => {}
        other => bail!("readback only supports RGBA8 textures, got {other:?}"),
    }

    let tight_bpr = resolution.width * 4;
    let padded_bpr = align_bytes_per_row(tight_bpr);
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("trail readback staging"),
        size: u64::from(padded_bpr) * u64::from(resolution.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("trail readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(resolution.height),
            },
        },
        extent(resolution),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device
        .poll(wgpu::PollType::Wait)
        .map_err(|err| anyhow!("device poll failed during readback: {err}"))?;
    receiver
        .recv()
        .map_err(|_| anyhow!("map_async callback channel dropped"))?
        .map_err(|err| anyhow!("failed to map readback buffer: {err}"))?;

    let data = slice.get_mapped_range();
    let tight_len = tight_bpr as usize;
    let mut tight = Vec::with_capacity(tight_len * resolution.height as usize);
    for row in data.chunks(padded_bpr as usize) {
        tight.extend_from_slice(&row[..tight_len]);
    }
    drop(data);
    staging.unmap();

    Ok(tight)
}

/// GPU-resident render output used as a capture source. Every read is a
/// blocking readback.
pub struct TextureSource<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    texture: &'a wgpu::Texture,
}

impl<'a> TextureSource<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue, texture: &'a wgpu::Texture) -> Self {
        Self {
            device,
            queue,
            texture,
        }
    }
}

impl FrameSource for TextureSource<'_> {
    fn resolution(&self) -> Resolution {
        Resolution::new(self.texture.width(), self.texture.height())
    }

    fn read_pixels(&self, target: &mut RgbaImage) -> Result<(), CaptureError> {
        let pixels = read_texture_rgba(self.device, self.queue, self.texture)
            .map_err(|err| CaptureError::Readback(format!("{err:#}")))?;
        let destination: &mut [u8] = target;
        if pixels.len() != destination.len() {
            return Err(CaptureError::Readback(format!(
                "read {} bytes, expected {}",
                pixels.len(),
                destination.len()
            )));
        }
        destination.copy_from_slice(&pixels);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(align_bytes_per_row(4), 256);
        assert_eq!(align_bytes_per_row(256), 256);
        assert_eq!(align_bytes_per_row(100 * 4), 512);
        assert_eq!(align_bytes_per_row(1920 * 4), 1920 * 4);
    }
}
