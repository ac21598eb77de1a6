use bytemuck::{Pod, Zeroable};

use crate::types::{Rgba, SECTION_CAPACITY};

/// std140 mirror of the compositing shader's parameter block.
///
/// Thresholds sit in the `x` lane of 16-byte elements because std140 pads
/// scalar array elements to a full vec4 stride.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
pub(crate) struct TrailUniforms {
    pub max_color: [f32; 4],
    pub colors: [[f32; 4]; SECTION_CAPACITY],
    pub thresholds: [[f32; 4]; SECTION_CAPACITY],
    pub delay_frames: i32,
    pub section_count: i32,
    pub latest_frame: i32,
    pub _padding: i32,
}

unsafe impl Zeroable for TrailUniforms {}
unsafe impl Pod for TrailUniforms {}

impl TrailUniforms {
    pub fn new() -> Self {
        Self {
            max_color: Rgba::WHITE.to_array(),
            colors: [[0.0; 4]; SECTION_CAPACITY],
            thresholds: [[0.0; 4]; SECTION_CAPACITY],
            delay_frames: 0,
            section_count: 0,
            latest_frame: -1,
            _padding: 0,
        }
    }

    pub fn set_max_color(&mut self, color: Rgba) {
        self.max_color = color.to_array();
    }

    /// Copies up to [`SECTION_CAPACITY`] colors and zeroes the rest.
    /// Returns how many were dropped.
    pub fn set_colors(&mut self, colors: &[Rgba]) -> usize {
        for (index, slot) in self.colors.iter_mut().enumerate() {
            *slot = colors.get(index).map(|c| c.to_array()).unwrap_or([0.0; 4]);
        }
        colors.len().saturating_sub(SECTION_CAPACITY)
    }

    pub fn set_thresholds(&mut self, thresholds: &[f32]) -> usize {
        for (index, slot) in self.thresholds.iter_mut().enumerate() {
            *slot = [thresholds.get(index).copied().unwrap_or(0.0), 0.0, 0.0, 0.0];
        }
        thresholds.len().saturating_sub(SECTION_CAPACITY)
    }

    pub fn set_section_count(&mut self, count: i32) {
        self.section_count = count.clamp(0, SECTION_CAPACITY as i32);
    }
}
