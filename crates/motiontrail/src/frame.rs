use image::RgbaImage;

use crate::error::CaptureError;
use crate::types::Resolution;

/// Anything that can hand over the currently rendered image.
///
/// `read_pixels` is only called after the caller has checked that
/// `resolution()` matches the destination, and must either fill `target`
/// completely or leave it untouched and return an error.
pub trait FrameSource {
    fn resolution(&self) -> Resolution;

    fn read_pixels(&self, target: &mut RgbaImage) -> Result<(), CaptureError>;
}

impl FrameSource for RgbaImage {
    fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    fn read_pixels(&self, target: &mut RgbaImage) -> Result<(), CaptureError> {
        let destination: &mut [u8] = target;
        // `from_raw` accepts containers longer than the image; only the
        // leading `width * height` pixels belong to it.
        let pixels = self.as_raw().get(..destination.len()).ok_or_else(|| {
            CaptureError::Readback(format!(
                "source holds {} bytes, expected {}",
                self.as_raw().len(),
                destination.len()
            ))
        })?;
        destination.copy_from_slice(pixels);
        Ok(())
    }
}

/// One history entry: an uncompressed RGBA8 image at the ring resolution.
#[derive(Debug, Clone)]
pub struct FrameSlot {
    image: RgbaImage,
    captures: u64,
}

impl FrameSlot {
    /// Transparent black slot, so the shader sees "no motion" until the
    /// slot is first written.
    pub(crate) fn blank(resolution: Resolution) -> Self {
        Self {
            image: RgbaImage::new(resolution.width, resolution.height),
            captures: 0,
        }
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub(crate) fn mark_captured(&mut self) {
        self.captures = self.captures.saturating_add(1);
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.image.width(), self.image.height())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA8 bytes, row-major, top row first.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// How many times this slot has been overwritten.
    pub fn captures(&self) -> u64 {
        self.captures
    }
}
