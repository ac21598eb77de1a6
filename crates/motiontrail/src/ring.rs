use crate::error::{CaptureError, ConfigError};
use crate::frame::{FrameSlot, FrameSource};
use crate::types::{Resolution, FRAME_DELAY_LIMIT};

/// Fixed-capacity history of captured frames.
///
/// Every slot is allocated up front at the full resolution and then
/// overwritten in place, so changing how many slots are in use never
/// reallocates.
#[derive(Debug)]
pub struct FrameRingBuffer {
    resolution: Resolution,
    slots: Box<[FrameSlot]>,
}

impl FrameRingBuffer {
    pub fn new(resolution: Resolution, capacity: usize) -> Result<Self, ConfigError> {
        if resolution.is_empty() {
            return Err(ConfigError::InvalidResolution(resolution));
        }
        if capacity == 0 || capacity > FRAME_DELAY_LIMIT {
            return Err(ConfigError::InvalidCapacity(capacity));
        }

        let slots = (0..capacity)
            .map(|_| FrameSlot::blank(resolution))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        tracing::debug!(%resolution, capacity, "allocated frame history");
        Ok(Self { resolution, slots })
    }

    /// Ring sized for the shader's full frame array.
    pub fn with_limit(resolution: Resolution) -> Result<Self, ConfigError> {
        Self::new(resolution, FRAME_DELAY_LIMIT)
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Overwrites slot `index` with the full contents of `source`. No other
    /// slot is touched, and on error the target slot keeps its old pixels.
    pub fn capture<S>(&mut self, index: usize, source: &S) -> Result<(), CaptureError>
    where
        S: FrameSource + ?Sized,
    {
        let capacity = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(CaptureError::SlotOutOfRange { index, capacity })?;

        let actual = source.resolution();
        if actual != self.resolution {
            return Err(CaptureError::ResolutionMismatch {
                expected: self.resolution,
                actual,
            });
        }

        source.read_pixels(slot.image_mut())?;
        slot.mark_captured();
        tracing::trace!(slot = index, captures = slot.captures(), "captured frame");
        Ok(())
    }

    pub fn slot_at(&self, index: usize) -> Option<&FrameSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[FrameSlot] {
        &self.slots
    }
}
