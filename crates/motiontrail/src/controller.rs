use crate::config::{validate_delay_count, validate_sections, EffectConfig};
use crate::error::{CaptureError, ConfigError};
use crate::frame::FrameSource;
use crate::ring::FrameRingBuffer;
use crate::sink::ShaderParameterSink;
use crate::types::{
    frame_parameter_name, Rgba, Section, COLORS_PARAM, DELAY_FRAMES_PARAM, MAX_COLOR_PARAM,
    SECTION_COUNT_PARAM, THRESHOLDS_PARAM,
};

/// What a single tick ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Delay count is zero: configuration was pushed, nothing captured.
    Disabled,
    /// The frame was captured into `slot` and uploaded.
    Captured { slot: usize },
    /// Capture failed; the slot and index were left as they were.
    Skipped(CaptureError),
}

/// Owns the effect configuration and frame history and drives the per-tick
/// cycle against a [`ShaderParameterSink`].
#[derive(Debug)]
pub struct EffectController {
    config: EffectConfig,
    ring: FrameRingBuffer,
    current_index: usize,
    ticks: u64,
}

impl EffectController {
    /// Validates `config` and only then allocates the full frame history.
    pub fn new(config: EffectConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ring = FrameRingBuffer::with_limit(config.resolution)?;
        tracing::info!(
            resolution = %config.resolution,
            delay_frames = config.delay_count,
            sections = config.sections.len(),
            "motion trail initialised"
        );
        Ok(Self {
            config,
            ring,
            current_index: 0,
            ticks: 0,
        })
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn ring(&self) -> &FrameRingBuffer {
        &self.ring
    }

    /// Slot the next capture writes to.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn delay_count(&self) -> usize {
        self.config.delay_count
    }

    pub fn is_active(&self) -> bool {
        self.config.is_enabled()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Changes how many trailing frames are in use.
    ///
    /// Re-enabling from zero restarts the trail at slot 0. Shrinking the
    /// window below the current index wraps to slot 0; slots past the new
    /// window keep their stale pixels until the window grows again.
    pub fn set_delay_count(&mut self, delay_count: usize) -> Result<(), ConfigError> {
        validate_delay_count(delay_count)?;
        let previous = self.config.delay_count;
        self.config.delay_count = delay_count;

        if delay_count == 0 {
            if previous != 0 {
                tracing::debug!("motion trail disabled");
            }
            return Ok(());
        }

        if previous == 0 {
            tracing::debug!(delay_frames = delay_count, "motion trail enabled");
            self.current_index = 0;
        } else if self.current_index >= delay_count {
            self.current_index = 0;
        }
        Ok(())
    }

    pub fn set_sections(&mut self, sections: Vec<Section>) -> Result<(), ConfigError> {
        validate_sections(&sections)?;
        self.config.sections = sections;
        Ok(())
    }

    pub fn set_max_color(&mut self, color: Rgba) {
        self.config.max_color = color;
    }

    /// Applies a whole edited configuration. The resolution is fixed once
    /// the history is allocated.
    pub fn apply(&mut self, config: EffectConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config.resolution != self.config.resolution {
            return Err(ConfigError::ResolutionChanged {
                current: self.config.resolution,
                requested: config.resolution,
            });
        }
        self.set_delay_count(config.delay_count)?;
        self.config.max_color = config.max_color;
        self.config.sections = config.sections;
        Ok(())
    }

    /// Pushes the delay count, max color and gradient to `sink`.
    pub fn sync_parameters<S>(&self, sink: &mut S)
    where
        S: ShaderParameterSink + ?Sized,
    {
        sink.set_int(DELAY_FRAMES_PARAM, self.config.delay_count as i32);
        sink.set_color(MAX_COLOR_PARAM, self.config.max_color);
        sink.set_color_array(COLORS_PARAM, &self.config.section_colors());
        sink.set_float_array(THRESHOLDS_PARAM, &self.config.section_thresholds());
        sink.set_int(SECTION_COUNT_PARAM, self.config.sections.len() as i32);
    }

    /// Captures `source` into the current slot, uploads that slot and
    /// advances the index. Returns the written slot, or `None` while the
    /// effect is disabled.
    pub fn capture_and_upload<F, S>(
        &mut self,
        source: &F,
        sink: &mut S,
    ) -> Result<Option<usize>, CaptureError>
    where
        F: FrameSource + ?Sized,
        S: ShaderParameterSink + ?Sized,
    {
        if !self.is_active() {
            return Ok(None);
        }

        let slot_index = self.current_index;
        self.ring.capture(slot_index, source)?;
        let slot = self
            .ring
            .slot_at(slot_index)
            .ok_or(CaptureError::SlotOutOfRange {
                index: slot_index,
                capacity: self.ring.capacity(),
            })?;
        sink.set_frame(&frame_parameter_name(slot_index), slot);

        self.current_index = (slot_index + 1) % self.config.delay_count;
        Ok(Some(slot_index))
    }

    /// One host frame: configuration first, then capture and upload when
    /// the effect is active.
    pub fn tick<F, S>(&mut self, source: &F, sink: &mut S) -> TickOutcome
    where
        F: FrameSource + ?Sized,
        S: ShaderParameterSink + ?Sized,
    {
        self.ticks = self.ticks.saturating_add(1);
        self.sync_parameters(sink);

        match self.capture_and_upload(source, sink) {
            Ok(None) => TickOutcome::Disabled,
            Ok(Some(slot)) => {
                tracing::trace!(tick = self.ticks, slot, "uploaded trail frame");
                TickOutcome::Captured { slot }
            }
            Err(error) => {
                tracing::warn!(
                    tick = self.ticks,
                    slot = self.current_index,
                    %error,
                    "skipping trail capture for this tick"
                );
                TickOutcome::Skipped(error)
            }
        }
    }
}
