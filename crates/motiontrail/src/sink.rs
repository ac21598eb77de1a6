use serde::Serialize;

use crate::frame::FrameSlot;
use crate::types::{Resolution, Rgba};

/// Consumer of named shader parameters.
///
/// Writes are fire-and-forget: a sink that cannot apply a value logs and
/// carries on. Within one tick the controller always issues the frame upload
/// after the configuration writes.
pub trait ShaderParameterSink {
    fn set_int(&mut self, name: &str, value: i32);

    fn set_color(&mut self, name: &str, color: Rgba);

    fn set_color_array(&mut self, name: &str, colors: &[Rgba]);

    fn set_float_array(&mut self, name: &str, values: &[f32]);

    fn set_frame(&mut self, name: &str, slot: &FrameSlot);
}

impl<S: ShaderParameterSink + ?Sized> ShaderParameterSink for &mut S {
    fn set_int(&mut self, name: &str, value: i32) {
        (**self).set_int(name, value);
    }

    fn set_color(&mut self, name: &str, color: Rgba) {
        (**self).set_color(name, color);
    }

    fn set_color_array(&mut self, name: &str, colors: &[Rgba]) {
        (**self).set_color_array(name, colors);
    }

    fn set_float_array(&mut self, name: &str, values: &[f32]) {
        (**self).set_float_array(name, values);
    }

    fn set_frame(&mut self, name: &str, slot: &FrameSlot) {
        (**self).set_frame(name, slot);
    }
}

/// A single recorded sink call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterWrite {
    Int {
        name: String,
        value: i32,
    },
    Color {
        name: String,
        color: Rgba,
    },
    ColorArray {
        name: String,
        colors: Vec<Rgba>,
    },
    FloatArray {
        name: String,
        values: Vec<f32>,
    },
    Frame {
        name: String,
        resolution: Resolution,
        #[serde(skip)]
        pixels: Vec<u8>,
    },
}

impl ParameterWrite {
    pub fn name(&self) -> &str {
        match self {
            ParameterWrite::Int { name, .. }
            | ParameterWrite::Color { name, .. }
            | ParameterWrite::ColorArray { name, .. }
            | ParameterWrite::FloatArray { name, .. }
            | ParameterWrite::Frame { name, .. } => name,
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, ParameterWrite::Frame { .. })
    }
}

/// Sink that keeps every write in call order. Frame uploads keep a copy of
/// the slot pixels so callers can check what was sent.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    writes: Vec<ParameterWrite>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> &[ParameterWrite] {
        &self.writes
    }

    /// Drains the recorded writes, leaving the sink empty.
    pub fn take(&mut self) -> Vec<ParameterWrite> {
        std::mem::take(&mut self.writes)
    }

    pub fn frame_uploads(&self) -> impl Iterator<Item = &ParameterWrite> {
        self.writes.iter().filter(|write| write.is_frame())
    }

    /// Most recent write for `name`, if any.
    pub fn last(&self, name: &str) -> Option<&ParameterWrite> {
        self.writes.iter().rev().find(|write| write.name() == name)
    }
}

impl ShaderParameterSink for RecordingSink {
    fn set_int(&mut self, name: &str, value: i32) {
        self.writes.push(ParameterWrite::Int {
            name: name.to_string(),
            value,
        });
    }

    fn set_color(&mut self, name: &str, color: Rgba) {
        self.writes.push(ParameterWrite::Color {
            name: name.to_string(),
            color,
        });
    }

    fn set_color_array(&mut self, name: &str, colors: &[Rgba]) {
        self.writes.push(ParameterWrite::ColorArray {
            name: name.to_string(),
            colors: colors.to_vec(),
        });
    }

    fn set_float_array(&mut self, name: &str, values: &[f32]) {
        self.writes.push(ParameterWrite::FloatArray {
            name: name.to_string(),
            values: values.to_vec(),
        });
    }

    fn set_frame(&mut self, name: &str, slot: &FrameSlot) {
        self.writes.push(ParameterWrite::Frame {
            name: name.to_string(),
            resolution: slot.resolution(),
            pixels: slot.pixels().to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_returns_most_recent_write_for_name() {
        let mut sink = RecordingSink::new();
        sink.set_int("_NumberOfDelayFrames", 2);
        sink.set_color("_MaxColor", Rgba::WHITE);
        sink.set_int("_NumberOfDelayFrames", 5);

        assert_eq!(
            sink.last("_NumberOfDelayFrames"),
            Some(&ParameterWrite::Int {
                name: "_NumberOfDelayFrames".into(),
                value: 5
            })
        );
        assert!(sink.last("_Colors").is_none());
    }

    #[test]
    fn take_drains_and_frames_keep_pixels() {
        let mut sink = RecordingSink::new();
        let slot = FrameSlot::blank(Resolution::new(2, 1));
        sink.set_float_array("_Thresholds", &[0.1, 0.9]);
        sink.set_frame("_Frame3", &slot);

        let uploads: Vec<_> = sink.frame_uploads().collect();
        assert_eq!(uploads.len(), 1);
        match uploads[0] {
            ParameterWrite::Frame {
                name,
                resolution,
                pixels,
            } => {
                assert_eq!(name, "_Frame3");
                assert_eq!(*resolution, Resolution::new(2, 1));
                assert_eq!(pixels.len(), 8);
            }
            other => panic!("unexpected write {other:?}"),
        }

        let drained = sink.take();
        assert_eq!(drained.len(), 2);
        assert!(sink.writes().is_empty());
    }

    #[test]
    fn forwarding_through_mutable_reference() {
        fn push<S: ShaderParameterSink>(mut sink: S) {
            sink.set_int("_NumberOfSections", 1);
        }

        let mut sink = RecordingSink::new();
        push(&mut sink);
        assert_eq!(sink.writes().len(), 1);
    }
}
