use motiontrail::{FrameSlot, Rgba, ShaderParameterSink};

/// Forwards every write to two sinks in order.
pub(crate) struct Tee<A, B>(pub A, pub B);

impl<A: ShaderParameterSink, B: ShaderParameterSink> ShaderParameterSink for Tee<A, B> {
    fn set_int(&mut self, name: &str, value: i32) {
        self.0.set_int(name, value);
        self.1.set_int(name, value);
    }

    fn set_color(&mut self, name: &str, color: Rgba) {
        self.0.set_color(name, color);
        self.1.set_color(name, color);
    }

    fn set_color_array(&mut self, name: &str, colors: &[Rgba]) {
        self.0.set_color_array(name, colors);
        self.1.set_color_array(name, colors);
    }

    fn set_float_array(&mut self, name: &str, values: &[f32]) {
        self.0.set_float_array(name, values);
        self.1.set_float_array(name, values);
    }

    fn set_frame(&mut self, name: &str, slot: &FrameSlot) {
        self.0.set_frame(name, slot);
        self.1.set_frame(name, slot);
    }
}

#[cfg(test)]
mod tests {
    use motiontrail::{ParameterWrite, RecordingSink};

    use super::*;

    #[test]
    fn tee_forwards_to_both_sinks_in_order() {
        let mut first = RecordingSink::new();
        let mut second = RecordingSink::new();
        {
            let mut tee = Tee(&mut first, &mut second);
            tee.set_int("_NumberOfDelayFrames", 3);
            tee.set_float_array("_Thresholds", &[0.5]);
        }
        assert_eq!(first.writes(), second.writes());
        assert_eq!(
            first.writes()[0],
            ParameterWrite::Int {
                name: "_NumberOfDelayFrames".into(),
                value: 3
            }
        );
    }
}
