use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of history slots the compositing shader declares (`_Frame0-9`).
///
/// Raising this without growing the shader's frame array breaks the effect,
/// so the ring buffer is always allocated at exactly this capacity.
pub const FRAME_DELAY_LIMIT: usize = 10;

/// Length of the shader's fixed `_Colors` / `_Thresholds` arrays.
pub const SECTION_CAPACITY: usize = 16;

pub const DELAY_FRAMES_PARAM: &str = "_NumberOfDelayFrames";
pub const MAX_COLOR_PARAM: &str = "_MaxColor";
pub const COLORS_PARAM: &str = "_Colors";
pub const THRESHOLDS_PARAM: &str = "_Thresholds";
pub const SECTION_COUNT_PARAM: &str = "_NumberOfSections";
pub const FRAME_PARAM_PREFIX: &str = "_Frame";

/// Shader parameter name for the history slot at `index`.
pub fn frame_parameter_name(index: usize) -> String {
    format!("{FRAME_PARAM_PREFIX}{index}")
}

/// Inverse of [`frame_parameter_name`]; `None` for other names or indices
/// outside the shader's frame array.
pub fn parse_frame_parameter(name: &str) -> Option<usize> {
    let index: usize = name.strip_prefix(FRAME_PARAM_PREFIX)?.parse().ok()?;
    (index < FRAME_DELAY_LIMIT).then_some(index)
}

/// Straight (non pre-multiplied) RGBA color with normalised components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[f32; 4]> for Rgba {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// One stop of the fade gradient. Position in the section list is the rank
/// the shader sees; thresholds are not required to be sorted or unique.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub color: Rgba,
    pub threshold: f32,
}

impl Section {
    pub fn new(color: Rgba, threshold: f32) -> Self {
        Self { color, threshold }
    }
}

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Resolution {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_names_round_trip_within_limit() {
        assert_eq!(frame_parameter_name(0), "_Frame0");
        assert_eq!(parse_frame_parameter("_Frame9"), Some(9));
        assert_eq!(parse_frame_parameter("_Frame10"), None);
        assert_eq!(parse_frame_parameter("_MaxColor"), None);
    }

    #[test]
    fn resolution_displays_as_dimensions() {
        let resolution = Resolution::new(1920, 1080);
        assert_eq!(resolution.to_string(), "1920x1080");
        assert_eq!(resolution.pixel_count(), 1920 * 1080);
        assert!(Resolution::new(0, 4).is_empty());
    }
}
