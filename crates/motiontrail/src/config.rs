use serde::{Deserialize, Serialize};
use trailconfig::TrailConfig;

use crate::error::ConfigError;
use crate::types::{Resolution, Rgba, Section, FRAME_DELAY_LIMIT, SECTION_CAPACITY};

/// Everything the effect pushes to the shader besides the frames themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    /// Size of every captured frame; fixed for the lifetime of the effect.
    pub resolution: Resolution,
    /// Color of the most recent motion.
    pub max_color: Rgba,
    /// Fade gradient stops, in the rank order the shader reads them.
    pub sections: Vec<Section>,
    /// Number of trailing frames in use; 0 disables the effect.
    pub delay_count: usize,
}

impl Default for EffectConfig {
    /// 1080p, white max color, no gradient, effect disabled.
    fn default() -> Self {
        Self {
            resolution: Resolution::new(1920, 1080),
            max_color: Rgba::WHITE,
            sections: Vec::new(),
            delay_count: 0,
        }
    }
}

impl EffectConfig {
    /// Builds the runtime configuration from a parsed file and validates it.
    pub fn from_file(file: &TrailConfig) -> Result<Self, ConfigError> {
        let config = Self {
            resolution: Resolution::from(file.effect.resolution),
            max_color: Rgba::from(file.effect.max_color),
            sections: file
                .sections
                .iter()
                .map(|section| Section::new(Rgba::from(section.color), section.threshold))
                .collect(),
            delay_count: file.effect.delay_frames as usize,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution.is_empty() {
            return Err(ConfigError::InvalidResolution(self.resolution));
        }
        validate_delay_count(self.delay_count)?;
        validate_sections(&self.sections)
    }

    pub fn is_enabled(&self) -> bool {
        self.delay_count > 0
    }

    pub fn section_colors(&self) -> Vec<Rgba> {
        self.sections.iter().map(|section| section.color).collect()
    }

    pub fn section_thresholds(&self) -> Vec<f32> {
        self.sections.iter().map(|section| section.threshold).collect()
    }
}

pub(crate) fn validate_delay_count(delay_count: usize) -> Result<(), ConfigError> {
    if delay_count > FRAME_DELAY_LIMIT {
        return Err(ConfigError::DelayOutOfRange(delay_count));
    }
    Ok(())
}

pub(crate) fn validate_sections(sections: &[Section]) -> Result<(), ConfigError> {
    if sections.len() > SECTION_CAPACITY {
        return Err(ConfigError::TooManySections(sections.len()));
    }
    for (index, section) in sections.iter().enumerate() {
        if !section.threshold.is_finite() || section.threshold < 0.0 {
            return Err(ConfigError::NegativeThreshold {
                index,
                threshold: section.threshold,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(delay_count: usize, sections: Vec<Section>) -> EffectConfig {
        EffectConfig {
            resolution: Resolution::new(16, 9),
            delay_count,
            sections,
            ..EffectConfig::default()
        }
    }

    #[test]
    fn accepts_delay_up_to_limit() {
        for delay in 0..=FRAME_DELAY_LIMIT {
            assert!(config_with(delay, Vec::new()).validate().is_ok());
        }
        assert_eq!(
            config_with(FRAME_DELAY_LIMIT + 1, Vec::new()).validate(),
            Err(ConfigError::DelayOutOfRange(FRAME_DELAY_LIMIT + 1))
        );
    }

    #[test]
    fn rejects_negative_and_nan_thresholds() {
        let red = Rgba::new(1.0, 0.0, 0.0, 1.0);
        let err = config_with(2, vec![Section::new(red, 0.5), Section::new(red, -0.1)])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NegativeThreshold { index: 1, .. }));

        let err = config_with(2, vec![Section::new(red, f32::NAN)])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NegativeThreshold { index: 0, .. }));
    }

    #[test]
    fn duplicate_thresholds_pass_through() {
        let stop = Section::new(Rgba::WHITE, 0.5);
        assert!(config_with(3, vec![stop, stop, stop]).validate().is_ok());
    }

    #[test]
    fn rejects_sections_beyond_shader_capacity() {
        let stop = Section::new(Rgba::WHITE, 0.1);
        let err = config_with(1, vec![stop; SECTION_CAPACITY + 1])
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::TooManySections(SECTION_CAPACITY + 1));
    }

    #[test]
    fn converts_file_config() {
        let file = TrailConfig::from_toml_str(
            r##"
version = 1

[effect]
resolution = "32x16"
max_color = "#ff0000"
delay_frames = 4

[[sections]]
color = "#00ff00"
threshold = 0.3
"##,
        )
        .unwrap();
        let config = EffectConfig::from_file(&file).unwrap();
        assert_eq!(config.resolution, Resolution::new(32, 16));
        assert_eq!(config.max_color, Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(config.delay_count, 4);
        assert_eq!(config.section_thresholds(), vec![0.3]);
        assert_eq!(config.section_colors(), vec![Rgba::new(0.0, 1.0, 0.0, 1.0)]);
    }

    #[test]
    fn file_with_delay_over_limit_is_rejected() {
        let file = TrailConfig::from_toml_str(
            r#"
version = 1

[effect]
resolution = "32x16"
delay_frames = 11
"#,
        )
        .unwrap();
        assert_eq!(
            EffectConfig::from_file(&file),
            Err(ConfigError::DelayOutOfRange(11))
        );
    }
}
