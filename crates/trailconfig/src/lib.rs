use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// On-disk description of a motion trail effect.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrailConfig {
    pub version: u32,
    pub effect: EffectSettings,
    #[serde(default)]
    pub sections: Vec<SectionSettings>,
    #[serde(default)]
    pub driver: DriverSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EffectSettings {
    #[serde(deserialize_with = "deserialize_resolution")]
    pub resolution: (u32, u32),
    #[serde(default = "default_max_color", deserialize_with = "deserialize_color")]
    pub max_color: [f32; 4],
    #[serde(default)]
    pub delay_frames: u32,
}

/// One gradient stop as written in the file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SectionSettings {
    #[serde(deserialize_with = "deserialize_color")]
    pub color: [f32; 4],
    pub threshold: f32,
}

/// Settings for the standalone tick driver; the effect itself ignores them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DriverSettings {
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub interval: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks: Option<u64>,
}

fn default_max_color() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

fn deserialize_resolution<'de, D>(deserializer: D) -> Result<(u32, u32), D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Pair([u32; 2]),
    }

    match Helper::deserialize(deserializer)? {
        Helper::Str(raw) => parse_resolution(&raw).map_err(de::Error::custom),
        Helper::Pair([width, height]) => Ok((width, height)),
    }
}

/// Parses `WIDTHxHEIGHT` (either `x` or `X`).
pub fn parse_resolution(raw: &str) -> Result<(u32, u32), String> {
    let (w, h) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid resolution '{raw}'; expected WIDTHxHEIGHT"))?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width in resolution '{raw}'"))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height in resolution '{raw}'"))?;
    Ok((width, height))
}

fn deserialize_color<'de, D>(deserializer: D) -> Result<[f32; 4], D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Hex(String),
        Components(Vec<f32>),
    }

    match Helper::deserialize(deserializer)? {
        Helper::Hex(raw) => parse_hex_color(&raw).map_err(de::Error::custom),
        Helper::Components(values) => match values.as_slice() {
            [r, g, b] => Ok([*r, *g, *b, 1.0]),
            [r, g, b, a] => Ok([*r, *g, *b, *a]),
            other => Err(de::Error::custom(format!(
                "color arrays need 3 or 4 components, got {}",
                other.len()
            ))),
        },
    }
}

/// Parses `#RRGGBB` or `#RRGGBBAA` into normalised components.
pub fn parse_hex_color(raw: &str) -> Result<[f32; 4], String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !matches!(digits.len(), 6 | 8) || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(format!(
            "invalid color '{raw}'; expected #RRGGBB or #RRGGBBAA"
        ));
    }

    let channel = |index: usize| -> Result<f32, String> {
        u8::from_str_radix(&digits[index * 2..index * 2 + 2], 16)
            .map(|value| f32::from(value) / 255.0)
            .map_err(|err| format!("invalid color '{raw}': {err}"))
    };

    let alpha = if digits.len() == 8 { channel(3)? } else { 1.0 };
    Ok([channel(0)?, channel(1)?, channel(2)?, alpha])
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl TrailConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: TrailConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// File-level checks only. Range limits that depend on the shader
    /// (delay frames, section count, threshold sign) are enforced when the
    /// effect is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if !self.effect.max_color.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::Invalid(
                "effect.max_color components must be finite".into(),
            ));
        }

        for (index, section) in self.sections.iter().enumerate() {
            if !section.color.iter().all(|c| c.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "section {index} color components must be finite"
                )));
            }
            if !section.threshold.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "section {index} threshold must be a finite number"
                )));
            }
        }

        if let Some(interval) = self.driver.interval {
            if interval.is_zero() {
                return Err(ConfigError::Invalid(
                    "driver.interval must be greater than zero".into(),
                ));
            }
        }

        if self.driver.ticks == Some(0) {
            return Err(ConfigError::Invalid("driver.ticks must be >= 1".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1

[effect]
resolution = "640x360"
max_color = "#ff3300"
delay_frames = 3

[[sections]]
color = "#00ffff80"
threshold = 0.25

[[sections]]
color = [0, 0, 1]
threshold = 0.75

[driver]
interval = "16ms"
ticks = 120
"##;

    #[test]
    fn parses_sample_config() {
        let config = TrailConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert_eq!(config.effect.resolution, (640, 360));
        assert_eq!(config.effect.delay_frames, 3);
        assert_eq!(config.effect.max_color, [1.0, 0.2, 0.0, 1.0]);
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.sections[1].color, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(config.driver.interval, Some(Duration::from_millis(16)));
        assert_eq!(config.driver.ticks, Some(120));
    }

    #[test]
    fn hex_alpha_is_normalised() {
        let color = parse_hex_color("#00ffff80").unwrap();
        assert_eq!(color[0], 0.0);
        assert_eq!(color[1], 1.0);
        assert!((color[3] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(parse_hex_color("#ff33").is_err());
        assert!(parse_hex_color("zz0000").is_err());
    }

    #[test]
    fn accepts_resolution_pair_and_defaults() {
        let config = TrailConfig::from_toml_str(
            r#"
version = 1

[effect]
resolution = [320, 240]
"#,
        )
        .unwrap();
        assert_eq!(config.effect.resolution, (320, 240));
        assert_eq!(config.effect.delay_frames, 0);
        assert_eq!(config.effect.max_color, [1.0, 1.0, 1.0, 1.0]);
        assert!(config.sections.is_empty());
        assert!(config.driver.interval.is_none());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = TrailConfig::from_toml_str(
            r#"
version = 2

[effect]
resolution = "8x8"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_tick_budget() {
        let err = TrailConfig::from_toml_str(
            r#"
version = 1

[effect]
resolution = "8x8"

[driver]
ticks = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_resolution_is_a_parse_error() {
        let err = TrailConfig::from_toml_str(
            r#"
version = 1

[effect]
resolution = "wide"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
