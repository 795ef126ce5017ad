use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Forced quality tier name accepted from config or CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TierName {
    Mobile,
    Balanced,
    High,
}

/// Rim-highlight gradient strategy selection.
///
/// `Sweep` renders the bevel with an angular (conic-style) gradient;
/// `Linear` is the fallback for hosts without a sweep primitive and is
/// also useful to pin down in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RimStyleName {
    #[default]
    Sweep,
    Linear,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeroConfig {
    pub version: u32,
    #[serde(default)]
    pub quality: QualitySection,
    #[serde(default)]
    pub zones: ZoneTuning,
    #[serde(default)]
    pub rim: RimSection,
}

/// Capability hints and overrides applied before profiling.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QualitySection {
    /// Force a tier instead of deriving one from capability hints.
    pub tier: Option<TierName>,
    /// Optional FPS cap overriding the tier's frame interval (0 = tier default).
    pub fps: Option<f32>,
    #[serde(default)]
    pub reduced_motion: bool,
    #[serde(default)]
    pub coarse_pointer: bool,
    pub device_memory_gb: Option<u32>,
    pub logical_cores: Option<u32>,
}

/// Zone-classification boundaries, all as fractions of the approximate
/// on-screen wafer radius.
///
/// The defaults align with the procedurally drawn disc geometry; they are
/// configurable so the tooltip zones can be recalibrated without touching
/// engine code.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZoneTuning {
    /// Beyond this normalized distance the pointer is off the wafer.
    pub hide_beyond: f32,
    /// Normalized distance at which the bevel begins.
    pub bevel_min: f32,
    /// Normalized distance at which the edge exclusion annulus begins.
    pub exclusion_min: f32,
    /// Inside this normalized distance the center PCM cluster is reported.
    pub pcm_max: f32,
    /// Minimum normalized distance for the bottom-notch special case.
    pub notch_min: f32,
    /// Vertical offset (fraction of radius) that marks "bottom of disc".
    pub notch_descent: f32,
    /// Horizontal half-width (fraction of radius) of the notch window.
    pub notch_half_width: f32,
    /// On-screen wafer radius as a fraction of min(shell width, height).
    pub shell_radius_factor: f32,
    /// Below this shell radius in pixels the tooltip stays hidden.
    pub min_shell_radius: f32,
}

impl Default for ZoneTuning {
    fn default() -> Self {
        Self {
            hide_beyond: 1.08,
            bevel_min: 0.96,
            exclusion_min: 0.86,
            pcm_max: 0.10,
            notch_min: 0.82,
            notch_descent: 0.7,
            notch_half_width: 0.18,
            shell_radius_factor: 0.47,
            min_shell_radius: 40.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RimSection {
    pub style: RimStyleName,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            version: 1,
            quality: QualitySection::default(),
            zones: ZoneTuning::default(),
            rim: RimSection::default(),
        }
    }
}

impl HeroConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: HeroConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if let Some(fps) = self.quality.fps {
            if fps < 0.0 {
                return Err(ConfigError::Invalid("quality.fps must be >= 0".into()));
            }
        }

        if let Some(memory) = self.quality.device_memory_gb {
            if memory == 0 {
                return Err(ConfigError::Invalid(
                    "quality.device_memory_gb must be > 0".into(),
                ));
            }
        }

        if let Some(cores) = self.quality.logical_cores {
            if cores == 0 {
                return Err(ConfigError::Invalid(
                    "quality.logical_cores must be > 0".into(),
                ));
            }
        }

        self.zones.validate()
    }
}

impl ZoneTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.pcm_max < self.exclusion_min
            && self.exclusion_min < self.bevel_min
            && self.bevel_min <= self.hide_beyond;
        if !ordered {
            return Err(ConfigError::Invalid(
                "zones must satisfy pcm_max < exclusion_min < bevel_min <= hide_beyond".into(),
            ));
        }

        for (name, value) in [
            ("zones.pcm_max", self.pcm_max),
            ("zones.notch_min", self.notch_min),
            ("zones.notch_descent", self.notch_descent),
            ("zones.notch_half_width", self.notch_half_width),
            ("zones.shell_radius_factor", self.shell_radius_factor),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be > 0")));
            }
        }

        if self.min_shell_radius < 0.0 {
            return Err(ConfigError::Invalid(
                "zones.min_shell_radius must be >= 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[quality]
tier = "balanced"
fps = 45
reduced_motion = false
device_memory_gb = 8

[zones]
bevel_min = 0.95

[rim]
style = "linear"
"#;

    #[test]
    fn parses_sample_config() {
        let config = HeroConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert_eq!(config.quality.tier, Some(TierName::Balanced));
        assert_eq!(config.quality.fps, Some(45.0));
        assert_eq!(config.rim.style, RimStyleName::Linear);
        assert!((config.zones.bevel_min - 0.95).abs() < f32::EPSILON);
        // Untouched zone fields keep their defaults.
        assert!((config.zones.hide_beyond - 1.08).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_sections_default() {
        let config = HeroConfig::from_toml_str("version = 1").expect("parse config");
        assert_eq!(config.zones, ZoneTuning::default());
        assert_eq!(config.rim.style, RimStyleName::Sweep);
        assert!(config.quality.tier.is_none());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = HeroConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unordered_zone_thresholds() {
        let config = r#"
version = 1

[zones]
bevel_min = 0.5
exclusion_min = 0.9
"#;
        let err = HeroConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_negative_fps() {
        let config = r#"
version = 1

[quality]
fps = -1
"#;
        let err = HeroConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
