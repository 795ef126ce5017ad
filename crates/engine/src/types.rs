use std::path::PathBuf;

use crate::profile::QualityTier;
use crate::zones::ZoneThresholds;

/// Logical scene geometry derived from the surface size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    /// On-screen wafer radius; always `min(width, height) * 0.535`.
    pub radius: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        let width = width.max(1.0);
        let height = height.max(1.0);
        Self {
            width,
            height,
            radius: width.min(height) * 0.535,
        }
    }

    /// Wafer center. Biased toward the right edge on wide surfaces so the
    /// disc reads as a hero element rather than a centered logo.
    pub fn center(&self) -> (f32, f32) {
        let bias = if self.width > 1100.0 {
            0.72
        } else if self.width > 760.0 {
            0.68
        } else {
            0.62
        };
        (self.width * bias, self.height * 0.57)
    }
}

/// Angular rim-highlight strategy. `Sweep` approximates a conic gradient
/// with short arc segments; `Linear` strokes the bevel with a plain
/// diagonal gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RimStyle {
    #[default]
    Sweep,
    Linear,
}

/// What the engine should do once constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Open a window and animate until closed.
    Animate,
    /// Render one frame at the given scene time and write a PNG.
    Still { time_ms: f32, path: PathBuf },
}

/// Everything the engine needs to build and drive the scene.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial logical surface size.
    pub surface_size: (u32, u32),
    /// Pin the quality tier instead of deriving it from capability hints.
    pub forced_tier: Option<QualityTier>,
    /// Cap the frame rate below the tier's target.
    pub fps_override: Option<f32>,
    pub reduced_motion: bool,
    /// Treat the pointer as coarse (disables hover classification).
    pub coarse_pointer: bool,
    pub device_memory_gb: Option<u32>,
    pub logical_cores: Option<u32>,
    pub zones: ZoneThresholds,
    pub rim_style: RimStyle,
    pub policy: RenderPolicy,
    /// Fix the idle-drift phase for reproducible output.
    pub drift_phase: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            forced_tier: None,
            fps_override: None,
            reduced_motion: false,
            coarse_pointer: false,
            device_memory_gb: None,
            logical_cores: None,
            zones: ZoneThresholds::default(),
            rim_style: RimStyle::default(),
            policy: RenderPolicy::Animate,
            drift_phase: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_follows_short_side() {
        let wide = Bounds::new(1600.0, 900.0);
        assert!((wide.radius - 900.0 * 0.535).abs() < 1e-3);
        let tall = Bounds::new(600.0, 1200.0);
        assert!((tall.radius - 600.0 * 0.535).abs() < 1e-3);
    }

    #[test]
    fn degenerate_sizes_are_clamped() {
        let bounds = Bounds::new(0.0, -5.0);
        assert!(bounds.width >= 1.0);
        assert!(bounds.height >= 1.0);
        assert!(bounds.radius > 0.0);
    }

    #[test]
    fn center_bias_steps_with_width() {
        assert!((Bounds::new(1200.0, 800.0).center().0 - 1200.0 * 0.72).abs() < 1e-3);
        assert!((Bounds::new(900.0, 800.0).center().0 - 900.0 * 0.68).abs() < 1e-3);
        assert!((Bounds::new(700.0, 800.0).center().0 - 700.0 * 0.62).abs() < 1e-3);
    }
}
