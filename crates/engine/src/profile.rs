//! Capability profiling and per-tier render planning.
//!
//! The tier is picked once per (re)configure from cheap hints, then frozen
//! into a [`TierProfile`] (pacing, density, motion response) and a
//! [`RenderPlan`] (which composite passes run and how strong they are).
//! Per-frame code never re-inspects capabilities.

use std::time::Duration;

/// Pointer precision hint; coarse pointers force the lowest tier and
/// disable hover classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPrecision {
    Fine,
    Coarse,
}

/// Everything tier selection looks at. Missing host facts fall back to
/// optimistic defaults so a headless run lands on the high tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapabilityHints {
    pub surface_width: f32,
    pub pointer: PointerPrecision,
    pub device_memory_gb: u32,
    pub logical_cores: u32,
}

impl CapabilityHints {
    pub fn new(
        surface_width: f32,
        pointer: PointerPrecision,
        device_memory_gb: Option<u32>,
        logical_cores: Option<u32>,
    ) -> Self {
        let detected_cores = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(8);
        Self {
            surface_width,
            pointer,
            device_memory_gb: device_memory_gb.unwrap_or(8),
            logical_cores: logical_cores.unwrap_or(detected_cores),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityTier {
    Mobile,
    Balanced,
    High,
}

impl QualityTier {
    /// First matching rule wins; ties resolve toward the lower tier.
    pub fn classify(hints: &CapabilityHints) -> Self {
        if hints.pointer == PointerPrecision::Coarse
            || hints.surface_width <= 820.0
            || hints.device_memory_gb <= 4
            || hints.logical_cores <= 4
        {
            QualityTier::Mobile
        } else if hints.surface_width <= 1220.0
            || hints.device_memory_gb <= 6
            || hints.logical_cores <= 6
        {
            QualityTier::Balanced
        } else {
            QualityTier::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityTier::Mobile => "mobile",
            QualityTier::Balanced => "balanced",
            QualityTier::High => "high",
        }
    }
}

/// Frozen per-tier knobs that affect pacing, sampling density and the
/// motion model, but not individual composite passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierProfile {
    pub tier: QualityTier,
    pub frame_interval: Duration,
    /// Effective device-pixel-ratio cap for the output raster.
    pub pixel_density_cap: f32,
    /// Per-frame pointer easing coefficient.
    pub pointer_ease: f32,
    /// Multiplier on the idle-drift amplitudes.
    pub drift_scale: f32,
    pub dies_across: u32,
    /// Radial polish streaks drawn into the base layer.
    pub polish_marks: u32,
}

impl TierProfile {
    pub fn for_tier(tier: QualityTier) -> Self {
        match tier {
            QualityTier::Mobile => Self {
                tier,
                frame_interval: Duration::from_secs_f64(1.0 / 32.0),
                pixel_density_cap: 1.05,
                pointer_ease: 0.042,
                drift_scale: 0.66,
                dies_across: 16,
                polish_marks: 60,
            },
            QualityTier::Balanced => Self {
                tier,
                frame_interval: Duration::from_secs_f64(1.0 / 45.0),
                pixel_density_cap: 1.3,
                pointer_ease: 0.036,
                drift_scale: 0.84,
                dies_across: 19,
                polish_marks: 120,
            },
            QualityTier::High => Self {
                tier,
                frame_interval: Duration::from_secs_f64(1.0 / 60.0),
                pixel_density_cap: 1.6,
                pointer_ease: 0.032,
                drift_scale: 1.0,
                dies_across: 22,
                polish_marks: 120,
            },
        }
    }

    /// Square off-screen layer resolution for this tier at the given
    /// logical surface width.
    pub fn layer_size(&self, surface_width: f32) -> u32 {
        match self.tier {
            QualityTier::Mobile => {
                if surface_width > 620.0 {
                    920
                } else {
                    760
                }
            }
            QualityTier::Balanced => {
                if surface_width > 820.0 {
                    1180
                } else {
                    980
                }
            }
            QualityTier::High => {
                if surface_width > 920.0 {
                    1420
                } else {
                    1200
                }
            }
        }
    }
}

/// Which composite passes run, precomputed at rebuild so the frame loop
/// only branches on booleans and reads constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPlan {
    pub tilt_shade: bool,
    pub chromatic_fringe: bool,
    pub depth_of_field: bool,
    pub second_streak: bool,
    pub inner_rim_ring: bool,
    /// Draw the laser-scribed wafer ID near the bottom edge.
    pub wafer_id: bool,
    /// Gaussian radius (logical px) baked into the drop-shadow sprite;
    /// zero means a hard ellipse.
    pub shadow_blur_px: f32,
    pub shadow_alpha: f32,
    pub film_opacity: f32,
    pub grain_opacity: f32,
    /// Depth-of-field strength multiplier and inner annulus fraction.
    pub dof_strength: f32,
    pub dof_inner: f32,
    /// Rim glow spread as a fraction of the wafer radius.
    pub rim_glow_factor: f32,
}

impl RenderPlan {
    pub fn for_tier(tier: QualityTier) -> Self {
        match tier {
            QualityTier::Mobile => Self {
                tilt_shade: false,
                chromatic_fringe: false,
                depth_of_field: false,
                second_streak: false,
                inner_rim_ring: false,
                wafer_id: false,
                shadow_blur_px: 0.0,
                shadow_alpha: 0.34,
                film_opacity: 0.48,
                grain_opacity: 0.07,
                dof_strength: 0.0,
                dof_inner: 1.0,
                rim_glow_factor: 0.015,
            },
            QualityTier::Balanced => Self {
                tilt_shade: true,
                chromatic_fringe: true,
                depth_of_field: true,
                second_streak: true,
                inner_rim_ring: true,
                wafer_id: true,
                shadow_blur_px: 14.0,
                shadow_alpha: 0.44,
                film_opacity: 0.54,
                grain_opacity: 0.10,
                dof_strength: 0.72,
                dof_inner: 0.78,
                rim_glow_factor: 0.04,
            },
            QualityTier::High => Self {
                tilt_shade: true,
                chromatic_fringe: true,
                depth_of_field: true,
                second_streak: true,
                inner_rim_ring: true,
                wafer_id: true,
                shadow_blur_px: 14.0,
                shadow_alpha: 0.44,
                film_opacity: 0.58,
                grain_opacity: 0.12,
                dof_strength: 1.0,
                dof_inner: 0.75,
                rim_glow_factor: 0.04,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(width: f32, pointer: PointerPrecision, memory: u32, cores: u32) -> CapabilityHints {
        CapabilityHints {
            surface_width: width,
            pointer,
            device_memory_gb: memory,
            logical_cores: cores,
        }
    }

    #[test]
    fn narrow_surface_forces_mobile() {
        let tier = QualityTier::classify(&hints(700.0, PointerPrecision::Fine, 16, 12));
        assert_eq!(tier, QualityTier::Mobile);
    }

    #[test]
    fn low_memory_overrides_width() {
        let tier = QualityTier::classify(&hints(1000.0, PointerPrecision::Fine, 4, 12));
        assert_eq!(tier, QualityTier::Mobile);
    }

    #[test]
    fn coarse_pointer_forces_mobile() {
        let tier = QualityTier::classify(&hints(1800.0, PointerPrecision::Coarse, 16, 12));
        assert_eq!(tier, QualityTier::Mobile);
    }

    #[test]
    fn mid_width_capable_host_is_balanced() {
        let tier = QualityTier::classify(&hints(900.0, PointerPrecision::Fine, 8, 8));
        assert_eq!(tier, QualityTier::Balanced);
    }

    #[test]
    fn wide_capable_host_is_high() {
        let tier = QualityTier::classify(&hints(1400.0, PointerPrecision::Fine, 8, 8));
        assert_eq!(tier, QualityTier::High);
    }

    #[test]
    fn exact_thresholds_resolve_downward() {
        assert_eq!(
            QualityTier::classify(&hints(820.0, PointerPrecision::Fine, 16, 12)),
            QualityTier::Mobile
        );
        assert_eq!(
            QualityTier::classify(&hints(1220.0, PointerPrecision::Fine, 16, 12)),
            QualityTier::Balanced
        );
    }

    #[test]
    fn layer_size_steps_with_width() {
        let mobile = TierProfile::for_tier(QualityTier::Mobile);
        assert_eq!(mobile.layer_size(600.0), 760);
        assert_eq!(mobile.layer_size(640.0), 920);
        let high = TierProfile::for_tier(QualityTier::High);
        assert_eq!(high.layer_size(900.0), 1200);
        assert_eq!(high.layer_size(1400.0), 1420);
    }

    #[test]
    fn frame_intervals_match_tier_targets() {
        let high = TierProfile::for_tier(QualityTier::High);
        assert!((high.frame_interval.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
        let mobile = TierProfile::for_tier(QualityTier::Mobile);
        assert!((mobile.frame_interval.as_secs_f64() - 1.0 / 32.0).abs() < 1e-9);
    }

    #[test]
    fn mobile_plan_skips_expensive_passes() {
        let plan = RenderPlan::for_tier(QualityTier::Mobile);
        assert!(!plan.tilt_shade);
        assert!(!plan.depth_of_field);
        assert!(!plan.chromatic_fringe);
        assert_eq!(plan.shadow_blur_px, 0.0);
    }

    #[test]
    fn non_mobile_plans_share_the_full_pass_list() {
        for tier in [QualityTier::Balanced, QualityTier::High] {
            let plan = RenderPlan::for_tier(tier);
            assert!(plan.tilt_shade);
            assert!(plan.chromatic_fringe);
            assert!(plan.depth_of_field);
            assert!(plan.wafer_id);
        }
        // Strength still separates the two tiers.
        let balanced = RenderPlan::for_tier(QualityTier::Balanced);
        let high = RenderPlan::for_tier(QualityTier::High);
        assert!(balanced.dof_strength < high.dof_strength);
        assert!(balanced.film_opacity < high.film_opacity);
    }
}
