//! Procedural silicon-wafer hero scene.
//!
//! The pipeline splits into cached and per-frame work:
//!
//! ```text
//! resize / tier change          every frame
//! ---------------------         -------------------------------
//! profile  -> TierProfile       MotionModel ---> FramePose
//!          -> RenderPlan                            |
//! layers   -> die/base/film/    Compositor::render(frame)
//!             grain (+ blurred                      |
//!             sprites)          Presenter::present (GPU blit)
//! ```
//!
//! [`LayerSet`] rasterizes everything expensive once per rebuild;
//! [`Compositor`] only transforms and blends those pixmaps, so a frame is
//! cheap enough for the balanced tier's 45 Hz target on a CPU. Pacing and
//! suspension live in the `frameclock` crate; hover classification in
//! [`zones`] is independent of the animated pose.

pub mod compose;
pub mod layers;
pub mod motion;
pub mod noise;
pub mod profile;
mod present;
mod raster;
pub mod timebase;
pub mod types;
mod window;
pub mod zones;

use std::path::Path;

use anyhow::{Context, Result};
use tiny_skia::{Pixmap, PixmapPaint, Transform};

pub use compose::Compositor;
pub use layers::LayerSet;
pub use motion::{FramePose, MotionModel, PointerState, StyleVars};
pub use profile::{CapabilityHints, PointerPrecision, QualityTier, RenderPlan, TierProfile};
pub use timebase::{Fixed, Monotonic, Timebase};
pub use types::{Bounds, EngineConfig, RenderPolicy, RimStyle};
pub use zones::{Tooltip, TooltipEvent, WaferZone, ZoneLocator, ZoneThresholds};

/// Drives the scene according to its [`RenderPolicy`].
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn run(self) -> Result<()> {
        match self.config.policy.clone() {
            RenderPolicy::Animate => window::run_windowed(self.config),
            RenderPolicy::Still { time_ms, path } => render_still(&self.config, time_ms, &path),
        }
    }
}

/// Resolves the quality tier (forced or classified) into its frozen
/// profile and render plan.
pub(crate) fn resolve_profile(
    config: &EngineConfig,
    width: f32,
) -> (QualityTier, TierProfile, RenderPlan) {
    let tier = config.forced_tier.unwrap_or_else(|| {
        let pointer = if config.coarse_pointer {
            PointerPrecision::Coarse
        } else {
            PointerPrecision::Fine
        };
        QualityTier::classify(&CapabilityHints::new(
            width,
            pointer,
            config.device_memory_gb,
            config.logical_cores,
        ))
    });
    (tier, TierProfile::for_tier(tier), RenderPlan::for_tier(tier))
}

/// Renders a single frame at `time_ms` and writes it as a PNG.
///
/// Stills use a unit pixel scale and a zeroed drift phase unless the
/// config pins one, so repeated exports of the same time match.
pub fn render_still(config: &EngineConfig, time_ms: f32, path: &Path) -> Result<()> {
    let (width, height) = config.surface_size;
    let bounds = Bounds::new(width as f32, height as f32);
    let (tier, profile, plan) = resolve_profile(config, bounds.width);
    tracing::info!(tier = tier.label(), time_ms, "rendering still");

    let layers = LayerSet::build(&bounds, &profile, &plan)?;
    let mut motion = MotionModel::with_drift_phase(
        config.reduced_motion,
        config.drift_phase.unwrap_or(0.0),
    );
    let pose = motion.pose(time_ms, &bounds, &profile);

    let mut frame = Pixmap::new(width.max(1), height.max(1)).context("allocate still frame")?;
    Compositor::new(plan, config.rim_style).render(&mut frame, 1.0, &bounds, &layers, &pose)?;

    let mut out = Pixmap::new(frame.width(), frame.height()).context("allocate output")?;
    out.fill(compose::backdrop());
    out.draw_pixmap(
        0,
        0,
        frame.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );

    let mut bytes = Vec::with_capacity(out.data().len());
    for px in out.pixels() {
        let c = px.demultiply();
        bytes.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let image = image::RgbaImage::from_raw(out.width(), out.height(), bytes)
        .context("assemble output image")?;
    image
        .save(path)
        .with_context(|| format!("write still to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_render_writes_a_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wafer.png");
        let config = EngineConfig {
            surface_size: (320, 240),
            drift_phase: Some(0.0),
            ..EngineConfig::default()
        };
        render_still(&config, 1_500.0, &path).expect("render still");
        let (w, h) = image::image_dimensions(&path).expect("read dimensions");
        assert_eq!((w, h), (320, 240));
    }

    #[test]
    fn forced_tier_overrides_classification() {
        let config = EngineConfig {
            forced_tier: Some(QualityTier::Mobile),
            surface_size: (1600, 900),
            ..EngineConfig::default()
        };
        let (tier, _, plan) = resolve_profile(&config, 1600.0);
        assert_eq!(tier, QualityTier::Mobile);
        assert!(!plan.depth_of_field);
    }

    #[test]
    fn coarse_pointer_feeds_classification() {
        let config = EngineConfig {
            coarse_pointer: true,
            ..EngineConfig::default()
        };
        let (tier, _, _) = resolve_profile(&config, 1600.0);
        assert_eq!(tier, QualityTier::Mobile);
    }
}
