//! Windowed host: event loop, input routing and frame pacing.
//!
//! Resize and scroll are coalesced so at most one layer rebuild and one
//! scroll recompute happen per drawn frame, and pending work is always
//! applied before the compositor runs.

use std::time::Instant;

use anyhow::{Context, Result};
use frameclock::FrameClock;
use tiny_skia::Pixmap;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{Event, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::compose::Compositor;
use crate::layers::LayerSet;
use crate::motion::MotionModel;
use crate::present::Presenter;
use crate::profile::TierProfile;
use crate::resolve_profile;
use crate::timebase::{Monotonic, Timebase};
use crate::types::{Bounds, EngineConfig};
use crate::zones::{Tooltip, TooltipEvent, WaferZone, ZoneLocator};

const TITLE: &str = "waferhero";

/// One wheel line in logical pixels, for hosts that report line deltas.
const LINE_HEIGHT: f32 = 48.0;

struct SceneState {
    config: EngineConfig,
    clock: FrameClock,
    motion: MotionModel,
    bounds: Bounds,
    scale: f32,
    profile: TierProfile,
    compositor: Compositor,
    layers: LayerSet,
    frame: Pixmap,
    locator: Option<ZoneLocator>,
    tooltip: Tooltip,
    cursor: Option<(f32, f32)>,
    pending_resize: Option<(f32, f32, f32)>,
    pending_scroll: bool,
    scroll_offset: f32,
}

impl SceneState {
    fn new(config: EngineConfig, width: f32, height: f32, scale_factor: f32) -> Result<Self> {
        let (tier, profile, plan) = resolve_profile(&config, width);
        let bounds = Bounds::new(width, height);
        let layers = LayerSet::build(&bounds, &profile, &plan)?;
        let scale = scale_factor.min(profile.pixel_density_cap);
        let frame = frame_pixmap(&bounds, scale)?;

        let mut drift = match config.drift_phase {
            Some(phase) => MotionModel::with_drift_phase(config.reduced_motion, phase),
            None => MotionModel::new(config.reduced_motion),
        };
        drift.update_scroll(0.0, height, height);

        let locator = if config.coarse_pointer {
            None
        } else {
            Some(ZoneLocator::new(config.zones))
        };

        let clock = FrameClock::new(target_interval(&config, &profile), config.reduced_motion);
        tracing::info!(tier = tier.label(), scale, "scene configured");

        Ok(Self {
            compositor: Compositor::new(plan, config.rim_style),
            config,
            clock,
            motion: drift,
            bounds,
            scale,
            profile,
            layers,
            frame,
            locator,
            tooltip: Tooltip::default(),
            cursor: None,
            pending_resize: None,
            pending_scroll: false,
            scroll_offset: 0.0,
        })
    }

    fn queue_resize(&mut self, size: PhysicalSize<u32>, scale_factor: f32) {
        let logical = size.to_logical::<f32>(scale_factor as f64);
        self.pending_resize = Some((logical.width, logical.height, scale_factor));
        self.clock.note_input();
    }

    fn pointer_moved(&mut self, position: PhysicalPosition<f64>, scale_factor: f32) -> TooltipEvent {
        let x = position.x as f32 / scale_factor;
        let y = position.y as f32 / scale_factor;
        self.cursor = Some((x, y));
        self.motion.pointer.set_target(
            x / self.bounds.width * 2.0 - 1.0,
            y / self.bounds.height * 2.0 - 1.0,
        );
        self.clock.note_input();

        match &self.locator {
            Some(locator) => {
                let zone = locator.locate((x, y), &self.bounds);
                self.tooltip
                    .update(zone, (x, y), (self.bounds.width, self.bounds.height))
            }
            None => TooltipEvent::Unchanged,
        }
    }

    fn pointer_left(&mut self) -> TooltipEvent {
        self.cursor = None;
        self.motion.pointer.clear();
        self.tooltip.update(
            None,
            (0.0, 0.0),
            (self.bounds.width, self.bounds.height),
        )
    }

    fn scrolled(&mut self, delta: MouseScrollDelta, scale_factor: f32) {
        let dy = match delta {
            MouseScrollDelta::LineDelta(_, lines) => lines * LINE_HEIGHT,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / scale_factor,
        };
        // Wheel-down (negative delta) scrolls the virtual page forward.
        self.scroll_offset = (self.scroll_offset - dy).max(0.0);
        self.pending_scroll = true;
        self.clock.note_input();
    }

    /// Applies coalesced resize/scroll work; called once per drawn frame,
    /// always before composition.
    fn apply_pending(&mut self) -> Result<()> {
        if let Some((width, height, scale_factor)) = self.pending_resize.take() {
            let (tier, profile, plan) = resolve_profile(&self.config, width);
            self.bounds = Bounds::new(width, height);
            self.profile = profile;
            self.scale = scale_factor.min(profile.pixel_density_cap);
            self.compositor = Compositor::new(plan, self.config.rim_style);
            self.clock.set_interval(target_interval(&self.config, &profile));
            self.pending_scroll = true;
            if !self.layers.matches(&self.bounds, tier) {
                self.layers = LayerSet::build(&self.bounds, &self.profile, &plan)?;
            }
            self.frame = frame_pixmap(&self.bounds, self.scale)?;
        }
        if self.pending_scroll {
            self.pending_scroll = false;
            self.motion
                .update_scroll(-self.scroll_offset, self.bounds.height, self.bounds.height);
        }
        Ok(())
    }

    fn draw(&mut self, t_ms: f32) -> Result<()> {
        self.apply_pending()?;
        let pose = self.motion.pose(t_ms, &self.bounds, &self.profile);
        self.compositor
            .render(&mut self.frame, self.scale, &self.bounds, &self.layers, &pose)?;
        if let Some(vars) = self.motion.take_style_vars() {
            tracing::trace!(
                pointer_x = vars.pointer_x,
                pointer_y = vars.pointer_y,
                scroll = vars.scroll_progress,
                "motion vars"
            );
        }
        Ok(())
    }
}

fn target_interval(config: &EngineConfig, profile: &TierProfile) -> std::time::Duration {
    match config.fps_override {
        Some(fps) if fps > 0.0 => std::time::Duration::from_secs_f32(1.0 / fps),
        _ => profile.frame_interval,
    }
}

fn frame_pixmap(bounds: &Bounds, scale: f32) -> Result<Pixmap> {
    let width = (bounds.width * scale).round().max(1.0) as u32;
    let height = (bounds.height * scale).round().max(1.0) as u32;
    Pixmap::new(width, height).context("allocate frame pixmap")
}

fn announce(window: &winit::window::Window, event: TooltipEvent) {
    match event {
        TooltipEvent::ZoneChanged { zone, position } => {
            window.set_title(&format!("{TITLE} — {}", zone.title()));
            tracing::info!(
                zone = zone_label(zone),
                x = position.0,
                y = position.1,
                "hover zone"
            );
            tracing::debug!(detail = zone.description(), "hover zone detail");
        }
        TooltipEvent::Hidden => window.set_title(TITLE),
        TooltipEvent::Moved { .. } | TooltipEvent::Unchanged => {}
    }
}

fn zone_label(zone: WaferZone) -> &'static str {
    match zone {
        WaferZone::Die => "die",
        WaferZone::Exclusion => "exclusion",
        WaferZone::Bevel => "bevel",
        WaferZone::Notch => "notch",
        WaferZone::Pcm => "pcm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::QualityTier;

    #[test]
    fn resize_rebuilds_layers_before_the_next_frame() {
        // Memory hint of 6 GiB pins the tier transition: 600 px wide is
        // mobile, 1300 px wide is balanced.
        let config = EngineConfig {
            surface_size: (600, 400),
            device_memory_gb: Some(6),
            logical_cores: Some(16),
            reduced_motion: true,
            drift_phase: Some(0.0),
            ..EngineConfig::default()
        };
        let mut scene = SceneState::new(config, 600.0, 400.0, 1.0).expect("scene");
        assert!(scene
            .layers
            .matches(&Bounds::new(600.0, 400.0), QualityTier::Mobile));

        scene.queue_resize(PhysicalSize::new(1300, 800), 1.0);
        scene.draw(0.0).expect("draw");

        // The composited frame above must already have read layers built
        // for the new bounds and tier.
        assert_eq!(scene.bounds, Bounds::new(1300.0, 800.0));
        assert_eq!(scene.profile.tier, QualityTier::Balanced);
        assert!(scene.layers.matches(&scene.bounds, QualityTier::Balanced));
        assert_eq!((scene.frame.width(), scene.frame.height()), (1300, 800));
    }
}

pub(crate) fn run_windowed(config: EngineConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("create event loop")?;
    let window = WindowBuilder::new()
        .with_title(TITLE)
        .with_inner_size(LogicalSize::new(
            config.surface_size.0,
            config.surface_size.1,
        ))
        .build(&event_loop)
        .context("create window")?;

    let mut presenter = match Presenter::new(&window, window.inner_size()) {
        Ok(presenter) => presenter,
        Err(err) => {
            // Presentation is decorative; a host without a usable GPU
            // surface gets no wafer rather than a crash.
            tracing::warn!(error = %err, "presentation unavailable; scene disabled");
            return Ok(());
        }
    };

    let scale_factor = window.scale_factor() as f32;
    let logical = window
        .inner_size()
        .to_logical::<f32>(scale_factor as f64);
    let mut scene = SceneState::new(config, logical.width, logical.height, scale_factor)?;
    let timebase = Monotonic::new();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => {
                    presenter.resize(size);
                    scene.queue_resize(size, window.scale_factor() as f32);
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    scene.queue_resize(window.inner_size(), scale_factor as f32);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let event = scene.pointer_moved(position, window.scale_factor() as f32);
                    announce(&window, event);
                }
                WindowEvent::CursorLeft { .. } => {
                    let event = scene.pointer_left();
                    announce(&window, event);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    scene.scrolled(delta, window.scale_factor() as f32);
                }
                WindowEvent::Occluded(occluded) => {
                    scene
                        .clock
                        .set_visible_fraction(if occluded { 0.0 } else { 1.0 });
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    if let Err(err) = scene.draw(timebase.now_ms()) {
                        tracing::warn!(error = %err, "frame skipped");
                        scene.clock.mark_rendered(now);
                        return;
                    }
                    match presenter.present(&scene.frame) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            presenter.resize(window.inner_size());
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            tracing::error!("surface out of memory; stopping");
                            elwt.exit();
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "surface frame dropped");
                        }
                    }
                    scene.clock.mark_rendered(now);
                }
                _ => {}
            },
            Event::AboutToWait => {
                if scene.clock.ready_for_frame(Instant::now()) {
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = scene.clock.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            _ => {}
        })
        .context("run event loop")?;
    Ok(())
}
