//! Per-frame composition of the cached layers.
//!
//! Fifteen passes, cheap by construction: every draw is a transform plus
//! a blend of an already-rasterized pixmap or a gradient fill. Pass order
//! matters; the notch punch-out in particular must land after every
//! disc-clipped pass and before the rim ring.

use anyhow::{Context, Result};
use tiny_skia::{
    BlendMode, Color, FillRule, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Shader,
    Transform,
};

use crate::layers::LayerSet;
use crate::motion::FramePose;
use crate::profile::RenderPlan;
use crate::raster::{self, faded_stops, stops, tint};
use crate::types::{Bounds, RimStyle};

/// Page-style backdrop behind the wafer; the notch punches through to it.
pub fn backdrop() -> Color {
    Color::from_rgba8(8, 11, 18, 255)
}

/// Laser-scribed lot/wafer identifier near the bottom edge.
const WAFER_ID: &str = "T4 N05-2287";

/// Angular rim gradient, sampled per arc segment in sweep mode.
const RIM_SWEEP: [(f32, (u8, u8, u8, f32)); 7] = [
    (0.0, (200, 218, 240, 0.92)),
    (0.15, (240, 245, 255, 0.98)),
    (0.35, (140, 170, 210, 0.88)),
    (0.55, (200, 220, 245, 0.94)),
    (0.75, (240, 248, 255, 0.96)),
    (0.9, (160, 185, 220, 0.9)),
    (1.0, (200, 218, 240, 0.92)),
];

pub struct Compositor {
    plan: RenderPlan,
    rim: RimStyle,
}

impl Compositor {
    pub fn new(plan: RenderPlan, rim: RimStyle) -> Self {
        Self { plan, rim }
    }

    pub fn plan(&self) -> &RenderPlan {
        &self.plan
    }

    /// Composites one frame into `frame`, whose pixel size is the logical
    /// bounds times `scale`. The frame is cleared to transparent; the
    /// caller supplies the backdrop.
    pub fn render(
        &self,
        frame: &mut Pixmap,
        scale: f32,
        bounds: &Bounds,
        layers: &LayerSet,
        pose: &FramePose,
    ) -> Result<()> {
        let plan = &self.plan;
        let radius = bounds.radius;
        let (cx, cy) = pose.center;
        let rot_deg = pose.rotation.to_degrees();
        let (px, py) = pose.pointer;
        let refl = pose.refl_energy;

        let device = Transform::from_scale(scale, scale);
        // Local wafer frame: rotate about the disc center, then place.
        let place = Transform::from_rotate(rot_deg)
            .post_translate(cx, cy)
            .post_concat(device);
        // Layer pixels to local logical units.
        let layer_scale = 2.0 * radius / layers.size as f32;
        let layer_tf = Transform::from_scale(layer_scale, layer_scale)
            .post_translate(-radius, -radius)
            .post_concat(place);

        frame.fill(Color::TRANSPARENT);

        // 1. Ambient aura behind everything, unrotated.
        let aura = raster::radial(
            cx,
            cy,
            cx,
            cy,
            radius * 1.32,
            stops(&[
                (0.0, tint(100, 160, 220, 0.16)),
                (0.136, tint(100, 160, 220, 0.16)),
                (0.568, tint(70, 120, 180, 0.05)),
                (1.0, tint(0, 0, 0, 0.0)),
            ]),
        );
        if let Some(disc) = raster::circle(cx, cy, radius * 1.34) {
            frame.fill_path(
                &disc,
                &paint(aura, BlendMode::SourceOver),
                FillRule::Winding,
                device,
                None,
            );
        }

        // 2. Drop shadow below the disc.
        match &layers.shadow {
            Some(sprite) => {
                let f = 2.0 * radius / layers.size as f32;
                let tf = Transform::from_scale(f, f)
                    .post_translate(-radius, radius * 0.88 - sprite.height() as f32 * 0.5 * f)
                    .post_concat(place);
                frame.draw_pixmap(
                    0,
                    0,
                    sprite.as_ref(),
                    &PixmapPaint {
                        opacity: plan.shadow_alpha,
                        blend_mode: BlendMode::SourceOver,
                        quality: tiny_skia::FilterQuality::Bilinear,
                    },
                    tf,
                    None,
                );
            }
            None => {
                if let Some(rect) = Rect::from_xywh(
                    -radius * 0.78,
                    radius * 0.88 - radius * 0.16,
                    radius * 1.56,
                    radius * 0.32,
                ) {
                    if let Some(oval) = PathBuilder::from_oval(rect) {
                        frame.fill_path(
                            &oval,
                            &paint(
                                Shader::SolidColor(tint(0, 0, 0, plan.shadow_alpha)),
                                BlendMode::SourceOver,
                            ),
                            FillRule::Winding,
                            place,
                            None,
                        );
                    }
                }
            }
        }

        // 3. Everything up to the vignette is clipped to the disc.
        let mut disc_mask =
            Mask::new(frame.width(), frame.height()).context("allocate disc mask")?;
        if let Some(disc) = raster::circle(0.0, 0.0, radius * 0.99) {
            disc_mask.fill_path(&disc, FillRule::Winding, true, place);
        }

        // 4. Substrate and die grid.
        frame.draw_pixmap(
            0,
            0,
            layers.base.as_ref(),
            &PixmapPaint {
                opacity: 1.0,
                blend_mode: BlendMode::SourceOver,
                quality: tiny_skia::FilterQuality::Bilinear,
            },
            layer_tf,
            Some(&disc_mask),
        );

        // 5. Thin-film sheen, counter-rotating and sheared by the pointer.
        let film_extra = -pose.rotation * 1.4 + px * 0.06 + py * 0.04;
        let film_tf = Transform::from_scale(layer_scale, layer_scale)
            .post_translate(-radius + px * radius * 0.04, -radius + py * radius * 0.03)
            .post_concat(Transform::from_rotate(film_extra.to_degrees()))
            .post_concat(place);
        frame.draw_pixmap(
            0,
            0,
            layers.film.as_ref(),
            &PixmapPaint {
                opacity: plan.film_opacity,
                blend_mode: BlendMode::Screen,
                quality: tiny_skia::FilterQuality::Bilinear,
            },
            film_tf,
            Some(&disc_mask),
        );

        // 6. Grain.
        frame.draw_pixmap(
            0,
            0,
            layers.grain.as_ref(),
            &PixmapPaint {
                opacity: plan.grain_opacity,
                blend_mode: BlendMode::Overlay,
                quality: tiny_skia::FilterQuality::Nearest,
            },
            layer_tf,
            Some(&disc_mask),
        );

        let local_disc = raster::circle(0.0, 0.0, radius);

        // 7. Tilt shading opposite the pointer.
        if plan.tilt_shade {
            let tilt = raster::linear(
                -radius * 0.8 - px * radius * 0.2,
                -radius * 0.3 - py * radius * 0.15,
                radius * 0.9 + px * radius * 0.15,
                radius * 0.35 + py * radius * 0.1,
                stops(&[
                    (0.0, tint(0, 6, 16, 0.01)),
                    (0.48, tint(0, 6, 16, 0.1)),
                    (1.0, tint(0, 6, 16, 0.22)),
                ]),
            );
            if let Some(disc) = &local_disc {
                frame.fill_path(
                    disc,
                    &paint(tilt, BlendMode::Multiply),
                    FillRule::Winding,
                    place,
                    Some(&disc_mask),
                );
            }
        }

        // 8. Specular highlight and hot glint.
        let vvx = px + pose.drift.0 / radius.max(1.0);
        let vvy = py + pose.drift.1 / radius.max(1.0);
        let lx = -radius * 0.25 - vvx * radius * 0.18;
        let ly = -radius * 0.35 - vvy * radius * 0.16;

        let spec = raster::radial(
            lx,
            ly,
            lx,
            ly,
            radius * 0.26,
            stops(&[
                (0.0, tint(255, 255, 255, 0.75 + refl * 0.2)),
                (0.18, tint(220, 240, 255, 0.2 + refl * 0.08)),
                (1.0, tint(255, 255, 255, 0.0)),
            ]),
        );
        if let Some(halo) = raster::circle(lx, ly, radius * 0.26) {
            frame.fill_path(
                &halo,
                &paint(spec, BlendMode::SourceOver),
                FillRule::Winding,
                place,
                Some(&disc_mask),
            );
        }
        let glint = raster::radial(
            lx * 0.97,
            ly * 0.97,
            lx * 0.97,
            ly * 0.97,
            radius * 0.055,
            stops(&[
                (0.0, tint(255, 255, 255, 0.88 + refl * 0.1)),
                (1.0, tint(255, 255, 255, 0.0)),
            ]),
        );
        if let Some(dot) = raster::circle(lx * 0.97, ly * 0.97, radius * 0.055) {
            frame.fill_path(
                &dot,
                &paint(glint, BlendMode::SourceOver),
                FillRule::Winding,
                place,
                Some(&disc_mask),
            );
        }

        // 9. Cleanroom light-tube streak.
        let streak_rot = -0.32 + vvx * 0.2 + pose.drift_rot * 0.6;
        let streak_tf = Transform::from_rotate(streak_rot.to_degrees())
            .post_translate(lx * 0.42, ly * 0.38)
            .post_concat(place);
        let tube_stops = [
            (0.0, tint(255, 255, 255, 0.0)),
            (0.44, tint(200, 228, 255, 0.08 + refl * 0.04)),
            (0.49, tint(255, 255, 255, 0.52 + refl * 0.14)),
            (0.5, tint(255, 255, 255, 0.78 + refl * 0.16)),
            (0.51, tint(255, 255, 255, 0.52 + refl * 0.14)),
            (0.56, tint(200, 228, 255, 0.08 + refl * 0.04)),
            (1.0, tint(255, 255, 255, 0.0)),
        ];
        let tube = raster::linear(
            -radius * 0.92,
            0.0,
            radius * 0.92,
            0.0,
            stops(&tube_stops),
        );
        if let Some(rect) =
            Rect::from_xywh(-radius * 0.95, -radius * 0.032, radius * 1.9, radius * 0.064)
        {
            frame.fill_rect(
                rect,
                &paint(tube, BlendMode::Screen),
                streak_tf,
                Some(&disc_mask),
            );
        }
        if plan.second_streak {
            let faint = raster::linear(
                -radius * 0.92,
                0.0,
                radius * 0.92,
                0.0,
                faded_stops(&tube_stops, 0.4),
            );
            if let Some(rect) = Rect::from_xywh(
                -radius * 0.88,
                radius * 0.06 - radius * 0.025,
                radius * 1.76,
                radius * 0.05,
            ) {
                frame.fill_rect(
                    rect,
                    &paint(faint, BlendMode::Screen),
                    streak_tf,
                    Some(&disc_mask),
                );
            }
        }

        // 10. Chromatic fringe opposite the specular center.
        if plan.chromatic_fringe {
            let fa = ly.atan2(lx) + std::f32::consts::PI;
            let fr = radius * 0.22;
            let fcx = lx + fa.cos() * fr * 0.7;
            let fcy = ly + fa.sin() * fr * 0.7;
            let fringe = raster::radial(
                fcx,
                fcy,
                fcx,
                fcy,
                fr,
                faded_stops(
                    &[
                        (0.0, tint(180, 140, 255, 0.3)),
                        (0.3, tint(180, 140, 255, 0.3)),
                        (0.545, tint(100, 180, 255, 0.25)),
                        (0.72, tint(120, 255, 180, 0.2)),
                        (0.86, tint(255, 220, 100, 0.15)),
                        (1.0, tint(255, 255, 255, 0.0)),
                    ],
                    0.12 + refl * 0.05,
                ),
            );
            if let Some(halo) = raster::circle(fcx, fcy, fr) {
                frame.fill_path(
                    &halo,
                    &paint(fringe, BlendMode::Screen),
                    FillRule::Winding,
                    place,
                    Some(&disc_mask),
                );
            }
        }

        // 11. Depth of field: pre-blurred rims inside an annulus.
        if plan.depth_of_field {
            if let (Some(base_soft), Some(film_soft)) = (&layers.base_soft, &layers.film_soft) {
                let mut annulus =
                    Mask::new(frame.width(), frame.height()).context("allocate dof mask")?;
                let mut pb = PathBuilder::new();
                raster::push_arc(&mut pb, 0.0, 0.0, radius * 0.995, 0.0, std::f32::consts::TAU);
                pb.close();
                raster::push_arc(
                    &mut pb,
                    0.0,
                    0.0,
                    radius * plan.dof_inner,
                    0.0,
                    std::f32::consts::TAU,
                );
                pb.close();
                if let Some(path) = pb.finish() {
                    annulus.fill_path(&path, FillRule::EvenOdd, true, place);
                }

                frame.draw_pixmap(
                    0,
                    0,
                    base_soft.as_ref(),
                    &PixmapPaint {
                        opacity: 0.14 * plan.dof_strength,
                        blend_mode: BlendMode::SourceOver,
                        quality: tiny_skia::FilterQuality::Bilinear,
                    },
                    layer_tf,
                    Some(&annulus),
                );
                let soft_film_tf = Transform::from_scale(layer_scale, layer_scale)
                    .post_translate(-radius, -radius)
                    .post_concat(Transform::from_rotate((-pose.rotation * 1.1).to_degrees()))
                    .post_concat(place);
                frame.draw_pixmap(
                    0,
                    0,
                    film_soft.as_ref(),
                    &PixmapPaint {
                        opacity: 0.07 * plan.dof_strength,
                        blend_mode: BlendMode::Screen,
                        quality: tiny_skia::FilterQuality::Bilinear,
                    },
                    soft_film_tf,
                    Some(&annulus),
                );
            }
        }

        // 12. Edge vignette.
        let vignette = raster::radial(
            0.0,
            0.0,
            0.0,
            0.0,
            radius * 1.02,
            stops(&[
                (0.0, tint(0, 0, 0, 0.0)),
                (0.51, tint(0, 0, 0, 0.0)),
                (0.853, tint(0, 0, 0, 0.18)),
                (1.0, tint(0, 0, 0, 0.46)),
            ]),
        );
        if let Some(disc) = &local_disc {
            frame.fill_path(
                disc,
                &paint(vignette, BlendMode::SourceOver),
                FillRule::Winding,
                place,
                Some(&disc_mask),
            );
        }

        // 13. Orientation notch, punched through to the backdrop.
        let mut notch = PathBuilder::new();
        raster::push_arc(
            &mut notch,
            0.0,
            radius * 0.985,
            radius * 0.042,
            0.0,
            -std::f32::consts::PI,
        );
        notch.close();
        if let Some(path) = notch.finish() {
            frame.fill_path(
                &path,
                &paint(Shader::SolidColor(Color::WHITE), BlendMode::DestinationOut),
                FillRule::Winding,
                place,
                None,
            );
        }

        // 14. Bevel ring with glow, over the notch edges.
        self.draw_rim(frame, radius, place)?;

        // 15. Laser wafer ID.
        if plan.wafer_id {
            draw_wafer_id(frame, radius, place);
        }

        Ok(())
    }

    fn draw_rim(&self, frame: &mut Pixmap, radius: f32, place: Transform) -> Result<()> {
        let bevel_w = (radius * 0.012).max(2.5);
        let glow = radius * self.plan.rim_glow_factor;
        let rim_r = radius * 0.995;

        let ring = raster::circle(0.0, 0.0, rim_r).context("rim circle path")?;

        // Halo strokes stand in for a canvas-style shadow blur.
        for (spread, alpha) in [(4.0, 0.06), (2.0, 0.12)] {
            frame.stroke_path(
                &ring,
                &paint(
                    Shader::SolidColor(tint(140, 200, 255, alpha)),
                    BlendMode::SourceOver,
                ),
                &tiny_skia::Stroke {
                    width: bevel_w + glow * spread,
                    ..tiny_skia::Stroke::default()
                },
                place,
                None,
            );
        }

        let stroke = tiny_skia::Stroke {
            width: bevel_w,
            ..tiny_skia::Stroke::default()
        };
        match self.rim {
            RimStyle::Sweep => {
                const SEGMENTS: u32 = 72;
                let step = std::f32::consts::TAU / SEGMENTS as f32;
                for i in 0..SEGMENTS {
                    let t = (i as f32 + 0.5) / SEGMENTS as f32;
                    let start = i as f32 * step;
                    // Slight overlap hides the seams between segments.
                    if let Some(arc) = raster::arc_path(0.0, 0.0, rim_r, start, step * 1.15) {
                        frame.stroke_path(
                            &arc,
                            &paint(Shader::SolidColor(rim_sweep_color(t)), BlendMode::SourceOver),
                            &stroke,
                            place,
                            None,
                        );
                    }
                }
            }
            RimStyle::Linear => {
                let rim = raster::linear(
                    -radius,
                    -radius,
                    radius,
                    radius,
                    stops(&[
                        (0.0, tint(240, 245, 255, 0.96)),
                        (0.4, tint(160, 190, 225, 0.9)),
                        (0.7, tint(200, 220, 245, 0.94)),
                        (1.0, tint(240, 248, 255, 0.92)),
                    ]),
                );
                frame.stroke_path(&ring, &paint(rim, BlendMode::SourceOver), &stroke, place, None);
            }
        }

        if self.plan.inner_rim_ring {
            if let Some(inner) = raster::circle(0.0, 0.0, radius * 0.985) {
                frame.stroke_path(
                    &inner,
                    &paint(
                        Shader::SolidColor(tint(100, 130, 170, 0.18)),
                        BlendMode::SourceOver,
                    ),
                    &tiny_skia::Stroke {
                        width: 0.8,
                        ..tiny_skia::Stroke::default()
                    },
                    place,
                    None,
                );
            }
        }

        Ok(())
    }
}

fn paint(shader: Shader<'static>, blend_mode: BlendMode) -> Paint<'static> {
    Paint {
        shader,
        blend_mode,
        anti_alias: true,
        ..Paint::default()
    }
}

/// Samples the angular rim gradient at `t` in `[0, 1]`.
fn rim_sweep_color(t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    for pair in RIM_SWEEP.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            let lerp = |a: u8, b: u8| a as f32 + (b as f32 - a as f32) * f;
            return tint(
                lerp(c0.0, c1.0) as u8,
                lerp(c0.1, c1.1) as u8,
                lerp(c0.2, c1.2) as u8,
                c0.3 + (c1.3 - c0.3) * f,
            );
        }
    }
    let last = RIM_SWEEP[RIM_SWEEP.len() - 1].1;
    tint(last.0, last.1, last.2, last.3)
}

/// 5x7 dot-matrix glyphs for the characters the wafer ID needs; the scribe
/// is too small for real text shaping to matter.
fn glyph(ch: char) -> [u8; 7] {
    match ch {
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '-' => [0, 0, 0, 0b01110, 0, 0, 0],
        _ => [0; 7],
    }
}

fn draw_wafer_id(frame: &mut Pixmap, radius: f32, place: Transform) {
    let height = (radius * 0.016).max(5.0);
    let dot = height / 7.0;
    let advance = dot * 6.0;
    let total = advance * WAFER_ID.chars().count() as f32 - dot;
    let left = -total * 0.5;
    let top = radius * 0.93 - height;

    let mut pb = PathBuilder::new();
    for (index, ch) in WAFER_ID.chars().enumerate() {
        let rows = glyph(ch);
        let gx = left + index as f32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..5 {
                if bits & (0b10000 >> col) != 0 {
                    if let Some(rect) = Rect::from_xywh(
                        gx + col as f32 * dot,
                        top + row as f32 * dot,
                        dot,
                        dot,
                    ) {
                        pb.push_rect(rect);
                    }
                }
            }
        }
    }
    if let Some(path) = pb.finish() {
        frame.fill_path(
            &path,
            &paint(
                Shader::SolidColor(tint(0x8a, 0xa0, 0xc0, 0.15)),
                BlendMode::SourceOver,
            ),
            FillRule::Winding,
            place,
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerSet;
    use crate::motion::MotionModel;
    use crate::profile::{QualityTier, RenderPlan, TierProfile};

    struct Scene {
        bounds: Bounds,
        layers: LayerSet,
        plan: RenderPlan,
        pose: crate::motion::FramePose,
    }

    fn scene(tier: QualityTier) -> Scene {
        let bounds = Bounds::new(320.0, 240.0);
        let profile = TierProfile::for_tier(tier);
        let plan = RenderPlan::for_tier(tier);
        let layers = LayerSet::build(&bounds, &profile, &plan).expect("layers");
        // Reduced motion pins the pose, so frames are reproducible.
        let mut motion = MotionModel::with_drift_phase(true, 0.0);
        let pose = motion.pose(0.0, &bounds, &profile);
        Scene {
            bounds,
            layers,
            plan,
            pose,
        }
    }

    fn render(scene: &Scene, rim: RimStyle) -> Pixmap {
        let mut frame =
            Pixmap::new(scene.bounds.width as u32, scene.bounds.height as u32).expect("frame");
        Compositor::new(scene.plan, rim)
            .render(&mut frame, 1.0, &scene.bounds, &scene.layers, &scene.pose)
            .expect("render");
        frame
    }

    #[test]
    fn identical_inputs_give_identical_frames() {
        let s = scene(QualityTier::High);
        let a = render(&s, RimStyle::Sweep);
        let b = render(&s, RimStyle::Sweep);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn frame_has_content_at_disc_center() {
        let s = scene(QualityTier::Mobile);
        let frame = render(&s, RimStyle::Sweep);
        let (cx, cy) = s.pose.center;
        let pixel = frame
            .pixel(cx as u32, cy as u32)
            .expect("center pixel in frame");
        assert!(pixel.alpha() > 200, "disc center should be opaque");
    }

    #[test]
    fn notch_is_punched_transparent() {
        let s = scene(QualityTier::High);
        let frame = render(&s, RimStyle::Sweep);
        // Local point inside the notch semicircle, rotated into place.
        let rot = s.pose.rotation;
        let (lx, ly) = (0.0_f32, s.bounds.radius * 0.96);
        let x = s.pose.center.0 + lx * rot.cos() - ly * rot.sin();
        let y = s.pose.center.1 + lx * rot.sin() + ly * rot.cos();
        let pixel = frame.pixel(x as u32, y as u32).expect("notch pixel");
        assert_eq!(pixel.alpha(), 0, "notch should reveal the backdrop");
    }

    #[test]
    fn rim_styles_produce_different_frames() {
        let s = scene(QualityTier::High);
        let sweep = render(&s, RimStyle::Sweep);
        let linear = render(&s, RimStyle::Linear);
        assert_ne!(sweep.data(), linear.data());
    }
}
