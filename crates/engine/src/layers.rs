//! Cached off-screen layers.
//!
//! Everything expensive is rasterized here, once per resize or tier
//! change; the per-frame compositor only transforms and blends these
//! pixmaps. Layers are square and wafer-sized so the compositor can map
//! them onto the disc with a single scale. Blurred variants (drop shadow,
//! depth-of-field rims) are also precomputed because the frame loop must
//! never run a convolution.

use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tiny_skia::{
    BlendMode, Color, FillRule, Mask, Paint, PathBuilder, Pixmap, Rect, Shader, Stroke, Transform,
};

use crate::noise::hash2;
use crate::profile::{QualityTier, RenderPlan, TierProfile};
use crate::raster::{self, tint};
use crate::types::Bounds;

/// Inner fraction of the layer radius that carries dies; the ring outside
/// is bare polished silicon.
pub const ACTIVE_FRACTION: f32 = 0.96;

/// The four cached layers plus their derived blurred sprites.
pub struct LayerSet {
    pub size: u32,
    pub die_size: (u32, u32),
    pub die: Pixmap,
    pub base: Pixmap,
    pub film: Pixmap,
    pub grain: Pixmap,
    /// Pre-blurred drop shadow; absent on plans that use a hard ellipse.
    pub shadow: Option<Pixmap>,
    /// Blurred copies of base/film for the depth-of-field rim pass.
    pub base_soft: Option<Pixmap>,
    pub film_soft: Option<Pixmap>,
    built_for: (Bounds, QualityTier),
}

impl LayerSet {
    pub fn build(bounds: &Bounds, profile: &TierProfile, plan: &RenderPlan) -> Result<LayerSet> {
        let size = profile.layer_size(bounds.width);
        let r = size as f32 * 0.5;

        let (die, die_size) = build_die_template(size, profile.dies_across)?;
        let base = build_base_layer(size, r, &die, die_size, profile.polish_marks)?;
        let film = build_film_layer(size, r)?;
        let grain = build_grain_layer(size)?;

        // Layer pixels map to logical pixels through this factor.
        let layer_scale = size as f32 / (2.0 * bounds.radius);

        let shadow = if plan.shadow_blur_px > 0.0 {
            Some(build_shadow_sprite(
                size,
                plan.shadow_blur_px * layer_scale,
            )?)
        } else {
            None
        };

        let (base_soft, film_soft) = if plan.depth_of_field {
            let sigma_logical = (bounds.radius * 0.01 * plan.dof_strength).max(2.0);
            let sigma = sigma_logical * layer_scale * 0.5;
            (
                Some(raster::blurred(&base, sigma).context("blur base layer")?),
                Some(raster::blurred(&film, sigma).context("blur film layer")?),
            )
        } else {
            (None, None)
        };

        tracing::debug!(
            size,
            die_w = die_size.0,
            die_h = die_size.1,
            tier = profile.tier.label(),
            "layers rebuilt"
        );

        Ok(LayerSet {
            size,
            die_size,
            die,
            base,
            film,
            grain,
            shadow,
            base_soft,
            film_soft,
            built_for: (*bounds, profile.tier),
        })
    }

    /// Whether the cache is still valid for this geometry and tier.
    pub fn matches(&self, bounds: &Bounds, tier: QualityTier) -> bool {
        self.built_for == (*bounds, tier)
    }
}

fn pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).context("allocate layer pixmap")
}

fn solid(color: Color) -> Paint<'static> {
    Paint {
        shader: Shader::SolidColor(color),
        ..Paint::default()
    }
}

fn shaded(shader: Shader<'static>, anti_alias: bool) -> Paint<'static> {
    Paint {
        shader,
        anti_alias,
        ..Paint::default()
    }
}

fn fill_px(canvas: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
    if let Some(rect) = Rect::from_xywh(x, y, w, h) {
        canvas.fill_rect(rect, paint, Transform::identity(), None);
    }
}

fn stroke_of(width: f32) -> Stroke {
    Stroke {
        width,
        ..Stroke::default()
    }
}

/// One die's IC floorplan: bond-pad ring, SRAM block, standard-cell logic
/// rows, an analog corner with a spiral inductor, power rails and corner
/// alignment marks.
fn build_die_template(wafer_size: u32, dies_across: u32) -> Result<(Pixmap, (u32, u32))> {
    let dw = (wafer_size / dies_across).max(4);
    let dh = (dw as f32 * 1.32).floor() as u32;
    let mut c = pixmap(dw, dh)?;
    let (dwf, dhf) = (dw as f32, dh as f32);

    c.fill(Color::from_rgba8(0x2c, 0x36, 0x48, 255));

    let density = raster::linear(
        0.0,
        0.0,
        dwf,
        dhf,
        raster::stops(&[
            (0.0, tint(90, 110, 140, 0.06)),
            (0.5, tint(70, 90, 120, 0.03)),
            (1.0, tint(100, 120, 150, 0.07)),
        ]),
    );
    fill_px(&mut c, 0.0, 0.0, dwf, dhf, &shaded(density, false));

    let pad = (dwf * 0.038).floor().max(2.0);
    let pad_gap = (dwf * 0.065).floor().max(4.0);
    let margin = (dwf * 0.058).floor().max(3.0);
    let inner_w = dwf - margin * 2.0;
    let inner_h = dhf - margin * 2.0;

    // Bond pad ring.
    let gold = solid(tint(185, 170, 105, 0.52));
    let mut x = margin;
    while x + pad <= dwf - margin {
        fill_px(&mut c, x, margin - pad + 1.0, pad, pad, &gold);
        fill_px(&mut c, x, dhf - margin - 1.0, pad, pad, &gold);
        x += pad_gap;
    }
    let mut y = margin + pad_gap;
    while y + pad <= dhf - margin - pad_gap {
        fill_px(&mut c, margin - pad + 1.0, y, pad, pad, &gold);
        fill_px(&mut c, dwf - margin - 1.0, y, pad, pad, &gold);
        y += pad_gap;
    }

    // Specular pad highlights.
    let glintp = solid(tint(230, 220, 170, 0.22));
    let mut x = margin;
    while x + pad <= dwf - margin {
        fill_px(&mut c, x + 1.0, margin - pad + 2.0, 1.0, 1.0, &glintp);
        fill_px(&mut c, x + 1.0, dhf - margin, 1.0, 1.0, &glintp);
        x += pad_gap;
    }

    let core_x = margin + pad + 2.0;
    let core_y = margin + pad + 2.0;
    let core_w = inner_w - (pad + 2.0) * 2.0;
    let core_h = inner_h - (pad + 2.0) * 2.0;

    // SRAM / cache block with its bit-cell grid.
    let sram_h = (core_h * 0.35).floor();
    let mem_pitch = (dwf * 0.025).floor().max(2.0);
    fill_px(
        &mut c,
        core_x,
        core_y,
        core_w,
        sram_h,
        &solid(tint(42, 52, 68, 0.9)),
    );

    let mut grid = PathBuilder::new();
    let mut y = core_y;
    while y < core_y + sram_h {
        grid.move_to(core_x, y);
        grid.line_to(core_x + core_w, y);
        y += mem_pitch;
    }
    let mut x = core_x;
    while x < core_x + core_w {
        grid.move_to(x, core_y);
        grid.line_to(x, core_y + sram_h);
        x += mem_pitch;
    }
    if let Some(path) = grid.finish() {
        c.stroke_path(
            &path,
            &solid(tint(100, 130, 170, 0.16)),
            &stroke_of(0.4),
            Transform::identity(),
            None,
        );
    }

    let cell = solid(tint(130, 160, 200, 0.14));
    let mut y = core_y + 1.0;
    while y < core_y + sram_h {
        let mut x = core_x + 1.0;
        while x < core_x + core_w {
            fill_px(&mut c, x, y, 1.0, 1.0, &cell);
            x += mem_pitch * 2.0;
        }
        y += mem_pitch * 2.0;
    }

    let mut divider = PathBuilder::new();
    divider.move_to(core_x, core_y + sram_h);
    divider.line_to(core_x + core_w, core_y + sram_h);
    if let Some(path) = divider.finish() {
        c.stroke_path(
            &path,
            &solid(tint(150, 175, 210, 0.2)),
            &stroke_of(0.7),
            Transform::identity(),
            None,
        );
    }

    // Standard-cell logic rows; the hash drops some rows and jitters ends.
    let logic_y = core_y + sram_h + 2.0;
    let logic_h = core_h - sram_h - 4.0;
    let spacing = (dwf * 0.028).floor().max(2.0);

    let mut rows = PathBuilder::new();
    let mut y = logic_y;
    while y < logic_y + logic_h {
        let n = hash2(y * 0.31, 42.7);
        if n >= 0.25 {
            rows.move_to(core_x + n * spacing * 2.0, y);
            rows.line_to(core_x + core_w - (1.0 - n) * spacing, y);
        }
        y += spacing;
    }
    if let Some(path) = rows.finish() {
        c.stroke_path(
            &path,
            &solid(tint(120, 148, 185, 0.14)),
            &stroke_of(0.45),
            Transform::identity(),
            None,
        );
    }

    let mut columns = PathBuilder::new();
    let mut x = core_x;
    while x < core_x + core_w {
        let n = hash2(x * 0.19, 23.1);
        if n >= 0.3 {
            columns.move_to(x, logic_y + n * spacing);
            columns.line_to(x, logic_y + logic_h - (1.0 - n) * spacing * 2.0);
        }
        x += spacing;
    }
    if let Some(path) = columns.finish() {
        c.stroke_path(
            &path,
            &solid(tint(110, 140, 178, 0.12)),
            &stroke_of(0.45),
            Transform::identity(),
            None,
        );
    }

    let via = solid(tint(155, 180, 215, 0.1));
    let mut y = logic_y;
    while y < logic_y + logic_h {
        let mut x = core_x;
        while x < core_x + core_w {
            if hash2(x * 0.53, y * 0.41) > 0.55 {
                fill_px(&mut c, x, y, 1.0, 1.0, &via);
            }
            x += spacing * 2.0;
        }
        y += spacing * 2.0;
    }

    // Analog corner block with a spiral inductor.
    let ana_w = (core_w * 0.22).floor();
    let ana_h = (logic_h * 0.3).floor();
    let ana_x = core_x + core_w - ana_w - 1.0;
    let ana_y = logic_y + logic_h - ana_h - 1.0;
    fill_px(&mut c, ana_x, ana_y, ana_w, ana_h, &solid(tint(50, 62, 82, 0.5)));
    if let Some(rect) = Rect::from_xywh(ana_x, ana_y, ana_w, ana_h) {
        c.stroke_path(
            &PathBuilder::from_rect(rect),
            &solid(tint(130, 155, 190, 0.12)),
            &stroke_of(0.4),
            Transform::identity(),
            None,
        );
    }

    let ind_cx = ana_x + ana_w * 0.5;
    let ind_cy = ana_y + ana_h * 0.5;
    let ind_r = ana_w.min(ana_h) * 0.32;
    let coil = solid(tint(140, 170, 210, 0.18));
    for turn in 0..3 {
        let radius = ind_r * (0.35 + turn as f32 * 0.25);
        if let Some(path) =
            raster::arc_path(ind_cx, ind_cy, radius, 0.0, std::f32::consts::PI * 1.7)
        {
            c.stroke_path(&path, &coil, &stroke_of(0.5), Transform::identity(), None);
        }
    }

    // Power rails.
    let mut rails = PathBuilder::new();
    for ry in [0.28, 0.54, 0.78] {
        rails.move_to(1.0, (dhf * ry).floor());
        rails.line_to(dwf - 1.0, (dhf * ry).floor());
    }
    if let Some(path) = rails.finish() {
        c.stroke_path(
            &path,
            &solid(tint(160, 185, 220, 0.18)),
            &stroke_of((dwf * 0.014).max(1.0)),
            Transform::identity(),
            None,
        );
    }
    let vx = (dwf * 0.5).floor();
    let mut spine = PathBuilder::new();
    spine.move_to(vx, margin);
    spine.line_to(vx, dhf - margin);
    if let Some(path) = spine.finish() {
        c.stroke_path(
            &path,
            &solid(tint(150, 178, 215, 0.14)),
            &stroke_of((dwf * 0.012).max(1.0)),
            Transform::identity(),
            None,
        );
    }

    // Corner alignment marks.
    let mk = (dwf * 0.06).floor().max(3.0);
    let mut marks = PathBuilder::new();
    for (ccx, ccy, ddx, ddy) in [
        (2.0, 2.0, 1.0, 1.0),
        (dwf - 2.0, 2.0, -1.0, 1.0),
        (2.0, dhf - 2.0, 1.0, -1.0),
        (dwf - 2.0, dhf - 2.0, -1.0, -1.0),
    ] {
        marks.move_to(ccx, ccy);
        marks.line_to(ccx + mk * ddx, ccy);
        marks.move_to(ccx, ccy);
        marks.line_to(ccx, ccy + mk * ddy);
    }
    if let Some(path) = marks.finish() {
        c.stroke_path(
            &path,
            &solid(tint(180, 200, 230, 0.22)),
            &stroke_of(0.6),
            Transform::identity(),
            None,
        );
    }

    // Scribe-facing outline.
    if let Some(rect) = Rect::from_xywh(0.5, 0.5, dwf - 1.0, dhf - 1.0) {
        c.stroke_path(
            &PathBuilder::from_rect(rect),
            &solid(tint(90, 115, 150, 0.15)),
            &stroke_of(0.6),
            Transform::identity(),
            None,
        );
    }

    Ok((c, (dw, dh)))
}

/// Substrate disc with the stepped die grid, polish marks on the bare ring
/// and a process-nonuniformity gradient over the whole disc.
fn build_base_layer(
    size: u32,
    r: f32,
    die: &Pixmap,
    die_size: (u32, u32),
    polish_marks: u32,
) -> Result<Pixmap> {
    let mut c = pixmap(size, size)?;

    // Substrate gradient, slightly off-center toward the light.
    let sub = raster::radial(
        r - r * 0.08,
        r - r * 0.06,
        r,
        r,
        r,
        raster::stops(&[
            (0.0, Color::from_rgba8(0x3a, 0x43, 0x58, 255)),
            (0.55, Color::from_rgba8(0x2f, 0x38, 0x48, 255)),
            (0.88, Color::from_rgba8(0x24, 0x2c, 0x3a, 255)),
            (1.0, Color::from_rgba8(0x1a, 0x20, 0x30, 255)),
        ]),
    );
    if let Some(disc) = raster::circle(r, r, r * 0.995) {
        c.fill_path(
            &disc,
            &shaded(sub, true),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    let active_r = r * ACTIVE_FRACTION;

    // Radial polish marks on the bare-silicon ring.
    let mut ring = Mask::new(size, size).context("allocate ring mask")?;
    let mut annulus = PathBuilder::new();
    raster::push_arc(&mut annulus, r, r, r * 0.993, 0.0, std::f32::consts::TAU);
    annulus.close();
    raster::push_arc(&mut annulus, r, r, active_r, 0.0, std::f32::consts::TAU);
    annulus.close();
    if let Some(path) = annulus.finish() {
        ring.fill_path(&path, FillRule::EvenOdd, true, Transform::identity());
        for i in 0..polish_marks {
            let angle = i as f32 / polish_marks as f32 * std::f32::consts::TAU;
            let n = hash2(i as f32 * 7.3, i as f32 * 11.1);
            let mut mark = PathBuilder::new();
            mark.move_to(r + angle.cos() * active_r, r + angle.sin() * active_r);
            mark.line_to(r + angle.cos() * r * 0.992, r + angle.sin() * r * 0.992);
            if let Some(path) = mark.finish() {
                c.stroke_path(
                    &path,
                    &solid(tint(140, 160, 185, 0.03 + n * 0.04)),
                    &stroke_of(0.4),
                    Transform::identity(),
                    Some(&ring),
                );
            }
        }
    }

    // Die grid, clipped to the active area.
    let mut active = Mask::new(size, size).context("allocate active mask")?;
    if let Some(disc) = raster::circle(r, r, active_r) {
        active.fill_path(&disc, FillRule::Winding, true, Transform::identity());
        c.fill_path(
            &disc,
            &solid(Color::from_rgba8(0x1e, 0x26, 0x35, 255)),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    let (dw, dh) = (die_size.0 as f32, die_size.1 as f32);
    let scribe = (dw * 0.028).ceil().max(1.0);
    let pitch_x = dw + scribe;
    let pitch_y = dh + scribe;
    let cols = ((active_r * 2.0) / pitch_x).ceil() as i32 + 1;
    let rows = ((active_r * 2.0) / pitch_y).ceil() as i32 + 1;
    let ox = -(cols as f32 * pitch_x) * 0.5;
    let oy = -(rows as f32 * pitch_y) * 0.5;

    let fits = |x: f32, y: f32| {
        let corners = [
            (x, y),
            (x + dw, y),
            (x, y + dh),
            (x + dw, y + dh),
        ];
        corners
            .iter()
            .map(|&(px, py)| px.hypot(py))
            .fold(0.0_f32, f32::max)
            <= active_r - 2.0
    };

    for row in 0..rows {
        for col in 0..cols {
            let x = ox + col as f32 * pitch_x;
            let y = oy + row as f32 * pitch_y;
            if !fits(x, y) {
                continue;
            }

            c.draw_pixmap(
                0,
                0,
                die.as_ref(),
                &tiny_skia::PixmapPaint::default(),
                Transform::from_translate(r + x, r + y),
                Some(&active),
            );

            // Per-die process tint keyed off the grid position.
            let dn = (x + dw * 0.5).hypot(y + dh * 0.5) / active_r;
            let n = hash2(col as f32 * 5.7, row as f32 * 9.3);
            let paint = solid(tint(
                (60.0 + n * 40.0) as u8,
                (80.0 + n * 30.0) as u8,
                (130.0 + n * 40.0) as u8,
                0.01 + dn * 0.025 + n * 0.012,
            ));
            if let Some(rect) = Rect::from_xywh(r + x, r + y, dw, dh) {
                c.fill_rect(rect, &paint, Transform::identity(), Some(&active));
            }
        }
    }

    // PCM test dies with crosshair verniers.
    for (tc, tr) in [
        (cols / 2, rows / 2),
        ((cols as f32 * 0.35) as i32, (rows as f32 * 0.35) as i32),
        ((cols as f32 * 0.65) as i32, (rows as f32 * 0.65) as i32),
    ] {
        let tx = ox + tc as f32 * pitch_x;
        let ty = oy + tr as f32 * pitch_y;
        if !fits(tx, ty) {
            continue;
        }
        if let Some(rect) = Rect::from_xywh(r + tx + 1.0, r + ty + 1.0, dw - 2.0, dh - 2.0) {
            c.fill_rect(
                rect,
                &solid(tint(60, 75, 100, 0.18)),
                Transform::identity(),
                Some(&active),
            );
        }
        let mcx = r + tx + dw * 0.5;
        let mcy = r + ty + dh * 0.5;
        let ms = dw.min(dh) * 0.18;
        let mut cross = PathBuilder::new();
        cross.move_to(mcx - ms, mcy);
        cross.line_to(mcx + ms, mcy);
        cross.move_to(mcx, mcy - ms);
        cross.line_to(mcx, mcy + ms);
        if let Some(path) = cross.finish() {
            c.stroke_path(
                &path,
                &solid(tint(170, 195, 230, 0.22)),
                &stroke_of(0.8),
                Transform::identity(),
                Some(&active),
            );
        }
    }

    // Process non-uniformity wash over the whole disc.
    let proc = raster::radial(
        r + r * 0.04,
        r - r * 0.04,
        r,
        r,
        r,
        raster::stops(&[
            (0.0, tint(70, 90, 130, 0.06)),
            (0.4, tint(50, 70, 110, 0.02)),
            (0.8, tint(30, 40, 70, 0.08)),
            (1.0, tint(15, 22, 38, 0.12)),
        ]),
    );
    if let Some(disc) = raster::circle(r, r, r * 0.995) {
        c.fill_path(
            &disc,
            &shaded(proc, true),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    Ok(c)
}

/// Thin-film interference: SiO₂ 175 nm (center) to 210 nm (edge) per the
/// ASTM oxide color chart, plus asymmetric deposition tint and CMP rings.
fn build_film_layer(size: u32, r: f32) -> Result<Pixmap> {
    let mut c = pixmap(size, size)?;
    let clip_r = r * 0.98;

    let primary = raster::radial(
        r - r * 0.06,
        r - r * 0.04,
        r,
        r,
        r * 0.97,
        raster::stops(&[
            (0.0, tint(55, 72, 200, 0.64)),
            (0.2, tint(58, 78, 205, 0.60)),
            (0.4, tint(65, 92, 210, 0.55)),
            (0.6, tint(75, 108, 214, 0.48)),
            (0.75, tint(85, 125, 212, 0.40)),
            (0.88, tint(100, 145, 205, 0.30)),
            (0.96, tint(120, 162, 195, 0.18)),
            (1.0, tint(130, 170, 190, 0.08)),
        ]),
    );
    let asym = raster::radial(
        r + r * 0.22,
        r - r * 0.18,
        r + r * 0.08,
        r - r * 0.04,
        r * 0.65,
        raster::stops(&[
            (0.0, tint(85, 55, 185, 0.10)),
            (0.5, tint(65, 75, 195, 0.05)),
            (1.0, tint(55, 90, 200, 0.0)),
        ]),
    );
    let warm = raster::linear(
        r - r * 0.7,
        r - r * 0.5,
        r + r * 0.8,
        r + r * 0.6,
        raster::stops(&[
            (0.0, tint(120, 80, 200, 0.04)),
            (0.5, tint(80, 70, 180, 0.02)),
            (1.0, tint(60, 100, 180, 0.04)),
        ]),
    );

    if let Some(disc) = raster::circle(r, r, clip_r) {
        for shader in [primary, asym, warm] {
            c.fill_path(
                &disc,
                &shaded(shader, true),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    // CMP polish rings, slightly off-center.
    let ring_paint = solid(tint(75, 115, 205, 0.04));
    let mut t = 0.18;
    while t < 0.94 {
        if let Some(ring) = raster::circle(r + r * 0.02, r - r * 0.01, r * t) {
            c.stroke_path(
                &ring,
                &ring_paint,
                &stroke_of(1.2),
                Transform::identity(),
                None,
            );
        }
        t += 0.11;
    }

    Ok(c)
}

/// Uniform noise at a constant low alpha, overlay-blended at composite
/// time. Deliberately fresh randomness on every rebuild.
fn build_grain_layer(size: u32) -> Result<Pixmap> {
    let mut c = pixmap(size, size)?;
    let mut rng = StdRng::from_entropy();
    const ALPHA: u16 = 12;
    for px in c.data_mut().chunks_exact_mut(4) {
        let v = 80 + rng.gen_range(0..100) as u16;
        // Store premultiplied, matching the pixmap's internal format.
        let pv = ((v * ALPHA + 127) / 255) as u8;
        px.copy_from_slice(&[pv, pv, pv, ALPHA as u8]);
    }
    Ok(c)
}

/// Soft elliptical drop shadow, blurred at build time so the compositor
/// can stamp it with a plain scaled draw.
fn build_shadow_sprite(size: u32, blur_px: f32) -> Result<Pixmap> {
    let width = size;
    let height = (size / 3).max(8);
    let mut c = pixmap(width, height)?;

    let cx = width as f32 * 0.5;
    let cy = height as f32 * 0.5;
    let rx = size as f32 * 0.39;
    let ry = size as f32 * 0.08;
    if let Some(rect) = Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0) {
        if let Some(oval) = PathBuilder::from_oval(rect) {
            c.fill_path(
                &oval,
                &Paint {
                    shader: Shader::SolidColor(Color::BLACK),
                    anti_alias: true,
                    blend_mode: BlendMode::SourceOver,
                    ..Paint::default()
                },
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    // CSS-style blur radius to gaussian sigma.
    raster::blurred(&c, blur_px * 0.5).context("blur shadow sprite")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{QualityTier, RenderPlan, TierProfile};

    fn build(tier: QualityTier, width: f32, height: f32) -> LayerSet {
        let bounds = Bounds::new(width, height);
        let profile = TierProfile::for_tier(tier);
        let plan = RenderPlan::for_tier(tier);
        LayerSet::build(&bounds, &profile, &plan).expect("build layers")
    }

    #[test]
    fn static_layers_are_deterministic() {
        let a = build(QualityTier::Mobile, 600.0, 400.0);
        let b = build(QualityTier::Mobile, 600.0, 400.0);
        assert_eq!(a.die.data(), b.die.data());
        assert_eq!(a.base.data(), b.base.data());
        assert_eq!(a.film.data(), b.film.data());
    }

    #[test]
    fn grain_is_fresh_per_rebuild() {
        let a = build(QualityTier::Mobile, 600.0, 400.0);
        let b = build(QualityTier::Mobile, 600.0, 400.0);
        assert_ne!(a.grain.data(), b.grain.data());
    }

    #[test]
    fn layer_size_tracks_tier_and_width() {
        assert_eq!(build(QualityTier::Mobile, 600.0, 400.0).size, 760);
        assert_eq!(build(QualityTier::Balanced, 1000.0, 700.0).size, 1180);
        assert_eq!(build(QualityTier::High, 1600.0, 900.0).size, 1420);
    }

    #[test]
    fn blurred_sprites_follow_the_plan() {
        let mobile = build(QualityTier::Mobile, 600.0, 400.0);
        assert!(mobile.shadow.is_none());
        assert!(mobile.base_soft.is_none());

        let high = build(QualityTier::High, 1600.0, 900.0);
        assert!(high.shadow.is_some());
        assert!(high.base_soft.is_some());
        assert!(high.film_soft.is_some());
    }

    #[test]
    fn cache_stamp_invalidates_on_geometry_change() {
        let layers = build(QualityTier::High, 1600.0, 900.0);
        assert!(layers.matches(&Bounds::new(1600.0, 900.0), QualityTier::High));
        assert!(!layers.matches(&Bounds::new(1599.0, 900.0), QualityTier::High));
        assert!(!layers.matches(&Bounds::new(1600.0, 900.0), QualityTier::Balanced));
    }

    #[test]
    fn die_template_has_expected_aspect() {
        let layers = build(QualityTier::Balanced, 1000.0, 700.0);
        let (dw, dh) = layers.die_size;
        assert_eq!(dw, 1180 / 19);
        assert_eq!(dh, (dw as f32 * 1.32).floor() as u32);
    }

    #[test]
    fn grain_alpha_is_uniformly_low() {
        let layers = build(QualityTier::Mobile, 600.0, 400.0);
        for px in layers.grain.data().chunks_exact(4) {
            assert_eq!(px[3], 12);
            assert!(px[0] <= 12);
        }
    }
}
