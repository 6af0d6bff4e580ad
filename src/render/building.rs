use crate::camera::Camera;
use crate::color::{brighten_css, darken_css, rgba_css};
use crate::geometry::building_half_extent;
use crate::model::{Building2D, TileShape, WorldPos};
use crate::surface::{circle_path, fill_circle, label_chip, polygon_path, rounded_rect_path, Surface};

use super::{pulse, px};

#[derive(Debug)]
pub struct BuildingRenderer {
    time: f64,
    indicator_scale: f64,
}

impl Default for BuildingRenderer {
    fn default() -> Self {
        BuildingRenderer { time: 0.0, indicator_scale: 1.0 }
    }
}

impl BuildingRenderer {
    pub fn set_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    pub fn set_indicator_scale(&mut self, scale: f64) {
        self.indicator_scale = scale;
    }

    /// Draws `building` centered on `at`, which differs from its stored
    /// position while it is being dragged.
    pub fn draw(&self, s: &mut dyn Surface, camera: &Camera, building: &Building2D, at: WorldPos, selected: bool) {
        let visual = building.style.visual();
        let fill = building.color.as_deref().unwrap_or(visual.fill);
        let half = building_half_extent(building.scale);
        let status_color = building.status.color();
        let beat = pulse(self.time, building.status.pulse_rate());

        s.save();
        camera.apply_transform(s);

        // Drop shadow
        s.set_fill_color("rgba(0, 0, 0, 0.35)");
        s.begin_path();
        s.ellipse(at.x, at.z + half * 0.9, half * 1.1, half * 0.35, 0.0, 0.0, std::f64::consts::TAU);
        s.fill();

        if selected {
            s.set_shadow(18.0, &rgba_css(visual.accent, 0.9));
        }
        tile_path(s, visual.shape, at, half);
        s.set_fill_linear_gradient(
            at.x,
            at.z - half,
            at.x,
            at.z + half,
            &[(0.0, &brighten_css(fill, 0.15)), (1.0, &darken_css(fill, 0.25))],
        );
        s.fill();
        s.set_shadow(0.0, "transparent");

        // Status border
        s.set_stroke_color(&rgba_css(status_color, 0.45 + 0.55 * beat));
        s.set_line_width(px(camera, if selected { 3.5 } else { 2.5 }));
        tile_path(s, visual.shape, at, half);
        s.stroke();

        // Inner accent
        s.set_stroke_color(&rgba_css(visual.accent, 0.6));
        s.set_line_width(px(camera, 1.0));
        tile_path(s, visual.shape, at, half * 0.78);
        s.stroke();

        if selected {
            s.set_stroke_color(&rgba_css(visual.accent, 0.9));
            s.set_line_width(px(camera, 1.5));
            s.set_line_dash(&[px(camera, 6.0), px(camera, 4.0)]);
            s.set_line_dash_offset(-self.time * px(camera, 16.0));
            tile_path(s, visual.shape, at, half + px(camera, 6.0));
            s.stroke();
            s.set_line_dash(&[]);
        }
        s.restore();

        s.save();
        camera.reset_transform(s);
        let center = camera.world_to_screen(at);
        let half_px = half * camera.zoom();
        let k = self.indicator_scale;

        let emoji_px = (half_px * 0.9).clamp(10.0, 48.0);
        s.set_font(&format!("{emoji_px:.0}px system-ui, sans-serif"));
        s.set_text_align("center");
        s.set_text_baseline("middle");
        s.fill_text(building.kind.emoji(), center.x, center.y);

        // Status dot, top-right
        let dot = 4.0 * k;
        let (dx, dy) = (center.x + half_px - dot * 1.5, center.y - half_px + dot * 1.5);
        if building.status.pulse_rate() > 2.0 {
            circle_path(s, dx, dy, dot * (1.4 + 0.8 * beat));
            s.set_fill_color(&rgba_css(status_color, 0.35 * (1.0 - beat)));
            s.fill();
        }
        fill_circle(s, dx, dy, dot, status_color);

        label_chip(
            s,
            &building.name,
            center.x,
            center.y + half_px + 12.0 * k,
            11.0 * k,
            "rgba(15, 23, 42, 0.8)",
            if selected { visual.accent } else { "#e2e8f0" },
        );
        s.restore();
    }

    /// Dashed lines from a boss building to each subordinate.
    pub fn draw_boss_lines(&self, s: &mut dyn Surface, camera: &Camera, boss: WorldPos, subordinates: &[WorldPos]) {
        if subordinates.is_empty() {
            return;
        }
        s.save();
        camera.apply_transform(s);
        s.set_stroke_color("rgba(248, 113, 113, 0.55)");
        s.set_line_width(px(camera, 1.5));
        s.set_line_dash(&[px(camera, 8.0), px(camera, 6.0)]);
        s.set_line_dash_offset(-self.time * px(camera, 20.0));
        s.begin_path();
        for sub in subordinates {
            s.move_to(boss.x, boss.z);
            s.line_to(sub.x, sub.z);
        }
        s.stroke();
        s.set_line_dash(&[]);
        s.restore();
    }
}

fn tile_path(s: &mut dyn Surface, shape: TileShape, c: WorldPos, half: f64) {
    match shape {
        TileShape::Square => rounded_rect_path(s, c.x - half, c.z - half, half * 2.0, half * 2.0, half * 0.08),
        TileShape::Rounded => rounded_rect_path(s, c.x - half, c.z - half, half * 2.0, half * 2.0, half * 0.35),
        TileShape::Circle => circle_path(s, c.x, c.z, half),
        TileShape::Hexagon => polygon_path(s, c.x, c.z, half, 6),
        TileShape::Diamond => polygon_path(s, c.x, c.z, half, 4),
    }
}
