use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::camera::Camera;
use crate::color::{brighten_css, rgba_css};
use crate::geometry::{area_bounds, folder_badge_position, handle_positions, HandleKind, HANDLE_DRAW_PX};
use crate::model::{Area2D, AreaShape};
use crate::surface::{circle_path, label_chip, rounded_rect_path, Surface};

use super::{pulse, px};

#[derive(Debug, Default)]
pub struct AreaRenderer {
    time: f64,
}

impl AreaRenderer {
    pub fn set_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    pub fn draw(&self, s: &mut dyn Surface, camera: &Camera, area: &Area2D, selected: bool) {
        s.save();
        camera.apply_transform(s);
        self.draw_body(s, camera, area, selected);
        s.restore();

        s.save();
        camera.reset_transform(s);
        self.draw_overlay(s, camera, area);
        if selected {
            self.draw_handles(s, camera, area);
        }
        s.restore();
    }

    fn draw_body(&self, s: &mut dyn Surface, camera: &Camera, area: &Area2D, selected: bool) {
        let c = area.center;
        let color = area.color.as_str();
        let fill_alpha = if selected { 0.24 } else { 0.16 };

        match area.shape {
            AreaShape::Rectangle { width, height } => {
                let b = area_bounds(area);
                let top = rgba_css(color, fill_alpha);
                let bottom = rgba_css(color, fill_alpha * 0.35);
                s.set_fill_linear_gradient(b.min_x, b.min_z, b.max_x, b.max_z, &[(0.0, &top), (1.0, &bottom)]);
                s.fill_rect(b.min_x, b.min_z, width, height);
            }
            AreaShape::Circle { radius } => {
                let inner = rgba_css(color, fill_alpha * 0.35);
                let outer = rgba_css(color, fill_alpha);
                s.set_fill_radial_gradient(c.x, c.z, 0.0, c.x, c.z, radius, &[(0.0, &inner), (1.0, &outer)]);
                circle_path(s, c.x, c.z, radius);
                s.fill();
            }
        }

        // Pulsing dashed outline
        let glow = 0.55 + 0.35 * pulse(self.time, 2.0);
        s.set_stroke_color(&rgba_css(color, if selected { 1.0 } else { glow }));
        s.set_line_width(px(camera, if selected { 2.5 } else { 2.0 }));
        s.set_line_dash(&[px(camera, 10.0), px(camera, 6.0)]);
        s.set_line_dash_offset(-self.time * px(camera, 12.0));
        match area.shape {
            AreaShape::Rectangle { width, height } => {
                let b = area_bounds(area);
                s.begin_path();
                s.rect(b.min_x, b.min_z, width, height);
                s.stroke();
            }
            AreaShape::Circle { radius } => {
                circle_path(s, c.x, c.z, radius);
                s.stroke();
            }
        }
        s.set_line_dash(&[]);

        // Accents
        s.set_stroke_color(&brighten_css(color, 0.35));
        s.set_line_width(px(camera, 3.0));
        match area.shape {
            AreaShape::Rectangle { width, height } => {
                let b = area_bounds(area);
                let len = (width.min(height) / 4.0).min(1.0);
                s.begin_path();
                for (x, z, sx, sz) in [
                    (b.min_x, b.min_z, 1.0, 1.0),
                    (b.max_x, b.min_z, -1.0, 1.0),
                    (b.max_x, b.max_z, -1.0, -1.0),
                    (b.min_x, b.max_z, 1.0, -1.0),
                ] {
                    s.move_to(x + sx * len, z);
                    s.line_to(x, z);
                    s.line_to(x, z + sz * len);
                }
                s.stroke();
                // Edge midpoint ticks
                let tick = len / 2.0;
                s.begin_path();
                s.move_to(c.x - tick, b.min_z);
                s.line_to(c.x + tick, b.min_z);
                s.move_to(c.x - tick, b.max_z);
                s.line_to(c.x + tick, b.max_z);
                s.move_to(b.min_x, c.z - tick);
                s.line_to(b.min_x, c.z + tick);
                s.move_to(b.max_x, c.z - tick);
                s.line_to(b.max_x, c.z + tick);
                s.stroke();
            }
            AreaShape::Circle { radius } => {
                let len = (radius / 4.0).min(0.8);
                s.begin_path();
                for i in 0..4 {
                    let angle = FRAC_PI_2 * i as f64;
                    let (cos, sin) = (angle.cos(), angle.sin());
                    s.move_to(c.x + cos * radius, c.z + sin * radius);
                    s.line_to(c.x + cos * (radius - len), c.z + sin * (radius - len));
                }
                s.stroke();
            }
        }
    }

    fn draw_overlay(&self, s: &mut dyn Surface, camera: &Camera, area: &Area2D) {
        if let Some(label) = area.label.as_deref().filter(|l| !l.is_empty()) {
            let b = area_bounds(area);
            let anchor = camera.world_to_screen(crate::model::WorldPos::new(area.center.x, b.min_z));
            label_chip(s, label, anchor.x, anchor.y - 14.0, 12.0, &rgba_css(&area.color, 0.85), "#ffffff");
        }

        if area.has_directories {
            let p = camera.world_to_screen(folder_badge_position(area, camera.zoom()));
            let bob = 1.5 * (self.time * 2.5).sin();
            circle_path(s, p.x, p.y + bob, 12.0);
            s.set_fill_color("rgba(15, 23, 42, 0.85)");
            s.fill();
            s.set_stroke_color(&rgba_css(&area.color, 0.9));
            s.set_line_width(1.5);
            s.stroke();
            s.set_font("14px system-ui, sans-serif");
            s.set_text_align("center");
            s.set_text_baseline("middle");
            s.fill_text("📁", p.x, p.y + bob + 1.0);
        }
    }

    fn draw_handles(&self, s: &mut dyn Surface, camera: &Camera, area: &Area2D) {
        let size = HANDLE_DRAW_PX;
        for (kind, pos) in handle_positions(area) {
            let p = camera.world_to_screen(pos);
            match kind {
                HandleKind::Move => {
                    circle_path(s, p.x, p.y, size + 2.0);
                    s.set_fill_color("rgba(255, 255, 255, 0.9)");
                    s.fill();
                    s.set_stroke_color(&area.color);
                    s.set_line_width(2.0);
                    s.stroke();
                    // Four-way arrow
                    s.begin_path();
                    for i in 0..4 {
                        let angle = FRAC_PI_2 * i as f64;
                        s.move_to(p.x, p.y);
                        s.line_to(p.x + angle.cos() * size, p.y + angle.sin() * size);
                    }
                    s.stroke();
                }
                HandleKind::Radius => {
                    circle_path(s, p.x, p.y, size);
                    s.set_fill_color(&area.color);
                    s.fill();
                    s.set_stroke_color("#ffffff");
                    s.set_line_width(2.0);
                    s.stroke();
                    s.begin_path();
                    s.arc(p.x, p.y, size + 3.0, -PI / 4.0, PI / 4.0);
                    s.stroke();
                }
                _ => {
                    let corner = matches!(kind, HandleKind::Nw | HandleKind::Ne | HandleKind::Se | HandleKind::Sw);
                    let half = if corner { size } else { size * 0.8 };
                    rounded_rect_path(s, p.x - half, p.y - half, half * 2.0, half * 2.0, 2.0);
                    s.set_fill_color("#ffffff");
                    s.fill();
                    s.set_stroke_color(&area.color);
                    s.set_line_width(2.0);
                    s.stroke();
                }
            }
        }
        // Spinning marker on the move handle so the selection reads as live.
        let center = camera.world_to_screen(area.center);
        s.begin_path();
        let start = self.time * 2.0;
        s.arc(center.x, center.y, size + 6.0, start, start + TAU / 3.0);
        s.set_stroke_color(&rgba_css(&area.color, 0.7));
        s.set_line_width(1.5);
        s.stroke();
    }
}
