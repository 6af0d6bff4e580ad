use std::f64::consts::{PI, TAU};

use crate::camera::Camera;
use crate::color::{brighten_css, darken_css, rgba_css};
use crate::geometry::{drawn_shape, AGENT_RADIUS};
use crate::model::{Agent2D, AgentStatus, AreaShape, DrawTool, ScreenPos, ToolKind, WorldPos};
use crate::surface::{circle_path, fill_circle, label_chip, rounded_rect_path, Surface};

use super::{pulse, px};

/// An agent counts as idle for the badge after this long without activity.
pub const IDLE_BADGE_MS: f64 = 5_000.0;
const WAVE_COUNT: usize = 3;
const WAVE_CYCLE_S: f64 = 2.0;

/// Walk animation inputs for an agent in motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub progress: f64,
    pub heading: (f64, f64),
}

/// Everything one agent draw needs beyond the agent itself.
#[derive(Debug, Clone, Copy)]
pub struct AgentVisual<'a> {
    pub agent: &'a Agent2D,
    /// Rendered position, which trails the stored one during a move.
    pub position: WorldPos,
    pub selected: bool,
    pub hovered: bool,
    pub motion: Option<Motion>,
    pub tool_badge: Option<(&'a str, f64)>,
    pub now_ms: f64,
}

pub fn context_bar_color(percent: f64) -> &'static str {
    if percent > 50.0 {
        "#22c55e"
    } else if percent > 20.0 {
        "#f59e0b"
    } else {
        "#ef4444"
    }
}

/// Compact idle duration: `42s`, `7m`, `3h`.
pub fn idle_label(idle_ms: f64) -> String {
    let secs = (idle_ms / 1000.0).floor().max(0.0) as u64;
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h", secs / 3600)
    }
}

fn idle_for(agent: &Agent2D, now_ms: f64) -> Option<f64> {
    if agent.status != AgentStatus::Idle || agent.last_activity <= 0.0 {
        return None;
    }
    let idle = now_ms - agent.last_activity;
    (idle >= IDLE_BADGE_MS).then_some(idle)
}

#[derive(Debug)]
pub struct AgentRenderer {
    time: f64,
    indicator_scale: f64,
}

impl Default for AgentRenderer {
    fn default() -> Self {
        AgentRenderer { time: 0.0, indicator_scale: 1.0 }
    }
}

impl AgentRenderer {
    pub fn set_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    pub fn set_indicator_scale(&mut self, scale: f64) {
        self.indicator_scale = scale;
    }

    pub fn draw(&self, s: &mut dyn Surface, camera: &Camera, v: &AgentVisual) {
        s.save();
        camera.apply_transform(s);
        self.draw_body(s, camera, v);
        s.restore();

        s.save();
        camera.reset_transform(s);
        self.draw_overlay(s, camera, v);
        s.restore();
    }

    fn draw_body(&self, s: &mut dyn Surface, camera: &Camera, v: &AgentVisual) {
        let agent = v.agent;
        let p = v.position;
        let r = AGENT_RADIUS * if agent.is_boss { 1.3 } else { 1.0 };
        let body = agent.display_color();
        let status = agent.status.color();

        // Squash and stretch plus a foot bob while walking.
        let (mut sx, mut sy, mut bob) = (1.0, 1.0, 0.0);
        if let Some(m) = v.motion {
            let step = (m.progress * PI * 8.0).sin();
            sx = 1.0 + 0.08 * step;
            sy = 1.0 - 0.08 * step;
            bob = -step.abs() * r * 0.15;
        }

        // Shadow
        s.set_fill_color("rgba(0, 0, 0, 0.3)");
        s.begin_path();
        s.ellipse(p.x, p.z + r * 0.85, r * 0.9 * sx, r * 0.3, 0.0, 0.0, TAU);
        s.fill();

        if agent.status.is_working() {
            for i in 0..WAVE_COUNT {
                let phase = ((self.time / WAVE_CYCLE_S) + i as f64 / WAVE_COUNT as f64).fract();
                s.set_stroke_color(&rgba_css(status, 0.5 * (1.0 - phase)));
                s.set_line_width(px(camera, 2.0));
                circle_path(s, p.x, p.z, r * (1.1 + phase * 1.4));
                s.stroke();
            }
        }

        if v.selected {
            circle_path(s, p.x, p.z, r * 1.6);
            s.set_fill_radial_gradient(
                p.x,
                p.z,
                r * 0.8,
                p.x,
                p.z,
                r * 1.6,
                &[(0.0, &rgba_css(body, 0.45)), (1.0, &rgba_css(body, 0.0))],
            );
            s.fill();
            s.set_stroke_color("#ffffff");
            s.set_line_width(px(camera, 2.0));
            s.set_line_dash(&[px(camera, 6.0), px(camera, 4.0)]);
            s.set_line_dash_offset(-self.time * px(camera, 24.0));
            circle_path(s, p.x, p.z, r * 1.35);
            s.stroke();
            s.set_line_dash(&[]);
        } else if v.hovered {
            s.set_stroke_color("rgba(255, 255, 255, 0.5)");
            s.set_line_width(px(camera, 1.5));
            circle_path(s, p.x, p.z, r * 1.3);
            s.stroke();
        }

        // Status ring
        let ring = 0.6 + 0.4 * pulse(self.time, 3.0);
        s.set_stroke_color(&rgba_css(status, ring));
        s.set_line_width(px(camera, 3.0));
        circle_path(s, p.x, p.z, r * 1.12);
        s.stroke();

        // Body
        s.begin_path();
        s.ellipse(p.x, p.z + bob, r * sx, r * sy, 0.0, 0.0, TAU);
        s.set_fill_radial_gradient(
            p.x - r * 0.3,
            p.z + bob - r * 0.3,
            0.0,
            p.x,
            p.z + bob,
            r,
            &[(0.0, &brighten_css(body, 0.3)), (1.0, &darken_css(body, 0.2))],
        );
        s.fill();
        s.set_stroke_color(&darken_css(body, 0.45));
        s.set_line_width(px(camera, 1.5));
        s.stroke();

        // Dust behind the feet
        if let Some(m) = v.motion {
            let (hx, hz) = m.heading;
            for i in 0..3 {
                let age = ((m.progress * 6.0) + i as f64 / 3.0).fract();
                let back = r * (0.6 + age * 0.8);
                let spread = (i as f64 - 1.0) * r * 0.3;
                let (dx, dz) = (p.x - hx * back - hz * spread, p.z + r * 0.7 - hz * back + hx * spread);
                circle_path(s, dx, dz, r * 0.12 * (1.0 + age));
                s.set_fill_color(&format!("rgba(180, 160, 130, {:.3})", 0.4 * (1.0 - age)));
                s.fill();
            }
        }
    }

    fn draw_overlay(&self, s: &mut dyn Surface, camera: &Camera, v: &AgentVisual) {
        let agent = v.agent;
        let k = self.indicator_scale;
        let c = camera.world_to_screen(v.position);
        let r_px = AGENT_RADIUS * camera.zoom() * if agent.is_boss { 1.3 } else { 1.0 };

        let emoji_px = (r_px * 1.1).clamp(10.0, 40.0);
        s.set_font(&format!("{emoji_px:.0}px system-ui, sans-serif"));
        s.set_text_align("center");
        s.set_text_baseline("middle");
        s.fill_text(agent.class.emoji(), c.x, c.y);

        if agent.is_boss {
            let crown_px = 14.0 * k;
            s.set_font(&format!("{crown_px:.0}px system-ui, sans-serif"));
            s.fill_text("👑", c.x, c.y - r_px - crown_px * 0.7);
        }

        // Name tag and context bar stack under the body.
        let mut y = c.y + r_px + 10.0 * k;
        label_chip(
            s,
            &agent.name,
            c.x,
            y,
            11.0 * k,
            "rgba(15, 23, 42, 0.85)",
            if v.selected { "#facc15" } else { "#f1f5f9" },
        );
        y += 14.0 * k;

        let pct = agent.context_remaining.clamp(0.0, 100.0);
        let (bar_w, bar_h) = (40.0 * k, 5.0 * k);
        rounded_rect_path(s, c.x - bar_w / 2.0, y - bar_h / 2.0, bar_w, bar_h, bar_h / 2.0);
        s.set_fill_color("rgba(0, 0, 0, 0.55)");
        s.fill();
        if pct > 0.0 {
            rounded_rect_path(s, c.x - bar_w / 2.0, y - bar_h / 2.0, bar_w * pct / 100.0, bar_h, bar_h / 2.0);
            s.set_fill_color(context_bar_color(pct));
            s.fill();
        }
        s.set_font(&format!("600 {:.0}px system-ui, sans-serif", 9.0 * k));
        s.set_text_align("left");
        s.set_fill_color("#cbd5e1");
        s.fill_text(&format!("{pct:.0}%"), c.x + bar_w / 2.0 + 4.0 * k, y);

        if let Some(idle) = idle_for(agent, v.now_ms) {
            let label = format!("💤 {}", idle_label(idle));
            label_chip(s, &label, c.x + r_px + 14.0 * k, c.y - r_px, 9.0 * k, "rgba(30, 41, 59, 0.9)", "#94a3b8");
        }

        if let Some((tool, opacity)) = v.tool_badge {
            s.set_global_alpha(opacity);
            let rise = (1.0 - opacity) * 6.0;
            let text = format!("{} {tool}", ToolKind::from_name(tool).icon());
            label_chip(s, &text, c.x, c.y - r_px - 22.0 * k + rise, 10.0 * k, "rgba(37, 99, 235, 0.9)", "#ffffff");
            s.set_global_alpha(1.0);
        }
    }

    /// Marquee box in screen space.
    pub fn draw_selection_box(&self, s: &mut dyn Surface, start: ScreenPos, end: ScreenPos) {
        let (x, y) = (start.x.min(end.x), start.y.min(end.y));
        let (w, h) = ((end.x - start.x).abs(), (end.y - start.y).abs());
        if w < 1.0 && h < 1.0 {
            return;
        }

        s.save();
        s.reset_transform();
        s.set_fill_linear_gradient(
            x,
            y,
            x + w,
            y + h,
            &[(0.0, "rgba(74, 158, 255, 0.18)"), (1.0, "rgba(74, 158, 255, 0.06)")],
        );
        s.fill_rect(x, y, w, h);

        // Marching ants
        s.set_stroke_color("rgba(147, 197, 253, 0.95)");
        s.set_line_width(1.5);
        s.set_line_dash(&[6.0, 4.0]);
        s.set_line_dash_offset(-self.time * 30.0);
        s.begin_path();
        s.rect(x, y, w, h);
        s.stroke();
        s.set_line_dash(&[]);

        // Corner brackets
        let len = 10.0_f64.min(w / 2.0).min(h / 2.0);
        s.set_stroke_color("#ffffff");
        s.set_line_width(2.0);
        s.begin_path();
        for (cx, cy, dx, dy) in [(x, y, 1.0, 1.0), (x + w, y, -1.0, 1.0), (x + w, y + h, -1.0, -1.0), (x, y + h, 1.0, -1.0)] {
            s.move_to(cx + dx * len, cy);
            s.line_to(cx, cy);
            s.line_to(cx, cy + dy * len);
        }
        s.stroke();

        let dot = 2.0 + 1.5 * pulse(self.time, 6.0);
        for (cx, cy) in [(x, y), (x + w, y), (x + w, y + h), (x, y + h)] {
            fill_circle(s, cx, cy, dot, "#93c5fd");
        }
        s.restore();
    }

    /// Ghost of the area being drawn, with its dimensions.
    pub fn draw_area_preview(&self, s: &mut dyn Surface, camera: &Camera, tool: DrawTool, start: WorldPos, current: WorldPos) {
        let (shape, center) = drawn_shape(tool, start, current);

        s.save();
        camera.apply_transform(s);
        s.set_fill_color("rgba(74, 158, 255, 0.15)");
        s.set_stroke_color("rgba(74, 158, 255, 0.9)");
        s.set_line_width(px(camera, 2.0));
        s.set_line_dash(&[px(camera, 8.0), px(camera, 5.0)]);
        s.set_line_dash_offset(-self.time * px(camera, 20.0));
        let label = match shape {
            AreaShape::Rectangle { width, height } => {
                s.begin_path();
                s.rect(center.x - width / 2.0, center.z - height / 2.0, width, height);
                format!("{width:.1} × {height:.1}")
            }
            AreaShape::Circle { radius } => {
                circle_path(s, center.x, center.z, radius);
                format!("r {radius:.1}")
            }
        };
        s.fill();
        s.stroke();
        s.set_line_dash(&[]);
        s.restore();

        s.save();
        camera.reset_transform(s);
        let at = camera.world_to_screen(current);
        label_chip(s, &label, at.x + 28.0, at.y + 16.0, 11.0, "rgba(15, 23, 42, 0.85)", "#bfdbfe");
        s.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::RecordingSurface;
    use rstest::rstest;

    #[rstest]
    #[case(100.0, "#22c55e")]
    #[case(50.1, "#22c55e")]
    #[case(50.0, "#f59e0b")]
    #[case(20.1, "#f59e0b")]
    #[case(20.0, "#ef4444")]
    #[case(0.0, "#ef4444")]
    fn context_bar_tiers(#[case] pct: f64, #[case] expected: &str) {
        assert_eq!(context_bar_color(pct), expected);
    }

    #[rstest]
    #[case(5_000.0, "5s")]
    #[case(125_000.0, "2m")]
    #[case(7_300_000.0, "2h")]
    fn idle_labels(#[case] ms: f64, #[case] expected: &str) {
        assert_eq!(idle_label(ms), expected);
    }

    fn agent() -> Agent2D {
        Agent2D {
            id: "a1".into(),
            name: "Scout-1".into(),
            context_remaining: 42.0,
            last_activity: 1_000.0,
            is_boss: true,
            ..Default::default()
        }
    }

    #[test]
    fn overlay_text_for_idle_boss_with_tool() {
        let cam = Camera::default();
        let a = agent();
        let visual = AgentVisual {
            agent: &a,
            position: a.position,
            selected: true,
            hovered: false,
            motion: None,
            tool_badge: Some(("Bash", 0.5)),
            now_ms: 8_000.0,
        };
        let mut s = RecordingSurface::default();
        AgentRenderer::default().draw(&mut s, &cam, &visual);
        assert!(s.has_text("Scout-1"));
        assert!(s.has_text("42%"));
        assert!(s.has_text("👑"));
        assert!(s.has_text("💤 7s"));
        assert!(s.has_text("💻 Bash"));
        assert_eq!(s.depth, 0);
    }

    #[test]
    fn no_idle_badge_before_threshold() {
        let cam = Camera::default();
        let a = agent();
        let visual = AgentVisual {
            agent: &a,
            position: a.position,
            selected: false,
            hovered: false,
            motion: Some(Motion { progress: 0.3, heading: (1.0, 0.0) }),
            tool_badge: None,
            now_ms: 4_000.0,
        };
        let mut s = RecordingSurface::default();
        AgentRenderer::default().draw(&mut s, &cam, &visual);
        assert!(!s.texts.iter().any(|t| t.starts_with("💤")));
    }

    #[test]
    fn working_agent_draws_three_waves() {
        let cam = Camera::default();
        let idle = agent();
        let working = Agent2D { status: AgentStatus::Working, ..agent() };
        let draw = |a: &Agent2D| {
            let mut s = RecordingSurface::default();
            let v = AgentVisual {
                agent: a,
                position: a.position,
                selected: false,
                hovered: false,
                motion: None,
                tool_badge: None,
                now_ms: 0.0,
            };
            AgentRenderer::default().draw(&mut s, &cam, &v);
            s.count("arc")
        };
        assert_eq!(draw(&working) - draw(&idle), WAVE_COUNT);
    }

    #[test]
    fn tiny_selection_box_is_skipped() {
        let mut s = RecordingSurface::default();
        let r = AgentRenderer::default();
        r.draw_selection_box(&mut s, ScreenPos::new(10.0, 10.0), ScreenPos::new(10.5, 10.5));
        assert!(s.ops.is_empty());
        r.draw_selection_box(&mut s, ScreenPos::new(10.0, 10.0), ScreenPos::new(60.0, 40.0));
        assert_eq!(s.count("fill_rect"), 1);
        assert_eq!(s.depth, 0);
    }

    #[test]
    fn circle_preview_labels_radius() {
        let mut s = RecordingSurface::default();
        AgentRenderer::default().draw_area_preview(
            &mut s,
            &Camera::default(),
            DrawTool::Circle,
            WorldPos::new(0.0, 0.0),
            WorldPos::new(3.0, 4.0),
        );
        assert!(s.has_text("r 5.0"));
    }
}
