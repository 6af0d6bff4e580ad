use crate::camera::Camera;
use crate::effects::MoveRipple;
use crate::model::WorldPos;
use crate::movement::ease_out_cubic;
use crate::surface::{circle_path, fill_circle, Surface};

use super::px;

const RIPPLE_MAX_RADIUS: f64 = 1.2;
const LINK_FLOW_SPEED: f64 = 0.6;

#[derive(Debug, Default)]
pub struct EffectRenderer {
    time: f64,
}

impl EffectRenderer {
    pub fn set_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    /// Two expanding rings and a center dot, fading as they grow.
    pub fn draw_ripple(&self, s: &mut dyn Surface, camera: &Camera, ripple: &MoveRipple, now: f64) {
        let t = ripple.progress(now);
        if t >= 1.0 {
            return;
        }
        let p = ripple.position;
        let alpha = 1.0 - t;

        s.save();
        camera.apply_transform(s);
        s.set_line_width(px(camera, 2.0));
        for lag in [0.0, 0.25] {
            let local = ((t - lag) / (1.0 - lag)).clamp(0.0, 1.0);
            if local <= 0.0 {
                continue;
            }
            s.set_stroke_color(&format!("rgba(74, 222, 128, {:.3})", alpha * (1.0 - lag)));
            circle_path(s, p.x, p.z, RIPPLE_MAX_RADIUS * ease_out_cubic(local));
            s.stroke();
        }
        fill_circle(s, p.x, p.z, px(camera, 3.0), &format!("rgba(74, 222, 128, {alpha:.3})"));
        s.restore();
    }

    /// Boss to subordinate link with a dot flowing toward the subordinate.
    pub fn draw_boss_link(&self, s: &mut dyn Surface, camera: &Camera, boss: WorldPos, subordinate: WorldPos) {
        s.save();
        camera.apply_transform(s);
        s.set_stroke_color("rgba(250, 204, 21, 0.45)");
        s.set_line_width(px(camera, 1.5));
        s.set_line_dash(&[px(camera, 4.0), px(camera, 6.0)]);
        s.set_line_dash_offset(-self.time * px(camera, 24.0));
        s.begin_path();
        s.move_to(boss.x, boss.z);
        s.line_to(subordinate.x, subordinate.z);
        s.stroke();
        s.set_line_dash(&[]);

        let phase = (self.time * LINK_FLOW_SPEED).fract();
        let dot = boss.lerp(subordinate, phase);
        fill_circle(s, dot.x, dot.z, px(camera, 3.0), "rgba(250, 204, 21, 0.9)");
        s.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::RecordingSurface;

    #[test]
    fn finished_ripple_draws_nothing() {
        let ripple = MoveRipple { position: WorldPos::default(), started: 0.0 };
        let mut s = RecordingSurface::default();
        EffectRenderer::default().draw_ripple(&mut s, &Camera::default(), &ripple, 10_000.0);
        assert!(s.ops.is_empty());
    }

    #[test]
    fn second_ring_trails_the_first() {
        let ripple = MoveRipple { position: WorldPos::default(), started: 0.0 };
        let cam = Camera::default();

        let mut early = RecordingSurface::default();
        EffectRenderer::default().draw_ripple(&mut early, &cam, &ripple, 100.0);
        let mut late = RecordingSurface::default();
        EffectRenderer::default().draw_ripple(&mut late, &cam, &ripple, 400.0);

        assert_eq!(early.count("stroke"), 1);
        assert_eq!(late.count("stroke"), 2);
    }

    #[test]
    fn boss_link_is_one_line() {
        let mut s = RecordingSurface::default();
        EffectRenderer::default().draw_boss_link(&mut s, &Camera::default(), WorldPos::default(), WorldPos::new(3.0, 0.0));
        assert_eq!(s.count("line_to"), 1);
        assert_eq!(s.depth, 0);
    }
}
