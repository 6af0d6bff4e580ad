use crate::camera::Camera;
use crate::surface::Surface;

use super::px;

const MINOR_SPACING: f64 = 1.0;
const MAJOR_EVERY: i64 = 5;
/// Below this on-screen spacing the minor lines turn to noise.
const MIN_MINOR_PX: f64 = 6.0;

#[derive(Debug, Default)]
pub struct GridRenderer {
    time: f64,
}

impl GridRenderer {
    pub fn set_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    pub fn draw(&self, s: &mut dyn Surface, camera: &Camera, show_grid: bool) {
        let (w, h) = (camera.width(), camera.height());

        // Ground
        camera.reset_transform(s);
        s.set_fill_radial_gradient(
            w / 2.0,
            h / 2.0,
            0.0,
            w / 2.0,
            h / 2.0,
            w.max(h) * 0.75,
            &[(0.0, "#1d2b22"), (1.0, "#111a15")],
        );
        s.fill_rect(0.0, 0.0, w, h);

        if !show_grid {
            return;
        }

        let bounds = camera.visible_bounds();
        let show_minor = MINOR_SPACING * camera.zoom() >= MIN_MINOR_PX;
        let first_x = (bounds.min_x / MINOR_SPACING).floor() as i64;
        let last_x = (bounds.max_x / MINOR_SPACING).ceil() as i64;
        let first_z = (bounds.min_z / MINOR_SPACING).floor() as i64;
        let last_z = (bounds.max_z / MINOR_SPACING).ceil() as i64;

        s.save();
        camera.apply_transform(s);
        let shimmer = 0.02 * (self.time * 0.5).sin();

        for (major, alpha) in [(false, 0.06 + shimmer), (true, 0.14 + shimmer)] {
            if !major && !show_minor {
                continue;
            }
            s.begin_path();
            for i in first_x..=last_x {
                if (i.rem_euclid(MAJOR_EVERY) == 0) != major {
                    continue;
                }
                let x = i as f64 * MINOR_SPACING;
                s.move_to(x, bounds.min_z);
                s.line_to(x, bounds.max_z);
            }
            for i in first_z..=last_z {
                if (i.rem_euclid(MAJOR_EVERY) == 0) != major {
                    continue;
                }
                let z = i as f64 * MINOR_SPACING;
                s.move_to(bounds.min_x, z);
                s.line_to(bounds.max_x, z);
            }
            s.set_stroke_color(&format!("rgba(160, 220, 180, {alpha:.3})"));
            s.set_line_width(px(camera, if major { 1.5 } else { 1.0 }));
            s.stroke();
        }

        // Origin cross
        s.begin_path();
        s.move_to(-0.5, 0.0);
        s.line_to(0.5, 0.0);
        s.move_to(0.0, -0.5);
        s.line_to(0.0, 0.5);
        s.set_stroke_color("rgba(250, 204, 21, 0.35)");
        s.set_line_width(px(camera, 2.0));
        s.stroke();
        s.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::RecordingSurface;

    #[test]
    fn hidden_grid_draws_only_ground() {
        let cam = Camera::new(300.0, 200.0);
        let mut s = RecordingSurface::default();
        GridRenderer::default().draw(&mut s, &cam, false);
        assert_eq!(s.count("fill_rect"), 1);
        assert_eq!(s.count("stroke"), 0);
    }

    #[test]
    fn visible_grid_strokes_and_balances_state() {
        let cam = Camera::new(300.0, 200.0);
        let mut s = RecordingSurface::default();
        GridRenderer::default().draw(&mut s, &cam, true);
        assert_eq!(s.count("stroke"), 3);
        assert!(s.count("line_to") > 10);
        assert_eq!(s.depth, 0);
    }
}
