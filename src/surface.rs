//! The drawing surface renderers paint onto.
//!
//! In the browser this is a `CanvasRenderingContext2d`. The trait keeps the
//! renderers and the frame loop testable off the web.

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64);
    fn reset_transform(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn scale(&mut self, x: f64, y: f64);

    fn set_global_alpha(&mut self, alpha: f64);
    fn set_fill_color(&mut self, css: &str);
    fn set_stroke_color(&mut self, css: &str);
    fn set_fill_linear_gradient(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, stops: &[(f64, &str)]);
    #[allow(clippy::too_many_arguments)]
    fn set_fill_radial_gradient(
        &mut self,
        x0: f64,
        y0: f64,
        r0: f64,
        x1: f64,
        y1: f64,
        r1: f64,
        stops: &[(f64, &str)],
    );
    fn set_line_width(&mut self, width: f64);
    fn set_line_dash(&mut self, segments: &[f64]);
    fn set_line_dash_offset(&mut self, offset: f64);
    fn set_line_cap(&mut self, cap: &str);
    fn set_shadow(&mut self, blur: f64, css: &str);

    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    #[allow(clippy::too_many_arguments)]
    fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, rotation: f64, start: f64, end: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: &str);
    fn set_text_baseline(&mut self, baseline: &str);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn stroke_text(&mut self, text: &str, x: f64, y: f64);
    fn measure_text(&mut self, text: &str) -> f64;
}

// --- PATH HELPERS ---

pub fn rounded_rect_path(s: &mut dyn Surface, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    s.begin_path();
    s.move_to(x + r, y);
    s.line_to(x + w - r, y);
    s.quadratic_curve_to(x + w, y, x + w, y + r);
    s.line_to(x + w, y + h - r);
    s.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
    s.line_to(x + r, y + h);
    s.quadratic_curve_to(x, y + h, x, y + h - r);
    s.line_to(x, y + r);
    s.quadratic_curve_to(x, y, x + r, y);
    s.close_path();
}

pub fn circle_path(s: &mut dyn Surface, x: f64, y: f64, radius: f64) {
    s.begin_path();
    s.arc(x, y, radius.max(0.0), 0.0, std::f64::consts::TAU);
}

pub fn fill_circle(s: &mut dyn Surface, x: f64, y: f64, radius: f64, css: &str) {
    circle_path(s, x, y, radius);
    s.set_fill_color(css);
    s.fill();
}

/// Regular polygon with its first vertex pointing up.
pub fn polygon_path(s: &mut dyn Surface, x: f64, y: f64, radius: f64, sides: usize) {
    s.begin_path();
    for i in 0..sides.max(3) {
        let angle = -std::f64::consts::FRAC_PI_2 + std::f64::consts::TAU * i as f64 / sides.max(3) as f64;
        let (px, py) = (x + angle.cos() * radius, y + angle.sin() * radius);
        if i == 0 {
            s.move_to(px, py);
        } else {
            s.line_to(px, py);
        }
    }
    s.close_path();
}

/// Text on a dark rounded chip, centered at (x, y). Returns the chip width.
pub fn label_chip(s: &mut dyn Surface, text: &str, x: f64, y: f64, font_px: f64, background: &str, color: &str) -> f64 {
    s.set_font(&format!("600 {font_px:.0}px system-ui, sans-serif"));
    let pad = font_px * 0.5;
    let width = s.measure_text(text) + pad * 2.0;
    let height = font_px + pad;
    rounded_rect_path(s, x - width / 2.0, y - height / 2.0, width, height, height / 2.0);
    s.set_fill_color(background);
    s.fill();
    s.set_text_align("center");
    s.set_text_baseline("middle");
    s.set_fill_color(color);
    s.fill_text(text, x, y + 0.5);
    width
}

// --- CANVAS 2D ---

impl Surface for CanvasRenderingContext2d {
    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let _ = CanvasRenderingContext2d::set_transform(self, a, b, c, d, e, f);
    }

    fn reset_transform(&mut self) {
        let _ = CanvasRenderingContext2d::set_transform(self, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    }

    fn translate(&mut self, x: f64, y: f64) {
        let _ = CanvasRenderingContext2d::translate(self, x, y);
    }

    fn rotate(&mut self, angle: f64) {
        let _ = CanvasRenderingContext2d::rotate(self, angle);
    }

    fn scale(&mut self, x: f64, y: f64) {
        let _ = CanvasRenderingContext2d::scale(self, x, y);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        CanvasRenderingContext2d::set_global_alpha(self, alpha.clamp(0.0, 1.0));
    }

    fn set_fill_color(&mut self, css: &str) {
        self.set_fill_style_str(css);
    }

    fn set_stroke_color(&mut self, css: &str) {
        self.set_stroke_style_str(css);
    }

    fn set_fill_linear_gradient(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, stops: &[(f64, &str)]) {
        let gradient = self.create_linear_gradient(x0, y0, x1, y1);
        for (offset, css) in stops {
            let _ = gradient.add_color_stop(*offset as f32, css);
        }
        self.set_fill_style_canvas_gradient(&gradient);
    }

    fn set_fill_radial_gradient(
        &mut self,
        x0: f64,
        y0: f64,
        r0: f64,
        x1: f64,
        y1: f64,
        r1: f64,
        stops: &[(f64, &str)],
    ) {
        let Ok(gradient) = self.create_radial_gradient(x0, y0, r0.max(0.0), x1, y1, r1.max(0.0)) else {
            return;
        };
        for (offset, css) in stops {
            let _ = gradient.add_color_stop(*offset as f32, css);
        }
        self.set_fill_style_canvas_gradient(&gradient);
    }

    fn set_line_width(&mut self, width: f64) {
        CanvasRenderingContext2d::set_line_width(self, width);
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        let array = js_sys::Array::new();
        for seg in segments {
            array.push(&JsValue::from_f64(*seg));
        }
        let _ = CanvasRenderingContext2d::set_line_dash(self, &array);
    }

    fn set_line_dash_offset(&mut self, offset: f64) {
        CanvasRenderingContext2d::set_line_dash_offset(self, offset);
    }

    fn set_line_cap(&mut self, cap: &str) {
        CanvasRenderingContext2d::set_line_cap(self, cap);
    }

    fn set_shadow(&mut self, blur: f64, css: &str) {
        self.set_shadow_blur(blur);
        self.set_shadow_color(css);
    }

    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn close_path(&mut self) {
        CanvasRenderingContext2d::close_path(self);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::move_to(self, x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::line_to(self, x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        let _ = CanvasRenderingContext2d::arc(self, x, y, radius.max(0.0), start, end);
    }

    fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, rotation: f64, start: f64, end: f64) {
        let _ = CanvasRenderingContext2d::ellipse(self, x, y, rx.max(0.0), ry.max(0.0), rotation, start, end);
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        CanvasRenderingContext2d::quadratic_curve_to(self, cpx, cpy, x, y);
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::rect(self, x, y, w, h);
    }

    fn fill(&mut self) {
        CanvasRenderingContext2d::fill(self);
    }

    fn stroke(&mut self) {
        CanvasRenderingContext2d::stroke(self);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::stroke_rect(self, x, y, w, h);
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::clear_rect(self, x, y, w, h);
    }

    fn set_font(&mut self, font: &str) {
        CanvasRenderingContext2d::set_font(self, font);
    }

    fn set_text_align(&mut self, align: &str) {
        CanvasRenderingContext2d::set_text_align(self, align);
    }

    fn set_text_baseline(&mut self, baseline: &str) {
        CanvasRenderingContext2d::set_text_baseline(self, baseline);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let _ = CanvasRenderingContext2d::fill_text(self, text, x, y);
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        let _ = CanvasRenderingContext2d::stroke_text(self, text, x, y);
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        CanvasRenderingContext2d::measure_text(self, text)
            .map(|m| m.width())
            .unwrap_or(text.chars().count() as f64 * 7.0)
    }
}

// --- RECORDING (tests) ---

#[cfg(test)]
pub(crate) mod recording {
    use super::Surface;

    /// Captures the calls that matter for draw-order assertions.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub ops: Vec<String>,
        pub texts: Vec<String>,
        pub depth: i32,
    }

    impl RecordingSurface {
        pub(crate) fn count(&self, op: &str) -> usize {
            self.ops.iter().filter(|o| o.as_str() == op).count()
        }

        pub(crate) fn has_text(&self, needle: &str) -> bool {
            self.texts.iter().any(|t| t.contains(needle))
        }

        fn push(&mut self, op: &str) {
            self.ops.push(op.to_owned());
        }
    }

    impl Surface for RecordingSurface {
        fn save(&mut self) {
            self.depth += 1;
            self.push("save");
        }
        fn restore(&mut self) {
            self.depth -= 1;
            self.push("restore");
        }
        fn set_transform(&mut self, _: f64, _: f64, _: f64, _: f64, _: f64, _: f64) {
            self.push("set_transform");
        }
        fn reset_transform(&mut self) {
            self.push("reset_transform");
        }
        fn translate(&mut self, _: f64, _: f64) {}
        fn rotate(&mut self, _: f64) {}
        fn scale(&mut self, _: f64, _: f64) {}
        fn set_global_alpha(&mut self, _: f64) {}
        fn set_fill_color(&mut self, _: &str) {}
        fn set_stroke_color(&mut self, _: &str) {}
        fn set_fill_linear_gradient(&mut self, _: f64, _: f64, _: f64, _: f64, _: &[(f64, &str)]) {
            self.push("linear_gradient");
        }
        fn set_fill_radial_gradient(&mut self, _: f64, _: f64, _: f64, _: f64, _: f64, _: f64, _: &[(f64, &str)]) {
            self.push("radial_gradient");
        }
        fn set_line_width(&mut self, _: f64) {}
        fn set_line_dash(&mut self, _: &[f64]) {}
        fn set_line_dash_offset(&mut self, _: f64) {}
        fn set_line_cap(&mut self, _: &str) {}
        fn set_shadow(&mut self, _: f64, _: &str) {}
        fn begin_path(&mut self) {}
        fn close_path(&mut self) {}
        fn move_to(&mut self, _: f64, _: f64) {}
        fn line_to(&mut self, _: f64, _: f64) {
            self.push("line_to");
        }
        fn arc(&mut self, _: f64, _: f64, _: f64, _: f64, _: f64) {
            self.push("arc");
        }
        fn ellipse(&mut self, _: f64, _: f64, _: f64, _: f64, _: f64, _: f64, _: f64) {}
        fn quadratic_curve_to(&mut self, _: f64, _: f64, _: f64, _: f64) {}
        fn rect(&mut self, _: f64, _: f64, _: f64, _: f64) {}
        fn fill(&mut self) {
            self.push("fill");
        }
        fn stroke(&mut self) {
            self.push("stroke");
        }
        fn fill_rect(&mut self, _: f64, _: f64, _: f64, _: f64) {
            self.push("fill_rect");
        }
        fn stroke_rect(&mut self, _: f64, _: f64, _: f64, _: f64) {}
        fn clear_rect(&mut self, _: f64, _: f64, _: f64, _: f64) {
            self.push("clear_rect");
        }
        fn set_font(&mut self, _: &str) {}
        fn set_text_align(&mut self, _: &str) {}
        fn set_text_baseline(&mut self, _: &str) {}
        fn fill_text(&mut self, text: &str, _: f64, _: f64) {
            self.texts.push(text.to_owned());
        }
        fn stroke_text(&mut self, _: &str, _: f64, _: f64) {}
        fn measure_text(&mut self, text: &str) -> f64 {
            text.chars().count() as f64 * 6.0
        }
    }
}
