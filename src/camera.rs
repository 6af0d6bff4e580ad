//! Pan/zoom camera mapping world (x, z) onto canvas pixels.

use crate::geometry::Bounds;
use crate::model::{ScreenPos, WorldPos};
use crate::movement::ease_out_cubic;
use crate::surface::Surface;

pub const DEFAULT_ZOOM: f64 = 30.0;
pub const MIN_ZOOM: f64 = 5.0;
pub const MAX_ZOOM: f64 = 200.0;
const ZOOM_SENSITIVITY: f64 = 0.001;
const FOCUS_DURATION_MS: f64 = 500.0;
const EDGE_MARGIN_PX: f64 = 24.0;
const EDGE_PAN_SPEED_PX: f64 = 600.0;
const KEY_PAN_SPEED: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Focus {
    from_center: WorldPos,
    to_center: WorldPos,
    from_zoom: f64,
    to_zoom: f64,
    elapsed: f64,
}

/// Directional pan keys currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl PanKeys {
    /// Normalized (x, z) direction. Opposing keys cancel.
    pub fn direction(self) -> (f64, f64) {
        let x = f64::from(i8::from(self.right) - i8::from(self.left));
        let z = f64::from(i8::from(self.down) - i8::from(self.up));
        let len = (x * x + z * z).sqrt();
        if len == 0.0 {
            (0.0, 0.0)
        } else {
            (x / len, z / len)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    width: f64,
    height: f64,
    center: WorldPos,
    zoom: f64,
    focus: Option<Focus>,
    mouse: ScreenPos,
    pub edge_pan: bool,
    pub pan_keys: PanKeys,
}

impl Default for Camera {
    fn default() -> Self {
        Camera::new(800.0, 600.0)
    }
}

impl Camera {
    pub fn new(width: f64, height: f64) -> Camera {
        Camera {
            width,
            height,
            center: WorldPos::default(),
            zoom: DEFAULT_ZOOM,
            focus: None,
            mouse: ScreenPos::new(width / 2.0, height / 2.0),
            edge_pan: true,
            pan_keys: PanKeys::default(),
        }
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.reset_mouse_position();
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn center(&self) -> WorldPos {
        self.center
    }

    pub fn is_focusing(&self) -> bool {
        self.focus.is_some()
    }

    /// Jump without easing. Cancels any focus in flight.
    pub fn set_view(&mut self, center: WorldPos, zoom: f64) {
        self.focus = None;
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    // --- TRANSFORMS ---

    pub fn world_to_screen(&self, p: WorldPos) -> ScreenPos {
        ScreenPos::new(
            (p.x - self.center.x) * self.zoom + self.width / 2.0,
            (p.z - self.center.z) * self.zoom + self.height / 2.0,
        )
    }

    pub fn screen_to_world(&self, p: ScreenPos) -> WorldPos {
        WorldPos::new(
            (p.x - self.width / 2.0) / self.zoom + self.center.x,
            (p.y - self.height / 2.0) / self.zoom + self.center.z,
        )
    }

    /// World-space rectangle currently on screen.
    pub fn visible_bounds(&self) -> Bounds {
        Bounds::from_corners(
            self.screen_to_world(ScreenPos::new(0.0, 0.0)),
            self.screen_to_world(ScreenPos::new(self.width, self.height)),
        )
    }

    /// Switch the surface into world units.
    pub fn apply_transform(&self, s: &mut dyn Surface) {
        s.set_transform(
            self.zoom,
            0.0,
            0.0,
            self.zoom,
            self.width / 2.0 - self.center.x * self.zoom,
            self.height / 2.0 - self.center.z * self.zoom,
        );
    }

    pub fn reset_transform(&self, s: &mut dyn Surface) {
        s.reset_transform();
    }

    // --- CONTROLS ---

    /// Zoom by a wheel delta keeping the world point under the cursor fixed.
    pub fn zoom_at_point(&mut self, screen_x: f64, screen_y: f64, delta: f64) {
        let factor = (1.0 - delta * ZOOM_SENSITIVITY).clamp(0.5, 1.5);
        self.zoom_by_at(ScreenPos::new(screen_x, screen_y), factor);
    }

    pub fn zoom_by_at(&mut self, anchor: ScreenPos, factor: f64) {
        let world = self.screen_to_world(anchor);
        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.focus = None;
        if (new_zoom - self.zoom).abs() < 1e-9 {
            return;
        }
        self.zoom = new_zoom;
        self.center = WorldPos::new(
            world.x - (anchor.x - self.width / 2.0) / self.zoom,
            world.z - (anchor.y - self.height / 2.0) / self.zoom,
        );
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.focus = None;
        self.center.x -= dx / self.zoom;
        self.center.z -= dy / self.zoom;
    }

    pub fn focus_on(&mut self, x: f64, z: f64, zoom: Option<f64>) {
        let to_zoom = zoom.unwrap_or(self.zoom).clamp(MIN_ZOOM, MAX_ZOOM);
        self.focus = Some(Focus {
            from_center: self.center,
            to_center: WorldPos::new(x, z),
            from_zoom: self.zoom,
            to_zoom,
            elapsed: 0.0,
        });
    }

    pub fn focus_on_bounds(&mut self, min_x: f64, max_x: f64, min_z: f64, max_z: f64, padding: f64) {
        let w = (max_x - min_x).abs() + padding * 2.0;
        let h = (max_z - min_z).abs() + padding * 2.0;
        let zoom = (self.width / w.max(f64::EPSILON)).min(self.height / h.max(f64::EPSILON));
        self.focus_on((min_x + max_x) / 2.0, (min_z + max_z) / 2.0, Some(zoom));
    }

    pub fn set_mouse_position(&mut self, p: ScreenPos) {
        self.mouse = p;
    }

    /// Park the mouse at the viewport center, which switches edge-panning off.
    pub fn reset_mouse_position(&mut self) {
        self.mouse = ScreenPos::new(self.width / 2.0, self.height / 2.0);
    }

    /// Screen-space edge pan direction scaled by how deep into the margin
    /// the mouse sits, each axis in [-1, 1].
    fn edge_pan_vector(&self) -> (f64, f64) {
        let m = self.mouse;
        if m.x < 0.0 || m.y < 0.0 || m.x > self.width || m.y > self.height {
            return (0.0, 0.0);
        }
        let axis = |pos: f64, extent: f64| -> f64 {
            if pos < EDGE_MARGIN_PX {
                -(EDGE_MARGIN_PX - pos) / EDGE_MARGIN_PX
            } else if pos > extent - EDGE_MARGIN_PX {
                (pos - (extent - EDGE_MARGIN_PX)) / EDGE_MARGIN_PX
            } else {
                0.0
            }
        };
        (axis(m.x, self.width), axis(m.y, self.height))
    }

    /// Advance focus easing, held-key panning and edge panning.
    pub fn update(&mut self, dt_ms: f64) {
        let dt = dt_ms.max(0.0);

        if let Some(mut focus) = self.focus.take() {
            focus.elapsed += dt;
            let t = (focus.elapsed / FOCUS_DURATION_MS).min(1.0);
            let eased = ease_out_cubic(t);
            self.center = focus.from_center.lerp(focus.to_center, eased);
            self.zoom = focus.from_zoom + (focus.to_zoom - focus.from_zoom) * eased;
            if t < 1.0 {
                self.focus = Some(focus);
            }
        }

        let (kx, kz) = self.pan_keys.direction();
        if kx != 0.0 || kz != 0.0 {
            self.focus = None;
            let step = KEY_PAN_SPEED * dt / 1000.0;
            self.center = self.center.offset(kx * step, kz * step);
        }

        if self.edge_pan {
            let (ex, ey) = self.edge_pan_vector();
            if ex != 0.0 || ey != 0.0 {
                let px = EDGE_PAN_SPEED_PX * dt / 1000.0;
                self.pan_by(-ex * px, -ey * px);
            }
        }
    }
}
