//! Position interpolation and formation layout.

use crate::model::WorldPos;

/// Positions closer than this are treated as identical.
pub const POSITION_EPSILON: f64 = 0.01;
pub const DEFAULT_WALK_SPEED: f64 = 2.0;
pub const MIN_MOVE_DURATION_MS: f64 = 500.0;
pub const MAX_MOVE_DURATION_MS: f64 = 3000.0;

const RING_SPACING: f64 = 2.0;
const GRID_SPACING: f64 = 1.5;
const RING_MAX: usize = 6;

pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

pub fn ease_in_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * t
}

/// Walk time for `distance` world units, clamped to a sane window.
pub fn walk_duration_ms(distance: f64, walk_speed: f64) -> f64 {
    let speed = if walk_speed > 0.0 { walk_speed } else { DEFAULT_WALK_SPEED };
    (distance / speed * 1000.0).clamp(MIN_MOVE_DURATION_MS, MAX_MOVE_DURATION_MS)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Movement {
    pub start: WorldPos,
    pub end: WorldPos,
    pub start_time: f64,
    pub duration: f64,
}

impl Movement {
    pub fn new(start: WorldPos, end: WorldPos, start_time: f64, walk_speed: f64) -> Movement {
        Movement {
            start,
            end,
            start_time,
            duration: walk_duration_ms(start.distance(end), walk_speed),
        }
    }

    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    /// Eased position at `now`. Exactly `start` at the first instant and
    /// exactly `end` once the duration has elapsed.
    pub fn position_at(&self, now: f64) -> WorldPos {
        let t = self.progress(now);
        if t >= 1.0 {
            return self.end;
        }
        if t <= 0.0 {
            return self.start;
        }
        self.start.lerp(self.end, ease_out_cubic(t))
    }

    pub fn is_finished(&self, now: f64) -> bool {
        self.progress(now) >= 1.0
    }

    /// Unit heading of travel in world space, zero for a degenerate move.
    pub fn heading(&self) -> (f64, f64) {
        let dx = self.end.x - self.start.x;
        let dz = self.end.z - self.start.z;
        let len = (dx * dx + dz * dz).sqrt();
        if len < f64::EPSILON {
            (0.0, 0.0)
        } else {
            (dx / len, dz / len)
        }
    }
}

pub fn ring_radius(count: usize) -> f64 {
    RING_SPACING * (count as f64 / 3.0).max(1.0)
}

/// Target slots for `count` subordinates gathering around `center`.
///
/// Up to six form a ring starting straight above the boss (negative z);
/// larger groups line up in a grid in front of it.
pub fn formation_positions(center: WorldPos, count: usize) -> Vec<WorldPos> {
    if count == 0 {
        return Vec::new();
    }
    if count <= RING_MAX {
        let radius = ring_radius(count);
        let step = std::f64::consts::TAU / count as f64;
        return (0..count)
            .map(|i| {
                let angle = -std::f64::consts::FRAC_PI_2 + step * i as f64;
                center.offset(angle.cos() * radius, angle.sin() * radius)
            })
            .collect();
    }

    let cols = grid_columns(count);
    let half_width = (cols as f64 - 1.0) / 2.0;
    (0..count)
        .map(|i| {
            let col = i % cols;
            let row = i / cols;
            center.offset(
                (col as f64 - half_width) * GRID_SPACING,
                (row as f64 + 1.0) * GRID_SPACING,
            )
        })
        .collect()
}

pub fn grid_columns(count: usize) -> usize {
    (count as f64).sqrt().ceil() as usize
}
