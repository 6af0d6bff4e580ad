//! Hit-testing and reshaping math in world space.

use crate::model::{Area2D, AreaShape, DrawTool, WorldPos};

/// Smallest width, height or radius an area may have.
pub const MIN_AREA_SIZE: f64 = 0.5;
/// Handle hit radius in screen pixels; divided by zoom for world units.
pub const HANDLE_HIT_PX: f64 = 10.0;
pub const HANDLE_DRAW_PX: f64 = 6.0;
pub const AGENT_RADIUS: f64 = 0.5;
const AGENT_MIN_HIT_PX: f64 = 14.0;
pub const BUILDING_SIZE: f64 = 1.6;
const FOLDER_BADGE_PX: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Bounds {
    pub fn from_corners(a: WorldPos, b: WorldPos) -> Bounds {
        Bounds {
            min_x: a.x.min(b.x),
            max_x: a.x.max(b.x),
            min_z: a.z.min(b.z),
            max_z: a.z.max(b.z),
        }
    }

    pub fn contains(&self, p: WorldPos) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_z - self.min_z
    }

    pub fn center(&self) -> WorldPos {
        WorldPos::new((self.min_x + self.max_x) / 2.0, (self.min_z + self.max_z) / 2.0)
    }

    /// Smallest bounds covering every point, or `None` for an empty iterator.
    pub fn enclosing<I: IntoIterator<Item = WorldPos>>(points: I) -> Option<Bounds> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Bounds::from_corners(first, first);
        for p in iter {
            b.min_x = b.min_x.min(p.x);
            b.max_x = b.max_x.max(p.x);
            b.min_z = b.min_z.min(p.z);
            b.max_z = b.max_z.max(p.z);
        }
        Some(b)
    }
}

pub fn area_bounds(area: &Area2D) -> Bounds {
    let c = area.center;
    match area.shape {
        AreaShape::Rectangle { width, height } => Bounds {
            min_x: c.x - width / 2.0,
            max_x: c.x + width / 2.0,
            min_z: c.z - height / 2.0,
            max_z: c.z + height / 2.0,
        },
        AreaShape::Circle { radius } => Bounds {
            min_x: c.x - radius,
            max_x: c.x + radius,
            min_z: c.z - radius,
            max_z: c.z + radius,
        },
    }
}

pub fn area_contains(area: &Area2D, p: WorldPos) -> bool {
    match area.shape {
        AreaShape::Rectangle { .. } => area_bounds(area).contains(p),
        AreaShape::Circle { radius } => area.center.distance(p) <= radius,
    }
}

// --- RESIZE HANDLES ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Move,
    Nw,
    Ne,
    Se,
    Sw,
    N,
    E,
    S,
    W,
    Radius,
}

impl HandleKind {
    fn moves_west(self) -> bool {
        matches!(self, HandleKind::Nw | HandleKind::Sw | HandleKind::W)
    }

    fn moves_east(self) -> bool {
        matches!(self, HandleKind::Ne | HandleKind::Se | HandleKind::E)
    }

    fn moves_north(self) -> bool {
        matches!(self, HandleKind::Nw | HandleKind::Ne | HandleKind::N)
    }

    fn moves_south(self) -> bool {
        matches!(self, HandleKind::Sw | HandleKind::Se | HandleKind::S)
    }

    pub fn cursor(self) -> &'static str {
        match self {
            HandleKind::Move => "move",
            HandleKind::Nw | HandleKind::Se => "nwse-resize",
            HandleKind::Ne | HandleKind::Sw => "nesw-resize",
            HandleKind::N | HandleKind::S => "ns-resize",
            HandleKind::E | HandleKind::W => "ew-resize",
            HandleKind::Radius => "ew-resize",
        }
    }
}

/// Handle positions in hit-test order: move, corners, edges, radius.
pub fn handle_positions(area: &Area2D) -> Vec<(HandleKind, WorldPos)> {
    let c = area.center;
    match area.shape {
        AreaShape::Rectangle { .. } => {
            let b = area_bounds(area);
            vec![
                (HandleKind::Move, c),
                (HandleKind::Nw, WorldPos::new(b.min_x, b.min_z)),
                (HandleKind::Ne, WorldPos::new(b.max_x, b.min_z)),
                (HandleKind::Se, WorldPos::new(b.max_x, b.max_z)),
                (HandleKind::Sw, WorldPos::new(b.min_x, b.max_z)),
                (HandleKind::N, WorldPos::new(c.x, b.min_z)),
                (HandleKind::E, WorldPos::new(b.max_x, c.z)),
                (HandleKind::S, WorldPos::new(c.x, b.max_z)),
                (HandleKind::W, WorldPos::new(b.min_x, c.z)),
            ]
        }
        AreaShape::Circle { radius } => vec![
            (HandleKind::Move, c),
            (HandleKind::Radius, WorldPos::new(c.x + radius, c.z)),
        ],
    }
}

pub fn handle_hit_radius(zoom: f64) -> f64 {
    HANDLE_HIT_PX / zoom.max(f64::EPSILON)
}

/// First handle within the zoom-adjusted hit radius of `p`.
pub fn handle_at(area: &Area2D, p: WorldPos, zoom: f64) -> Option<HandleKind> {
    let radius = handle_hit_radius(zoom);
    handle_positions(area)
        .into_iter()
        .find(|(_, pos)| pos.distance(p) <= radius)
        .map(|(kind, _)| kind)
}

/// Reshape `original` as if `handle` were dragged from `start` to `pointer`.
///
/// Rectangle handles keep the opposite side anchored and floor each side
/// at [`MIN_AREA_SIZE`]. A handle that does not belong to the area's shape
/// leaves it unchanged.
pub fn resize_area(original: &Area2D, handle: HandleKind, start: WorldPos, pointer: WorldPos) -> Area2D {
    let dx = pointer.x - start.x;
    let dz = pointer.z - start.z;
    let mut area = original.clone();

    if handle == HandleKind::Move {
        area.center = original.center.offset(dx, dz);
        return area;
    }

    match original.shape {
        AreaShape::Rectangle { .. } => {
            if handle == HandleKind::Radius {
                return area;
            }
            let b = area_bounds(original);
            let (mut left, mut right, mut top, mut bottom) = (b.min_x, b.max_x, b.min_z, b.max_z);
            if handle.moves_west() {
                left = (b.min_x + dx).min(b.max_x - MIN_AREA_SIZE);
            }
            if handle.moves_east() {
                right = (b.max_x + dx).max(b.min_x + MIN_AREA_SIZE);
            }
            if handle.moves_north() {
                top = (b.min_z + dz).min(b.max_z - MIN_AREA_SIZE);
            }
            if handle.moves_south() {
                bottom = (b.max_z + dz).max(b.min_z + MIN_AREA_SIZE);
            }
            area.shape = AreaShape::Rectangle { width: right - left, height: bottom - top };
            area.center = WorldPos::new((left + right) / 2.0, (top + bottom) / 2.0);
        }
        AreaShape::Circle { .. } => {
            if handle == HandleKind::Radius {
                let radius = original.center.distance(pointer).max(MIN_AREA_SIZE);
                area.shape = AreaShape::Circle { radius };
            }
        }
    }
    area
}

// --- DRAWING ---

/// Shape and center for a drag from `start` to `end` with `tool`.
/// Rectangles span the two corners; circles grow from `start`.
pub fn drawn_shape(tool: DrawTool, start: WorldPos, end: WorldPos) -> (AreaShape, WorldPos) {
    match tool {
        DrawTool::Rectangle => {
            let b = Bounds::from_corners(start, end);
            (AreaShape::Rectangle { width: b.width(), height: b.height() }, b.center())
        }
        DrawTool::Circle => (AreaShape::Circle { radius: start.distance(end) }, start),
    }
}

pub fn shape_is_valid(shape: &AreaShape) -> bool {
    match *shape {
        AreaShape::Rectangle { width, height } => width >= MIN_AREA_SIZE && height >= MIN_AREA_SIZE,
        AreaShape::Circle { radius } => radius >= MIN_AREA_SIZE,
    }
}

// --- ENTITY HITS ---

/// Where the folder badge sits: just inside the top-right of the shape.
pub fn folder_badge_position(area: &Area2D, zoom: f64) -> WorldPos {
    let inset = (FOLDER_BADGE_PX + 4.0) / zoom.max(f64::EPSILON);
    match area.shape {
        AreaShape::Rectangle { .. } => {
            let b = area_bounds(area);
            WorldPos::new(b.max_x - inset, b.min_z + inset)
        }
        AreaShape::Circle { radius } => {
            let diag = radius * std::f64::consts::FRAC_1_SQRT_2;
            WorldPos::new(area.center.x + diag, area.center.z - diag)
        }
    }
}

pub fn folder_badge_hit(area: &Area2D, p: WorldPos, zoom: f64) -> bool {
    area.has_directories
        && folder_badge_position(area, zoom).distance(p) <= FOLDER_BADGE_PX / zoom.max(f64::EPSILON)
}

pub fn agent_hit_radius(zoom: f64, indicator_scale: f64) -> f64 {
    (AGENT_RADIUS * indicator_scale).max(AGENT_MIN_HIT_PX / zoom.max(f64::EPSILON))
}

pub fn building_half_extent(scale: f64) -> f64 {
    BUILDING_SIZE * scale / 2.0
}

pub fn building_contains(center: WorldPos, scale: f64, p: WorldPos) -> bool {
    let half = building_half_extent(scale);
    (p.x - center.x).abs() <= half && (p.z - center.z).abs() <= half
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(width: f64, height: f64) -> Area2D {
        Area2D {
            id: "r".into(),
            shape: AreaShape::Rectangle { width, height },
            center: WorldPos::new(0.0, 0.0),
            color: "#4a9eff".into(),
            label: None,
            z_index: 0,
            has_directories: false,
            archived: false,
        }
    }

    #[test]
    fn west_handle_anchors_east_side() {
        let area = rect(4.0, 2.0);
        let out = resize_area(&area, HandleKind::W, WorldPos::new(-2.0, 0.0), WorldPos::new(-3.0, 0.0));
        let b = area_bounds(&out);
        assert_relative_eq!(b.max_x, 2.0);
        assert_relative_eq!(b.min_x, -3.0);
        assert_relative_eq!(b.height(), 2.0);
    }

    #[test]
    fn north_handle_is_floored() {
        let area = rect(4.0, 2.0);
        let out = resize_area(&area, HandleKind::N, WorldPos::new(0.0, -1.0), WorldPos::new(0.0, 10.0));
        let b = area_bounds(&out);
        assert_relative_eq!(b.height(), MIN_AREA_SIZE);
        assert_relative_eq!(b.max_z, 1.0);
    }

    #[test]
    fn move_handle_wins_over_corners_on_tiny_area() {
        let area = rect(0.5, 0.5);
        assert_eq!(handle_at(&area, WorldPos::new(0.1, 0.1), 10.0), Some(HandleKind::Move));
    }

    #[test]
    fn handle_hit_radius_shrinks_with_zoom() {
        let area = rect(4.0, 4.0);
        let near_corner = WorldPos::new(2.2, 2.2);
        assert_eq!(handle_at(&area, near_corner, 30.0), Some(HandleKind::Se));
        assert_eq!(handle_at(&area, near_corner, 100.0), None);
    }

    #[test]
    fn radius_handle_ignored_for_rectangles() {
        let area = rect(4.0, 4.0);
        let out = resize_area(&area, HandleKind::Radius, WorldPos::default(), WorldPos::new(9.0, 9.0));
        assert_eq!(out, area);
    }

    #[test]
    fn drawn_rectangle_is_normalized() {
        let (shape, center) = drawn_shape(DrawTool::Rectangle, WorldPos::new(3.0, 4.0), WorldPos::new(1.0, 1.0));
        assert_eq!(shape, AreaShape::Rectangle { width: 2.0, height: 3.0 });
        assert_eq!(center, WorldPos::new(2.0, 2.5));
        assert!(shape_is_valid(&shape));
    }

    #[test]
    fn thin_rectangle_is_invalid() {
        let (shape, _) = drawn_shape(DrawTool::Rectangle, WorldPos::new(0.0, 0.0), WorldPos::new(5.0, 0.3));
        assert!(!shape_is_valid(&shape));
    }

    #[test]
    fn enclosing_bounds() {
        let b = Bounds::enclosing([WorldPos::new(1.0, 5.0), WorldPos::new(-2.0, 3.0)]).unwrap();
        assert_eq!(b, Bounds { min_x: -2.0, max_x: 1.0, min_z: 3.0, max_z: 5.0 });
        assert!(Bounds::enclosing(std::iter::empty()).is_none());
    }
}
