use approx::assert_relative_eq;
use battlemap::camera::{MAX_ZOOM, MIN_ZOOM};
use battlemap::{Camera, ScreenPos, WorldPos};
use rstest::rstest;

#[test]
fn origin_sits_at_viewport_center() {
    let cam = Camera::new(800.0, 600.0);
    let p = cam.world_to_screen(WorldPos::new(0.0, 0.0));
    assert_relative_eq!(p.x, 400.0);
    assert_relative_eq!(p.y, 300.0);
}

#[rstest]
#[case(WorldPos::new(0.0, 0.0), 30.0, WorldPos::new(3.5, -2.25))]
#[case(WorldPos::new(-40.0, 12.0), 5.0, WorldPos::new(100.0, 100.0))]
#[case(WorldPos::new(7.5, 7.5), 200.0, WorldPos::new(7.6, 7.4))]
fn screen_round_trip(#[case] center: WorldPos, #[case] zoom: f64, #[case] point: WorldPos) {
    let mut cam = Camera::new(1024.0, 768.0);
    cam.set_view(center, zoom);
    let back = cam.screen_to_world(cam.world_to_screen(point));
    assert_relative_eq!(back.x, point.x, epsilon = 1e-6);
    assert_relative_eq!(back.z, point.z, epsilon = 1e-6);
}

#[test]
fn wheel_zoom_keeps_point_under_cursor() {
    let mut cam = Camera::new(800.0, 600.0);
    let cursor = ScreenPos::new(120.0, 480.0);
    let before = cam.screen_to_world(cursor);
    cam.zoom_at_point(cursor.x, cursor.y, -200.0);
    let after = cam.screen_to_world(cursor);
    assert!(cam.zoom() > 30.0);
    assert_relative_eq!(before.x, after.x, epsilon = 1e-9);
    assert_relative_eq!(before.z, after.z, epsilon = 1e-9);
}

#[rstest]
#[case(-100_000.0, MAX_ZOOM)]
#[case(100_000.0, MIN_ZOOM)]
fn zoom_is_clamped(#[case] delta: f64, #[case] limit: f64) {
    let mut cam = Camera::new(800.0, 600.0);
    for _ in 0..50 {
        cam.zoom_at_point(400.0, 300.0, delta);
    }
    assert_relative_eq!(cam.zoom(), limit);
}

#[test]
fn focus_on_bounds_fits_the_box() {
    let mut cam = Camera::new(800.0, 600.0);
    cam.focus_on_bounds(-10.0, 10.0, -5.0, 5.0, 0.0);
    cam.update(10_000.0);
    assert_relative_eq!(cam.center().x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(cam.zoom(), 40.0, epsilon = 1e-9);
    let visible = cam.visible_bounds();
    assert!(visible.min_x <= -10.0 + 1e-9 && visible.max_x >= 10.0 - 1e-9);
}

#[test]
fn held_pan_keys_move_the_camera() {
    let mut cam = Camera::new(800.0, 600.0);
    cam.edge_pan = false;
    cam.pan_keys.right = true;
    cam.update(1000.0);
    assert!(cam.center().x > 0.0);
    assert_relative_eq!(cam.center().z, 0.0);
}
