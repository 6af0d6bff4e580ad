#![allow(dead_code)]

use battlemap::{Agent2D, Area2D, AreaShape, Building2D, MemoryStore, Scene, SceneConfig, ScreenPos, WorldPos};

pub const WIDTH: f64 = 800.0;
pub const HEIGHT: f64 = 600.0;

pub fn agent(id: &str, x: f64, z: f64) -> Agent2D {
    Agent2D { id: id.into(), name: id.into(), position: WorldPos::new(x, z), ..Default::default() }
}

pub fn building(id: &str, x: f64, z: f64) -> Building2D {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": id,
        "position": { "x": x, "z": z },
    }))
    .unwrap()
}

pub fn rect_area(id: &str, x: f64, z: f64, width: f64, height: f64) -> Area2D {
    Area2D {
        id: id.into(),
        shape: AreaShape::Rectangle { width, height },
        center: WorldPos::new(x, z),
        color: "#4a9eff".into(),
        label: None,
        z_index: 0,
        has_directories: false,
        archived: false,
    }
}

/// A synced scene over `store` with the camera at the origin and default zoom.
pub fn scene_with(store: MemoryStore) -> Scene<MemoryStore> {
    let mut scene = Scene::new(store, SceneConfig::default(), WIDTH, HEIGHT);
    scene.sync_all(false, 0.0);
    scene
}

/// Agent `a1` at the origin, building `b1` at (5, 0), area `r1` spanning
/// x -2..2 and z 3..7.
pub fn battlefield() -> Scene<MemoryStore> {
    let mut store = MemoryStore::default();
    store.upsert_agent(agent("a1", 0.0, 0.0));
    store.upsert_building(building("b1", 5.0, 0.0));
    store.upsert_area(rect_area("r1", 0.0, 5.0, 4.0, 4.0));
    scene_with(store)
}

pub fn at(scene: &Scene<MemoryStore>, x: f64, z: f64) -> ScreenPos {
    scene.camera().world_to_screen(WorldPos::new(x, z))
}
