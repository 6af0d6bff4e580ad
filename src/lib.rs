//! A 2D battlefield for supervising coding agents.
//!
//! Agents, buildings and areas come from a host store and are drawn on a
//! canvas with a pannable, zoomable camera. Pointer, touch and keyboard input
//! is turned into selection, movement and area editing, reported back to the
//! host as [`SceneEvent`]s and [`StoreCommand`]s.
//!
//! Everything except [`web`] runs off the browser, so the scene can be driven
//! and tested natively against a [`MemoryStore`].

pub mod camera;
pub mod color;
pub mod config;
pub mod effects;
pub mod error;
pub mod event;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod model;
pub mod movement;
pub mod render;
pub mod scene;
pub mod store;
pub mod surface;
pub mod web;

pub use camera::Camera;
pub use config::SceneConfig;
pub use error::SceneError;
pub use event::{ContextTarget, SceneEvent};
pub use input::{InputHandler, PointerButton};
pub use model::{
    Agent2D, AgentClass, AgentId, AgentStatus, Area2D, AreaId, AreaShape, Building2D, BuildingAction, BuildingId,
    BuildingKind, BuildingStatus, BuildingStyle, DrawTool, ScreenPos, WorldPos,
};
pub use scene::{DragRelease, Gesture, Scene};
pub use store::{MemoryStore, Modifiers, SceneStore, StoreCommand, StoreSnapshot};
pub use surface::Surface;
pub use web::BattlefieldCanvas;
