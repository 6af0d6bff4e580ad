//! Draw modules. They read entities and the camera and never mutate either.

pub mod agent;
pub mod area;
pub mod building;
pub mod effect;
pub mod grid;

pub use agent::{AgentRenderer, AgentVisual, Motion};
pub use area::AreaRenderer;
pub use building::BuildingRenderer;
pub use effect::EffectRenderer;
pub use grid::GridRenderer;

use crate::camera::Camera;

/// 0..1 sine pulse at `rate` radians per second.
pub(crate) fn pulse(time: f64, rate: f64) -> f64 {
    0.5 + 0.5 * (time * rate).sin()
}

/// World length covering `pixels` on screen at the current zoom.
pub(crate) fn px(camera: &Camera, pixels: f64) -> f64 {
    pixels / camera.zoom().max(f64::EPSILON)
}
