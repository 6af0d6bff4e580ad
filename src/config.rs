//! Runtime display settings. Persisting them is the host's job.

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::movement::DEFAULT_WALK_SPEED;

pub const MIN_INDICATOR_SCALE: f64 = 0.5;
pub const MAX_INDICATOR_SCALE: f64 = 2.0;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneConfig {
    /// Multiplier for name tags, bars and badges.
    pub indicator_scale: f64,
    pub show_grid: bool,
    /// Frames per second cap; 0 means draw every frame.
    pub fps_limit: u32,
    pub edge_pan: bool,
    /// World units per second for animated moves.
    pub walk_speed: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            indicator_scale: 1.0,
            show_grid: true,
            fps_limit: 0,
            edge_pan: true,
            walk_speed: DEFAULT_WALK_SPEED,
        }
    }
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<SceneConfig, SceneError> {
        let mut config: SceneConfig = serde_json::from_str(json).map_err(SceneError::InvalidConfig)?;
        config.indicator_scale = clamp_indicator_scale(config.indicator_scale);
        Ok(config)
    }

    /// Minimum milliseconds between drawn frames, if capped.
    pub fn frame_interval_ms(&self) -> Option<f64> {
        (self.fps_limit > 0).then(|| 1000.0 / f64::from(self.fps_limit))
    }
}

pub fn clamp_indicator_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(MIN_INDICATOR_SCALE, MAX_INDICATOR_SCALE)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unlimited(0, None)]
    #[case::thirty(30, Some(1000.0 / 30.0))]
    #[case::sixty(60, Some(1000.0 / 60.0))]
    fn frame_interval(#[case] fps: u32, #[case] expected: Option<f64>) {
        let config = SceneConfig { fps_limit: fps, ..Default::default() };
        assert_eq!(config.frame_interval_ms(), expected);
    }

    #[test]
    fn partial_json_keeps_defaults_and_clamps() {
        let config = SceneConfig::from_json(r#"{"indicatorScale": 9.0, "showGrid": false}"#).unwrap();
        assert_eq!(config.indicator_scale, MAX_INDICATOR_SCALE);
        assert!(!config.show_grid);
        assert_eq!(config.fps_limit, 0);
    }

    #[test]
    fn bad_json_is_rejected() {
        assert!(matches!(SceneConfig::from_json("[1,2]"), Err(SceneError::InvalidConfig(_))));
    }
}
