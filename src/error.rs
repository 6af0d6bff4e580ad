use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("canvas 2d context unavailable")]
    ContextUnavailable,
    #[error("no canvas element with id `{0}`")]
    CanvasNotFound(String),
    #[error("invalid scene config: {0}")]
    InvalidConfig(#[source] serde_json::Error),
    #[error("invalid store snapshot: {0}")]
    InvalidSnapshot(#[source] serde_json::Error),
    #[error("javascript error: {0}")]
    Js(String),
}

impl From<JsValue> for SceneError {
    fn from(value: JsValue) -> Self {
        SceneError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<SceneError> for JsValue {
    fn from(err: SceneError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
