//! Browser host: binds a [`Scene`] to a canvas, DOM input and a JS store.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Function, Reflect, JSON};
use log::{info, warn, LevelFilter};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent, TouchList, WheelEvent};

use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::event::SceneEvent;
use crate::input::{InputHandler, PointerButton};
use crate::logging;
use crate::model::{DrawTool, ScreenPos};
use crate::scene::Scene;
use crate::store::{MemoryStore, Modifiers, SceneStore, StoreCommand, StoreSnapshot};

// --- JS STORE ---

/// Cache of the host application's store.
///
/// Reads come from the last snapshot pulled with [`JsStore::refresh`].
/// Commands apply to the cache at once and queue for the JS side, which
/// receives them once the scene is no longer borrowed.
pub struct JsStore {
    js: JsValue,
    cache: MemoryStore,
    outbox: Vec<StoreCommand>,
}

impl JsStore {
    pub fn new(js: JsValue) -> Result<JsStore, SceneError> {
        let mut store = JsStore { js, cache: MemoryStore::default(), outbox: Vec::new() };
        store.refresh()?;
        Ok(store)
    }

    /// Pull a fresh snapshot from `store.snapshot()`, which may return an
    /// object or a JSON string.
    pub fn refresh(&mut self) -> Result<(), SceneError> {
        let value = call_method(&self.js, "snapshot", None)?;
        let json = match value.as_string() {
            Some(json) => json,
            None => JSON::stringify(&value)?.as_string().unwrap_or_default(),
        };
        self.cache.replace_snapshot(StoreSnapshot::from_json(&json)?);
        Ok(())
    }

    fn take_outbox(&mut self) -> Vec<StoreCommand> {
        std::mem::take(&mut self.outbox)
    }
}

impl SceneStore for JsStore {
    fn snapshot(&self) -> &StoreSnapshot {
        self.cache.snapshot()
    }

    fn dispatch(&mut self, command: StoreCommand) {
        self.cache.snapshot_mut().apply(&command);
        self.outbox.push(command);
    }
}

fn call_method(target: &JsValue, name: &str, arg: Option<&JsValue>) -> Result<JsValue, SceneError> {
    let method = Reflect::get(target, &JsValue::from_str(name))?;
    let function = method
        .dyn_ref::<Function>()
        .ok_or_else(|| SceneError::Js(format!("store has no `{name}` function")))?;
    let result = match arg {
        Some(arg) => function.call1(target, arg)?,
        None => function.call0(target)?,
    };
    Ok(result)
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, SceneError> {
    let json = serde_json::to_string(value).map_err(|e| SceneError::Js(e.to_string()))?;
    Ok(JSON::parse(&json)?)
}

// --- HOST ---

struct Host {
    scene: Scene<JsStore>,
    input: InputHandler,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

struct Shared {
    host: RefCell<Host>,
    store_js: JsValue,
    callbacks: JsValue,
    running: Cell<bool>,
}

impl Shared {
    /// Run `f` against the host, then forward queued store commands and
    /// events once the host borrow is released.
    fn run<F>(&self, f: F) -> Result<(), SceneError>
    where
        F: FnOnce(&mut Host) -> Result<Vec<SceneEvent>, SceneError>,
    {
        let (events, commands) = {
            let mut host = self.host.try_borrow_mut().map_err(|_| SceneError::Js("scene is busy".into()))?;
            let events = f(&mut *host)?;
            let commands = host.scene.store_mut().take_outbox();
            (events, commands)
        };
        for command in &commands {
            if let Err(err) = to_js(command).and_then(|c| call_method(&self.store_js, "dispatch", Some(&c))) {
                warn!("store dispatch failed: {err}");
            }
        }
        for event in &events {
            self.emit(event);
        }
        Ok(())
    }

    fn run_logged<F>(&self, f: F)
    where
        F: FnOnce(&mut Host) -> Vec<SceneEvent>,
    {
        if let Err(err) = self.run(|host| Ok(f(host))) {
            warn!("{err}");
        }
    }

    fn emit(&self, event: &SceneEvent) {
        let name = event.callback_name();
        let Ok(callback) = Reflect::get(&self.callbacks, &JsValue::from_str(name)) else {
            return;
        };
        let Some(callback) = callback.dyn_ref::<Function>() else {
            return;
        };
        match to_js(event) {
            Ok(payload) => {
                if let Err(err) = callback.call1(&JsValue::NULL, &payload) {
                    warn!("{name} threw: {err:?}");
                }
            }
            Err(err) => warn!("could not encode {name}: {err}"),
        }
    }
}

fn now() -> f64 {
    js_sys::Date::now()
}

fn mouse_pos(event: &MouseEvent) -> ScreenPos {
    ScreenPos::new(f64::from(event.offset_x()), f64::from(event.offset_y()))
}

fn modifiers(event: &MouseEvent) -> Modifiers {
    Modifiers { ctrl: event.ctrl_key(), shift: event.shift_key(), alt: event.alt_key(), meta: event.meta_key() }
}

fn touch_points(canvas: &HtmlCanvasElement, list: &TouchList) -> Vec<ScreenPos> {
    let rect = canvas.get_bounding_client_rect();
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| ScreenPos::new(f64::from(t.client_x()) - rect.left(), f64::from(t.client_y()) - rect.top()))
        .collect()
}

/// Keys typed into form fields are not shortcuts.
fn typing_in_field(event: &KeyboardEvent) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

// --- PUBLIC API ---

#[wasm_bindgen]
pub struct BattlefieldCanvas {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl BattlefieldCanvas {
    /// Attach to the canvas with id `canvas_id`.
    ///
    /// `store` needs `snapshot()` and `dispatch(command)`. `callbacks` maps
    /// names like `onAgentClick` to functions; missing ones are skipped.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        store: JsValue,
        callbacks: JsValue,
        config_json: Option<String>,
    ) -> Result<BattlefieldCanvas, JsValue> {
        logging::init(LevelFilter::Info);

        let window = web_sys::window().ok_or_else(|| SceneError::Js("no global `window`".into()))?;
        let document = window.document().ok_or_else(|| SceneError::Js("no document on window".into()))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| SceneError::CanvasNotFound(canvas_id.to_owned()))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| SceneError::CanvasNotFound(canvas_id.to_owned()))?;
        let context = canvas
            .get_context("2d")?
            .ok_or(SceneError::ContextUnavailable)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SceneError::ContextUnavailable)?;

        let config = match config_json.as_deref() {
            Some(json) => SceneConfig::from_json(json)?,
            None => SceneConfig::default(),
        };

        let (width, height) = (f64::from(canvas.client_width().max(1)), f64::from(canvas.client_height().max(1)));
        canvas.set_width(width as u32);
        canvas.set_height(height as u32);

        let mut scene = Scene::new(JsStore::new(store.clone())?, config, width, height);
        scene.sync_all(false, now());
        info!("battlefield attached to #{canvas_id} ({width}x{height})");

        let shared = Rc::new(Shared {
            host: RefCell::new(Host { scene, input: InputHandler::new(), canvas: canvas.clone(), context }),
            store_js: store,
            callbacks,
            running: Cell::new(true),
        });

        install_listeners(&shared, &canvas, &window)?;
        start_loop(shared.clone());
        Ok(BattlefieldCanvas { shared })
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.shared.run_logged(|host| {
            host.canvas.set_width(width.max(1.0) as u32);
            host.canvas.set_height(height.max(1.0) as u32);
            host.scene.resize(width, height);
            Vec::new()
        });
    }

    pub fn sync_agents(&self, animate: bool) -> Result<(), JsValue> {
        self.shared.run(|host| {
            host.scene.store_mut().refresh()?;
            host.scene.sync_agents(animate, now());
            Ok(Vec::new())
        })?;
        Ok(())
    }

    pub fn sync_buildings(&self) -> Result<(), JsValue> {
        self.shared.run(|host| {
            host.scene.store_mut().refresh()?;
            host.scene.sync_buildings();
            Ok(Vec::new())
        })?;
        Ok(())
    }

    pub fn sync_areas(&self) -> Result<(), JsValue> {
        self.shared.run(|host| {
            host.scene.store_mut().refresh()?;
            host.scene.sync_areas();
            Ok(Vec::new())
        })?;
        Ok(())
    }

    /// `"rectangle"`, `"circle"`, or nothing to disarm.
    pub fn set_drawing_tool(&self, tool: Option<String>) -> Result<(), JsValue> {
        let tool = match tool.as_deref() {
            None | Some("") | Some("none") => None,
            Some("rectangle") => Some(DrawTool::Rectangle),
            Some("circle") => Some(DrawTool::Circle),
            Some(other) => return Err(SceneError::Js(format!("unknown drawing tool `{other}`")).into()),
        };
        self.shared.run(|host| {
            host.scene.set_drawing_tool(tool);
            Ok(Vec::new())
        })?;
        Ok(())
    }

    pub fn set_indicator_scale(&self, scale: f64) {
        self.shared.run_logged(|host| {
            host.scene.set_indicator_scale(scale);
            Vec::new()
        });
    }

    pub fn set_show_grid(&self, show: bool) {
        self.shared.run_logged(|host| {
            host.scene.set_show_grid(show);
            Vec::new()
        });
    }

    pub fn set_fps_limit(&self, fps: u32) {
        self.shared.run_logged(|host| {
            host.scene.set_fps_limit(fps);
            Vec::new()
        });
    }

    pub fn set_edge_pan(&self, enabled: bool) {
        self.shared.run_logged(|host| {
            host.scene.set_edge_pan(enabled);
            Vec::new()
        });
    }

    pub fn focus_on(&self, x: f64, z: f64, zoom: Option<f64>) {
        self.shared.run_logged(|host| {
            host.scene.camera_mut().focus_on(x, z, zoom);
            Vec::new()
        });
    }

    pub fn focus_on_bounds(&self, min_x: f64, max_x: f64, min_z: f64, max_z: f64, padding: f64) {
        self.shared.run_logged(|host| {
            host.scene.camera_mut().focus_on_bounds(min_x, max_x, min_z, max_z, padding);
            Vec::new()
        });
    }

    pub fn call_subordinates(&self, boss_id: &str) {
        self.shared.run_logged(|host| {
            host.scene.call_subordinates(boss_id, now());
            Vec::new()
        });
    }

    /// Stop the frame loop. Listeners stay attached but the canvas is inert.
    pub fn destroy(&self) {
        self.shared.running.set(false);
    }
}

// --- DOM WIRING ---

fn install_listeners(shared: &Rc<Shared>, canvas: &HtmlCanvasElement, window: &web_sys::Window) -> Result<(), JsValue> {
    {
        let shared = shared.clone();
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            let Some(button) = PointerButton::from_dom(event.button()) else {
                return;
            };
            if button != PointerButton::Primary {
                event.prevent_default();
            }
            shared.run_logged(|h| h.input.on_pointer_down(&mut h.scene, mouse_pos(&event), button, modifiers(&event), now()));
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let shared = shared.clone();
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            shared.run_logged(|h| h.input.on_pointer_move(&mut h.scene, mouse_pos(&event)));
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let shared = shared.clone();
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            shared.run_logged(|h| h.input.on_pointer_up(&mut h.scene, mouse_pos(&event), now()));
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let shared = shared.clone();
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            shared.run_logged(|h| h.input.on_pointer_leave(&mut h.scene, mouse_pos(&event)));
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mouseleave", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            event.prevent_default();
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let shared = shared.clone();
        let closure = Closure::wrap(Box::new(move |event: WheelEvent| {
            event.prevent_default();
            let screen = ScreenPos::new(f64::from(event.offset_x()), f64::from(event.offset_y()));
            shared.run_logged(|h| h.input.on_wheel(&mut h.scene, screen, event.delta_y()));
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // --- TOUCH ---
    {
        let shared = shared.clone();
        let target = canvas.clone();
        let closure = Closure::wrap(Box::new(move |event: TouchEvent| {
            event.prevent_default();
            let touches = touch_points(&target, &event.touches());
            shared.run_logged(|h| h.input.on_touch_start(&mut h.scene, &touches, now()));
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let shared = shared.clone();
        let target = canvas.clone();
        let closure = Closure::wrap(Box::new(move |event: TouchEvent| {
            event.prevent_default();
            let touches = touch_points(&target, &event.touches());
            shared.run_logged(|h| h.input.on_touch_move(&mut h.scene, &touches));
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let shared = shared.clone();
        let target = canvas.clone();
        let closure = Closure::wrap(Box::new(move |event: TouchEvent| {
            let remaining = event.touches().length() as usize;
            let Some(lifted) = touch_points(&target, &event.changed_touches()).first().copied() else {
                return;
            };
            shared.run_logged(|h| h.input.on_touch_end(&mut h.scene, lifted, remaining, now()));
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // --- KEYBOARD ---
    {
        let shared = shared.clone();
        let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            if typing_in_field(&event) {
                return;
            }
            let mods = Modifiers {
                ctrl: event.ctrl_key(),
                shift: event.shift_key(),
                alt: event.alt_key(),
                meta: event.meta_key(),
            };
            let key = event.key();
            shared.run_logged(|h| {
                if InputHandler::shortcut_for(&h.scene, &key, mods).is_some() {
                    event.prevent_default();
                }
                h.input.on_key_down(&mut h.scene, &key, mods)
            });
        }) as Box<dyn FnMut(_)>);
        window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let shared = shared.clone();
        let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            let key = event.key();
            shared.run_logged(|h| h.input.on_key_up(&mut h.scene, &key));
        }) as Box<dyn FnMut(_)>);
        window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

// --- RENDER LOOP ---

fn start_loop(shared: Rc<Shared>) {
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if !shared.running.get() {
            return;
        }
        shared.run_logged(|h| {
            let t = now();
            let events = h.input.tick(&mut h.scene, t);
            h.scene.frame(t, &mut h.context);
            events
        });
        if let Some(closure) = f.borrow().as_ref() {
            request_animation_frame(closure);
        };
    }) as Box<dyn FnMut()>));

    if let Some(closure) = g.borrow().as_ref() {
        request_animation_frame(closure);
    };
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(err) = window.request_animation_frame(f.as_ref().unchecked_ref()) {
        warn!("requestAnimationFrame failed: {err:?}");
    }
}
