//! Pointer, touch and keyboard handling on top of a [`Scene`].
//!
//! Handlers mutate the scene and return the events the host should hear
//! about. Time is passed in so click and long-press windows are testable.

use log::debug;

use crate::event::{ContextTarget, SceneEvent};
use crate::geometry::{area_bounds, Bounds};
use crate::model::{AgentId, AreaId, BuildingAction, BuildingId, ScreenPos, WorldPos};
use crate::scene::{DragRelease, Gesture, Scene};
use crate::store::{Modifiers, SceneStore, ShortcutAction, StoreCommand};

pub const DOUBLE_CLICK_MS: f64 = 400.0;
pub const LONG_PRESS_MS: f64 = 500.0;
pub const LONG_PRESS_DRIFT_PX: f64 = 10.0;
/// Pointer travel that turns a press into a drag.
pub const CLICK_THRESHOLD_PX: f64 = 5.0;
const KEY_ZOOM_FACTOR: f64 = 1.2;
const FOCUS_PADDING: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Maps `MouseEvent.button`.
    pub fn from_dom(button: i16) -> Option<PointerButton> {
        match button {
            0 => Some(PointerButton::Primary),
            1 => Some(PointerButton::Middle),
            2 => Some(PointerButton::Secondary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ClickTarget {
    Agent(AgentId),
    Building(BuildingId),
    Area(AreaId),
}

#[derive(Debug, Clone)]
struct PendingClick {
    target: ClickTarget,
    at: f64,
    shift: bool,
    screen: ScreenPos,
}

/// What a primary press landed on, by priority.
#[derive(Debug, Clone, PartialEq)]
enum PressTarget {
    Draw,
    Handle,
    Building,
    Agent(AgentId),
    Folder(AreaId),
    Area(AreaId),
    Ground,
}

#[derive(Debug, Clone)]
struct Press {
    button: PointerButton,
    start: ScreenPos,
    shift: bool,
    target: PressTarget,
    panned: bool,
}

#[derive(Debug, Clone, Copy)]
struct Pinch {
    distance: f64,
    mid: ScreenPos,
}

#[derive(Debug, Clone, Copy)]
struct LongPress {
    start: ScreenPos,
    at: f64,
}

#[derive(Debug, Default)]
pub struct InputHandler {
    press: Option<Press>,
    pending_click: Option<PendingClick>,
    pinch: Option<Pinch>,
    long_press: Option<LongPress>,
    /// A long press already fired; the finger's release is not a click.
    swallow_release: bool,
    /// A pinch ended with one finger still down. Its moves are ignored
    /// until the next touch starts.
    stray_finger: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending_click(&self) -> bool {
        self.pending_click.is_some()
    }

    // --- POINTER ---

    pub fn on_pointer_down<S: SceneStore>(
        &mut self,
        scene: &mut Scene<S>,
        screen: ScreenPos,
        button: PointerButton,
        modifiers: Modifiers,
        now: f64,
    ) -> Vec<SceneEvent> {
        let events = self.flush_expired_click(scene, now);
        scene.camera_mut().set_mouse_position(screen);
        let world = scene.camera().screen_to_world(screen);

        let target = match button {
            PointerButton::Middle => {
                scene.gesture = Gesture::Panning { last: screen };
                PressTarget::Ground
            }
            PointerButton::Secondary => PressTarget::Ground,
            PointerButton::Primary => Self::begin_primary(scene, screen, world),
        };
        self.press = Some(Press {
            button,
            start: screen,
            shift: modifiers.shift,
            target,
            panned: button == PointerButton::Middle,
        });
        events
    }

    fn begin_primary<S: SceneStore>(scene: &mut Scene<S>, screen: ScreenPos, world: WorldPos) -> PressTarget {
        if scene.drawing_tool().is_some() {
            scene.start_drawing(world);
            return PressTarget::Draw;
        }
        if let Some((area_id, handle)) = scene.area_handle_at(world) {
            scene.start_resize(&area_id, handle, world);
            return PressTarget::Handle;
        }
        let agent = scene.agent_at(world);
        if let Some(building_id) = scene.building_at(world).filter(|_| agent.is_none()) {
            scene.start_building_drag(&building_id, world);
            return PressTarget::Building;
        }
        if let Some(agent_id) = agent {
            return PressTarget::Agent(agent_id);
        }
        if let Some(area_id) = scene.folder_badge_at(world) {
            return PressTarget::Folder(area_id);
        }
        scene.gesture = Gesture::Selecting { start: screen, current: screen };
        match scene.area_at(world) {
            Some(area_id) => PressTarget::Area(area_id),
            None => PressTarget::Ground,
        }
    }

    pub fn on_pointer_move<S: SceneStore>(&mut self, scene: &mut Scene<S>, screen: ScreenPos) -> Vec<SceneEvent> {
        scene.camera_mut().set_mouse_position(screen);
        let world = scene.camera().screen_to_world(screen);

        if let Some(press) = self.press.as_mut() {
            if press.button == PointerButton::Secondary
                && !press.panned
                && press.start.distance(screen) >= CLICK_THRESHOLD_PX
            {
                press.panned = true;
                scene.gesture = Gesture::Panning { last: press.start };
            }
        }

        let mut events = Vec::new();
        match &mut scene.gesture {
            Gesture::Panning { last } => {
                let (dx, dy) = (screen.x - last.x, screen.y - last.y);
                *last = screen;
                scene.camera_mut().pan_by(dx, dy);
            }
            Gesture::Selecting { current, .. } => *current = screen,
            Gesture::Drawing { .. } => scene.update_drawing(world),
            Gesture::ResizingArea { .. } => scene.update_resize(world),
            Gesture::DraggingBuilding { .. } => events = scene.update_building_drag(world),
            Gesture::Idle => {
                if self.press.is_none() {
                    let hovered = scene.agent_at(world);
                    if hovered.as_deref() != scene.hovered_agent() {
                        scene.set_hovered_agent(hovered.clone());
                        events.push(SceneEvent::AgentHover { agent_id: hovered, screen });
                    }
                }
            }
        }
        events
    }

    pub fn on_pointer_up<S: SceneStore>(&mut self, scene: &mut Scene<S>, screen: ScreenPos, now: f64) -> Vec<SceneEvent> {
        let world = scene.camera().screen_to_world(screen);
        let Some(press) = self.press.take() else {
            // A draw survives the pointer leaving and coming back.
            if matches!(scene.gesture(), Gesture::Drawing { .. }) {
                scene.update_drawing(world);
                scene.finish_drawing(now);
            }
            return Vec::new();
        };
        let moved = press.start.distance(screen) >= CLICK_THRESHOLD_PX;
        let mut events = Vec::new();

        match scene.gesture().clone() {
            Gesture::Drawing { .. } => {
                scene.update_drawing(world);
                scene.finish_drawing(now);
            }
            Gesture::ResizingArea { .. } => {
                scene.finish_resize();
            }
            Gesture::DraggingBuilding { .. } => match scene.end_building_drag() {
                DragRelease::Dropped(event) => events.push(event),
                DragRelease::Clicked(id) => {
                    events.extend(self.register_click(scene, ClickTarget::Building(id), press.shift, screen, now))
                }
                DragRelease::NotDragging => {}
            },
            Gesture::Panning { .. } => scene.gesture = Gesture::Idle,
            Gesture::Selecting { start, .. } => {
                scene.gesture = Gesture::Idle;
                if start.distance(screen) >= CLICK_THRESHOLD_PX {
                    let start = scene.camera().screen_to_world(start);
                    events.push(SceneEvent::SelectionBox { start, end: world });
                } else {
                    match press.target {
                        PressTarget::Area(id) => {
                            events.extend(self.register_click(scene, ClickTarget::Area(id), press.shift, screen, now))
                        }
                        _ => events.extend(Self::ground_click(scene, world)),
                    }
                }
            }
            Gesture::Idle => match press.target {
                _ if moved => {}
                _ if press.button == PointerButton::Secondary => {
                    events.extend(Self::secondary_click(scene, screen, world, now))
                }
                PressTarget::Agent(id) => {
                    events.extend(self.register_click(scene, ClickTarget::Agent(id), press.shift, screen, now))
                }
                PressTarget::Folder(area_id) => {
                    scene.store_mut().dispatch(StoreCommand::OpenAreaExplorer { area_id: area_id.clone() });
                    events.push(SceneEvent::AreaFolderClick { area_id });
                }
                _ => {}
            },
        }
        events
    }

    /// The pointer left the canvas: abandon everything except a draw.
    pub fn on_pointer_leave<S: SceneStore>(&mut self, scene: &mut Scene<S>, screen: ScreenPos) -> Vec<SceneEvent> {
        let mut events = self.cancel_gesture(scene);
        self.long_press = None;
        if scene.hovered_agent().is_some() {
            scene.set_hovered_agent(None);
            events.push(SceneEvent::AgentHover { agent_id: None, screen });
        }
        scene.camera_mut().reset_mouse_position();
        events
    }

    pub fn on_wheel<S: SceneStore>(&mut self, scene: &mut Scene<S>, screen: ScreenPos, delta_y: f64) -> Vec<SceneEvent> {
        scene.camera_mut().zoom_at_point(screen.x, screen.y, delta_y);
        Vec::new()
    }

    /// Drops the active pointer gesture. Drawing is left alone.
    fn cancel_gesture<S: SceneStore>(&mut self, scene: &mut Scene<S>) -> Vec<SceneEvent> {
        let mut events = Vec::new();
        match scene.gesture().clone() {
            Gesture::Drawing { .. } => return events,
            Gesture::Panning { .. } | Gesture::Selecting { .. } => scene.gesture = Gesture::Idle,
            Gesture::ResizingArea { .. } => scene.cancel_resize(),
            Gesture::DraggingBuilding { .. } => events.extend(scene.cancel_building_drag()),
            Gesture::Idle => {}
        }
        self.press = None;
        events
    }

    // --- CLICKS ---

    fn register_click<S: SceneStore>(
        &mut self,
        scene: &mut Scene<S>,
        target: ClickTarget,
        shift: bool,
        screen: ScreenPos,
        now: f64,
    ) -> Vec<SceneEvent> {
        let is_double = self
            .pending_click
            .as_ref()
            .is_some_and(|p| p.target == target && now - p.at <= DOUBLE_CLICK_MS);
        if is_double {
            self.pending_click = None;
            return vec![Self::double_click(target)];
        }
        let events = self.flush_click(scene);
        self.pending_click = Some(PendingClick { target, at: now, shift, screen });
        events
    }

    fn flush_expired_click<S: SceneStore>(&mut self, scene: &mut Scene<S>, now: f64) -> Vec<SceneEvent> {
        let expired = self.pending_click.as_ref().is_some_and(|p| now - p.at > DOUBLE_CLICK_MS);
        if expired {
            self.flush_click(scene)
        } else {
            Vec::new()
        }
    }

    fn flush_click<S: SceneStore>(&mut self, scene: &mut Scene<S>) -> Vec<SceneEvent> {
        let Some(pending) = self.pending_click.take() else {
            return Vec::new();
        };
        match pending.target {
            ClickTarget::Agent(agent_id) => vec![SceneEvent::AgentClick { agent_id, shift: pending.shift }],
            ClickTarget::Building(building_id) => {
                scene.store_mut().dispatch(StoreCommand::SelectBuilding { building_id: Some(building_id.clone()) });
                vec![SceneEvent::BuildingClick { building_id, screen: pending.screen }]
            }
            ClickTarget::Area(area_id) => {
                scene.store_mut().dispatch(StoreCommand::SelectArea { area_id: Some(area_id) });
                Vec::new()
            }
        }
    }

    fn double_click(target: ClickTarget) -> SceneEvent {
        match target {
            ClickTarget::Agent(agent_id) => SceneEvent::AgentDoubleClick { agent_id },
            ClickTarget::Building(building_id) => SceneEvent::BuildingDoubleClick { building_id },
            ClickTarget::Area(area_id) => SceneEvent::AreaDoubleClick { area_id },
        }
    }

    fn ground_click<S: SceneStore>(scene: &mut Scene<S>, world: WorldPos) -> Vec<SceneEvent> {
        let store = scene.store_mut();
        store.dispatch(StoreCommand::SelectArea { area_id: None });
        store.dispatch(StoreCommand::SelectBuilding { building_id: None });
        vec![SceneEvent::GroundClick { world }]
    }

    fn secondary_click<S: SceneStore>(
        scene: &mut Scene<S>,
        screen: ScreenPos,
        world: WorldPos,
        now: f64,
    ) -> Vec<SceneEvent> {
        let target = Self::context_target(scene, world);
        let on_ground = !matches!(target, Some(ContextTarget::Agent { .. } | ContextTarget::Building { .. }));
        let mut selected: Vec<AgentId> = scene.store().snapshot().selected_agent_ids.iter().cloned().collect();
        if on_ground && !selected.is_empty() {
            selected.sort();
            scene.spawn_move_ripple(world, now);
            debug!("move order for {} agents", selected.len());
            return vec![SceneEvent::MoveCommand { agent_ids: selected, target: world }];
        }
        vec![SceneEvent::ContextMenu { screen, world, target }]
    }

    fn context_target<S: SceneStore>(scene: &Scene<S>, world: WorldPos) -> Option<ContextTarget> {
        if let Some(id) = scene.agent_at(world) {
            return Some(ContextTarget::Agent { id });
        }
        if let Some(id) = scene.building_at(world) {
            return Some(ContextTarget::Building { id });
        }
        scene.area_at(world).map(|id| ContextTarget::Area { id })
    }

    /// Fire deferred single clicks and long presses whose windows closed.
    pub fn tick<S: SceneStore>(&mut self, scene: &mut Scene<S>, now: f64) -> Vec<SceneEvent> {
        let mut events = self.flush_expired_click(scene, now);
        if let Some(long) = self.long_press {
            if now - long.at >= LONG_PRESS_MS {
                self.long_press = None;
                self.swallow_release = true;
                events.extend(self.cancel_gesture(scene));
                let world = scene.camera().screen_to_world(long.start);
                let target = Self::context_target(scene, world);
                events.push(SceneEvent::ContextMenu { screen: long.start, world, target });
            }
        }
        events
    }

    // --- TOUCH ---

    pub fn on_touch_start<S: SceneStore>(
        &mut self,
        scene: &mut Scene<S>,
        touches: &[ScreenPos],
        now: f64,
    ) -> Vec<SceneEvent> {
        self.stray_finger = false;
        match touches {
            [single] => {
                self.swallow_release = false;
                if scene.drawing_tool().is_none() {
                    self.long_press = Some(LongPress { start: *single, at: now });
                }
                self.on_pointer_down(scene, *single, PointerButton::Primary, Modifiers::default(), now)
            }
            [a, b, ..] => {
                self.long_press = None;
                let events = self.cancel_gesture(scene);
                self.pinch = Some(Pinch { distance: a.distance(*b), mid: midpoint(*a, *b) });
                events
            }
            [] => Vec::new(),
        }
    }

    pub fn on_touch_move<S: SceneStore>(&mut self, scene: &mut Scene<S>, touches: &[ScreenPos]) -> Vec<SceneEvent> {
        match touches {
            [a, b, ..] => {
                let (distance, mid) = (a.distance(*b), midpoint(*a, *b));
                if let Some(pinch) = self.pinch {
                    let camera = scene.camera_mut();
                    camera.pan_by(mid.x - pinch.mid.x, mid.y - pinch.mid.y);
                    if pinch.distance > 0.0 && distance > 0.0 {
                        camera.zoom_by_at(mid, distance / pinch.distance);
                    }
                }
                self.pinch = Some(Pinch { distance, mid });
                Vec::new()
            }
            [single] if self.pinch.is_none() && !self.stray_finger => {
                if self.long_press.is_some_and(|l| l.start.distance(*single) >= LONG_PRESS_DRIFT_PX) {
                    self.long_press = None;
                }
                self.on_pointer_move(scene, *single)
            }
            _ => Vec::new(),
        }
    }

    /// `lifted` is where the ending finger left the screen; `remaining`
    /// counts fingers still down.
    pub fn on_touch_end<S: SceneStore>(
        &mut self,
        scene: &mut Scene<S>,
        lifted: ScreenPos,
        remaining: usize,
        now: f64,
    ) -> Vec<SceneEvent> {
        self.long_press = None;
        if self.pinch.is_some() {
            if remaining < 2 {
                self.pinch = None;
                self.swallow_release = true;
                self.stray_finger = remaining == 1;
            }
            return Vec::new();
        }
        self.stray_finger = false;
        if std::mem::take(&mut self.swallow_release) {
            self.press = None;
            return Vec::new();
        }
        self.on_pointer_up(scene, lifted, now)
    }

    // --- KEYBOARD ---

    /// The bound action for a key press, if any.
    pub fn shortcut_for<S: SceneStore>(scene: &Scene<S>, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        scene
            .store()
            .snapshot()
            .shortcuts
            .iter()
            .find(|b| b.matches(key, modifiers))
            .map(|b| b.action)
    }

    pub fn on_key_down<S: SceneStore>(
        &mut self,
        scene: &mut Scene<S>,
        key: &str,
        modifiers: Modifiers,
    ) -> Vec<SceneEvent> {
        let Some(action) = Self::shortcut_for(scene, key, modifiers) else {
            return Vec::new();
        };
        let mut events = Vec::new();
        let center = ScreenPos::new(scene.camera().width() / 2.0, scene.camera().height() / 2.0);
        match action {
            ShortcutAction::PanUp => scene.camera_mut().pan_keys.up = true,
            ShortcutAction::PanDown => scene.camera_mut().pan_keys.down = true,
            ShortcutAction::PanLeft => scene.camera_mut().pan_keys.left = true,
            ShortcutAction::PanRight => scene.camera_mut().pan_keys.right = true,
            ShortcutAction::ZoomIn => scene.camera_mut().zoom_by_at(center, KEY_ZOOM_FACTOR),
            ShortcutAction::ZoomOut => scene.camera_mut().zoom_by_at(center, 1.0 / KEY_ZOOM_FACTOR),
            ShortcutAction::FocusSelection => Self::focus_selection(scene),
            ShortcutAction::DeleteSelectedArea => {
                if let Some(area_id) = scene.store().snapshot().selected_area_id.clone() {
                    scene.store_mut().dispatch(StoreCommand::DeleteArea { area_id });
                    scene.sync_areas();
                }
            }
            ShortcutAction::Cancel => {
                events = self.cancel_gesture(scene);
                scene.set_drawing_tool(None);
                scene.store_mut().dispatch(StoreCommand::SelectArea { area_id: None });
            }
            ShortcutAction::StartBuilding => Self::command_buildings(scene, BuildingAction::Start),
            ShortcutAction::StopBuilding => Self::command_buildings(scene, BuildingAction::Stop),
            ShortcutAction::RestartBuilding => Self::command_buildings(scene, BuildingAction::Restart),
        }
        events
    }

    /// Releases held pan keys. Modifiers are ignored so a key let go after
    /// its modifier still stops panning.
    pub fn on_key_up<S: SceneStore>(&mut self, scene: &mut Scene<S>, key: &str) -> Vec<SceneEvent> {
        let actions: Vec<ShortcutAction> = scene
            .store()
            .snapshot()
            .shortcuts
            .iter()
            .filter(|b| b.key.eq_ignore_ascii_case(key))
            .map(|b| b.action)
            .collect();
        let keys = &mut scene.camera_mut().pan_keys;
        for action in actions {
            match action {
                ShortcutAction::PanUp => keys.up = false,
                ShortcutAction::PanDown => keys.down = false,
                ShortcutAction::PanLeft => keys.left = false,
                ShortcutAction::PanRight => keys.right = false,
                _ => {}
            }
        }
        Vec::new()
    }

    fn focus_selection<S: SceneStore>(scene: &mut Scene<S>) {
        let snapshot = scene.store().snapshot();
        let points: Vec<WorldPos> = snapshot
            .selected_agent_ids
            .iter()
            .filter_map(|id| scene.rendered_position(id))
            .collect();
        let bounds = match Bounds::enclosing(points) {
            Some(b) => Some(b),
            None => snapshot
                .selected_area_id
                .as_deref()
                .and_then(|id| scene.area(id))
                .map(area_bounds),
        };
        let Some(b) = bounds else {
            return;
        };
        let camera = scene.camera_mut();
        if b.width() < f64::EPSILON && b.height() < f64::EPSILON {
            camera.focus_on(b.min_x, b.min_z, None);
        } else {
            camera.focus_on_bounds(b.min_x, b.max_x, b.min_z, b.max_z, FOCUS_PADDING);
        }
    }

    fn command_buildings<S: SceneStore>(scene: &mut Scene<S>, action: BuildingAction) {
        let mut ids: Vec<BuildingId> = scene.store().snapshot().selected_building_ids.iter().cloned().collect();
        ids.sort();
        for building_id in ids {
            debug!("{action:?} building {building_id}");
            scene.store_mut().dispatch(StoreCommand::BuildingCommand { building_id, action });
        }
    }
}

fn midpoint(a: ScreenPos, b: ScreenPos) -> ScreenPos {
    ScreenPos::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_buttons_map() {
        assert_eq!(PointerButton::from_dom(0), Some(PointerButton::Primary));
        assert_eq!(PointerButton::from_dom(2), Some(PointerButton::Secondary));
        assert_eq!(PointerButton::from_dom(4), None);
    }

    #[test]
    fn midpoint_is_halfway() {
        assert_eq!(midpoint(ScreenPos::new(0.0, 0.0), ScreenPos::new(10.0, 4.0)), ScreenPos::new(5.0, 2.0));
    }
}
