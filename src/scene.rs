//! Scene orchestration: local entity mirrors, animation, gestures and the
//! per-frame draw.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::camera::Camera;
use crate::color::AREA_PALETTE;
use crate::config::{clamp_indicator_scale, SceneConfig};
use crate::effects::Effects;
use crate::event::SceneEvent;
use crate::geometry::{
    agent_hit_radius, area_contains, building_contains, drawn_shape, folder_badge_hit, handle_at, resize_area,
    shape_is_valid, Bounds, HandleKind,
};
use crate::model::{
    Agent2D, AgentId, Area2D, AreaId, Building2D, BuildingId, DrawTool, ScreenPos, WorldPos,
};
use crate::movement::{formation_positions, Movement, POSITION_EPSILON};
use crate::render::{AgentRenderer, AgentVisual, AreaRenderer, BuildingRenderer, EffectRenderer, GridRenderer, Motion};
use crate::store::{AreaPatch, SceneStore, StoreCommand};
use crate::surface::Surface;

/// The one pointer interaction in progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        last: ScreenPos,
    },
    Selecting {
        start: ScreenPos,
        current: ScreenPos,
    },
    Drawing {
        tool: DrawTool,
        start: WorldPos,
        current: WorldPos,
    },
    ResizingArea {
        area_id: AreaId,
        handle: HandleKind,
        start: WorldPos,
        original: Area2D,
    },
    DraggingBuilding {
        building_id: BuildingId,
        origin: WorldPos,
        grab: WorldPos,
        current: WorldPos,
        dragging: bool,
    },
}

/// How a building press ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragRelease {
    /// Moved past the threshold; carries the drag-end event.
    Dropped(SceneEvent),
    /// Released without moving far enough: a click on the building.
    Clicked(BuildingId),
    NotDragging,
}

/// World distance a pressed building must travel before it drags.
pub const BUILDING_DRAG_THRESHOLD: f64 = 0.5;
const BOSS_HIT_SCALE: f64 = 1.3;

pub struct Scene<S: SceneStore> {
    store: S,
    camera: Camera,
    config: SceneConfig,

    agents: HashMap<AgentId, Agent2D>,
    buildings: HashMap<BuildingId, Building2D>,
    areas: HashMap<AreaId, Area2D>,
    positions: HashMap<AgentId, WorldPos>,
    movements: HashMap<AgentId, Movement>,
    effects: Effects,

    grid: GridRenderer,
    area_renderer: AreaRenderer,
    building_renderer: BuildingRenderer,
    agent_renderer: AgentRenderer,
    effect_renderer: EffectRenderer,

    pub(crate) gesture: Gesture,
    drawing_tool: Option<DrawTool>,
    hovered_agent: Option<AgentId>,
    last_frame: Option<f64>,
    last_draw: Option<f64>,
    area_seq: u64,
}

impl<S: SceneStore> Scene<S> {
    pub fn new(store: S, config: SceneConfig, width: f64, height: f64) -> Self {
        let mut camera = Camera::new(width, height);
        camera.edge_pan = config.edge_pan;
        let indicator_scale = config.indicator_scale;
        let mut scene = Scene {
            store,
            camera,
            config,
            agents: HashMap::new(),
            buildings: HashMap::new(),
            areas: HashMap::new(),
            positions: HashMap::new(),
            movements: HashMap::new(),
            effects: Effects::new(),
            grid: GridRenderer::default(),
            area_renderer: AreaRenderer::default(),
            building_renderer: BuildingRenderer::default(),
            agent_renderer: AgentRenderer::default(),
            effect_renderer: EffectRenderer::default(),
            gesture: Gesture::Idle,
            drawing_tool: None,
            hovered_agent: None,
            last_frame: None,
            last_draw: None,
            area_seq: 0,
        };
        scene.set_indicator_scale(indicator_scale);
        scene
    }

    // --- ACCESSORS ---

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn drawing_tool(&self) -> Option<DrawTool> {
        self.drawing_tool
    }

    pub fn agent(&self, id: &str) -> Option<&Agent2D> {
        self.agents.get(id)
    }

    pub fn building(&self, id: &str) -> Option<&Building2D> {
        self.buildings.get(id)
    }

    pub fn area(&self, id: &str) -> Option<&Area2D> {
        self.areas.get(id)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    /// Where the agent is drawn right now.
    pub fn rendered_position(&self, id: &str) -> Option<WorldPos> {
        self.positions.get(id).copied()
    }

    pub fn movement(&self, id: &str) -> Option<&Movement> {
        self.movements.get(id)
    }

    pub fn hovered_agent(&self) -> Option<&str> {
        self.hovered_agent.as_deref()
    }

    pub(crate) fn set_hovered_agent(&mut self, id: Option<AgentId>) {
        self.hovered_agent = id;
    }

    pub fn spawn_move_ripple(&mut self, position: WorldPos, now: f64) {
        self.effects.spawn_move_ripple(position, now);
    }

    // --- SETTINGS ---

    pub fn set_indicator_scale(&mut self, scale: f64) {
        let scale = clamp_indicator_scale(scale);
        self.config.indicator_scale = scale;
        self.agent_renderer.set_indicator_scale(scale);
        self.building_renderer.set_indicator_scale(scale);
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.config.show_grid = show;
    }

    pub fn set_fps_limit(&mut self, fps: u32) {
        self.config.fps_limit = fps;
        self.last_draw = None;
    }

    pub fn set_edge_pan(&mut self, enabled: bool) {
        self.config.edge_pan = enabled;
        self.camera.edge_pan = enabled;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.camera.set_viewport(width, height);
    }

    // --- SYNC ---

    /// Mirror the store's agents. With `animate`, changed positions walk
    /// from where the agent is currently drawn; otherwise they jump.
    pub fn sync_agents(&mut self, animate: bool, now: f64) {
        let snapshot = self.store.snapshot();
        let positions = &mut self.positions;
        let movements = &mut self.movements;
        let effects = &mut self.effects;
        let walk_speed = self.config.walk_speed;

        let before = self.agents.len();
        self.agents.retain(|id, _| {
            let keep = snapshot.agents.contains_key(id);
            if !keep {
                positions.remove(id);
                movements.remove(id);
                effects.remove_agent(id);
            }
            keep
        });
        let removed = before - self.agents.len();

        for (id, agent) in &snapshot.agents {
            let target = agent.position;
            effects.set_agent_tool(id, agent.current_tool.as_deref(), now);

            let rendered = match (movements.get(id), positions.get(id)) {
                (Some(m), _) => Some(m.position_at(now)),
                (None, Some(p)) => Some(*p),
                (None, None) => None,
            };
            match rendered {
                Some(rendered) if animate => {
                    let heading_there = movements.get(id).is_some_and(|m| m.end.distance(target) <= POSITION_EPSILON);
                    if heading_there {
                        positions.insert(id.clone(), rendered);
                    } else if rendered.distance(target) > POSITION_EPSILON {
                        movements.insert(id.clone(), Movement::new(rendered, target, now, walk_speed));
                        positions.insert(id.clone(), rendered);
                    } else {
                        movements.remove(id);
                        positions.insert(id.clone(), target);
                    }
                }
                _ => {
                    movements.remove(id);
                    positions.insert(id.clone(), target);
                }
            }
            self.agents.insert(id.clone(), agent.clone());
        }

        debug!("synced {} agents ({removed} removed, {} moving)", self.agents.len(), self.movements.len());
    }

    pub fn sync_buildings(&mut self) {
        let snapshot = self.store.snapshot();
        self.buildings.retain(|id, _| snapshot.buildings.contains_key(id));
        for (id, building) in &snapshot.buildings {
            self.buildings.insert(id.clone(), building.clone());
        }
        debug!("synced {} buildings", self.buildings.len());
    }

    /// Mirror the store's live areas. Archived areas are dropped.
    pub fn sync_areas(&mut self) {
        let snapshot = self.store.snapshot();
        self.areas.retain(|id, _| snapshot.areas.get(id).is_some_and(|a| !a.archived));
        for (id, area) in snapshot.areas.iter().filter(|(_, a)| !a.archived) {
            self.areas.insert(id.clone(), area.clone());
        }
        debug!("synced {} areas", self.areas.len());
    }

    pub fn sync_all(&mut self, animate: bool, now: f64) {
        self.sync_areas();
        self.sync_buildings();
        self.sync_agents(animate, now);
    }

    // --- FRAME ---

    /// Advance and draw one frame. Returns false when the frame cap
    /// skipped the draw.
    pub fn frame(&mut self, now: f64, s: &mut dyn Surface) -> bool {
        let dt = self.last_frame.map_or(0.0, |last| (now - last).max(0.0));
        self.last_frame = Some(now);
        self.camera.update(dt);

        if let (Some(interval), Some(last)) = (self.config.frame_interval_ms(), self.last_draw) {
            if now - last < interval {
                return false;
            }
        }
        self.last_draw = Some(now);

        self.advance(now);
        self.draw(s, now);
        true
    }

    fn advance(&mut self, now: f64) {
        let positions = &mut self.positions;
        self.movements.retain(|id, m| {
            positions.insert(id.clone(), m.position_at(now));
            !m.is_finished(now)
        });
        self.effects.update(now);

        let seconds = now / 1000.0;
        self.grid.set_time(seconds);
        self.area_renderer.set_time(seconds);
        self.building_renderer.set_time(seconds);
        self.agent_renderer.set_time(seconds);
        self.effect_renderer.set_time(seconds);
    }

    fn draw(&self, s: &mut dyn Surface, now: f64) {
        let camera = &self.camera;
        let snapshot = self.store.snapshot();

        s.reset_transform();
        s.clear_rect(0.0, 0.0, camera.width(), camera.height());
        self.grid.draw(s, camera, self.config.show_grid);

        let mut areas: Vec<&Area2D> = self.areas.values().collect();
        areas.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        for area in areas {
            let selected = snapshot.selected_area_id.as_deref() == Some(area.id.as_str());
            self.area_renderer.draw(s, camera, area, selected);
        }

        for (boss, sub) in self.boss_link_pairs() {
            if let (Some(from), Some(to)) = (self.rendered_position(&boss), self.rendered_position(&sub)) {
                self.effect_renderer.draw_boss_link(s, camera, from, to);
            }
        }
        for building in self.sorted_buildings() {
            let subs: Vec<WorldPos> = building
                .subordinate_ids
                .iter()
                .filter_map(|id| self.buildings.get(id).map(|b| self.building_draw_position(b)))
                .collect();
            self.building_renderer.draw_boss_lines(s, camera, self.building_draw_position(building), &subs);
        }

        for building in self.sorted_buildings() {
            let selected = snapshot.selected_building_ids.contains(&building.id);
            self.building_renderer.draw(s, camera, building, self.building_draw_position(building), selected);
        }

        for (agent, position) in self.sorted_agents() {
            let motion = self.movements.get(&agent.id).map(|m| Motion { progress: m.progress(now), heading: m.heading() });
            let visual = AgentVisual {
                agent,
                position,
                selected: snapshot.selected_agent_ids.contains(&agent.id),
                hovered: self.hovered_agent.as_deref() == Some(agent.id.as_str()),
                motion,
                tool_badge: self.effects.tool_badge(&agent.id, now),
                now_ms: now,
            };
            self.agent_renderer.draw(s, camera, &visual);
        }

        for ripple in self.effects.ripples() {
            self.effect_renderer.draw_ripple(s, camera, ripple, now);
        }

        match &self.gesture {
            Gesture::Selecting { start, current } => self.agent_renderer.draw_selection_box(s, *start, *current),
            Gesture::Drawing { tool, start, current } => {
                self.agent_renderer.draw_area_preview(s, camera, *tool, *start, *current)
            }
            _ => {}
        }
    }

    fn sorted_buildings(&self) -> Vec<&Building2D> {
        let mut list: Vec<&Building2D> = self.buildings.values().collect();
        list.sort_by(|a, b| {
            let (pa, pb) = (self.building_draw_position(a), self.building_draw_position(b));
            pa.z.total_cmp(&pb.z).then_with(|| a.id.cmp(&b.id))
        });
        list
    }

    /// Agents with their rendered positions, back to front.
    fn sorted_agents(&self) -> Vec<(&Agent2D, WorldPos)> {
        let mut list: Vec<(&Agent2D, WorldPos)> = self
            .agents
            .values()
            .map(|a| (a, self.positions.get(&a.id).copied().unwrap_or(a.position)))
            .collect();
        list.sort_by(|(a, pa), (b, pb)| depth_order(*pa, &a.id, *pb, &b.id));
        list
    }

    fn building_draw_position(&self, building: &Building2D) -> WorldPos {
        match &self.gesture {
            Gesture::DraggingBuilding { building_id, current, dragging: true, .. } if *building_id == building.id => {
                *current
            }
            _ => building.position,
        }
    }

    // --- QUERIES ---

    /// Topmost agent under `world`.
    pub fn agent_at(&self, world: WorldPos) -> Option<AgentId> {
        let zoom = self.camera.zoom();
        let scale = self.config.indicator_scale;
        self.sorted_agents()
            .into_iter()
            .rev()
            .find(|(agent, pos)| {
                let boss = if agent.is_boss { BOSS_HIT_SCALE } else { 1.0 };
                pos.distance(world) <= agent_hit_radius(zoom, scale) * boss
            })
            .map(|(agent, _)| agent.id.clone())
    }

    pub fn building_at(&self, world: WorldPos) -> Option<BuildingId> {
        self.sorted_buildings()
            .into_iter()
            .rev()
            .find(|b| building_contains(self.building_draw_position(b), b.scale, world))
            .map(|b| b.id.clone())
    }

    /// Highest-z area containing `world`.
    pub fn area_at(&self, world: WorldPos) -> Option<AreaId> {
        self.areas
            .values()
            .filter(|a| area_contains(a, world))
            .max_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| b.id.cmp(&a.id)))
            .map(|a| a.id.clone())
    }

    pub fn folder_badge_at(&self, world: WorldPos) -> Option<AreaId> {
        let zoom = self.camera.zoom();
        self.areas
            .values()
            .filter(|a| folder_badge_hit(a, world, zoom))
            .max_by_key(|a| a.z_index)
            .map(|a| a.id.clone())
    }

    /// Agents whose rendered position lies in the box spanned by `a` and `b`.
    pub fn agents_in_box(&self, a: WorldPos, b: WorldPos) -> Vec<AgentId> {
        let bounds = Bounds::from_corners(a, b);
        let mut ids: Vec<AgentId> = self
            .sorted_agents()
            .into_iter()
            .filter(|(_, pos)| bounds.contains(*pos))
            .map(|(agent, _)| agent.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// (boss, subordinate) pairs to link: both agents present, and either the
    /// boss is selected or the subordinate is selected or sits in the boss
    /// chain of a selected agent.
    pub fn boss_link_pairs(&self) -> Vec<(AgentId, AgentId)> {
        let selected = &self.store.snapshot().selected_agent_ids;
        if selected.is_empty() {
            return Vec::new();
        }
        let mut chain: HashSet<&str> = HashSet::new();
        for id in selected {
            let mut current = id.as_str();
            while chain.insert(current) {
                match self.boss_of(current) {
                    Some(boss) => current = boss,
                    None => break,
                }
            }
        }

        let mut pairs: Vec<(AgentId, AgentId)> = Vec::new();
        for agent in self.agents.values() {
            for sub in &agent.subordinate_ids {
                if self.agents.contains_key(sub) {
                    pairs.push((agent.id.clone(), sub.clone()));
                }
            }
            if let Some(boss) = &agent.boss_id {
                if self.agents.contains_key(boss) {
                    pairs.push((boss.clone(), agent.id.clone()));
                }
            }
        }
        pairs.retain(|(boss, sub)| selected.contains(boss) || chain.contains(sub.as_str()));
        pairs.sort();
        pairs.dedup();
        pairs
    }

    fn boss_of(&self, id: &str) -> Option<&str> {
        let agent = self.agents.get(id)?;
        if let Some(boss) = agent.boss_id.as_deref().filter(|b| self.agents.contains_key(*b)) {
            return Some(boss);
        }
        self.agents
            .values()
            .find(|a| a.subordinate_ids.iter().any(|s| s == id))
            .map(|a| a.id.as_str())
    }

    // --- DRAWING ---

    pub fn set_drawing_tool(&mut self, tool: Option<DrawTool>) {
        self.drawing_tool = tool;
        if tool.is_none() {
            self.cancel_drawing();
        }
    }

    pub fn start_drawing(&mut self, world: WorldPos) -> bool {
        let Some(tool) = self.drawing_tool else {
            return false;
        };
        self.gesture = Gesture::Drawing { tool, start: world, current: world };
        true
    }

    pub fn update_drawing(&mut self, world: WorldPos) {
        if let Gesture::Drawing { current, .. } = &mut self.gesture {
            *current = world;
        }
    }

    /// Commit the drawn shape as a new selected area. Too-small shapes are
    /// dropped. Either way the tool is disarmed.
    pub fn finish_drawing(&mut self, now: f64) -> Option<AreaId> {
        let Gesture::Drawing { tool, start, current } = self.gesture else {
            return None;
        };
        self.gesture = Gesture::Idle;
        self.drawing_tool = None;

        let (shape, center) = drawn_shape(tool, start, current);
        if !shape_is_valid(&shape) {
            debug!("discarded undersized {tool:?} area");
            return None;
        }

        self.area_seq += 1;
        let id = format!("area-{}-{}", now.max(0.0) as u64, self.area_seq);
        let area = Area2D {
            id: id.clone(),
            shape,
            center,
            color: AREA_PALETTE[self.areas.len() % AREA_PALETTE.len()].to_owned(),
            label: None,
            z_index: self.store.next_z_index(),
            has_directories: false,
            archived: false,
        };
        info!("created area {id} ({shape:?})");
        self.store.dispatch(StoreCommand::AddArea { area });
        self.store.dispatch(StoreCommand::SelectArea { area_id: Some(id.clone()) });
        self.sync_areas();
        Some(id)
    }

    pub fn cancel_drawing(&mut self) {
        if matches!(self.gesture, Gesture::Drawing { .. }) {
            self.gesture = Gesture::Idle;
        }
    }

    // --- RESIZING ---

    /// Handle of the selected area under `world`, if any.
    pub fn area_handle_at(&self, world: WorldPos) -> Option<(AreaId, HandleKind)> {
        let id = self.store.snapshot().selected_area_id.as_ref()?;
        let area = self.areas.get(id)?;
        handle_at(area, world, self.camera.zoom()).map(|h| (id.clone(), h))
    }

    pub fn start_resize(&mut self, area_id: &str, handle: HandleKind, world: WorldPos) -> bool {
        let Some(area) = self.areas.get(area_id) else {
            return false;
        };
        self.gesture = Gesture::ResizingArea {
            area_id: area_id.to_owned(),
            handle,
            start: world,
            original: area.clone(),
        };
        true
    }

    pub fn update_resize(&mut self, world: WorldPos) {
        let Gesture::ResizingArea { area_id, handle, start, original } = &self.gesture else {
            return;
        };
        let resized = resize_area(original, *handle, *start, world);
        let command = StoreCommand::UpdateArea { area_id: area_id.clone(), patch: AreaPatch::geometry(&resized) };
        self.store.dispatch(command);
        self.sync_areas();
    }

    pub fn finish_resize(&mut self) -> bool {
        let Gesture::ResizingArea { area_id, .. } = &self.gesture else {
            return false;
        };
        debug!("resized area {area_id}");
        self.gesture = Gesture::Idle;
        true
    }

    /// Put the area back the way it was when the resize began.
    pub fn cancel_resize(&mut self) {
        let Gesture::ResizingArea { area_id, original, .. } = &self.gesture else {
            return;
        };
        let command = StoreCommand::UpdateArea { area_id: area_id.clone(), patch: AreaPatch::geometry(original) };
        self.store.dispatch(command);
        self.gesture = Gesture::Idle;
        self.sync_areas();
    }

    // --- BUILDING DRAG ---

    pub fn start_building_drag(&mut self, building_id: &str, world: WorldPos) -> bool {
        let Some(building) = self.buildings.get(building_id) else {
            return false;
        };
        self.gesture = Gesture::DraggingBuilding {
            building_id: building_id.to_owned(),
            origin: building.position,
            grab: world,
            current: building.position,
            dragging: false,
        };
        true
    }

    pub fn update_building_drag(&mut self, world: WorldPos) -> Vec<SceneEvent> {
        let Gesture::DraggingBuilding { building_id, origin, grab, current, dragging } = &mut self.gesture else {
            return Vec::new();
        };
        let mut events = Vec::new();
        if !*dragging {
            if grab.distance(world) < BUILDING_DRAG_THRESHOLD {
                return events;
            }
            *dragging = true;
            events.push(SceneEvent::BuildingDragStart { building_id: building_id.clone(), position: *origin });
        }
        *current = origin.offset(world.x - grab.x, world.z - grab.z);
        events.push(SceneEvent::BuildingDragMove { building_id: building_id.clone(), position: *current });
        events
    }

    pub fn end_building_drag(&mut self) -> DragRelease {
        if !matches!(self.gesture, Gesture::DraggingBuilding { .. }) {
            return DragRelease::NotDragging;
        }
        let Gesture::DraggingBuilding { building_id, current, dragging, .. } = std::mem::take(&mut self.gesture) else {
            return DragRelease::NotDragging;
        };
        if !dragging {
            return DragRelease::Clicked(building_id);
        }
        if let Some(building) = self.buildings.get_mut(&building_id) {
            building.position = current;
        }
        debug!("dropped building {building_id} at ({:.2}, {:.2})", current.x, current.z);
        DragRelease::Dropped(SceneEvent::BuildingDragEnd { building_id, position: current })
    }

    pub fn cancel_building_drag(&mut self) -> Option<SceneEvent> {
        if !matches!(self.gesture, Gesture::DraggingBuilding { .. }) {
            return None;
        }
        let Gesture::DraggingBuilding { building_id, dragging, .. } = std::mem::take(&mut self.gesture) else {
            return None;
        };
        dragging.then_some(SceneEvent::BuildingDragCancel { building_id })
    }

    // --- FORMATION ---

    /// Send the boss's subordinates to formation slots around it.
    /// Returns the ids that were ordered to move.
    pub fn call_subordinates(&mut self, boss_id: &str, now: f64) -> Vec<AgentId> {
        let Some(boss) = self.agents.get(boss_id) else {
            return Vec::new();
        };
        let center = boss.position;
        let subs: Vec<AgentId> = boss
            .subordinate_ids
            .iter()
            .filter(|id| self.agents.contains_key(*id))
            .cloned()
            .collect();
        let slots = formation_positions(center, subs.len());

        for (id, slot) in subs.iter().zip(slots) {
            self.store.dispatch(StoreCommand::MoveAgent { agent_id: id.clone(), position: slot });
            let from = self
                .movements
                .get(id)
                .map(|m| m.position_at(now))
                .or_else(|| self.positions.get(id).copied())
                .unwrap_or(slot);
            if from.distance(slot) > POSITION_EPSILON {
                self.movements.insert(id.clone(), Movement::new(from, slot, now, self.config.walk_speed));
            }
            if let Some(agent) = self.agents.get_mut(id) {
                agent.position = slot;
            }
        }
        info!("called {} subordinates to {boss_id}", subs.len());
        subs
    }
}

fn depth_order(pa: WorldPos, a: &str, pb: WorldPos, b: &str) -> Ordering {
    pa.z.total_cmp(&pb.z).then_with(|| a.cmp(b))
}
