//! The boundary to the authoritative application store.
//!
//! The scene reads a [`StoreSnapshot`] and writes only through
//! [`StoreCommand`]s. [`MemoryStore`] applies commands to its own snapshot;
//! the web host wraps one as a cache in front of the JavaScript store.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::geometry::area_contains;
use crate::model::{
    Agent2D, AgentId, Area2D, AreaId, AreaShape, Building2D, BuildingAction, BuildingId, WorldPos,
};

// --- SHORTCUTS ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    ZoomIn,
    ZoomOut,
    FocusSelection,
    DeleteSelectedArea,
    Cancel,
    StartBuilding,
    StopBuilding,
    RestartBuilding,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShortcutBinding {
    pub action: ShortcutAction,
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl ShortcutBinding {
    pub fn new(action: ShortcutAction, key: &str) -> Self {
        ShortcutBinding { action, key: key.to_owned(), ctrl: false, shift: false, alt: false, meta: false }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn matches(&self, key: &str, m: Modifiers) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.ctrl == m.ctrl
            && self.shift == m.shift
            && self.alt == m.alt
            && self.meta == m.meta
    }
}

/// Modifier keys held during an input event.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

pub fn default_shortcuts() -> Vec<ShortcutBinding> {
    use ShortcutAction::*;
    vec![
        ShortcutBinding::new(PanUp, "ArrowUp"),
        ShortcutBinding::new(PanUp, "w"),
        ShortcutBinding::new(PanDown, "ArrowDown"),
        ShortcutBinding::new(PanDown, "s"),
        ShortcutBinding::new(PanLeft, "ArrowLeft"),
        ShortcutBinding::new(PanLeft, "a"),
        ShortcutBinding::new(PanRight, "ArrowRight"),
        ShortcutBinding::new(PanRight, "d"),
        ShortcutBinding::new(ZoomIn, "="),
        ShortcutBinding::new(ZoomIn, "+").with_shift(),
        ShortcutBinding::new(ZoomOut, "-"),
        ShortcutBinding::new(FocusSelection, "f"),
        ShortcutBinding::new(DeleteSelectedArea, "Delete"),
        ShortcutBinding::new(DeleteSelectedArea, "Backspace"),
        ShortcutBinding::new(Cancel, "Escape"),
        ShortcutBinding::new(StartBuilding, "s").with_shift(),
        ShortcutBinding::new(StopBuilding, "x").with_shift(),
        ShortcutBinding::new(RestartBuilding, "r").with_shift(),
    ]
}

// --- COMMANDS ---

/// Partial update for an area; `None` fields are left as they are.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AreaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<AreaShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<WorldPos>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AreaPatch {
    pub fn geometry(area: &Area2D) -> AreaPatch {
        AreaPatch { shape: Some(area.shape), center: Some(area.center), ..Default::default() }
    }

    pub fn apply(&self, area: &mut Area2D) {
        if let Some(shape) = self.shape {
            area.shape = shape;
        }
        if let Some(center) = self.center {
            area.center = center;
        }
        if let Some(label) = &self.label {
            area.label = Some(label.clone());
        }
        if let Some(color) = &self.color {
            area.color = color.clone();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreCommand {
    MoveAgent { agent_id: AgentId, position: WorldPos },
    AddArea { area: Area2D },
    UpdateArea { area_id: AreaId, patch: AreaPatch },
    DeleteArea { area_id: AreaId },
    SelectArea { area_id: Option<AreaId> },
    SelectBuilding { building_id: Option<BuildingId> },
    BuildingCommand { building_id: BuildingId, action: BuildingAction },
    OpenAreaExplorer { area_id: AreaId },
}

// --- SNAPSHOT ---

#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub agents: HashMap<AgentId, Agent2D>,
    pub buildings: HashMap<BuildingId, Building2D>,
    pub areas: HashMap<AreaId, Area2D>,
    pub selected_agent_ids: HashSet<AgentId>,
    pub selected_building_ids: HashSet<BuildingId>,
    pub selected_area_id: Option<AreaId>,
    pub shortcuts: Vec<ShortcutBinding>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        StoreSnapshot {
            agents: HashMap::new(),
            buildings: HashMap::new(),
            areas: HashMap::new(),
            selected_agent_ids: HashSet::new(),
            selected_building_ids: HashSet::new(),
            selected_area_id: None,
            shortcuts: default_shortcuts(),
        }
    }
}

/// JSON shape the host sends: entity lists instead of maps.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct SnapshotWire {
    agents: Vec<Agent2D>,
    buildings: Vec<Building2D>,
    areas: Vec<Area2D>,
    selected_agent_ids: Vec<AgentId>,
    selected_building_ids: Vec<BuildingId>,
    selected_area_id: Option<AreaId>,
    shortcuts: Option<Vec<ShortcutBinding>>,
}

impl StoreSnapshot {
    pub fn from_json(json: &str) -> Result<StoreSnapshot, SceneError> {
        let wire: SnapshotWire = serde_json::from_str(json).map_err(SceneError::InvalidSnapshot)?;
        Ok(StoreSnapshot {
            agents: wire.agents.into_iter().map(|a| (a.id.clone(), a)).collect(),
            buildings: wire.buildings.into_iter().map(|b| (b.id.clone(), b)).collect(),
            areas: wire.areas.into_iter().map(|a| (a.id.clone(), a)).collect(),
            selected_agent_ids: wire.selected_agent_ids.into_iter().collect(),
            selected_building_ids: wire.selected_building_ids.into_iter().collect(),
            selected_area_id: wire.selected_area_id,
            shortcuts: wire.shortcuts.unwrap_or_else(default_shortcuts),
        })
    }

    /// Apply a command the same way the authoritative store would.
    pub fn apply(&mut self, command: &StoreCommand) {
        match command {
            StoreCommand::MoveAgent { agent_id, position } => {
                if let Some(agent) = self.agents.get_mut(agent_id) {
                    agent.position = *position;
                }
            }
            StoreCommand::AddArea { area } => {
                self.areas.insert(area.id.clone(), area.clone());
            }
            StoreCommand::UpdateArea { area_id, patch } => {
                if let Some(area) = self.areas.get_mut(area_id) {
                    patch.apply(area);
                }
            }
            StoreCommand::DeleteArea { area_id } => {
                self.areas.remove(area_id);
                if self.selected_area_id.as_ref() == Some(area_id) {
                    self.selected_area_id = None;
                }
            }
            StoreCommand::SelectArea { area_id } => {
                self.selected_area_id = area_id.clone();
            }
            StoreCommand::SelectBuilding { building_id } => {
                self.selected_building_ids.clear();
                if let Some(id) = building_id {
                    self.selected_building_ids.insert(id.clone());
                }
            }
            StoreCommand::BuildingCommand { .. } | StoreCommand::OpenAreaExplorer { .. } => {}
        }
    }
}

// --- STORE TRAIT ---

pub trait SceneStore {
    fn snapshot(&self) -> &StoreSnapshot;
    fn dispatch(&mut self, command: StoreCommand);

    fn is_area_archived(&self, area_id: &str) -> bool {
        self.snapshot().areas.get(area_id).is_some_and(|a| a.archived)
    }

    /// Topmost live area containing the agent.
    fn area_for_agent(&self, agent_id: &str) -> Option<&Area2D> {
        let snap = self.snapshot();
        let agent = snap.agents.get(agent_id)?;
        snap.areas
            .values()
            .filter(|a| !a.archived && area_contains(a, agent.position))
            .max_by_key(|a| a.z_index)
    }

    fn next_z_index(&self) -> i32 {
        self.snapshot().areas.values().map(|a| a.z_index).max().map_or(0, |z| z + 1)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: StoreSnapshot,
    log: Vec<StoreCommand>,
}

impl MemoryStore {
    pub fn new(snapshot: StoreSnapshot) -> Self {
        MemoryStore { snapshot, log: Vec::new() }
    }

    pub fn replace_snapshot(&mut self, snapshot: StoreSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn snapshot_mut(&mut self) -> &mut StoreSnapshot {
        &mut self.snapshot
    }

    pub fn commands(&self) -> &[StoreCommand] {
        &self.log
    }

    pub fn take_commands(&mut self) -> Vec<StoreCommand> {
        std::mem::take(&mut self.log)
    }

    pub fn upsert_agent(&mut self, agent: Agent2D) {
        self.snapshot.agents.insert(agent.id.clone(), agent);
    }

    pub fn upsert_building(&mut self, building: Building2D) {
        self.snapshot.buildings.insert(building.id.clone(), building);
    }

    pub fn upsert_area(&mut self, area: Area2D) {
        self.snapshot.areas.insert(area.id.clone(), area);
    }
}

impl SceneStore for MemoryStore {
    fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }

    fn dispatch(&mut self, command: StoreCommand) {
        debug!("store command: {command:?}");
        self.snapshot.apply(&command);
        self.log.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(id: &str, z: i32, archived: bool) -> Area2D {
        Area2D {
            id: id.into(),
            shape: AreaShape::Rectangle { width: 10.0, height: 10.0 },
            center: WorldPos::default(),
            color: "#ffffff".into(),
            label: None,
            z_index: z,
            has_directories: false,
            archived,
        }
    }

    #[test]
    fn next_z_index_follows_highest() {
        let mut store = MemoryStore::default();
        assert_eq!(store.next_z_index(), 0);
        store.upsert_area(area("a", 3, false));
        store.upsert_area(area("b", 7, false));
        assert_eq!(store.next_z_index(), 8);
    }

    #[test]
    fn area_for_agent_prefers_top_live_area() {
        let mut store = MemoryStore::default();
        store.upsert_area(area("low", 1, false));
        store.upsert_area(area("high", 5, false));
        store.upsert_area(area("archived", 9, true));
        store.upsert_agent(Agent2D { id: "a1".into(), ..Default::default() });
        assert_eq!(store.area_for_agent("a1").map(|a| a.id.as_str()), Some("high"));
        assert!(store.area_for_agent("ghost").is_none());
    }

    #[test]
    fn snapshot_parses_wire_lists() {
        let snap = StoreSnapshot::from_json(
            r##"{"agents":[{"id":"a","position":{"x":0,"z":0},"name":"A"}],
                "selectedAgentIds":["a"],
                "areas":[{"id":"r","shape":{"type":"circle","radius":2},"center":{"x":1,"z":1},"color":"#fff"}]}"##,
        )
        .unwrap();
        assert!(snap.agents.contains_key("a"));
        assert!(snap.selected_agent_ids.contains("a"));
        assert_eq!(snap.areas["r"].shape, AreaShape::Circle { radius: 2.0 });
        assert_eq!(snap.shortcuts, default_shortcuts());
    }

    #[test]
    fn malformed_snapshot_is_an_error() {
        assert!(matches!(StoreSnapshot::from_json("{"), Err(SceneError::InvalidSnapshot(_))));
    }

    #[test]
    fn commands_are_applied_and_logged() {
        let mut store = MemoryStore::default();
        store.dispatch(StoreCommand::AddArea { area: area("a", 0, false) });
        store.dispatch(StoreCommand::SelectArea { area_id: Some("a".into()) });
        store.dispatch(StoreCommand::DeleteArea { area_id: "a".into() });
        assert!(store.snapshot().areas.is_empty());
        assert_eq!(store.snapshot().selected_area_id, None);
        assert_eq!(store.commands().len(), 3);
    }

    #[test]
    fn command_serializes_tagged() {
        let json = serde_json::to_string(&StoreCommand::DeleteArea { area_id: "x".into() }).unwrap();
        assert_eq!(json, r#"{"type":"delete_area","area_id":"x"}"#);
    }

    #[test]
    fn shift_binding_needs_shift() {
        let b = ShortcutBinding::new(ShortcutAction::RestartBuilding, "r").with_shift();
        assert!(b.matches("R", Modifiers { shift: true, ..Default::default() }));
        assert!(!b.matches("r", Modifiers::default()));
    }
}
