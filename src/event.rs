//! Events the scene raises back to the host.

use serde::Serialize;

use crate::model::{AgentId, AreaId, BuildingId, ScreenPos, WorldPos};

/// What a context menu was opened over.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextTarget {
    Agent { id: AgentId },
    Building { id: BuildingId },
    Area { id: AreaId },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SceneEvent {
    #[serde(rename_all = "camelCase")]
    AgentClick { agent_id: AgentId, shift: bool },
    #[serde(rename_all = "camelCase")]
    AgentDoubleClick { agent_id: AgentId },
    #[serde(rename_all = "camelCase")]
    AgentHover { agent_id: Option<AgentId>, screen: ScreenPos },
    #[serde(rename_all = "camelCase")]
    BuildingClick { building_id: BuildingId, screen: ScreenPos },
    #[serde(rename_all = "camelCase")]
    BuildingDoubleClick { building_id: BuildingId },
    #[serde(rename_all = "camelCase")]
    BuildingDragStart { building_id: BuildingId, position: WorldPos },
    #[serde(rename_all = "camelCase")]
    BuildingDragMove { building_id: BuildingId, position: WorldPos },
    #[serde(rename_all = "camelCase")]
    BuildingDragEnd { building_id: BuildingId, position: WorldPos },
    #[serde(rename_all = "camelCase")]
    BuildingDragCancel { building_id: BuildingId },
    ContextMenu { screen: ScreenPos, world: WorldPos, target: Option<ContextTarget> },
    GroundClick { world: WorldPos },
    SelectionBox { start: WorldPos, end: WorldPos },
    #[serde(rename_all = "camelCase")]
    MoveCommand { agent_ids: Vec<AgentId>, target: WorldPos },
    #[serde(rename_all = "camelCase")]
    AreaFolderClick { area_id: AreaId },
    #[serde(rename_all = "camelCase")]
    AreaDoubleClick { area_id: AreaId },
}

impl SceneEvent {
    /// Name of the host callback this event is delivered to.
    pub fn callback_name(&self) -> &'static str {
        match self {
            SceneEvent::AgentClick { .. } => "onAgentClick",
            SceneEvent::AgentDoubleClick { .. } => "onAgentDoubleClick",
            SceneEvent::AgentHover { .. } => "onAgentHover",
            SceneEvent::BuildingClick { .. } => "onBuildingClick",
            SceneEvent::BuildingDoubleClick { .. } => "onBuildingDoubleClick",
            SceneEvent::BuildingDragStart { .. } => "onBuildingDragStart",
            SceneEvent::BuildingDragMove { .. } => "onBuildingDragMove",
            SceneEvent::BuildingDragEnd { .. } => "onBuildingDragEnd",
            SceneEvent::BuildingDragCancel { .. } => "onBuildingDragCancel",
            SceneEvent::ContextMenu { .. } => "onContextMenu",
            SceneEvent::GroundClick { .. } => "onGroundClick",
            SceneEvent::SelectionBox { .. } => "onSelectionBox",
            SceneEvent::MoveCommand { .. } => "onMoveCommand",
            SceneEvent::AreaFolderClick { .. } => "onAreaFolderClick",
            SceneEvent::AreaDoubleClick { .. } => "onAreaDoubleClick",
        }
    }
}
