//! Entity types mirrored from the store, plus the style lookup tables.
//!
//! Every style table is keyed by an enum with a catch-all variant, so a tag
//! the engine does not know about still renders with the default visual.

use serde::{Deserialize, Serialize};

pub type AgentId = String;
pub type BuildingId = String;
pub type AreaId = String;

// --- COORDINATES ---

/// A point on the shared ground plane (x = left/right, z = depth).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPos {
    pub x: f64,
    pub z: f64,
}

impl WorldPos {
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn distance(self, other: WorldPos) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn lerp(self, other: WorldPos, t: f64) -> WorldPos {
        WorldPos {
            x: self.x + (other.x - self.x) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    pub fn offset(self, dx: f64, dz: f64) -> WorldPos {
        WorldPos { x: self.x + dx, z: self.z + dz }
    }
}

/// CSS-pixel coordinates inside the canvas.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    pub x: f64,
    pub y: f64,
}

impl ScreenPos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: ScreenPos) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// --- AGENTS ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentClass {
    Scout,
    Builder,
    Debugger,
    Architect,
    Warrior,
    Support,
    Boss,
    #[default]
    #[serde(other)]
    Default,
}

impl AgentClass {
    pub fn emoji(self) -> &'static str {
        match self {
            AgentClass::Scout => "🔍",
            AgentClass::Builder => "🔨",
            AgentClass::Debugger => "🐛",
            AgentClass::Architect => "📐",
            AgentClass::Warrior => "⚔️",
            AgentClass::Support => "💚",
            AgentClass::Boss => "👑",
            AgentClass::Default => "🤖",
        }
    }

    /// Body color used when the agent carries no color of its own.
    pub fn body_color(self) -> &'static str {
        match self {
            AgentClass::Scout => "#4a9eff",
            AgentClass::Builder => "#ff9f43",
            AgentClass::Debugger => "#ee5a6f",
            AgentClass::Architect => "#a55eea",
            AgentClass::Warrior => "#e74c3c",
            AgentClass::Support => "#26de81",
            AgentClass::Boss => "#f7b731",
            AgentClass::Default => "#8395a7",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Working,
    Waiting,
    WaitingPermission,
    Error,
    Offline,
    Orphaned,
    #[serde(other)]
    Unknown,
}

impl AgentStatus {
    pub fn color(self) -> &'static str {
        match self {
            AgentStatus::Idle => "#4ade80",
            AgentStatus::Working => "#60a5fa",
            AgentStatus::Waiting => "#fbbf24",
            AgentStatus::WaitingPermission => "#fb923c",
            AgentStatus::Error => "#ef4444",
            AgentStatus::Offline => "#6b7280",
            AgentStatus::Orphaned => "#a855f7",
            AgentStatus::Unknown => "#9ca3af",
        }
    }

    pub fn is_working(self) -> bool {
        matches!(self, AgentStatus::Working)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Agent2D {
    pub id: AgentId,
    pub position: WorldPos,
    pub name: String,
    #[serde(default)]
    pub class: AgentClass,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub is_boss: bool,
    #[serde(default)]
    pub color: Option<String>,
    /// Percentage of the context window still free, 0 to 100.
    #[serde(default = "full_context")]
    pub context_remaining: f64,
    /// Milliseconds since the epoch of the last activity.
    #[serde(default)]
    pub last_activity: f64,
    #[serde(default)]
    pub subordinate_ids: Vec<AgentId>,
    #[serde(default)]
    pub boss_id: Option<AgentId>,
    #[serde(default)]
    pub current_tool: Option<String>,
}

fn full_context() -> f64 {
    100.0
}

impl Agent2D {
    pub fn display_color(&self) -> &str {
        self.color.as_deref().unwrap_or_else(|| self.class.body_color())
    }
}

// --- BUILDINGS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileShape {
    Square,
    Rounded,
    Hexagon,
    Circle,
    Diamond,
}

/// Visual parameters for one building style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleVisual {
    pub fill: &'static str,
    pub accent: &'static str,
    pub shape: TileShape,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BuildingStyle {
    ServerRack,
    Tower,
    Dome,
    Pyramid,
    Desktop,
    FilingCabinet,
    Satellite,
    Crystal,
    Factory,
    CommandCenter,
    #[default]
    #[serde(other)]
    Default,
}

impl BuildingStyle {
    pub fn visual(self) -> StyleVisual {
        let (fill, accent, shape) = match self {
            BuildingStyle::ServerRack => ("#1e293b", "#38bdf8", TileShape::Square),
            BuildingStyle::Tower => ("#312e81", "#818cf8", TileShape::Rounded),
            BuildingStyle::Dome => ("#134e4a", "#2dd4bf", TileShape::Circle),
            BuildingStyle::Pyramid => ("#78350f", "#fbbf24", TileShape::Diamond),
            BuildingStyle::Desktop => ("#1f2937", "#a3e635", TileShape::Rounded),
            BuildingStyle::FilingCabinet => ("#3f3f46", "#d4d4d8", TileShape::Square),
            BuildingStyle::Satellite => ("#0c4a6e", "#7dd3fc", TileShape::Circle),
            BuildingStyle::Crystal => ("#4c1d95", "#e879f9", TileShape::Hexagon),
            BuildingStyle::Factory => ("#422006", "#fb923c", TileShape::Square),
            BuildingStyle::CommandCenter => ("#450a0a", "#f87171", TileShape::Hexagon),
            BuildingStyle::Default => ("#27272a", "#a1a1aa", TileShape::Rounded),
        };
        StyleVisual { fill, accent, shape }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Server,
    Link,
    Database,
    Docker,
    Monitor,
    Folder,
    Boss,
    #[default]
    #[serde(other)]
    Generic,
}

impl BuildingKind {
    pub fn emoji(self) -> &'static str {
        match self {
            BuildingKind::Server => "🖥️",
            BuildingKind::Link => "🔗",
            BuildingKind::Database => "🗄️",
            BuildingKind::Docker => "🐳",
            BuildingKind::Monitor => "📊",
            BuildingKind::Folder => "📁",
            BuildingKind::Boss => "🏰",
            BuildingKind::Generic => "🏢",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildingStatus {
    Running,
    Stopped,
    Starting,
    Stopping,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl BuildingStatus {
    pub fn color(self) -> &'static str {
        match self {
            BuildingStatus::Running => "#22c55e",
            BuildingStatus::Stopped => "#6b7280",
            BuildingStatus::Starting | BuildingStatus::Stopping => "#eab308",
            BuildingStatus::Error => "#ef4444",
            BuildingStatus::Unknown => "#94a3b8",
        }
    }

    /// Transitional and failing states pulse faster.
    pub fn pulse_rate(self) -> f64 {
        match self {
            BuildingStatus::Starting | BuildingStatus::Stopping => 4.0,
            BuildingStatus::Error => 6.0,
            _ => 1.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuildingAction {
    Start,
    Stop,
    Restart,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Building2D {
    pub id: BuildingId,
    pub position: WorldPos,
    pub name: String,
    #[serde(default)]
    pub style: BuildingStyle,
    #[serde(default)]
    pub kind: BuildingKind,
    #[serde(default)]
    pub status: BuildingStatus,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "unit_scale")]
    pub scale: f64,
    #[serde(default)]
    pub subordinate_ids: Vec<BuildingId>,
}

fn unit_scale() -> f64 {
    1.0
}

// --- TOOLS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Read,
    Write,
    Edit,
    Bash,
    Grep,
    Glob,
    WebFetch,
    WebSearch,
    Task,
    TodoWrite,
    Other,
}

impl ToolKind {
    pub fn from_name(name: &str) -> ToolKind {
        match name {
            "Read" => ToolKind::Read,
            "Write" => ToolKind::Write,
            "Edit" | "MultiEdit" | "NotebookEdit" => ToolKind::Edit,
            "Bash" => ToolKind::Bash,
            "Grep" => ToolKind::Grep,
            "Glob" => ToolKind::Glob,
            "WebFetch" => ToolKind::WebFetch,
            "WebSearch" => ToolKind::WebSearch,
            "Task" => ToolKind::Task,
            "TodoWrite" => ToolKind::TodoWrite,
            _ => ToolKind::Other,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ToolKind::Read => "📖",
            ToolKind::Write => "✏️",
            ToolKind::Edit => "📝",
            ToolKind::Bash => "💻",
            ToolKind::Grep => "🔎",
            ToolKind::Glob => "📂",
            ToolKind::WebFetch => "🌐",
            ToolKind::WebSearch => "🔍",
            ToolKind::Task => "📋",
            ToolKind::TodoWrite => "✅",
            ToolKind::Other => "🔧",
        }
    }
}

// --- AREAS ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AreaShape {
    Rectangle { width: f64, height: f64 },
    Circle { radius: f64 },
}

/// Shape armed for drawing a new area.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawTool {
    Rectangle,
    Circle,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Area2D {
    pub id: AreaId,
    pub shape: AreaShape,
    pub center: WorldPos,
    pub color: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub has_directories: bool,
    #[serde(default)]
    pub archived: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_falls_back_to_default_variant() {
        let status: AgentStatus = serde_json::from_str("\"compacting\"").unwrap();
        assert_eq!(status, AgentStatus::Unknown);
        let style: BuildingStyle = serde_json::from_str("\"pagoda\"").unwrap();
        assert_eq!(style, BuildingStyle::Default);
    }

    #[test]
    fn agent_deserializes_with_defaults() {
        let agent: Agent2D = serde_json::from_str(
            r#"{"id":"a1","position":{"x":1.0,"z":2.0},"name":"Scout","class":"scout"}"#,
        )
        .unwrap();
        assert_eq!(agent.class, AgentClass::Scout);
        assert_eq!(agent.context_remaining, 100.0);
        assert_eq!(agent.display_color(), "#4a9eff");
        assert!(agent.subordinate_ids.is_empty());
    }

    #[test]
    fn area_shape_is_tagged() {
        let shape: AreaShape = serde_json::from_str(r#"{"type":"circle","radius":3.5}"#).unwrap();
        assert_eq!(shape, AreaShape::Circle { radius: 3.5 });
    }

    #[test]
    fn draw_tool_parses_lowercase() {
        let tool: DrawTool = serde_json::from_str("\"circle\"").unwrap();
        assert_eq!(tool, DrawTool::Circle);
    }

    #[test]
    fn tool_names_map_to_icons() {
        assert_eq!(ToolKind::from_name("Bash").icon(), "💻");
        assert_eq!(ToolKind::from_name("mcp__custom").icon(), "🔧");
    }
}
