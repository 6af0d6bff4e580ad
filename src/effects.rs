//! Transient animation state that is not part of any entity.

use std::collections::HashMap;

use crate::model::{AgentId, WorldPos};
use crate::movement::{ease_in_cubic, ease_out_cubic};

pub const TOOL_FADE_IN_MS: f64 = 200.0;
pub const TOOL_FADE_OUT_MS: f64 = 200.0;
pub const MOVE_RIPPLE_MS: f64 = 700.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum BadgePhase {
    Showing { since: f64 },
    Hiding { since: f64, from_opacity: f64 },
}

#[derive(Debug, Clone, PartialEq)]
struct ToolBadge {
    tool: String,
    phase: BadgePhase,
}

impl ToolBadge {
    fn opacity(&self, now: f64) -> f64 {
        match self.phase {
            BadgePhase::Showing { since } => ease_out_cubic((now - since) / TOOL_FADE_IN_MS),
            BadgePhase::Hiding { since, from_opacity } => {
                from_opacity * (1.0 - ease_in_cubic((now - since) / TOOL_FADE_OUT_MS))
            }
        }
    }

    fn is_gone(&self, now: f64) -> bool {
        matches!(self.phase, BadgePhase::Hiding { since, .. } if now - since >= TOOL_FADE_OUT_MS)
    }
}

/// An expanding ring left where a move order landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRipple {
    pub position: WorldPos,
    pub started: f64,
}

impl MoveRipple {
    pub fn progress(&self, now: f64) -> f64 {
        ((now - self.started) / MOVE_RIPPLE_MS).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Default)]
pub struct Effects {
    tool_badges: HashMap<AgentId, ToolBadge>,
    ripples: Vec<MoveRipple>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the agent's current tool. Appearing tools fade in, cleared
    /// tools fade out, and a swap while visible just relabels the badge.
    pub fn set_agent_tool(&mut self, agent_id: &str, tool: Option<&str>, now: f64) {
        let Some(badge) = self.tool_badges.get_mut(agent_id) else {
            if let Some(tool) = tool {
                self.tool_badges.insert(
                    agent_id.to_owned(),
                    ToolBadge { tool: tool.to_owned(), phase: BadgePhase::Showing { since: now } },
                );
            }
            return;
        };
        match tool {
            Some(tool) => {
                if let BadgePhase::Hiding { since, from_opacity } = badge.phase {
                    // Fade back in from wherever the fade-out got to.
                    let current = from_opacity * (1.0 - ease_in_cubic((now - since) / TOOL_FADE_OUT_MS));
                    let back_dated = now - inverse_ease_out_cubic(current) * TOOL_FADE_IN_MS;
                    badge.phase = BadgePhase::Showing { since: back_dated };
                }
                if badge.tool != tool {
                    badge.tool = tool.to_owned();
                }
            }
            None => {
                if let BadgePhase::Showing { .. } = badge.phase {
                    let from_opacity = badge.opacity(now);
                    badge.phase = BadgePhase::Hiding { since: now, from_opacity };
                }
            }
        }
    }

    /// Tool label and opacity for the agent's badge, if one is visible.
    pub fn tool_badge(&self, agent_id: &str, now: f64) -> Option<(&str, f64)> {
        let badge = self.tool_badges.get(agent_id)?;
        let opacity = badge.opacity(now);
        if opacity <= 0.0 {
            return None;
        }
        Some((badge.tool.as_str(), opacity))
    }

    pub fn spawn_move_ripple(&mut self, position: WorldPos, now: f64) {
        self.ripples.push(MoveRipple { position, started: now });
    }

    pub fn ripples(&self) -> &[MoveRipple] {
        &self.ripples
    }

    pub fn remove_agent(&mut self, agent_id: &str) {
        self.tool_badges.remove(agent_id);
    }

    /// Drop finished fade-outs and ripples.
    pub fn update(&mut self, now: f64) {
        self.tool_badges.retain(|_, badge| !badge.is_gone(now));
        self.ripples.retain(|r| now - r.started < MOVE_RIPPLE_MS);
    }

    pub fn badge_count(&self) -> usize {
        self.tool_badges.len()
    }
}

fn inverse_ease_out_cubic(v: f64) -> f64 {
    1.0 - (1.0 - v.clamp(0.0, 1.0)).cbrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn badge_fades_in_then_out() {
        let mut fx = Effects::new();
        fx.set_agent_tool("a", Some("Bash"), 0.0);
        assert!(fx.tool_badge("a", 0.0).is_none());
        let (_, mid) = fx.tool_badge("a", 100.0).unwrap();
        assert!(mid > 0.5 && mid < 1.0, "ease-out passes halfway early: {mid}");
        let (tool, full) = fx.tool_badge("a", 250.0).unwrap();
        assert_eq!(tool, "Bash");
        assert_relative_eq!(full, 1.0);

        fx.set_agent_tool("a", None, 300.0);
        let (_, fading) = fx.tool_badge("a", 400.0).unwrap();
        assert!(fading > 0.5 && fading < 1.0, "ease-in holds early: {fading}");
        fx.update(500.0);
        assert!(fx.tool_badge("a", 500.0).is_none());
        assert_eq!(fx.badge_count(), 0);
    }

    #[test]
    fn tool_swap_keeps_badge_visible() {
        let mut fx = Effects::new();
        fx.set_agent_tool("a", Some("Read"), 0.0);
        fx.set_agent_tool("a", Some("Edit"), 300.0);
        let (tool, opacity) = fx.tool_badge("a", 300.0).unwrap();
        assert_eq!(tool, "Edit");
        assert_relative_eq!(opacity, 1.0);
    }

    #[test]
    fn tool_returning_mid_fade_resumes_from_current_opacity() {
        let mut fx = Effects::new();
        fx.set_agent_tool("a", Some("Read"), 0.0);
        fx.set_agent_tool("a", None, 300.0);
        let before = fx.tool_badge("a", 400.0).unwrap().1;
        fx.set_agent_tool("a", Some("Read"), 400.0);
        let after = fx.tool_badge("a", 400.0).unwrap().1;
        assert_relative_eq!(before, after, epsilon = 1e-9);
    }

    #[test]
    fn ripples_expire() {
        let mut fx = Effects::new();
        fx.spawn_move_ripple(WorldPos::new(1.0, 1.0), 0.0);
        fx.update(MOVE_RIPPLE_MS - 1.0);
        assert_eq!(fx.ripples().len(), 1);
        fx.update(MOVE_RIPPLE_MS);
        assert!(fx.ripples().is_empty());
    }
}
