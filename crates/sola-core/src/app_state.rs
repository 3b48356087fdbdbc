//! Explicit application state.
//!
//! UI-level state (active conversation, voice mode, panel visibility) lives
//! in one store with defined load/save boundaries: loaded once at startup,
//! saved on explicit commit actions, and injected into components rather
//! than read ambiently.

use serde::{Deserialize, Serialize};

use crate::router::{LocalAction, Panel};

/// Visibility flags for the client's side panels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelVisibility {
    #[serde(default)]
    pub scheduler: bool,
    #[serde(default)]
    pub counselor: bool,
    #[serde(default)]
    pub branding: bool,
}

/// Persisted application state.
///
/// The active-conversation pointer lives with the conversation repository;
/// this struct carries the remaining UI-level flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Whether responses are forwarded to speech output.
    #[serde(default)]
    pub voice_enabled: bool,
    /// Panel visibility flags.
    #[serde(default)]
    pub panels: PanelVisibility,
}

impl AppState {
    /// Applies a routed local action. Pure state change; any backend
    /// follow-up command is the caller's separate step.
    pub fn apply(&mut self, action: &LocalAction) {
        match action {
            LocalAction::ShowPanel(panel) => self.set_panel(*panel, true),
            LocalAction::HidePanel(panel) => self.set_panel(*panel, false),
            LocalAction::SetVoice(enabled) => self.voice_enabled = *enabled,
            LocalAction::ShowHelp => {}
        }
    }

    fn set_panel(&mut self, panel: Panel, visible: bool) {
        match panel {
            Panel::Scheduler => self.panels.scheduler = visible,
            Panel::Counselor => self.panels.counselor = visible,
            Panel::Branding => self.panels.branding = visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_local_actions() {
        let mut state = AppState::default();

        state.apply(&LocalAction::ShowPanel(Panel::Scheduler));
        assert!(state.panels.scheduler);

        state.apply(&LocalAction::SetVoice(true));
        assert!(state.voice_enabled);

        state.apply(&LocalAction::HidePanel(Panel::Scheduler));
        assert!(!state.panels.scheduler);

        // Help is purely informational.
        let before = state.clone();
        state.apply(&LocalAction::ShowHelp);
        assert_eq!(state, before);
    }
}
