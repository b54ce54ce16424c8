//! Home screen UI states
//!
//! Every reachable state is a variant of [`UiState`]. Per-state configuration
//! (ordinal, transition duration, capability flags) lives in a const table, and
//! the visual targets of a state are pure functions of the state and the
//! device geometry.

mod geometry;

pub use geometry::{DeviceGeometry, FixedGeometry};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Overview-family transition duration
pub const OVERVIEW_TRANSITION_MS: u64 = 250;
/// Spring-loaded (drag and drop) transition duration
pub const SPRING_LOADED_TRANSITION_MS: u64 = 150;

bitflags! {
    /// Orthogonal UI capabilities of a state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StateFlags: u16 {
        /// Workspace shows more than one page
        const MULTI_PAGE = 1 << 0;
        const DISABLE_ACCESSIBILITY = 1 << 1;
        /// State must not be restored across restarts
        const DISABLE_RESTORE = 1 << 2;
        const WORKSPACE_ICONS_CAN_BE_DRAGGED = 1 << 3;
        const DISABLE_PAGE_CLIPPING = 1 << 4;
        const PAGE_BACKGROUNDS = 1 << 5;
        /// Home screen can not be interacted with directly
        const DISABLE_INTERACTION = 1 << 6;
        /// Overview panel is visible
        const OVERVIEW_UI = 1 << 7;
        const HIDE_BACK_BUTTON = 1 << 8;
        const HAS_SYS_UI_SCRIM = 1 << 9;
    }
}

/// A statically configured UI mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    /// Home screen, the only state reachable without a gesture
    Normal,
    /// Workspace shrunk for drag and drop
    SpringLoaded,
    /// Task switcher
    Overview,
    /// Overview partially revealed while a finger dwells mid-swipe
    OverviewPeek,
    /// Quick switch between recent tasks
    QuickSwitch,
    /// Home screen sits behind a running app
    BackgroundApp,
}

struct StateDescriptor {
    ordinal: u8,
    transition_duration_ms: u64,
    flags: StateFlags,
}

const OVERVIEW_FLAGS: StateFlags = StateFlags::WORKSPACE_ICONS_CAN_BE_DRAGGED
    .union(StateFlags::DISABLE_RESTORE)
    .union(StateFlags::OVERVIEW_UI)
    .union(StateFlags::DISABLE_ACCESSIBILITY);

const BACKGROUND_APP_FLAGS: StateFlags = StateFlags::DISABLE_RESTORE
    .union(StateFlags::OVERVIEW_UI)
    .union(StateFlags::DISABLE_ACCESSIBILITY)
    .union(StateFlags::DISABLE_INTERACTION);

const NORMAL: StateDescriptor = StateDescriptor {
    ordinal: 0,
    transition_duration_ms: 0,
    flags: StateFlags::DISABLE_RESTORE
        .union(StateFlags::WORKSPACE_ICONS_CAN_BE_DRAGGED)
        .union(StateFlags::HIDE_BACK_BUTTON)
        .union(StateFlags::HAS_SYS_UI_SCRIM),
};

const SPRING_LOADED: StateDescriptor = StateDescriptor {
    ordinal: 1,
    transition_duration_ms: SPRING_LOADED_TRANSITION_MS,
    flags: StateFlags::MULTI_PAGE
        .union(StateFlags::DISABLE_ACCESSIBILITY)
        .union(StateFlags::DISABLE_RESTORE)
        .union(StateFlags::WORKSPACE_ICONS_CAN_BE_DRAGGED)
        .union(StateFlags::DISABLE_PAGE_CLIPPING)
        .union(StateFlags::PAGE_BACKGROUNDS)
        .union(StateFlags::HIDE_BACK_BUTTON),
};

const OVERVIEW: StateDescriptor = StateDescriptor {
    ordinal: 2,
    transition_duration_ms: OVERVIEW_TRANSITION_MS,
    flags: OVERVIEW_FLAGS,
};

const OVERVIEW_PEEK: StateDescriptor = StateDescriptor {
    ordinal: 3,
    transition_duration_ms: OVERVIEW_TRANSITION_MS,
    flags: OVERVIEW_FLAGS,
};

const QUICK_SWITCH: StateDescriptor = StateDescriptor {
    ordinal: 4,
    transition_duration_ms: OVERVIEW_TRANSITION_MS,
    flags: BACKGROUND_APP_FLAGS,
};

// Ordinal 5 is unused; ordering only matters for the swipe direction fallback.
const BACKGROUND_APP: StateDescriptor = StateDescriptor {
    ordinal: 6,
    transition_duration_ms: OVERVIEW_TRANSITION_MS,
    flags: BACKGROUND_APP_FLAGS,
};

impl UiState {
    pub const ALL: [UiState; 6] = [
        UiState::Normal,
        UiState::SpringLoaded,
        UiState::Overview,
        UiState::OverviewPeek,
        UiState::QuickSwitch,
        UiState::BackgroundApp,
    ];

    const fn descriptor(self) -> &'static StateDescriptor {
        match self {
            UiState::Normal => &NORMAL,
            UiState::SpringLoaded => &SPRING_LOADED,
            UiState::Overview => &OVERVIEW,
            UiState::OverviewPeek => &OVERVIEW_PEEK,
            UiState::QuickSwitch => &QUICK_SWITCH,
            UiState::BackgroundApp => &BACKGROUND_APP,
        }
    }

    pub const fn ordinal(self) -> u8 {
        self.descriptor().ordinal
    }

    /// Default duration when this state is the target of a committed transition
    pub const fn transition_duration_ms(self) -> u64 {
        self.descriptor().transition_duration_ms
    }

    pub const fn flags(self) -> StateFlags {
        self.descriptor().flags
    }

    pub fn has(self, flag: StateFlags) -> bool {
        self.flags().contains(flag)
    }

    pub fn name(self) -> &'static str {
        match self {
            UiState::Normal => "normal",
            UiState::SpringLoaded => "spring_loaded",
            UiState::Overview => "overview",
            UiState::OverviewPeek => "overview_peek",
            UiState::QuickSwitch => "quick_switch",
            UiState::BackgroundApp => "background_app",
        }
    }

    /// Vertical position of the shelf, 1.0 = fully down (home screen)
    pub fn vertical_progress(self, geometry: &dyn DeviceGeometry) -> f32 {
        match self {
            UiState::Normal | UiState::SpringLoaded => 1.0,
            UiState::Overview
            | UiState::OverviewPeek
            | UiState::QuickSwitch
            | UiState::BackgroundApp => {
                let range = geometry.shift_range();
                if range <= 0.0 {
                    return 1.0;
                }
                (1.0 - geometry.default_swipe_height() / range).clamp(0.0, 1.0)
            }
        }
    }

    /// Alpha of the scrim drawn over the workspace
    pub fn scrim_alpha(self) -> f32 {
        match self {
            UiState::Normal | UiState::BackgroundApp => 0.0,
            UiState::SpringLoaded => 0.3,
            UiState::OverviewPeek => 0.25,
            UiState::Overview | UiState::QuickSwitch => 0.5,
        }
    }

    pub fn workspace_alpha(self) -> f32 {
        match self {
            UiState::QuickSwitch | UiState::BackgroundApp => 0.0,
            _ => 1.0,
        }
    }

    pub fn workspace_scale(self) -> f32 {
        match self {
            UiState::Normal => 1.0,
            UiState::SpringLoaded => 0.8,
            UiState::OverviewPeek => 0.96,
            UiState::Overview | UiState::QuickSwitch | UiState::BackgroundApp => 0.92,
        }
    }

    /// 1.0 when overview task views cover the whole screen
    pub fn overview_fullscreen_progress(self) -> f32 {
        match self {
            UiState::QuickSwitch | UiState::BackgroundApp => 1.0,
            _ => 0.0,
        }
    }

    pub fn back_button_alpha(self) -> f32 {
        if self.has(StateFlags::HIDE_BACK_BUTTON) {
            0.0
        } else {
            1.0
        }
    }

    /// Target of a vertical swipe started in this state, if any
    pub fn swipe_target(self) -> Option<UiState> {
        match self {
            UiState::Normal => Some(UiState::BackgroundApp),
            UiState::Overview
            | UiState::OverviewPeek
            | UiState::QuickSwitch
            | UiState::BackgroundApp => Some(UiState::Normal),
            UiState::SpringLoaded => None,
        }
    }
}

impl std::fmt::Display for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_unique() {
        let mut seen = Vec::new();
        for state in UiState::ALL {
            assert!(!seen.contains(&state.ordinal()), "duplicate ordinal for {state}");
            seen.push(state.ordinal());
        }
    }

    #[test]
    fn test_flags_not_inherited() {
        // Background app shares the overview UI but not draggable icons
        assert!(UiState::Overview.has(StateFlags::WORKSPACE_ICONS_CAN_BE_DRAGGED));
        assert!(!UiState::BackgroundApp.has(StateFlags::WORKSPACE_ICONS_CAN_BE_DRAGGED));
        assert!(UiState::BackgroundApp.has(StateFlags::DISABLE_INTERACTION));
        assert!(!UiState::Overview.has(StateFlags::DISABLE_INTERACTION));
    }

    #[test]
    fn test_vertical_progress() {
        let geometry = FixedGeometry {
            width: 1000.0,
            height: 2000.0,
            swipe_height: 500.0,
        };
        assert_eq!(UiState::Normal.vertical_progress(&geometry), 1.0);
        assert!((UiState::Overview.vertical_progress(&geometry) - 0.75).abs() < 1e-6);
        assert_eq!(
            UiState::Overview.vertical_progress(&geometry),
            UiState::BackgroundApp.vertical_progress(&geometry)
        );
    }

    #[test]
    fn test_durations() {
        assert_eq!(UiState::Normal.transition_duration_ms(), 0);
        assert_eq!(UiState::Overview.transition_duration_ms(), OVERVIEW_TRANSITION_MS);
        assert_eq!(UiState::SpringLoaded.transition_duration_ms(), SPRING_LOADED_TRANSITION_MS);
    }

    #[test]
    fn test_back_button_alpha() {
        assert_eq!(UiState::Normal.back_button_alpha(), 0.0);
        assert_eq!(UiState::Overview.back_button_alpha(), 1.0);
    }
}
