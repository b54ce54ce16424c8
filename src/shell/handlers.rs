//! State handlers for the home screen scene
//!
//! Each handler owns a slice of [`HomeScene`] and writes its values for a
//! state through the setter it is given. Which properties take part depends
//! on the animation components of the build:
//! - `PRIMARY`: workspace, scrim, back button, shelf position, recents offset
//! - `ATOMIC_OVERVIEW`: recents alpha and scale (the overview peek)

use crate::anim::{
    AnimationComponents, BuilderFlags, Interpolator, PropertySetter, OVERSHOOT_1_2,
};
use crate::error::{Error, Result};
use crate::state::{DeviceGeometry, StateFlags, UiState};
use crate::transition::{AnimationConfig, StateHandler, StateManager};

use super::scene::HomeScene;

pub struct WorkspaceHandler {
    scene: HomeScene,
}

impl WorkspaceHandler {
    pub fn new(scene: HomeScene) -> Self {
        Self { scene }
    }
}

impl StateHandler for WorkspaceHandler {
    fn name(&self) -> &'static str {
        "workspace"
    }

    fn apply(
        &mut self,
        state: UiState,
        _geometry: &dyn DeviceGeometry,
        config: &AnimationConfig,
        setter: &mut dyn PropertySetter,
    ) -> Result<()> {
        if !config.has_component(AnimationComponents::PRIMARY) {
            return Ok(());
        }
        let interpolator = if config.user_controlled {
            Interpolator::Linear
        } else {
            Interpolator::AccelDecel
        };
        setter.set_float(&self.scene.workspace_scale, state.workspace_scale(), interpolator);
        setter.set_float(&self.scene.workspace_alpha, state.workspace_alpha(), interpolator);
        setter.set_float(&self.scene.scrim_alpha, state.scrim_alpha(), Interpolator::Linear);
        Ok(())
    }
}

pub struct BackButtonHandler {
    scene: HomeScene,
}

impl BackButtonHandler {
    pub fn new(scene: HomeScene) -> Self {
        Self { scene }
    }
}

impl StateHandler for BackButtonHandler {
    fn name(&self) -> &'static str {
        "back_button"
    }

    fn apply(
        &mut self,
        state: UiState,
        _geometry: &dyn DeviceGeometry,
        config: &AnimationConfig,
        setter: &mut dyn PropertySetter,
    ) -> Result<()> {
        if config.has_component(AnimationComponents::PRIMARY) {
            setter.set_float(
                &self.scene.back_button_alpha,
                state.back_button_alpha(),
                Interpolator::Linear,
            );
        }
        Ok(())
    }
}

/// Shelf and recents (overview) panel
pub struct RecentsHandler {
    scene: HomeScene,
}

impl RecentsHandler {
    pub fn new(scene: HomeScene) -> Self {
        Self { scene }
    }

    fn recents_alpha(state: UiState) -> f32 {
        if state.has(StateFlags::OVERVIEW_UI) {
            1.0
        } else {
            0.0
        }
    }

    fn recents_scale(state: UiState) -> f32 {
        match state {
            UiState::OverviewPeek => 0.95,
            s if s.has(StateFlags::OVERVIEW_UI) => 1.0,
            _ => 0.9,
        }
    }

    /// Recents enter from the right edge; the peek shows a sliver of them
    fn recents_translate_x(state: UiState, width: f32) -> f32 {
        match state {
            UiState::Normal | UiState::SpringLoaded => width,
            UiState::OverviewPeek => width * 0.7,
            UiState::Overview | UiState::QuickSwitch | UiState::BackgroundApp => 0.0,
        }
    }
}

impl StateHandler for RecentsHandler {
    fn name(&self) -> &'static str {
        "recents"
    }

    fn apply(
        &mut self,
        state: UiState,
        geometry: &dyn DeviceGeometry,
        config: &AnimationConfig,
        setter: &mut dyn PropertySetter,
    ) -> Result<()> {
        let width = geometry.width();
        if width <= 0.0 {
            return Err(Error::Handler {
                handler: self.name(),
                reason: format!("invalid screen width {}", width),
            });
        }

        if config.has_component(AnimationComponents::PRIMARY) {
            setter.set_float(
                &self.scene.shelf_progress,
                state.vertical_progress(geometry),
                Interpolator::Linear,
            );
            if !config.has_flag(BuilderFlags::DONT_ANIMATE_OVERVIEW) {
                setter.set_float(
                    &self.scene.recents_translate_x,
                    Self::recents_translate_x(state, width),
                    Interpolator::AccelDecel,
                );
                setter.set_float(
                    &self.scene.overview_fullscreen,
                    state.overview_fullscreen_progress(),
                    Interpolator::Linear,
                );
            }
        }

        if config.has_component(AnimationComponents::ATOMIC_OVERVIEW) {
            let interpolator = if state == UiState::OverviewPeek {
                OVERSHOOT_1_2
            } else {
                Interpolator::Decelerate
            };
            setter.set_float(
                &self.scene.recents_alpha,
                Self::recents_alpha(state),
                Interpolator::Linear,
            );
            setter.set_float(&self.scene.recents_scale, Self::recents_scale(state), interpolator);
            // The peek also slides recents in when the primary build skipped them
            if !config.has_component(AnimationComponents::PRIMARY)
                || config.has_flag(BuilderFlags::DONT_ANIMATE_OVERVIEW)
            {
                setter.set_float(
                    &self.scene.recents_translate_x,
                    Self::recents_translate_x(state, width),
                    interpolator,
                );
            }
        }
        Ok(())
    }
}

/// Register the home screen handlers on a manager
pub fn install_home_handlers(manager: &StateManager, scene: &HomeScene) {
    manager.add_handler(Box::new(WorkspaceHandler::new(scene.clone())));
    manager.add_handler(Box::new(BackButtonHandler::new(scene.clone())));
    manager.add_handler(Box::new(RecentsHandler::new(scene.clone())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::{AnimatedSetter, ImmediateSetter};
    use crate::state::FixedGeometry;

    #[test]
    fn test_immediate_overview() {
        let geometry = FixedGeometry::default();
        let scene = HomeScene::new(4, geometry.width);
        let mut handler = RecentsHandler::new(scene.clone());
        handler
            .apply(UiState::Overview, &geometry, &AnimationConfig::immediate(), &mut ImmediateSetter)
            .unwrap();
        assert_eq!(scene.recents_alpha.get(), 1.0);
        assert_eq!(scene.recents_translate_x.get(), 0.0);
        assert_eq!(scene.shelf_progress.get(), UiState::Overview.vertical_progress(&geometry));
    }

    #[test]
    fn test_atomic_only_skips_primary() {
        let geometry = FixedGeometry::default();
        let scene = HomeScene::new(4, geometry.width);
        let mut config = AnimationConfig::immediate();
        config.components = AnimationComponents::ATOMIC_OVERVIEW;

        let mut workspace = WorkspaceHandler::new(scene.clone());
        let mut setter = AnimatedSetter::new();
        workspace
            .apply(UiState::OverviewPeek, &geometry, &config, &mut setter)
            .unwrap();
        assert!(setter.is_empty());

        let mut recents = RecentsHandler::new(scene.clone());
        recents
            .apply(UiState::OverviewPeek, &geometry, &config, &mut setter)
            .unwrap();
        let names: Vec<_> = setter.tweens().iter().map(|t| t.property.name()).collect();
        assert!(names.contains(&"recents_alpha"));
        assert!(names.contains(&"recents_translate_x"));
        assert!(!names.contains(&"shelf_progress"));
    }

    #[test]
    fn test_dont_animate_overview_flag() {
        let geometry = FixedGeometry::default();
        let scene = HomeScene::new(4, geometry.width);
        let mut config = AnimationConfig::immediate();
        config.components = AnimationComponents::PRIMARY;
        config.flags = BuilderFlags::DONT_ANIMATE_OVERVIEW;

        let mut recents = RecentsHandler::new(scene.clone());
        let mut setter = AnimatedSetter::new();
        recents
            .apply(UiState::BackgroundApp, &geometry, &config, &mut setter)
            .unwrap();
        let names: Vec<_> = setter.tweens().iter().map(|t| t.property.name()).collect();
        assert_eq!(names, vec!["shelf_progress"]);
    }

    #[test]
    fn test_invalid_geometry_fails() {
        let geometry = FixedGeometry {
            width: 0.0,
            ..FixedGeometry::default()
        };
        let scene = HomeScene::new(4, 1080.0);
        let mut recents = RecentsHandler::new(scene);
        let err = recents
            .apply(UiState::Overview, &geometry, &AnimationConfig::immediate(), &mut ImmediateSetter)
            .unwrap_err();
        assert!(matches!(err, Error::Handler { handler: "recents", .. }));
    }
}
