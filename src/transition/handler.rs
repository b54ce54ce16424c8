//! State handler interface
//!
//! A handler owns a group of view properties and knows their value in every
//! [`UiState`]. It writes those values through the supplied setter, so the
//! same code serves animated transitions, atomic sub-animations and immediate
//! reapplication.

use crate::anim::{AnimationComponents, AnimatorSetBuilder, BuilderFlags, PropertySetter};
use crate::error::Result;
use crate::state::{DeviceGeometry, UiState};

/// Parameters of the animation a handler is contributing to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationConfig {
    pub duration_ms: u64,
    pub components: AnimationComponents,
    pub flags: BuilderFlags,
    /// Progress is scrubbed by a gesture rather than played
    pub user_controlled: bool,
}

impl AnimationConfig {
    /// Config for jumping straight to the end values
    pub fn immediate() -> Self {
        Self {
            duration_ms: 0,
            components: AnimationComponents::ALL,
            flags: BuilderFlags::empty(),
            user_controlled: false,
        }
    }

    pub fn from_builder(builder: &AnimatorSetBuilder, duration_ms: u64) -> Self {
        Self {
            duration_ms,
            components: builder.components,
            flags: builder.flags,
            user_controlled: false,
        }
    }

    pub fn has_component(&self, component: AnimationComponents) -> bool {
        self.components.intersects(component)
    }

    pub fn has_flag(&self, flag: BuilderFlags) -> bool {
        self.flags.contains(flag)
    }
}

pub trait StateHandler {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Move this handler's properties to their values for `state`
    fn apply(
        &mut self,
        state: UiState,
        geometry: &dyn DeviceGeometry,
        config: &AnimationConfig,
        setter: &mut dyn PropertySetter,
    ) -> Result<()>;
}
