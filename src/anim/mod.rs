//! Animation engine
//!
//! - `animator`: frame clock and animator handles with one-shot completion listeners
//! - `interpolator`: easing curves
//! - `property`: animated properties and setters used by state handlers
//! - `group`: shared epilogue over concurrently running animations

mod animator;
mod group;
mod interpolator;
mod property;

pub use animator::{AnimationId, AnimationOutcome, Animator, FrameClock, FRAME_INTERVAL_MS};
pub use group::AnimationGroup;
pub use interpolator::{Interpolator, OVERSHOOT_1_2};
pub use property::{
    AnimatedSetter, AnimationComponents, AnimatorSetBuilder, BuilderFlags, FloatProperty,
    ImmediateSetter, PropertySetter, Tween,
};
