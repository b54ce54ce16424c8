//! Animated properties and the setters state handlers write through
//!
//! A state handler never knows whether it is animating. It asks a
//! [`PropertySetter`] to move each property to its end value:
//! - [`ImmediateSetter`] writes the value right away (non-animated jumps, reapply)
//! - [`AnimatedSetter`] records a [`Tween`] from the live value, later driven
//!   by a single animator

use std::cell::Cell;
use std::rc::Rc;

use bitflags::bitflags;

use super::animator::{Animator, FrameClock};
use super::interpolator::Interpolator;

/// Shared float property of some view (alpha, scale, translation ...)
#[derive(Debug, Clone)]
pub struct FloatProperty {
    name: &'static str,
    value: Rc<Cell<f32>>,
}

impl FloatProperty {
    pub fn new(name: &'static str, initial: f32) -> Self {
        Self {
            name,
            value: Rc::new(Cell::new(initial)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self) -> f32 {
        self.value.get()
    }

    pub fn set(&self, value: f32) {
        self.value.set(value);
    }
}

pub trait PropertySetter {
    fn set_float(&mut self, property: &FloatProperty, value: f32, interpolator: Interpolator);

    /// True when values are recorded for animation rather than written
    fn is_animated(&self) -> bool;
}

/// Writes end values immediately
#[derive(Debug, Default)]
pub struct ImmediateSetter;

impl PropertySetter for ImmediateSetter {
    fn set_float(&mut self, property: &FloatProperty, value: f32, _interpolator: Interpolator) {
        property.set(value);
    }

    fn is_animated(&self) -> bool {
        false
    }
}

/// One property moving from `start` to `end`
#[derive(Debug, Clone)]
pub struct Tween {
    pub property: FloatProperty,
    pub start: f32,
    pub end: f32,
    pub interpolator: Interpolator,
}

impl Tween {
    /// Write the value for local progress `t`
    pub fn apply(&self, t: f32) {
        let eased = self.interpolator.interpolate(t);
        let value = if eased == 1.0 {
            self.end
        } else {
            self.start + (self.end - self.start) * eased
        };
        self.property.set(value);
    }
}

/// Records tweens from the current (live) property values
#[derive(Debug, Default)]
pub struct AnimatedSetter {
    tweens: Vec<Tween>,
}

impl AnimatedSetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Bundle the recorded tweens into one linear animator
    ///
    /// `start_progress` is the progress an interrupted transition had reached;
    /// the animator runs from there to 1.0 and every tween spans that range.
    pub fn build(self, clock: &FrameClock, duration_ms: u64, start_progress: f32) -> Animator {
        let start_progress = start_progress.clamp(0.0, 1.0);
        let animator = Animator::new(clock, duration_ms).with_interpolator(Interpolator::Linear);
        if start_progress > 0.0 {
            animator.set_fraction(start_progress);
        }

        let tweens = self.tweens;
        let span = (1.0 - start_progress).max(f32::EPSILON);
        animator.on_update(move |progress| {
            let local = (progress - start_progress) / span;
            for tween in &tweens {
                tween.apply(local);
            }
        });
        animator
    }
}

impl PropertySetter for AnimatedSetter {
    fn set_float(&mut self, property: &FloatProperty, value: f32, interpolator: Interpolator) {
        let start = property.get();
        if start == value {
            return;
        }
        self.tweens.push(Tween {
            property: property.clone(),
            start,
            end: value,
            interpolator,
        });
    }

    fn is_animated(&self) -> bool {
        true
    }
}

bitflags! {
    /// Behaviour switches for a single animation build
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BuilderFlags: u8 {
        /// Overview properties jump instead of animating
        const DONT_ANIMATE_OVERVIEW = 1 << 0;
    }
}

bitflags! {
    /// Which handler components take part in an animation
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AnimationComponents: u8 {
        /// Everything driven by the primary state transition
        const PRIMARY = 1 << 0;
        /// Overview pieces that may run as atomic sub-animations
        const ATOMIC_OVERVIEW = 1 << 1;
        const ALL = Self::PRIMARY.bits() | Self::ATOMIC_OVERVIEW.bits();
    }
}

/// Caller-side options for building a state animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimatorSetBuilder {
    pub flags: BuilderFlags,
    pub components: AnimationComponents,
}

impl Default for AnimatorSetBuilder {
    fn default() -> Self {
        Self {
            flags: BuilderFlags::empty(),
            components: AnimationComponents::ALL,
        }
    }
}

impl AnimatorSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_components(mut self, components: AnimationComponents) -> Self {
        self.components = components;
        self
    }

    pub fn with_flag(mut self, flag: BuilderFlags) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn has_flag(&self, flag: BuilderFlags) -> bool {
        self.flags.contains(flag)
    }
}
