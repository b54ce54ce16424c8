//! Input handling - touch, swipes and motion pause
//!
//! This module provides:
//! - Vertical swipe detection from raw touch events
//! - Motion pause (dwell) detection layered on a live drag

mod gestures;
mod motion_pause;

pub use gestures::*;
pub use motion_pause::*;
