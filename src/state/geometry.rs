//! Device geometry used by the state progress formulas
//!
//! The engine never caches these values across layout changes; every
//! transition queries the provider again.

use serde::{Deserialize, Serialize};

/// Read-only source of the dimensions the progress formulas depend on
pub trait DeviceGeometry {
    /// Screen width in pixels
    fn width(&self) -> f32;

    /// Screen height in pixels
    fn height(&self) -> f32;

    /// Distance (pixels) a finger travels to swipe from home to overview
    fn default_swipe_height(&self) -> f32;

    /// Total vertical range that `vertical_progress` is measured against
    fn shift_range(&self) -> f32 {
        self.height()
    }
}

/// Fixed geometry, used by the demo runner and tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedGeometry {
    pub width: f32,
    pub height: f32,
    /// Swipe distance from home to overview
    pub swipe_height: f32,
}

impl Default for FixedGeometry {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 2340.0,
            swipe_height: 600.0,
        }
    }
}

impl DeviceGeometry for FixedGeometry {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn default_swipe_height(&self) -> f32 {
        self.swipe_height
    }
}
