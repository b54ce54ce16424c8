//! Animated properties of the home screen
//!
//! The scene is the shared surface every handler and animation writes to.
//! A renderer reads it each frame; the demo prints it.

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;

use crate::anim::FloatProperty;

/// Clip flags turned off while rows animate outside their cells
#[derive(Debug)]
pub struct ClipState {
    pub workspace_clip_children: Cell<bool>,
    pub cell_layout_clip_children: Cell<bool>,
}

impl Default for ClipState {
    fn default() -> Self {
        Self {
            workspace_clip_children: Cell::new(true),
            cell_layout_clip_children: Cell::new(true),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HomeScene {
    pub workspace_scale: FloatProperty,
    pub workspace_alpha: FloatProperty,
    pub scrim_alpha: FloatProperty,
    pub back_button_alpha: FloatProperty,
    /// 1.0 = shelf fully down
    pub shelf_progress: FloatProperty,
    pub recents_alpha: FloatProperty,
    pub recents_scale: FloatProperty,
    pub recents_translate_x: FloatProperty,
    pub overview_fullscreen: FloatProperty,
    /// Vertical translation of each workspace row, top row first
    pub rows: Vec<FloatProperty>,
    pub clip: Rc<ClipState>,
}

impl HomeScene {
    /// Scene at rest in the normal state
    pub fn new(row_count: usize, screen_width: f32) -> Self {
        Self {
            workspace_scale: FloatProperty::new("workspace_scale", 1.0),
            workspace_alpha: FloatProperty::new("workspace_alpha", 1.0),
            scrim_alpha: FloatProperty::new("scrim_alpha", 0.0),
            back_button_alpha: FloatProperty::new("back_button_alpha", 0.0),
            shelf_progress: FloatProperty::new("shelf_progress", 1.0),
            recents_alpha: FloatProperty::new("recents_alpha", 0.0),
            recents_scale: FloatProperty::new("recents_scale", 0.9),
            recents_translate_x: FloatProperty::new("recents_translate_x", screen_width),
            overview_fullscreen: FloatProperty::new("overview_fullscreen", 0.0),
            rows: (0..row_count)
                .map(|_| FloatProperty::new("row_translate_y", 0.0))
                .collect(),
            clip: Rc::new(ClipState::default()),
        }
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            workspace_scale: self.workspace_scale.get(),
            workspace_alpha: self.workspace_alpha.get(),
            scrim_alpha: self.scrim_alpha.get(),
            back_button_alpha: self.back_button_alpha.get(),
            shelf_progress: self.shelf_progress.get(),
            recents_alpha: self.recents_alpha.get(),
            recents_scale: self.recents_scale.get(),
            recents_translate_x: self.recents_translate_x.get(),
            overview_fullscreen: self.overview_fullscreen.get(),
            rows: self.rows.iter().map(FloatProperty::get).collect(),
            workspace_clip_children: self.clip.workspace_clip_children.get(),
            cell_layout_clip_children: self.clip.cell_layout_clip_children.get(),
        }
    }
}

/// Plain copy of the scene values at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub workspace_scale: f32,
    pub workspace_alpha: f32,
    pub scrim_alpha: f32,
    pub back_button_alpha: f32,
    pub shelf_progress: f32,
    pub recents_alpha: f32,
    pub recents_scale: f32,
    pub recents_translate_x: f32,
    pub overview_fullscreen: f32,
    pub rows: Vec<f32>,
    pub workspace_clip_children: bool,
    pub cell_layout_clip_children: bool,
}
