//! Shelf peek latch
//!
//! Remembers which shelf position the swipe last asked for. Changing it
//! cancels whatever animation occupies the shelf slot; the latch itself
//! holds no animation handles.

use crate::error::Result;
use crate::transition::{StateManager, SHELF_SLOT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfState {
    Hide,
    Peek,
    Overview,
    Cancel,
}

impl ShelfState {
    pub fn should_perform_haptic(self) -> bool {
        match self {
            ShelfState::Hide | ShelfState::Peek => true,
            ShelfState::Overview | ShelfState::Cancel => false,
        }
    }
}

#[derive(Debug)]
pub struct ShelfPeek {
    state: ShelfState,
}

impl Default for ShelfPeek {
    fn default() -> Self {
        Self::new()
    }
}

impl ShelfPeek {
    pub fn new() -> Self {
        Self {
            state: ShelfState::Hide,
        }
    }

    pub fn state(&self) -> ShelfState {
        self.state
    }

    /// Adopt `next`, canceling the shelf slot; returns false when unchanged
    pub fn set_state(&mut self, next: ShelfState, manager: &StateManager) -> Result<bool> {
        if self.state == next {
            return Ok(false);
        }
        manager.cancel_state_element_animation(SHELF_SLOT)?;
        tracing::debug!(from = ?self.state, to = ?next, "shelf state");
        self.state = next;
        Ok(true)
    }
}
