//! State transitions
//!
//! - `handler`: the interface view groups implement to follow state changes
//! - `manager`: current state, primary session and atomic slots

mod handler;
mod manager;

pub use handler::{AnimationConfig, StateHandler};
pub use manager::{
    default_duration_ms, SessionKind, StateEvent, StateManager, TransitionSession,
    ATOMIC_SLOT_COUNT, PAUSE_TO_OVERVIEW_SLOT, RECENTS_FADE_SLOT, RECENTS_TRANSLATE_X_SLOT,
    SHELF_SLOT,
};
