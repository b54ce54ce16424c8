//! Home screen side of the transition engine
//!
//! - `scene`: animated properties the handlers write
//! - `handlers`: per view group state handlers
//! - `peek`: shelf peek latch
//! - `staggered`: row-by-row animation when arriving home from an app
//! - `controller`: drag gestures to state transitions

mod controller;
mod handlers;
mod peek;
mod scene;
mod staggered;

pub use controller::{
    progress_multiplier, settle_duration_ms, DeferredTarget, StateSwipeController, SwipePhase,
};
pub use handlers::{install_home_handlers, BackButtonHandler, RecentsHandler, WorkspaceHandler};
pub use peek::{ShelfPeek, ShelfState};
pub use scene::{ClipState, HomeScene, SceneSnapshot};
pub use staggered::StaggeredWorkspaceAnim;
