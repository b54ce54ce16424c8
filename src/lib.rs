//! Flick home screen state transitions
//!
//! Gesture-driven, interruptible animations between the home screen UI
//! states (workspace, overview, background app, ...):
//! - `state`: the UI states and their visual values
//! - `anim`: frame clock, animators, property tweens, completion groups
//! - `transition`: the state manager and the handler interface
//! - `input`: swipe and motion pause detection
//! - `shell`: home scene, handlers, swipe controller
//! - `demo`: scripted replay used by the binary

pub mod anim;
pub mod config;
pub mod demo;
pub mod error;
pub mod input;
pub mod shell;
pub mod state;
pub mod system;
pub mod transition;

pub use error::{Error, Result};
