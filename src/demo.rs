//! Demo mode - replays scripted touch input through the transition engine
//!
//! A script is a list of timed touch steps for a single finger:
//!
//! ```toml
//! step = [
//!     { action = "down", at_ms = 0, y = 2200.0 },
//!     { action = "move", at_ms = 16, y = 2150.0 },
//!     { action = "up", at_ms = 32 },
//! ]
//! ```
//!
//! The runner feeds due steps through the swipe detector into the swipe
//! controller, then advances the frame clock. Nothing here reads the wall
//! clock; the caller decides what "now" is.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::anim::{FrameClock, FRAME_INTERVAL_MS};
use crate::config::TransitionConfig;
use crate::error::{Error, Result};
use crate::input::SwipeDetector;
use crate::shell::{install_home_handlers, HomeScene, SceneSnapshot, StateSwipeController, SwipePhase};
use crate::state::{DeviceGeometry, UiState};
use crate::system::{HapticSink, StaticSystemUiFlags};
use crate::transition::{StateEvent, StateManager};

/// Workspace rows in the demo scene
const WORKSPACE_ROWS: usize = 5;

/// Finger id used for scripted touches
const SCRIPT_TOUCH_ID: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ScriptStep {
    Down { at_ms: u64, y: f32 },
    Move { at_ms: u64, y: f32 },
    Up { at_ms: u64 },
    Cancel { at_ms: u64 },
}

impl ScriptStep {
    pub fn at_ms(&self) -> u64 {
        match *self {
            ScriptStep::Down { at_ms, .. }
            | ScriptStep::Move { at_ms, .. }
            | ScriptStep::Up { at_ms }
            | ScriptStep::Cancel { at_ms } => at_ms,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "step", default)]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let script: Script = toml::from_str(contents).map_err(|e| Error::Script(e.to_string()))?;
        script.validate()?;
        Ok(script)
    }

    /// Steps must be in time order
    pub fn validate(&self) -> Result<()> {
        for pair in self.steps.windows(2) {
            if pair[1].at_ms() < pair[0].at_ms() {
                return Err(Error::Script(format!(
                    "step at {}ms comes after step at {}ms",
                    pair[1].at_ms(),
                    pair[0].at_ms()
                )));
            }
        }
        Ok(())
    }

    pub fn duration_ms(&self) -> u64 {
        self.steps.last().map_or(0, ScriptStep::at_ms)
    }

    /// Built-in script: swipe up and hold (overview), swipe down (home),
    /// fling up (background app)
    pub fn swipe_and_hold(geometry: &dyn DeviceGeometry) -> Self {
        let bottom = geometry.height() - 140.0;
        let middle = geometry.height() / 2.0;
        ScriptBuilder::default()
            .down(0, bottom)
            .moves(8, -32.0)
            .moves(12, -0.5)
            .up()
            .down(1200, middle)
            .moves(7, 60.0)
            .up()
            .down(2600, bottom)
            .moves(8, -60.0)
            .up()
            .build()
    }
}

/// Emits steps one frame apart
#[derive(Default)]
struct ScriptBuilder {
    steps: Vec<ScriptStep>,
    t: u64,
    y: f32,
}

impl ScriptBuilder {
    fn down(mut self, at_ms: u64, y: f32) -> Self {
        self.t = at_ms;
        self.y = y;
        self.steps.push(ScriptStep::Down { at_ms, y });
        self
    }

    fn moves(mut self, count: usize, dy: f32) -> Self {
        for _ in 0..count {
            self.t += FRAME_INTERVAL_MS;
            self.y += dy;
            self.steps.push(ScriptStep::Move {
                at_ms: self.t,
                y: self.y,
            });
        }
        self
    }

    fn up(mut self) -> Self {
        self.t += FRAME_INTERVAL_MS;
        self.steps.push(ScriptStep::Up { at_ms: self.t });
        self
    }

    fn build(self) -> Script {
        Script { steps: self.steps }
    }
}

/// Owns a complete engine instance driven by a script
pub struct DemoRunner {
    clock: FrameClock,
    manager: StateManager,
    scene: HomeScene,
    controller: StateSwipeController,
    detector: SwipeDetector,
    script: Script,
    next_step: usize,
    events: Rc<RefCell<Vec<StateEvent>>>,
}

impl DemoRunner {
    pub fn new(config: &TransitionConfig, script: Script, haptics: Rc<dyn HapticSink>) -> Self {
        let clock = FrameClock::new();
        let manager = StateManager::new(clock.clone(), Rc::new(config.display));
        let scene = HomeScene::new(WORKSPACE_ROWS, config.display.width);
        install_home_handlers(&manager, &scene);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        manager.add_state_listener(move |event| sink.borrow_mut().push(event.clone()));

        let controller = StateSwipeController::new(
            manager.clone(),
            config.clone(),
            haptics,
            Rc::new(StaticSystemUiFlags::default()),
            scene.clone(),
        );

        tracing::info!(
            steps = script.steps.len(),
            duration_ms = script.duration_ms(),
            "demo script loaded"
        );

        Self {
            clock,
            manager,
            scene,
            controller,
            detector: SwipeDetector::new(config.gesture.touch_slop),
            script,
            next_step: 0,
            events,
        }
    }

    /// Feed steps due by `now_ms` and advance animations
    ///
    /// Returns false once the script is exhausted and everything settled.
    pub fn step(&mut self, now_ms: u64) -> bool {
        while let Some(step) = self
            .script
            .steps
            .get(self.next_step)
            .filter(|s| s.at_ms() <= now_ms)
            .copied()
        {
            self.next_step += 1;
            self.feed(step);
        }
        self.controller.on_frame(now_ms);
        self.clock.tick(now_ms);
        !self.is_finished()
    }

    fn feed(&mut self, step: ScriptStep) {
        let event = match step {
            ScriptStep::Down { at_ms, y } => self.detector.touch_down(SCRIPT_TOUCH_ID, y, at_ms),
            ScriptStep::Move { at_ms, y } => {
                self.detector.touch_motion(SCRIPT_TOUCH_ID, y, at_ms)
            }
            ScriptStep::Up { .. } => self.detector.touch_up(SCRIPT_TOUCH_ID),
            ScriptStep::Cancel { .. } => self.detector.touch_cancel(),
        };
        if let Some(event) = event {
            tracing::trace!(?event, "swipe event");
            if let Err(e) = self.controller.handle_swipe_event(event) {
                tracing::warn!("Dropped swipe event {:?}: {}", event, e);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.next_step >= self.script.steps.len()
            && !self.clock.has_running_animations()
            && self.controller.phase() == SwipePhase::Idle
    }

    /// Step frame by frame until done or `limit_ms` passes
    pub fn run_to_end(&mut self, limit_ms: u64) -> UiState {
        let mut now = self.clock.now();
        while self.step(now) && now < limit_ms {
            now += FRAME_INTERVAL_MS;
        }
        self.manager.current_state()
    }

    /// Events emitted since the last call
    pub fn take_events(&self) -> Vec<StateEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn current_state(&self) -> UiState {
        self.manager.current_state()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        self.scene.snapshot()
    }

    pub fn controller(&self) -> &StateSwipeController {
        &self.controller
    }
}
