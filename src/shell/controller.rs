//! Swipe controller: drag gestures to state transitions
//!
//! A vertical drag scrubs a user-controlled transition from the current state
//! toward its swipe target. When the drag starts on the home screen, a motion
//! pause detector runs alongside it:
//! - pausing peeks the overview in (atomic shelf animation), resuming hides it
//! - releasing while paused opens the overview through the pause-to-overview slot
//! - otherwise the release velocity and progress decide the final state
//!
//! Pause notifications are queued by the detector listener and handled after
//! the detector borrow is released.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::anim::{
    AnimationComponents, AnimationOutcome, Animator, AnimatorSetBuilder, BuilderFlags,
    Interpolator,
};
use crate::config::{GestureConfig, TransitionConfig};
use crate::error::{Error, Result};
use crate::input::{MotionPauseDetector, SwipeEvent};
use crate::state::{DeviceGeometry, UiState};
use crate::system::{HapticCue, HapticSink, SystemUiFlagSource, SystemUiFlags};
use crate::transition::{StateManager, PAUSE_TO_OVERVIEW_SLOT, SHELF_SLOT};

use super::peek::{ShelfPeek, ShelfState};
use super::scene::HomeScene;
use super::staggered::StaggeredWorkspaceAnim;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipePhase {
    Idle,
    /// Drag started in a state without a swipe target
    Ignored,
    Dragging,
    /// Released, animating to the chosen state
    Settling,
    /// Released while paused, opening the overview
    PauseHandling,
}

/// Settle request waiting for the peek animation to end
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredTarget {
    pub target: UiState,
    pub velocity: f32,
}

/// Duration of the settle animation after release
pub fn settle_duration_ms(config: &GestureConfig, velocity: f32, remaining: f32) -> u64 {
    let divisor = (0.5 * velocity).abs().max(2.0);
    let travel = remaining.abs().max(0.2);
    let duration = config.settle_base_duration_ms as f32 / divisor * travel;
    (duration as u64).max(config.settle_min_duration_ms)
}

/// Progress change per pixel of displacement (negative displacement = up)
pub fn progress_multiplier(from: UiState, to: UiState, geometry: &dyn DeviceGeometry) -> f32 {
    let mut total_shift = (to.vertical_progress(geometry) - from.vertical_progress(geometry))
        * geometry.shift_range();
    if total_shift == 0.0 {
        let direction = (from.ordinal() as f32 - to.ordinal() as f32).signum();
        total_shift = direction * geometry.default_swipe_height();
    }
    if total_shift == 0.0 {
        return 0.0;
    }
    1.0 / total_shift
}

struct SwipeState {
    phase: SwipePhase,
    from: UiState,
    to: UiState,
    animator: Option<Animator>,
    multiplier: f32,
    progress: f32,
    handling_overview: bool,
}

impl SwipeState {
    fn idle() -> Self {
        Self {
            phase: SwipePhase::Idle,
            from: UiState::Normal,
            to: UiState::Normal,
            animator: None,
            multiplier: 0.0,
            progress: 0.0,
            handling_overview: false,
        }
    }
}

struct Shared {
    manager: StateManager,
    config: TransitionConfig,
    haptics: Rc<dyn HapticSink>,
    system_ui: Rc<dyn SystemUiFlagSource>,
    scene: HomeScene,
    detector: RefCell<MotionPauseDetector>,
    pause_events: RefCell<Vec<bool>>,
    swipe: RefCell<SwipeState>,
    latch: RefCell<ShelfPeek>,
    peek_anim: RefCell<Option<Animator>>,
    deferred: Cell<Option<DeferredTarget>>,
    staggered: RefCell<Option<StaggeredWorkspaceAnim>>,
    last_completed: Cell<Option<UiState>>,
}

#[derive(Clone)]
pub struct StateSwipeController {
    shared: Rc<Shared>,
}

impl StateSwipeController {
    pub fn new(
        manager: StateManager,
        config: TransitionConfig,
        haptics: Rc<dyn HapticSink>,
        system_ui: Rc<dyn SystemUiFlagSource>,
        scene: HomeScene,
    ) -> Self {
        let detector = MotionPauseDetector::new(config.motion_pause);
        Self {
            shared: Rc::new(Shared {
                manager,
                config,
                haptics,
                system_ui,
                scene,
                detector: RefCell::new(detector),
                pause_events: RefCell::new(Vec::new()),
                swipe: RefCell::new(SwipeState::idle()),
                latch: RefCell::new(ShelfPeek::new()),
                peek_anim: RefCell::new(None),
                deferred: Cell::new(None),
                staggered: RefCell::new(None),
                last_completed: Cell::new(None),
            }),
        }
    }

    fn downgrade(&self) -> Weak<Shared> {
        Rc::downgrade(&self.shared)
    }

    fn upgrade(weak: &Weak<Shared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    pub fn phase(&self) -> SwipePhase {
        self.shared.swipe.borrow().phase
    }

    /// Progress of the live drag
    pub fn progress(&self) -> f32 {
        self.shared.swipe.borrow().progress
    }

    pub fn is_handling_overview(&self) -> bool {
        self.shared.swipe.borrow().handling_overview
    }

    pub fn is_paused(&self) -> bool {
        self.shared.detector.borrow().is_paused()
    }

    pub fn shelf_state(&self) -> ShelfState {
        self.shared.latch.borrow().state()
    }

    /// Target waiting for the peek animation to end
    pub fn pending_target(&self) -> Option<DeferredTarget> {
        self.shared.deferred.get()
    }

    /// Final state of the most recent completed swipe
    pub fn last_completed(&self) -> Option<UiState> {
        self.shared.last_completed.get()
    }

    pub fn handle_swipe_event(&self, event: SwipeEvent) -> Result<()> {
        match event {
            SwipeEvent::DragStart => self.on_drag_start(self.shared.manager.current_state()),
            SwipeEvent::Drag {
                displacement,
                timestamp_ms,
            } => self.on_drag(displacement, timestamp_ms),
            SwipeEvent::DragEnd { velocity } => self.on_drag_end(velocity),
        }
    }

    /// Per-frame hook; forces a pause when the finger stops reporting
    pub fn on_frame(&self, now_ms: u64) {
        if self.phase() != SwipePhase::Dragging {
            return;
        }
        self.shared.detector.borrow_mut().check_timeout(now_ms);
        self.drain_pause_events();
    }

    /// Start a drag in `from`
    ///
    /// A previous swipe still settling or opening the overview is finished
    /// first; the drag then starts from the state it committed.
    pub fn on_drag_start(&self, from: UiState) -> Result<()> {
        self.shared.detector.borrow_mut().clear();
        self.shared.pause_events.borrow_mut().clear();

        let from = if self.finish_pending_swipe() {
            let committed = self.shared.manager.current_state();
            if committed != from {
                tracing::debug!(requested = %from, committed = %committed, "drag starts from committed state");
            }
            committed
        } else {
            from
        };

        let staggered = self.shared.staggered.borrow_mut().take();
        if let Some(anim) = staggered {
            anim.end();
        }

        if self.phase() != SwipePhase::Idle {
            tracing::warn!(phase = ?self.phase(), "drag start while not idle, resetting");
            self.reset();
        }

        let Some(to) = from.swipe_target() else {
            tracing::debug!(state = %from, "no swipe target, ignoring drag");
            self.shared.swipe.borrow_mut().phase = SwipePhase::Ignored;
            return Ok(());
        };

        let flags = self.shared.system_ui.system_ui_flags();
        let handling_overview = from == UiState::Normal
            && !flags.contains(SystemUiFlags::OVERVIEW_DISABLED)
            && self.shared.config.features.pause_to_overview;

        let builder = if handling_overview {
            // The atomic peek owns the overview pieces, animating them here
            // would jump once the peek takes over.
            AnimatorSetBuilder::new()
                .with_components(AnimationComponents::PRIMARY)
                .with_flag(BuilderFlags::DONT_ANIMATE_OVERVIEW)
        } else {
            AnimatorSetBuilder::new()
        };

        let animator = match self.shared.manager.create_animation_to_new_state(to, builder) {
            Ok(animator) => animator,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };
        let geometry = self.shared.manager.geometry();
        let multiplier = progress_multiplier(from, to, geometry.as_ref());

        *self.shared.swipe.borrow_mut() = SwipeState {
            phase: SwipePhase::Dragging,
            from,
            to,
            animator: Some(animator),
            multiplier,
            progress: 0.0,
            handling_overview,
        };

        if handling_overview {
            let weak = self.downgrade();
            self.shared.detector.borrow_mut().set_listener(move |paused| {
                if let Some(shared) = weak.upgrade() {
                    shared.pause_events.borrow_mut().push(paused);
                }
            });
        }

        tracing::info!(from = %from, to = %to, handling_overview, "drag started");
        Ok(())
    }

    pub fn on_drag(&self, displacement: f32, timestamp_ms: u64) -> Result<()> {
        let (multiplier, animator) = {
            let mut swipe = self.shared.swipe.borrow_mut();
            let phase = swipe.phase;
            match phase {
                SwipePhase::Dragging => {}
                SwipePhase::Ignored => return Ok(()),
                SwipePhase::Idle => {
                    return Err(Error::InvalidSequence("drag without drag start"));
                }
                SwipePhase::Settling | SwipePhase::PauseHandling => {
                    return Err(Error::InvalidSequence("drag after drag end"));
                }
            }
            let progress = (displacement * swipe.multiplier).clamp(0.0, 1.0);
            swipe.progress = progress;
            (swipe.multiplier, swipe.animator.clone())
        };

        let up_displacement = -displacement;
        let max_displacement =
            self.shared.config.gesture.max_displacement_percent * self.shared.manager.geometry().height();
        {
            let mut detector = self.shared.detector.borrow_mut();
            detector.set_disallow_pause(
                up_displacement < self.shared.config.gesture.touch_slop
                    || up_displacement > max_displacement,
            );
            detector.add_position(displacement, timestamp_ms);
        }

        if let Some(animator) = animator {
            animator.set_fraction((displacement * multiplier).clamp(0.0, 1.0));
        }
        self.drain_pause_events();
        Ok(())
    }

    pub fn on_drag_end(&self, velocity: f32) -> Result<()> {
        let (from, to, progress, multiplier, handling_overview) = {
            let mut swipe = self.shared.swipe.borrow_mut();
            let phase = swipe.phase;
            match phase {
                SwipePhase::Dragging => {}
                SwipePhase::Ignored => {
                    swipe.phase = SwipePhase::Idle;
                    drop(swipe);
                    self.shared.detector.borrow_mut().clear();
                    return Ok(());
                }
                SwipePhase::Idle => {
                    return Err(Error::InvalidSequence("drag end without drag start"));
                }
                SwipePhase::Settling | SwipePhase::PauseHandling => {
                    return Err(Error::InvalidSequence("drag ended twice"));
                }
            }
            (
                swipe.from,
                swipe.to,
                swipe.progress,
                swipe.multiplier,
                swipe.handling_overview,
            )
        };

        let paused = self.shared.detector.borrow().is_paused();
        let result = if paused && handling_overview {
            self.shared.swipe.borrow_mut().phase = SwipePhase::PauseHandling;
            self.open_overview_from_pause(velocity)
        } else {
            let target = self.resolve_target(from, to, progress, multiplier, velocity);
            tracing::info!(from = %from, to = %to, progress, velocity, target = %target, "drag ended");
            self.shared.swipe.borrow_mut().phase = SwipePhase::Settling;
            self.go_to_target_state(target, velocity);
            Ok(())
        };

        self.shared.detector.borrow_mut().clear();
        self.shared.pause_events.borrow_mut().clear();
        if let Err(e) = &result {
            self.fail(e);
        }
        result
    }

    /// Default release rule: flings follow their direction, slow releases
    /// commit once past the progress threshold
    fn resolve_target(
        &self,
        from: UiState,
        to: UiState,
        progress: f32,
        multiplier: f32,
        velocity: f32,
    ) -> UiState {
        let resolution = &self.shared.config.resolution;
        if velocity.abs() >= resolution.fling_velocity_threshold {
            if velocity * multiplier > 0.0 {
                to
            } else {
                from
            }
        } else if progress >= resolution.commit_progress_threshold {
            to
        } else {
            from
        }
    }

    fn open_overview_from_pause(&self, velocity: f32) -> Result<()> {
        let manager = &self.shared.manager;
        self.shared
            .latch
            .borrow_mut()
            .set_state(ShelfState::Overview, manager)?;
        let peek = self.shared.peek_anim.borrow_mut().take();
        if let Some(peek) = peek {
            peek.cancel();
        }
        manager.cancel_animation();

        let anim = manager.create_atomic_animation(
            UiState::OverviewPeek,
            UiState::Overview,
            AnimatorSetBuilder::new(),
            PAUSE_TO_OVERVIEW_SLOT,
            self.shared.config.gesture.pause_to_overview_duration_ms,
        )?;
        let weak = self.downgrade();
        anim.add_listener(move |_| {
            if let Some(controller) = Self::upgrade(&weak) {
                controller.on_swipe_interaction_completed(UiState::Overview, velocity);
            }
        });
        tracing::info!("released while paused, opening overview");
        anim.start();
        Ok(())
    }

    /// Settle to `target`, waiting for a running peek animation first
    fn go_to_target_state(&self, target: UiState, velocity: f32) {
        let peek = self
            .shared
            .peek_anim
            .borrow()
            .as_ref()
            .filter(|anim| anim.is_started())
            .cloned();

        let Some(peek) = peek else {
            self.settle(target, velocity);
            return;
        };

        tracing::debug!(target = %target, "deferring settle until peek animation ends");
        self.shared
            .deferred
            .set(Some(DeferredTarget { target, velocity }));
        let weak = self.downgrade();
        peek.add_listener(move |_| {
            if let Some(controller) = Self::upgrade(&weak) {
                if let Some(deferred) = controller.shared.deferred.take() {
                    controller.settle(deferred.target, deferred.velocity);
                }
            }
        });
    }

    fn settle(&self, target: UiState, velocity: f32) {
        let (to, progress, animator) = {
            let swipe = self.shared.swipe.borrow();
            (swipe.to, swipe.progress, swipe.animator.clone())
        };
        let Some(animator) = animator else {
            tracing::warn!("settle without a controlled animation");
            self.reset();
            return;
        };

        let end = if target == to { 1.0 } else { 0.0 };
        let duration = settle_duration_ms(&self.shared.config.gesture, velocity, end - progress);
        let weak = self.downgrade();
        animator.add_listener(move |outcome| {
            if let Some(controller) = Self::upgrade(&weak) {
                match outcome {
                    AnimationOutcome::Finished => {
                        controller.on_swipe_interaction_completed(target, velocity)
                    }
                    AnimationOutcome::Canceled => {
                        tracing::debug!("settle animation canceled");
                        controller.reset();
                    }
                }
            }
        });
        tracing::debug!(target = %target, duration, "settling");
        animator.set_interpolator(Interpolator::Decelerate);
        animator.animate_to(end, duration);
    }

    fn on_swipe_interaction_completed(&self, target: UiState, velocity: f32) {
        let start = self.shared.swipe.borrow().from;
        self.shared.deferred.set(None);
        *self.shared.swipe.borrow_mut() = SwipeState::idle();

        let staggered = if target == UiState::Normal
            && start != UiState::Normal
            && self.shared.config.features.staggered_home
        {
            let geometry = self.shared.manager.geometry();
            Some(StaggeredWorkspaceAnim::new(
                &self.shared.manager.clock(),
                &self.shared.scene,
                velocity,
                &self.shared.config.staggered,
                geometry.as_ref(),
            ))
        } else {
            None
        };

        if let Err(e) = self.shared.manager.go_to_state(target, false) {
            self.fail(&e);
            return;
        }
        self.shared.last_completed.set(Some(target));
        tracing::info!(from = %start, to = %target, "swipe completed");

        if let Some(anim) = staggered {
            anim.start();
            *self.shared.staggered.borrow_mut() = Some(anim);
        }
    }

    /// Jump a settling or pause-to-overview swipe to its end, committing its
    /// target; returns false when no swipe was pending
    fn finish_pending_swipe(&self) -> bool {
        match self.phase() {
            SwipePhase::PauseHandling => {
                if let Ok(Some(anim)) = self.shared.manager.atomic_slot(PAUSE_TO_OVERVIEW_SLOT) {
                    anim.end();
                }
            }
            SwipePhase::Settling => {
                // A deferred settle starts once the peek animation ends
                let peek = self.shared.peek_anim.borrow().clone();
                if let Some(peek) = peek {
                    peek.end();
                }
                let animator = self.shared.swipe.borrow().animator.clone();
                if let Some(animator) = animator {
                    animator.end();
                }
            }
            SwipePhase::Idle | SwipePhase::Ignored | SwipePhase::Dragging => return false,
        }
        true
    }

    fn drain_pause_events(&self) {
        let events = std::mem::take(&mut *self.shared.pause_events.borrow_mut());
        for paused in events {
            if let Err(e) = self.on_motion_pause_changed(paused) {
                self.fail(&e);
                return;
            }
        }
    }

    fn on_motion_pause_changed(&self, paused: bool) -> Result<()> {
        if self.phase() != SwipePhase::Dragging {
            return Ok(());
        }
        let manager = &self.shared.manager;
        let (from, to, next, duration) = if paused {
            (
                UiState::Normal,
                UiState::OverviewPeek,
                ShelfState::Peek,
                self.shared.config.gesture.peek_in_duration_ms,
            )
        } else {
            (
                UiState::OverviewPeek,
                UiState::Normal,
                ShelfState::Hide,
                self.shared.config.gesture.peek_out_duration_ms,
            )
        };

        let previous = self.shared.peek_anim.borrow_mut().take();
        if let Some(previous) = previous {
            previous.cancel();
        }
        let changed = self.shared.latch.borrow_mut().set_state(next, manager)?;

        let builder = AnimatorSetBuilder::new().with_components(AnimationComponents::ATOMIC_OVERVIEW);
        let anim = manager.create_atomic_animation(from, to, builder, SHELF_SLOT, duration)?;
        let weak = self.downgrade();
        let id = anim.id();
        anim.add_listener(move |_| {
            if let Some(shared) = weak.upgrade() {
                let mut peek = shared.peek_anim.borrow_mut();
                if peek.as_ref().is_some_and(|a| a.id() == id) {
                    *peek = None;
                }
            }
        });
        *self.shared.peek_anim.borrow_mut() = Some(anim.clone());
        anim.start();

        if changed && next.should_perform_haptic() && self.shared.config.features.haptics {
            self.shared.haptics.vibrate(HapticCue::OverviewPeek);
        }
        Ok(())
    }

    fn reset(&self) {
        let animator = {
            let mut swipe = self.shared.swipe.borrow_mut();
            let animator = swipe.animator.take();
            *swipe = SwipeState::idle();
            animator
        };
        if let Some(animator) = animator {
            animator.cancel();
        }
        let peek = self.shared.peek_anim.borrow_mut().take();
        if let Some(peek) = peek {
            peek.cancel();
        }
        self.shared.deferred.set(None);
    }

    fn fail(&self, error: &Error) {
        tracing::error!("Swipe transition failed: {}", error);
        self.reset();
        if let Ok(mut detector) = self.shared.detector.try_borrow_mut() {
            detector.clear();
        }
        self.shared.manager.snap_to_normal();
    }
}
