//! Transition manager
//!
//! Owns the current UI state, at most one primary transition session and a
//! fixed array of atomic slots. Handlers are applied with the manager's
//! borrow released, and animations are started, canceled and ended outside
//! any borrow, so completion listeners may call straight back in.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;

use super::handler::{AnimationConfig, StateHandler};
use crate::anim::{
    AnimatedSetter, AnimationOutcome, Animator, AnimatorSetBuilder, FrameClock, ImmediateSetter,
    PropertySetter,
};
use crate::error::{Error, Result};
use crate::state::{DeviceGeometry, UiState};

pub const ATOMIC_SLOT_COUNT: usize = 4;

pub const SHELF_SLOT: usize = 0;
pub const RECENTS_FADE_SLOT: usize = 1;
pub const RECENTS_TRANSLATE_X_SLOT: usize = 2;
pub const PAUSE_TO_OVERVIEW_SLOT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Played by the frame clock to completion
    Committed,
    /// Progress scrubbed by a gesture
    UserControlled,
}

/// The live primary transition
#[derive(Debug, Clone)]
pub struct TransitionSession {
    pub id: u64,
    pub from: UiState,
    pub to: UiState,
    pub kind: SessionKind,
    pub animator: Animator,
}

impl TransitionSession {
    pub fn progress(&self) -> f32 {
        self.animator.fraction().clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
struct AtomicSlot {
    from: UiState,
    to: UiState,
    animator: Animator,
}

/// Notifications delivered to state listeners
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StateEvent {
    TransitionStarted {
        from: UiState,
        to: UiState,
        duration_ms: u64,
        kind: SessionKind,
    },
    TransitionCompleted {
        from: UiState,
        to: UiState,
        kind: SessionKind,
        canceled: bool,
    },
    /// State applied without animation
    StateApplied { state: UiState },
    AtomicAnimationCreated {
        slot: usize,
        from: UiState,
        to: UiState,
    },
    AtomicAnimationCanceled { slot: usize },
}

type StateListener = Rc<dyn Fn(&StateEvent)>;

struct ManagerState {
    clock: FrameClock,
    geometry: Rc<dyn DeviceGeometry>,
    handlers: Vec<Box<dyn StateHandler>>,
    current: UiState,
    session: Option<TransitionSession>,
    slots: [Option<AtomicSlot>; ATOMIC_SLOT_COUNT],
    listeners: Vec<StateListener>,
    next_session_id: u64,
}

/// Default duration of a committed transition between two states
pub fn default_duration_ms(from: UiState, to: UiState) -> u64 {
    if to == UiState::Normal {
        from.transition_duration_ms()
    } else {
        to.transition_duration_ms()
    }
}

fn check_slot(slot: usize) -> Result<()> {
    if slot >= ATOMIC_SLOT_COUNT {
        return Err(Error::SlotOutOfRange {
            index: slot,
            count: ATOMIC_SLOT_COUNT,
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct StateManager {
    inner: Rc<RefCell<ManagerState>>,
}

impl StateManager {
    pub fn new(clock: FrameClock, geometry: Rc<dyn DeviceGeometry>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ManagerState {
                clock,
                geometry,
                handlers: Vec::new(),
                current: UiState::Normal,
                session: None,
                slots: Default::default(),
                listeners: Vec::new(),
                next_session_id: 1,
            })),
        }
    }

    fn downgrade(&self) -> Weak<RefCell<ManagerState>> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<RefCell<ManagerState>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn add_handler(&self, handler: Box<dyn StateHandler>) {
        self.inner.borrow_mut().handlers.push(handler);
    }

    pub fn add_state_listener(&self, listener: impl Fn(&StateEvent) + 'static) {
        self.inner.borrow_mut().listeners.push(Rc::new(listener));
    }

    pub fn clock(&self) -> FrameClock {
        self.inner.borrow().clock.clone()
    }

    pub fn geometry(&self) -> Rc<dyn DeviceGeometry> {
        self.inner.borrow().geometry.clone()
    }

    pub fn current_state(&self) -> UiState {
        self.inner.borrow().current
    }

    /// Destination of the live transition, or the current state
    pub fn target_state(&self) -> UiState {
        let inner = self.inner.borrow();
        inner.session.as_ref().map_or(inner.current, |s| s.to)
    }

    pub fn session(&self) -> Option<TransitionSession> {
        self.inner.borrow().session.clone()
    }

    /// Progress of the live transition, 0.0 when idle
    pub fn progress(&self) -> f32 {
        self.inner
            .borrow()
            .session
            .as_ref()
            .map_or(0.0, TransitionSession::progress)
    }

    pub fn is_in_transition(&self) -> bool {
        self.inner.borrow().session.is_some()
    }

    pub fn go_to_state(&self, target: UiState, animated: bool) -> Result<()> {
        self.go_to_state_with(target, animated, None, |_| {})
    }

    /// Move every handler from the current state to `target`
    ///
    /// An in-flight committed transition is canceled first and its progress
    /// carries over, whatever its target: only the remaining part of the
    /// duration is played and tweens start from live values.
    pub fn go_to_state_with(
        &self,
        target: UiState,
        animated: bool,
        duration_ms: Option<u64>,
        on_complete: impl FnOnce(AnimationOutcome) + 'static,
    ) -> Result<()> {
        let (current, in_flight) = {
            let inner = self.inner.borrow();
            (inner.current, inner.session.clone())
        };

        if animated && target == current && in_flight.is_none() {
            tracing::trace!(state = %target, "already in requested state");
            on_complete(AnimationOutcome::Finished);
            return Ok(());
        }

        let from = in_flight.as_ref().map_or(current, |s| s.to);
        let start_progress = match &in_flight {
            Some(s) if s.kind == SessionKind::Committed => s.progress(),
            _ => 0.0,
        };
        if let Some(session) = in_flight {
            session.animator.cancel();
        }
        self.cancel_all_state_element_animations();

        if !animated {
            self.apply_handlers(target, &AnimationConfig::immediate(), &mut ImmediateSetter)?;
            self.inner.borrow_mut().current = target;
            tracing::info!(from = %from, to = %target, "state applied");
            self.emit(StateEvent::StateApplied { state: target });
            on_complete(AnimationOutcome::Finished);
            return Ok(());
        }

        let full = duration_ms.unwrap_or_else(|| default_duration_ms(from, target));
        let duration = (full as f32 * (1.0 - start_progress)).round() as u64;
        let config = AnimationConfig::from_builder(&AnimatorSetBuilder::new(), duration);
        let mut setter = AnimatedSetter::new();
        self.apply_handlers(target, &config, &mut setter)?;

        let animator = setter.build(&self.clock(), duration, start_progress);
        let id = self.install_session(from, target, SessionKind::Committed, animator.clone());

        let weak = self.downgrade();
        animator.add_listener(move |outcome| {
            if let Some(manager) = Self::upgrade(&weak) {
                manager.on_session_end(id, outcome);
            }
            on_complete(outcome);
        });

        tracing::info!(from = %from, to = %target, duration, start_progress, "transition started");
        self.emit(StateEvent::TransitionStarted {
            from,
            to: target,
            duration_ms: duration,
            kind: SessionKind::Committed,
        });
        animator.start();
        Ok(())
    }

    /// Build a user-controlled session toward `to`
    ///
    /// The returned animator is not started; the caller scrubs it with
    /// `set_fraction` and finally plays it to 0.0 or 1.0.
    pub fn create_animation_to_new_state(
        &self,
        to: UiState,
        builder: AnimatorSetBuilder,
    ) -> Result<Animator> {
        let (from, in_flight) = {
            let inner = self.inner.borrow();
            (inner.current, inner.session.clone())
        };
        if let Some(session) = in_flight {
            session.animator.cancel();
        }
        self.cancel_all_state_element_animations();

        let duration = default_duration_ms(from, to);
        let mut config = AnimationConfig::from_builder(&builder, duration);
        config.user_controlled = true;
        let mut setter = AnimatedSetter::new();
        self.apply_handlers(to, &config, &mut setter)?;

        let animator = setter.build(&self.clock(), duration, 0.0);
        let id = self.install_session(from, to, SessionKind::UserControlled, animator.clone());
        let weak = self.downgrade();
        animator.add_listener(move |outcome| {
            if let Some(manager) = Self::upgrade(&weak) {
                manager.on_session_end(id, outcome);
            }
        });

        tracing::debug!(from = %from, to = %to, "user controlled transition created");
        self.emit(StateEvent::TransitionStarted {
            from,
            to,
            duration_ms: duration,
            kind: SessionKind::UserControlled,
        });
        Ok(animator)
    }

    /// Build a sub-animation owned by atomic slot `slot`
    ///
    /// Any previous occupant of the slot is canceled (its listeners run)
    /// before the new animation is built. The animation is not started.
    pub fn create_atomic_animation(
        &self,
        from: UiState,
        to: UiState,
        builder: AnimatorSetBuilder,
        slot: usize,
        duration_ms: u64,
    ) -> Result<Animator> {
        check_slot(slot)?;
        self.cancel_state_element_animation(slot)?;

        let config = AnimationConfig::from_builder(&builder, duration_ms);
        let mut setter = AnimatedSetter::new();
        self.apply_handlers(to, &config, &mut setter)?;
        let animator = setter.build(&self.clock(), duration_ms, 0.0);

        self.inner.borrow_mut().slots[slot] = Some(AtomicSlot {
            from,
            to,
            animator: animator.clone(),
        });
        let weak = self.downgrade();
        let id = animator.id();
        animator.add_listener(move |_| {
            if let Some(manager) = Self::upgrade(&weak) {
                let mut inner = manager.inner.borrow_mut();
                if inner.slots[slot]
                    .as_ref()
                    .is_some_and(|occupant| occupant.animator.id() == id)
                {
                    inner.slots[slot] = None;
                }
            }
        });

        tracing::debug!(slot, from = %from, to = %to, duration_ms, "atomic animation created");
        self.emit(StateEvent::AtomicAnimationCreated { slot, from, to });
        Ok(animator)
    }

    /// Cancel and clear atomic slot `slot`; a no-op when the slot is empty
    pub fn cancel_state_element_animation(&self, slot: usize) -> Result<()> {
        check_slot(slot)?;
        let occupant = self.inner.borrow_mut().slots[slot].take();
        if let Some(occupant) = occupant {
            if !occupant.animator.has_ended() {
                tracing::debug!(
                    slot,
                    from = %occupant.from,
                    to = %occupant.to,
                    "canceling atomic animation"
                );
                occupant.animator.cancel();
                self.emit(StateEvent::AtomicAnimationCanceled { slot });
            }
        }
        Ok(())
    }

    pub fn cancel_all_state_element_animations(&self) {
        for slot in 0..ATOMIC_SLOT_COUNT {
            let occupant = self.inner.borrow_mut().slots[slot].take();
            if let Some(occupant) = occupant {
                if !occupant.animator.has_ended() {
                    occupant.animator.cancel();
                    self.emit(StateEvent::AtomicAnimationCanceled { slot });
                }
            }
        }
    }

    /// Current occupant of an atomic slot
    pub fn atomic_slot(&self, slot: usize) -> Result<Option<Animator>> {
        check_slot(slot)?;
        Ok(self.inner.borrow().slots[slot]
            .as_ref()
            .map(|occupant| occupant.animator.clone()))
    }

    /// Re-apply the current state's end values (after a layout change)
    pub fn reapply_state(&self) -> Result<()> {
        let current = {
            let inner = self.inner.borrow();
            if inner.session.is_some() {
                tracing::debug!("reapply skipped, transition in flight");
                return Ok(());
            }
            inner.current
        };
        self.apply_handlers(current, &AnimationConfig::immediate(), &mut ImmediateSetter)
    }

    /// Cancel the primary session, leaving properties where they are
    pub fn cancel_animation(&self) {
        let session = self.inner.borrow().session.clone();
        if let Some(session) = session {
            session.animator.cancel();
        }
    }

    /// Jump to Normal without animation after an unrecoverable fault
    pub fn snap_to_normal(&self) {
        tracing::warn!(from = %self.current_state(), "snapping to normal");
        self.cancel_animation();
        self.cancel_all_state_element_animations();
        if let Err(e) =
            self.apply_handlers(UiState::Normal, &AnimationConfig::immediate(), &mut ImmediateSetter)
        {
            tracing::error!("Failed to apply normal state: {}", e);
        }
        self.inner.borrow_mut().current = UiState::Normal;
        self.emit(StateEvent::StateApplied {
            state: UiState::Normal,
        });
    }

    fn install_session(
        &self,
        from: UiState,
        to: UiState,
        kind: SessionKind,
        animator: Animator,
    ) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_session_id;
        inner.next_session_id += 1;
        inner.session = Some(TransitionSession {
            id,
            from,
            to,
            kind,
            animator,
        });
        id
    }

    fn on_session_end(&self, id: u64, outcome: AnimationOutcome) {
        let ended = {
            let mut inner = self.inner.borrow_mut();
            match inner.session.take() {
                Some(session) if session.id == id => {
                    if outcome == AnimationOutcome::Finished
                        && session.kind == SessionKind::Committed
                    {
                        inner.current = session.to;
                    }
                    session
                }
                other => {
                    inner.session = other;
                    return;
                }
            }
        };

        tracing::debug!(
            from = %ended.from,
            to = %ended.to,
            ?outcome,
            current = %self.current_state(),
            "transition ended"
        );
        self.emit(StateEvent::TransitionCompleted {
            from: ended.from,
            to: ended.to,
            kind: ended.kind,
            canceled: outcome == AnimationOutcome::Canceled,
        });
    }

    fn apply_handlers(
        &self,
        state: UiState,
        config: &AnimationConfig,
        setter: &mut dyn PropertySetter,
    ) -> Result<()> {
        let (mut handlers, geometry) = {
            let mut inner = self.inner.borrow_mut();
            (std::mem::take(&mut inner.handlers), inner.geometry.clone())
        };

        let mut result = Ok(());
        for handler in handlers.iter_mut() {
            if let Err(e) = handler.apply(state, geometry.as_ref(), config, setter) {
                tracing::error!(handler = handler.name(), state = %state, "handler failed: {}", e);
                result = Err(e);
                break;
            }
        }

        let mut inner = self.inner.borrow_mut();
        handlers.append(&mut inner.handlers);
        inner.handlers = handlers;
        result
    }

    fn emit(&self, event: StateEvent) {
        let listeners = self.inner.borrow().listeners.clone();
        for listener in listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::{AnimationComponents, FloatProperty, Interpolator};
    use crate::state::FixedGeometry;
    use std::cell::Cell;

    struct ScaleHandler {
        scale: FloatProperty,
        overview: FloatProperty,
        applied: Rc<Cell<u32>>,
    }

    impl StateHandler for ScaleHandler {
        fn name(&self) -> &'static str {
            "scale"
        }

        fn apply(
            &mut self,
            state: UiState,
            _geometry: &dyn DeviceGeometry,
            config: &AnimationConfig,
            setter: &mut dyn PropertySetter,
        ) -> Result<()> {
            self.applied.set(self.applied.get() + 1);
            if config.has_component(AnimationComponents::PRIMARY) {
                setter.set_float(&self.scale, state.workspace_scale(), Interpolator::Linear);
            }
            if config.has_component(AnimationComponents::ATOMIC_OVERVIEW) {
                setter.set_float(&self.overview, state.scrim_alpha(), Interpolator::Linear);
            }
            Ok(())
        }
    }

    struct FailingHandler;

    impl StateHandler for FailingHandler {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn apply(
            &mut self,
            _state: UiState,
            _geometry: &dyn DeviceGeometry,
            _config: &AnimationConfig,
            _setter: &mut dyn PropertySetter,
        ) -> Result<()> {
            Err(Error::Handler {
                handler: "failing",
                reason: "no view".into(),
            })
        }
    }

    struct Fixture {
        clock: FrameClock,
        manager: StateManager,
        scale: FloatProperty,
        overview: FloatProperty,
        applied: Rc<Cell<u32>>,
        events: Rc<RefCell<Vec<StateEvent>>>,
    }

    fn fixture() -> Fixture {
        let clock = FrameClock::new();
        let manager = StateManager::new(clock.clone(), Rc::new(FixedGeometry::default()));
        let scale = FloatProperty::new("scale", 1.0);
        let overview = FloatProperty::new("overview", 0.0);
        let applied = Rc::new(Cell::new(0));
        manager.add_handler(Box::new(ScaleHandler {
            scale: scale.clone(),
            overview: overview.clone(),
            applied: applied.clone(),
        }));
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        manager.add_state_listener(move |e| sink.borrow_mut().push(e.clone()));
        Fixture {
            clock,
            manager,
            scale,
            overview,
            applied,
            events,
        }
    }

    #[test]
    fn test_go_to_state_immediate() {
        let f = fixture();
        f.manager.go_to_state(UiState::Overview, false).unwrap();
        assert_eq!(f.manager.current_state(), UiState::Overview);
        assert_eq!(f.scale.get(), UiState::Overview.workspace_scale());
        assert!(!f.manager.is_in_transition());
    }

    #[test]
    fn test_go_to_state_animated() {
        let f = fixture();
        let done = Rc::new(Cell::new(None));
        let result = done.clone();
        f.manager
            .go_to_state_with(UiState::Overview, true, None, move |o| result.set(Some(o)))
            .unwrap();
        assert_eq!(f.manager.current_state(), UiState::Normal);
        assert_eq!(f.manager.target_state(), UiState::Overview);

        f.clock.run_for(300);
        assert_eq!(done.get(), Some(AnimationOutcome::Finished));
        assert_eq!(f.manager.current_state(), UiState::Overview);
        assert_eq!(f.scale.get(), UiState::Overview.workspace_scale());
    }

    #[test]
    fn test_zero_duration_is_synchronous() {
        let f = fixture();
        f.manager
            .go_to_state_with(UiState::Overview, true, Some(0), |_| {})
            .unwrap();
        assert_eq!(f.manager.current_state(), UiState::Overview);
    }

    #[test]
    fn test_same_state_completes_synchronously() {
        let f = fixture();
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        f.manager
            .go_to_state_with(UiState::Normal, true, None, move |_| flag.set(true))
            .unwrap();
        assert!(done.get());
        assert_eq!(f.applied.get(), 0);
    }

    #[test]
    fn test_default_duration() {
        assert_eq!(default_duration_ms(UiState::Overview, UiState::Normal), 250);
        assert_eq!(default_duration_ms(UiState::Normal, UiState::SpringLoaded), 150);
        assert_eq!(default_duration_ms(UiState::Overview, UiState::BackgroundApp), 250);
    }

    #[test]
    fn test_interrupted_transition_carries_progress() {
        let f = fixture();
        let first = Rc::new(Cell::new(None));
        let first_result = first.clone();
        f.manager
            .go_to_state_with(UiState::Overview, true, Some(200), move |o| {
                first_result.set(Some(o))
            })
            .unwrap();
        f.clock.advance(100);
        let mid = f.manager.progress();
        assert!((mid - 0.5).abs() < 1e-3);

        f.manager
            .go_to_state_with(UiState::Overview, true, Some(200), |_| {})
            .unwrap();
        assert_eq!(first.get(), Some(AnimationOutcome::Canceled));
        let session = f.manager.session().unwrap();
        assert!((session.progress() - mid).abs() < 1e-3);
        assert_eq!(session.animator.duration_ms(), 100);

        f.clock.run_for(100);
        assert_eq!(f.manager.current_state(), UiState::Overview);
    }

    #[test]
    fn test_retarget_carries_progress() {
        let f = fixture();
        f.manager
            .go_to_state_with(UiState::Overview, true, Some(200), |_| {})
            .unwrap();
        f.clock.advance(100);
        let mid = f.manager.progress();
        assert!((mid - 0.5).abs() < 1e-3);
        let live_scale = f.scale.get();

        f.manager
            .go_to_state_with(UiState::BackgroundApp, true, Some(200), |_| {})
            .unwrap();
        let session = f.manager.session().unwrap();
        assert_eq!(session.to, UiState::BackgroundApp);
        assert!((session.progress() - mid).abs() < 1e-3);
        assert_eq!(session.animator.duration_ms(), 100);
        // No jump: the new tweens start where the first one left off
        assert_eq!(f.scale.get(), live_scale);

        f.clock.run_for(100);
        assert_eq!(f.manager.current_state(), UiState::BackgroundApp);
        assert_eq!(f.scale.get(), UiState::BackgroundApp.workspace_scale());
    }

    #[test]
    fn test_immediate_same_state_reapplies() {
        let f = fixture();
        f.scale.set(0.5);
        f.manager.go_to_state(UiState::Normal, false).unwrap();
        assert_eq!(f.scale.get(), UiState::Normal.workspace_scale());
        assert_eq!(f.applied.get(), 1);
        assert_eq!(
            f.events.borrow().last(),
            Some(&StateEvent::StateApplied {
                state: UiState::Normal
            })
        );
    }

    #[test]
    fn test_reapply_idempotent() {
        let f = fixture();
        f.manager.go_to_state(UiState::SpringLoaded, false).unwrap();
        f.manager.reapply_state().unwrap();
        let once = (f.scale.get(), f.overview.get());
        f.manager.reapply_state().unwrap();
        assert_eq!((f.scale.get(), f.overview.get()), once);
        assert_eq!(f.manager.current_state(), UiState::SpringLoaded);
    }

    #[test]
    fn test_reapply_skipped_during_transition() {
        let f = fixture();
        f.manager.go_to_state(UiState::Overview, true).unwrap();
        let before = f.applied.get();
        f.manager.reapply_state().unwrap();
        assert_eq!(f.applied.get(), before);
    }

    #[test]
    fn test_atomic_slot_replacement() {
        let f = fixture();
        let builder = AnimatorSetBuilder::new().with_components(AnimationComponents::ATOMIC_OVERVIEW);
        let first = f
            .manager
            .create_atomic_animation(UiState::Normal, UiState::OverviewPeek, builder, SHELF_SLOT, 200)
            .unwrap();
        first.start();
        let second = f
            .manager
            .create_atomic_animation(UiState::OverviewPeek, UiState::Normal, builder, SHELF_SLOT, 100)
            .unwrap();
        assert_eq!(first.outcome(), Some(AnimationOutcome::Canceled));
        assert_eq!(
            f.manager.atomic_slot(SHELF_SLOT).unwrap().map(|a| a.id()),
            Some(second.id())
        );
        // Atomic builds only touch the selected components
        assert_eq!(f.scale.get(), 1.0);
    }

    #[test]
    fn test_cancel_slot_twice() {
        let f = fixture();
        let anim = f
            .manager
            .create_atomic_animation(
                UiState::Normal,
                UiState::OverviewPeek,
                AnimatorSetBuilder::new(),
                SHELF_SLOT,
                200,
            )
            .unwrap();
        anim.start();
        f.manager.cancel_state_element_animation(SHELF_SLOT).unwrap();
        f.manager.cancel_state_element_animation(SHELF_SLOT).unwrap();
        let cancels = f
            .events
            .borrow()
            .iter()
            .filter(|e| matches!(e, StateEvent::AtomicAnimationCanceled { .. }))
            .count();
        assert_eq!(cancels, 1);
        assert!(f.manager.atomic_slot(SHELF_SLOT).unwrap().is_none());
    }

    #[test]
    fn test_slot_out_of_range() {
        let f = fixture();
        assert!(matches!(
            f.manager.cancel_state_element_animation(ATOMIC_SLOT_COUNT),
            Err(Error::SlotOutOfRange { index: 4, count: 4 })
        ));
    }

    #[test]
    fn test_slot_cleared_on_finish() {
        let f = fixture();
        let anim = f
            .manager
            .create_atomic_animation(
                UiState::Normal,
                UiState::OverviewPeek,
                AnimatorSetBuilder::new(),
                PAUSE_TO_OVERVIEW_SLOT,
                50,
            )
            .unwrap();
        anim.start();
        f.clock.run_for(64);
        assert!(f.manager.atomic_slot(PAUSE_TO_OVERVIEW_SLOT).unwrap().is_none());
    }

    #[test]
    fn test_user_controlled_session() {
        let f = fixture();
        let anim = f
            .manager
            .create_animation_to_new_state(UiState::BackgroundApp, AnimatorSetBuilder::new())
            .unwrap();
        anim.set_fraction(0.5);
        let expected = 1.0 + (UiState::BackgroundApp.workspace_scale() - 1.0) * 0.5;
        assert!((f.scale.get() - expected).abs() < 1e-5);
        anim.animate_to(1.0, 100);
        f.clock.run_for(100);
        // User controlled sessions leave the current state to the caller
        assert_eq!(f.manager.current_state(), UiState::Normal);
        assert!(!f.manager.is_in_transition());
    }

    #[test]
    fn test_handler_error_propagates() {
        let f = fixture();
        f.manager.add_handler(Box::new(FailingHandler));
        let err = f.manager.go_to_state(UiState::Overview, false).unwrap_err();
        assert!(matches!(err, Error::Handler { handler: "failing", .. }));
        assert_eq!(f.manager.current_state(), UiState::Normal);

        f.manager.snap_to_normal();
        assert_eq!(f.manager.current_state(), UiState::Normal);
    }

    #[test]
    fn test_listener_reenters_manager() {
        let f = fixture();
        let manager = f.manager.clone();
        f.manager
            .go_to_state_with(UiState::Overview, true, None, move |_| {
                manager.go_to_state(UiState::Normal, false).unwrap();
            })
            .unwrap();
        f.clock.run_for(300);
        assert_eq!(f.manager.current_state(), UiState::Normal);
    }
}
