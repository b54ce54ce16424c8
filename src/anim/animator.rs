//! Frame clock and animator handles
//!
//! All animation runs on one logical thread. An [`Animator`] is a cheap,
//! clonable handle; it is re-evaluated once per [`FrameClock::tick`] while it
//! runs. Completion listeners form a one-shot queue: each fires exactly once
//! with the outcome, whether the animation finished or was canceled.
//!
//! Borrows are never held while user callbacks run, so listeners may start,
//! cancel or query any animation, including the one that just ended.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::interpolator::Interpolator;

/// Frame interval used when stepping the clock in fixed increments
pub const FRAME_INTERVAL_MS: u64 = 16;

pub type AnimationId = u64;

static NEXT_ANIMATION_ID: AtomicU64 = AtomicU64::new(1);

/// How an animation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    Finished,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Playback {
    /// Created, possibly scrubbed, never started
    Idle,
    Running {
        start_ms: u64,
        from: f32,
        to: f32,
        duration_ms: u64,
    },
    Ended(AnimationOutcome),
}

type UpdateFn = Box<dyn FnMut(f32)>;
type EndListener = Box<dyn FnOnce(AnimationOutcome)>;

struct AnimatorState {
    duration_ms: u64,
    start_delay_ms: u64,
    interpolator: Interpolator,
    fraction: f32,
    playback: Playback,
    updates: Vec<UpdateFn>,
    listeners: Vec<EndListener>,
}

/// Handle to a single animation
#[derive(Clone)]
pub struct Animator {
    id: AnimationId,
    state: Rc<RefCell<AnimatorState>>,
    clock: FrameClock,
}

impl Animator {
    pub fn new(clock: &FrameClock, duration_ms: u64) -> Self {
        Self {
            id: NEXT_ANIMATION_ID.fetch_add(1, Ordering::Relaxed),
            state: Rc::new(RefCell::new(AnimatorState {
                duration_ms,
                start_delay_ms: 0,
                interpolator: Interpolator::default(),
                fraction: 0.0,
                playback: Playback::Idle,
                updates: Vec::new(),
                listeners: Vec::new(),
            })),
            clock: clock.clone(),
        }
    }

    pub fn with_interpolator(self, interpolator: Interpolator) -> Self {
        self.state.borrow_mut().interpolator = interpolator;
        self
    }

    pub fn with_start_delay(self, delay_ms: u64) -> Self {
        self.state.borrow_mut().start_delay_ms = delay_ms;
        self
    }

    pub fn id(&self) -> AnimationId {
        self.id
    }

    pub fn duration_ms(&self) -> u64 {
        self.state.borrow().duration_ms
    }

    pub fn set_duration(&self, duration_ms: u64) {
        self.state.borrow_mut().duration_ms = duration_ms;
    }

    pub fn set_interpolator(&self, interpolator: Interpolator) {
        self.state.borrow_mut().interpolator = interpolator;
    }

    /// Register a callback receiving the animated fraction on every frame
    pub fn on_update(&self, update: impl FnMut(f32) + 'static) {
        self.state.borrow_mut().updates.push(Box::new(update));
    }

    /// Queue a one-shot completion listener
    ///
    /// Listeners added after the animation ended run immediately with the
    /// recorded outcome.
    pub fn add_listener(&self, listener: impl FnOnce(AnimationOutcome) + 'static) {
        let ended = {
            let mut state = self.state.borrow_mut();
            match state.playback {
                Playback::Ended(outcome) => Some(outcome),
                _ => {
                    state.listeners.push(Box::new(listener));
                    return;
                }
            }
        };
        if let Some(outcome) = ended {
            listener(outcome);
        }
    }

    /// Current animated fraction (may leave [0,1] with overshooting curves)
    pub fn fraction(&self) -> f32 {
        self.state.borrow().fraction
    }

    /// True from `start()` until the animation ends, including any start delay
    pub fn is_started(&self) -> bool {
        matches!(self.state.borrow().playback, Playback::Running { .. })
    }

    /// True once the start delay has elapsed and frames are being produced
    pub fn is_running(&self) -> bool {
        let state = self.state.borrow();
        match state.playback {
            Playback::Running { start_ms, .. } => {
                self.clock.now() >= start_ms + state.start_delay_ms
            }
            _ => false,
        }
    }

    pub fn has_ended(&self) -> bool {
        matches!(self.state.borrow().playback, Playback::Ended(_))
    }

    pub fn outcome(&self) -> Option<AnimationOutcome> {
        match self.state.borrow().playback {
            Playback::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Scrub to a fraction without playing (user-controlled animations)
    pub fn set_fraction(&self, fraction: f32) {
        {
            let mut state = self.state.borrow_mut();
            if state.playback != Playback::Idle {
                tracing::trace!(id = self.id, "set_fraction ignored, animation already playing");
                return;
            }
            state.fraction = fraction;
        }
        self.apply_updates(fraction);
    }

    /// Play from the current fraction to 1.0
    pub fn start(&self) {
        let duration_ms = self.duration_ms();
        self.play(1.0, duration_ms);
    }

    /// Play from the current fraction to `to` over `duration_ms`
    ///
    /// A running animation is re-targeted from wherever it currently is.
    pub fn animate_to(&self, to: f32, duration_ms: u64) {
        self.state.borrow_mut().duration_ms = duration_ms;
        self.play(to, duration_ms);
    }

    fn play(&self, to: f32, duration_ms: u64) {
        let immediate = {
            let mut state = self.state.borrow_mut();
            if let Playback::Ended(_) = state.playback {
                tracing::debug!(id = self.id, "start ignored, animation already ended");
                return;
            }
            state.playback = Playback::Running {
                start_ms: self.clock.now(),
                from: state.fraction,
                to,
                duration_ms,
            };
            duration_ms == 0 && state.start_delay_ms == 0
        };

        if immediate {
            self.state.borrow_mut().fraction = to;
            self.apply_updates(to);
            self.finish(AnimationOutcome::Finished);
        } else {
            self.clock.register(self);
        }
    }

    /// Cancel the animation, leaving properties where they are
    ///
    /// Safe to call on an ended animation (no-op).
    pub fn cancel(&self) {
        self.finish(AnimationOutcome::Canceled);
    }

    /// Jump to the end value and finish
    pub fn end(&self) {
        let target = {
            let state = self.state.borrow();
            match state.playback {
                Playback::Ended(_) => return,
                Playback::Running { to, .. } => to,
                Playback::Idle => 1.0,
            }
        };
        self.state.borrow_mut().fraction = target;
        self.apply_updates(target);
        self.finish(AnimationOutcome::Finished);
    }

    /// Advance to `now_ms`, returns false once the animation has ended
    pub(crate) fn do_frame(&self, now_ms: u64) -> bool {
        let (fraction, done) = {
            let mut state = self.state.borrow_mut();
            let Playback::Running {
                start_ms,
                from,
                to,
                duration_ms,
            } = state.playback
            else {
                return !matches!(state.playback, Playback::Ended(_));
            };
            let begin = start_ms + state.start_delay_ms;
            if now_ms < begin {
                return true;
            }
            let t = if duration_ms == 0 {
                1.0
            } else {
                (now_ms - begin) as f32 / duration_ms as f32
            };
            let (fraction, done) = if t >= 1.0 {
                (to, true)
            } else {
                (from + (to - from) * state.interpolator.interpolate(t), false)
            };
            state.fraction = fraction;
            (fraction, done)
        };

        self.apply_updates(fraction);
        if done {
            self.finish(AnimationOutcome::Finished);
        }
        !done
    }

    fn apply_updates(&self, fraction: f32) {
        let mut updates = std::mem::take(&mut self.state.borrow_mut().updates);
        for update in updates.iter_mut() {
            update(fraction);
        }
        let mut state = self.state.borrow_mut();
        updates.append(&mut state.updates);
        state.updates = updates;
    }

    fn finish(&self, outcome: AnimationOutcome) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            if let Playback::Ended(_) = state.playback {
                return;
            }
            state.playback = Playback::Ended(outcome);
            std::mem::take(&mut state.listeners)
        };
        self.clock.unregister(self.id);
        tracing::trace!(id = self.id, ?outcome, "animation ended");
        for listener in listeners {
            listener(outcome);
        }
    }
}

impl fmt::Debug for Animator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Animator")
            .field("id", &self.id)
            .field("fraction", &state.fraction)
            .field("playback", &state.playback)
            .finish()
    }
}

struct ClockState {
    now_ms: u64,
    running: Vec<Animator>,
}

/// Periodic frame clock driving every running animation
#[derive(Clone)]
pub struct FrameClock {
    inner: Rc<RefCell<ClockState>>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ClockState {
                now_ms: 0,
                running: Vec::new(),
            })),
        }
    }

    /// Time of the current frame
    pub fn now(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    /// Produce a frame at `now_ms`; time never moves backwards
    pub fn tick(&self, now_ms: u64) {
        let snapshot = {
            let mut clock = self.inner.borrow_mut();
            clock.now_ms = clock.now_ms.max(now_ms);
            clock.running.clone()
        };
        let now = self.now();
        for animator in snapshot {
            animator.do_frame(now);
        }
        self.inner
            .borrow_mut()
            .running
            .retain(|animator| !animator.has_ended());
    }

    pub fn advance(&self, delta_ms: u64) {
        let now = self.now();
        self.tick(now + delta_ms);
    }

    /// Step the clock in frame-sized increments
    pub fn run_for(&self, duration_ms: u64) {
        let end = self.now() + duration_ms;
        while self.now() < end {
            let next = (self.now() + FRAME_INTERVAL_MS).min(end);
            self.tick(next);
        }
    }

    pub fn has_running_animations(&self) -> bool {
        !self.inner.borrow().running.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.inner.borrow().running.len()
    }

    fn register(&self, animator: &Animator) {
        let mut clock = self.inner.borrow_mut();
        if !clock.running.iter().any(|a| a.id == animator.id) {
            clock.running.push(animator.clone());
        }
    }

    fn unregister(&self, id: AnimationId) {
        // The clock may be mid-tick holding a snapshot; that borrow is released
        // before animators run, so this never conflicts.
        self.inner.borrow_mut().running.retain(|a| a.id != id);
    }
}

impl fmt::Debug for FrameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self.inner.borrow();
        f.debug_struct("FrameClock")
            .field("now_ms", &clock.now_ms)
            .field("running", &clock.running.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_runs_to_completion() {
        let clock = FrameClock::new();
        let anim = Animator::new(&clock, 100).with_interpolator(Interpolator::Linear);
        let last = Rc::new(Cell::new(-1.0_f32));
        let seen = last.clone();
        anim.on_update(move |f| seen.set(f));
        anim.start();
        assert!(anim.is_started());

        clock.advance(50);
        assert!((last.get() - 0.5).abs() < 1e-5);

        clock.advance(60);
        assert_eq!(last.get(), 1.0);
        assert_eq!(anim.outcome(), Some(AnimationOutcome::Finished));
        assert!(!clock.has_running_animations());
    }

    #[test]
    fn test_cancel_fires_once() {
        let clock = FrameClock::new();
        let anim = Animator::new(&clock, 100);
        let fired = Rc::new(Cell::new(0));
        let count = fired.clone();
        anim.add_listener(move |outcome| {
            assert_eq!(outcome, AnimationOutcome::Canceled);
            count.set(count.get() + 1);
        });
        anim.start();
        anim.cancel();
        anim.cancel();
        anim.end();
        clock.advance(200);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_cancel_after_finish_is_noop() {
        let clock = FrameClock::new();
        let anim = Animator::new(&clock, 0);
        anim.start();
        assert_eq!(anim.outcome(), Some(AnimationOutcome::Finished));
        anim.cancel();
        assert_eq!(anim.outcome(), Some(AnimationOutcome::Finished));
    }

    #[test]
    fn test_listener_after_end_runs_immediately() {
        let clock = FrameClock::new();
        let anim = Animator::new(&clock, 0);
        anim.start();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        anim.add_listener(move |_| flag.set(true));
        assert!(fired.get());
    }

    #[test]
    fn test_start_delay() {
        let clock = FrameClock::new();
        let anim = Animator::new(&clock, 100).with_start_delay(50);
        anim.start();
        clock.advance(40);
        assert!(anim.is_started());
        assert!(!anim.is_running());
        assert_eq!(anim.fraction(), 0.0);
        clock.advance(200);
        assert!(anim.has_ended());
    }

    #[test]
    fn test_scrub_then_settle() {
        let clock = FrameClock::new();
        let anim = Animator::new(&clock, 100).with_interpolator(Interpolator::Linear);
        anim.set_fraction(0.4);
        assert_eq!(anim.fraction(), 0.4);
        anim.animate_to(0.0, 100);
        clock.advance(50);
        assert!((anim.fraction() - 0.2).abs() < 1e-5);
        clock.advance(50);
        assert_eq!(anim.fraction(), 0.0);
        assert!(anim.has_ended());
    }

    #[test]
    fn test_listener_can_start_another_animation() {
        let clock = FrameClock::new();
        let first = Animator::new(&clock, 50);
        let second = Animator::new(&clock, 50);
        let chained = second.clone();
        first.add_listener(move |_| chained.start());
        first.start();
        clock.run_for(64);
        assert!(first.has_ended());
        assert!(second.is_started());
        clock.run_for(64);
        assert!(second.has_ended());
    }
}
