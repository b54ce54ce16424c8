//! Motion pause detection
//!
//! Watches the displacement stream of a drag and reports when the finger
//! dwells. Only the previous sample is kept; velocity is measured between
//! consecutive samples in px/ms.
//!
//! - Active → Paused: speed stays below `pause_speed_threshold` for at least
//!   `pause_duration_ms`. A direction reversal restarts the dwell window.
//! - Paused → Active: speed reaches `resume_speed_threshold`. The gap between
//!   the two thresholds is the hysteresis band.
//! - No samples for `force_pause_timeout_ms` also pauses (see `check_timeout`).

use crate::config::MotionPauseConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    Active,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub displacement: f32,
    pub timestamp_ms: u64,
}

type PauseListener = Box<dyn FnMut(bool)>;

pub struct MotionPauseDetector {
    config: MotionPauseConfig,
    state: PauseState,
    disallow_pause: bool,
    previous: Option<MotionSample>,
    previous_velocity: Option<f32>,
    /// Start of the current slow stretch
    slow_since: Option<u64>,
    listener: Option<PauseListener>,
}

impl MotionPauseDetector {
    pub fn new(config: MotionPauseConfig) -> Self {
        Self {
            config,
            state: PauseState::Active,
            disallow_pause: false,
            previous: None,
            previous_velocity: None,
            slow_since: None,
            listener: None,
        }
    }

    /// Install the listener notified on every pause state change
    pub fn set_listener(&mut self, listener: impl FnMut(bool) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn state(&self) -> PauseState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == PauseState::Paused
    }

    pub fn is_pause_disallowed(&self) -> bool {
        self.disallow_pause
    }

    /// Velocity between the last two samples, px/ms
    pub fn velocity(&self) -> Option<f32> {
        self.previous_velocity
    }

    pub fn add_position(&mut self, displacement: f32, timestamp_ms: u64) {
        let sample = MotionSample {
            displacement,
            timestamp_ms,
        };
        let Some(previous) = self.previous else {
            self.previous = Some(sample);
            return;
        };
        if timestamp_ms < previous.timestamp_ms {
            tracing::trace!(timestamp_ms, previous = previous.timestamp_ms, "dropping stale sample");
            return;
        }

        let dt = (timestamp_ms - previous.timestamp_ms).max(1) as f32;
        let velocity = (displacement - previous.displacement) / dt;
        let reversed = self
            .previous_velocity
            .is_some_and(|prev| prev * velocity < 0.0);
        self.previous = Some(sample);
        if velocity != 0.0 {
            self.previous_velocity = Some(velocity);
        }

        if self.disallow_pause {
            self.slow_since = None;
            return;
        }
        if reversed {
            self.slow_since = None;
        }

        let speed = velocity.abs();
        match self.state {
            PauseState::Active => {
                if speed < self.config.pause_speed_threshold {
                    let since = *self.slow_since.get_or_insert(previous.timestamp_ms);
                    if timestamp_ms - since >= self.config.pause_duration_ms {
                        self.update_paused(true);
                    }
                } else {
                    self.slow_since = None;
                }
            }
            PauseState::Paused => {
                if speed >= self.config.resume_speed_threshold {
                    self.slow_since = None;
                    self.update_paused(false);
                }
            }
        }
    }

    /// Pause if the finger has not reported a sample for the force timeout
    pub fn check_timeout(&mut self, now_ms: u64) {
        if self.disallow_pause || self.is_paused() {
            return;
        }
        let Some(previous) = self.previous else {
            return;
        };
        if now_ms.saturating_sub(previous.timestamp_ms) >= self.config.force_pause_timeout_ms {
            tracing::debug!(now_ms, last = previous.timestamp_ms, "no motion, forcing pause");
            self.update_paused(true);
        }
    }

    pub fn set_disallow_pause(&mut self, disallow: bool) {
        if self.disallow_pause == disallow {
            return;
        }
        self.disallow_pause = disallow;
        self.slow_since = None;
        if disallow && self.is_paused() {
            self.update_paused(false);
        }
    }

    /// Reset for a new gesture; drops samples and the listener without notifying
    pub fn clear(&mut self) {
        self.state = PauseState::Active;
        self.disallow_pause = false;
        self.previous = None;
        self.previous_velocity = None;
        self.slow_since = None;
        self.listener = None;
    }

    fn update_paused(&mut self, paused: bool) {
        let next = if paused {
            PauseState::Paused
        } else {
            PauseState::Active
        };
        if self.state == next {
            return;
        }
        self.state = next;
        tracing::debug!(paused, "motion pause changed");
        if let Some(listener) = self.listener.as_mut() {
            listener(paused);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn detector() -> (MotionPauseDetector, Rc<RefCell<Vec<bool>>>) {
        let mut detector = MotionPauseDetector::new(MotionPauseConfig::default());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        detector.set_listener(move |paused| sink.borrow_mut().push(paused));
        (detector, events)
    }

    /// Feed samples every 10ms moving `step` px each time
    fn feed(detector: &mut MotionPauseDetector, from_ms: u64, to_ms: u64, start: f32, step: f32) -> f32 {
        let mut pos = start;
        let mut t = from_ms;
        while t <= to_ms {
            detector.add_position(pos, t);
            pos += step;
            t += 10;
        }
        pos
    }

    #[test]
    fn test_dwell_pauses_once() {
        let (mut detector, events) = detector();
        let pos = feed(&mut detector, 0, 120, -100.0, -0.5);
        assert!(detector.is_paused());
        assert_eq!(*events.borrow(), vec![true]);

        // Keep dwelling without clearing: no second notification
        feed(&mut detector, 130, 300, pos, -0.5);
        assert_eq!(*events.borrow(), vec![true]);
    }

    #[test]
    fn test_short_dwell_does_not_pause() {
        let (mut detector, events) = detector();
        feed(&mut detector, 0, 50, -100.0, -0.5);
        feed(&mut detector, 60, 120, -130.0, -20.0);
        assert!(!detector.is_paused());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_hysteresis() {
        let (mut detector, events) = detector();
        let pos = feed(&mut detector, 0, 120, -100.0, -0.5);
        assert!(detector.is_paused());

        // 0.5 px/ms: above the pause threshold but below resume
        let pos = feed(&mut detector, 130, 200, pos, -5.0);
        assert!(detector.is_paused());

        feed(&mut detector, 210, 230, pos, -20.0);
        assert!(!detector.is_paused());
        assert_eq!(*events.borrow(), vec![true, false]);
    }

    #[test]
    fn test_direction_reversal_restarts_dwell() {
        let (mut detector, events) = detector();
        feed(&mut detector, 0, 80, -100.0, -0.5);
        feed(&mut detector, 90, 150, -104.5, 0.5);
        assert!(!detector.is_paused());
        feed(&mut detector, 160, 200, -101.0, 0.5);
        assert!(detector.is_paused());
        assert_eq!(*events.borrow(), vec![true]);
    }

    #[test]
    fn test_disallow_forces_active() {
        let (mut detector, events) = detector();
        feed(&mut detector, 0, 120, -100.0, -0.5);
        assert!(detector.is_paused());
        detector.set_disallow_pause(true);
        assert!(!detector.is_paused());
        feed(&mut detector, 130, 400, -170.0, 0.0);
        assert!(!detector.is_paused());
        assert_eq!(*events.borrow(), vec![true, false]);
    }

    #[test]
    fn test_stale_sample_dropped() {
        let (mut detector, _events) = detector();
        detector.add_position(-100.0, 50);
        detector.add_position(-500.0, 40);
        detector.add_position(-110.0, 60);
        assert_eq!(detector.velocity(), Some(-1.0));
    }

    #[test]
    fn test_clear_does_not_notify() {
        let (mut detector, events) = detector();
        feed(&mut detector, 0, 120, -100.0, -0.5);
        detector.clear();
        assert!(!detector.is_paused());
        assert_eq!(*events.borrow(), vec![true]);
    }

    #[test]
    fn test_force_pause_timeout() {
        let (mut detector, events) = detector();
        feed(&mut detector, 0, 30, -100.0, -20.0);
        detector.check_timeout(200);
        assert!(!detector.is_paused());
        detector.check_timeout(330);
        assert!(detector.is_paused());
        assert_eq!(*events.borrow(), vec![true]);
    }
}
