//! Vertical swipe detection
//!
//! Turns raw touch down/motion/up events for a single finger into drag
//! callbacks for the state swipe:
//! - `DragStart` once the finger has moved past the touch slop
//! - `Drag` with the displacement since the slop was crossed (negative = up)
//! - `DragEnd` with the release velocity in px/ms
//!
//! Timestamps come from the input events, never from the wall clock.

/// Low-pass filter time constant for velocity (10 Hz cutoff), in ms
const VELOCITY_DAMPENING_RC: f32 = 1000.0 / (2.0 * std::f32::consts::PI * 10.0);

/// Recognized swipe event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipeEvent {
    /// Finger moved past the touch slop
    DragStart,

    /// Drag in progress
    Drag {
        displacement: f32, // px, negative = up
        timestamp_ms: u64,
    },

    /// Finger lifted or touch canceled
    DragEnd {
        velocity: f32, // px/ms, negative = up
    },
}

/// Touch point tracking
#[derive(Debug, Clone)]
pub struct TouchPoint {
    pub id: i32,
    pub start_y: f32,
    pub current_y: f32,
    pub start_ms: u64,
    pub last_ms: u64,
    /// Smoothed vertical velocity, px/ms
    pub velocity: f32,
}

impl TouchPoint {
    pub fn new(id: i32, y: f32, timestamp_ms: u64) -> Self {
        Self {
            id,
            start_y: y,
            current_y: y,
            start_ms: timestamp_ms,
            last_ms: timestamp_ms,
            velocity: 0.0,
        }
    }

    pub fn update(&mut self, y: f32, timestamp_ms: u64) {
        if timestamp_ms > self.last_ms {
            let dt = (timestamp_ms - self.last_ms) as f32;
            let raw = (y - self.current_y) / dt;
            self.velocity = if self.velocity.abs() > 0.001 {
                let alpha = dt / (VELOCITY_DAMPENING_RC + dt);
                (1.0 - alpha) * self.velocity + alpha * raw
            } else {
                raw
            };
            self.last_ms = timestamp_ms;
        }
        self.current_y = y;
    }

    pub fn delta(&self) -> f32 {
        self.current_y - self.start_y
    }
}

/// Single finger vertical swipe detector
#[derive(Debug, Clone)]
pub struct SwipeDetector {
    touch_slop: f32,
    touch: Option<TouchPoint>,
    dragging: bool,
    /// Slop removed from reported displacement so drags start at zero
    subtract_displacement: f32,
}

impl SwipeDetector {
    pub fn new(touch_slop: f32) -> Self {
        Self {
            touch_slop,
            touch: None,
            dragging: false,
            subtract_displacement: 0.0,
        }
    }

    pub fn touch_down(&mut self, id: i32, y: f32, timestamp_ms: u64) -> Option<SwipeEvent> {
        if self.touch.is_some() {
            // Second finger, the swipe keeps tracking the first one
            return None;
        }
        self.touch = Some(TouchPoint::new(id, y, timestamp_ms));
        self.dragging = false;
        self.subtract_displacement = 0.0;
        None
    }

    pub fn touch_motion(&mut self, id: i32, y: f32, timestamp_ms: u64) -> Option<SwipeEvent> {
        let point = self.touch.as_mut().filter(|p| p.id == id)?;
        point.update(y, timestamp_ms);
        let delta = point.delta();

        if !self.dragging {
            if delta.abs() < self.touch_slop {
                return None;
            }
            self.dragging = true;
            self.subtract_displacement = self.touch_slop.copysign(delta);
            return Some(SwipeEvent::DragStart);
        }

        Some(SwipeEvent::Drag {
            displacement: delta - self.subtract_displacement,
            timestamp_ms,
        })
    }

    pub fn touch_up(&mut self, id: i32) -> Option<SwipeEvent> {
        if self.touch.as_ref().map(|p| p.id) != Some(id) {
            return None;
        }
        let point = self.touch.take()?;
        let was_dragging = std::mem::replace(&mut self.dragging, false);
        was_dragging.then_some(SwipeEvent::DragEnd {
            velocity: point.velocity,
        })
    }

    /// Touch stream interrupted; a live drag ends without a fling
    pub fn touch_cancel(&mut self) -> Option<SwipeEvent> {
        self.touch = None;
        let was_dragging = std::mem::replace(&mut self.dragging, false);
        was_dragging.then_some(SwipeEvent::DragEnd { velocity: 0.0 })
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn has_active_touch(&self) -> bool {
        self.touch.is_some()
    }

    pub fn touch_slop(&self) -> f32 {
        self.touch_slop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slop_before_drag() {
        let mut detector = SwipeDetector::new(24.0);
        assert_eq!(detector.touch_down(0, 2000.0, 0), None);
        assert_eq!(detector.touch_motion(0, 1990.0, 10), None);
        assert_eq!(detector.touch_motion(0, 1970.0, 20), Some(SwipeEvent::DragStart));
        assert!(detector.is_dragging());

        match detector.touch_motion(0, 1900.0, 30) {
            Some(SwipeEvent::Drag { displacement, timestamp_ms }) => {
                assert_eq!(displacement, -76.0);
                assert_eq!(timestamp_ms, 30);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tap_has_no_drag_end() {
        let mut detector = SwipeDetector::new(24.0);
        detector.touch_down(0, 500.0, 0);
        detector.touch_motion(0, 505.0, 10);
        assert_eq!(detector.touch_up(0), None);
        assert!(!detector.has_active_touch());
    }

    #[test]
    fn test_release_velocity() {
        let mut detector = SwipeDetector::new(24.0);
        detector.touch_down(0, 2000.0, 0);
        let mut y = 2000.0;
        for t in (10..=100).step_by(10) {
            y -= 30.0;
            detector.touch_motion(0, y, t);
        }
        match detector.touch_up(0) {
            Some(SwipeEvent::DragEnd { velocity }) => assert!((velocity + 3.0).abs() < 0.05),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_second_finger_ignored() {
        let mut detector = SwipeDetector::new(24.0);
        detector.touch_down(0, 2000.0, 0);
        detector.touch_down(1, 100.0, 5);
        assert_eq!(detector.touch_motion(1, 10.0, 10), None);
        assert_eq!(detector.touch_up(1), None);
        assert!(detector.has_active_touch());
    }

    #[test]
    fn test_cancel_ends_drag_without_fling() {
        let mut detector = SwipeDetector::new(24.0);
        detector.touch_down(0, 2000.0, 0);
        detector.touch_motion(0, 1900.0, 10);
        assert_eq!(
            detector.touch_cancel(),
            Some(SwipeEvent::DragEnd { velocity: 0.0 })
        );
        assert_eq!(detector.touch_cancel(), None);
    }
}
