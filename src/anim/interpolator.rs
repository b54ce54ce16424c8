//! Time interpolators (easing curves)

/// Maps a linear time fraction in [0,1] to an eased fraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interpolator {
    Linear,
    /// Ease in (quadratic)
    Accelerate,
    /// Ease out (quadratic)
    Decelerate,
    /// Cosine ease in and out
    AccelDecel,
    /// Ease out that shoots past the end before settling
    Overshoot(f32),
}

/// Overshoot used for the shelf peek
pub const OVERSHOOT_1_2: Interpolator = Interpolator::Overshoot(1.2);

impl Default for Interpolator {
    fn default() -> Self {
        Interpolator::AccelDecel
    }
}

impl Interpolator {
    pub fn interpolate(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Interpolator::Linear => t,
            Interpolator::Accelerate => t * t,
            Interpolator::Decelerate => 1.0 - (1.0 - t) * (1.0 - t),
            Interpolator::AccelDecel => (((t + 1.0) * std::f32::consts::PI).cos() / 2.0) + 0.5,
            Interpolator::Overshoot(tension) => {
                let t = t - 1.0;
                t * t * ((tension + 1.0) * t + tension) + 1.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        for interp in [
            Interpolator::Linear,
            Interpolator::Accelerate,
            Interpolator::Decelerate,
            Interpolator::AccelDecel,
            OVERSHOOT_1_2,
        ] {
            assert!(interp.interpolate(0.0).abs() < 1e-5, "{interp:?} at 0");
            assert!((interp.interpolate(1.0) - 1.0).abs() < 1e-5, "{interp:?} at 1");
        }
    }

    #[test]
    fn test_overshoot_passes_end() {
        let peak = (1..100)
            .map(|i| OVERSHOOT_1_2.interpolate(i as f32 / 100.0))
            .fold(0.0_f32, f32::max);
        assert!(peak > 1.0);
    }
}
