//! Interpolation and easing curves shared by every timed animation.
//!
//! Every animation uses the same progress semantics:
//! `progress = clamp(elapsed / duration, 0, 1)`, `eased = curve(progress)`,
//! `value = lerp(start, target, eased)`.

use glam::Vec3;

/// Named easing curves. All map `[0, 1]` onto `[0, 1]` with `f(0) = 0` and `f(1) = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadIn,
    CubicIn,
    CubicOut,
    CubicInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::QuadIn => ease_quad_in(t),
            Self::CubicIn => ease_cubic_in(t),
            Self::CubicOut => ease_cubic_out(t),
            Self::CubicInOut => ease_cubic_in_out(t),
        }
    }
}

pub fn ease_quad_in(t: f32) -> f32 {
    t * t
}

pub fn ease_cubic_in(t: f32) -> f32 {
    t * t * t
}

pub fn ease_cubic_out(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

pub fn ease_cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let f = -2.0 * t + 2.0;
        1.0 - f * f * f / 2.0
    }
}

/// Clamped progress of an animation that has been running for `elapsed_ms`.
///
/// A zero or negative duration is treated as already complete.
pub fn progress(elapsed_ms: f64, duration_ms: f64) -> f32 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    (elapsed_ms / duration_ms).clamp(0.0, 1.0) as f32
}

/// Scalar interpolation. Written as a weighted sum so that `t == 0` yields `a`
/// and `t == 1` yields `b` bit-for-bit.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    Vec3::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t), lerp(a.z, b.z, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_hit_both_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::QuadIn,
            Easing::CubicIn,
            Easing::CubicOut,
            Easing::CubicInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?} at 0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?} at 1");
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for easing in [Easing::QuadIn, Easing::CubicIn, Easing::CubicOut, Easing::CubicInOut] {
            let mut previous = 0.0;
            for step in 0..=100 {
                let value = easing.apply(step as f32 / 100.0);
                assert!(value >= previous, "{easing:?} decreased at step {step}");
                previous = value;
            }
        }
    }

    #[test]
    fn cubic_out_front_loads_motion() {
        assert!(ease_cubic_out(0.25) > 0.25);
        assert!(ease_quad_in(0.25) < 0.25);
        assert!((ease_cubic_in_out(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn lerp_is_exact_at_endpoints() {
        let (a, b) = (0.3_f32, 10.3_f32);
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
        let v = lerp_vec3(Vec3::new(1.0, -2.0, 0.1), Vec3::new(4.0, 5.0, 10.1), 1.0);
        assert_eq!(v, Vec3::new(4.0, 5.0, 10.1));
    }

    #[test]
    fn progress_clamps_and_handles_zero_duration() {
        assert_eq!(progress(-5.0, 100.0), 0.0);
        assert_eq!(progress(50.0, 100.0), 0.5);
        assert_eq!(progress(150.0, 100.0), 1.0);
        assert_eq!(progress(0.0, 0.0), 1.0);
    }
}
