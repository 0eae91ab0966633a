//! 2-D geometric primitives for ray interception.
//!
//! Points and vectors are `glam::Vec2`. On top of that: angle reduction
//! helpers, closed angle intervals on ℝ/2πℝ, a 2×2 linear solver, and the
//! segment–half-line intersection routine shared by line objects and the
//! fog bounding rectangle.

use glam::Vec2;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Minimum distance a ray must travel before it can be intercepted.
///
/// Prevents an object from immediately re-intercepting the ray it just
/// emitted, which happens routinely in single precision at grazing
/// emission. Compared squared, against squared distances.
pub const MIN_HIT_DIST: f32 = 1e-4;

/// Reduce an angle to [-π, +π].
pub fn wrap_pi(mut theta: f32) -> f32 {
    while theta > PI {
        theta -= TAU;
    }
    while theta < -PI {
        theta += TAU;
    }
    theta
}

/// Reduce an angle to [0, 2π].
pub fn wrap_tau(theta: f32) -> f32 {
    theta - TAU * (theta / TAU).floor()
}

/// Solve the linear system
/// ```text
/// | a  b | | x |   | e |
/// | c  d | | y | = | f |
/// ```
/// Returns `None` when the system is singular.
pub fn solve_2x2(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Option<(f32, f32)> {
    let det = a * d - b * c;
    if det == 0.0 {
        return None;
    }
    Some(((e * d - b * f) / det, (a * f - e * c) / det))
}

/// Closed angle interval on ℝ/2πℝ, stored as a start angle in [0, 2π] and
/// a length in [0, 2π].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleInterval {
    start: f32,
    length: f32,
}

impl AngleInterval {
    /// The full circle.
    pub const FULL_CIRCLE: AngleInterval = AngleInterval {
        start: 0.0,
        length: TAU,
    };

    /// Interval from a start angle to an end angle, counterclockwise.
    ///
    /// If numerically `start > 0 > end`, the interval is read as
    /// `[start, end + 2π]`. Spans longer than 2π are a programmer error.
    pub fn new(start: f32, end: f32) -> AngleInterval {
        debug_assert!(
            (end - start).abs() <= TAU + 1e-6,
            "angle interval longer than 2π"
        );
        let end = if end < 0.0 && start >= 0.0 { end + TAU } else { end };
        AngleInterval {
            start: wrap_tau(start),
            length: end - start,
        }
    }

    /// Interval of the given length starting at θ = 0.
    pub fn from_length(length: f32) -> AngleInterval {
        debug_assert!((0.0..=TAU + 1e-6).contains(&length));
        AngleInterval { start: 0.0, length }
    }

    /// Interval rotated by `delta`.
    pub fn shifted(&self, delta: f32) -> AngleInterval {
        AngleInterval {
            start: wrap_tau(self.start + delta),
            length: self.length,
        }
    }

    /// Length of the interval, in [0, 2π].
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Start angle, in [0, 2π].
    pub fn start(&self) -> f32 {
        self.start
    }

    /// End angle, in [0, 4π].
    pub fn end(&self) -> f32 {
        self.start + self.length
    }

    /// Whether the angle (taken in ℝ/2πℝ) lies inside the interval.
    pub fn contains(&self, theta: f32) -> bool {
        let theta = wrap_tau(theta);
        if self.start <= theta && theta <= self.start + self.length {
            return true;
        }
        let theta = theta + TAU;
        self.start <= theta && theta <= self.start + self.length
    }

    /// Unit vectors pointing at the start and end angles.
    pub fn endpoint_units(&self) -> (Vec2, Vec2) {
        (
            Vec2::from_angle(self.start),
            Vec2::from_angle(self.start + self.length),
        )
    }
}

/// Result of a segment–half-line intersection.
#[derive(Debug, Clone, Copy)]
pub struct SegmentRayHit {
    /// Segment vector `a - b`, returned for reuse by the caller.
    pub seg_vec: Vec2,
    /// Unit vector of the half-line.
    pub ray_unit: Vec2,
    /// Abscissa of the hit on the segment, in [0, 1], measured from `b`
    /// toward `a`.
    pub s: f32,
    /// Parameter of the hit along the half-line, ≥ 0.
    pub t: f32,
}

/// Intersect the segment `[a, b]` with the half-line from `origin` at
/// `angle` to the horizontal.
///
/// Solves the 2×2 system for the segment abscissa `s` and half-line
/// parameter `t`; no intersection when the system is singular (parallel)
/// or when `s`, `t` fall out of range. The degenerate collinear case is
/// not handled specially.
pub fn segment_ray_intersection(
    a: Vec2,
    b: Vec2,
    origin: Vec2,
    angle: f32,
) -> Option<SegmentRayHit> {
    let ray_unit = Vec2::from_angle(angle);
    let seg_vec = a - b;
    let (s, t) = solve_2x2(
        seg_vec.x,
        -ray_unit.x,
        seg_vec.y,
        -ray_unit.y,
        origin.x - b.x,
        origin.y - b.y,
    )?;
    if (0.0..=1.0).contains(&s) && t >= 0.0 {
        Some(SegmentRayHit {
            seg_vec,
            ray_unit,
            s,
            t,
        })
    } else {
        None
    }
}

/// Incidence geometry of a ray on an oriented segment.
///
/// Returns the incidence angle relative to the local normal, the absolute
/// angle of that normal, and the forward-face flag (true when the ray hits
/// the side whose normal sits at +90° from the segment vector).
pub fn line_incidence(seg_vec: Vec2, ray_angle: f32) -> (f32, f32, bool) {
    let seg_angle = seg_vec.y.atan2(seg_vec.x);
    let alpha = wrap_pi(ray_angle);
    let i = alpha - (seg_angle - FRAC_PI_2);
    if wrap_pi(i).abs() < FRAC_PI_2 {
        // Ray hits the forward face: normal on the +90° side of the segment.
        (i, seg_angle + FRAC_PI_2, true)
    } else {
        let mut incidence = i - PI;
        if incidence < -FRAC_PI_2 {
            incidence += TAU;
        }
        (incidence, seg_angle - FRAC_PI_2, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_ray_reference_case() {
        // Segment A=(0,0), B=(1,0); ray from (0.5,-1) aimed straight up.
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        let hit = segment_ray_intersection(a, b, Vec2::new(0.5, -1.0), FRAC_PI_2).unwrap();
        assert!((hit.s - 0.5).abs() < 1e-6);
        assert!((hit.t - 1.0).abs() < 1e-6);
        // The returned vectors reconstruct both endpoints.
        let p_seg = b + hit.s * hit.seg_vec;
        let p_ray = Vec2::new(0.5, -1.0) + hit.t * hit.ray_unit;
        assert!((p_seg - p_ray).length() < 1e-6);
        assert!((p_seg - Vec2::new(0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn segment_ray_parallel_is_none() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        assert!(segment_ray_intersection(a, b, Vec2::new(0.0, 1.0), 0.0).is_none());
    }

    #[test]
    fn segment_ray_behind_origin_is_none() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        assert!(segment_ray_intersection(a, b, Vec2::new(0.5, -1.0), -FRAC_PI_2).is_none());
    }

    #[test]
    fn interval_contains_wraparound() {
        // From 3π/2 to π/2 through zero, given as [-π/2, π/2].
        let iv = AngleInterval::new(-FRAC_PI_2, FRAC_PI_2);
        assert!(iv.contains(0.0));
        assert!(iv.contains(-0.1));
        assert!(!iv.contains(PI));
        assert!((iv.length() - PI).abs() < 1e-5);
    }

    #[test]
    fn interval_negative_end_reads_through_zero() {
        let iv = AngleInterval::new(0.5, -0.5);
        assert!((iv.length() - (TAU - 1.0)).abs() < 1e-5);
        assert!(iv.contains(PI));
        assert!(!iv.contains(0.0));
    }

    #[test]
    fn wrap_helpers() {
        assert!((wrap_pi(3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_tau(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-5);
    }
}
