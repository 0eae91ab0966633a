//! Curve geometries: segments, circular arcs, and closed composites.
//!
//! Each geometry knows how to intercept a ray, turning the raw intersection
//! into the common [`CurveHit`] record (incidence point and angle, absolute
//! normal angle, forward-face flag) and filtering hits closer than the
//! minimum self-interception distance.

use glam::Vec2;
use std::f32::consts::{FRAC_PI_2, PI};

use crate::error::BuildError;
use crate::geometry::{
    line_incidence, segment_ray_intersection, wrap_pi, AngleInterval, MIN_HIT_DIST,
};
use crate::object::{CurveDetail, CurveHit, Extension};
use crate::ray::Ray;

/// Segment geometry from point `a` to point `b`.
///
/// The segment is oriented: its forward face is the one whose normal sits
/// at +90° from the vector `a → b`.
#[derive(Debug, Clone, Copy)]
pub struct Line {
    /// First endpoint.
    pub a: Vec2,
    /// Second endpoint.
    pub b: Vec2,
}

impl Line {
    /// Segment between two points.
    pub fn new(a: Vec2, b: Vec2) -> Line {
        Line { a, b }
    }

    /// Segment from `a`, of length `len`, at `angle` to the horizontal.
    pub fn from_angle(a: Vec2, len: f32, angle: f32) -> Line {
        Line {
            a,
            b: a + len * Vec2::from_angle(angle),
        }
    }

    /// Length of the segment.
    pub fn length(&self) -> f32 {
        (self.b - self.a).length()
    }

    /// Midpoint of the segment.
    pub fn midpoint(&self) -> Vec2 {
        (self.a + self.b) / 2.0
    }

    /// Unit vector perpendicular to the segment (forward-face side).
    pub fn unit_perp(&self) -> Vec2 {
        (self.b - self.a).perp().normalize()
    }

    /// Interception test of a ray against the segment.
    pub fn intercept(&self, ray: &Ray) -> Option<CurveHit> {
        let isect = segment_ray_intersection(self.a, self.b, ray.origin, ray.angle)?;
        let point = ray.origin + isect.t * isect.ray_unit;
        let (incidence, normal_angle, forward) = line_incidence(isect.seg_vec, ray.angle);
        Some(CurveHit {
            point,
            incidence,
            normal_angle,
            forward,
            detail: CurveDetail::Segment { s: isect.s },
        })
    }

    /// Bounding extension.
    pub fn extension(&self) -> Extension {
        Extension {
            pos: self.midpoint(),
            radius: (self.b - self.a).length(),
        }
    }

    /// Endpoints, in chain order.
    pub fn endpoints(&self) -> (Vec2, Vec2) {
        (self.a, self.b)
    }
}

/// Circular-arc geometry: center `c`, radius `r`, spanning the angular
/// interval `span` counterclockwise.
///
/// By default the inside of the circle is the "interior" medium side;
/// `invert_interior` swaps that orientation.
#[derive(Debug, Clone, Copy)]
pub struct Arc {
    /// Circle center.
    pub c: Vec2,
    /// Circle radius.
    pub r: f32,
    /// Angular interval covered by the arc.
    pub span: AngleInterval,
    /// Swap which side counts as the interior.
    pub invert_interior: bool,
}

impl Arc {
    /// Arc from center, radius and angular interval.
    pub fn new(c: Vec2, r: f32, span: AngleInterval, invert_interior: bool) -> Arc {
        Arc {
            c,
            r,
            span,
            invert_interior,
        }
    }

    /// The minor arc of radius `r` passing through `a` then `b`.
    ///
    /// Fails when the chord is longer than the diameter.
    pub fn through_points(a: Vec2, b: Vec2, r: f32, invert_interior: bool) -> Result<Arc, BuildError> {
        let ab = b - a;
        let ab_sq = ab.length_squared();
        if ab_sq > 4.0 * r * r {
            return Err(BuildError::DegenerateArc);
        }
        // Work in the frame where the chord points along +y.
        let theta0 = ab.y.atan2(ab.x) - FRAC_PI_2;
        let c_local = Vec2::new(-(r * r - ab_sq / 4.0).sqrt(), ab_sq.sqrt() / 2.0);
        let theta = (c_local.y / c_local.x).atan();
        Ok(Arc {
            c: a + Vec2::from_angle(theta0).rotate(c_local),
            r,
            span: AngleInterval::new(theta, -theta).shifted(theta0),
            invert_interior,
        })
    }

    /// Interception test of a ray against the arc.
    ///
    /// The ray is moved into the circle's frame, the quadratic is solved
    /// through its two candidate crossing angles, and the candidate lying
    /// inside the arc's interval is kept, preferring the outside-incoming
    /// one when the ray originates outside the circle.
    pub fn intercept(&self, ray: &Ray) -> Option<CurveHit> {
        let oc = self.c - ray.origin;
        let b = oc.length() / self.r; // distance to center, in radii
        let base_angle = oc.y.atan2(oc.x);
        // Angles relative to the origin→center axis.
        let alpha = wrap_pi(ray.angle - base_angle);
        let span = self.span.shifted(-base_angle);
        let y = b * alpha.sin();
        if (b > 1.00001 && alpha.abs() >= FRAC_PI_2) || y.abs() > 1.0 {
            return None;
        }
        let asin_y = y.asin();
        let theta1 = alpha - asin_y + PI;
        let theta2 = alpha + asin_y;

        let (theta_rel, incidence, forward, normal_rel);
        if b > 1.00001 && span.contains(theta1) {
            // θ1 is only reachable from outside the circle.
            theta_rel = theta1;
            normal_rel = theta1;
            incidence = PI - theta1 + alpha;
            forward = !self.invert_interior;
        } else if span.contains(theta2) {
            theta_rel = theta2;
            normal_rel = theta2 + PI; // normal toward the inside
            incidence = alpha - theta2;
            forward = self.invert_interior;
        } else {
            return None;
        }
        let theta = theta_rel + base_angle;
        Some(CurveHit {
            point: self.c + self.r * Vec2::from_angle(theta),
            incidence,
            normal_angle: normal_rel + base_angle,
            forward,
            detail: CurveDetail::Arc { theta },
        })
    }

    /// Bounding extension.
    pub fn extension(&self) -> Extension {
        Extension {
            pos: self.c,
            radius: self.r,
        }
    }

    /// Endpoints, in chain order.
    pub fn endpoints(&self) -> (Vec2, Vec2) {
        let (ua, ub) = self.span.endpoint_units();
        (self.c + self.r * ua, self.c + self.r * ub)
    }
}

/// One constituent curve of a composite.
#[derive(Debug, Clone, Copy)]
pub enum Curve {
    /// Segment constituent.
    Line(Line),
    /// Arc constituent.
    Arc(Arc),
}

impl Curve {
    fn intercept(&self, ray: &Ray) -> Option<CurveHit> {
        match self {
            Curve::Line(line) => line.intercept(ray),
            Curve::Arc(arc) => arc.intercept(ray),
        }
    }

    fn extension(&self) -> Extension {
        match self {
            Curve::Line(line) => line.extension(),
            Curve::Arc(arc) => arc.extension(),
        }
    }

    fn endpoints(&self) -> (Vec2, Vec2) {
        match self {
            Curve::Line(line) => line.endpoints(),
            Curve::Arc(arc) => arc.endpoints(),
        }
    }
}

/// Closed chain of curves treated as a single object.
///
/// Closure is verified once at construction and not re-enforced afterward.
#[derive(Debug, Clone)]
pub struct Composite {
    /// Constituent curves, chained end-to-end.
    pub curves: Vec<Curve>,
}

impl Composite {
    /// Build a composite, checking that the curves chain end-to-end into a
    /// closed loop.
    pub fn new(curves: Vec<Curve>) -> Result<Composite, BuildError> {
        if curves.is_empty() {
            return Err(BuildError::EmptyComposite);
        }
        let joined = |p: Vec2, q: Vec2| (p - q).length_squared() <= 1e-10;
        let (begin, mut cursor) = curves[0].endpoints();
        for (i, curve) in curves.iter().enumerate().skip(1) {
            let (start, end) = curve.endpoints();
            if !joined(cursor, start) {
                return Err(BuildError::OpenChain(i));
            }
            cursor = end;
        }
        if !joined(begin, cursor) {
            return Err(BuildError::OpenChain(0));
        }
        Ok(Composite { curves })
    }

    /// Closed polygon of segments through `points`.
    pub fn polygon(points: &[Vec2]) -> Result<Composite, BuildError> {
        let n = points.len();
        let curves = (0..n)
            .map(|i| Curve::Line(Line::new(points[i], points[(i + 1) % n])))
            .collect();
        Composite::new(curves)
    }

    /// Interception test: every constituent is evaluated and the strictly
    /// nearest valid hit wins (ties broken by iteration order).
    pub fn intercept(&self, ray: &Ray) -> Option<CurveHit> {
        let mut best: Option<(f32, CurveHit)> = None;
        for curve in &self.curves {
            if let Some(hit) = curve.intercept(ray) {
                let dist_sq = (ray.origin - hit.point).length_squared();
                if dist_sq < MIN_HIT_DIST * MIN_HIT_DIST {
                    continue;
                }
                if best.as_ref().map_or(true, |(d, _)| dist_sq < *d) {
                    best = Some((dist_sq, hit));
                }
            }
        }
        best.map(|(_, hit)| hit)
    }

    /// Bounding extension: centroid of constituent extension centers, plus
    /// the max constituent radius and the max centroid-to-center distance.
    /// Pessimistic but cheap.
    pub fn extension(&self) -> Extension {
        let centers: Vec<Vec2> = self.curves.iter().map(|c| c.extension().pos).collect();
        let centroid = centers.iter().sum::<Vec2>() / centers.len() as f32;
        let max_radius = self
            .curves
            .iter()
            .map(|c| c.extension().radius)
            .fold(0.0f32, f32::max);
        let max_offset = centers
            .iter()
            .map(|p| (*p - centroid).length())
            .fold(0.0f32, f32::max);
        Extension {
            pos: centroid,
            radius: max_radius + max_offset,
        }
    }

    /// Translate the whole composite so its first curve starts at `origin`.
    pub fn reposition(&mut self, origin: Vec2) {
        let (start, _) = self.curves[0].endpoints();
        let delta = origin - start;
        for curve in &mut self.curves {
            match curve {
                Curve::Line(line) => {
                    line.a += delta;
                    line.b += delta;
                }
                Curve::Arc(arc) => {
                    arc.c += delta;
                }
            }
        }
    }
}

/// Geometry of an optic object.
#[derive(Debug, Clone)]
pub enum Geometry {
    /// Segment.
    Line(Line),
    /// Circular arc.
    Arc(Arc),
    /// Closed chain of curves.
    Composite(Composite),
}

impl Geometry {
    /// Interception test with the minimum self-interception distance filter
    /// applied.
    pub fn intercept(&self, ray: &Ray) -> Option<CurveHit> {
        let hit = match self {
            Geometry::Line(line) => line.intercept(ray)?,
            Geometry::Arc(arc) => arc.intercept(ray)?,
            // Composite applies the filter per constituent.
            Geometry::Composite(comp) => return comp.intercept(ray),
        };
        let dist_sq = (ray.origin - hit.point).length_squared();
        if dist_sq < MIN_HIT_DIST * MIN_HIT_DIST {
            None
        } else {
            Some(hit)
        }
    }

    /// Bounding extension.
    pub fn extension(&self) -> Extension {
        match self {
            Geometry::Line(line) => line.extension(),
            Geometry::Arc(arc) => arc.extension(),
            Geometry::Composite(comp) => comp.extension(),
        }
    }

    /// The underlying line, for surfaces restricted to line geometry.
    pub fn as_line(&self) -> Option<&Line> {
        match self {
            Geometry::Line(line) => Some(line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::Spectrum;
    use std::f32::consts::TAU;

    fn ray(origin: Vec2, angle: f32) -> Ray {
        Ray::new(origin, angle, Spectrum::white())
    }

    #[test]
    fn line_intercept_normal_incidence() {
        let line = Line::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        let hit = line.intercept(&ray(Vec2::new(0.5, 1.0), -FRAC_PI_2)).unwrap();
        assert!((hit.point - Vec2::new(0.5, 0.0)).length() < 1e-5);
        assert!(wrap_pi(hit.incidence).abs() < 1e-5);
        match hit.detail {
            CurveDetail::Segment { s } => assert!((s - 0.5).abs() < 1e-5),
            _ => panic!("expected segment detail"),
        }
    }

    #[test]
    fn line_intercept_faces_disagree() {
        let line = Line::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        let above = line.intercept(&ray(Vec2::new(0.5, 1.0), -FRAC_PI_2)).unwrap();
        let below = line.intercept(&ray(Vec2::new(0.5, -1.0), FRAC_PI_2)).unwrap();
        assert_ne!(above.forward, below.forward);
        assert!((wrap_pi(above.normal_angle - below.normal_angle).abs() - PI).abs() < 1e-5);
    }

    #[test]
    fn arc_intercept_at_near_boundary() {
        // Ray from outside a unit circle, aimed at its center: the hit must
        // sit on the near boundary, whichever half the arc spans.
        for span in [
            AngleInterval::FULL_CIRCLE,
            AngleInterval::new(FRAC_PI_2, 3.0 * FRAC_PI_2),
        ] {
            let arc = Arc::new(Vec2::ZERO, 1.0, span, false);
            let hit = arc.intercept(&ray(Vec2::new(-3.0, 0.0), 0.0)).unwrap();
            assert!(
                (hit.point - Vec2::new(-1.0, 0.0)).length() < 1e-4,
                "hit at {:?} for span {:?}",
                hit.point,
                span
            );
        }
    }

    #[test]
    fn arc_intercept_from_inside_hits_far_side() {
        let arc = Arc::new(Vec2::ZERO, 1.0, AngleInterval::FULL_CIRCLE, false);
        let hit = arc.intercept(&ray(Vec2::new(0.0, 0.0), 0.0)).unwrap();
        assert!((hit.point - Vec2::new(1.0, 0.0)).length() < 1e-4);
        // Coming from inside: reverse face for a non-inverted arc.
        assert!(!hit.forward);
    }

    #[test]
    fn arc_miss_outside_interval() {
        // Arc spanning an upper-right slice: a horizontal ray through the
        // center crosses the circle at θ=π and θ=0, neither on the arc.
        let arc = Arc::new(
            Vec2::ZERO,
            1.0,
            AngleInterval::new(FRAC_PI_2 / 2.0, FRAC_PI_2),
            false,
        );
        assert!(arc.intercept(&ray(Vec2::new(-3.0, 0.0), 0.0)).is_none());
    }

    #[test]
    fn arc_through_points_passes_through_both() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 1.0);
        let arc = Arc::through_points(a, b, 1.5, false).unwrap();
        assert!(((arc.c - a).length() - arc.r).abs() < 1e-4);
        assert!(((arc.c - b).length() - arc.r).abs() < 1e-4);
        let (pa, pb) = arc.endpoints();
        assert!((pa - a).length() < 1e-3);
        assert!((pb - b).length() < 1e-3);
    }

    #[test]
    fn arc_through_points_rejects_long_chord() {
        assert!(matches!(
            Arc::through_points(Vec2::ZERO, Vec2::new(4.0, 0.0), 1.0, false),
            Err(BuildError::DegenerateArc)
        ));
    }

    #[test]
    fn min_distance_filters_grazing_hit() {
        let line = Line::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        let geom = Geometry::Line(line);
        // Ray emitted on the segment itself.
        assert!(geom.intercept(&ray(Vec2::new(0.5, 0.0), FRAC_PI_2)).is_none());
    }

    #[test]
    fn composite_requires_closed_chain() {
        let open = vec![
            Curve::Line(Line::new(Vec2::ZERO, Vec2::new(1.0, 0.0))),
            Curve::Line(Line::new(Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0))),
        ];
        assert!(matches!(Composite::new(open), Err(BuildError::OpenChain(_))));
        assert!(matches!(Composite::new(vec![]), Err(BuildError::EmptyComposite)));

        let closed = Composite::polygon(&[
            Vec2::ZERO,
            Vec2::new(1.0, 0.0),
            Vec2::new(0.5, 1.0),
        ]);
        assert!(closed.is_ok());
    }

    #[test]
    fn composite_picks_nearest_constituent() {
        let comp = Composite::polygon(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ])
        .unwrap();
        // Ray travelling rightward through the square: left edge is nearest.
        let hit = comp.intercept(&ray(Vec2::new(-1.0, 0.5), 0.0)).unwrap();
        assert!((hit.point - Vec2::new(0.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn full_circle_arc_closes_on_itself() {
        let arc = Arc::new(Vec2::ZERO, 1.0, AngleInterval::from_length(TAU), false);
        let comp = Composite::new(vec![Curve::Arc(arc)]).unwrap();
        assert!(comp.intercept(&ray(Vec2::new(-3.0, 0.0), 0.0)).is_some());
    }
}
