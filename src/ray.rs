//! Ray representation for 2-D spectral ray tracing.
//!
//! A ray is a half-line r(t) = origin + t · (cos θ, sin θ) carrying an
//! owned intensity spectrum. Rays are plain values: sources and re-emitting
//! objects create them, and a recursion branch that terminates (absorbed,
//! escaped, truncated, below cutoff) simply drops them.

use glam::Vec2;

use crate::spectrum::Spectrum;

/// Light ray: origin point, direction angle to the horizontal, spectrum.
#[derive(Debug, Clone)]
pub struct Ray {
    /// Starting point of the ray.
    pub origin: Vec2,
    /// Direction angle to the horizontal, in radians.
    pub angle: f32,
    /// Intensity spectrum carried by the ray.
    pub spectrum: Spectrum,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec2, angle: f32, spectrum: Spectrum) -> Ray {
        Ray {
            origin,
            angle,
            spectrum,
        }
    }

    /// Unit direction vector of the ray.
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec2 {
        self.origin + t * self.direction()
    }
}
