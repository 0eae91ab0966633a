//! Light sources.
//!
//! A [`Source`] generates the primary rays of one propagation pass. Ray
//! counts derive from a density field (linear density for extended
//! segments, angular density for point-like emitters), so denser sources
//! cost more rays per pass rather than brighter ones.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::geometry::AngleInterval;
use crate::ray::Ray;
use crate::spectrum::Spectrum;

/// How an angular emitter picks its directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionSampling {
    /// Uniform random directions, fresh every pass.
    Random,
    /// Deterministic equi-spaced directions, identical every pass.
    EquiSpaced,
}

/// Angular directivity of an emitter, normalized to 1. `None` is uniform.
pub type Directivity = Option<Box<dyn Fn(f32) -> f32 + Send + Sync>>;

fn directivity_weight(directivity: &Directivity, theta: f32) -> f32 {
    directivity.as_ref().map_or(1.0, |f| f(theta))
}

/// A primary-ray emitter.
pub enum Source {
    /// Single ray from a point at a fixed angle ("laser").
    SingleRay {
        /// Emission point.
        position: Vec2,
        /// Emission angle to the horizontal.
        angle: f32,
        /// Emitted spectrum.
        spectrum: Spectrum,
    },
    /// Collimated beam: parallel rays distributed along a segment. A point
    /// source at infinity, in effect.
    ParallelBeam {
        /// Start of the emitting segment.
        a: Vec2,
        /// Segment vector, from `a`.
        vec: Vec2,
        /// Rays per unit of segment length.
        linear_density: f32,
        /// Emission angle relative to the segment normal.
        angle_rel: f32,
        /// Emitted spectrum.
        spectrum: Spectrum,
    },
    /// Omnidirectional point source, optionally restricted to an angular
    /// sector.
    PointOmni {
        /// Emission point.
        position: Vec2,
        /// Rays per full turn.
        angular_density: f32,
        /// Direction sampling.
        sampling: DirectionSampling,
        /// Angular directivity.
        directivity: Directivity,
        /// Emission sector; directions outside it are dropped (which
        /// lowers the effective ray count).
        sector: Option<AngleInterval>,
        /// Emitted spectrum.
        spectrum: Spectrum,
    },
    /// Disk-sector emitter ("projector") with Lambertian emission at every
    /// rim point. Degenerates to a point source as the radius goes to 0.
    LambertDiskSector {
        /// Disk center.
        position: Vec2,
        /// Disk radius.
        radius: f32,
        /// Rim sector carrying the emitting surface.
        sector: AngleInterval,
        /// Rays per full turn of rim.
        angular_density: f32,
        /// Rim-point sampling.
        sampling: DirectionSampling,
        /// Angular directivity, on top of the cosine law.
        directivity: Directivity,
        /// Emitted spectrum.
        spectrum: Spectrum,
    },
    /// Segment emitter ("luminous panel") with one-sided Lambertian
    /// emission at every point.
    LambertLine {
        /// Start of the emitting segment.
        a: Vec2,
        /// Segment vector, from `a`.
        vec: Vec2,
        /// Rays per unit of segment length.
        linear_density: f32,
        /// Emitted spectrum.
        spectrum: Spectrum,
    },
}

impl Source {
    /// Generate the primary rays of one pass.
    pub fn emit<R: Rng>(&self, rng: &mut R) -> Vec<Ray> {
        match self {
            Source::SingleRay {
                position,
                angle,
                spectrum,
            } => vec![Ray::new(*position, *angle, *spectrum)],

            Source::ParallelBeam {
                a,
                vec,
                linear_density,
                angle_rel,
                spectrum,
            } => {
                let n = (linear_density * vec.length()).round() as usize;
                let angle = vec.y.atan2(vec.x) - FRAC_PI_2 + angle_rel;
                (0..n)
                    .map(|k| Ray::new(*a + *vec * (k as f32 / n as f32), angle, *spectrum))
                    .collect()
            }

            Source::PointOmni {
                position,
                angular_density,
                sampling,
                directivity,
                sector,
                spectrum,
            } => {
                let n = angular_density.round() as usize;
                let mut rays = Vec::with_capacity(n);
                for k in 0..n {
                    let angle = match sampling {
                        DirectionSampling::Random => TAU * rng.random::<f32>(),
                        DirectionSampling::EquiSpaced => TAU * k as f32 / n as f32,
                    };
                    if let Some(sector) = sector {
                        if !sector.contains(angle) {
                            continue;
                        }
                    }
                    let mut ray = Ray::new(*position, angle, *spectrum);
                    ray.spectrum.scale(directivity_weight(directivity, angle));
                    rays.push(ray);
                }
                rays
            }

            Source::LambertDiskSector {
                position,
                radius,
                sector,
                angular_density,
                sampling,
                directivity,
                spectrum,
            } => {
                let n = (angular_density * sector.length() / TAU).round() as usize;
                let mut rays = Vec::with_capacity(n);
                for k in 0..n {
                    let fraction = match sampling {
                        DirectionSampling::Random => rng.random::<f32>(),
                        DirectionSampling::EquiSpaced => k as f32 / n as f32,
                    };
                    let rim_angle = sector.start() + sector.length() * fraction;
                    let origin = *position + *radius * Vec2::from_angle(rim_angle);
                    // Lambert cosine law about the local rim normal.
                    let incr = FRAC_PI_2 * (1.0 - 2.0 * rng.random::<f32>());
                    let mut ray = Ray::new(origin, rim_angle + incr, *spectrum);
                    ray.spectrum
                        .scale(directivity_weight(directivity, rim_angle) * incr.cos());
                    rays.push(ray);
                }
                rays
            }

            Source::LambertLine {
                a,
                vec,
                linear_density,
                spectrum,
            } => {
                let n = (linear_density * vec.length()).round() as usize;
                let normal_angle = vec.y.atan2(vec.x) - FRAC_PI_2;
                let mut rays = Vec::with_capacity(n);
                for k in 0..n {
                    let incr = FRAC_PI_2 * (1.0 - 2.0 * rng.random::<f32>());
                    let mut ray = Ray::new(
                        *a + *vec * (k as f32 / n as f32),
                        normal_angle + incr,
                        *spectrum,
                    );
                    ray.spectrum.scale(incr.cos());
                    rays.push(ray);
                }
                rays
            }
        }
    }
}
