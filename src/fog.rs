//! Volumetric scattering medium.
//!
//! A [`Fog`] fills an axis-aligned rectangle divided into a grid of cells
//! with caller-supplied density. Interception is a random walk: the ray is
//! marched through the rectangle in steps of half the smaller cell size,
//! accumulating a scattering probability per step; reaching the far
//! boundary means the ray passes through untouched. A scatter event
//! re-emits secondary rays in random directions weighted by an angular
//! directivity function, optionally alongside an attenuated passthrough
//! ray.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::geometry::segment_ray_intersection;
use crate::object::{Emission, Extension, Hit, Intercept, ScatterHit};
use crate::ray::Ray;

/// When the per-step scattering probability turns into a scatter event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halting {
    /// Scatter once the accumulated probability reaches 1. Every ray
    /// scatters at the same depth for a given density profile.
    Deterministic,
    /// Scatter when a uniform draw falls below the per-step probability.
    Stochastic,
}

/// Rectangular volumetric medium with a cell grid of scattering density.
///
/// Two density regimes, chosen by `mean_free_path`:
/// - finite mean free path `L`: per-step scattering probability `ds / L`,
///   and a residual fraction `max(0, 1 - L * density)` of the intensity
///   keeps travelling straight through each scatter event;
/// - no mean free path: per-step probability `ds * density`, nothing
///   transmitted past a scatter event.
pub struct Fog {
    /// Lower-left corner of the rectangle.
    pub min: Vec2,
    /// Extent of the rectangle.
    pub size: Vec2,
    /// Cell counts along x and y.
    pub cells: (usize, usize),
    density: Box<dyn Fn(i32, i32) -> f32 + Send + Sync>,
    directivity: Box<dyn Fn(f32, f32) -> f32 + Send + Sync>,
    /// Mean free path of the medium, selecting the density regime.
    pub mean_free_path: Option<f32>,
    /// Scatter-event policy.
    pub halting: Halting,
    /// Mean number of secondary rays per unit of scattered intensity.
    pub rays_per_intensity: f32,
    /// Rays dimmer than this pass through without marching.
    pub intensity_cutoff: f32,
}

impl Fog {
    /// Medium over `[min, min + size]` with the given cell grid and
    /// per-cell density. Defaults: isotropic directivity, no mean free
    /// path, stochastic halting, 4 secondary rays per intensity unit,
    /// cutoff 1e-2.
    pub fn new(
        min: Vec2,
        size: Vec2,
        cells: (usize, usize),
        density: impl Fn(i32, i32) -> f32 + Send + Sync + 'static,
    ) -> Fog {
        Fog {
            min,
            size,
            cells,
            density: Box::new(density),
            directivity: Box::new(|_, _| 1.0),
            mean_free_path: None,
            halting: Halting::Stochastic,
            rays_per_intensity: 4.0,
            intensity_cutoff: 1e-2,
        }
    }

    /// Medium of uniform density.
    pub fn uniform(min: Vec2, size: Vec2, cells: (usize, usize), density: f32) -> Fog {
        Fog::new(min, size, cells, move |_, _| density)
    }

    /// Angular directivity of scattered rays, as a function of the
    /// relative scatter angle and the wavelength.
    pub fn with_directivity(
        mut self,
        directivity: impl Fn(f32, f32) -> f32 + Send + Sync + 'static,
    ) -> Fog {
        self.directivity = Box::new(directivity);
        self
    }

    /// Switch to the finite mean-free-path regime.
    pub fn with_mean_free_path(mut self, l: f32) -> Fog {
        self.mean_free_path = Some(l);
        self
    }

    /// Scatter-event policy.
    pub fn with_halting(mut self, halting: Halting) -> Fog {
        self.halting = halting;
        self
    }

    /// Mean number of secondary rays per unit of scattered intensity.
    pub fn with_rays_per_intensity(mut self, rpi: f32) -> Fog {
        self.rays_per_intensity = rpi;
        self
    }

    fn cell_size(&self) -> Vec2 {
        Vec2::new(
            self.size.x / self.cells.0 as f32,
            self.size.y / self.cells.1 as f32,
        )
    }

    /// Scattering density of one cell.
    pub fn density_at(&self, ix: i32, iy: i32) -> f32 {
        (self.density)(ix, iy)
    }

    /// Grid cell containing a point. Unclamped; points outside the
    /// rectangle map to out-of-range indices.
    pub fn cell_of(&self, point: Vec2) -> (i32, i32) {
        let rel = (point - self.min) / self.cell_size();
        (rel.x.floor() as i32, rel.y.floor() as i32)
    }

    /// Whether a cell index pair lies inside the grid.
    pub fn in_grid(&self, cell: (i32, i32)) -> bool {
        (0..self.cells.0 as i32).contains(&cell.0) && (0..self.cells.1 as i32).contains(&cell.1)
    }

    /// Distances along the ray at which the walk starts and ends, from the
    /// crossings of the bounding rectangle. One crossing means the origin
    /// is inside and the walk starts immediately.
    fn crossing_range(&self, ray: &Ray) -> Option<(f32, f32)> {
        let corners = [
            self.min,
            self.min + Vec2::new(self.size.x, 0.0),
            self.min + self.size,
            self.min + Vec2::new(0.0, self.size.y),
        ];
        let mut t_near = f32::INFINITY;
        let mut t_far = 0.0f32;
        let mut crossings = 0;
        for k in 0..4 {
            if let Some(hit) =
                segment_ray_intersection(corners[k], corners[(k + 1) % 4], ray.origin, ray.angle)
            {
                crossings += 1;
                t_near = t_near.min(hit.t);
                t_far = t_far.max(hit.t);
            }
        }
        match crossings {
            0 => None,
            1 => Some((0.0, t_far)),
            _ => Some((t_near, t_far)),
        }
    }

    /// Walk the ray through the medium; a scatter event yields a hit at
    /// the event point, reaching the far boundary yields none.
    pub fn test_intercept<R: Rng>(&self, ray: &Ray, rng: &mut R) -> Option<Hit> {
        if ray.spectrum.total_intensity() < self.intensity_cutoff {
            return None;
        }
        let (s_start, s_end) = self.crossing_range(ray)?;
        let cell_size = self.cell_size();
        let ds = cell_size.x.min(cell_size.y) / 2.0;
        let dir = ray.direction();
        let mut s = s_start;
        let mut proba_acc = 0.0f32;
        while s < s_end {
            let cell = self.cell_of(ray.origin + s * dir);
            // Border samples can land just outside the grid; they carry no
            // density and accrue no probability.
            if !self.in_grid(cell) {
                s += ds;
                continue;
            }
            let d = (self.density)(cell.0, cell.1);
            let (proba, transmitted) = match self.mean_free_path {
                Some(l) => (ds / l, (1.0 - l * d).max(0.0)),
                None => (ds * d, 0.0),
            };
            let halt = match self.halting {
                Halting::Deterministic => {
                    proba_acc += proba;
                    proba_acc >= 1.0
                }
                Halting::Stochastic => rng.random::<f32>() < proba,
            };
            if halt {
                let s_hit = s + ds;
                let point = ray.origin + s_hit * dir;
                return Some(Hit {
                    dist_sq: s_hit * s_hit,
                    intercept: Intercept::Scatter(ScatterHit {
                        point,
                        cell: self.cell_of(point),
                        transmitted,
                    }),
                });
            }
            s += ds;
        }
        None
    }

    /// Re-emit a scattered ray: an attenuated passthrough ray when the
    /// transmitted fraction is non-negligible, plus directivity-weighted
    /// secondaries at uniform random angles.
    pub fn re_emit<R: Rng>(&self, ray: &Ray, hit: &ScatterHit, rng: &mut R) -> Emission {
        let fraction = hit.transmitted;
        let n = (self.rays_per_intensity * ray.spectrum.total_intensity() * (1.0 - fraction))
            .round()
            .max(1.0) as usize;
        let mut fact = 1.0 / n as f32;
        let mut out = Emission::new();
        if fraction > 0.01 {
            let mut through = Ray::new(hit.point, ray.angle, ray.spectrum);
            through.spectrum.scale(fraction);
            out.push(through);
            fact *= 1.0 - fraction;
        }
        for _ in 0..n {
            let relative = TAU * rng.random::<f32>();
            let mut child = Ray::new(hit.point, ray.angle + relative, ray.spectrum);
            child.spectrum.for_each_mut(|lambda, _, intensity| {
                *intensity *= (self.directivity)(relative, lambda) * fact;
            });
            out.push(child);
        }
        out
    }

    /// Bounding disk of the rectangle.
    pub fn extension(&self) -> Extension {
        Extension {
            pos: self.min + self.size / 2.0,
            radius: self.size.length() / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::Spectrum;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(11)
    }

    // 2x2 box at the origin, 2x2 cells, so the step is 0.5.
    fn unit_box(density: f32) -> Fog {
        Fog::uniform(Vec2::ZERO, Vec2::new(2.0, 2.0), (2, 2), density)
    }

    #[test]
    fn ray_missing_the_box_is_not_intercepted() {
        let fog = unit_box(10.0).with_halting(Halting::Deterministic);
        let ray = Ray::new(Vec2::new(-1.0, 5.0), 0.0, Spectrum::white());
        assert!(fog.test_intercept(&ray, &mut rng()).is_none());
    }

    #[test]
    fn dim_ray_passes_without_marching() {
        let fog = unit_box(1e6).with_halting(Halting::Deterministic);
        let mut dim = Spectrum::white();
        dim.scale(1e-4);
        let ray = Ray::new(Vec2::new(-1.0, 1.0), 0.0, dim);
        assert!(fog.test_intercept(&ray, &mut rng()).is_none());
    }

    #[test]
    fn zero_density_reaches_the_far_boundary() {
        let fog = unit_box(0.0);
        let ray = Ray::new(Vec2::new(-1.0, 1.0), 0.0, Spectrum::white());
        assert!(fog.test_intercept(&ray, &mut rng()).is_none());
    }

    #[test]
    fn border_ray_passes_without_sampling_cells() {
        // A ray grazing the top border maps to iy == 2, outside the grid;
        // it accrues no probability and the density is never consulted
        // out of range.
        let fog = Fog::new(Vec2::ZERO, Vec2::new(2.0, 2.0), (2, 2), |ix, iy| {
            assert!(
                (0..2).contains(&ix) && (0..2).contains(&iy),
                "density sampled at ({}, {})",
                ix,
                iy
            );
            1e6
        })
        .with_halting(Halting::Deterministic);
        let ray = Ray::new(Vec2::new(-1.0, 2.0), 0.0, Spectrum::white());
        assert!(fog.test_intercept(&ray, &mut rng()).is_none());
    }

    #[test]
    fn march_samples_only_in_grid_cells() {
        let fog = Fog::new(Vec2::ZERO, Vec2::new(2.0, 2.0), (2, 2), |ix, iy| {
            assert!(
                (0..2).contains(&ix) && (0..2).contains(&iy),
                "density sampled at ({}, {})",
                ix,
                iy
            );
            1e6
        })
        .with_halting(Halting::Deterministic);
        let ray = Ray::new(Vec2::new(-1.0, 1.0), 0.0, Spectrum::white());
        let hit = fog.test_intercept(&ray, &mut rng()).unwrap();
        assert!((hit.intercept.point() - Vec2::new(0.5, 1.0)).length() < 1e-4);
    }

    #[test]
    fn deterministic_walk_scatters_one_step_past_entry() {
        // ds / L = 0.5 / 0.25 = 2, so the first step already accumulates
        // past 1 and the event lands one step after the entry point.
        let fog = unit_box(1.0)
            .with_mean_free_path(0.25)
            .with_halting(Halting::Deterministic);
        let ray = Ray::new(Vec2::new(-1.0, 1.0), 0.0, Spectrum::white());
        let hit = fog.test_intercept(&ray, &mut rng()).unwrap();
        let scatter = match hit.intercept {
            Intercept::Scatter(s) => s,
            _ => unreachable!(),
        };
        assert!((scatter.point - Vec2::new(0.5, 1.0)).length() < 1e-4);
        assert!((hit.dist_sq - 2.25).abs() < 1e-4);
        assert_eq!(scatter.cell, (0, 1));
        // Residual fraction 1 - L * density.
        assert!((scatter.transmitted - 0.75).abs() < 1e-5);
    }

    #[test]
    fn origin_inside_walks_from_the_origin() {
        let fog = unit_box(1.0)
            .with_mean_free_path(0.25)
            .with_halting(Halting::Deterministic);
        let ray = Ray::new(Vec2::new(1.0, 1.0), 0.0, Spectrum::white());
        let hit = fog.test_intercept(&ray, &mut rng()).unwrap();
        assert!((hit.dist_sq - 0.25).abs() < 1e-5);
        assert!((hit.intercept.point() - Vec2::new(1.5, 1.0)).length() < 1e-4);
    }

    #[test]
    fn probabilistic_regime_transmits_nothing() {
        // Without a mean free path the per-step probability is ds * density
        // and a scatter event swallows the whole ray.
        let fog = unit_box(10.0).with_halting(Halting::Deterministic);
        let ray = Ray::new(Vec2::new(-1.0, 1.0), 0.0, Spectrum::white());
        let hit = fog.test_intercept(&ray, &mut rng()).unwrap();
        match hit.intercept {
            Intercept::Scatter(s) => assert_eq!(s.transmitted, 0.0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn re_emit_conserves_energy_without_transmission() {
        let fog = unit_box(1.0).with_rays_per_intensity(8.0);
        let ray = Ray::new(
            Vec2::new(0.5, 0.5),
            0.3,
            Spectrum::polychromatic([1.0; 4], None),
        );
        let scatter = ScatterHit {
            point: Vec2::new(1.0, 0.8),
            cell: (1, 0),
            transmitted: 0.0,
        };
        let out = fog.re_emit(&ray, &scatter, &mut rng());
        assert_eq!(out.len(), 8);
        let total: f32 = out.iter().map(|r| r.spectrum.total_intensity()).sum();
        assert!((total - 1.0).abs() < 1e-4);
        for child in &out {
            assert_eq!(child.origin, scatter.point);
        }
    }

    #[test]
    fn re_emit_splits_between_passthrough_and_secondaries() {
        let fog = unit_box(1.0)
            .with_mean_free_path(0.5)
            .with_rays_per_intensity(8.0);
        let ray = Ray::new(
            Vec2::new(0.5, 0.5),
            0.0,
            Spectrum::polychromatic([1.0; 4], None),
        );
        let scatter = ScatterHit {
            point: Vec2::new(1.0, 0.5),
            cell: (1, 0),
            transmitted: 0.5,
        };
        let out = fog.re_emit(&ray, &scatter, &mut rng());
        // First ray is the passthrough, same direction, half the intensity.
        assert_eq!(out[0].angle, ray.angle);
        assert!((out[0].spectrum.total_intensity() - 0.5).abs() < 1e-5);
        // Secondaries carry the scattered half: N = rpi * I * (1 - f) = 4.
        assert_eq!(out.len(), 1 + 4);
        let scattered: f32 = out[1..].iter().map(|r| r.spectrum.total_intensity()).sum();
        assert!((scattered - 0.5).abs() < 1e-4);
    }

    #[test]
    fn directivity_weights_secondaries() {
        let fog = unit_box(1.0)
            .with_rays_per_intensity(1.0)
            .with_directivity(|_, _| 0.25);
        let ray = Ray::new(Vec2::new(0.5, 0.5), 0.0, Spectrum::white());
        let scatter = ScatterHit {
            point: Vec2::new(1.0, 0.5),
            cell: (1, 0),
            transmitted: 0.0,
        };
        let out = fog.re_emit(&ray, &scatter, &mut rng());
        assert_eq!(out.len(), 1);
        let expected = ray.spectrum.total_intensity() * 0.25;
        assert!((out[0].spectrum.total_intensity() - expected).abs() < 1e-5);
    }

    #[test]
    fn extension_covers_the_rectangle() {
        let fog = unit_box(1.0);
        let ext = fog.extension();
        assert!((ext.pos - Vec2::new(1.0, 1.0)).length() < 1e-6);
        for corner in [Vec2::ZERO, Vec2::new(2.0, 2.0), Vec2::new(0.0, 2.0)] {
            assert!((corner - ext.pos).length() <= ext.radius + 1e-6);
        }
    }
}
