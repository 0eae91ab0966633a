//! Scene assembly and recursive ray propagation.

use glam::Vec2;
use log::debug;
use rand::Rng;

use crate::object::{Hit, SceneObject};
use crate::ray::Ray;
use crate::source::Source;
use crate::surface::{EnergyMeter, Optic, Screen};

/// Counters of one propagation pass. Read-only between passes; reset at
/// the start of the next one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassStats {
    /// Primary rays emitted by the sources.
    pub emitted: u64,
    /// Rays actually propagated (primaries and children).
    pub traced: u64,
    /// Rays dropped because the recursion depth limit was reached.
    pub truncated: u64,
    /// Child rays dropped below the intensity cutoff.
    pub discarded: u64,
    /// Rays that left the scene without hitting anything.
    pub escaped: u64,
    /// Rays absorbed by an object (no re-emission).
    pub absorbed: u64,
    /// Sum of recursion depths over all propagated rays.
    pub depth_sum: u64,
}

impl PassStats {
    /// Mean recursion depth of the pass.
    pub fn mean_depth(&self) -> f32 {
        self.depth_sum as f32 / self.traced.max(1) as f32
    }
}

/// A scene: objects, sources, and the propagation engine over them.
///
/// Interception is a linear scan keeping the closest hit; there is no
/// spatial acceleration structure, scenes are expected to hold tens of
/// objects.
pub struct Scene {
    /// Objects of the scene.
    pub objects: Vec<SceneObject>,
    /// Primary-ray emitters.
    pub sources: Vec<Source>,
    /// Child rays dimmer than this are not propagated.
    pub intensity_cutoff: f32,
    /// Recursion depth limit.
    pub max_depth: u16,
    stats: PassStats,
}

impl Default for Scene {
    fn default() -> Scene {
        Scene::new()
    }
}

impl Scene {
    /// Empty scene with default cutoff (1e-2) and depth limit (20).
    pub fn new() -> Scene {
        Scene {
            objects: Vec::new(),
            sources: Vec::new(),
            intensity_cutoff: 1e-2,
            max_depth: 20,
            stats: PassStats::default(),
        }
    }

    /// Add an object.
    pub fn add_object(&mut self, object: impl Into<SceneObject>) {
        self.objects.push(object.into());
    }

    /// Add a source.
    pub fn add_source(&mut self, source: Source) {
        self.sources.push(source);
    }

    /// Counters of the last pass.
    pub fn stats(&self) -> &PassStats {
        &self.stats
    }

    /// Read access to every screen in the scene.
    pub fn screens(&self) -> impl Iterator<Item = &Screen> + '_ {
        self.objects
            .iter()
            .filter_map(|o| o.as_optic().and_then(Optic::as_screen))
    }

    /// Read access to every fog volume in the scene.
    pub fn fogs(&self) -> impl Iterator<Item = &crate::fog::Fog> + '_ {
        self.objects.iter().filter_map(SceneObject::as_fog)
    }

    /// Read access to every energy meter in the scene.
    pub fn energy_meters(&self) -> impl Iterator<Item = &EnergyMeter> + '_ {
        self.objects
            .iter()
            .filter_map(|o| o.as_optic().and_then(Optic::as_energy_meter))
    }

    /// Close one pass on every accumulating object (screens, meters).
    pub fn commit_accumulators(&mut self) {
        for object in &mut self.objects {
            if let Some(optic) = object.as_optic_mut() {
                if let Some(screen) = optic.as_screen_mut() {
                    screen.commit();
                } else if let Some(meter) = optic.as_energy_meter_mut() {
                    meter.commit();
                }
            }
        }
    }

    /// Clear every accumulating object.
    pub fn reset_accumulators(&mut self) {
        for object in &mut self.objects {
            if let Some(optic) = object.as_optic_mut() {
                if let Some(screen) = optic.as_screen_mut() {
                    screen.reset();
                } else if let Some(meter) = optic.as_energy_meter_mut() {
                    meter.reset();
                }
            }
        }
    }

    /// Run one pass: reset the counters, emit every source, propagate
    /// every primary ray.
    pub fn run_pass<R: Rng>(&mut self, rng: &mut R) {
        self.run_pass_observed(rng, |_, _, _| {});
    }

    /// Same as [`run_pass`](Scene::run_pass), reporting every propagated
    /// ray with its interception point (`None` when it escapes) and its
    /// recursion depth, for external drawing.
    pub fn run_pass_observed<R: Rng>(
        &mut self,
        rng: &mut R,
        mut observer: impl FnMut(&Ray, Option<Vec2>, u16),
    ) {
        self.stats = PassStats::default();
        let mut primaries = Vec::new();
        for source in &self.sources {
            primaries.extend(source.emit(rng));
        }
        self.stats.emitted = primaries.len() as u64;
        for ray in &primaries {
            self.propagate(ray, 0, rng, &mut observer);
        }
        debug!(
            "pass done: {} emitted, {} traced, mean depth {:.2}, {} truncated, {} discarded",
            self.stats.emitted,
            self.stats.traced,
            self.stats.mean_depth(),
            self.stats.truncated,
            self.stats.discarded,
        );
    }

    /// Recursive propagation of one ray.
    fn propagate<R: Rng>(
        &mut self,
        ray: &Ray,
        depth: u16,
        rng: &mut R,
        observer: &mut impl FnMut(&Ray, Option<Vec2>, u16),
    ) {
        self.stats.depth_sum += depth as u64;
        if depth >= self.max_depth {
            self.stats.truncated += 1;
            return;
        }
        self.stats.traced += 1;

        let mut nearest: Option<(usize, Hit)> = None;
        for (index, object) in self.objects.iter().enumerate() {
            if let Some(hit) = object.test_intercept(ray, rng) {
                if nearest.as_ref().map_or(true, |(_, n)| hit.dist_sq < n.dist_sq) {
                    nearest = Some((index, hit));
                }
            }
        }
        let Some((index, hit)) = nearest else {
            observer(ray, None, depth);
            self.stats.escaped += 1;
            return;
        };
        observer(ray, Some(hit.intercept.point()), depth);

        let children = self.objects[index].re_emit(ray, &hit.intercept, rng);
        if children.is_empty() {
            self.stats.absorbed += 1;
            return;
        }
        for child in &children {
            if child.spectrum.total_intensity() < self.intensity_cutoff {
                self.stats.discarded += 1;
            } else {
                self.propagate(child, depth + 1, rng, observer);
            }
        }
    }
}
