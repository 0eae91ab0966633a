//! Interaction surfaces for curve objects.
//!
//! A [`Surface`] is the interchangeable behavior paired with a
//! [`Geometry`]: it decides what happens to an intercepted ray. Physical
//! laws implemented here: specular reflection, Snell-Descartes refraction
//! with Fresnel power splitting (and per-band dispersion), BRDF diffusion,
//! band-wise filtering, the paraxial ABCD transfer, absorption, and the
//! two accumulating surfaces (energy meter, screen).

use glam::Vec2;
use rand::Rng;
use smallvec::smallvec;
use std::f32::consts::{FRAC_PI_2, PI};

use crate::curve::{Arc, Geometry, Line};
use crate::error::BuildError;
use crate::geometry::AngleInterval;
use crate::object::{CurveDetail, CurveHit, Emission, Extension, Hit, Intercept};
use crate::ray::Ray;
use crate::spectrum::{component_layout, Polarization, Spectrum, BAND_WAVELENGTHS, N_BANDS};

/// Refractive index of a dielectric medium.
pub enum RefractiveIndex {
    /// Wavelength-independent index: one reflected/refracted ray pair.
    Fixed(f32),
    /// Wavelength-dependent index n(λ). Costs one monochromatic sub-ray
    /// pair per band, since each band refracts at its own angle.
    PerWavelength(Box<dyn Fn(f32) -> f32 + Send + Sync>),
}

/// Dielectric interface between vacuum (n = 1) and a medium.
///
/// The index is real: no absorption, no metallic behavior.
pub struct Dielectric {
    /// Refractive index of the interior medium.
    pub index: RefractiveIndex,
}

impl Dielectric {
    /// Split the incident ray into a reflected and (below the critical
    /// angle) a transmitted ray, for one index value.
    fn refract_split(hit: &CurveHit, mut reflected: Ray, n_in: f32, out: &mut Emission) {
        let n_out = 1.0;
        // n1/n2 seen by the ray, depending on which face it arrives on.
        let gamma = if hit.forward { n_out / n_in } else { n_in / n_out };
        let s = gamma * hit.incidence.sin();
        if s.abs() <= 1.0 {
            let mut transmitted = Ray::new(
                hit.point,
                (hit.normal_angle + PI) + s.asin(),
                reflected.spectrum,
            );
            // Fresnel amplitude coefficients per polarization.
            let b = (1.0 - s * s).sqrt();
            let cos_i = hit.incidence.cos();
            let a_te = gamma * cos_i;
            let a_tm = cos_i / gamma;
            let r_te = (a_te - b) / (a_te + b);
            let r_tm = (a_tm - b) / (a_tm + b);
            for i in 0..reflected.spectrum.comps.len() {
                let (_, _, pol) = component_layout(i);
                let r = match pol {
                    Polarization::Te => r_te,
                    Polarization::Tm => r_tm,
                };
                let reflectance = r * r;
                transmitted.spectrum.comps[i] = (1.0 - reflectance) * reflected.spectrum.comps[i];
                reflected.spectrum.comps[i] *= reflectance;
            }
            out.push(transmitted);
        }
        // Beyond the critical angle only the reflected ray survives, and it
        // still carries the full incident spectrum.
        out.push(reflected);
    }

    fn re_emit(&self, ray: &Ray, hit: &CurveHit) -> Emission {
        let mut out = Emission::new();
        let reflected = Ray::new(hit.point, hit.normal_angle - hit.incidence, ray.spectrum);
        match &self.index {
            RefractiveIndex::Fixed(n) => Self::refract_split(hit, reflected, *n, &mut out),
            RefractiveIndex::PerWavelength(n_of) => {
                // Dispersion: refraction angles differ per band, so the
                // spectrum is split into monochromatic sub-rays.
                for band in 0..N_BANDS {
                    let mut mono = reflected.clone();
                    mono.spectrum.isolate_band(band);
                    Self::refract_split(hit, mono, n_of(BAND_WAVELENGTHS[band]), &mut out);
                }
            }
        }
        out
    }
}

/// How a diffuser draws its reflection angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffusionSampling {
    /// Uniform random angles over ±90° from the normal, BRDF-weighted.
    UniformRandom,
    /// Deterministic equi-spaced angles over the same range, BRDF-weighted.
    EquiSpaced,
    /// Constant-intensity rays distributed per the BRDF (Metropolis).
    /// Declared but not implemented; selecting it is a hard failure.
    Metropolis,
}

/// Bidirectional reflectance distribution function.
pub enum Brdf {
    /// Reflectance weight from (incidence angle, reflection angle).
    Angular(Box<dyn Fn(f32, f32) -> f32 + Send + Sync>),
    /// Wavelength-dependent variant: (incidence, reflection, λ).
    Spectral(Box<dyn Fn(f32, f32, f32) -> f32 + Send + Sync>),
}

impl Brdf {
    /// Lambertian diffusion: isotropic, constant weight.
    pub fn lambertian() -> Brdf {
        Brdf::Angular(Box::new(|_, _| 1.0))
    }
}

/// Diffusing surface with an arbitrary BRDF.
pub struct Diffuser {
    /// Reflectance distribution weighting each child ray.
    pub brdf: Brdf,
    /// Overall intensity factor in [0, 1].
    pub albedo: f32,
    /// Mean number of re-emitted rays per unit of incident intensity.
    /// Should be large when `EquiSpaced` sampling is used.
    pub rays_per_intensity: f32,
    /// Angle sampling method.
    pub sampling: DiffusionSampling,
}

impl Diffuser {
    /// Lambertian diffuser with the given albedo.
    pub fn lambertian(albedo: f32, rays_per_intensity: f32) -> Diffuser {
        Diffuser {
            brdf: Brdf::lambertian(),
            albedo,
            rays_per_intensity,
            sampling: DiffusionSampling::UniformRandom,
        }
    }

    fn re_emit<R: Rng>(&self, ray: &Ray, hit: &CurveHit, rng: &mut R) -> Emission {
        let n = (self.rays_per_intensity * ray.spectrum.total_intensity())
            .round()
            .max(1.0) as usize;
        let mut out = Emission::new();
        for k in 0..n {
            let reflection = match self.sampling {
                DiffusionSampling::UniformRandom => FRAC_PI_2 * (1.0 - 2.0 * rng.random::<f32>()),
                DiffusionSampling::EquiSpaced => {
                    FRAC_PI_2 * (1.0 - 2.0 * (k + 1) as f32 / (n + 1) as f32)
                }
                DiffusionSampling::Metropolis => {
                    unimplemented!("Metropolis-sampled diffusion is not implemented")
                }
            };
            let mut child = Ray::new(hit.point, hit.normal_angle + reflection, ray.spectrum);
            let base = self.albedo / n as f32;
            match &self.brdf {
                Brdf::Angular(f) => child.spectrum.scale(base * f(hit.incidence, reflection)),
                Brdf::Spectral(f) => child.spectrum.for_each_mut(|lambda, _, intensity| {
                    *intensity *= base * f(hit.incidence, reflection, lambda);
                }),
            }
            out.push(child);
        }
        out
    }
}

/// Paraxial ray-transfer (ABCD) matrix acting on (height, slope).
#[derive(Debug, Clone, Copy)]
pub struct TransferMatrix {
    /// Matrix entries, row-major.
    pub a: f32,
    /// See `a`.
    pub b: f32,
    /// See `a`.
    pub c: f32,
    /// See `a`.
    pub d: f32,
}

impl TransferMatrix {
    /// Thin lens of focal length `f`.
    pub fn lens(f: f32) -> TransferMatrix {
        TransferMatrix {
            a: 1.0,
            b: 0.0,
            c: -1.0 / f,
            d: 1.0,
        }
    }

    /// Free propagation over length `l`.
    pub fn free_propagation(l: f32) -> TransferMatrix {
        TransferMatrix {
            a: 1.0,
            b: l,
            c: 0.0,
            d: 1.0,
        }
    }
}

/// Running energy balance of a meter surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyBalance {
    /// Mean incoming intensity per committed pass.
    pub flux_in: f32,
    /// Mean outgoing intensity per committed pass.
    pub flux_out: f32,
    /// Mean incoming ray count per committed pass.
    pub rays_in: f32,
    /// Mean outgoing ray count per committed pass.
    pub rays_out: f32,
}

/// Pass-through surface accumulating incoming vs outgoing flux, keyed by
/// the intercept orientation flag. Useful to check that an enclosed object
/// conserves energy.
#[derive(Debug, Clone, Default)]
pub struct EnergyMeter {
    flux_in: f32,
    flux_out: f32,
    rays_in: u64,
    rays_out: u64,
    frames: u64,
}

impl EnergyMeter {
    /// Record one ray crossing, inward when `forward`.
    fn record(&mut self, forward: bool, intensity: f32) {
        if forward {
            self.rays_in += 1;
            self.flux_in += intensity;
        } else {
            self.rays_out += 1;
            self.flux_out += intensity;
        }
    }

    /// Close one propagation pass, for averaging across passes.
    pub fn commit(&mut self) {
        self.frames += 1;
    }

    /// Clear all totals.
    pub fn reset(&mut self) {
        *self = EnergyMeter::default();
    }

    /// Per-pass averaged balance.
    pub fn balance(&self) -> EnergyBalance {
        let frames = self.frames.max(1) as f32;
        EnergyBalance {
            flux_in: self.flux_in / frames,
            flux_out: self.flux_out / frames,
            rays_in: self.rays_in as f32 / frames,
            rays_out: self.rays_out as f32 / frames,
        }
    }
}

/// One processed screen pixel.
#[derive(Debug, Clone)]
pub struct ScreenPixel {
    /// Abscissa of the start of the pixel, in [0, 1] along the screen.
    pub s_start: f32,
    /// Abscissa of the middle of the pixel.
    pub s_mid: f32,
    /// Abscissa of the end of the pixel.
    pub s_end: f32,
    /// Display color.
    pub rgb: [u8; 3],
    /// Saturation flag.
    pub saturated: bool,
    /// Brightness-scaled accumulated spectrum.
    pub spectrum: Spectrum,
}

/// Absorbing screen: a 1-D pixel row accumulating incident spectra ("CCD").
#[derive(Debug, Clone)]
pub struct Screen {
    bins: Vec<Spectrum>,
    frames: u64,
    /// Conversion factor from physical intensity to display intensity.
    pub brightness: f32,
}

impl Screen {
    /// Screen with `n_bins` pixels (at least one).
    pub fn new(n_bins: usize, brightness: f32) -> Screen {
        Screen {
            bins: vec![Spectrum::ZERO; n_bins.max(1)],
            frames: 0,
            brightness,
        }
    }

    /// Number of pixels.
    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// Raw accumulated spectrum of one bin.
    pub fn bin(&self, k: usize) -> &Spectrum {
        &self.bins[k]
    }

    /// Number of committed passes.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn accumulate(&mut self, s: f32, spectrum: &Spectrum) {
        let n = self.bins.len();
        let k = ((s * n as f32).floor() as isize).clamp(0, n as isize - 1) as usize;
        for (acc, c) in self.bins[k].comps.iter_mut().zip(&spectrum.comps) {
            *acc += c;
        }
    }

    /// Close one propagation pass, for averaging across passes.
    pub fn commit(&mut self) {
        self.frames += 1;
    }

    /// Zero every bin and the committed-pass counter.
    pub fn reset(&mut self) {
        self.frames = 0;
        for bin in &mut self.bins {
            *bin = Spectrum::ZERO;
        }
    }

    /// Processed pixel row for a screen of physical length `length`.
    ///
    /// Each bin accumulates power proportional to its physical size, so the
    /// displayed intensity divides by the per-pixel length (and by the
    /// number of committed passes).
    pub fn pixels(&self, length: f32) -> Vec<ScreenPixel> {
        let n = self.bins.len();
        let to_display = self.brightness / self.frames.max(1) as f32 * n as f32 / length;
        self.bins
            .iter()
            .enumerate()
            .map(|(k, bin)| {
                let mut spectrum = *bin;
                spectrum.scale(to_display);
                let (rgb, saturated) = spectrum.to_rgb(false, None);
                let s_start = k as f32 / n as f32;
                let s_end = (k + 1) as f32 / n as f32;
                ScreenPixel {
                    s_start,
                    s_mid: (s_start + s_end) / 2.0,
                    s_end,
                    rgb,
                    saturated,
                    spectrum,
                }
            })
            .collect()
    }
}

/// Interaction behavior of a curve object.
pub enum Surface {
    /// Perfect specular reflection.
    Mirror,
    /// Vacuum/medium dielectric interface (Snell + Fresnel).
    Dielectric(Dielectric),
    /// BRDF diffusion.
    Diffuser(Diffuser),
    /// Band-wise transmission filter (color filter, polarizer, ...).
    Filter {
        /// Per-component transmission, each in [0, 1].
        transmission: Spectrum,
    },
    /// Unidirectional paraxial element; reverse-side rays are dropped.
    Abcd {
        /// Ray-transfer matrix.
        matrix: TransferMatrix,
    },
    /// Absorbs every intercepted ray.
    Blocker,
    /// Pass-through flux accounting.
    EnergyMeter(EnergyMeter),
    /// Absorbing pixel row.
    Screen(Screen),
}

impl Surface {
    fn name(&self) -> &'static str {
        match self {
            Surface::Mirror => "mirror",
            Surface::Dielectric(_) => "dielectric",
            Surface::Diffuser(_) => "diffuser",
            Surface::Filter { .. } => "filter",
            Surface::Abcd { .. } => "ABCD",
            Surface::Blocker => "blocker",
            Surface::EnergyMeter(_) => "energy meter",
            Surface::Screen(_) => "screen",
        }
    }
}

/// A curve object of the scene: a geometry paired with an interaction
/// surface by composition. Geometry and surface are freely mixable, except
/// that the ABCD element and the screen require a line.
pub struct Optic {
    /// Shape of the object.
    pub geometry: Geometry,
    /// Interaction behavior.
    pub surface: Surface,
}

impl Optic {
    /// Pair a geometry with a surface, validating the combination.
    pub fn new(geometry: Geometry, surface: Surface) -> Result<Optic, BuildError> {
        match surface {
            Surface::Abcd { .. } | Surface::Screen(_) if geometry.as_line().is_none() => {
                Err(BuildError::LineRequired(surface.name()))
            }
            _ => Ok(Optic { geometry, surface }),
        }
    }

    /// Flat mirror between two points.
    pub fn mirror_line(a: Vec2, b: Vec2) -> Optic {
        Optic {
            geometry: Geometry::Line(Line::new(a, b)),
            surface: Surface::Mirror,
        }
    }

    /// Screen between two points with `n_bins` pixels.
    pub fn screen(a: Vec2, b: Vec2, n_bins: usize, brightness: f32) -> Optic {
        Optic {
            geometry: Geometry::Line(Line::new(a, b)),
            surface: Surface::Screen(Screen::new(n_bins, brightness)),
        }
    }

    /// Unidirectional ABCD element from its optical center, diameter and
    /// tilt from the vertical. Forward side faces +x when the tilt is small.
    pub fn abcd_element(center: Vec2, diameter: f32, tilt: f32, matrix: TransferMatrix) -> Optic {
        let v = diameter / 2.0 * Vec2::new(-tilt.sin(), tilt.cos());
        Optic {
            geometry: Geometry::Line(Line::new(center + v, center - v)),
            surface: Surface::Abcd { matrix },
        }
    }

    /// Energy meter on a full circle.
    pub fn energy_meter(center: Vec2, radius: f32) -> Optic {
        Optic {
            geometry: Geometry::Arc(Arc::new(center, radius, AngleInterval::FULL_CIRCLE, false)),
            surface: Surface::EnergyMeter(EnergyMeter::default()),
        }
    }

    /// Interception test against the geometry.
    pub fn test_intercept(&self, ray: &Ray) -> Option<Hit> {
        let hit = self.geometry.intercept(ray)?;
        Some(Hit {
            dist_sq: (ray.origin - hit.point).length_squared(),
            intercept: Intercept::Curve(hit),
        })
    }

    /// Re-emission of an intercepted ray according to the surface.
    pub fn re_emit<R: Rng>(&mut self, ray: &Ray, hit: &CurveHit, rng: &mut R) -> Emission {
        match &mut self.surface {
            Surface::Mirror => {
                // Reflected angle equals the incidence angle, on the other
                // side of the normal.
                smallvec![Ray::new(
                    hit.point,
                    hit.normal_angle - hit.incidence,
                    ray.spectrum,
                )]
            }
            Surface::Dielectric(dielectric) => dielectric.re_emit(ray, hit),
            Surface::Diffuser(diffuser) => diffuser.re_emit(ray, hit, rng),
            Surface::Filter { transmission } => {
                let mut filtered = Ray::new(hit.point, ray.angle, ray.spectrum);
                filtered.spectrum.attenuate(transmission);
                smallvec![filtered]
            }
            Surface::Abcd { matrix } => {
                let (Some(line), CurveDetail::Segment { s }) = (self.geometry.as_line(), &hit.detail)
                else {
                    return Emission::new();
                };
                if !hit.forward {
                    // Unidirectional: reverse-side rays are dropped.
                    return Emission::new();
                }
                let diameter = line.length();
                // Height above the optical axis (toward endpoint a) and
                // slope relative to the normal.
                let y = (s - 0.5) * diameter;
                let slope = hit.incidence.tan();
                let y_out = matrix.a * y + matrix.b * slope;
                let slope_out = matrix.c * y + matrix.d * slope;
                let origin = line.midpoint() + y_out * (line.a - line.b) / diameter;
                smallvec![Ray::new(origin, slope_out.atan(), ray.spectrum)]
            }
            Surface::Blocker => Emission::new(),
            Surface::EnergyMeter(meter) => {
                meter.record(hit.forward, ray.spectrum.total_intensity());
                smallvec![Ray::new(hit.point, ray.angle, ray.spectrum)]
            }
            Surface::Screen(screen) => {
                if let CurveDetail::Segment { s } = hit.detail {
                    screen.accumulate(s, &ray.spectrum);
                }
                Emission::new()
            }
        }
    }

    /// Bounding extension of the geometry.
    pub fn extension(&self) -> Extension {
        self.geometry.extension()
    }

    /// The screen behind this optic, if any.
    pub fn as_screen(&self) -> Option<&Screen> {
        match &self.surface {
            Surface::Screen(screen) => Some(screen),
            _ => None,
        }
    }

    /// Mutable screen access, if any.
    pub fn as_screen_mut(&mut self) -> Option<&mut Screen> {
        match &mut self.surface {
            Surface::Screen(screen) => Some(screen),
            _ => None,
        }
    }

    /// The energy meter behind this optic, if any.
    pub fn as_energy_meter(&self) -> Option<&EnergyMeter> {
        match &self.surface {
            Surface::EnergyMeter(meter) => Some(meter),
            _ => None,
        }
    }

    /// Mutable energy meter access, if any.
    pub fn as_energy_meter_mut(&mut self) -> Option<&mut EnergyMeter> {
        match &mut self.surface {
            Surface::EnergyMeter(meter) => Some(meter),
            _ => None,
        }
    }
}
