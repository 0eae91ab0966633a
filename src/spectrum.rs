//! Spectral data model.
//!
//! A spectrum is a fixed-length vector of intensity (or power, depending on
//! context) samples: one slot per (wavelength band, polarization) pair. The
//! band table and the TE/TM polarization tags are shared by the whole
//! system. All pairwise operations are band-wise; the only cross-band
//! reductions are total intensity and the RGB projection.

use std::sync::LazyLock;

use crate::error::BuildError;

/// Number of wavelength bands.
pub const N_BANDS: usize = 4;

/// Number of spectrum components: bands × {TE, TM}.
pub const N_COMPONENTS: usize = 2 * N_BANDS;

/// Wavelengths of the band table, in millimeters (700 nm down to 400 nm).
pub const BAND_WAVELENGTHS: [f32; N_BANDS] = [7e-4, 6e-4, 5e-4, 4e-4];

/// Polarization tag of a spectral component.
///
/// In 2-D a ray stays in the plane through every reflection and refraction,
/// so the TE/TM character is invariant; the tag never mixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarization {
    /// Transverse electric.
    Te,
    /// Transverse magnetic.
    Tm,
}

/// Band and polarization of component `i`: even components are TE,
/// component `i` belongs to band `i / 2`.
pub fn component_layout(i: usize) -> (usize, f32, Polarization) {
    let band = i / 2;
    let pol = if i % 2 == 0 {
        Polarization::Te
    } else {
        Polarization::Tm
    };
    (band, BAND_WAVELENGTHS[band], pol)
}

/// Intensity spectrum of a ray, discretized over [`N_BANDS`] wavelength
/// bands, each carrying a TE and a TM component.
///
/// Plain value type; rays own their spectrum and copy it when splitting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spectrum {
    /// Component intensities, laid out per [`component_layout`].
    pub comps: [f32; N_COMPONENTS],
}

impl Spectrum {
    /// All-zero spectrum.
    pub const ZERO: Spectrum = Spectrum {
        comps: [0.0; N_COMPONENTS],
    };

    /// Spectrum with a single lit band.
    ///
    /// `pol = None` lights both polarizations of the band. An out-of-range
    /// band index is a configuration error.
    pub fn monochromatic(
        intensity: f32,
        band: usize,
        pol: Option<Polarization>,
    ) -> Result<Spectrum, BuildError> {
        if band >= N_BANDS {
            return Err(BuildError::InvalidBand(band));
        }
        let mut sp = Spectrum::ZERO;
        for (i, c) in sp.comps.iter_mut().enumerate() {
            let (b, _, p) = component_layout(i);
            if b == band && pol.map_or(true, |sel| sel == p) {
                *c = intensity;
            }
        }
        Ok(sp)
    }

    /// Spectrum from one intensity per band, optionally restricted to a
    /// single polarization (the other polarization's components are zero).
    pub fn polychromatic(per_band: [f32; N_BANDS], pol: Option<Polarization>) -> Spectrum {
        let mut sp = Spectrum::ZERO;
        for (i, c) in sp.comps.iter_mut().enumerate() {
            let (b, _, p) = component_layout(i);
            if pol.map_or(true, |sel| sel == p) {
                *c = per_band[b];
            }
        }
        sp
    }

    /// Spectrum whose RGB projection is approximately white.
    pub fn white() -> Spectrum {
        Spectrum::polychromatic([0.8, 0.8, 1.7, 2.2], None)
    }

    /// Visit every component mutably with its wavelength and polarization.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(f32, Polarization, &mut f32)) {
        for (i, c) in self.comps.iter_mut().enumerate() {
            let (_, lambda, pol) = component_layout(i);
            f(lambda, pol, c);
        }
    }

    /// Multiply every component by `k`.
    pub fn scale(&mut self, k: f32) {
        for c in &mut self.comps {
            *c *= k;
        }
    }

    /// Band-wise product with a transmission/reflectance spectrum.
    pub fn attenuate(&mut self, factor: &Spectrum) {
        for (c, f) in self.comps.iter_mut().zip(&factor.comps) {
            *c *= f;
        }
    }

    /// Zero out every band except `band` (both polarizations kept).
    pub fn isolate_band(&mut self, band: usize) {
        for (i, c) in self.comps.iter_mut().enumerate() {
            if i / 2 != band {
                *c = 0.0;
            }
        }
    }

    /// Total intensity: mean over all components.
    pub fn total_intensity(&self) -> f32 {
        self.comps.iter().sum::<f32>() / N_COMPONENTS as f32
    }

    /// Total intensity restricted to one polarization.
    ///
    /// Still divided by the full component count, so a purely TE spectrum
    /// reports half the intensity of its unpolarized counterpart.
    pub fn total_intensity_polarized(&self, pol: Polarization) -> f32 {
        let mut total = 0.0;
        for (i, c) in self.comps.iter().enumerate() {
            let (_, _, p) = component_layout(i);
            if p == pol {
                total += c;
            }
        }
        total / N_COMPONENTS as f32
    }

    /// Project the spectrum to an RGB color for display on black, against a
    /// saturation intensity of 1.0 per component.
    ///
    /// Each component contributes its intensity weighted by its band's
    /// color-matching triple. If any channel exceeds 1.0 the color is
    /// normalized by the peak and the saturation flag is set; `chroma_only`
    /// forces the normalization regardless of intensity. Optionally
    /// restricted to one polarization.
    pub fn to_rgb(&self, chroma_only: bool, pol: Option<Polarization>) -> ([u8; 3], bool) {
        let mut acc = [0.0f32; 3];
        for (i, c) in self.comps.iter().enumerate() {
            let (_, _, p) = component_layout(i);
            if pol.map_or(false, |sel| sel != p) {
                continue;
            }
            let w = RGB_WEIGHTS[i];
            acc[0] += w[0] * c;
            acc[1] += w[1] * c;
            acc[2] += w[2] * c;
        }
        for ch in &mut acc {
            *ch /= N_COMPONENTS as f32;
        }
        let peak = acc[0].max(acc[1]).max(acc[2]);
        let saturated = peak > 1.0;
        if (saturated || chroma_only) && peak > 0.0 {
            for ch in &mut acc {
                *ch /= peak;
            }
        }
        (
            [
                (255.0 * acc[0]) as u8,
                (255.0 * acc[1]) as u8,
                (255.0 * acc[2]) as u8,
            ],
            saturated,
        )
    }
}

/// Per-component RGB weights, computed once from the band table.
static RGB_WEIGHTS: LazyLock<[[f32; 3]; N_COMPONENTS]> = LazyLock::new(|| {
    let mut w = [[0.0; 3]; N_COMPONENTS];
    for (i, entry) in w.iter_mut().enumerate() {
        let (_, lambda, _) = component_layout(i);
        let (r, g, b) = wavelength_to_rgb(lambda, 0.8);
        *entry = [r, g, b];
    }
    w
});

/// Approximate a visible wavelength by an RGB triple.
///
/// `lambda_mm` in millimeters, valid from 380 nm through 750 nm; outside
/// that range the result is black. Based on Dan Bruton's spectra code
/// (<http://www.physics.sfasu.edu/astro/color/spectra.html>).
pub fn wavelength_to_rgb(lambda_mm: f32, gamma: f32) -> (f32, f32, f32) {
    let wl = lambda_mm * 1e6; // nm
    let (mut r, mut g, mut b) = (0.0f32, 0.0f32, 0.0f32);
    if (380.0..=440.0).contains(&wl) {
        let attenuation = 0.3 + 0.7 * (wl - 380.0) / (440.0 - 380.0);
        r = ((-(wl - 440.0) / (440.0 - 380.0)) * attenuation).powf(gamma);
        b = attenuation.powf(gamma);
    } else if (440.0..=490.0).contains(&wl) {
        g = ((wl - 440.0) / (490.0 - 440.0)).powf(gamma);
        b = 1.0;
    } else if (490.0..=510.0).contains(&wl) {
        g = 1.0;
        b = (-(wl - 510.0) / (510.0 - 490.0)).powf(gamma);
    } else if (510.0..=580.0).contains(&wl) {
        r = ((wl - 510.0) / (580.0 - 510.0)).powf(gamma);
        g = 1.0;
    } else if (580.0..=645.0).contains(&wl) {
        r = 1.0;
        g = (-(wl - 645.0) / (645.0 - 580.0)).powf(gamma);
    } else if (645.0..=750.0).contains(&wl) {
        let attenuation = 0.3 + 0.7 * (750.0 - wl) / (750.0 - 645.0);
        r = attenuation.powf(gamma);
    }
    (r, g, b)
}
