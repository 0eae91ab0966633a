//! # Render Module
//!
//! Turns accumulated screen data into image files:
//! - PNG strip export of a screen's pixel row
//! - saturation reporting for exposure tuning
//!
//! The spectral-to-RGB projection itself lives in
//! [`crate::spectrum::Spectrum::to_rgb`]; this module only lays the
//! resulting colors out as an image and handles file I/O.

use image::{ImageBuffer, Luma, Rgb};
use log::{info, warn};

use crate::fog::Fog;
use crate::surface::Screen;

/// Save a screen's accumulated pixel row as a PNG strip
///
/// The strip is `n_bins` pixels wide and `strip_height` pixels tall, every
/// row identical. Pixel colors come from the screen's brightness-scaled
/// spectra; `length` is the physical length of the screen, needed to
/// normalize per-pixel power to intensity.
///
/// Saturated pixels (any spectral component above the display range after
/// brightness scaling) are reported with a warning, as a hint to lower the
/// screen brightness.
///
/// # Errors
///
/// Logs a warning on I/O errors but does not panic.
pub fn save_screen_strip(screen: &Screen, length: f32, strip_height: u32, output_path: &str) {
    let pixels = screen.pixels(length);
    let saturated = pixels.iter().filter(|p| p.saturated).count();
    if saturated > 0 {
        warn!(
            "{} of {} screen pixels are saturated, consider lowering the brightness",
            saturated,
            pixels.len()
        );
    }

    let strip: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(pixels.len() as u32, strip_height, |x, _| {
            Rgb(pixels[x as usize].rgb)
        });
    match strip.save(output_path) {
        Ok(_) => info!("screen strip saved as {}", output_path),
        Err(e) => warn!("failed to save screen strip: {}", e),
    }
}

/// Save a fog's density grid as a grayscale PNG, one pixel per cell
///
/// Densities are normalized to the maximum cell density, so the image
/// shows the relative density profile rather than absolute values. Image
/// rows run top to bottom while grid rows run bottom to top, so the y
/// axis is flipped.
///
/// # Errors
///
/// Logs a warning on I/O errors but does not panic.
pub fn save_fog_density(fog: &Fog, output_path: &str) {
    let (nx, ny) = fog.cells;
    let mut max_density = 0.0f32;
    for iy in 0..ny {
        for ix in 0..nx {
            max_density = max_density.max(fog.density_at(ix as i32, iy as i32));
        }
    }
    if max_density <= 0.0 {
        warn!("fog density is zero everywhere, not saving a preview");
        return;
    }

    let preview: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_fn(nx as u32, ny as u32, |x, y| {
            let density = fog.density_at(x as i32, (ny as u32 - 1 - y) as i32);
            Luma([(density / max_density * 255.0).clamp(0.0, 255.0) as u8])
        });
    match preview.save(output_path) {
        Ok(_) => info!("fog density preview saved as {}", output_path),
        Err(e) => warn!("failed to save fog density preview: {}", e),
    }
}
