//! Statistical agreement between the two fog density regimes.
//!
//! With uniform density d, the fully-probabilistic walk (per-step
//! probability ds * d) produces an exponential free path of mean 1/d,
//! while the finite-mean-free-path regime with L = 1/d and deterministic
//! halting scatters at depth L exactly. The mean first-scatter distance
//! of the two must agree, up to marching discretization and sampling
//! noise.

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use lumiray::fog::{Fog, Halting};
use lumiray::object::Intercept;
use lumiray::ray::Ray;
use lumiray::spectrum::Spectrum;

const DENSITY: f32 = 1.0;

// Long box so that truncation at the far boundary is negligible
// (e^-10 of the walks).
fn chamber() -> (Vec2, Vec2) {
    (Vec2::new(0.0, -5.0), Vec2::new(10.0, 10.0))
}

fn probe() -> Ray {
    Ray::new(Vec2::new(-1.0, 0.0), 0.0, Spectrum::white())
}

/// Mean distance from the chamber entry to the first scatter event.
fn mean_free_path(fog: &Fog, trials: u32, rng: &mut ChaCha20Rng) -> f32 {
    let mut total = 0.0;
    let mut scattered = 0u32;
    for _ in 0..trials {
        if let Some(hit) = fog.test_intercept(&probe(), rng) {
            total += hit.dist_sq.sqrt() - 1.0;
            scattered += 1;
        }
    }
    assert!(scattered > trials * 9 / 10, "too many walks escaped");
    total / scattered as f32
}

#[test]
fn both_regimes_agree_on_the_mean_free_path() {
    let (min, size) = chamber();
    let probabilistic = Fog::uniform(min, size, (100, 100), DENSITY);
    let systematic = Fog::uniform(min, size, (100, 100), DENSITY)
        .with_mean_free_path(1.0 / DENSITY)
        .with_halting(Halting::Deterministic);

    let mut rng = ChaCha20Rng::seed_from_u64(5);
    let stochastic_mean = mean_free_path(&probabilistic, 2000, &mut rng);
    let deterministic_mean = mean_free_path(&systematic, 1, &mut rng);

    let expected = 1.0 / DENSITY;
    assert!(
        (stochastic_mean - expected).abs() / expected < 0.2,
        "stochastic mean free path {} too far from {}",
        stochastic_mean,
        expected
    );
    assert!(
        (deterministic_mean - expected).abs() / expected < 0.2,
        "deterministic mean free path {} too far from {}",
        deterministic_mean,
        expected
    );
    assert!(
        (stochastic_mean - deterministic_mean).abs() / expected < 0.2,
        "regimes disagree: {} vs {}",
        stochastic_mean,
        deterministic_mean
    );
}

#[test]
fn scatter_events_report_interior_cells() {
    let (min, size) = chamber();
    let fog = Fog::uniform(min, size, (100, 100), DENSITY);
    let mut rng = ChaCha20Rng::seed_from_u64(9);
    let mut seen = 0;
    for _ in 0..200 {
        if let Some(hit) = fog.test_intercept(&probe(), &mut rng) {
            let Intercept::Scatter(scatter) = hit.intercept else {
                panic!("fog produced a curve intercept");
            };
            // The probe runs along y = 0, the 50th row of the grid.
            assert!(scatter.point.x > 0.0);
            assert_eq!(scatter.cell.1, 50);
            // No transmission in the fully-probabilistic regime.
            assert_eq!(scatter.transmitted, 0.0);
            seen += 1;
        }
    }
    assert!(seen > 150);
}
