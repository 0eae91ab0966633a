//! End-to-end propagation accounting over small wired scenes.

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use lumiray::curve::{Geometry, Line};
use lumiray::scene::Scene;
use lumiray::source::Source;
use lumiray::spectrum::Spectrum;
use lumiray::surface::{Optic, Surface};

fn rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

fn laser(origin: Vec2, angle: f32) -> Source {
    Source::SingleRay {
        position: origin,
        angle,
        spectrum: Spectrum::white(),
    }
}

#[test]
fn facing_mirrors_truncate_at_the_depth_limit() {
    let mut scene = Scene::new();
    scene.add_object(Optic::mirror_line(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0)));
    scene.add_object(Optic::mirror_line(Vec2::new(2.0, -1.0), Vec2::new(2.0, 1.0)));
    scene.add_source(laser(Vec2::new(1.0, 0.0), 0.0));

    scene.run_pass(&mut rng(1));

    let stats = scene.stats();
    assert_eq!(stats.emitted, 1);
    // One ray per depth 0..max, then the bounce at the limit is cut.
    assert_eq!(stats.traced, scene.max_depth as u64);
    assert_eq!(stats.truncated, 1);
    assert_eq!(stats.escaped, 0);
    assert_eq!(stats.absorbed, 0);
    assert_eq!(stats.discarded, 0);
}

#[test]
fn filter_cascade_discards_below_the_cutoff() {
    let mut scene = Scene::new();
    // Eight half-transmission filters; white intensity 1.375 falls below
    // the 1e-2 cutoff after the eighth.
    for k in 0..8 {
        let x = 1.0 + k as f32;
        let optic = Optic::new(
            Geometry::Line(Line::new(Vec2::new(x, -1.0), Vec2::new(x, 1.0))),
            Surface::Filter {
                transmission: Spectrum::polychromatic([0.5; 4], None),
            },
        )
        .unwrap();
        scene.add_object(optic);
    }
    scene.add_source(laser(Vec2::ZERO, 0.0));

    scene.run_pass(&mut rng(1));

    let stats = scene.stats();
    assert_eq!(stats.emitted, 1);
    assert_eq!(stats.traced, 8);
    assert_eq!(stats.discarded, 1);
    assert_eq!(stats.escaped, 0);
    assert_eq!(stats.absorbed, 0);
}

#[test]
fn energy_meter_sees_reflected_flux_leave() {
    let mut scene = Scene::new();
    scene.add_object(Optic::energy_meter(Vec2::ZERO, 2.0));
    scene.add_object(Optic::mirror_line(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0)));
    scene.add_source(laser(Vec2::new(-5.0, 0.0), 0.0));

    scene.run_pass(&mut rng(1));
    scene.commit_accumulators();

    let meter = scene.energy_meters().next().unwrap();
    let balance = meter.balance();
    assert_eq!(balance.rays_in, 1.0);
    assert_eq!(balance.rays_out, 1.0);
    assert!((balance.flux_in - balance.flux_out).abs() < 1e-5);
}

#[test]
fn screen_reset_gives_identical_reruns() {
    fn build() -> Scene {
        let mut scene = Scene::new();
        scene.add_object(Optic::screen(
            Vec2::new(2.0, -1.0),
            Vec2::new(2.0, 1.0),
            20,
            1.0,
        ));
        scene.add_source(Source::ParallelBeam {
            a: Vec2::new(0.0, -0.5),
            vec: Vec2::new(0.0, 1.0),
            linear_density: 10.0,
            angle_rel: 0.0,
            spectrum: Spectrum::white(),
        });
        scene
    }

    let mut scene = build();
    scene.run_pass(&mut rng(42));
    scene.commit_accumulators();
    let first: Vec<_> = {
        let screen = scene.screens().next().unwrap();
        (0..screen.n_bins()).map(|k| *screen.bin(k)).collect()
    };
    assert!(first.iter().any(|b| b.total_intensity() > 0.0));

    // Reset and rerun with the same seed: bit-identical accumulation.
    scene.reset_accumulators();
    {
        let screen = scene.screens().next().unwrap();
        assert_eq!(screen.frames(), 0);
        assert!((0..screen.n_bins()).all(|k| screen.bin(k).total_intensity() == 0.0));
    }
    scene.run_pass(&mut rng(42));
    scene.commit_accumulators();
    let screen = scene.screens().next().unwrap();
    for (k, bin) in first.iter().enumerate() {
        assert_eq!(screen.bin(k), bin);
    }
}
