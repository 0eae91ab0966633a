use clap::Parser;
use glam::Vec2;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use lumiray::cli::{Args, DemoScene};
use lumiray::curve::{Composite, Geometry, Line};
use lumiray::fog::{Fog, Halting};
use lumiray::logger::init_logger;
use lumiray::render::{save_fog_density, save_screen_strip};
use lumiray::scene::Scene;
use lumiray::source::{DirectionSampling, Source};
use lumiray::spectrum::Spectrum;
use lumiray::surface::{Dielectric, Diffuser, Optic, RefractiveIndex, Surface};

/// White parallel beam through a dispersive glass prism, fanned out onto a
/// screen. Returns the scene and the physical length of its screen.
fn prism_scene() -> (Scene, f32) {
    let mut scene = Scene::new();

    let prism = Composite::polygon(&[
        Vec2::new(-0.6, -0.4),
        Vec2::new(0.6, -0.4),
        Vec2::new(0.0, 0.6),
    ])
    .expect("prism polygon is closed");
    let glass = Optic::new(
        Geometry::Composite(prism),
        Surface::Dielectric(Dielectric {
            // Cauchy dispersion, wavelengths in mm: n ranges ~1.52 (red)
            // to ~1.56 (violet) over the visible bands.
            index: RefractiveIndex::PerWavelength(Box::new(|lambda| 1.5 + 1e-8 / (lambda * lambda))),
        }),
    )
    .expect("composite geometry accepts a dielectric");
    scene.add_object(glass);

    let screen_length = 6.0;
    scene.add_object(Optic::screen(
        Vec2::new(4.0, -4.0),
        Vec2::new(4.0, 2.0),
        600,
        20.0,
    ));

    scene.add_source(Source::ParallelBeam {
        a: Vec2::new(-3.0, -0.15),
        vec: Vec2::new(0.0, 0.3),
        linear_density: 100.0,
        angle_rel: 0.0,
        spectrum: Spectrum::white(),
    });

    (scene, screen_length)
}

/// Omnidirectional source bouncing inside a mirror box with a diffusing
/// floor; the right wall is a screen.
fn mirror_box_scene() -> (Scene, f32) {
    let mut scene = Scene::new();

    scene.add_object(Optic::mirror_line(Vec2::new(-2.0, -1.0), Vec2::new(-2.0, 1.0)));
    scene.add_object(Optic::mirror_line(Vec2::new(-2.0, 1.0), Vec2::new(2.0, 1.0)));
    scene.add_object(
        Optic::new(
            Geometry::Line(Line::new(Vec2::new(-2.0, -1.0), Vec2::new(2.0, -1.0))),
            Surface::Diffuser(Diffuser::lambertian(0.7, 2.0)),
        )
        .expect("line geometry accepts a diffuser"),
    );

    let screen_length = 2.0;
    scene.add_object(Optic::screen(
        Vec2::new(2.0, -1.0),
        Vec2::new(2.0, 1.0),
        200,
        5.0,
    ));

    scene.add_source(Source::PointOmni {
        position: Vec2::new(-0.5, 0.2),
        angular_density: 60.0,
        sampling: DirectionSampling::Random,
        directivity: None,
        sector: None,
        spectrum: Spectrum::white(),
    });

    (scene, screen_length)
}

/// Beam through a uniform fog chamber onto a screen; scattered light
/// reaches the screen far from the beam axis.
fn fog_scene() -> (Scene, f32) {
    let mut scene = Scene::new();

    scene.add_object(
        Fog::uniform(Vec2::new(0.0, -1.0), Vec2::new(2.0, 2.0), (20, 20), 1.0)
            .with_mean_free_path(0.5)
            .with_halting(Halting::Stochastic)
            .with_rays_per_intensity(2.0),
    );

    let screen_length = 6.0;
    scene.add_object(Optic::screen(
        Vec2::new(4.0, -3.0),
        Vec2::new(4.0, 3.0),
        600,
        20.0,
    ));

    scene.add_source(Source::ParallelBeam {
        a: Vec2::new(-1.0, -0.05),
        vec: Vec2::new(0.0, 0.1),
        linear_density: 200.0,
        angle_rel: 0.0,
        spectrum: Spectrum::white(),
    });

    (scene, screen_length)
}

fn main() {
    let args = Args::parse();

    init_logger(args.debug_level.clone().into());

    // Log application startup with version information
    info!("LumiRay - Git Version {} ({})", env!("GIT_HASH"), env!("GIT_DATE"));

    let (mut scene, screen_length) = match args.scene {
        DemoScene::Prism => prism_scene(),
        DemoScene::MirrorBox => mirror_box_scene(),
        DemoScene::Fog => fog_scene(),
    };
    info!(
        "scene: {:?}, {} objects, {} sources, {} passes, seed {}",
        args.scene,
        scene.objects.len(),
        scene.sources.len(),
        args.passes,
        args.seed
    );

    let mut rng = ChaCha20Rng::seed_from_u64(args.seed);
    let pb = ProgressBar::new(args.passes);
    pb.set_style(ProgressStyle::default_bar().template("{bar:40} {pos}/{len} ETA: {eta}").unwrap());
    for _ in 0..args.passes {
        scene.run_pass(&mut rng);
        scene.commit_accumulators();
        pb.inc(1);
    }
    pb.finish();

    let stats = scene.stats();
    info!(
        "last pass: {} emitted, {} traced, mean depth {:.2}, {} truncated, {} discarded, {} escaped, {} absorbed",
        stats.emitted,
        stats.traced,
        stats.mean_depth(),
        stats.truncated,
        stats.discarded,
        stats.escaped,
        stats.absorbed
    );
    for (k, meter) in scene.energy_meters().enumerate() {
        let balance = meter.balance();
        info!(
            "meter {}: flux in {:.3} ({:.0} rays), flux out {:.3} ({:.0} rays) per pass",
            k, balance.flux_in, balance.rays_in, balance.flux_out, balance.rays_out
        );
    }

    match scene.screens().next() {
        Some(screen) => save_screen_strip(screen, screen_length, args.strip_height, &args.output),
        None => info!("scene has no screen, nothing to save"),
    }
    let fog = scene.fogs().next();
    if let Some(fog) = fog {
        save_fog_density(fog, "fog_density.png");
    }
}
