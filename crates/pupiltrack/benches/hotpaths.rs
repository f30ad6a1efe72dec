use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pupiltrack::config::TrackerConfig;
use pupiltrack::conic::fit_ellipse_direct;
use pupiltrack::pipeline::evaluate_levels;
use pupiltrack::seed::locate_seed;
use pupiltrack::TrackerSession;

/// 640x480 eye-like frame: noisy bright background, dark pupil disk.
fn make_eye_fixture(seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let (cx, cy, r) = (330.0f32, 230.0f32, 36.0f32);
    GrayImage::from_fn(640, 480, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let base = if dx * dx + dy * dy <= r * r { 20 } else { 170 };
        Luma([base + rng.gen_range(0..20u8)])
    })
}

fn bench_seed(c: &mut Criterion) {
    let cfg = TrackerConfig::default();
    let img = make_eye_fixture(7);

    c.bench_function("seed_640x480", |b| {
        b.iter(|| black_box(locate_seed(black_box(&img), &cfg.seed).ok()))
    });
}

fn bench_levels(c: &mut Criterion) {
    let cfg = TrackerConfig::default();
    let img = make_eye_fixture(11);
    let Ok(seed) = locate_seed(&img, &cfg.seed) else {
        return;
    };

    c.bench_function("evaluate_levels_640x480", |b| {
        b.iter(|| {
            let eval = evaluate_levels(black_box(&img), seed, &cfg);
            black_box(eval.scores())
        })
    });
}

fn bench_session_frame(c: &mut Criterion) {
    let img = make_eye_fixture(13);
    let Ok(mut session) = TrackerSession::new(TrackerConfig::default()) else {
        return;
    };

    c.bench_function("session_frame_640x480", |b| {
        b.iter(|| black_box(session.process_frame(black_box(&img)).ok()))
    });
}

fn bench_ellipse_fit(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let pts: Vec<[f64; 2]> = (0..120)
        .map(|i| {
            let t = i as f64 * std::f64::consts::TAU / 120.0;
            [
                320.0 + 40.0 * t.cos() + rng.gen_range(-0.5..0.5),
                240.0 + 32.0 * t.sin() + rng.gen_range(-0.5..0.5),
            ]
        })
        .collect();

    c.bench_function("ellipse_fit_120pts", |b| {
        b.iter(|| black_box(fit_ellipse_direct(black_box(&pts))))
    });
}

criterion_group!(
    hotpaths,
    bench_seed,
    bench_levels,
    bench_session_frame,
    bench_ellipse_fit
);
criterion_main!(hotpaths);
