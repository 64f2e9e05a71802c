use std::hint::black_box;
use std::time::Instant;

use synthwave_kernel::{DriveScene, SceneConfig, ScrollRecycler, ScrollState};

fn bench_advance(speed: f32, iterations: usize) {
    let mut recycler = ScrollRecycler::new(ScrollState::new(speed, 25.0, 50.0));
    let mut recycles = 0u64;

    let start = Instant::now();
    for _ in 0..iterations {
        recycles += u64::from(black_box(&mut recycler).step().count());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  advance (speed {speed}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}, {recycles} recycles"
    );
}

fn bench_scene_update(iterations: usize) {
    let mut scene = DriveScene::new(&SceneConfig::default());

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(scene.update());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  scene update ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn main() {
    println!("scroll recycler benchmarks");
    for speed in [0.1, 0.4, 1.0] {
        bench_advance(speed, 1_000_000);
    }
    bench_scene_update(1_000_000);
}
