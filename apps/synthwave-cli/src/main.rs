use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use synthwave_assets::{HeightField, ImageData, LoadTask, ModelData};
use synthwave_kernel::{CarModel, DriveScene, SceneConfig, SunStyle};
use synthwave_render::{DebugTextRenderer, Renderer};
use synthwave_tools::SceneInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synthwave-cli", about = "CLI tool for the synthwave drive scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run the scroll loop headless and report tile positions
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "300")]
        frames: u64,
        /// Travel speed; overrides the configured start speed
        #[arg(short, long, allow_negative_numbers = true)]
        speed: Option<f32>,
        /// Scene config file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print every frame instead of only recycles
        #[arg(long)]
        trace: bool,
    },
    /// Print a scene config as YAML (defaults unless --config is given)
    Config {
        /// Scene config file to normalize
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a config and load every asset it names
    Check {
        /// Scene config file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn simulate(
    frames: u64,
    speed: Option<f32>,
    config: Option<&Path>,
    trace: bool,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let mut scene = DriveScene::new(&config);
    if let Some(speed) = speed {
        scene.set_speed(speed);
    }

    println!(
        "Simulating {frames} frames at speed {:.2} (tile length {:.1}, threshold {:.1})",
        scene.speed(),
        scene.recycler().state().tile_length(),
        scene.recycler().state().threshold()
    );

    tracing::debug!(frames, speed = scene.speed(), trace, "simulation starting");
    let renderer = DebugTextRenderer::new();
    for _ in 0..frames {
        let report = scene.update();
        if trace {
            print!("{}", renderer.render(&scene));
        } else if report.recycled.any() {
            let (a, b) = report.positions;
            let which = match (report.recycled.a, report.recycled.b) {
                (true, true) => "A+B",
                (true, false) => "A",
                _ => "B",
            };
            println!(
                "frame {:>6}: recycled {which:<3} A.z={a:.2} B.z={b:.2}",
                report.frame
            );
        }
    }

    println!("{}", SceneInspector::summary(&scene));
    Ok(())
}

fn dump_config(config: Option<&Path>, output: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    match output {
        Some(path) => {
            config
                .save(path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => print!("{}", config.to_yaml()?),
    }
    Ok(())
}

fn check(config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    println!("config: OK");
    tracing::debug!("starting asset loads");

    let heightmap = config.textures.heightmap.clone();
    let sun = config.textures.sun.clone();
    let car = config.car.model.clone();

    // Start every load before joining any of them.
    let heightfield_task = LoadTask::spawn("heightmap", move || HeightField::from_file(heightmap));
    let sun_task = (config.sun.style == SunStyle::Textured)
        .then(|| LoadTask::spawn("sun", move || ImageData::from_file(sun)));
    let car_task = LoadTask::spawn("car", move || ModelData::load(car));

    let mut failures = 0;

    match heightfield_task.wait() {
        Ok(field) => {
            let (w, h) = field.dimensions();
            println!("heightmap: OK ({w}x{h}) {}", config.textures.heightmap.display());
        }
        Err(e) => {
            failures += 1;
            println!("heightmap: FAILED ({e}), terrain would stay flat");
        }
    }

    match sun_task.map(LoadTask::wait) {
        None => println!("sun: gradient style, no texture needed"),
        Some(Ok(image)) => println!(
            "sun: OK ({}x{}, id {}) {}",
            image.width,
            image.height,
            image.id,
            config.textures.sun.display()
        ),
        Some(Err(e)) => {
            failures += 1;
            println!("sun: FAILED ({e}), gradient would be used");
        }
    }

    let mut scene = DriveScene::new(&config);
    scene.begin_car_load();
    match car_task.wait() {
        Ok(model) => {
            let (min, max) = model.bounds();
            println!(
                "car: OK ({} vertices, {} triangles, extent {:.2}x{:.2}x{:.2}, id {})",
                model.vertex_count(),
                model.triangle_count(),
                max.x - min.x,
                max.y - min.y,
                max.z - min.z,
                model.id
            );
            scene.attach_car(Ok(CarModel {
                name: model.name.clone(),
                vertex_count: model.vertex_count(),
                triangle_count: model.triangle_count(),
                asset_id: model.id.0,
            }));
        }
        Err(e) => {
            failures += 1;
            println!("car: FAILED ({e}), scene would run without a car");
            scene.attach_car(Err(e.to_string()));
        }
    }

    print!("{}", DebugTextRenderer::verbose().render(&scene));

    if failures > 0 {
        bail!("{failures} asset(s) failed to load");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let scene = DriveScene::default();
            let (a, b) = scene.recycler().positions();
            println!("synthwave-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: speed={} tiles=({a}, {b})", scene.speed());
            println!("assets: {}", synthwave_assets::crate_info());
            println!("render: {}", synthwave_render::crate_info());
            println!("tools: {}", synthwave_tools::crate_info());
        }
        Commands::Simulate {
            frames,
            speed,
            config,
            trace,
        } => simulate(frames, speed, config.as_deref(), trace)?,
        Commands::Config { config, output } => {
            dump_config(config.as_deref(), output.as_deref())?
        }
        Commands::Check { config } => check(config.as_deref())?,
    }

    Ok(())
}
