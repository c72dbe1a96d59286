//! neuvox headless viewer — renders an orbit around a model to PNG frames.
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>    JSON render config (default: built-in defaults)
//!   --weights <PATH>   Model file, overrides the config's weight_path
//!   --sphere <RADIUS>  Render a synthetic sphere instead of a model file
//!   --export <PATH>    With --sphere, also write the synthetic model to disk
//!   --voxel-num <N>    Voxels per grid axis
//!   --width <W>        Image width
//!   --height <H>       Image height
//!   --device <DEV>     "cpu" or "cpu:<threads>"
//!   --frames <N>       Frames in the orbit (default: 36)
//!   --out <DIR>        Output directory, or "none" to discard (default: "frames")

use std::path::PathBuf;

use neuvox::core::{
    camera::OrbitCamera,
    camera_controller::OrbitController,
    config::RenderConfig,
    input::{CameraInput, DragButton},
    logging,
    time::FrameTimer,
    Result,
};
use neuvox::render::{FrameSink, NullSink, PngSequenceSink, Renderer};
use neuvox::scene::{disk_io, SceneHandle, SceneStore};

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => RenderConfig::from_json_file(&PathBuf::from(path))?,
        None => RenderConfig::default(),
    };
    if let Some(path) = parse_str_arg(&args, "--weights") {
        config.weight_path = PathBuf::from(path);
    }
    if let Some(n) = parse_u32_arg(&args, "--voxel-num") {
        config.voxel_num = n;
    }
    if let Some(w) = parse_u32_arg(&args, "--width") {
        config.width = w;
    }
    if let Some(h) = parse_u32_arg(&args, "--height") {
        config.height = h;
    }
    if let Some(device) = parse_str_arg(&args, "--device") {
        config.device = device;
    }
    let frames = parse_u32_arg(&args, "--frames").unwrap_or(36).max(1);
    let out = parse_str_arg(&args, "--out").unwrap_or_else(|| "frames".to_string());
    let sphere = parse_f32_arg(&args, "--sphere");

    config.validate()?;
    let params = config.grid_params()?;

    log::info!("=== neuvox viewer ===");
    log::info!("Grid:   {}^3 voxels, dim {}, size {}", config.voxel_num, config.voxel_dim, config.grid_size);
    log::info!("Image:  {}x{}, max_hits {}", config.width, config.height, config.max_hits);
    log::info!("Frames: {} -> {}", frames, out);

    let scene: SceneHandle = match sphere {
        Some(radius) => {
            let model = disk_io::create_test_sphere(config.voxel_num, config.voxel_dim, radius);
            if let Some(path) = parse_str_arg(&args, "--export") {
                disk_io::write_model(&PathBuf::from(&path), &model)?;
                log::info!("Wrote synthetic model to {}", path);
            }
            SceneStore::from_model(model, params)?
        }
        None => SceneStore::load(&config.weight_path, params)?,
    };

    let decoder = scene.mlp_decoder()?;
    let mut renderer = Renderer::from_config(scene.clone(), decoder, &config)?;

    let mut sink: Box<dyn FrameSink> = if out == "none" {
        Box::new(NullSink::default())
    } else {
        Box::new(PngSequenceSink::new(&out, "frame")?)
    };

    // Turntable: one full azimuth revolution, fed through the same input
    // path an interactive window would use.
    let mut camera = OrbitCamera::framing(scene.grid());
    let mut controller = OrbitController::default();
    let step_px = 360.0 / frames as f32;
    let mut timer = FrameTimer::new();

    for i in 0..frames {
        timer.begin();
        let frame = renderer.render(&camera.view());
        sink.present(&frame)?;
        let frame_time = timer.end();

        log::info!(
            "frame {:>4}/{}: {:.2} ms ({:.1} fps)",
            i + 1,
            frames,
            frame_time.as_secs_f32() * 1000.0,
            timer.fps()
        );

        controller.handle(&mut camera, CameraInput::DragStart(DragButton::Rotate));
        controller.handle(&mut camera, CameraInput::Drag { dx: step_px, dy: 0.0 });
        controller.handle(&mut camera, CameraInput::DragEnd(DragButton::Rotate));
    }

    let fps = timer.fps_stats();
    log::info!(
        "Done: {} frames, avg {:.1} fps (min {:.1}, max {:.1})",
        fps.frame_count,
        fps.long.avg,
        fps.long.min,
        fps.long.max
    );
    match serde_json::to_string(&renderer.profiler().average()) {
        Ok(json) => log::info!("Average frame stats: {}", json),
        Err(e) => log::warn!("Could not serialize frame stats: {}", e),
    }

    Ok(())
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
