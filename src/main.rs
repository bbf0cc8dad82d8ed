use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use flow_export::{ExportSettings, Resolution, Scene, export_to_file, resources::load_scene};

/// Exports a scene file as a ray tracer scene description.
#[derive(Parser, Debug)]
#[command(
    name = "flow-export",
    about = "Export a scene to the ray tracer's scene description format",
    long_about = "Loads a scene (.obj, .gltf or .glb) and writes every visible mesh, \
        camera and light together with its diffuse shading.\n\n\
        EXAMPLES:\n\
          flow-export out.sc --scene models/cube.obj\n\
          flow-export out.sc --scene town.glb --config export.toml --width 1920 --height 1080",
    version
)]
struct Args {
    /// Scene description file to write.
    output: PathBuf,

    /// Scene to export. An empty scene is exported when omitted.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// TOML file with export settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output width in pixels, overrides the config.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Output height in pixels, overrides the config.
    #[arg(long, requires = "width")]
    height: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => ExportSettings::load_from_file(path)?,
        None => ExportSettings::default(),
    };
    if let (Some(width), Some(height)) = (args.width, args.height) {
        settings.resolution = Some(Resolution::new(width, height));
    }

    let scene = match &args.scene {
        Some(path) => load_scene(path).with_context(|| format!("Cannot export {}", path.display()))?,
        None => Scene::new(),
    };
    let stats = export_to_file(&scene, &settings, &args.output)?;
    log::info!(
        "Wrote {} meshes, {} instances, {} cameras, {} lights to {}",
        stats.meshes,
        stats.instances,
        stats.cameras,
        stats.lights,
        args.output.display()
    );
    Ok(())
}
