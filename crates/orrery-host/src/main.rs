//! Minimal standalone host.
//!
//! Loads a settings document, activates the simple-bodies plugin against
//! real service instances, and reports what it built. Useful for
//! smoke-testing a configuration outside the full environment; no window
//! or render loop.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use orrery_config::Settings;
use orrery_core::{
    CelestialSurface, EnginePlugin, GraphicsSettings, HostServices, InputManager, SceneGraph,
    SolarSystem,
};

fn main() -> ExitCode {
    orrery_log::init_logging(Some(Path::new("logs")), cfg!(debug_assertions), None);

    let Some(settings_path) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: orrery-host <settings.json>");
        return ExitCode::FAILURE;
    };

    match run(&settings_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let host = HostServices {
        settings: Settings::new(),
        solar_system: SolarSystem::new(),
        input_manager: InputManager::new(),
        scene_graph: SceneGraph::new(),
        graphics: GraphicsSettings::new(),
    };
    host.settings.load_from_file(settings_path)?;

    let mut plugin = orrery_bodies::BodiesPlugin::new();
    plugin.init(host.clone())?;

    tracing::info!("{} bodies active", host.solar_system.body_count());
    for body in host
        .solar_system
        .body_centers()
        .iter()
        .filter_map(|name| host.solar_system.body_by_center(name))
    {
        let body = body.borrow();
        let radii = body.radii();
        tracing::info!(
            "  {} radii ({:.0}, {:.0}, {:.0}) m",
            body.center_name(),
            radii.x,
            radii.y,
            radii.z
        );
    }

    // optional GPU probe; a missing adapter is not fatal for a config check
    match orrery_render::init_gpu_blocking() {
        Ok(_gpu) => tracing::info!("GPU device available"),
        Err(err) => tracing::warn!("no GPU device: {err}"),
    }

    plugin.de_init();
    Ok(())
}
