//! tri2d - 2D triangle physics sandbox
//!
//! Runs the falling-triangles demo headless and logs engine timing.

use tri2d::config::AppConfig;
use tri2d::scene::SceneBuilder;
use tri2d::systems::SimulationSystem;

fn main() {
    // Config picks the default log level, so it is loaded before the logger exists
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()))
        .init();
    if let Some(e) = load_error {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }
    log::info!("Starting tri2d");

    let mut world = SceneBuilder::from_config(&config.scene)
        .with_physics(config.physics.to_physics_config())
        .build()
        .unwrap_or_else(|e| panic!("Failed to build scene: {}", e));

    log::info!(
        "Scene: {} dynamic, {} static bodies, strip height {:.3}, {} rows",
        world.body_count(),
        world.statics().len(),
        world.grid().strip_height(),
        world.grid().row_count()
    );
    if config.debug.dump_grid {
        for (row, entries) in world.grid().rows() {
            log::info!("  row {:4}: {} bodies", row, entries.len());
        }
    }

    let mut simulation = SimulationSystem::new(&config.simulation);
    let mut frame: u64 = 0;
    while config.simulation.frames == 0 || frame < config.simulation.frames {
        simulation.update(&mut world);
        frame += 1;
    }

    log::info!(
        "Finished after {} frames, kinetic energy {:.3}",
        frame,
        world.kinetic_energy()
    );
}
