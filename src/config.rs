//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`TRI2D_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Physics configuration
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Demo scene configuration
    #[serde(default)]
    pub scene: SceneConfig,
    /// Frame loop configuration
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`TRI2D_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Load user config (optional)
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // TRI2D_PHYSICS__GRAVITY=-5 -> physics.gravity = -5.0
        figment = figment.merge(Env::prefixed("TRI2D_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Physics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity (negative = downward)
    pub gravity: f32,
    /// Per-step velocity damping factor
    pub damping: f32,
    /// Contact spring stiffness
    pub hooke_constant: f32,
    /// Per-component cap on contact force
    pub max_linear_force: f32,
    /// Cap on rotational response per contact
    pub max_angular_impulse: f32,
    /// Sweep worker threads (0 = one per core, 1 = single-threaded)
    pub threads: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -10.0,
            damping: 0.9995,
            hooke_constant: 10.0,
            max_linear_force: 1.0,
            max_angular_impulse: 0.4,
            threads: 0,
        }
    }
}

impl PhysicsConfig {
    /// Convert to the physics engine's config type
    pub fn to_physics_config(&self) -> tri2d_physics::PhysicsConfig {
        tri2d_physics::PhysicsConfig {
            gravity: self.gravity,
            damping: self.damping,
            hooke_constant: self.hooke_constant,
            max_linear_force: self.max_linear_force,
            max_angular_impulse: self.max_angular_impulse,
            threads: self.threads,
        }
    }
}

/// Demo scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Triangles per side of the spawn lattice
    pub divisions: u32,
    /// Half-size of the square spawn area
    pub extent: f32,
    /// Seed for the position jitter
    pub seed: u64,
    /// Maximum jitter added to each lattice position
    pub jitter: f32,
    /// Vertices of the static base triangle, counter-clockwise
    pub base: [[f32; 2]; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            divisions: 80,
            extent: 500.0,
            seed: 6,
            jitter: 1.0,
            base: [[-600.0, -530.0], [0.0, -1200.0], [600.0, -530.0]],
        }
    }
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Physics time step in seconds
    pub step_time: f32,
    /// Physics steps per frame
    pub substeps: u32,
    /// Frames to run (0 = until interrupted)
    pub frames: u64,
    /// Frames between timing reports
    pub report_interval: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_time: 0.0005,
            substeps: 1,
            frames: 0,
            report_interval: 10,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Log the grid's row occupancy once the scene is built
    pub dump_grid: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            dump_grid: false,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
