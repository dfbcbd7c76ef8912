//! SceneBuilder - Declarative scene construction
//!
//! Provides a fluent API for building triangle scenes with physics.

use crate::config::SceneConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tri2d_math::Vec2;
use tri2d_physics::{Body, PhysicsConfig, PhysicsWorld, SceneError};

/// Builder for constructing triangle scenes with physics
///
/// # Example
/// ```ignore
/// let world = SceneBuilder::new()
///     .with_physics(PhysicsConfig::default())
///     .add_lattice(10, 50.0, 1.0, 6)
///     .add_static(Body::new(a, b, c))
///     .build()?;
/// ```
pub struct SceneBuilder {
    dynamic: Vec<Body>,
    statics: Vec<Body>,
    strip_height: Option<f32>,
    config: PhysicsConfig,
}

impl SceneBuilder {
    /// Create a new, empty scene builder
    pub fn new() -> Self {
        Self {
            dynamic: Vec::new(),
            statics: Vec::new(),
            strip_height: None,
            config: PhysicsConfig::default(),
        }
    }

    /// Build the demo scene described by `config`: a jittered lattice of
    /// falling triangles above one static base
    pub fn from_config(config: &SceneConfig) -> Self {
        let [a, b, c] = config.base;
        Self::new()
            .add_lattice(config.divisions, config.extent, config.jitter, config.seed)
            .add_static(Body::new(Vec2::from(a), Vec2::from(b), Vec2::from(c)))
    }

    /// Use the given physics configuration
    pub fn with_physics(mut self, config: PhysicsConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the broadphase strip height
    ///
    /// By default it is twice the largest dynamic body extent.
    pub fn with_strip_height(mut self, strip_height: f32) -> Self {
        self.strip_height = Some(strip_height);
        self
    }

    /// Add a dynamic body
    pub fn add_body(mut self, body: Body) -> Self {
        self.dynamic.push(body);
        self
    }

    /// Add an immovable body
    pub fn add_static(mut self, body: Body) -> Self {
        self.statics.push(body);
        self
    }

    /// Add `divisions * divisions` equilateral triangles over the square
    /// `[-extent, extent]`
    ///
    /// Each lattice cell gets one triangle a third of the cell wide, its
    /// centre pushed up and right by up to `jitter`.
    pub fn add_lattice(mut self, divisions: u32, extent: f32, jitter: f32, seed: u64) -> Self {
        if divisions == 0 {
            return self;
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let cell = 2.0 * extent / divisions as f32;
        let width = cell / 3.0;

        self.dynamic.reserve((divisions * divisions) as usize);
        for i in 0..divisions {
            for j in 0..divisions {
                let x = -extent + cell * i as f32 + jitter * rng.gen::<f32>();
                let y = -extent + cell * j as f32 + jitter * rng.gen::<f32>();
                self.dynamic.push(Body::equilateral(Vec2::new(x, y), width));
            }
        }
        self
    }

    /// Number of dynamic bodies added so far
    pub fn body_count(&self) -> usize {
        self.dynamic.len()
    }

    /// Strip height the built world will use
    pub fn strip_height(&self) -> f32 {
        self.strip_height.unwrap_or_else(|| {
            let extent = self
                .dynamic
                .iter()
                .map(|body| {
                    let size = body.aabb().size();
                    size.x.max(size.y)
                })
                .fold(0.0, f32::max);
            if extent > 0.0 { 2.0 * extent } else { 1.0 }
        })
    }

    /// Build the physics world
    pub fn build(self) -> Result<PhysicsWorld, SceneError> {
        let strip_height = self.strip_height();
        PhysicsWorld::from_bodies(self.dynamic, self.statics, strip_height, self.config)
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}
