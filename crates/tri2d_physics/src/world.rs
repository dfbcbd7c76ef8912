//! Physics world and simulation

use crate::body::{Body, BodyKey};
use crate::collision::{self, Contact};
use crate::error::SceneError;
use crate::grid::{self, Candidate, Grid, StepStats};
use crate::integrator;
use crate::resolver;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::borrow::Cow;
use tri2d_math::Vec2;

/// Configuration for the physics simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical acceleration (negative = down)
    pub gravity: f32,
    /// Velocity multiplier applied every step
    pub damping: f32,
    /// Spring stiffness turning overlap into force
    pub hooke_constant: f32,
    /// Cap on each component of a contact force
    pub max_linear_force: f32,
    /// Cap on the angular impulse from one contact
    pub max_angular_impulse: f32,
    /// Worker threads for the sweep (0 = one per core, 1 = no pool)
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
    /// Create a new physics config with the given gravity
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }
}

/// Either side of a candidate pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyRef {
    Dynamic(BodyKey),
    /// Index into [`PhysicsWorld::statics`]
    Static(usize),
}

/// A pair the broadphase hands to the narrow phase
///
/// `first` is the body being swept; a contact's spring points from it
/// toward `second`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CandidatePair {
    pub first: BodyKey,
    pub second: BodyRef,
}

/// A candidate pair that is actually in contact
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactReport {
    pub pair: CandidatePair,
    pub contact: Contact,
}

/// The physics world containing all triangle bodies
pub struct PhysicsWorld {
    /// Dynamic bodies (using generational keys)
    bodies: SlotMap<BodyKey, Body>,
    /// Immovable bodies, never sorted
    statics: Vec<Body>,
    /// Broadphase index over `bodies`
    grid: Grid,
    /// True once bodies have moved since the last rebuild
    grid_stale: bool,
    /// Physics configuration
    pub config: PhysicsConfig,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl PhysicsWorld {
    /// Create an empty world
    ///
    /// `strip_height` sizes the broadphase rows. Pairs are only guaranteed
    /// to be tested if it is at least twice the largest body extent.
    pub fn new(strip_height: f32, config: PhysicsConfig) -> Result<Self, SceneError> {
        if !(strip_height.is_finite() && strip_height > 0.0) {
            return Err(SceneError::InvalidStripHeight(strip_height));
        }

        #[cfg(feature = "parallel")]
        let pool = if config.threads == 1 {
            None
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()
                .map_err(|e| SceneError::ThreadPool(e.to_string()))?;
            log::debug!("Physics sweep using {} threads", pool.current_num_threads());
            Some(pool)
        };

        Ok(Self {
            bodies: SlotMap::with_key(),
            statics: Vec::new(),
            grid: Grid::new(strip_height),
            grid_stale: false,
            config,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    /// Create a world from complete body lists and index it once
    pub fn from_bodies<D, S>(dynamic: D, statics: S, strip_height: f32, config: PhysicsConfig) -> Result<Self, SceneError>
    where
        D: IntoIterator<Item = Body>,
        S: IntoIterator<Item = Body>,
    {
        let mut world = Self::new(strip_height, config)?;
        for body in dynamic {
            validate(&body)?;
            world.bodies.insert(body);
        }
        for body in statics {
            world.add_static(body)?;
        }
        world.rebuild_grid();
        log::debug!(
            "Scene created: {} dynamic, {} static, {} rows",
            world.bodies.len(),
            world.statics.len(),
            world.grid.row_count()
        );
        Ok(world)
    }

    /// Add a dynamic body to the world and return its key
    pub fn add_body(&mut self, body: Body) -> Result<BodyKey, SceneError> {
        validate(&body)?;
        let key = self.bodies.insert(body);
        self.rebuild_grid();
        Ok(key)
    }

    /// Add an immovable body and return its index
    ///
    /// The body's inverse mass and velocities are zeroed.
    pub fn add_static(&mut self, body: Body) -> Result<usize, SceneError> {
        validate(&body)?;
        self.statics.push(body.into_static());
        Ok(self.statics.len() - 1)
    }

    /// Remove a body from the world and return it
    pub fn remove_body(&mut self, key: BodyKey) -> Option<Body> {
        let body = self.bodies.remove(key)?;
        self.rebuild_grid();
        Some(body)
    }

    /// Get an immutable reference to a body by key
    pub fn get_body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Get a mutable reference to a body by key
    ///
    /// The grid is re-sorted before the next sweep in case the body moves.
    pub fn get_body_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        let body = self.bodies.get_mut(key)?;
        self.grid_stale = true;
        Some(body)
    }

    /// Get the number of dynamic bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Iterate over all dynamic body keys
    pub fn body_keys(&self) -> impl Iterator<Item = BodyKey> + '_ {
        self.bodies.keys()
    }

    /// Iterate over all dynamic bodies
    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &Body)> + '_ {
        self.bodies.iter()
    }

    /// Immovable bodies, in insertion order
    pub fn statics(&self) -> &[Body] {
        &self.statics
    }

    /// The broadphase index
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Step the physics simulation forward by dt seconds
    ///
    /// This performs:
    /// 1. Integration of every dynamic body
    /// 2. Grid re-sort and re-index
    /// 3. Broadphase sweep, narrow phase and contact resolution
    ///
    /// A non-positive or non-finite `dt` leaves the world untouched.
    pub fn step(&mut self, dt: f32) -> StepStats {
        if !(dt.is_finite() && dt > 0.0) {
            log::debug!("Skipping step with dt = {}", dt);
            return StepStats::default();
        }
        self.integrate(dt);
        self.rebuild_grid();
        self.resolve_contacts()
    }

    /// Advance every dynamic body's pose by `dt`
    pub fn integrate(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            integrator::time_step(body, dt, &self.config);
        }
        self.grid_stale = true;
    }

    /// Re-sort and re-index the broadphase grid
    pub fn rebuild_grid(&mut self) {
        self.grid.rebuild(self.bodies.iter());
        self.grid_stale = false;
    }

    /// Sweep the grid and resolve every contact found
    ///
    /// Re-sorts first if bodies moved since the last rebuild.
    pub fn resolve_contacts(&mut self) -> StepStats {
        if self.grid_stale {
            self.rebuild_grid();
        }

        let mut sorted = gather(&self.grid, &self.bodies);
        let config = &self.config;
        let statics = self.statics.as_slice();
        let stats = self.run_sweep(&mut sorted, |window: &mut [Body], _: usize, candidate: Candidate| {
            resolve_candidate(window, candidate, statics, config)
        });

        for (entry, body) in self.grid.entries().iter().zip(sorted) {
            self.bodies[entry.key] = body;
        }
        stats
    }

    #[cfg(feature = "parallel")]
    fn run_sweep<F>(&self, sorted: &mut [Body], handler: F) -> StepStats
    where
        F: Fn(&mut [Body], usize, Candidate) -> bool + Send + Sync,
    {
        let static_count = self.statics.len();
        match &self.pool {
            Some(pool) => pool.install(|| self.grid.par_sweep(sorted, static_count, handler)),
            None => self.grid.sweep(sorted, static_count, handler),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_sweep<F>(&self, sorted: &mut [Body], handler: F) -> StepStats
    where
        F: Fn(&mut [Body], usize, Candidate) -> bool + Send + Sync,
    {
        self.grid.sweep(sorted, self.statics.len(), handler)
    }

    /// Every pair the next sweep would hand to the narrow phase
    ///
    /// Does not modify the world.
    pub fn candidate_pairs(&self) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();
        self.for_each_candidate(|pair, _, _| pairs.push(pair));
        pairs
    }

    /// Every candidate pair currently in contact, without resolving anything
    pub fn find_contacts(&self) -> Vec<ContactReport> {
        let mut reports = Vec::new();
        self.for_each_candidate(|pair, first, second| {
            if let Some(contact) = collision::detect(&first.vertices, &second.vertices) {
                reports.push(ContactReport { pair, contact });
            }
        });
        reports
    }

    fn for_each_candidate<F>(&self, mut visit: F)
    where
        F: FnMut(CandidatePair, &Body, &Body),
    {
        let grid = self.current_grid();
        let entries = grid.entries();
        let mut sorted = gather(&grid, &self.bodies);

        grid.sweep(&mut sorted, self.statics.len(), |window, base, candidate| {
            match candidate {
                Candidate::Dynamic(i, j) => {
                    let pair = CandidatePair {
                        first: entries[base + i].key,
                        second: BodyRef::Dynamic(entries[base + j].key),
                    };
                    visit(pair, &window[i], &window[j]);
                }
                Candidate::Static(i, s) => {
                    let pair = CandidatePair {
                        first: entries[base + i].key,
                        second: BodyRef::Static(s),
                    };
                    visit(pair, &window[i], &self.statics[s]);
                }
            }
            false
        });
    }

    /// The grid as the next sweep would see it
    fn current_grid(&self) -> Cow<'_, Grid> {
        if self.grid_stale {
            let mut grid = self.grid.clone();
            grid.rebuild(self.bodies.iter());
            Cow::Owned(grid)
        } else {
            Cow::Borrowed(&self.grid)
        }
    }

    /// Total kinetic energy of the dynamic bodies
    pub fn kinetic_energy(&self) -> f32 {
        self.bodies.values().map(Body::kinetic_energy).sum()
    }

    /// Vertices of every dynamic body, then every static body
    pub fn vertices(&self) -> impl Iterator<Item = [Vec2; 3]> + '_ {
        self.bodies.values().chain(self.statics.iter()).map(|body| body.vertices)
    }

    /// All vertices flattened, three per body, in [`PhysicsWorld::vertices`] order
    ///
    /// `bytemuck::cast_slice` turns the result into `&[f32]` for a vertex buffer.
    pub fn vertex_data(&self) -> Vec<Vec2> {
        self.vertices().flatten().collect()
    }
}

/// Check a body before it enters the world
fn validate(body: &Body) -> Result<(), SceneError> {
    if !body.vertices.iter().all(|v| v.is_finite()) {
        return Err(SceneError::NonFiniteVertex);
    }
    if !(body.inverse_mass.is_finite() && body.inverse_mass >= 0.0) {
        return Err(SceneError::InvalidInverseMass(body.inverse_mass));
    }
    let area = body.signed_area();
    if area.abs() < f32::EPSILON {
        return Err(SceneError::DegenerateTriangle);
    }
    if area < 0.0 {
        return Err(SceneError::ClockwiseWinding);
    }
    Ok(())
}

/// Copy the dynamic bodies out in grid order
fn gather(grid: &Grid, bodies: &SlotMap<BodyKey, Body>) -> Vec<Body> {
    grid.entries().iter().map(|entry| bodies[entry.key]).collect()
}

/// Narrow phase plus resolution for one candidate
fn resolve_candidate(window: &mut [Body], candidate: Candidate, statics: &[Body], config: &PhysicsConfig) -> bool {
    match candidate {
        Candidate::Dynamic(i, j) => {
            let (first, second) = grid::pair_mut(window, i, j);
            match collision::detect(&first.vertices, &second.vertices) {
                Some(contact) => {
                    resolver::resolve(first, second, &contact, config);
                    true
                }
                None => false,
            }
        }
        Candidate::Static(i, s) => {
            let body = &mut window[i];
            match collision::detect(&body.vertices, &statics[s].vertices) {
                Some(contact) => {
                    resolver::resolve_against_static(body, &contact, config);
                    true
                }
                None => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential() -> PhysicsConfig {
        PhysicsConfig { threads: 1, ..PhysicsConfig::default() }
    }

    fn empty_world() -> PhysicsWorld {
        PhysicsWorld::new(2.0, sequential()).expect("valid world")
    }

    fn floor() -> Body {
        Body::new(Vec2::new(-10.0, 0.0), Vec2::new(0.0, -10.0), Vec2::new(10.0, 0.0))
    }

    #[test]
    fn test_physics_config_default() {
        let config = PhysicsConfig::default();
        assert_eq!(config.gravity, -10.0);
        assert_eq!(config.damping, 0.9995);
        assert_eq!(config.hooke_constant, 10.0);
        assert_eq!(config.max_linear_force, 1.0);
        assert_eq!(config.max_angular_impulse, 0.4);
        assert_eq!(config.threads, 0);
    }

    #[test]
    fn test_physics_config_custom() {
        let config = PhysicsConfig::new(-5.0);
        assert_eq!(config.gravity, -5.0);
        assert_eq!(config.damping, 0.9995);
    }

    #[test]
    fn test_rejects_bad_strip_height() {
        for h in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                PhysicsWorld::new(h, sequential()),
                Err(SceneError::InvalidStripHeight(_))
            ));
        }
    }

    #[test]
    fn test_world_add_body() {
        let mut world = empty_world();
        assert_eq!(world.body_count(), 0);

        let key = world.add_body(Body::equilateral(Vec2::ZERO, 1.0)).expect("valid body");

        assert!(world.get_body(key).is_some());
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.grid().len(), 1);
    }

    #[test]
    fn test_add_body_validation() {
        let mut world = empty_world();
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        let c = Vec2::new(0.0, 1.0);

        assert_eq!(world.add_body(Body::new(a, c, b)), Err(SceneError::ClockwiseWinding));
        assert_eq!(
            world.add_body(Body::new(a, b, Vec2::new(2.0, 0.0))),
            Err(SceneError::DegenerateTriangle)
        );
        assert_eq!(
            world.add_body(Body::new(a, b, Vec2::new(f32::NAN, 1.0))),
            Err(SceneError::NonFiniteVertex)
        );
        assert_eq!(
            world.add_body(Body::new(a, b, c).with_inverse_mass(-1.0)),
            Err(SceneError::InvalidInverseMass(-1.0))
        );
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_world_remove_body() {
        let mut world = empty_world();
        let key = world.add_body(Body::equilateral(Vec2::ZERO, 1.0)).expect("valid body");
        world.add_body(Body::equilateral(Vec2::new(5.0, 0.0), 1.0)).expect("valid body");

        let removed = world.remove_body(key);
        assert!(removed.is_some());
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.grid().len(), 1);

        // Stale key
        assert!(world.get_body(key).is_none());
        assert!(world.remove_body(key).is_none());
    }

    #[test]
    fn test_add_static_forces_immovable() {
        let mut world = empty_world();
        let index = world
            .add_static(floor().with_velocity(Vec2::new(1.0, 1.0)))
            .expect("valid static");

        assert_eq!(index, 0);
        assert!(world.statics()[0].is_static());
        assert_eq!(world.statics()[0].velocity, Vec2::ZERO);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_gravity_application() {
        let mut world = empty_world();
        let key = world.add_body(Body::equilateral(Vec2::ZERO, 1.0)).expect("valid body");

        world.step(0.1);

        let body = world.get_body(key).expect("body exists");
        assert!((body.velocity.y + 0.9995).abs() < 0.0001);
    }

    #[test]
    fn test_invalid_dt_skipped() {
        let mut world = empty_world();
        let key = world
            .add_body(Body::equilateral(Vec2::ZERO, 1.0).with_velocity(Vec2::new(1.0, 0.0)))
            .expect("valid body");
        let before = *world.get_body(key).expect("body exists");

        for dt in [0.0, -0.1, f32::NAN] {
            assert_eq!(world.step(dt), StepStats::default());
        }
        assert_eq!(*world.get_body(key).expect("body exists"), before);
    }

    #[test]
    fn test_overlapping_bodies_pushed_apart() {
        let mut world = empty_world();
        let a = world.add_body(Body::equilateral(Vec2::ZERO, 1.0)).expect("valid body");
        let b = world.add_body(Body::equilateral(Vec2::new(0.5, 0.0), 1.0)).expect("valid body");

        let stats = world.resolve_contacts();
        assert_eq!(stats.contacts, 1);

        let va = world.get_body(a).expect("a exists").velocity;
        let vb = world.get_body(b).expect("b exists").velocity;
        assert!(vb.x - va.x > 0.0);
    }

    #[test]
    fn test_resolve_rebuilds_stale_grid() {
        let mut world = empty_world();
        let a = world.add_body(Body::equilateral(Vec2::ZERO, 1.0)).expect("valid body");
        world.add_body(Body::equilateral(Vec2::new(50.0, 0.0), 1.0)).expect("valid body");
        assert!(world.find_contacts().is_empty());

        // Move the first body onto the second without telling the grid
        world.get_body_mut(a).expect("a exists").translate(Vec2::new(49.5, 0.0));
        assert_eq!(world.find_contacts().len(), 1);
        assert_eq!(world.resolve_contacts().contacts, 1);
    }

    #[test]
    fn test_candidate_pairs_and_contacts() {
        let mut world = empty_world();
        let a = world.add_body(Body::equilateral(Vec2::new(0.0, 0.6), 1.0)).expect("valid body");
        let b = world.add_body(Body::equilateral(Vec2::new(0.5, 0.6), 1.0)).expect("valid body");
        world.add_static(floor()).expect("valid static");

        let pairs = world.candidate_pairs();
        // One dynamic pair plus each body against the floor
        assert_eq!(pairs.len(), 3);
        assert!(pairs.iter().any(|p| {
            (p.first == a && p.second == BodyRef::Dynamic(b)) || (p.first == b && p.second == BodyRef::Dynamic(a))
        }));
        assert_eq!(pairs.iter().filter(|p| p.second == BodyRef::Static(0)).count(), 2);

        let contacts = world.find_contacts();
        assert_eq!(contacts.len(), 1);
        assert!(matches!(contacts[0].pair.second, BodyRef::Dynamic(_)));
    }

    #[test]
    fn test_resting_contact_with_static() {
        let mut world = empty_world();
        let key = world.add_body(Body::equilateral(Vec2::new(0.0, 0.28), 1.0)).expect("valid body");
        world.add_static(floor()).expect("valid static");

        let stats = world.resolve_contacts();
        assert_eq!(stats.contacts, 1);
        assert!(world.get_body(key).expect("body exists").velocity.y > 0.0);
        assert_eq!(world.statics()[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn test_vertices_dynamic_then_static() {
        let mut world = empty_world();
        let body = Body::equilateral(Vec2::new(0.0, 5.0), 1.0);
        world.add_body(body).expect("valid body");
        world.add_static(floor()).expect("valid static");

        let verts: Vec<[Vec2; 3]> = world.vertices().collect();
        assert_eq!(verts.len(), 2);
        assert_eq!(verts[0], body.vertices);
        assert_eq!(verts[1], floor().vertices);

        let flat = world.vertex_data();
        assert_eq!(flat.len(), 6);
        assert_eq!(flat[3], floor().vertices[0]);
    }

    #[test]
    fn test_kinetic_energy_ignores_statics() {
        let mut world = empty_world();
        world
            .add_body(Body::equilateral(Vec2::ZERO, 1.0).with_velocity(Vec2::new(2.0, 0.0)))
            .expect("valid body");
        world.add_static(floor()).expect("valid static");
        assert!((world.kinetic_energy() - 2.0).abs() < 0.0001);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_thread_pool_sizes() {
        let world = PhysicsWorld::new(2.0, PhysicsConfig { threads: 2, ..PhysicsConfig::default() })
            .expect("valid world");
        assert_eq!(world.pool.as_ref().map(|p| p.current_num_threads()), Some(2));
        assert!(empty_world().pool.is_none());
    }
}
