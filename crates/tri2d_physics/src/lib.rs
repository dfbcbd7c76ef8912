//! 2D triangle physics for tri2d
//!
//! This crate provides rigid-body simulation for convex triangles, including:
//! - Triangle bodies with linear and angular velocity
//! - Narrow-phase detection (AABB reject, Separating Axis Theorem, clipped contact point)
//! - Spring-impulse contact response with force caps
//! - A striped broadphase whose even and odd passes can run in parallel
//!
//! Parallel sweeping is behind the default `parallel` feature (rayon).

pub mod body;
pub mod collision;
pub mod error;
pub mod grid;
pub mod integrator;
pub mod resolver;
pub mod shapes;
pub mod world;

// Re-export commonly used types
pub use body::{Body, BodyKey};
pub use collision::{detect, Contact};
pub use error::SceneError;
pub use grid::{Grid, StepStats};
pub use shapes::{Aabb2D, Triangle};
pub use world::{BodyRef, CandidatePair, ContactReport, PhysicsConfig, PhysicsWorld};
