//! tri2d - 2D triangle physics sandbox
//!
//! Application layer around `tri2d_physics`: layered configuration, demo
//! scene construction and the headless frame loop.

pub mod config;
pub mod scene;
pub mod systems;
