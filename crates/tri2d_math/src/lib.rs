//! 2D Mathematics Library
//!
//! This crate provides the 2D vector type used by the tri2d simulator.
//!
//! ## Core Types
//!
//! - [`Vec2`] - 2D vector with x, y components, `Pod` for vertex upload

mod vec2;

pub use vec2::Vec2;
