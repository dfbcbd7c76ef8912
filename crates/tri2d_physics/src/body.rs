//! Rigid triangle bodies

use crate::shapes::{self, Aabb2D, Triangle};
use tri2d_math::Vec2;
use slotmap::new_key_type;

// Define generational key type for dynamic bodies
new_key_type! {
    /// Key to a dynamic body in the physics world
    ///
    /// The spatial index stores these keys, never the bodies themselves, so
    /// re-sorting only reorders keys and a body's identity survives every step.
    pub struct BodyKey;
}

/// sqrt(3) / 6: distance from an equilateral triangle's centroid to its base, per unit width
const EQUILATERAL_BASE_RATIO: f32 = 0.288_675_13;

/// A rigid triangle with linear and angular velocity
///
/// Vertices are kept in world space and rewritten every integration step.
/// An inverse mass of zero marks an immovable body; such a body never has
/// its velocity or angular velocity written.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Vertices in world coordinates, counter-clockwise
    pub vertices: Triangle,
    /// Linear velocity of the centroid (units per second)
    pub velocity: Vec2,
    /// Angular velocity in radians per second, positive = counter-clockwise
    pub angular_velocity: f32,
    /// Inverse mass, `0.0` = immovable
    pub inverse_mass: f32,
}

impl Body {
    /// Create a body at rest from three counter-clockwise vertices
    pub fn new(v0: Vec2, v1: Vec2, v2: Vec2) -> Self {
        Self {
            vertices: [v0, v1, v2],
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            inverse_mass: 1.0,
        }
    }

    /// Create an apex-up equilateral triangle whose centroid is `center`
    ///
    /// Vertices are ordered top, left, right (counter-clockwise).
    pub fn equilateral(center: Vec2, width: f32) -> Self {
        let below = EQUILATERAL_BASE_RATIO * width;
        let top = Vec2::new(center.x, center.y + 2.0 * below);
        let left = Vec2::new(center.x - width / 2.0, center.y - below);
        let right = Vec2::new(center.x + width / 2.0, center.y - below);
        Self::new(top, left, right)
    }

    /// Set the linear velocity of this body
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the angular velocity of this body
    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Set the inverse mass of this body
    pub fn with_inverse_mass(mut self, inverse_mass: f32) -> Self {
        self.inverse_mass = inverse_mass;
        self
    }

    /// Make this body immovable: infinite mass, no motion
    pub fn into_static(mut self) -> Self {
        self.inverse_mass = 0.0;
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
        self
    }

    /// True if the body has infinite mass
    #[inline]
    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    /// Centroid (mean of the three vertices)
    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        shapes::centroid(&self.vertices)
    }

    /// Edge vector from vertex `i` to vertex `i + 1`
    #[inline]
    pub fn edge(&self, i: usize) -> Vec2 {
        self.vertices[(i + 1) % 3] - self.vertices[i % 3]
    }

    /// Axis-aligned bounding box of the vertices
    #[inline]
    pub fn aabb(&self) -> Aabb2D {
        Aabb2D::from_triangle(&self.vertices)
    }

    /// Signed area, positive for counter-clockwise winding
    #[inline]
    pub fn signed_area(&self) -> f32 {
        shapes::signed_area(&self.vertices)
    }

    /// True if the vertices wind counter-clockwise
    #[inline]
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Rotate the vertices about the centroid by `angle` radians
    pub fn rotate(&mut self, angle: f32) {
        let mid = self.midpoint();
        for v in &mut self.vertices {
            *v = mid + (*v - mid).rotated(angle);
        }
    }

    /// Translate the vertices by `offset`
    pub fn translate(&mut self, offset: Vec2) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Linear plus rotational kinetic energy, treating the body as a unit-inertia point
    ///
    /// Only meant as a stability measure; immovable bodies report zero.
    pub fn kinetic_energy(&self) -> f32 {
        if self.is_static() {
            return 0.0;
        }
        let mass = 1.0 / self.inverse_mass;
        0.5 * mass * (self.velocity.length_squared() + self.angular_velocity * self.angular_velocity)
    }
}
