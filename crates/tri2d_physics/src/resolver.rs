//! Spring-impulse contact response
//!
//! A contact's spring vector is turned into a linear force by Hooke's law,
//! applied with opposite signs to the two bodies. Each body also receives an
//! angular impulse from the force component perpendicular to its lever arm.
//! Both terms are clamped; deep overlaps would otherwise inject energy faster
//! than damping removes it.

use crate::body::Body;
use crate::collision::Contact;
use crate::world::PhysicsConfig;
use tri2d_math::Vec2;

/// Lever arms shorter than this produce no rotation
const MIN_LEVER_ARM: f32 = 1e-6;

/// Resolve a contact between two bodies
///
/// The spring points from `first` toward `second`, so `second` is pushed
/// along it and `first` against it. Immovable bodies are left untouched.
pub fn resolve(first: &mut Body, second: &mut Body, contact: &Contact, config: &PhysicsConfig) {
    let force = spring_force(contact.spring, config);
    apply_impulse(first, -force, contact.point, config);
    apply_impulse(second, force, contact.point, config);
}

/// Resolve a contact between a body and an immovable one
///
/// Only `body` is written; the spring still points from `body` toward the
/// static body.
pub fn resolve_against_static(body: &mut Body, contact: &Contact, config: &PhysicsConfig) {
    let force = spring_force(contact.spring, config);
    apply_impulse(body, -force, contact.point, config);
}

/// Hooke force for a spring displacement, clamped per component
#[inline]
pub fn spring_force(spring: Vec2, config: &PhysicsConfig) -> Vec2 {
    (spring * config.hooke_constant).clamp_magnitude_components(config.max_linear_force)
}

/// Apply a force acting at `point` to one body
pub fn apply_impulse(body: &mut Body, force: Vec2, point: Vec2, config: &PhysicsConfig) {
    if body.is_static() {
        return;
    }

    body.velocity += force * body.inverse_mass;

    let arm = point - body.midpoint();
    let arm_length = arm.length();
    if arm_length < MIN_LEVER_ARM {
        return;
    }

    // Part of the force that does not push through the centroid
    let radial = arm * (1.0 / arm_length);
    let tangential = force - radial * force.dot(radial);
    let sign = arm.cross(force).signum();
    let torque = (sign * tangential.length() / arm_length)
        .clamp(-config.max_angular_impulse, config.max_angular_impulse);

    body.angular_velocity += torque * body.inverse_mass;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision;

    fn body_at(x: f32, y: f32) -> Body {
        Body::equilateral(Vec2::new(x, y), 1.0)
    }

    #[test]
    fn test_spring_force_below_cap() {
        let config = PhysicsConfig::default();
        let force = spring_force(Vec2::new(0.05, -0.02), &config);
        assert!((force.x - 0.5).abs() < 0.0001);
        assert!((force.y + 0.2).abs() < 0.0001);
    }

    #[test]
    fn test_spring_force_capped_per_component() {
        let config = PhysicsConfig::default();
        let force = spring_force(Vec2::new(1.0, -0.2), &config);
        assert_eq!(force, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_equal_and_opposite() {
        let config = PhysicsConfig::default();
        let mut a = body_at(0.0, 0.0);
        let mut b = body_at(0.9, 0.0);
        let contact = Contact::new(Vec2::new(0.45, 0.0), Vec2::new(0.05, 0.0));

        resolve(&mut a, &mut b, &contact, &config);

        assert!((b.velocity.x - 0.5).abs() < 0.0001);
        assert_eq!(a.velocity, -b.velocity);
    }

    #[test]
    fn test_inverse_mass_scales_response() {
        let config = PhysicsConfig::default();
        let mut a = body_at(0.0, 0.0).with_inverse_mass(0.5);
        let mut b = body_at(0.9, 0.0);
        let contact = Contact::new(Vec2::new(0.45, 0.0), Vec2::new(0.05, 0.0));

        resolve(&mut a, &mut b, &contact, &config);

        assert!((a.velocity.x + 0.25).abs() < 0.0001);
        assert!((b.velocity.x - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_static_body_never_written() {
        let config = PhysicsConfig::default();
        let mut dynamic = body_at(0.0, 1.0);
        // Deliberately odd values: they must survive bit-for-bit
        let mut fixed = body_at(0.0, 0.0).with_inverse_mass(0.0).with_velocity(Vec2::new(3.0, 4.0));
        fixed.angular_velocity = 0.25;
        let before = fixed;

        let contact = Contact::new(Vec2::new(0.3, 0.5), Vec2::new(0.0, -0.2));
        resolve(&mut dynamic, &mut fixed, &contact, &config);

        assert_eq!(fixed, before);
        assert!(dynamic.velocity.y > 0.0);
    }

    #[test]
    fn test_resolve_against_static_matches_resolve() {
        let config = PhysicsConfig::default();
        let contact = Contact::new(Vec2::new(0.2, 0.5), Vec2::new(0.01, -0.03));

        let mut a = body_at(0.0, 1.0);
        let mut fixed = body_at(0.0, 0.0).into_static();
        resolve(&mut a, &mut fixed, &contact, &config);

        let mut b = body_at(0.0, 1.0);
        resolve_against_static(&mut b, &contact, &config);

        assert_eq!(a, b);
    }

    #[test]
    fn test_torque_sign_counter_clockwise() {
        let config = PhysicsConfig::default();
        let mut body = body_at(0.0, 0.0);
        // Upward push on the right of the centroid spins counter-clockwise
        apply_impulse(&mut body, Vec2::new(0.0, 0.1), Vec2::new(1.0, 0.0), &config);
        assert!((body.angular_velocity - 0.1).abs() < 0.0001);

        let mut body = body_at(0.0, 0.0);
        apply_impulse(&mut body, Vec2::new(0.0, -0.1), Vec2::new(1.0, 0.0), &config);
        assert!((body.angular_velocity + 0.1).abs() < 0.0001);
    }

    #[test]
    fn test_radial_force_no_torque() {
        let config = PhysicsConfig::default();
        let mut body = body_at(0.0, 0.0);
        apply_impulse(&mut body, Vec2::new(0.5, 0.0), Vec2::new(1.0, 0.0), &config);
        assert!(body.angular_velocity.abs() < 0.000001);
        assert!((body.velocity.x - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_angular_impulse_capped() {
        let config = PhysicsConfig::default();
        let mut body = body_at(0.0, 0.0);
        // Short lever arm: 1.0 / 0.1 would be 10 without the cap
        apply_impulse(&mut body, Vec2::new(0.0, 1.0), Vec2::new(0.1, 0.0), &config);
        assert!((body.angular_velocity - config.max_angular_impulse).abs() < 0.0001);
    }

    #[test]
    fn test_force_through_centroid_no_rotation() {
        let config = PhysicsConfig::default();
        let mut body = body_at(2.0, 3.0);
        let mid = body.midpoint();
        apply_impulse(&mut body, Vec2::new(0.3, 0.4), mid, &config);
        assert_eq!(body.angular_velocity, 0.0);
    }

    #[test]
    fn test_overlapping_pair_pushed_apart() {
        let config = PhysicsConfig::default();
        let mut a = body_at(0.0, 0.0);
        let mut b = body_at(0.5, 0.0);

        let contact = collision::detect(&a.vertices, &b.vertices).expect("bodies overlap");
        resolve(&mut a, &mut b, &contact, &config);

        let relative = b.velocity - a.velocity;
        assert!(relative.dot(contact.spring) > 0.0);
        assert!(relative.x > 0.0);
    }
}
