//! Per-body time integration

use crate::body::Body;
use crate::world::PhysicsConfig;

/// Advance one body by `dt` seconds
///
/// Rotates the vertices about the centroid, translates them by the current
/// velocity, then applies gravity and damping to the velocities. Immovable
/// bodies are left exactly as they are.
pub fn time_step(body: &mut Body, dt: f32, config: &PhysicsConfig) {
    if body.is_static() {
        return;
    }

    body.rotate(body.angular_velocity * dt);
    body.translate(body.velocity * dt);

    body.velocity.y += config.gravity * dt;
    body.velocity *= config.damping;
    body.angular_velocity *= config.damping;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tri2d_math::Vec2;

    #[test]
    fn test_static_body_unchanged() {
        let config = PhysicsConfig::default();
        let mut body = Body::equilateral(Vec2::new(1.0, 2.0), 1.0)
            .with_inverse_mass(0.0)
            .with_velocity(Vec2::new(5.0, 5.0))
            .with_angular_velocity(1.0);
        let before = body;

        for _ in 0..100 {
            time_step(&mut body, 0.01, &config);
        }

        assert_eq!(body, before);
    }

    #[test]
    fn test_gravity_applied_after_move() {
        let config = PhysicsConfig::default();
        let mut body = Body::equilateral(Vec2::ZERO, 1.0);
        let before = body.vertices;

        time_step(&mut body, 0.1, &config);

        // Started at rest, so the pose does not change on the first step
        assert_eq!(body.vertices, before);
        // -10 * 0.1, then damped
        assert!((body.velocity.y + 0.9995).abs() < 0.0001);
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn test_translation() {
        let config = PhysicsConfig { gravity: 0.0, damping: 1.0, ..PhysicsConfig::default() };
        let mut body = Body::equilateral(Vec2::ZERO, 1.0).with_velocity(Vec2::new(2.0, -1.0));

        time_step(&mut body, 0.5, &config);

        let mid = body.midpoint();
        assert!((mid.x - 1.0).abs() < 0.0001);
        assert!((mid.y + 0.5).abs() < 0.0001);
        assert_eq!(body.velocity, Vec2::new(2.0, -1.0));
    }

    #[test]
    fn test_rotation_about_centroid() {
        let config = PhysicsConfig { gravity: 0.0, damping: 1.0, ..PhysicsConfig::default() };
        let mut body = Body::equilateral(Vec2::new(3.0, 4.0), 1.0).with_angular_velocity(1.0);
        let top = body.vertices[0];

        time_step(&mut body, std::f32::consts::FRAC_PI_2, &config);

        // Quarter turn counter-clockwise moves the apex to the left of the centroid
        let mid = body.midpoint();
        assert!((mid.x - 3.0).abs() < 0.0001);
        assert!((mid.y - 4.0).abs() < 0.0001);
        assert!(body.vertices[0].x < top.x);
        assert!((body.vertices[0].y - 4.0).abs() < 0.0001);
        assert!(body.is_counter_clockwise());
    }

    #[test]
    fn test_damping_decays_velocity() {
        let config = PhysicsConfig { gravity: 0.0, ..PhysicsConfig::default() };
        let mut body = Body::equilateral(Vec2::ZERO, 1.0)
            .with_velocity(Vec2::new(1.0, 0.0))
            .with_angular_velocity(1.0);

        for _ in 0..1000 {
            time_step(&mut body, 0.0005, &config);
        }

        // 0.9995^1000
        let expected = 0.606_3;
        assert!((body.velocity.x - expected).abs() < 0.001);
        assert!((body.angular_velocity - expected).abs() < 0.001);
    }

    #[test]
    fn test_winding_preserved_while_spinning() {
        let config = PhysicsConfig::default();
        let mut body = Body::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.3), Vec2::new(0.4, 1.5))
            .with_angular_velocity(-7.0)
            .with_velocity(Vec2::new(0.3, 1.0));
        let area = body.signed_area();

        for _ in 0..500 {
            time_step(&mut body, 0.01, &config);
            assert!(body.is_counter_clockwise());
        }
        assert!((body.signed_area() - area).abs() < 0.01);
    }
}
