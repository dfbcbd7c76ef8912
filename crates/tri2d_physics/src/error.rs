//! Scene construction errors
//!
//! Only building or editing a world can fail. Stepping never does: a pair
//! that fails any collision stage is simply skipped.

use std::fmt;

/// Error type for rejected scene input
#[derive(Clone, Debug, PartialEq)]
pub enum SceneError {
    /// Strip height is zero, negative or not finite
    InvalidStripHeight(f32),
    /// Inverse mass is negative or not finite
    InvalidInverseMass(f32),
    /// Triangle has (near) zero area
    DegenerateTriangle,
    /// Triangle vertices wind clockwise
    ClockwiseWinding,
    /// A vertex coordinate is NaN or infinite
    NonFiniteVertex,
    /// The worker thread pool could not be created
    ThreadPool(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::InvalidStripHeight(h) => write!(f, "Invalid strip height: {}", h),
            SceneError::InvalidInverseMass(m) => write!(f, "Invalid inverse mass: {}", m),
            SceneError::DegenerateTriangle => write!(f, "Degenerate triangle: zero area"),
            SceneError::ClockwiseWinding => write!(f, "Triangle vertices must be counter-clockwise"),
            SceneError::NonFiniteVertex => write!(f, "Triangle has a non-finite vertex"),
            SceneError::ThreadPool(msg) => write!(f, "Failed to build thread pool: {}", msg),
        }
    }
}

impl std::error::Error for SceneError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_value() {
        let msg = format!("{}", SceneError::InvalidStripHeight(-2.0));
        assert!(msg.contains("strip height"));
        assert!(msg.contains("-2"));

        let msg = format!("{}", SceneError::InvalidInverseMass(-1.5));
        assert!(msg.contains("-1.5"));
    }

    #[test]
    fn test_thread_pool_display() {
        let err = SceneError::ThreadPool("out of threads".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("thread pool"));
        assert!(msg.contains("out of threads"));
    }

    #[test]
    fn test_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(SceneError::ClockwiseWinding);
        assert!(err.to_string().contains("counter-clockwise"));
    }
}
