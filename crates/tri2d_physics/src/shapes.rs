//! Geometric primitives for triangle physics
//!
//! Pure value-type helpers that operate on a bare vertex array, so the
//! narrow phase can be exercised without constructing a full body.

use tri2d_math::Vec2;

/// Three vertices of a triangle, counter-clockwise
pub type Triangle = [Vec2; 3];

/// Arithmetic mean of the three vertices (centroid for uniform density)
#[inline]
pub fn centroid(tri: &Triangle) -> Vec2 {
    (tri[0] + tri[1] + tri[2]) / 3.0
}

/// Signed area, positive for counter-clockwise winding
#[inline]
pub fn signed_area(tri: &Triangle) -> f32 {
    0.5 * (tri[1] - tri[0]).cross(tri[2] - tri[0])
}

/// Outward unit normal of each edge `i -> i + 1`
///
/// The normal is found by removing the along-edge part of the vector from
/// the edge start to the centroid, which leaves the perpendicular pointing
/// inward; negating it gives the outward direction independent of winding.
pub fn edge_normals(tri: &Triangle) -> [Vec2; 3] {
    let mid = centroid(tri);
    let mut normals = [Vec2::ZERO; 3];
    for i in 0..3 {
        let start = tri[i];
        let edge = tri[(i + 1) % 3] - start;
        let to_mid = mid - start;
        normals[i] = (to_mid.project_onto(edge) - to_mid).normalized();
    }
    normals
}

/// Project all three vertices onto `axis`, returning `(min, max)`
#[inline]
pub fn project(tri: &Triangle, axis: Vec2) -> (f32, f32) {
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for v in tri {
        let d = v.dot(axis);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

/// A 2D axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb2D {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2D {
    /// Create a new AABB from min and max corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing the triangle
    pub fn from_triangle(tri: &Triangle) -> Self {
        Self {
            min: tri[0].min_components(tri[1]).min_components(tri[2]),
            max: tri[0].max_components(tri[1]).max_components(tri[2]),
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (width, height)
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Check if a point is inside the AABB
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Check whether two boxes overlap on both axes
    ///
    /// Touching boxes count as overlapping; only a strict gap rejects.
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }
}
