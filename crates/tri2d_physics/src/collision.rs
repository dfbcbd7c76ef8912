//! Narrow-phase collision detection between two triangles
//!
//! Detection runs three stages, each a cheap early exit for the next:
//! 1. Axis-aligned bounding box rejection
//! 2. Separating Axis Theorem over the six edge normals, producing the
//!    minimum translation vector (MTV)
//! 3. Contact point reconstruction by clipping the incident edge against
//!    the reference edge
//!
//! A `None` from any stage is the ordinary "no interaction this step"
//! outcome, not an error.

use crate::shapes::{self, Aabb2D, Triangle};
use tri2d_math::Vec2;

/// Contact information from a collision
///
/// Ephemeral: produced by [`detect`], consumed by the resolver in the same
/// step and then dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Reconstructed point of contact
    pub point: Vec2,
    /// Displacement needed to separate, directed from the first body toward the second
    pub spring: Vec2,
}

impl Contact {
    /// Create a new contact
    pub fn new(point: Vec2, spring: Vec2) -> Self {
        Self { point, spring }
    }

    /// Overlap depth along the separating axis
    pub fn depth(&self) -> f32 {
        self.spring.length()
    }
}

/// An edge selected for clipping, together with the vertex it was chosen from
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Feature {
    /// Vertex furthest along the search normal
    pub extreme: Vec2,
    /// Edge endpoints in winding order; one of them is `extreme`
    pub edge: [Vec2; 2],
}

impl Feature {
    /// The endpoint of the edge that is not the extreme vertex
    #[inline]
    pub fn other(&self) -> Vec2 {
        if self.edge[0] == self.extreme {
            self.edge[1]
        } else {
            self.edge[0]
        }
    }

    /// Edge direction, first endpoint to second
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.edge[1] - self.edge[0]
    }
}

/// Run the full narrow phase: AABB reject, SAT, then contact reconstruction
///
/// The contact's spring vector points from `a` toward `b`.
pub fn detect(a: &Triangle, b: &Triangle) -> Option<Contact> {
    if !aabb_overlap(a, b) {
        return None;
    }
    let mtv = separating_axis(a, b)?;
    let point = contact_point(a, b, mtv)?;
    Some(Contact::new(point, mtv))
}

/// Test whether the bounding boxes of two triangles overlap
#[inline]
pub fn aabb_overlap(a: &Triangle, b: &Triangle) -> bool {
    Aabb2D::from_triangle(a).overlaps(&Aabb2D::from_triangle(b))
}

/// Separating Axis Theorem test
///
/// Candidate axes are the outward edge normals of `b` followed by those of
/// `a`. Returns `None` as soon as an axis separates the projections
/// (touching counts as separated). Otherwise returns the minimum translation
/// vector: the least-overlap axis scaled by its overlap, oriented from the
/// centroid of `a` toward the centroid of `b`. On equal overlaps the first
/// axis evaluated wins.
pub fn separating_axis(a: &Triangle, b: &Triangle) -> Option<Vec2> {
    let normals_a = shapes::edge_normals(a);
    let normals_b = shapes::edge_normals(b);

    let mut best_axis = Vec2::ZERO;
    let mut min_depth = f32::MAX;

    for axis in normals_b.iter().chain(normals_a.iter()).copied() {
        let (min_a, max_a) = shapes::project(a, axis);
        let (min_b, max_b) = shapes::project(b, axis);

        let depth = (max_a - min_b).min(max_b - min_a);
        if depth <= 0.0 {
            return None;
        }
        if depth < min_depth {
            min_depth = depth;
            best_axis = axis;
        }
    }

    let toward_b = shapes::centroid(b) - shapes::centroid(a);
    if best_axis.dot(toward_b) < 0.0 {
        best_axis = -best_axis;
    }
    Some(best_axis * min_depth)
}

/// Select the edge of `tri` that best faces along `normal`
///
/// Picks the vertex with the greatest projection on `normal`, then whichever
/// of its two adjacent edges is closer to perpendicular to `normal`.
pub fn best_edge(tri: &Triangle, normal: Vec2) -> Feature {
    let mut index = 0;
    let mut max = f32::MIN;
    for (i, v) in tri.iter().enumerate() {
        let proj = v.dot(normal);
        if proj > max {
            max = proj;
            index = i;
        }
    }

    let extreme = tri[index];
    let prev = tri[(index + 2) % 3];
    let next = tri[(index + 1) % 3];

    let incoming = (extreme - prev).normalized();
    let outgoing = (extreme - next).normalized();

    if incoming.dot(normal).abs() < outgoing.dot(normal).abs() {
        Feature { extreme, edge: [prev, extreme] }
    } else {
        Feature { extreme, edge: [extreme, next] }
    }
}

/// Clip a segment against the half-plane `dot(normal, p) >= offset`
///
/// Endpoints on the kept side survive; if the segment crosses the boundary
/// the crossing point is added. Returns the surviving points in order.
pub fn clip(v1: Vec2, v2: Vec2, normal: Vec2, offset: f32) -> ClippedPoints {
    let mut kept = ClippedPoints::default();
    let d1 = normal.dot(v1) - offset;
    let d2 = normal.dot(v2) - offset;

    if d1 >= 0.0 {
        kept.push(v1);
    }
    if d2 >= 0.0 {
        kept.push(v2);
    }
    if d1 * d2 < 0.0 {
        let t = d1 / (d1 - d2);
        kept.push(v1 + (v2 - v1) * t);
    }
    kept
}

/// Up to two points surviving a clip
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClippedPoints {
    points: [Vec2; 2],
    len: usize,
}

impl ClippedPoints {
    fn push(&mut self, p: Vec2) {
        if self.len < 2 {
            self.points[self.len] = p;
            self.len += 1;
        }
    }

    /// Number of surviving points
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing survived
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Surviving points
    pub fn as_slice(&self) -> &[Vec2] {
        &self.points[..self.len]
    }
}

/// Reconstruct a single contact point from the MTV using edge clipping
///
/// `mtv` must point from `a` toward `b`, as returned by [`separating_axis`].
/// Returns `None` when clipping leaves too few points, which happens for
/// near-misses; the pair is then skipped for this step.
pub fn contact_point(a: &Triangle, b: &Triangle, mtv: Vec2) -> Option<Vec2> {
    let normal = mtv.normalized();
    let feature_a = best_edge(a, normal);
    let feature_b = best_edge(b, -normal);

    let depth_a = (feature_a.extreme - feature_a.other()).dot(normal).abs();
    let depth_b = (feature_b.extreme - feature_b.other()).dot(normal).abs();

    // The flatter edge is the reference
    let (reference, incident, incident_is_b) = if depth_a < depth_b {
        (feature_a, feature_b, true)
    } else {
        (feature_b, feature_a, false)
    };

    let along = reference.direction().normalized();
    let [ref_start, ref_end] = reference.edge;

    let first = clip(incident.edge[0], incident.edge[1], along, along.dot(ref_start));
    if first.len() < 2 {
        return None;
    }
    let [c0, c1] = first.points;

    let second = clip(c0, c1, -along, -along.dot(ref_end));
    if second.len() < 2 {
        return None;
    }

    // Perpendicular to the reference edge pointing into the reference body
    let mut inward = along.perp_cw();
    if inward.dot(normal) < 0.0 {
        inward = -inward;
    }
    if incident_is_b {
        inward = -inward;
    }

    let max = inward.dot(reference.extreme);
    let mut kept = ClippedPoints::default();
    for &p in second.as_slice() {
        if inward.dot(p) - max >= 0.0 {
            kept.push(p);
        }
    }

    match kept.as_slice() {
        [p0, p1] => Some((*p0 + *p1) / 2.0),
        [p] => Some(*p),
        _ => None,
    }
}
