//! Geometry primitives for collision bodies.
//!
//! Provides the shape variants a [`crate::Body`] can carry:
//! - [`Circle`] - a circle of a given radius
//! - [`Aabb`] - an axis-aligned box (never rotates)
//! - [`Polygon`] - a convex polygon, stored centered on its centroid
//!
//! Each shape knows its area, its squared radius of gyration (so bodies can
//! keep mass, density, and inertia consistent), and its bounding data for the
//! broad phase.

use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

/// Tolerance below which lengths, areas, and cross products are treated as
/// degenerate throughout the geometry code.
pub(crate) const GEOM_EPS: f32 = 1e-6;

/// An axis-aligned rectangle in world space.
///
/// Used both as a body's world bounding box and as the optional simulation
/// border for the out-of-bounds sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Bounds {
    /// Create a rectangle from its corners.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a rectangle centered at a point with the given half-extents.
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Center of the rectangle.
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Width and height.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// True if the two rectangles overlap with positive area.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// A circle shape.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Circle {
    /// Radius of the circle.
    pub radius: f32,
}

impl Circle {
    /// Create a circle, rejecting non-positive or non-finite radii.
    pub fn new(radius: f32) -> Result<Self, PhysicsError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PhysicsError::InvalidShape("circle radius must be positive"));
        }
        Ok(Self { radius })
    }

    /// Area of the circle.
    pub fn area(&self) -> f32 {
        std::f32::consts::PI * self.radius * self.radius
    }

    /// Squared radius of gyration about the center.
    pub fn gyration_sq(&self) -> f32 {
        self.radius * self.radius * 0.5
    }
}

/// An axis-aligned box shape, described by its half-extents.
///
/// Bodies carrying this shape are non-rotatable: the box stays axis-aligned
/// for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Half-width and half-height.
    pub half_extents: Vec2,
}

impl Aabb {
    /// Create a box from its full width and height.
    pub fn new(width: f32, height: f32) -> Result<Self, PhysicsError> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(PhysicsError::InvalidShape("box extents must be positive"));
        }
        Ok(Self {
            half_extents: Vec2::new(width * 0.5, height * 0.5),
        })
    }

    /// Area of the box.
    pub fn area(&self) -> f32 {
        4.0 * self.half_extents.x * self.half_extents.y
    }

    /// Squared radius of gyration about the center.
    pub fn gyration_sq(&self) -> f32 {
        (self.half_extents.x * self.half_extents.x + self.half_extents.y * self.half_extents.y)
            / 3.0
    }

    /// The four corners, counter-clockwise from the bottom-left, translated
    /// to `center`.
    pub fn corners(&self, center: Vec2) -> [Vec2; 4] {
        let h = self.half_extents;
        [
            center + Vec2::new(-h.x, -h.y),
            center + Vec2::new(h.x, -h.y),
            center + Vec2::new(h.x, h.y),
            center + Vec2::new(-h.x, h.y),
        ]
    }

    /// The box as a 4-vertex polygon, so polygon collision tests apply to it.
    ///
    /// Built directly rather than through [`Polygon::new`]: the extents were
    /// validated at construction, so the hull cannot be degenerate.
    pub(crate) fn hull(&self) -> Polygon {
        let h = self.half_extents;
        Polygon {
            vertices: self.corners(Vec2::ZERO).to_vec(),
            normals: vec![Vec2::new(0.0, -1.0), Vec2::new(1.0, 0.0)],
            area: self.area(),
            gyration_sq: self.gyration_sq(),
            cbb_radius: h.length(),
        }
    }
}

/// A convex polygon shape.
///
/// Vertices are stored counter-clockwise in local space, recentered on the
/// centroid at construction. The linearly-independent edge normals are
/// precomputed once for the SAT narrow phase: parallel normals are redundant
/// for convex shapes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
    area: f32,
    gyration_sq: f32,
    cbb_radius: f32,
}

impl Polygon {
    /// Create a convex polygon from its vertices.
    ///
    /// Accepts either winding order and normalizes to counter-clockwise.
    /// Rejects polygons with fewer than three vertices, degenerate area, or a
    /// reflex vertex.
    pub fn new(mut vertices: Vec<Vec2>) -> Result<Self, PhysicsError> {
        if vertices.len() < 3 {
            return Err(PhysicsError::InvalidShape("polygon needs at least 3 vertices"));
        }

        let signed = signed_area(&vertices);
        if signed.abs() < GEOM_EPS {
            return Err(PhysicsError::InvalidShape("polygon area is degenerate"));
        }
        if signed < 0.0 {
            vertices.reverse();
        }

        let n = vertices.len();
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let c = vertices[(i + 2) % n];
            if (b - a).perp_dot(c - b) < -GEOM_EPS {
                return Err(PhysicsError::InvalidShape("polygon is not convex"));
            }
        }

        let area = signed.abs();
        let centroid = centroid(&vertices, area);
        for v in &mut vertices {
            *v -= centroid;
        }

        let mut normals: Vec<Vec2> = Vec::new();
        for i in 0..n {
            let edge = vertices[(i + 1) % n] - vertices[i];
            let len = edge.length();
            if len < GEOM_EPS {
                continue;
            }
            // Outward normal of a counter-clockwise edge.
            let normal = Vec2::new(edge.y, -edge.x) / len;
            if !normals.iter().any(|m| normal.perp_dot(*m).abs() < GEOM_EPS) {
                normals.push(normal);
            }
        }

        let gyration_sq = polar_moment(&vertices) / area;
        let cbb_radius = vertices
            .iter()
            .map(|v| v.length())
            .fold(0.0f32, f32::max);

        Ok(Self {
            vertices,
            normals,
            area,
            gyration_sq,
            cbb_radius,
        })
    }

    /// Create a regular polygon with `sides` vertices on a circle of the
    /// given radius.
    pub fn regular(sides: usize, radius: f32) -> Result<Self, PhysicsError> {
        if sides < 3 {
            return Err(PhysicsError::InvalidShape("polygon needs at least 3 vertices"));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PhysicsError::InvalidShape("polygon radius must be positive"));
        }
        let step = std::f32::consts::TAU / sides as f32;
        let vertices = (0..sides)
            .map(|i| Vec2::from_angle(i as f32 * step) * radius)
            .collect();
        Self::new(vertices)
    }

    /// Create a rectangle polygon from its full width and height.
    ///
    /// Unlike [`Aabb`], a rectangle polygon is free to rotate.
    pub fn rect(width: f32, height: f32) -> Result<Self, PhysicsError> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(PhysicsError::InvalidShape("rectangle extents must be positive"));
        }
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::new(vec![
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ])
    }

    /// Local-space vertices, counter-clockwise, centered on the centroid.
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// The deduplicated local-space edge normals.
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    /// Area of the polygon.
    pub fn area(&self) -> f32 {
        self.area
    }

    /// Squared radius of gyration about the centroid.
    pub fn gyration_sq(&self) -> f32 {
        self.gyration_sq
    }

    /// Radius of the smallest circle around the centroid containing the shape.
    pub fn cbb_radius(&self) -> f32 {
        self.cbb_radius
    }

    /// Vertices transformed to world space for the given pose.
    pub fn world_vertices(&self, position: Vec2, angle: f32) -> Vec<Vec2> {
        let rot = Vec2::from_angle(angle);
        self.vertices
            .iter()
            .map(|v| position + rot.rotate(*v))
            .collect()
    }

    /// Edge normals rotated to world space for the given orientation.
    pub fn world_normals(&self, angle: f32) -> Vec<Vec2> {
        let rot = Vec2::from_angle(angle);
        self.normals.iter().map(|n| rot.rotate(*n)).collect()
    }
}

/// A collision shape for rigid bodies.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// Circle shape.
    Circle(Circle),
    /// Axis-aligned box shape.
    Aabb(Aabb),
    /// Convex polygon shape.
    Polygon(Polygon),
}

impl Shape {
    /// Create a circle shape.
    pub fn circle(radius: f32) -> Result<Self, PhysicsError> {
        Circle::new(radius).map(Shape::Circle)
    }

    /// Create an axis-aligned box shape.
    pub fn aabb(width: f32, height: f32) -> Result<Self, PhysicsError> {
        Aabb::new(width, height).map(Shape::Aabb)
    }

    /// Create a convex polygon shape.
    pub fn polygon(vertices: Vec<Vec2>) -> Result<Self, PhysicsError> {
        Polygon::new(vertices).map(Shape::Polygon)
    }

    /// Area of the shape.
    pub fn area(&self) -> f32 {
        match self {
            Shape::Circle(c) => c.area(),
            Shape::Aabb(b) => b.area(),
            Shape::Polygon(p) => p.area(),
        }
    }

    /// Squared radius of gyration about the center of mass.
    pub fn gyration_sq(&self) -> f32 {
        match self {
            Shape::Circle(c) => c.gyration_sq(),
            Shape::Aabb(b) => b.gyration_sq(),
            Shape::Polygon(p) => p.gyration_sq(),
        }
    }

    /// Radius of the circular bounding box (CBB) around the body position.
    pub fn cbb_radius(&self) -> f32 {
        match self {
            Shape::Circle(c) => c.radius,
            Shape::Aabb(b) => b.half_extents.length(),
            Shape::Polygon(p) => p.cbb_radius(),
        }
    }

    /// Whether bodies carrying this shape may rotate.
    pub fn can_rotate(&self) -> bool {
        !matches!(self, Shape::Aabb(_))
    }

    /// World-space bounding box for the given pose.
    pub fn bounds(&self, position: Vec2, angle: f32) -> Bounds {
        match self {
            Shape::Circle(c) => Bounds::from_center(position, Vec2::splat(c.radius)),
            Shape::Aabb(b) => Bounds::from_center(position, b.half_extents),
            Shape::Polygon(p) => {
                let rot = Vec2::from_angle(angle);
                let mut min = Vec2::splat(f32::INFINITY);
                let mut max = Vec2::splat(f32::NEG_INFINITY);
                for v in p.vertices() {
                    let w = position + rot.rotate(*v);
                    min = min.min(w);
                    max = max.max(w);
                }
                Bounds::new(min, max)
            }
        }
    }
}

/// Signed area of a polygon (positive for counter-clockwise winding).
pub(crate) fn signed_area(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    let mut sum = 0.0;
    for i in 0..n {
        sum += vertices[i].perp_dot(vertices[(i + 1) % n]);
    }
    sum * 0.5
}

/// Centroid of a polygon with the given (unsigned) area.
pub(crate) fn centroid(vertices: &[Vec2], area: f32) -> Vec2 {
    let n = vertices.len();
    let mut sum = Vec2::ZERO;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        sum += (a + b) * a.perp_dot(b);
    }
    sum / (6.0 * area)
}

/// Second polar moment of area about the origin, per unit density.
fn polar_moment(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        sum += a.perp_dot(b) * (a.dot(a) + a.dot(b) + b.dot(b));
    }
    sum / 12.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_area_and_gyration() {
        let c = Circle::new(2.0).unwrap();
        assert!((c.area() - std::f32::consts::PI * 4.0).abs() < 1e-4);
        assert!((c.gyration_sq() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_shapes_rejected() {
        assert!(Circle::new(0.0).is_err());
        assert!(Circle::new(-1.0).is_err());
        assert!(Circle::new(f32::NAN).is_err());
        assert!(Aabb::new(10.0, 0.0).is_err());
        assert!(Polygon::new(vec![Vec2::ZERO, Vec2::X]).is_err());
        // Collinear vertices enclose no area.
        assert!(Polygon::new(vec![Vec2::ZERO, Vec2::X, Vec2::X * 2.0]).is_err());
    }

    #[test]
    fn concave_polygon_rejected() {
        let result = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(2.0, 1.0), // reflex vertex
            Vec2::new(0.0, 4.0),
        ]);
        assert_eq!(
            result.unwrap_err(),
            PhysicsError::InvalidShape("polygon is not convex")
        );
    }

    #[test]
    fn polygon_recentered_on_centroid() {
        let p = Polygon::new(vec![
            Vec2::new(10.0, 10.0),
            Vec2::new(14.0, 10.0),
            Vec2::new(14.0, 14.0),
            Vec2::new(10.0, 14.0),
        ])
        .unwrap();
        let c = p.vertices().iter().copied().sum::<Vec2>() / 4.0;
        assert!(c.length() < 1e-5, "centroid should be at origin, got {c:?}");
        assert!((p.area() - 16.0).abs() < 1e-4);
    }

    #[test]
    fn clockwise_input_normalized_to_ccw() {
        let p = Polygon::new(vec![
            Vec2::new(0.0, 4.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(0.0, 0.0),
        ])
        .unwrap();
        assert!(signed_area(p.vertices()) > 0.0);
    }

    #[test]
    fn rectangle_normals_deduplicated() {
        // A rectangle has 4 edges but only 2 independent directions.
        let p = Polygon::rect(10.0, 4.0).unwrap();
        assert_eq!(p.normals().len(), 2);

        // A regular hexagon has 3 independent directions.
        let hex = Polygon::regular(6, 1.0).unwrap();
        assert_eq!(hex.normals().len(), 3);

        // A regular pentagon has no parallel edges at all.
        let pent = Polygon::regular(5, 1.0).unwrap();
        assert_eq!(pent.normals().len(), 5);
    }

    #[test]
    fn rect_polygon_matches_box_inertia() {
        // Same geometry must give the same gyration radius through either
        // construction path.
        let p = Polygon::rect(6.0, 2.0).unwrap();
        let b = Aabb::new(6.0, 2.0).unwrap();
        assert!((p.gyration_sq() - b.gyration_sq()).abs() < 1e-4);
        assert!((p.area() - b.area()).abs() < 1e-4);
    }

    #[test]
    fn world_vertices_follow_pose() {
        let p = Polygon::rect(2.0, 2.0).unwrap();
        let verts = p.world_vertices(Vec2::new(5.0, 0.0), std::f32::consts::FRAC_PI_2);
        // Rotating a unit square a quarter turn maps corners onto corners.
        for v in &verts {
            assert!(((*v - Vec2::new(5.0, 0.0)).length() - 2.0f32.sqrt()).abs() < 1e-5);
        }
    }

    #[test]
    fn shape_bounds_cover_rotated_polygon() {
        let shape = Shape::Polygon(Polygon::rect(2.0, 2.0).unwrap());
        let bounds = shape.bounds(Vec2::ZERO, std::f32::consts::FRAC_PI_4);
        // A unit square rotated 45 degrees spans sqrt(2) in each direction.
        let expected = 2.0f32.sqrt();
        assert!((bounds.max.x - expected).abs() < 1e-4);
        assert!((bounds.max.y - expected).abs() < 1e-4);
    }

    #[test]
    fn cbb_radius_contains_shape() {
        let shape = Shape::aabb(6.0, 8.0).unwrap();
        assert!((shape.cbb_radius() - 5.0).abs() < 1e-5);

        let hex = Shape::Polygon(Polygon::regular(6, 3.0).unwrap());
        assert!((hex.cbb_radius() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn bounds_overlap_is_strict() {
        let a = Bounds::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let b = Bounds::new(Vec2::new(5.0, 5.0), Vec2::new(15.0, 15.0));
        let touching = Bounds::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        assert!(a.overlaps(&b));
        // Zero-width overlap is contact, not collision.
        assert!(!a.overlaps(&touching));
    }
}
