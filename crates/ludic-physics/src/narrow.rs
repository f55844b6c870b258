//! Narrow-phase collision tests.
//!
//! Each candidate pair from the broad phase is reduced to at most one contact:
//! a world-space point, a unit normal oriented from the first body toward the
//! second, and a penetration depth. Circles and axis-aligned boxes have exact
//! closed-form tests; polygon pairs go through SAT with a Sutherland-Hodgman
//! clip to place the contact point.
//!
//! All overlap tests are strict: shapes that merely touch do not collide.

use glam::Vec2;

use crate::body::Body;
use crate::shape::{Aabb, Circle, Polygon, Shape, GEOM_EPS};

/// Number of fallback separating directions when the pooled normal count is
/// large, spaced 15 degrees apart over a half turn.
const FALLBACK_DIRECTIONS: usize = 11;

/// Pooled normal count at which SAT switches to the fixed direction fan.
const NORMAL_POOL_LIMIT: usize = 9;

/// Geometric contact between two bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ContactData {
    /// Representative world-space contact point.
    pub point: Vec2,
    /// Unit normal pointing from the first body toward the second.
    pub normal: Vec2,
    /// Penetration depth along the normal, always positive.
    pub delta: f32,
}

impl ContactData {
    /// The same contact seen from the other body.
    fn flip(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Compute the contact between two bodies, if their shapes overlap.
pub(crate) fn collide(a: &Body, b: &Body) -> Option<ContactData> {
    let (pa, pb) = (a.position(), b.position());
    match (a.shape(), b.shape()) {
        (Shape::Circle(ca), Shape::Circle(cb)) => circle_circle(ca, pa, cb, pb),
        (Shape::Aabb(ba), Shape::Aabb(bb)) => aabb_aabb(ba, pa, bb, pb),
        (Shape::Circle(c), Shape::Aabb(bx)) => {
            circle_polygon(c, pa, &bx.hull(), pb, 0.0)
        }
        (Shape::Aabb(bx), Shape::Circle(c)) => {
            circle_polygon(c, pb, &bx.hull(), pa, 0.0).map(ContactData::flip)
        }
        (Shape::Circle(c), Shape::Polygon(p)) => circle_polygon(c, pa, p, pb, b.angle()),
        (Shape::Polygon(p), Shape::Circle(c)) => {
            circle_polygon(c, pb, p, pa, a.angle()).map(ContactData::flip)
        }
        (Shape::Polygon(p1), Shape::Polygon(p2)) => {
            polygon_polygon(p1, pa, a.angle(), p2, pb, b.angle())
        }
        (Shape::Aabb(bx), Shape::Polygon(p)) => {
            polygon_polygon(&bx.hull(), pa, 0.0, p, pb, b.angle())
        }
        (Shape::Polygon(p), Shape::Aabb(bx)) => {
            polygon_polygon(p, pa, a.angle(), &bx.hull(), pb, 0.0)
        }
    }
}

fn circle_circle(a: &Circle, pa: Vec2, b: &Circle, pb: Vec2) -> Option<ContactData> {
    let d = pb - pa;
    let dist_sq = d.length_squared();
    let r = a.radius + b.radius;
    if dist_sq >= r * r {
        return None;
    }
    let dist = dist_sq.sqrt();
    // Concentric circles have no preferred direction; pick +x.
    let normal = if dist > GEOM_EPS { d / dist } else { Vec2::X };
    let delta = r - dist;
    let point = pa + normal * (a.radius - delta * 0.5);
    Some(ContactData {
        point,
        normal,
        delta,
    })
}

fn aabb_aabb(a: &Aabb, pa: Vec2, b: &Aabb, pb: Vec2) -> Option<ContactData> {
    let d = pb - pa;
    let overlap_x = a.half_extents.x + b.half_extents.x - d.x.abs();
    let overlap_y = a.half_extents.y + b.half_extents.y - d.y.abs();
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return None;
    }

    // Separate along the axis with the smaller overlap, x on ties.
    let (delta, normal) = if overlap_x <= overlap_y {
        (overlap_x, Vec2::new(d.x.signum(), 0.0))
    } else {
        (overlap_y, Vec2::new(0.0, d.y.signum()))
    };

    // Center of the intersection rectangle.
    let min = (pa - a.half_extents).max(pb - b.half_extents);
    let max = (pa + a.half_extents).min(pb + b.half_extents);
    Some(ContactData {
        point: (min + max) * 0.5,
        normal,
        delta,
    })
}

fn circle_polygon(
    circle: &Circle,
    center: Vec2,
    polygon: &Polygon,
    poly_pos: Vec2,
    poly_angle: f32,
) -> Option<ContactData> {
    let verts = polygon.world_vertices(poly_pos, poly_angle);
    let n = verts.len();
    let normals = edge_normals(&verts);

    // Signed distance of the center from each edge line; positive outside.
    let mut max_sd = f32::NEG_INFINITY;
    let mut edge = 0;
    for (i, world_normal) in normals.iter().enumerate() {
        let sd = world_normal.dot(center - verts[i]);
        if sd > max_sd {
            max_sd = sd;
            edge = i;
        }
    }

    if max_sd < 0.0 {
        // Center inside the polygon: push out through the nearest edge.
        let delta = circle.radius - max_sd;
        // Contact normal points from circle toward polygon interior side.
        let normal = -normals[edge];
        let point = center + normal * (circle.radius - delta * 0.5);
        return Some(ContactData {
            point,
            normal,
            delta,
        });
    }

    // Center outside: closest point on the boundary of the reference edge.
    let a = verts[edge];
    let b = verts[(edge + 1) % n];
    let t = ((center - a).dot(b - a) / (b - a).length_squared()).clamp(0.0, 1.0);
    let closest = a + (b - a) * t;
    let d = closest - center;
    let dist_sq = d.length_squared();
    if dist_sq >= circle.radius * circle.radius {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > GEOM_EPS {
        d / dist
    } else {
        -normals[edge]
    };
    let delta = circle.radius - dist;
    let point = center + normal * (circle.radius - delta * 0.5);
    Some(ContactData {
        point,
        normal,
        delta,
    })
}

/// Per-edge outward normals, one per edge (no deduplication).
fn edge_normals(vertices: &[Vec2]) -> Vec<Vec2> {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let edge = vertices[(i + 1) % n] - vertices[i];
            Vec2::new(edge.y, -edge.x).normalize_or(Vec2::X)
        })
        .collect()
}

fn polygon_polygon(
    a: &Polygon,
    pa: Vec2,
    angle_a: f32,
    b: &Polygon,
    pb: Vec2,
    angle_b: f32,
) -> Option<ContactData> {
    let verts_a = a.world_vertices(pa, angle_a);
    let verts_b = b.world_vertices(pb, angle_b);

    // Candidate separating axes: the union of both deduplicated normal sets,
    // or a fixed fan of directions once the pool grows past the limit.
    let mut axes = a.world_normals(angle_a);
    for n in b.world_normals(angle_b) {
        if !axes.iter().any(|m| n.perp_dot(*m).abs() < GEOM_EPS) {
            axes.push(n);
        }
    }
    if axes.len() >= NORMAL_POOL_LIMIT {
        let step = std::f32::consts::PI / 12.0; // 15 degrees
        axes = (0..FALLBACK_DIRECTIONS)
            .map(|i| Vec2::from_angle(i as f32 * step))
            .collect();
    }

    // SAT: keep the axis with the smallest overlap.
    let mut best_overlap = f32::INFINITY;
    let mut best_axis = Vec2::X;
    for axis in axes {
        let (min_a, max_a) = project(&verts_a, axis);
        let (min_b, max_b) = project(&verts_b, axis);
        let overlap = (max_a - min_b).min(max_b - min_a);
        if overlap <= 0.0 {
            return None;
        }
        if overlap < best_overlap {
            best_overlap = overlap;
            best_axis = axis;
        }
    }

    // Orient the normal from A toward B along the chosen axis.
    let normal = if (pb - pa).dot(best_axis) >= 0.0 {
        best_axis
    } else {
        -best_axis
    };

    // Contact point: centroid of A clipped against B's half-planes. A clip
    // with no area means the shapes only graze, which is not a collision.
    let clipped = clip_polygon(&verts_a, &verts_b)?;
    if clipped.len() < 3 {
        return None;
    }
    let area = crate::shape::signed_area(&clipped);
    if area <= GEOM_EPS {
        return None;
    }
    let point = crate::shape::centroid(&clipped, area);

    Some(ContactData {
        point,
        normal,
        delta: best_overlap,
    })
}

/// Projection interval of a vertex set on an axis.
fn project(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for v in vertices {
        let p = v.dot(axis);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

/// Sutherland-Hodgman clip of `subject` against the convex `clip` polygon.
///
/// Both inputs are counter-clockwise. Returns `None` when the clip empties
/// the subject, which happens for barely-overlapping SAT results where the
/// vertex sets do not actually interpenetrate.
fn clip_polygon(subject: &[Vec2], clip: &[Vec2]) -> Option<Vec<Vec2>> {
    let mut output = subject.to_vec();
    let n = clip.len();
    for i in 0..n {
        let a = clip[i];
        let b = clip[(i + 1) % n];
        let input = std::mem::take(&mut output);
        if input.is_empty() {
            return None;
        }
        // For a counter-clockwise clip polygon the interior is left of a->b.
        let inside = |p: Vec2| (b - a).perp_dot(p - a) >= 0.0;
        for j in 0..input.len() {
            let cur = input[j];
            let next = input[(j + 1) % input.len()];
            let cur_in = inside(cur);
            let next_in = inside(next);
            if cur_in {
                output.push(cur);
            }
            if cur_in != next_in {
                if let Some(p) = line_intersection(a, b, cur, next) {
                    output.push(p);
                }
            }
        }
    }
    if output.is_empty() {
        None
    } else {
        Some(output)
    }
}

/// Intersection of the infinite line through `a`,`b` with segment `c`,`d`.
fn line_intersection(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> Option<Vec2> {
    let dir = b - a;
    let seg = d - c;
    let denom = dir.perp_dot(seg);
    if denom.abs() < GEOM_EPS {
        return None;
    }
    let t = (a - c).perp_dot(dir) / -denom;
    Some(c + seg * t)
}
