//! Sweep-and-prune broad phase.
//!
//! Candidate pairs are found by sorting bodies on the minimum x extent of
//! their bounding volume and scanning forward until the next body starts past
//! the current one's maximum. The scan is quadratic in the worst case (a
//! vertical stack shares one x interval) but close to linear for spread-out
//! scenes.

use glam::Vec2;

use crate::body::{Body, BodyId};
use crate::shape::Bounds;

/// Bounding volume used by the broad-phase overlap test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BroadStrategy {
    /// Circular bounding boxes: one squared-distance test per pair. Cheapest
    /// per pair, loosest fit for elongated shapes.
    #[default]
    Cbb,
    /// Axis-aligned bounding boxes: x overlap from the sweep, y overlap
    /// checked explicitly. Tightest fit for boxes.
    Aabb,
    /// Both tests; a pair survives only if it passes each. Useful for scenes
    /// mixing round and elongated shapes.
    Hybrid,
}

/// Per-body entry in the sweep list.
#[derive(Clone, Copy, Debug)]
struct Interval {
    id: BodyId,
    min: f32,
    max: f32,
    center: Vec2,
    cbb_radius: f32,
    bounds: Bounds,
}

/// Sweep-and-prune pair finder.
///
/// Owns its scratch storage so per-frame use allocates only on growth.
#[derive(Debug, Default)]
pub struct BroadPhase {
    strategy: BroadStrategy,
    intervals: Vec<Interval>,
    pairs: Vec<(BodyId, BodyId)>,
}

impl BroadPhase {
    pub fn new(strategy: BroadStrategy) -> Self {
        Self {
            strategy,
            intervals: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// The active bounding-volume strategy.
    pub fn strategy(&self) -> BroadStrategy {
        self.strategy
    }

    /// Switch the bounding-volume strategy.
    pub fn set_strategy(&mut self, strategy: BroadStrategy) {
        self.strategy = strategy;
    }

    /// Collect candidate pairs for the current body poses.
    ///
    /// Pairs that fail the eligibility filters (both asleep, both immovable,
    /// masked off by layers or groups) are dropped here so the narrow phase
    /// never sees them. Returned pairs always have `a < b` and the list is
    /// deterministic for a given set of poses.
    pub fn pairs(&mut self, bodies: &mut [Option<Body>]) -> &[(BodyId, BodyId)] {
        self.intervals.clear();
        self.pairs.clear();

        for (index, slot) in bodies.iter_mut().enumerate() {
            let Some(body) = slot else { continue };
            let bounds = body.bounding_box();
            let (center, cbb_radius) = body.cbb();
            let (min, max) = match self.strategy {
                BroadStrategy::Cbb => (center.x - cbb_radius, center.x + cbb_radius),
                BroadStrategy::Aabb | BroadStrategy::Hybrid => (bounds.min.x, bounds.max.x),
            };
            self.intervals.push(Interval {
                id: BodyId(index),
                min,
                max,
                center,
                cbb_radius,
                bounds,
            });
        }

        // Slot index breaks ties so the pair order is stable across frames.
        self.intervals.sort_unstable_by(|a, b| {
            a.min
                .partial_cmp(&b.min)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });

        for i in 0..self.intervals.len() {
            let lhs = self.intervals[i];
            for rhs in &self.intervals[i + 1..] {
                // Everything past this point starts past lhs too.
                if rhs.min >= lhs.max {
                    break;
                }
                if !overlap(self.strategy, &lhs, rhs) {
                    continue;
                }
                let (a, b) = if lhs.id < rhs.id {
                    (lhs.id, rhs.id)
                } else {
                    (rhs.id, lhs.id)
                };
                let (Some(body_a), Some(body_b)) = (&bodies[a.0], &bodies[b.0]) else {
                    continue;
                };
                if body_a.can_collide_with(body_b) {
                    self.pairs.push((a, b));
                }
            }
        }

        &self.pairs
    }
}

/// Bounding-volume overlap beyond the x-sweep, strict on touching.
fn overlap(strategy: BroadStrategy, a: &Interval, b: &Interval) -> bool {
    let cbb = || {
        let r = a.cbb_radius + b.cbb_radius;
        a.center.distance_squared(b.center) < r * r
    };
    let aabb = || a.bounds.min.y < b.bounds.max.y && b.bounds.min.y < a.bounds.max.y;
    match strategy {
        BroadStrategy::Cbb => cbb(),
        BroadStrategy::Aabb => aabb(),
        BroadStrategy::Hybrid => aabb() && cbb(),
    }
}
