//! Contact resolution with sequential impulses.
//!
//! Each contact is resolved independently: a normal impulse removes the
//! approaching velocity (scaled by restitution), a tangential impulse models
//! Coulomb friction, and a positional pass bleeds off penetration so stacked
//! bodies do not sink into each other.

use glam::Vec2;

use crate::body::{Body, BodyId};

/// Penetration below this depth is left to the velocity solve alone.
const MIN_PENETRATION: f32 = 1e-3;

/// Divisors below this magnitude are treated as singular and the solve falls
/// back to the frictionless path.
const SOLVER_EPS: f32 = 1e-9;

/// A contact scheduled for resolution this frame.
///
/// Handed to [`crate::CollisionHooks::pre_collision`] before the impulse is
/// applied, where it can be inspected, have its materials adjusted, or be
/// [cancelled](Collision::cancel).
#[derive(Debug, Clone, Copy)]
pub struct Collision {
    a: BodyId,
    b: BodyId,
    point: Vec2,
    normal: Vec2,
    delta: f32,
    restitution: f32,
    friction: f32,
    active: bool,
}

impl Collision {
    pub(crate) fn new(
        a: BodyId,
        b: BodyId,
        point: Vec2,
        normal: Vec2,
        delta: f32,
        restitution: f32,
        friction: f32,
    ) -> Self {
        Self {
            a,
            b,
            point,
            normal,
            delta,
            restitution,
            friction,
            active: true,
        }
    }

    /// First body of the pair.
    pub fn body_a(&self) -> BodyId {
        self.a
    }

    /// Second body of the pair.
    pub fn body_b(&self) -> BodyId {
        self.b
    }

    /// World-space contact point.
    pub fn point(&self) -> Vec2 {
        self.point
    }

    /// Unit contact normal, pointing from the first body toward the second.
    pub fn normal(&self) -> Vec2 {
        self.normal
    }

    /// Penetration depth along the normal.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Combined restitution for this contact.
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Override the combined restitution for this contact only.
    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = restitution;
    }

    /// Combined friction for this contact.
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Override the combined friction for this contact only.
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = friction;
    }

    /// Drop this contact: no impulse and no positional correction will be
    /// applied.
    pub fn cancel(&mut self) {
        self.active = false;
    }

    /// Whether the contact is still scheduled for resolution.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The same contact with the two bodies exchanged.
    pub fn swap(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            normal: -self.normal,
            ..*self
        }
    }

    /// Apply the contact impulse to the pair.
    ///
    /// Solves the normal direction first under the restitution law, then runs
    /// the friction ladder: a sliding solve at the Coulomb limit, upgraded to
    /// a sticking solve when sliding would reverse the tangential velocity,
    /// and clamped back to the cone when sticking would require pulling.
    pub(crate) fn resolve(&self, a: &mut Body, b: &mut Body) {
        let n = self.normal;
        let t = n.perp();

        let ra = self.point - a.position();
        let rb = self.point - b.position();

        let rel = b.velocity_at(self.point) - a.velocity_at(self.point);
        let vn = rel.dot(n);
        if vn >= 0.0 {
            // Already separating at the contact point.
            return;
        }
        let vt = rel.dot(t);

        let (im_a, im_b) = (a.inv_mass(), b.inv_mass());
        let (ii_a, ii_b) = (a.inv_inertia(), b.inv_inertia());

        let ran = ra.perp_dot(n);
        let rbn = rb.perp_dot(n);
        let rat = ra.perp_dot(t);
        let rbt = rb.perp_dot(t);

        // Effective-mass matrix of the (normal, tangent) impulse pair.
        let knn = im_a + im_b + ii_a * ran * ran + ii_b * rbn * rbn;
        let ktt = im_a + im_b + ii_a * rat * rat + ii_b * rbt * rbt;
        let knt = ii_a * ran * rat + ii_b * rbn * rbt;

        if knn < SOLVER_EPS {
            return;
        }

        let target_vn = -(1.0 + self.restitution) * vn;
        let jn_frictionless = target_vn / knn;

        let mu = self.friction;
        let (jn, jt) = if mu <= 0.0 {
            (jn_frictionless, 0.0)
        } else {
            self.solve_friction(vn, vt, knn, ktt, knt, mu, jn_frictionless)
        };

        if jn <= 0.0 {
            return;
        }

        let impulse = jn * n + jt * t;
        a.apply_impulse_at(-impulse, self.point);
        b.apply_impulse_at(impulse, self.point);
    }

    /// The friction ladder. Returns the `(jn, jt)` impulse pair.
    fn solve_friction(
        &self,
        vn: f32,
        vt: f32,
        knn: f32,
        ktt: f32,
        knt: f32,
        mu: f32,
        jn_frictionless: f32,
    ) -> (f32, f32) {
        let target_vn = -(1.0 + self.restitution) * vn;
        let slide_sign = if vt > 0.0 { -1.0 } else { 1.0 };

        // Rung 1: sliding. Friction sits on the cone boundary opposing the
        // tangential motion, jt = sign * mu * jn.
        let slide_denom = knn + slide_sign * mu * knt;
        if slide_denom.abs() < SOLVER_EPS {
            return (jn_frictionless, 0.0);
        }
        let jn_slide = target_vn / slide_denom;
        let jt_slide = slide_sign * mu * jn_slide;
        if jn_slide <= 0.0 {
            return (jn_frictionless, 0.0);
        }

        // If sliding friction does not push the tangential velocity through
        // zero, the contact keeps sliding and the solve is done.
        let vt_after = vt + knt * jn_slide + ktt * jt_slide;
        if vt_after * vt > 0.0 {
            return (jn_slide, jt_slide);
        }

        // Rung 2: sticking. Solve the 2x2 system that zeroes the tangential
        // velocity exactly while meeting the restitution target.
        let det = knn * ktt - knt * knt;
        if det.abs() < SOLVER_EPS {
            return (jn_slide, jt_slide);
        }
        let jn_stick = (target_vn * ktt + vt * knt) / det;
        let jt_stick = (-vt * knn - target_vn * knt) / det;

        // Rung 3: a sticking impulse that pushes along the slide or exceeds
        // the cone is not physical. Clamp the tangential impulse to the cone
        // around the frictionless normal impulse, still opposing the slide.
        if jn_stick <= 0.0 || jt_stick * vt > 0.0 || jt_stick.abs() > mu * jn_stick {
            return (jn_frictionless, slide_sign * mu * jn_frictionless);
        }

        (jn_stick, jt_stick)
    }

    /// Positional correction: displace the pair out of penetration in
    /// proportion to their inverse masses, scaled by `beta`.
    pub(crate) fn correct_positions(&self, beta: f32, a: &mut Body, b: &mut Body) {
        if self.delta <= MIN_PENETRATION {
            return;
        }
        let total = a.inv_mass() + b.inv_mass();
        if total < SOLVER_EPS {
            return;
        }
        let push = self.normal * (beta * 0.5 * self.delta / total);
        a.move_by(-push * a.inv_mass());
        b.move_by(push * b.inv_mass());
    }
}
