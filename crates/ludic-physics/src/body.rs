//! Rigid body state and dynamics.
//!
//! Provides the core [`Body`] type: kinematic state (position, velocity,
//! orientation, angular velocity), inertial state stored as inverse mass and
//! inverse inertia so immovable bodies are exactly representable, per-frame
//! force accumulation, and the static/kinematic/dynamic transitions.
//!
//! A body is created on its own and becomes live once handed to a
//! [`crate::Simulation`], which owns it and addresses it through the
//! [`BodyId`] returned by `add`.

use glam::Vec2;

use crate::error::PhysicsError;
use crate::shape::{Bounds, Shape};

bitflags::bitflags! {
    /// Packed bookkeeping flags for a body.
    ///
    /// The `OWNS_*` bits mark per-body overrides of simulation-global
    /// properties: the simulation only pushes a changed global value into
    /// bodies whose ownership bit is clear.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BodyFlags: u32 {
        /// The body may rotate. Cleared for axis-aligned box shapes.
        const CAN_ROTATE = 1 << 0;
        /// The cached world bounding box is stale.
        const DIRTY_BBOX = 1 << 1;
        /// The body is asleep and skipped by integration.
        const SLEEPING = 1 << 2;
        /// Gravity was set on this body directly.
        const OWNS_GRAVITY = 1 << 3;
        /// Linear damping was set on this body directly.
        const OWNS_DAMPING = 1 << 4;
        /// Angular damping was set on this body directly.
        const OWNS_ADAMPING = 1 << 5;
        /// Restitution was set on this body directly.
        const OWNS_RESTITUTION = 1 << 6;
        /// Friction was set on this body directly.
        const OWNS_FRICTION = 1 << 7;
    }
}

/// Handle to a body stored in a [`crate::Simulation`].
///
/// Stays valid until the body is removed; slots of removed bodies may be
/// reused by later additions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyId(pub(crate) usize);

impl BodyId {
    /// Slot index inside the owning simulation.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Degrees of freedom selected by the dynamic-state queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dof {
    /// The translational degrees of freedom.
    Linear,
    /// The rotational degree of freedom.
    Angular,
    /// Both linear and angular.
    Both,
    /// Either linear or angular.
    Any,
}

/// Inertial and kinematic snapshot taken by `make_static`/`make_kinematic`,
/// restored by `make_dynamic`.
#[derive(Clone, Copy, Debug)]
struct SavedMotion {
    inv_mass: f32,
    inv_inertia: f32,
    velocity: Vec2,
    angular_velocity: f32,
}

/// A rigid body in the simulation.
pub struct Body {
    position: Vec2,
    velocity: Vec2,
    angle: f32,
    angular_velocity: f32,

    // Transient accumulators, rebuilt every frame.
    accel: Vec2,
    aaccel: f32,

    inv_mass: f32,
    inv_inertia: f32,
    density: f32,

    shape: Shape,

    gravity: Vec2,
    damping: f32,
    adamping: f32,
    restitution: f32,
    friction: f32,

    layers: u32,
    groups: u32,

    flags: BodyFlags,
    saved: Option<SavedMotion>,
    cached_bounds: Bounds,

    force_fn: Option<Box<dyn Fn(f32) -> Vec2 + Send>>,
    torque_fn: Option<Box<dyn Fn(f32) -> f32 + Send>>,
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("angle", &self.angle)
            .field("angular_velocity", &self.angular_velocity)
            .field("inv_mass", &self.inv_mass)
            .field("inv_inertia", &self.inv_inertia)
            .field("shape", &self.shape)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl Body {
    /// Create a dynamic body with unit density.
    ///
    /// Mass is `density * area` and inertia `mass * gyration_sq` so the three
    /// stay consistent; axis-aligned box shapes produce a non-rotatable body.
    pub fn new(shape: Shape) -> Self {
        let area = shape.area();
        let mass = area; // density 1.0
        let can_rotate = shape.can_rotate();
        let inv_inertia = if can_rotate {
            1.0 / (mass * shape.gyration_sq())
        } else {
            0.0
        };
        let mut flags = BodyFlags::DIRTY_BBOX;
        if can_rotate {
            flags |= BodyFlags::CAN_ROTATE;
        }
        let cached_bounds = shape.bounds(Vec2::ZERO, 0.0);
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            accel: Vec2::ZERO,
            aaccel: 0.0,
            inv_mass: 1.0 / mass,
            inv_inertia,
            density: 1.0,
            shape,
            gravity: Vec2::ZERO,
            damping: 0.0,
            adamping: 0.0,
            restitution: 0.0,
            friction: 0.0,
            layers: u32::MAX,
            groups: 0,
            flags,
            saved: None,
            cached_bounds,
            force_fn: None,
            torque_fn: None,
        }
    }

    /// Set the initial position (builder style).
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self.flags |= BodyFlags::DIRTY_BBOX;
        self
    }

    /// Set the initial velocity (builder style).
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Override gravity for this body; the simulation global no longer
    /// applies to it.
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self.flags |= BodyFlags::OWNS_GRAVITY;
        self
    }

    /// Override linear damping for this body.
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self.flags |= BodyFlags::OWNS_DAMPING;
        self
    }

    /// Override angular damping for this body.
    pub fn with_adamping(mut self, adamping: f32) -> Self {
        self.adamping = adamping;
        self.flags |= BodyFlags::OWNS_ADAMPING;
        self
    }

    /// Override restitution for this body.
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self.flags |= BodyFlags::OWNS_RESTITUTION;
        self
    }

    /// Override friction for this body.
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self.flags |= BodyFlags::OWNS_FRICTION;
        self
    }

    /// Set the collision layer mask (bodies collide if their layers
    /// intersect).
    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    /// Set the mutual-exclusion group mask (bodies whose groups intersect
    /// never collide).
    pub fn with_groups(mut self, groups: u32) -> Self {
        self.groups = groups;
        self
    }

    /// Attach a time-dependent external force, evaluated each frame at the
    /// current simulation time.
    pub fn with_force(mut self, force: impl Fn(f32) -> Vec2 + Send + 'static) -> Self {
        self.force_fn = Some(Box::new(force));
        self
    }

    /// Attach a time-dependent external torque.
    pub fn with_torque(mut self, torque: impl Fn(f32) -> f32 + Send + 'static) -> Self {
        self.torque_fn = Some(Box::new(torque));
        self
    }

    // --- kinematic state ---------------------------------------------------

    /// World-space position.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Teleport the body to a position.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.flags |= BodyFlags::DIRTY_BBOX;
    }

    /// Linear velocity.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Replace the linear velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Orientation angle in radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Replace the orientation.
    ///
    /// Non-rotatable bodies reject any non-zero angle.
    pub fn set_angle(&mut self, angle: f32) -> Result<(), PhysicsError> {
        if !self.can_rotate() && angle != 0.0 {
            return Err(PhysicsError::NonRotatable);
        }
        self.angle = angle;
        self.flags |= BodyFlags::DIRTY_BBOX;
        Ok(())
    }

    /// Angular velocity in radians per second.
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Replace the angular velocity.
    ///
    /// Non-rotatable bodies reject any non-zero value.
    pub fn set_angular_velocity(&mut self, omega: f32) -> Result<(), PhysicsError> {
        if !self.can_rotate() && omega != 0.0 {
            return Err(PhysicsError::NonRotatable);
        }
        self.angular_velocity = omega;
        Ok(())
    }

    /// Displace the position by a delta.
    pub fn move_by(&mut self, delta: Vec2) {
        self.position += delta;
        self.flags |= BodyFlags::DIRTY_BBOX;
    }

    /// Add a delta to the linear velocity.
    pub fn boost(&mut self, delta: Vec2) {
        self.velocity += delta;
    }

    /// Rotate the body by an angle delta.
    pub fn rotate(&mut self, delta: f32) -> Result<(), PhysicsError> {
        if !self.can_rotate() && delta != 0.0 {
            return Err(PhysicsError::NonRotatable);
        }
        self.angle += delta;
        self.flags |= BodyFlags::DIRTY_BBOX;
        Ok(())
    }

    /// Add a delta to the angular velocity.
    pub fn aboost(&mut self, delta: f32) -> Result<(), PhysicsError> {
        if !self.can_rotate() && delta != 0.0 {
            return Err(PhysicsError::NonRotatable);
        }
        self.angular_velocity += delta;
        Ok(())
    }

    // --- inertial state ----------------------------------------------------

    /// Mass, `f32::INFINITY` for immovable bodies.
    pub fn mass(&self) -> f32 {
        if self.inv_mass == 0.0 {
            f32::INFINITY
        } else {
            1.0 / self.inv_mass
        }
    }

    /// Inverse mass, always `>= 0`.
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Set the mass, keeping density and inertia consistent.
    ///
    /// `f32::INFINITY` makes the body immovable (inverse mass exactly zero);
    /// density is left untouched in that case.
    pub fn set_mass(&mut self, mass: f32) -> Result<(), PhysicsError> {
        if mass.is_infinite() && mass > 0.0 {
            self.inv_mass = 0.0;
            return Ok(());
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(mass));
        }
        self.inv_mass = 1.0 / mass;
        self.density = mass / self.shape.area();
        self.sync_inertia(mass);
        Ok(())
    }

    /// Moment of inertia, `f32::INFINITY` when rotation is pinned.
    pub fn inertia(&self) -> f32 {
        if self.inv_inertia == 0.0 {
            f32::INFINITY
        } else {
            1.0 / self.inv_inertia
        }
    }

    /// Inverse inertia, always `>= 0`.
    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    /// Set the moment of inertia directly.
    ///
    /// `f32::INFINITY` pins rotation. Ignored (kept at zero inverse) for
    /// non-rotatable bodies.
    pub fn set_inertia(&mut self, inertia: f32) -> Result<(), PhysicsError> {
        if inertia.is_infinite() && inertia > 0.0 {
            self.inv_inertia = 0.0;
            return Ok(());
        }
        if !inertia.is_finite() || inertia <= 0.0 {
            return Err(PhysicsError::InvalidInertia(inertia));
        }
        if self.can_rotate() {
            self.inv_inertia = 1.0 / inertia;
        }
        Ok(())
    }

    /// Mass density.
    pub fn density(&self) -> f32 {
        self.density
    }

    /// Set the density, recomputing mass and inertia from the shape.
    pub fn set_density(&mut self, density: f32) -> Result<(), PhysicsError> {
        if !density.is_finite() || density <= 0.0 {
            return Err(PhysicsError::InvalidDensity(density));
        }
        self.density = density;
        let mass = density * self.shape.area();
        self.inv_mass = 1.0 / mass;
        self.sync_inertia(mass);
        Ok(())
    }

    fn sync_inertia(&mut self, mass: f32) {
        if self.can_rotate() {
            self.inv_inertia = 1.0 / (mass * self.shape.gyration_sq());
        } else {
            self.inv_inertia = 0.0;
        }
    }

    // --- forces and impulses ----------------------------------------------

    /// Accumulate a force for the current frame.
    ///
    /// Has no effect on bodies with zero inverse mass: accumulated force
    /// never moves an immovable body.
    pub fn apply_force(&mut self, force: Vec2) {
        self.accel += force * self.inv_mass;
    }

    /// Accumulate a torque for the current frame.
    pub fn apply_torque(&mut self, torque: f32) {
        self.aaccel += torque * self.inv_inertia;
    }

    /// Apply an instantaneous impulse at the center of mass.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse * self.inv_mass;
    }

    /// Apply an instantaneous impulse at a world-space point.
    ///
    /// Decomposes into a linear impulse plus the torque from the lever arm;
    /// the angular part is skipped when inverse inertia is zero.
    pub fn apply_impulse_at(&mut self, impulse: Vec2, point: Vec2) {
        self.velocity += impulse * self.inv_mass;
        if self.inv_inertia != 0.0 {
            let r = point - self.position;
            self.angular_velocity += self.inv_inertia * r.perp_dot(impulse);
        }
    }

    /// Velocity of the body surface at a world-space point, accounting for
    /// rotation.
    pub fn velocity_at(&self, point: Vec2) -> Vec2 {
        let r = point - self.position;
        self.velocity + self.angular_velocity * r.perp()
    }

    // --- dynamic / kinematic / static transitions --------------------------

    /// Make the body immovable and stop it, remembering its motion so
    /// [`Body::make_dynamic`] can restore it.
    pub fn make_static(&mut self) {
        self.snapshot_motion();
        self.inv_mass = 0.0;
        self.inv_inertia = 0.0;
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
        self.accel = Vec2::ZERO;
        self.aaccel = 0.0;
    }

    /// Make the body unaffected by forces and impulses while keeping its
    /// velocity, so it moves on a fixed trajectory.
    pub fn make_kinematic(&mut self) {
        self.snapshot_motion();
        self.inv_mass = 0.0;
        self.inv_inertia = 0.0;
        self.accel = Vec2::ZERO;
        self.aaccel = 0.0;
    }

    /// Restore the inertial state saved by the last transition.
    ///
    /// Velocity is restored only if it was not changed in the meantime;
    /// a body that never transitioned gets its mass back from its density.
    pub fn make_dynamic(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.inv_mass = saved.inv_mass;
            self.inv_inertia = saved.inv_inertia;
            if self.velocity == Vec2::ZERO && self.angular_velocity == 0.0 {
                self.velocity = saved.velocity;
                self.angular_velocity = saved.angular_velocity;
            }
        } else if self.inv_mass == 0.0 {
            let mass = self.density * self.shape.area();
            self.inv_mass = 1.0 / mass;
            self.sync_inertia(mass);
        }
    }

    fn snapshot_motion(&mut self) {
        if self.inv_mass != 0.0 || self.inv_inertia != 0.0 {
            self.saved = Some(SavedMotion {
                inv_mass: self.inv_mass,
                inv_inertia: self.inv_inertia,
                velocity: self.velocity,
                angular_velocity: self.angular_velocity,
            });
        }
    }

    /// True if the selected degrees of freedom respond to forces.
    pub fn is_dynamic(&self, dof: Dof) -> bool {
        let linear = self.inv_mass != 0.0;
        let angular = self.inv_inertia != 0.0;
        match dof {
            Dof::Linear => linear,
            Dof::Angular => angular,
            Dof::Both => linear && angular,
            Dof::Any => linear || angular,
        }
    }

    /// True if the selected degrees of freedom ignore forces (infinite
    /// mass/inertia), moving or not.
    pub fn is_kinematic(&self, dof: Dof) -> bool {
        let linear = self.inv_mass == 0.0;
        let angular = self.inv_inertia == 0.0;
        match dof {
            Dof::Linear => linear,
            Dof::Angular => angular,
            Dof::Both => linear && angular,
            Dof::Any => linear || angular,
        }
    }

    /// True if the selected degrees of freedom ignore forces and are at rest.
    pub fn is_static(&self, dof: Dof) -> bool {
        let linear = self.inv_mass == 0.0 && self.velocity == Vec2::ZERO;
        let angular = self.inv_inertia == 0.0 && self.angular_velocity == 0.0;
        match dof {
            Dof::Linear => linear,
            Dof::Angular => angular,
            Dof::Both => linear && angular,
            Dof::Any => linear || angular,
        }
    }

    // --- sleeping ----------------------------------------------------------

    /// Put the body to sleep: it is skipped by force accumulation and
    /// integration until woken.
    pub fn sleep(&mut self) {
        self.flags |= BodyFlags::SLEEPING;
    }

    /// Wake the body.
    pub fn wake(&mut self) {
        self.flags -= BodyFlags::SLEEPING;
    }

    /// True if the body is asleep.
    pub fn is_sleeping(&self) -> bool {
        self.flags.contains(BodyFlags::SLEEPING)
    }

    /// True if the body may rotate.
    pub fn can_rotate(&self) -> bool {
        self.flags.contains(BodyFlags::CAN_ROTATE)
    }

    /// The packed bookkeeping flags.
    pub fn flags(&self) -> BodyFlags {
        self.flags
    }

    // --- collision filtering and material ----------------------------------

    /// Collision layer mask.
    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// Set the collision layer mask.
    pub fn set_layers(&mut self, layers: u32) {
        self.layers = layers;
    }

    /// Mutual-exclusion group mask.
    pub fn groups(&self) -> u32 {
        self.groups
    }

    /// Set the mutual-exclusion group mask.
    pub fn set_groups(&mut self, groups: u32) {
        self.groups = groups;
    }

    /// Restitution coefficient used for contacts of this body.
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Set restitution; the simulation global no longer applies.
    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = restitution;
        self.flags |= BodyFlags::OWNS_RESTITUTION;
    }

    /// Friction coefficient used for contacts of this body.
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Set friction; the simulation global no longer applies.
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = friction;
        self.flags |= BodyFlags::OWNS_FRICTION;
    }

    /// Gravity acceleration acting on this body.
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Set gravity; the simulation global no longer applies.
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
        self.flags |= BodyFlags::OWNS_GRAVITY;
    }

    /// Linear damping coefficient.
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Set linear damping; the simulation global no longer applies.
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping;
        self.flags |= BodyFlags::OWNS_DAMPING;
    }

    /// Angular damping coefficient.
    pub fn adamping(&self) -> f32 {
        self.adamping
    }

    /// Set angular damping; the simulation global no longer applies.
    pub fn set_adamping(&mut self, adamping: f32) {
        self.adamping = adamping;
        self.flags |= BodyFlags::OWNS_ADAMPING;
    }

    // --- geometry queries ---------------------------------------------------

    /// The collision shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// World-space bounding box, lazily refreshed from the pose.
    pub fn bounding_box(&mut self) -> Bounds {
        if self.flags.contains(BodyFlags::DIRTY_BBOX) {
            self.cached_bounds = self.shape.bounds(self.position, self.angle);
            self.flags -= BodyFlags::DIRTY_BBOX;
        }
        self.cached_bounds
    }

    /// Circular bounding box: center and radius.
    pub fn cbb(&self) -> (Vec2, f32) {
        (self.position, self.shape.cbb_radius())
    }

    // --- frame pipeline hooks (crate-internal) ------------------------------

    /// True if this pair passes the collision-eligibility filters: not both
    /// asleep, not both immovable, intersecting layers, disjoint groups.
    pub(crate) fn can_collide_with(&self, other: &Body) -> bool {
        if self.is_sleeping() && other.is_sleeping() {
            return false;
        }
        if self.inv_mass == 0.0 && other.inv_mass == 0.0 {
            return false;
        }
        (self.layers & other.layers) != 0 && (self.groups & other.groups) == 0
    }

    /// Rebuild the acceleration accumulators for this frame from gravity,
    /// damping, and any user force/torque functions.
    pub(crate) fn accumulate_forces(&mut self, time: f32) {
        if self.inv_mass != 0.0 {
            self.accel = self.gravity - self.damping * self.velocity;
            if let Some(force) = &self.force_fn {
                self.accel += force(time) * self.inv_mass;
            }
        } else {
            self.accel = Vec2::ZERO;
        }
        if self.inv_inertia != 0.0 {
            self.aaccel = -self.adamping * self.angular_velocity;
            if let Some(torque) = &self.torque_fn {
                self.aaccel += torque(time) * self.inv_inertia;
            }
        } else {
            self.aaccel = 0.0;
        }
    }

    /// Semi-implicit Euler velocity step.
    pub(crate) fn integrate_velocity(&mut self, dt: f32) {
        self.velocity += self.accel * dt;
        self.angular_velocity += self.aaccel * dt;
    }

    /// Semi-implicit Euler position step.
    pub(crate) fn integrate_position(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.angle += self.angular_velocity * dt;
        self.flags |= BodyFlags::DIRTY_BBOX;
    }

    /// Copy a simulation global into this body unless overridden.
    pub(crate) fn push_gravity(&mut self, gravity: Vec2) {
        if !self.flags.contains(BodyFlags::OWNS_GRAVITY) {
            self.gravity = gravity;
        }
    }

    pub(crate) fn push_damping(&mut self, damping: f32) {
        if !self.flags.contains(BodyFlags::OWNS_DAMPING) {
            self.damping = damping;
        }
    }

    pub(crate) fn push_adamping(&mut self, adamping: f32) {
        if !self.flags.contains(BodyFlags::OWNS_ADAMPING) {
            self.adamping = adamping;
        }
    }

    pub(crate) fn push_restitution(&mut self, restitution: f32) {
        if !self.flags.contains(BodyFlags::OWNS_RESTITUTION) {
            self.restitution = restitution;
        }
    }

    pub(crate) fn push_friction(&mut self, friction: f32) {
        if !self.flags.contains(BodyFlags::OWNS_FRICTION) {
            self.friction = friction;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    fn circle_body(radius: f32) -> Body {
        Body::new(Shape::circle(radius).unwrap())
    }

    #[test]
    fn invariant_inverse_mass_never_negative() {
        let mut body = circle_body(1.0);
        assert!(body.inv_mass() > 0.0);
        assert!(body.inv_inertia() > 0.0);

        body.set_mass(f32::INFINITY).unwrap();
        assert_eq!(body.inv_mass(), 0.0, "infinite mass must give inverse 0");

        body.set_inertia(f32::INFINITY).unwrap();
        assert_eq!(body.inv_inertia(), 0.0);
    }

    #[test]
    fn invariant_nonpositive_mass_rejected() {
        let mut body = circle_body(1.0);
        assert_eq!(body.set_mass(0.0), Err(PhysicsError::InvalidMass(0.0)));
        assert_eq!(body.set_mass(-2.0), Err(PhysicsError::InvalidMass(-2.0)));
        assert!(body.set_mass(f32::NAN).is_err());
        assert!(body.set_inertia(-1.0).is_err());
        assert!(body.set_density(0.0).is_err());
    }

    #[test]
    fn mass_density_inertia_stay_consistent() {
        let mut body = circle_body(2.0);
        let area = body.shape().area();

        body.set_mass(10.0).unwrap();
        assert!((body.density() - 10.0 / area).abs() < 1e-6);
        let expected_inertia = 10.0 * body.shape().gyration_sq();
        assert!((body.inertia() - expected_inertia).abs() < 1e-3);

        body.set_density(3.0).unwrap();
        assert!((body.mass() - 3.0 * area).abs() < 1e-3);
    }

    #[test]
    fn static_then_dynamic_restores_velocity() {
        let mut body = circle_body(1.0).with_velocity(Vec2::new(3.0, -4.0));
        let inv_mass = body.inv_mass();

        body.make_static();
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert!(body.is_static(Dof::Both));

        body.make_dynamic();
        assert_eq!(
            body.velocity(),
            Vec2::new(3.0, -4.0),
            "pre-static velocity must be restored exactly"
        );
        assert_eq!(body.inv_mass(), inv_mass);
    }

    #[test]
    fn intervening_velocity_change_wins_over_restore() {
        let mut body = circle_body(1.0).with_velocity(Vec2::new(3.0, 0.0));
        body.make_static();
        body.set_velocity(Vec2::new(-1.0, 0.0));
        body.make_dynamic();
        assert_eq!(body.velocity(), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn kinematic_keeps_velocity() {
        let mut body = circle_body(1.0).with_velocity(Vec2::new(5.0, 0.0));
        body.make_kinematic();
        assert_eq!(body.velocity(), Vec2::new(5.0, 0.0));
        assert!(body.is_kinematic(Dof::Both));
        assert!(!body.is_static(Dof::Linear), "a moving body is not static");
    }

    #[test]
    fn immovable_body_ignores_forces() {
        let mut body = circle_body(1.0);
        body.make_static();
        body.apply_force(Vec2::new(100.0, 0.0));
        body.accumulate_forces(0.0);
        body.integrate_velocity(1.0);
        body.integrate_position(1.0);
        assert_eq!(body.position(), Vec2::ZERO);
        assert_eq!(body.velocity(), Vec2::ZERO);
    }

    #[test]
    fn aabb_body_cannot_rotate() {
        let mut body = Body::new(Shape::aabb(2.0, 2.0).unwrap());
        assert!(!body.can_rotate());
        assert_eq!(body.inv_inertia(), 0.0);
        assert_eq!(body.set_angle(1.0), Err(PhysicsError::NonRotatable));
        assert_eq!(body.set_angular_velocity(0.5), Err(PhysicsError::NonRotatable));
        // Zero is always acceptable.
        assert!(body.set_angle(0.0).is_ok());
        assert!(body.aboost(0.0).is_ok());
    }

    #[test]
    fn impulse_at_point_adds_spin() {
        let mut body = circle_body(1.0);
        body.set_mass(1.0).unwrap();
        body.set_inertia(1.0).unwrap();

        // Impulse along +y applied right of center spins counter-clockwise.
        body.apply_impulse_at(Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0));
        assert_eq!(body.velocity(), Vec2::new(0.0, 1.0));
        assert!((body.angular_velocity() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn impulse_at_point_skips_pinned_rotation() {
        let mut body = circle_body(1.0);
        body.set_mass(1.0).unwrap();
        body.set_inertia(f32::INFINITY).unwrap();
        body.apply_impulse_at(Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0));
        assert_eq!(body.velocity(), Vec2::new(0.0, 1.0));
        assert_eq!(body.angular_velocity(), 0.0);
    }

    #[test]
    fn velocity_at_point_includes_rotation() {
        let mut body = circle_body(1.0).with_velocity(Vec2::new(1.0, 0.0));
        body.set_angular_velocity(2.0).unwrap();
        // omega x r for r = (1, 0) is (0, 2).
        let v = body.velocity_at(Vec2::new(1.0, 0.0));
        assert!((v - Vec2::new(1.0, 2.0)).length() < 1e-6);
    }

    #[test]
    fn bounding_box_follows_moves_lazily() {
        let mut body = circle_body(2.0);
        let b0 = body.bounding_box();
        assert_eq!(b0.min, Vec2::new(-2.0, -2.0));

        body.move_by(Vec2::new(10.0, 0.0));
        let b1 = body.bounding_box();
        assert_eq!(b1.min, Vec2::new(8.0, -2.0));
        assert_eq!(b1.max, Vec2::new(12.0, 2.0));
    }

    #[test]
    fn collision_filters() {
        let a = circle_body(1.0);
        let b = circle_body(1.0);
        assert!(a.can_collide_with(&b), "default masks always collide");

        let a = circle_body(1.0).with_layers(0b01);
        let b = circle_body(1.0).with_layers(0b10);
        assert!(!a.can_collide_with(&b), "disjoint layers never collide");

        let a = circle_body(1.0).with_groups(0b1);
        let b = circle_body(1.0).with_groups(0b1);
        assert!(!a.can_collide_with(&b), "shared group excludes the pair");

        let mut a = circle_body(1.0);
        let mut b = circle_body(1.0);
        a.sleep();
        assert!(a.can_collide_with(&b), "one sleeper still collides");
        b.sleep();
        assert!(!a.can_collide_with(&b), "two sleepers are skipped");

        let mut a = circle_body(1.0);
        let mut b = circle_body(1.0);
        a.make_static();
        b.make_static();
        assert!(!a.can_collide_with(&b), "two immovable bodies are skipped");
    }

    #[test]
    fn ownership_flags_block_pushdown() {
        let mut owned = circle_body(1.0).with_restitution(0.25);
        let mut unowned = circle_body(1.0);
        owned.push_restitution(0.9);
        unowned.push_restitution(0.9);
        assert_eq!(owned.restitution(), 0.25);
        assert_eq!(unowned.restitution(), 0.9);
    }
}
