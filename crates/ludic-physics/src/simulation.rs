//! The simulation: owns the bodies and runs the per-frame pipeline.
//!
//! One [`Simulation::update`] call performs the whole step synchronously:
//! force accumulation, velocity integration, collision detection and
//! resolution, position integration, and the alternating bounds/speed sweep.
//! Nothing suspends mid-step, so observers always see a consistent world.

use std::collections::HashSet;

use glam::Vec2;

use crate::body::{Body, BodyId, Dof};
use crate::broad::{BroadPhase, BroadStrategy};
use crate::narrow;
use crate::shape::Bounds;
use crate::solver::Collision;

/// Out-of-bounds crossing direction: right, up, left, down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Edge {
    Right,
    Up,
    Left,
    Down,
}

/// Signals raised by the simulation, drained by the caller between frames.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimulationEvent {
    /// A body was added to the simulation.
    BodyAdded(BodyId),
    /// A body was removed from the simulation.
    BodyRemoved(BodyId),
    /// A body's bounding box left the configured bounds, once per excursion.
    OutOfBounds(BodyId, Edge),
    /// The global gravity changed.
    GravityChanged(Vec2),
    /// The global linear damping changed.
    DampingChanged(f32),
    /// The global angular damping changed.
    AdampingChanged(f32),
    /// The global restitution changed.
    RestitutionChanged(f32),
    /// The global friction changed.
    FrictionChanged(f32),
}

/// Frame-synchronous collision observers.
///
/// `pre_collision` runs before a contact is resolved and may adjust its
/// materials or [cancel](Collision::cancel) it; `post_collision` runs after
/// positional correction with the contact as it was resolved.
pub trait CollisionHooks {
    fn pre_collision(&mut self, collision: &mut Collision) {
        let _ = collision;
    }

    fn post_collision(&mut self, collision: &Collision) {
        let _ = collision;
    }
}

/// Tunable global parameters of a [`Simulation`].
///
/// The material and force fields are defaults pushed into bodies that do not
/// override them; `beta` scales positional correction.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Default gravity acceleration.
    pub gravity: Vec2,
    /// Default linear damping coefficient.
    pub damping: f32,
    /// Default angular damping coefficient.
    pub adamping: f32,
    /// Default restitution.
    pub restitution: f32,
    /// Default friction.
    pub friction: f32,
    /// Baumgarte positional-correction factor, usually in `0.1..=0.3`.
    pub beta: f32,
    /// Bounding volume used by the broad phase.
    pub broad_strategy: BroadStrategy,
    /// World bounds for the out-of-bounds sweep, `None` to disable.
    pub bounds: Option<Bounds>,
    /// Speed ceiling for the velocity clamp, `None` to disable.
    pub max_speed: Option<f32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            damping: 0.0,
            adamping: 0.0,
            restitution: 0.0,
            friction: 0.0,
            beta: 0.2,
            broad_strategy: BroadStrategy::default(),
            bounds: None,
            max_speed: None,
        }
    }
}

/// A 2D rigid-body simulation.
pub struct Simulation {
    bodies: Vec<Option<Body>>,
    config: SimulationConfig,
    broad: BroadPhase,
    contacts: Vec<Collision>,
    hooks: Option<Box<dyn CollisionHooks>>,
    events: Vec<SimulationEvent>,
    out_of_bounds: HashSet<usize>,
    time: f32,
    steps: u64,
    initial_energy: Option<f32>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("bodies", &self.body_count())
            .field("config", &self.config)
            .field("time", &self.time)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        let broad = BroadPhase::new(config.broad_strategy);
        Self {
            bodies: Vec::new(),
            config,
            broad,
            contacts: Vec::new(),
            hooks: None,
            events: Vec::new(),
            out_of_bounds: HashSet::new(),
            time: 0.0,
            steps: 0,
            initial_energy: None,
        }
    }

    /// Install the collision observer, replacing any previous one.
    pub fn set_hooks(&mut self, hooks: impl CollisionHooks + 'static) {
        self.hooks = Some(Box::new(hooks));
    }

    /// Remove the collision observer.
    pub fn clear_hooks(&mut self) {
        self.hooks = None;
    }

    // --- body management ---------------------------------------------------

    /// Add a body, reusing the slot of a previously removed one when
    /// possible. Simulation-global properties are pushed into the body
    /// unless it overrides them.
    pub fn add(&mut self, mut body: Body) -> BodyId {
        self.push_globals(&mut body);
        let id = match self.bodies.iter().position(Option::is_none) {
            Some(slot) => {
                self.bodies[slot] = Some(body);
                BodyId(slot)
            }
            None => {
                self.bodies.push(Some(body));
                BodyId(self.bodies.len() - 1)
            }
        };
        self.events.push(SimulationEvent::BodyAdded(id));
        id
    }

    /// Remove a body and return it.
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let body = self.bodies.get_mut(id.0)?.take()?;
        self.out_of_bounds.remove(&id.0);
        self.events.push(SimulationEvent::BodyRemoved(id));
        Some(body)
    }

    /// Remove a body and drop it.
    pub fn discard(&mut self, id: BodyId) {
        let _ = self.remove(id);
    }

    /// Borrow a body.
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0)?.as_ref()
    }

    /// Mutably borrow a body.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0)?.as_mut()
    }

    /// Number of live bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterate over the live bodies.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|b| (BodyId(i), b)))
    }

    /// Iterate mutably over the live bodies.
    pub fn bodies_mut(&mut self) -> impl Iterator<Item = (BodyId, &mut Body)> {
        self.bodies
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|b| (BodyId(i), b)))
    }

    // --- global properties -------------------------------------------------

    /// The current configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Set the global gravity and push it into every non-overriding body.
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
        for slot in self.bodies.iter_mut().flatten() {
            slot.push_gravity(gravity);
        }
        self.events.push(SimulationEvent::GravityChanged(gravity));
    }

    /// Set the global linear damping and push it into every non-overriding
    /// body.
    pub fn set_damping(&mut self, damping: f32) {
        self.config.damping = damping;
        for slot in self.bodies.iter_mut().flatten() {
            slot.push_damping(damping);
        }
        self.events.push(SimulationEvent::DampingChanged(damping));
    }

    /// Set the global angular damping and push it into every non-overriding
    /// body.
    pub fn set_adamping(&mut self, adamping: f32) {
        self.config.adamping = adamping;
        for slot in self.bodies.iter_mut().flatten() {
            slot.push_adamping(adamping);
        }
        self.events.push(SimulationEvent::AdampingChanged(adamping));
    }

    /// Set the global restitution and push it into every non-overriding body.
    pub fn set_restitution(&mut self, restitution: f32) {
        self.config.restitution = restitution;
        for slot in self.bodies.iter_mut().flatten() {
            slot.push_restitution(restitution);
        }
        self.events
            .push(SimulationEvent::RestitutionChanged(restitution));
    }

    /// Set the global friction and push it into every non-overriding body.
    pub fn set_friction(&mut self, friction: f32) {
        self.config.friction = friction;
        for slot in self.bodies.iter_mut().flatten() {
            slot.push_friction(friction);
        }
        self.events.push(SimulationEvent::FrictionChanged(friction));
    }

    /// Set the world bounds used by the out-of-bounds sweep.
    pub fn set_bounds(&mut self, bounds: Option<Bounds>) {
        self.config.bounds = bounds;
        self.out_of_bounds.clear();
    }

    /// Set the speed ceiling used by the velocity clamp.
    pub fn set_max_speed(&mut self, max_speed: Option<f32>) {
        self.config.max_speed = max_speed;
    }

    fn push_globals(&self, body: &mut Body) {
        body.push_gravity(self.config.gravity);
        body.push_damping(self.config.damping);
        body.push_adamping(self.config.adamping);
        body.push_restitution(self.config.restitution);
        body.push_friction(self.config.friction);
    }

    // --- frame pipeline ----------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    ///
    /// A zero or negative `dt` is a no-op: impulse resolution is not
    /// time-scaled, so running it for a zero-length frame would still change
    /// velocities.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        if self.initial_energy.is_none() {
            self.initial_energy = Some(self.total_energy());
        }

        for body in self.bodies.iter_mut().flatten() {
            if body.is_sleeping() {
                continue;
            }
            body.accumulate_forces(self.time);
            body.integrate_velocity(dt);
        }

        self.resolve_collisions();

        for body in self.bodies.iter_mut().flatten() {
            if body.is_sleeping() {
                continue;
            }
            body.integrate_position(dt);
        }

        // The two housekeeping sweeps alternate to halve their per-frame
        // cost.
        if self.steps % 2 == 0 {
            self.sweep_bounds();
        } else {
            self.clamp_speeds();
        }

        self.time += dt;
        self.steps += 1;
    }

    fn resolve_collisions(&mut self) {
        self.contacts.clear();

        let pairs = self.broad.pairs(&mut self.bodies);
        for &(a, b) in pairs {
            let (Some(body_a), Some(body_b)) = (&self.bodies[a.0], &self.bodies[b.0]) else {
                continue;
            };
            let Some(contact) = narrow::collide(body_a, body_b) else {
                continue;
            };
            let restitution = (body_a.restitution() * body_b.restitution())
                .max(0.0)
                .sqrt();
            let friction = (body_a.friction() * body_b.friction()).max(0.0).sqrt();
            self.contacts.push(Collision::new(
                a,
                b,
                contact.point,
                contact.normal,
                contact.delta,
                restitution,
                friction,
            ));
        }

        // The observer is parked during dispatch so it may inspect bodies
        // through `&self` style accessors of its own without aliasing us.
        let mut hooks = self.hooks.take();

        for i in 0..self.contacts.len() {
            let mut collision = self.contacts[i];
            if let Some(hooks) = &mut hooks {
                hooks.pre_collision(&mut collision);
            }
            self.contacts[i] = collision;
            if !collision.is_active() {
                continue;
            }
            let (a, b) = (collision.body_a(), collision.body_b());
            if let Some((body_a, body_b)) = pair_mut(&mut self.bodies, a.0, b.0) {
                // A contact wakes both bodies before the impulse lands.
                body_a.wake();
                body_b.wake();
                collision.resolve(body_a, body_b);
            }
        }

        // Positional pass after every impulse has been applied.
        for collision in &self.contacts {
            if !collision.is_active() {
                continue;
            }
            let (a, b) = (collision.body_a(), collision.body_b());
            if let Some((body_a, body_b)) = pair_mut(&mut self.bodies, a.0, b.0) {
                collision.correct_positions(self.config.beta, body_a, body_b);
            }
            if let Some(hooks) = &mut hooks {
                hooks.post_collision(collision);
            }
        }

        if self.hooks.is_none() {
            self.hooks = hooks;
        }
    }

    /// Raise an out-of-bounds event for each body fully outside the bounds,
    /// once per excursion.
    fn sweep_bounds(&mut self) {
        let Some(bounds) = self.config.bounds else {
            return;
        };
        let mut raised: Vec<(usize, Edge)> = Vec::new();
        for (index, slot) in self.bodies.iter_mut().enumerate() {
            let Some(body) = slot else { continue };
            let bb = body.bounding_box();
            let edge = if bb.min.x > bounds.max.x {
                Some(Edge::Right)
            } else if bb.min.y > bounds.max.y {
                Some(Edge::Up)
            } else if bb.max.x < bounds.min.x {
                Some(Edge::Left)
            } else if bb.max.y < bounds.min.y {
                Some(Edge::Down)
            } else {
                None
            };
            match edge {
                Some(edge) => {
                    if self.out_of_bounds.insert(index) {
                        raised.push((index, edge));
                    }
                }
                None => {
                    self.out_of_bounds.remove(&index);
                }
            }
        }
        for (index, edge) in raised {
            self.events
                .push(SimulationEvent::OutOfBounds(BodyId(index), edge));
        }
    }

    /// Rescale any velocity above the configured ceiling.
    fn clamp_speeds(&mut self) {
        let Some(max_speed) = self.config.max_speed else {
            return;
        };
        for body in self.bodies.iter_mut().flatten() {
            let speed = body.velocity().length();
            if speed > max_speed {
                body.set_velocity(body.velocity() * (max_speed / speed));
            }
        }
    }

    // --- diagnostics -------------------------------------------------------

    /// Simulation time advanced so far, in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Number of completed update steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Contacts resolved during the last update.
    pub fn contacts(&self) -> &[Collision] {
        &self.contacts
    }

    /// Drain the pending events, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Total kinetic plus gravitational potential energy of the dynamic
    /// bodies.
    pub fn total_energy(&self) -> f32 {
        let mut total = 0.0;
        for slot in self.bodies.iter().flatten() {
            if !slot.is_dynamic(Dof::Any) {
                continue;
            }
            let mass = slot.mass();
            if mass.is_finite() {
                total += 0.5 * mass * slot.velocity().length_squared();
                total -= mass * slot.gravity().dot(slot.position());
            }
            let inertia = slot.inertia();
            if inertia.is_finite() {
                let omega = slot.angular_velocity();
                total += 0.5 * inertia * omega * omega;
            }
        }
        total
    }

    /// Ratio of the current total energy to the value captured at the first
    /// update, `None` before the first update.
    ///
    /// A ratio drifting away from 1 in a conservative scene is the usual
    /// sign of solver instability.
    pub fn energy_ratio(&self) -> Option<f32> {
        let initial = self.initial_energy?;
        if initial.abs() < f32::EPSILON {
            return None;
        }
        Some(self.total_energy() / initial)
    }
}

/// Mutable references to two distinct slots.
fn pair_mut(bodies: &mut [Option<Body>], a: usize, b: usize) -> Option<(&mut Body, &mut Body)> {
    debug_assert_ne!(a, b);
    let (low, high, swapped) = if a < b { (a, b, false) } else { (b, a, true) };
    let (head, tail) = bodies.split_at_mut(high);
    let first = head.get_mut(low)?.as_mut()?;
    let second = tail.first_mut()?.as_mut()?;
    if swapped {
        Some((second, first))
    } else {
        Some((first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    fn no_gravity() -> SimulationConfig {
        SimulationConfig {
            gravity: Vec2::ZERO,
            ..SimulationConfig::default()
        }
    }

    fn circle(radius: f32) -> Body {
        Body::new(Shape::circle(radius).unwrap())
    }

    #[test]
    fn zero_dt_update_changes_nothing() {
        let mut sim = Simulation::default();
        let a = sim.add(circle(5.0).with_velocity(Vec2::new(1.0, 0.0)));
        let b = sim.add(circle(5.0).with_position(Vec2::new(8.0, 0.0)));

        sim.update(0.0);
        sim.update(-1.0);

        let body_a = sim.body(a).unwrap();
        assert_eq!(body_a.position(), Vec2::ZERO);
        assert_eq!(body_a.velocity(), Vec2::new(1.0, 0.0));
        assert_eq!(sim.body(b).unwrap().position(), Vec2::new(8.0, 0.0));
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    fn gravity_accelerates_free_fall() {
        let mut sim = Simulation::default();
        let id = sim.add(circle(1.0));

        sim.update(0.1);

        let body = sim.body(id).unwrap();
        assert!((body.velocity().y + 0.981).abs() < 1e-4);
        // Semi-implicit Euler moves with the new velocity.
        assert!((body.position().y + 0.0981).abs() < 1e-4);
    }

    #[test]
    fn static_floor_stops_a_falling_ball() {
        let mut sim = Simulation::new(no_gravity());
        let ball = sim.add(
            circle(1.0)
                .with_position(Vec2::new(0.0, 1.9))
                .with_velocity(Vec2::new(0.0, -10.0)),
        );
        let mut floor = circle(1.0);
        floor.make_static();
        sim.add(floor);

        sim.update(0.01);

        let v = sim.body(ball).unwrap().velocity();
        assert!(
            v.y.abs() < 1e-3,
            "inelastic contact must absorb the fall, got {:?}",
            v
        );
    }

    #[test]
    fn elastic_ball_bounces_back() {
        let mut sim = Simulation::new(no_gravity());
        sim.set_restitution(1.0);
        let ball = sim.add(
            circle(1.0)
                .with_position(Vec2::new(0.0, 1.9))
                .with_velocity(Vec2::new(0.0, -10.0)),
        );
        let mut floor = circle(1.0).with_restitution(1.0);
        floor.make_static();
        sim.add(floor);

        sim.update(0.01);

        let v = sim.body(ball).unwrap().velocity();
        assert!(
            (v.y - 10.0).abs() < 1e-2,
            "restitution 1 must reflect the fall, got {:?}",
            v
        );
    }

    #[test]
    fn energy_ratio_stays_near_one_for_elastic_circles() {
        let mut sim = Simulation::new(no_gravity());
        sim.set_restitution(1.0);
        sim.add(circle(1.0).with_velocity(Vec2::new(2.0, 0.0)));
        sim.add(
            circle(1.0)
                .with_position(Vec2::new(5.0, 0.0))
                .with_velocity(Vec2::new(-2.0, 0.0)),
        );

        for _ in 0..200 {
            sim.update(1.0 / 120.0);
        }

        let ratio = sim.energy_ratio().expect("energy captured at first update");
        assert!(
            (ratio - 1.0).abs() < 1e-2,
            "elastic frictionless scene must conserve energy, ratio {}",
            ratio
        );
    }

    #[test]
    fn global_setters_push_into_non_owners() {
        let mut sim = Simulation::default();
        let plain = sim.add(circle(1.0));
        let owner = sim.add(circle(1.0).with_gravity(Vec2::ZERO));

        sim.set_gravity(Vec2::new(0.0, -5.0));

        assert_eq!(sim.body(plain).unwrap().gravity(), Vec2::new(0.0, -5.0));
        assert_eq!(sim.body(owner).unwrap().gravity(), Vec2::ZERO);

        let events = sim.drain_events();
        assert!(events.contains(&SimulationEvent::GravityChanged(Vec2::new(0.0, -5.0))));
    }

    #[test]
    fn add_reuses_freed_slots() {
        let mut sim = Simulation::default();
        let a = sim.add(circle(1.0));
        let b = sim.add(circle(1.0));
        sim.discard(a);
        let c = sim.add(circle(1.0));

        assert_eq!(c.index(), a.index(), "freed slot must be reused");
        assert_ne!(b.index(), c.index());
        assert_eq!(sim.body_count(), 2);

        let events = sim.drain_events();
        assert_eq!(
            events,
            vec![
                SimulationEvent::BodyAdded(a),
                SimulationEvent::BodyAdded(b),
                SimulationEvent::BodyRemoved(a),
                SimulationEvent::BodyAdded(c),
            ]
        );
    }

    #[test]
    fn out_of_bounds_fires_once_per_excursion() {
        let mut sim = Simulation::new(SimulationConfig {
            gravity: Vec2::ZERO,
            bounds: Some(Bounds::new(Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0))),
            ..SimulationConfig::default()
        });
        let id = sim.add(
            circle(1.0)
                .with_position(Vec2::new(9.0, 0.0))
                .with_velocity(Vec2::new(40.0, 0.0)),
        );

        // The sweep runs on even steps; give the body time to fully exit.
        for _ in 0..6 {
            sim.update(0.1);
        }

        let crossings: Vec<_> = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimulationEvent::OutOfBounds(..)))
            .collect();
        assert_eq!(crossings, vec![SimulationEvent::OutOfBounds(id, Edge::Right)]);
    }

    #[test]
    fn out_of_bounds_rearms_after_reentry() {
        let mut sim = Simulation::new(SimulationConfig {
            gravity: Vec2::ZERO,
            bounds: Some(Bounds::new(Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0))),
            ..SimulationConfig::default()
        });
        let id = sim.add(circle(1.0).with_position(Vec2::new(20.0, 0.0)));

        sim.update(0.1); // even step: sweep sees the body outside
        assert_eq!(
            sim.drain_events()
                .iter()
                .filter(|e| matches!(e, SimulationEvent::OutOfBounds(..)))
                .count(),
            1
        );

        sim.body_mut(id).unwrap().set_position(Vec2::ZERO);
        sim.update(0.1); // odd step: clamp
        sim.update(0.1); // even step: sweep clears the excursion
        sim.body_mut(id).unwrap().set_position(Vec2::new(0.0, 20.0));
        sim.update(0.1);
        sim.update(0.1);

        let events = sim.drain_events();
        assert!(
            events.contains(&SimulationEvent::OutOfBounds(id, Edge::Up)),
            "a fresh excursion must raise a fresh signal, got {:?}",
            events
        );
    }

    #[test]
    fn max_speed_clamps_on_odd_steps() {
        let mut sim = Simulation::new(SimulationConfig {
            gravity: Vec2::ZERO,
            max_speed: Some(5.0),
            ..SimulationConfig::default()
        });
        let id = sim.add(circle(1.0).with_velocity(Vec2::new(30.0, 40.0)));

        sim.update(0.01); // even step: bounds sweep only
        assert!(sim.body(id).unwrap().velocity().length() > 5.0);

        sim.update(0.01); // odd step: clamp
        let v = sim.body(id).unwrap().velocity();
        assert!((v.length() - 5.0).abs() < 1e-4);
        // Direction is preserved.
        assert!((v.normalize() - Vec2::new(0.6, 0.8)).length() < 1e-4);
    }

    #[test]
    fn sleeping_body_is_skipped_until_contact() {
        let mut sim = Simulation::new(no_gravity());
        let sleeper = sim.add(circle(1.0).with_position(Vec2::new(0.0, 0.0)));
        sim.body_mut(sleeper).unwrap().sleep();

        sim.update(0.1);
        assert_eq!(sim.body(sleeper).unwrap().position(), Vec2::ZERO);

        // An incoming body wakes it through the contact.
        sim.add(
            circle(1.0)
                .with_position(Vec2::new(1.5, 0.0))
                .with_velocity(Vec2::new(-5.0, 0.0)),
        );
        sim.update(0.1);

        let body = sim.body(sleeper).unwrap();
        assert!(!body.is_sleeping(), "a contact must wake the sleeper");
        assert!(body.velocity().x < 0.0, "the impulse must push it away");
    }

    #[test]
    fn hooks_can_cancel_a_contact() {
        struct CancelAll {
            seen: usize,
        }
        impl CollisionHooks for CancelAll {
            fn pre_collision(&mut self, collision: &mut Collision) {
                self.seen += 1;
                collision.cancel();
            }
        }

        let mut sim = Simulation::new(no_gravity());
        let a = sim.add(circle(1.0).with_velocity(Vec2::new(5.0, 0.0)));
        sim.add(circle(1.0).with_position(Vec2::new(1.5, 0.0)));
        sim.set_hooks(CancelAll { seen: 0 });

        sim.update(0.01);

        assert_eq!(
            sim.body(a).unwrap().velocity(),
            Vec2::new(5.0, 0.0),
            "a cancelled contact must leave velocities untouched"
        );
    }

    #[test]
    fn hooks_can_soften_a_contact() {
        struct NoBounce;
        impl CollisionHooks for NoBounce {
            fn pre_collision(&mut self, collision: &mut Collision) {
                collision.set_restitution(0.0);
            }
        }

        let mut sim = Simulation::new(no_gravity());
        sim.set_restitution(1.0);
        let ball = sim.add(
            circle(1.0)
                .with_position(Vec2::new(0.0, 1.9))
                .with_velocity(Vec2::new(0.0, -10.0)),
        );
        let mut floor = circle(1.0).with_restitution(1.0);
        floor.make_static();
        sim.add(floor);
        sim.set_hooks(NoBounce);

        sim.update(0.01);

        assert!(
            sim.body(ball).unwrap().velocity().y.abs() < 1e-2,
            "the hook must have zeroed the restitution"
        );
    }

    #[test]
    fn post_collision_sees_resolved_contacts() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct Counter(Rc<Cell<usize>>);
        impl CollisionHooks for Counter {
            fn post_collision(&mut self, _collision: &Collision) {
                self.0.set(self.0.get() + 1);
            }
        }

        let count = Rc::new(Cell::new(0));
        let mut sim = Simulation::new(no_gravity());
        sim.add(circle(1.0));
        sim.add(circle(1.0).with_position(Vec2::new(1.5, 0.0)));
        sim.set_hooks(Counter(Rc::clone(&count)));

        sim.update(0.01);

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn removed_body_no_longer_collides() {
        let mut sim = Simulation::new(no_gravity());
        let a = sim.add(circle(1.0).with_velocity(Vec2::new(5.0, 0.0)));
        let b = sim.add(circle(1.0).with_position(Vec2::new(1.5, 0.0)));
        sim.discard(b);

        sim.update(0.1);

        assert_eq!(sim.body(a).unwrap().velocity(), Vec2::new(5.0, 0.0));
        assert!(sim.body(b).is_none());
    }

    #[test]
    fn contacts_are_exposed_after_update() {
        let mut sim = Simulation::new(no_gravity());
        let a = sim.add(circle(5.0));
        let b = sim.add(circle(5.0).with_position(Vec2::new(8.0, 0.0)));
        // Immovable pairs are filtered, so keep one body dynamic.
        sim.body_mut(b).unwrap().make_static();

        sim.update(0.01);

        let contacts = sim.contacts();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].body_a(), a);
        assert_eq!(contacts[0].body_b(), b);
        assert!((contacts[0].normal() - Vec2::X).length() < 0.05);
    }

    #[test]
    fn time_dependent_force_is_sampled_at_sim_time() {
        let mut sim = Simulation::new(no_gravity());
        // Force switches on just before the sixth step's sample time.
        let id = sim.add(circle(1.0).with_force(|t| {
            if t >= 0.45 {
                Vec2::new(10.0, 0.0)
            } else {
                Vec2::ZERO
            }
        }));

        for _ in 0..5 {
            sim.update(0.1);
        }
        assert_eq!(sim.body(id).unwrap().velocity(), Vec2::ZERO);

        sim.update(0.1);
        assert!(sim.body(id).unwrap().velocity().x > 0.0);
    }
}
