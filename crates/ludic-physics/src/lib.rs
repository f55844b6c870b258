//! 2D rigid body physics kernel for ludic.
//!
//! Provides rigid body dynamics with collision detection and response:
//! - [`Body`] - a rigid body with a circle, box, or convex polygon shape
//! - [`Simulation`] - the owning container that steps the world each frame
//! - [`Collision`] - a resolved contact, observable through [`CollisionHooks`]
//!
//! The pipeline per [`Simulation::update`] is force accumulation, velocity
//! integration, sweep-and-prune broad phase, exact narrow phase, sequential
//! impulse resolution with Coulomb friction, positional correction, and
//! position integration.
//!
//! ```
//! use glam::Vec2;
//! use ludic_physics::{Body, Shape, Simulation};
//!
//! let mut sim = Simulation::default();
//!
//! let ball = sim.add(
//!     Body::new(Shape::circle(1.0)?).with_position(Vec2::new(0.0, 10.0)),
//! );
//! let mut floor = Body::new(Shape::aabb(100.0, 2.0)?);
//! floor.make_static();
//! sim.add(floor);
//!
//! for _ in 0..60 {
//!     sim.update(1.0 / 60.0);
//! }
//!
//! let resting = sim.body(ball).unwrap();
//! assert!(resting.position().y > 1.0, "the floor holds the ball up");
//! # Ok::<(), ludic_physics::PhysicsError>(())
//! ```

pub mod body;
pub mod broad;
pub mod error;
mod narrow;
pub mod shape;
pub mod simulation;
pub mod solver;

pub use body::{Body, BodyFlags, BodyId, Dof};
pub use broad::{BroadPhase, BroadStrategy};
pub use error::PhysicsError;
pub use shape::{Aabb, Bounds, Circle, Polygon, Shape};
pub use simulation::{CollisionHooks, Edge, Simulation, SimulationConfig, SimulationEvent};
pub use solver::Collision;
