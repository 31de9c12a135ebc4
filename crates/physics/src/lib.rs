#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # physics2d
//!
//! A fixed-timestep 2D rigid-body engine for real-time simulation loops.
//!
//! The engine owns bodies, joints and springs inside a [`World`] and advances
//! them one step at a time: broadphase culling over a spatial hash, exact
//! narrowphase tests per shape pair, a Gauss-Seidel solve over contact,
//! friction and joint rows, then integration and sleep bookkeeping.
//!
//! ## Key Components
//!
//! -   **Bodies and shapes:** [`Body`] carries mass properties and motion
//!     state; [`Shape`] is one of circle, particle, line, capsule, box,
//!     convex polygon, plane or heightfield, placed at a local offset.
//! -   **Collision:** [`collision`] holds the [`SpatialHash`] broadphase, the
//!     shape-pair [`CollisionDispatcher`] and the [`Narrowphase`] that turns
//!     contacts into solver rows.
//! -   **Solver:** [`GsSolver`] iterates pooled [`Equation`] rows using SPOOK
//!     stabilization. Its working state never leaks into public types.
//! -   **Joints and springs:** distance, revolute and lock [`Constraint`]s
//!     solved as rows; [`Spring`]s applied as plain forces.
//! -   **Queries and events:** [`Ray`] casts, point hit tests, and
//!     [`WorldEvent`]s for contact begin/end/impact, sleep and wake.
//!
//! ## Usage
//!
//! ```rust
//! use physics2d::{Body, Shape, Vec2, World, WorldConfig};
//!
//! let mut world = World::new(WorldConfig::default());
//! world.add_body(Body::new_static().with_shape(Shape::plane()))?;
//! let ball = world.add_body(
//!     Body::dynamic(1.0)
//!         .with_position(Vec2::new(0.0, 2.0))
//!         .with_shape(Shape::circle(0.5)?),
//! )?;
//!
//! for _ in 0..120 {
//!     world.step(1.0 / 60.0)?;
//! }
//! assert!(world.body(ball).unwrap().position.y > 0.4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod body;
mod builder;
pub mod collision;
pub mod config;
pub mod constraints;
pub mod contact_list;
pub mod context;
pub mod equations;
pub mod error;
pub mod events;
pub mod groups;
pub mod integrator;
pub mod ray;
pub mod shapes;
pub mod solver;
pub mod springs;
pub mod types;
mod world;

pub use body::{Body, BodyHandle, BodyType, SleepState};
pub use collision::{CollisionDispatcher, CombineRule, ContactPoint, Narrowphase, SpatialHash};
pub use config::{BroadphaseConfig, SleepConfig, SolverConfig, WorldConfig};
pub use constraints::{
    Constraint, ConstraintHandle, ConstraintKind, DistanceJoint, LockJoint, RevoluteJoint,
    RevoluteMotor,
};
pub use contact_list::{ContactKey, ContactList};
pub use context::{NullProfiler, Phase, PhaseTimings, Profiler, StepContext, StepStats};
pub use equations::{Equation, EquationId, EquationKind, EquationPool};
pub use error::{GroupError, ShapeError, WorldError};
pub use events::{
    BeginContactHandler, ContactEvent, ContactHandler, EndContactHandler, HandlerTable,
    ImpactHandler, OwnerHandlers, OwnerId, StepCommands, WorldEvent, WorldListener,
};
pub use groups::CollisionGroups;
pub use ray::{Ray, RayMode, RaycastResult};
pub use shapes::{Shape, ShapeKind, ShapeType};
pub use solver::GsSolver;
pub use springs::{Spring, SpringHandle, SpringKind};
pub use types::{Aabb, BodyState, Vec2};
pub use world::World;
