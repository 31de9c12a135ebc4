use thiserror::Error;

use crate::body::BodyHandle;
use crate::constraints::ConstraintHandle;
use crate::springs::SpringHandle;

/// Rejected shape construction. These are caller bugs and are never recovered internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("line shape must have a positive length, got {0}")]
    ZeroLengthLine(f32),
    #[error("convex shape needs vertices, got none")]
    EmptyConvex,
    #[error("convex shape is degenerate: {0}")]
    DegenerateConvex(&'static str),
    #[error("radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("extent must be positive and finite, got {0}")]
    InvalidExtent(f32),
    #[error("heightfield needs at least two samples, got {0}")]
    HeightfieldTooShort(usize),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    #[error("body {0:?} is not in this world")]
    UnknownBody(BodyHandle),
    #[error("constraint {0:?} is not in this world")]
    UnknownConstraint(ConstraintHandle),
    #[error("spring {0:?} is not in this world")]
    UnknownSpring(SpringHandle),
    #[error("world is stepping; defer the mutation through StepCommands")]
    Stepping,
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),
    #[error("a constraint or spring cannot join body {0:?} to itself")]
    SameBody(BodyHandle),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("at most 32 collision groups are supported, got {0}")]
    TooManyGroups(usize),
    #[error("collision group {0:?} is declared twice")]
    DuplicateGroup(String),
    #[error("unknown collision group {0:?}")]
    UnknownGroup(String),
}
