//! # World Events
//!
//! Every step the world records [`WorldEvent`]s into a queue (see
//! [`World::drain_events`](crate::World::drain_events)) and hands each one to
//! the registered [`WorldListener`]s.
//!
//! Listeners run while the world is stepping, so they never get `&mut World`.
//! Removals and wakes are queued through [`StepCommands`] and applied once
//! the step has finished.
//!
//! [`HandlerTable`] routes contact events to per-owner handlers. Owners are
//! the opaque [`OwnerId`] tags on bodies and shapes; a table entry is built
//! once, when the owner attaches, from whichever handler traits it implements.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::body::BodyHandle;
use crate::collision::ContactPoint;
use crate::constraints::ConstraintHandle;
use crate::springs::SpringHandle;

/// Opaque tag linking bodies and shapes back to an outside object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

/// A touching shape pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEvent {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub shape_a: usize,
    pub shape_b: usize,
    /// Shape owner, falling back to the body owner.
    pub owner_a: Option<OwnerId>,
    pub owner_b: Option<OwnerId>,
    /// Points from this step's narrowphase, normals from A to B. Empty for
    /// end-contact events.
    pub contacts: Vec<ContactPoint>,
}

impl ContactEvent {
    /// The side of the pair that is not `owner`.
    #[must_use]
    pub fn other_owner(&self, owner: OwnerId) -> Option<OwnerId> {
        if self.owner_a == Some(owner) {
            self.owner_b
        } else {
            self.owner_a
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    BeginContact(ContactEvent),
    EndContact(ContactEvent),
    /// First touching step of a pair that generated contact equations.
    Impact(ContactEvent),
    /// Emitted every step for each pair still touching after the solve.
    Contact(ContactEvent),
    Sleep(BodyHandle),
    Wake(BodyHandle),
    PostStep { step: u64, time: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCommand {
    RemoveBody(BodyHandle),
    RemoveConstraint(ConstraintHandle),
    RemoveSpring(SpringHandle),
    WakeUp(BodyHandle),
}

/// Mutations requested during a step, applied in order once it completes.
#[derive(Debug, Default)]
pub struct StepCommands {
    commands: Vec<StepCommand>,
}

impl StepCommands {
    pub fn remove_body(&mut self, body: BodyHandle) {
        self.commands.push(StepCommand::RemoveBody(body));
    }

    pub fn remove_constraint(&mut self, constraint: ConstraintHandle) {
        self.commands.push(StepCommand::RemoveConstraint(constraint));
    }

    pub fn remove_spring(&mut self, spring: SpringHandle) {
        self.commands.push(StepCommand::RemoveSpring(spring));
    }

    pub fn wake_up(&mut self, body: BodyHandle) {
        self.commands.push(StepCommand::WakeUp(body));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, StepCommand> {
        self.commands.drain(..)
    }
}

/// Receives every event of every step.
pub trait WorldListener {
    fn on_event(&mut self, event: &WorldEvent, commands: &mut StepCommands);
}

impl<F> WorldListener for F
where
    F: FnMut(&WorldEvent, &mut StepCommands),
{
    fn on_event(&mut self, event: &WorldEvent, commands: &mut StepCommands) {
        self(event, commands);
    }
}

pub trait BeginContactHandler {
    fn begin_contact(&mut self, event: &ContactEvent, other: Option<OwnerId>, commands: &mut StepCommands);
}

pub trait EndContactHandler {
    fn end_contact(&mut self, event: &ContactEvent, other: Option<OwnerId>, commands: &mut StepCommands);
}

pub trait ImpactHandler {
    fn impact(&mut self, event: &ContactEvent, other: Option<OwnerId>, commands: &mut StepCommands);
}

pub trait ContactHandler {
    fn contact(&mut self, event: &ContactEvent, other: Option<OwnerId>, commands: &mut StepCommands);
}

/// Handlers for one owner, one slot per event kind.
#[derive(Default)]
pub struct OwnerHandlers {
    begin_contact: Option<Box<dyn BeginContactHandler>>,
    end_contact: Option<Box<dyn EndContactHandler>>,
    impact: Option<Box<dyn ImpactHandler>>,
    contact: Option<Box<dyn ContactHandler>>,
}

impl OwnerHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_begin_contact(mut self, handler: impl BeginContactHandler + 'static) -> Self {
        self.begin_contact = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn on_end_contact(mut self, handler: impl EndContactHandler + 'static) -> Self {
        self.end_contact = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn on_impact(mut self, handler: impl ImpactHandler + 'static) -> Self {
        self.impact = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn on_contact(mut self, handler: impl ContactHandler + 'static) -> Self {
        self.contact = Some(Box::new(handler));
        self
    }

    fn dispatch(&mut self, event: &WorldEvent, me: OwnerId, commands: &mut StepCommands) {
        match event {
            WorldEvent::BeginContact(e) => {
                if let Some(h) = &mut self.begin_contact {
                    h.begin_contact(e, e.other_owner(me), commands);
                }
            }
            WorldEvent::EndContact(e) => {
                if let Some(h) = &mut self.end_contact {
                    h.end_contact(e, e.other_owner(me), commands);
                }
            }
            WorldEvent::Impact(e) => {
                if let Some(h) = &mut self.impact {
                    h.impact(e, e.other_owner(me), commands);
                }
            }
            WorldEvent::Contact(e) => {
                if let Some(h) = &mut self.contact {
                    h.contact(e, e.other_owner(me), commands);
                }
            }
            WorldEvent::Sleep(_) | WorldEvent::Wake(_) | WorldEvent::PostStep { .. } => {}
        }
    }
}

/// Owner to handler registration table.
#[derive(Default)]
pub struct HandlerTable {
    owners: HashMap<OwnerId, OwnerHandlers>,
}

impl HandlerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `owner`, replacing any previous handlers.
    pub fn attach(&mut self, owner: OwnerId, handlers: OwnerHandlers) {
        self.owners.insert(owner, handlers);
    }

    pub fn detach(&mut self, owner: OwnerId) -> bool {
        self.owners.remove(&owner).is_some()
    }

    #[must_use]
    pub fn is_attached(&self, owner: OwnerId) -> bool {
        self.owners.contains_key(&owner)
    }
}

impl WorldListener for HandlerTable {
    fn on_event(&mut self, event: &WorldEvent, commands: &mut StepCommands) {
        let (owner_a, owner_b) = match event {
            WorldEvent::BeginContact(e)
            | WorldEvent::EndContact(e)
            | WorldEvent::Impact(e)
            | WorldEvent::Contact(e) => (e.owner_a, e.owner_b),
            _ => return,
        };
        for owner in [owner_a, owner_b].into_iter().flatten() {
            if let Some(handlers) = self.owners.get_mut(&owner) {
                handlers.dispatch(event, owner, commands);
            }
            if owner_a == owner_b {
                break;
            }
        }
    }
}
