use std::ops::{Index, IndexMut};

use super::Equation;

/// Slot index of an equation inside an [`EquationPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EquationId(u32);

impl EquationId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Free-list arena of equation slots reused every step.
///
/// Slots are only ever appended when the free list is empty, so a world that
/// has reached its peak contact count stops allocating.
#[derive(Debug, Default)]
pub struct EquationPool {
    slots: Vec<Equation>,
    free: Vec<u32>,
}

impl EquationPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `equation` in a free slot.
    pub fn acquire(&mut self, equation: Equation) -> EquationId {
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = equation;
            EquationId(slot)
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let slot = self.slots.len() as u32;
            self.slots.push(equation);
            EquationId(slot)
        }
    }

    pub fn release(&mut self, id: EquationId) {
        debug_assert!(!self.free.contains(&id.0), "equation slot released twice");
        self.free.push(id.0);
    }

    /// Release every id in `ids`, leaving it empty.
    pub fn release_all(&mut self, ids: &mut Vec<EquationId>) {
        self.free.extend(ids.drain(..).map(|id| id.0));
    }

    #[must_use]
    pub fn get(&self, id: EquationId) -> Option<&Equation> {
        self.slots.get(id.index())
    }

    pub fn get_mut(&mut self, id: EquationId) -> Option<&mut Equation> {
        self.slots.get_mut(id.index())
    }

    /// Slots currently handed out.
    #[must_use]
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Slots ever allocated.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl Index<EquationId> for EquationPool {
    type Output = Equation;

    fn index(&self, id: EquationId) -> &Equation {
        &self.slots[id.index()]
    }
}

impl IndexMut<EquationId> for EquationPool {
    fn index_mut(&mut self, id: EquationId) -> &mut Equation {
        &mut self.slots[id.index()]
    }
}
