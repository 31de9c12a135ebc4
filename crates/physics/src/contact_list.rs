//! # Contact List
//!
//! Tracks which shape pairs are touching from one step to the next. Diffing
//! the current step's pairs against the previous set yields the begin and end
//! transitions; every record still present afterwards is "still touching".

use crate::body::BodyHandle;

/// Unordered `(body, shape)` pair. `(A, B)` and `(B, A)` build the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactKey {
    pub body_a: BodyHandle,
    pub shape_a: usize,
    pub body_b: BodyHandle,
    pub shape_b: usize,
}

impl ContactKey {
    #[must_use]
    pub fn new(body_a: BodyHandle, shape_a: usize, body_b: BodyHandle, shape_b: usize) -> Self {
        if (body_a, shape_a) <= (body_b, shape_b) {
            Self {
                body_a,
                shape_a,
                body_b,
                shape_b,
            }
        } else {
            Self {
                body_a: body_b,
                shape_a: shape_b,
                body_b: body_a,
                shape_b: shape_a,
            }
        }
    }

    #[must_use]
    pub fn involves(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }
}

/// Sorted record sets with their per-step transitions.
#[derive(Debug, Default)]
pub struct ContactList {
    active: Vec<ContactKey>,
    scratch: Vec<ContactKey>,
    began: Vec<ContactKey>,
    ended: Vec<ContactKey>,
}

impl ContactList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &ContactKey) -> bool {
        self.active.binary_search(key).is_ok()
    }

    /// Records touching as of the last update, sorted.
    #[must_use]
    pub fn active(&self) -> &[ContactKey] {
        &self.active
    }

    /// Records that appeared in the last update.
    #[must_use]
    pub fn began(&self) -> &[ContactKey] {
        &self.began
    }

    /// Records that disappeared in the last update.
    #[must_use]
    pub fn ended(&self) -> &[ContactKey] {
        &self.ended
    }

    /// Replace the active set with `touching` and compute the transitions.
    pub fn update(&mut self, touching: impl IntoIterator<Item = ContactKey>) {
        self.scratch.clear();
        self.scratch.extend(touching);
        self.scratch.sort_unstable();
        self.scratch.dedup();

        self.began.clear();
        self.ended.clear();
        let (mut i, mut j) = (0, 0);
        while i < self.active.len() || j < self.scratch.len() {
            match (self.active.get(i), self.scratch.get(j)) {
                (Some(old), Some(new)) if old == new => {
                    i += 1;
                    j += 1;
                }
                (Some(old), Some(new)) if old < new => {
                    self.ended.push(*old);
                    i += 1;
                }
                (Some(old), None) => {
                    self.ended.push(*old);
                    i += 1;
                }
                (_, Some(new)) => {
                    self.began.push(*new);
                    j += 1;
                }
                (None, None) => break,
            }
        }
        std::mem::swap(&mut self.active, &mut self.scratch);
    }

    /// Drop every record involving `body`, returning the dropped records.
    pub fn remove_body(&mut self, body: BodyHandle) -> Vec<ContactKey> {
        let removed: Vec<ContactKey> = self
            .active
            .iter()
            .filter(|key| key.involves(body))
            .copied()
            .collect();
        self.active.retain(|key| !key.involves(body));
        removed
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.began.clear();
        self.ended.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn bodies() -> (BodyHandle, BodyHandle, BodyHandle) {
        let mut keys: SlotMap<BodyHandle, ()> = SlotMap::with_key();
        (keys.insert(()), keys.insert(()), keys.insert(()))
    }

    #[test]
    fn key_is_unordered() {
        let (a, b, _) = bodies();
        assert_eq!(ContactKey::new(a, 0, b, 1), ContactKey::new(b, 1, a, 0));
        assert_ne!(ContactKey::new(a, 0, b, 1), ContactKey::new(a, 1, b, 0));
    }

    #[test]
    fn transitions_fire_once() {
        let (a, b, c) = bodies();
        let ab = ContactKey::new(a, 0, b, 0);
        let bc = ContactKey::new(b, 0, c, 0);
        let mut list = ContactList::new();

        list.update([ab]);
        assert_eq!(list.began(), &[ab]);
        assert!(list.ended().is_empty());

        list.update([ab, bc]);
        assert_eq!(list.began(), &[bc]);
        assert!(list.ended().is_empty());

        list.update([bc]);
        assert!(list.began().is_empty());
        assert_eq!(list.ended(), &[ab]);
        assert!(list.contains(&bc));
        assert!(!list.contains(&ab));
    }

    #[test]
    fn duplicates_collapse() {
        let (a, b, _) = bodies();
        let mut list = ContactList::new();
        list.update([ContactKey::new(a, 0, b, 0), ContactKey::new(b, 0, a, 0)]);
        assert_eq!(list.active().len(), 1);
        assert_eq!(list.began().len(), 1);
    }

    #[test]
    fn removing_a_body_purges_its_records() {
        let (a, b, c) = bodies();
        let mut list = ContactList::new();
        list.update([ContactKey::new(a, 0, b, 0), ContactKey::new(b, 0, c, 0)]);
        let removed = list.remove_body(a);
        assert_eq!(removed, vec![ContactKey::new(a, 0, b, 0)]);
        assert_eq!(list.active(), &[ContactKey::new(b, 0, c, 0)]);
    }
}
