//! Slot-addressed address bucket.

use super::types::BookEntry;

/// A fixed-size bucket of address slots.
///
/// Slots are addressed directly by the placement hash; a collision
/// displaces the occupant rather than probing.
#[derive(Debug, Clone)]
pub struct AddressBucket {
    slots: Vec<Option<BookEntry>>,
}

impl AddressBucket {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    /// Occupied slot count.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    pub fn get(&self, slot: usize) -> Option<&BookEntry> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut BookEntry> {
        self.slots.get_mut(slot).and_then(|s| s.as_mut())
    }

    /// Place an entry into its slot, returning the displaced occupant.
    pub fn place(&mut self, slot: usize, entry: BookEntry) -> Option<BookEntry> {
        self.slots[slot].replace(entry)
    }

    /// Empty a slot, returning its occupant.
    pub fn remove(&mut self, slot: usize) -> Option<BookEntry> {
        self.slots.get_mut(slot).and_then(|s| s.take())
    }

    /// All occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BookEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|entry| (idx, entry)))
    }
}
