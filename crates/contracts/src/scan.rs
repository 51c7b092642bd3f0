//! Scan - 360-slot buffer of the latest reading per whole degree
//!
//! Fixed-size and `Copy`, so readers always work on their own snapshot.

use std::fmt;
use std::ops::Index;

use crate::Measurement;

/// Number of slots, one per integer degree
pub const SLOT_COUNT: usize = 360;

/// Latest measurement per degree; `None` means no reading yet
#[derive(Clone, Copy, PartialEq)]
pub struct Scan {
    slots: [Option<Measurement>; SLOT_COUNT],
}

impl Scan {
    /// All slots empty
    pub const fn empty() -> Self {
        Self {
            slots: [None; SLOT_COUNT],
        }
    }

    /// Reading stored for `angle` (taken modulo 360)
    #[inline]
    pub fn get(&self, angle: usize) -> Option<&Measurement> {
        self.slots[angle % SLOT_COUNT].as_ref()
    }

    /// Replace the slot the measurement belongs to, returning the previous one
    #[inline]
    pub fn insert(&mut self, measurement: Measurement) -> Option<Measurement> {
        self.slots[measurement.slot()].replace(measurement)
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        self.slots = [None; SLOT_COUNT];
    }

    /// Number of slots holding a reading
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// `(degree, measurement)` for every occupied slot
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Measurement)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(angle, slot)| slot.as_ref().map(|m| (angle, m)))
    }

    /// Raw slot array
    pub fn slots(&self) -> &[Option<Measurement>; SLOT_COUNT] {
        &self.slots
    }
}

impl Default for Scan {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index<usize> for Scan {
    type Output = Option<Measurement>;

    #[inline]
    fn index(&self, angle: usize) -> &Self::Output {
        &self.slots[angle % SLOT_COUNT]
    }
}

impl fmt::Debug for Scan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scan")
            .field("occupied", &self.len())
            .field("capacity", &SLOT_COUNT)
            .finish()
    }
}
