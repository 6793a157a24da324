//! The Population Snapshot: one slot per worker, holding the latest
//! `(steps, value, temperature, cooling_rate, p_mutations)` tuple. Written
//! only by its owning worker, read by the scribe on every tick and by the
//! truncation coordinator policy.
//!
//! Every field is single-writer, so plain per-field atomics suffice — no
//! slot-wide lock, and no contention between workers since each only ever
//! touches its own slot.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::Value;

/// One worker's latest published state. Floating-point fields are stored
/// as their raw bits in an `AtomicU64`, since `std::sync::atomic` has no
/// `AtomicF64`; `Ordering::Relaxed` is sufficient because each field is
/// independent and tearing within one field's word is the only thing
/// atomics need to rule out — a reader seeing one field from an older tick
/// and another from a newer one is an acceptable, monitoring-grade torn
/// read across fields.
pub struct Slot {
    steps: AtomicU64,
    value: AtomicI64,
    temperature: AtomicU64,
    cooling_rate: AtomicU64,
    p_mutations: AtomicU64,
}

/// An immutable, torn-free-per-field read of one slot at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotSummary {
    pub steps: u64,
    pub value: Value,
    pub temperature: f64,
    pub cooling_rate: f64,
    pub p_mutations: f64,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            steps: AtomicU64::new(0),
            value: AtomicI64::new(0),
            temperature: AtomicU64::new(0f64.to_bits()),
            cooling_rate: AtomicU64::new(0f64.to_bits()),
            p_mutations: AtomicU64::new(0f64.to_bits()),
        }
    }
}

impl Slot {
    pub fn write(&self, summary: SlotSummary) {
        self.steps.store(summary.steps, Ordering::Relaxed);
        self.value.store(summary.value, Ordering::Relaxed);
        self.temperature
            .store(summary.temperature.to_bits(), Ordering::Relaxed);
        self.cooling_rate
            .store(summary.cooling_rate.to_bits(), Ordering::Relaxed);
        self.p_mutations
            .store(summary.p_mutations.to_bits(), Ordering::Relaxed);
    }

    pub fn read(&self) -> SlotSummary {
        SlotSummary {
            steps: self.steps.load(Ordering::Relaxed),
            value: self.value.load(Ordering::Relaxed),
            temperature: f64::from_bits(self.temperature.load(Ordering::Relaxed)),
            cooling_rate: f64::from_bits(self.cooling_rate.load(Ordering::Relaxed)),
            p_mutations: f64::from_bits(self.p_mutations.load(Ordering::Relaxed)),
        }
    }
}

/// `N` independent slots, one per worker. Shared behind an `Arc` by the
/// supervisor so every worker, the coordinator, and the scribe can hold a
/// cheap clone of the handle.
pub struct PopulationSnapshot {
    slots: Vec<Slot>,
}

impl PopulationSnapshot {
    pub fn new(n_workers: usize) -> Self {
        Self {
            slots: (0..n_workers).map(|_| Slot::default()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    /// Reads every slot in index order, the scribe's and the `trunc`
    /// policy's only access pattern.
    pub fn read_all(&self) -> Vec<SlotSummary> {
        self.slots.iter().map(Slot::read).collect()
    }
}
