//! The PDCH/TFI/USF allocator (spec §4.G): Algorithm A (single-slot,
//! round-robin) and Algorithm B (multislot-class-aware).

pub mod multislot;
pub mod single_slot;

pub use crate::pdch::Direction;
