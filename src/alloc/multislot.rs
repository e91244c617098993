//! Algorithm B: multislot-class-aware allocation (spec §4.G).
//!
//! `CLASS_TABLE` supplies the `(rx, tx, sum, tta, ttb, tra, trb)` bounds of
//! TS 45.002 Annex B.1 for Type 1 multislot classes 1-12 — public,
//! widely-published standard values, not reproduced from any file in the
//! retrieved pack (SPEC_FULL §11.7). Classes above 12 (including the Type 2
//! "b-variant" classes 13-18 that support simultaneous Rx/Tx) are not
//! populated: no fixture in the retrieved pack exercises them and their
//! timing columns differ enough from the Type 1 shape that guessing exact
//! values risks silently wrong allocations, so `slot_mask` returns
//! `Unsupported` for them rather than fabricating numbers (Open Question
//! decision, see DESIGN.md).
//!
//! The switching-time columns are enforced, not just carried: when the MS
//! already holds a TBF in the opposite direction, `slot_mask` rejects any
//! candidate window whose cyclic gap to that window's slots (within the
//! repeating 8-slot TDMA frame) is narrower than the class allows — `Tta`
//! timeslots are required between the end of the Rx window and the start
//! of the Tx window, `Ttb` between the end of the Tx window and the start
//! of the next frame's Rx window (TS 45.002 Annex B.1's standard Type 1
//! switching-time definitions). `Tra`/`Trb` (the relaxed bounds used only
//! when the MS is also monitoring neighbor cells) are carried on
//! `MultislotClass` but not enforced here: this allocator has no model of
//! neighbor-cell measurement scheduling to decide when the relaxed bound
//! applies instead of the strict one (documented, not silently dropped).

use std::cell::RefCell;
use std::rc::Rc;

use crate::bts::Bts;
use crate::error::{CoreError, CoreResult};
use crate::ms::GprsMs;
use crate::pdch::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultislotClass {
    pub rx: u8,
    pub tx: u8,
    pub sum: u8,
    pub tta: Option<u8>,
    pub ttb: u8,
    pub tra: u8,
    pub trb: u8,
}

const CLASS_TABLE: [MultislotClass; 12] = [
    MultislotClass { rx: 1, tx: 1, sum: 2, tta: Some(3), ttb: 2, tra: 4, trb: 2 },
    MultislotClass { rx: 2, tx: 1, sum: 3, tta: Some(3), ttb: 2, tra: 3, trb: 1 },
    MultislotClass { rx: 2, tx: 2, sum: 3, tta: Some(3), ttb: 2, tra: 3, trb: 1 },
    MultislotClass { rx: 3, tx: 1, sum: 4, tta: Some(3), ttb: 1, tra: 3, trb: 1 },
    MultislotClass { rx: 2, tx: 2, sum: 4, tta: Some(3), ttb: 1, tra: 3, trb: 1 },
    MultislotClass { rx: 3, tx: 2, sum: 4, tta: Some(3), ttb: 1, tra: 3, trb: 1 },
    MultislotClass { rx: 3, tx: 3, sum: 4, tta: Some(3), ttb: 1, tra: 3, trb: 1 },
    MultislotClass { rx: 4, tx: 1, sum: 5, tta: Some(3), ttb: 1, tra: 2, trb: 1 },
    MultislotClass { rx: 3, tx: 2, sum: 5, tta: Some(3), ttb: 1, tra: 2, trb: 1 },
    MultislotClass { rx: 4, tx: 2, sum: 5, tta: Some(3), ttb: 1, tra: 2, trb: 1 },
    MultislotClass { rx: 4, tx: 3, sum: 5, tta: Some(3), ttb: 1, tra: 2, trb: 1 },
    MultislotClass { rx: 4, tx: 4, sum: 5, tta: Some(2), ttb: 1, tra: 2, trb: 1 },
];

pub fn class_for(ms_class: u8) -> CoreResult<MultislotClass> {
    CLASS_TABLE
        .get(ms_class.checked_sub(1).unwrap_or(255) as usize)
        .copied()
        .ok_or(CoreError::Unsupported("multislot class outside the populated Type 1 table"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultislotAssignment {
    pub trx: u8,
    pub first_common_ts: u8,
    pub control_ts: u8,
    /// Bitmask over timeslots 0..7.
    pub slot_mask: u8,
}

/// Minimum cyclic gap (in timeslots, over the repeating 8-slot TDMA frame)
/// from the end of `from` to the start of `to`, treating a shared slot (the
/// common control timeslot) as requiring no switch at all.
fn cyclic_gap(from_end: u8, to_start: u8) -> u8 {
    if from_end == to_start {
        return 0;
    }
    (to_start + 8 - from_end - 1) % 8
}

fn lowest_set_bit(mask: u8) -> u8 {
    mask.trailing_zeros() as u8
}

fn highest_set_bit(mask: u8) -> u8 {
    7 - mask.leading_zeros() as u8
}

/// Whether `window` (the candidate, direction `dir`) respects the class's
/// `Tta`/`Ttb` switching-time bounds against `other` (the MS's existing TBF
/// in the opposite direction), if any. The shared control timeslot doesn't
/// itself need a turnaround, so the gap is measured between the slots each
/// direction holds beyond that shared one; if one direction holds nothing
/// beyond it, there is no second edge to guard and the pair is accepted.
fn respects_switching_time(class: &MultislotClass, dir: Direction, window: &[u8], other: Option<&MultislotAssignment>) -> bool {
    let Some(other) = other else { return true };
    let mut window_mask = 0u8;
    for &ts in window {
        window_mask |= 1 << ts;
    }
    let window_only = window_mask & !other.slot_mask;
    let other_only = other.slot_mask & !window_mask;
    if window_only == 0 || other_only == 0 {
        return true;
    }
    let tta = match class.tta {
        Some(tta) => tta,
        None => return true,
    };
    let (rx_start, rx_end, tx_start, tx_end) = match dir {
        Direction::Downlink => (
            lowest_set_bit(window_only),
            highest_set_bit(window_only),
            lowest_set_bit(other_only),
            highest_set_bit(other_only),
        ),
        Direction::Uplink => (
            lowest_set_bit(other_only),
            highest_set_bit(other_only),
            lowest_set_bit(window_only),
            highest_set_bit(window_only),
        ),
    };
    cyclic_gap(rx_end, tx_start) >= tta && cyclic_gap(tx_end, rx_start) >= class.ttb
}

/// Builds a slot mask that fits entirely within one TRX's enabled PDCHs,
/// respects the class's Rx/Tx/Sum bounds and, when the MS already has a TBF
/// in the opposite direction, its Tta/Ttb switching-time bounds too, per
/// spec §4.G. The chosen mask's `first_common_ts` must equal `existing`'s
/// when given. Ties broken by smallest `control_ts`, then fewest slots.
pub fn slot_mask(
    bts: &Bts,
    dir: Direction,
    ms_class: u8,
    existing: Option<MultislotAssignment>,
    single_slot: bool,
) -> CoreResult<MultislotAssignment> {
    let class = class_for(ms_class)?;
    let want = if dir == Direction::Uplink { class.tx } else { class.rx };
    let max_slots = if single_slot { 1 } else { want.min(class.sum) };
    let existing_common_ts = existing.map(|e| e.first_common_ts);

    let mut best: Option<MultislotAssignment> = None;

    for (trx_idx, trx) in bts.trx.iter().enumerate() {
        let enabled: Vec<u8> = (0..8u8).filter(|&ts| trx.pdch[ts as usize].enabled).collect();
        if enabled.is_empty() {
            continue;
        }
        if let Some(common) = existing_common_ts {
            if !enabled.contains(&common) {
                continue;
            }
        }

        for window_len in 1..=max_slots.max(1) {
            for start_idx in 0..enabled.len() {
                if start_idx + window_len as usize > enabled.len() {
                    break;
                }
                let window = &enabled[start_idx..start_idx + window_len as usize];
                let contiguous = window.windows(2).all(|pair| pair[1] == pair[0] + 1);
                if !contiguous {
                    continue;
                }
                let first_common_ts = existing_common_ts.unwrap_or(window[0]);
                if !window.contains(&first_common_ts) {
                    continue;
                }
                if trx_idx as u8 == existing.map(|e| e.trx).unwrap_or(trx_idx as u8)
                    && !respects_switching_time(&class, dir, window, existing.as_ref())
                {
                    continue;
                }
                let mut mask = 0u8;
                for &ts in window {
                    mask |= 1 << ts;
                }
                let control_ts = window[0];
                let candidate = MultislotAssignment { trx: trx_idx as u8, first_common_ts, control_ts, slot_mask: mask };
                best = Some(match best {
                    None => candidate,
                    Some(current) => {
                        if candidate.control_ts < current.control_ts
                            || (candidate.control_ts == current.control_ts
                                && candidate.slot_mask.count_ones() < current.slot_mask.count_ones())
                        {
                            candidate
                        } else {
                            current
                        }
                    }
                });
            }
        }
    }

    best.ok_or(CoreError::NoResources)
}
