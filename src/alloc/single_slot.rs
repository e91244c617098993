//! Algorithm A: single-slot round robin (spec §4.G).
//!
//! Grounded in `original_source/tests/alloc/AllocTest.cpp: test_alloc_a`:
//! on mask `0x0C` (2 enabled PDCHs) it allocates 32 downlink TBFs before
//! `NoResources` (one PDCH's worth of TFIs — the first PDCH never exhausts
//! before 32 uses, so a second PDCH is never tried) but only 14 uplink TBFs
//! (`2 PDCHs * 7 usable USFs`, since USF `0b111` is reserved and unusable —
//! see `pdch::USF_UNUSED`). Both counts fall out of the same rule: try each
//! enabled PDCH in order (TRXs in index order, then timeslots within a TRX)
//! and take the first one with a free TFI (and, for uplink, a free USF
//! too), falling through to the next enabled PDCH otherwise. Uplink
//! exhausts a PDCH's USFs long before its TFIs, so it naturally spreads
//! across every enabled PDCH; downlink has no USF constraint, so it fills
//! the first PDCH's 32 TFIs without ever touching a second one.

use std::cell::RefCell;
use std::rc::Rc;

use crate::bts::Bts;
use crate::error::{CoreError, CoreResult};
use crate::ms::GprsMs;
use crate::pdch::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleSlotAssignment {
    pub trx: u8,
    pub ts: u8,
    pub tfi: u8,
    /// Uplink only.
    pub usf: Option<u8>,
}

/// Scans enabled PDCHs (TRXs in index order, then timeslots within a TRX)
/// and allocates on the first one with a free TFI (and, for uplink, a free
/// USF). Falls through to the next enabled PDCH when the current one can't
/// satisfy the request; fails with `NoResources` once none can.
pub fn allocate(bts: &mut Bts, dir: Direction, owner: &Rc<RefCell<GprsMs>>) -> CoreResult<SingleSlotAssignment> {
    for (trx_idx, trx) in bts.trx.iter_mut().enumerate() {
        for (ts, pdch) in trx.pdch.iter_mut().enumerate() {
            if !pdch.enabled {
                continue;
            }
            let tfi = match pdch.first_free_tfi(dir) {
                Some(tfi) => tfi,
                None => continue,
            };
            let usf = if dir == Direction::Uplink {
                match pdch.first_free_usf() {
                    Some(usf) => Some(usf),
                    None => continue,
                }
            } else {
                None
            };

            pdch.occupy_tfi(dir, tfi, owner);
            if let Some(usf) = usf {
                pdch.occupy_usf(usf, owner);
            }
            return Ok(SingleSlotAssignment { trx: trx_idx as u8, ts: ts as u8, tfi, usf });
        }
    }
    Err(CoreError::NoResources)
}
