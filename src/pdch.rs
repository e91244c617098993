//! One packet data channel, one timeslot on one TRX (spec §3).
//!
//! The TFI/USF occupancy tables are modeled as `Weak<RefCell<GprsMs>>` slots
//! rather than direct `Weak<Tbf>` references: a `Tbf` is an owned field of
//! its `GprsMs` (spec §9's ownership DAG has the MS, not the PDCH, own the
//! TBF), so the non-owning "which MS currently holds this TFI/USF" pointer
//! is expressed one level up, upgraded and then dereferenced into the right
//! direction's TBF field by the caller (Open Question decision, see
//! DESIGN.md).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::ms::GprsMs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Uplink,
    Downlink,
}

pub const NUM_TFI: usize = 32;
pub const NUM_USF: usize = 8;
/// USF value `0b111` is reserved (TS 44.060 §10.4.1: it never schedules a
/// real uplink block), so only 7 of the 8 USF values are allocatable.
pub const USF_UNUSED: u8 = 7;

pub struct Pdch {
    pub enabled: bool,
    pub tsc: u8,
    ul_owner: [Option<Weak<RefCell<GprsMs>>>; NUM_TFI],
    dl_owner: [Option<Weak<RefCell<GprsMs>>>; NUM_TFI],
    usf_owner: [Option<Weak<RefCell<GprsMs>>>; NUM_USF],
    pub next_ul_tfi: u8,
    pub next_dl_tfi: u8,
    pub last_rts_fn: u32,
}

impl Pdch {
    pub fn new(tsc: u8) -> Self {
        Pdch {
            enabled: false,
            tsc,
            ul_owner: std::array::from_fn(|_| None),
            dl_owner: std::array::from_fn(|_| None),
            usf_owner: std::array::from_fn(|_| None),
            next_ul_tfi: 0,
            next_dl_tfi: 0,
            last_rts_fn: 0,
        }
    }

    fn owners(&self, dir: Direction) -> &[Option<Weak<RefCell<GprsMs>>>; NUM_TFI] {
        match dir {
            Direction::Uplink => &self.ul_owner,
            Direction::Downlink => &self.dl_owner,
        }
    }

    fn owners_mut(&mut self, dir: Direction) -> &mut [Option<Weak<RefCell<GprsMs>>>; NUM_TFI] {
        match dir {
            Direction::Uplink => &mut self.ul_owner,
            Direction::Downlink => &mut self.dl_owner,
        }
    }

    /// A slot is free if unoccupied, or its claimed owner has since been
    /// dropped (the weak upgrade fails) — stale slots self-heal on lookup.
    fn is_tfi_free(&self, dir: Direction, tfi: u8) -> bool {
        match &self.owners(dir)[tfi as usize] {
            None => true,
            Some(weak) => weak.upgrade().is_none(),
        }
    }

    pub fn first_free_tfi(&self, dir: Direction) -> Option<u8> {
        (0..NUM_TFI as u8).find(|&tfi| self.is_tfi_free(dir, tfi))
    }

    pub fn occupy_tfi(&mut self, dir: Direction, tfi: u8, owner: &Rc<RefCell<GprsMs>>) {
        self.owners_mut(dir)[tfi as usize] = Some(Rc::downgrade(owner));
    }

    pub fn free_tfi(&mut self, dir: Direction, tfi: u8) {
        self.owners_mut(dir)[tfi as usize] = None;
    }

    fn is_usf_free(&self, usf: u8) -> bool {
        match &self.usf_owner[usf as usize] {
            None => true,
            Some(weak) => weak.upgrade().is_none(),
        }
    }

    pub fn first_free_usf(&self) -> Option<u8> {
        (0..USF_UNUSED).find(|&usf| self.is_usf_free(usf))
    }

    pub fn occupy_usf(&mut self, usf: u8, owner: &Rc<RefCell<GprsMs>>) {
        self.usf_owner[usf as usize] = Some(Rc::downgrade(owner));
    }

    pub fn free_usf(&mut self, usf: u8) {
        self.usf_owner[usf as usize] = None;
    }

    /// Every MS currently holding a TFI in `dir` on this PDCH (stale,
    /// already-dropped owners are skipped), for the scheduler's RTS scan.
    pub fn occupants(&self, dir: Direction) -> impl Iterator<Item = Rc<RefCell<GprsMs>>> + '_ {
        self.owners(dir).iter().filter_map(|slot| slot.as_ref().and_then(Weak::upgrade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ms::MsRegistry;

    fn dummy_ms() -> Rc<RefCell<GprsMs>> {
        MsRegistry::new().get_or_create(1, None, None)
    }

    #[test]
    fn free_tfi_scan_finds_the_lowest_unoccupied_index() {
        let mut pdch = Pdch::new(1);
        let ms = dummy_ms();
        pdch.occupy_tfi(Direction::Uplink, 0, &ms);
        pdch.occupy_tfi(Direction::Uplink, 1, &ms);
        assert_eq!(pdch.first_free_tfi(Direction::Uplink), Some(2));
    }

    #[test]
    fn freed_tfi_becomes_available_again() {
        let mut pdch = Pdch::new(1);
        let ms = dummy_ms();
        pdch.occupy_tfi(Direction::Uplink, 0, &ms);
        pdch.free_tfi(Direction::Uplink, 0);
        assert_eq!(pdch.first_free_tfi(Direction::Uplink), Some(0));
    }

    #[test]
    fn stale_weak_owner_self_heals_as_free() {
        let mut pdch = Pdch::new(1);
        {
            let ms = dummy_ms();
            pdch.occupy_tfi(Direction::Uplink, 0, &ms);
        }
        assert_eq!(pdch.first_free_tfi(Direction::Uplink), Some(0));
    }

    #[test]
    fn usf_scan_and_occupy() {
        let mut pdch = Pdch::new(1);
        let ms = dummy_ms();
        pdch.occupy_usf(0, &ms);
        assert_eq!(pdch.first_free_usf(), Some(1));
    }
}
