//! MS registry (spec §4.F): maps a TLLI (and provisional TLLIs staged during
//! a TLLI change) to a `GprsMs` entity that owns at most one uplink and one
//! downlink TBF.
//!
//! Grounded in `original_source/src/gprs_ms.h`'s `GprsMs::tlli()` /
//! `check_tlli()` (SPEC_FULL §11.4) for the TLLI-matching semantics, and in
//! spec §4.F / §9 for the `Guard` reference-counting scheme: the MS is owned
//! by the registry, TBFs are owned by the MS, and every other pointer into
//! this graph (PDCH slot tables, in-flight lookups) is non-owning. A plain
//! `Rc<RefCell<_>>` plus an explicit guard count is the idiomatic way to
//! express that ownership DAG in safe, single-threaded Rust (spec §5: no
//! shared-memory concurrency to protect against).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{CoreError, CoreResult};
use crate::tbf::state::TbfState;
use crate::tbf::{DlTbf, UlTbf};

pub struct GprsMs {
    tlli: u32,
    new_ul_tlli: Option<u32>,
    new_dl_tlli: Option<u32>,
    imsi: Option<String>,
    ul_tbf: Option<UlTbf>,
    dl_tbf: Option<DlTbf>,
    guards: Cell<u32>,
}

impl GprsMs {
    fn new(tlli: u32, imsi: Option<String>) -> Self {
        GprsMs {
            tlli,
            new_ul_tlli: None,
            new_dl_tlli: None,
            imsi,
            ul_tbf: None,
            dl_tbf: None,
            guards: Cell::new(0),
        }
    }

    /// The "current" TLLI: the staged `new_ul_tlli` if present, else the
    /// confirmed `tlli` (`GprsMs::tlli()`, SPEC_FULL §11.4).
    pub fn tlli(&self) -> u32 {
        self.new_ul_tlli.unwrap_or(self.tlli)
    }

    pub fn imsi(&self) -> Option<&str> {
        self.imsi.as_deref()
    }

    /// Matches any of `{tlli, new_ul_tlli, new_dl_tlli}`; `0` never
    /// matches, since it denotes "no TLLI assigned yet" rather than a wire
    /// value (`GprsMs::check_tlli`, SPEC_FULL §11.4).
    pub fn check_tlli(&self, x: u32) -> bool {
        if x == 0 {
            return false;
        }
        x == self.tlli || Some(x) == self.new_ul_tlli || Some(x) == self.new_dl_tlli
    }

    pub fn stage_new_ul_tlli(&mut self, tlli: u32) {
        self.new_ul_tlli = Some(tlli);
    }

    pub fn stage_new_dl_tlli(&mut self, tlli: u32) {
        self.new_dl_tlli = Some(tlli);
    }

    pub fn ul_tbf(&self) -> Option<&UlTbf> {
        self.ul_tbf.as_ref()
    }

    pub fn dl_tbf(&self) -> Option<&DlTbf> {
        self.dl_tbf.as_ref()
    }

    pub fn ul_tbf_mut(&mut self) -> Option<&mut UlTbf> {
        self.ul_tbf.as_mut()
    }

    pub fn dl_tbf_mut(&mut self) -> Option<&mut DlTbf> {
        self.dl_tbf.as_mut()
    }

    /// Fails with `Busy` if a different, still-live uplink TBF already
    /// occupies the slot (spec §4.F).
    pub fn attach_ul_tbf(&mut self, tbf: UlTbf) -> CoreResult<()> {
        if let Some(existing) = &self.ul_tbf {
            if existing.header.state != TbfState::Releasing {
                return Err(CoreError::Busy("MS already has an active uplink TBF"));
            }
        }
        self.ul_tbf = Some(tbf);
        Ok(())
    }

    pub fn attach_dl_tbf(&mut self, tbf: DlTbf) -> CoreResult<()> {
        if let Some(existing) = &self.dl_tbf {
            if existing.header.state != TbfState::Releasing {
                return Err(CoreError::Busy("MS already has an active downlink TBF"));
            }
        }
        self.dl_tbf = Some(tbf);
        Ok(())
    }

    pub fn detach_ul_tbf(&mut self) -> Option<UlTbf> {
        self.ul_tbf.take()
    }

    pub fn detach_dl_tbf(&mut self) -> Option<DlTbf> {
        self.dl_tbf.take()
    }

    /// An MS with no TBFs and no outstanding guards is eligible for
    /// destruction (spec §4.F).
    pub fn is_idle(&self) -> bool {
        self.ul_tbf.is_none() && self.dl_tbf.is_none() && self.guards.get() == 0
    }

    fn add_guard(&self) {
        self.guards.set(self.guards.get() + 1);
    }

    fn remove_guard(&self) {
        self.guards.set(self.guards.get().saturating_sub(1));
    }
}

/// A scoped reference increment on a `GprsMs`: any lookup result crossing a
/// suspension point must be held behind a `Guard` so the registry cannot
/// prune the MS out from under an in-flight handler (spec §4.F, §5).
pub struct Guard {
    ms: Rc<RefCell<GprsMs>>,
}

impl Guard {
    fn new(ms: Rc<RefCell<GprsMs>>) -> Self {
        ms.borrow().add_guard();
        Guard { ms }
    }

    pub fn ms(&self) -> &Rc<RefCell<GprsMs>> {
        &self.ms
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        self.ms.borrow().remove_guard();
    }
}

/// The MS registry (spec §4.F): a linear scan over a small live set,
/// matching on `check_tlli`. IMSI matching is recognized but unimplemented
/// upstream (`gprs_ms.h` carries a `// TODO` for it) and is mirrored here as
/// an explicit `Unsupported` rather than silently ignored.
#[derive(Default)]
pub struct MsRegistry {
    entries: Vec<Rc<RefCell<GprsMs>>>,
}

impl MsRegistry {
    pub fn new() -> Self {
        MsRegistry { entries: Vec::new() }
    }

    fn find(&self, tlli: u32, old_tlli: Option<u32>) -> Option<Rc<RefCell<GprsMs>>> {
        self.entries.iter().find(|ms| {
            let ms = ms.borrow();
            ms.check_tlli(tlli) || old_tlli.map(|t| ms.check_tlli(t)).unwrap_or(false)
        }).cloned()
    }

    pub fn get_or_create(&mut self, tlli: u32, old_tlli: Option<u32>, imsi: Option<String>) -> Rc<RefCell<GprsMs>> {
        if let Some(ms) = self.find(tlli, old_tlli) {
            return ms;
        }
        let ms = Rc::new(RefCell::new(GprsMs::new(tlli, imsi)));
        self.entries.push(ms.clone());
        ms
    }

    pub fn find_by_imsi(&self, _imsi: &str) -> CoreResult<Option<Rc<RefCell<GprsMs>>>> {
        Err(CoreError::Unsupported("MS lookup by IMSI"))
    }

    pub fn guard(&self, ms: &Rc<RefCell<GprsMs>>) -> Guard {
        Guard::new(ms.clone())
    }

    /// Removes every idle MS (no TBFs, no outstanding guards) from the live
    /// set. Call after any `detach_tbf`/guard-drop that might make an MS
    /// eligible for destruction.
    pub fn prune_idle(&mut self) {
        self.entries.retain(|ms| !ms.borrow().is_idle());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
