//! The BTS: up to eight TRXs, the coding-scheme configuration, and the MS
//! registry (spec §3, §9).
//!
//! Spec §9: "Global BTS singleton maps to an explicitly constructed `Bts`
//! value threaded through every operation. Tests must be able to
//! instantiate multiple independent BTSes in the same process." —
//! `Bts::new` is therefore the sole construction path and carries no
//! process-global state (SPEC_FULL §10.3).

use crate::config::BtsConfig;
use crate::ms::MsRegistry;
use crate::trx::Trx;

pub const MAX_TRX: usize = 8;

pub struct Bts {
    pub config: BtsConfig,
    pub trx: Vec<Trx>,
    pub ms_registry: MsRegistry,
}

impl Bts {
    pub fn new(config: BtsConfig) -> Self {
        Bts {
            config,
            trx: Vec::new(),
            ms_registry: MsRegistry::new(),
        }
    }

    /// Adds a TRX, up to `MAX_TRX`. Fails silently past the limit by
    /// returning `false` rather than panicking; the caller (VTY / startup
    /// config, out of scope per spec §1) is responsible for validating
    /// topology ahead of time.
    pub fn add_trx(&mut self, arfcn: u16, tsc: u8) -> bool {
        if self.trx.len() >= MAX_TRX {
            return false;
        }
        self.trx.push(Trx::new(arfcn, tsc));
        true
    }
}
