//! TBF lifecycle objects (spec §3, §4.E).
//!
//! `Tbf = UlTbf | DlTbf` is modeled as a tagged enum wrapping a shared
//! `TbfHeader`, the Rust rendering of `gprs_rlcmac.h`'s `gprs_rlcmac_tbf`
//! base struct plus its `ul`/`dl` union members (spec §9: "Inheritance of
//! `Tbf -> {UlTbf, DlTbf}` maps to a tagged variant with a shared header
//! struct embedded in each variant").

pub mod state;

use std::collections::{HashMap, VecDeque};

use crate::coding_scheme::GprsCodingScheme;
use crate::error::{CoreError, CoreResult};
use crate::llc::LlcFrame;
use crate::rlc::{DlWindow, UlWindow};
use state::{PollState, TbfState};

/// Fields shared by both directions: identity, scheduling placement, and
/// lifecycle state.
#[derive(Debug, Clone)]
pub struct TbfHeader {
    pub tfi: u8,
    pub tlli: u32,
    pub state: TbfState,
    pub poll_state: PollState,
    pub trx: u8,
    /// Bitmask over timeslots 0..7 this TBF occupies.
    pub pdch_mask: u8,
    pub control_ts: u8,
    pub first_common_ts: u8,
    pub tsc: u8,
    pub ta: u8,
    pub current_cs: GprsCodingScheme,
}

impl TbfHeader {
    pub fn new(
        tfi: u8,
        tlli: u32,
        trx: u8,
        pdch_mask: u8,
        control_ts: u8,
        first_common_ts: u8,
        tsc: u8,
        ta: u8,
        current_cs: GprsCodingScheme,
    ) -> CoreResult<Self> {
        if tfi > 31 {
            return Err(CoreError::Malformed("TFI out of range"));
        }
        Ok(TbfHeader {
            tfi,
            tlli,
            state: TbfState::Null,
            poll_state: PollState::None,
            trx,
            pdch_mask,
            control_ts,
            first_common_ts,
            tsc,
            ta,
            current_cs,
        })
    }

    pub fn occupies(&self, ts: u8) -> bool {
        ts < 8 && (self.pdch_mask & (1 << ts)) != 0
    }
}

/// Downlink-specific state: the send/ack window, the queue of LLC frames
/// not yet fully segmented, and per-BSN packed-block history kept for
/// retransmit (spec §4.H: "Store the packed block in per-BSN history for
/// future retransmit").
pub struct DlTbf {
    pub header: TbfHeader,
    pub window: DlWindow,
    pub llc_queue: VecDeque<LlcFrame>,
    pub block_history: HashMap<u16, Vec<u8>>,
}

impl DlTbf {
    pub fn new(header: TbfHeader, sns: u16, ws: u16) -> Self {
        DlTbf {
            header,
            window: DlWindow::new(sns, ws),
            llc_queue: VecDeque::new(),
            block_history: HashMap::new(),
        }
    }

    /// Resets the direction-specific union members together on
    /// WAIT_RELEASE -> FLOW reuse (SPEC_FULL §11.5); the TFI/PDCH
    /// attachment in `header` survives the reuse.
    pub fn reset_for_reuse(&mut self, sns: u16, ws: u16) {
        self.window = DlWindow::new(sns, ws);
        self.llc_queue.clear();
        self.block_history.clear();
        self.header.state = TbfState::Flow;
        self.header.poll_state = PollState::None;
    }
}

/// Uplink-specific state: the receive window, per-timeslot granted USF, and
/// the contention-resolution TLLI captured from the first uplink block.
pub struct UlTbf {
    pub header: TbfHeader,
    pub window: UlWindow,
    pub usf: [Option<u8>; 8],
    pub contention_resolution_tlli: Option<u32>,
}

impl UlTbf {
    pub fn new(header: TbfHeader, sns: u16, ws: u16) -> Self {
        UlTbf {
            header,
            window: UlWindow::new(sns, ws),
            usf: [None; 8],
            contention_resolution_tlli: None,
        }
    }

    pub fn reset_for_reuse(&mut self, sns: u16, ws: u16) {
        self.window = UlWindow::new(sns, ws);
        self.usf = [None; 8];
        self.contention_resolution_tlli = None;
        self.header.state = TbfState::Flow;
        self.header.poll_state = PollState::None;
    }
}

pub enum Tbf {
    Ul(UlTbf),
    Dl(DlTbf),
}

impl Tbf {
    pub fn header(&self) -> &TbfHeader {
        match self {
            Tbf::Ul(t) => &t.header,
            Tbf::Dl(t) => &t.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut TbfHeader {
        match self {
            Tbf::Ul(t) => &mut t.header,
            Tbf::Dl(t) => &mut t.header,
        }
    }
}
