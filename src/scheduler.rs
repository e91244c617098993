//! Frame scheduler glue (spec §4.H): on every RTS for a (TRX, TS, FN), picks
//! one pending message or data block with strict priority order.
//!
//! No standalone scheduler source file was retrieved from
//! `original_source/` (the real PCU interleaves this logic into
//! `gprs_rlcmac_pdch::rcv_block`/`alloc_algorithm_a`'s callers); transcribed
//! directly from spec §4.H's three-tier priority description.

use crate::bts::Bts;
use crate::error::{CoreError, CoreResult};
use crate::pdch::Direction;
use crate::tbf::state::{PollState, TbfState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPick {
    /// A TBF's `poll_fn` matches this RTS's frame number and owes a polled
    /// response (priority 1).
    PolledResponse { tlli: u32 },
    /// A TBF is still in ASSIGN and owes its assignment message (priority
    /// 2).
    ControlMessage { tlli: u32 },
    /// One RLC data block selected from a downlink TBF's send window,
    /// resend slots taking priority over fresh BSNs (priority 3).
    DataBlock { tlli: u32, bsn: u16, resend: bool },
    /// Nothing is owed on this PDCH at this FN.
    Idle,
}

pub fn pick_for_rts(bts: &Bts, trx: u8, ts: u8, fn_: u32) -> CoreResult<SchedulerPick> {
    let trx_ref = bts
        .trx
        .get(trx as usize)
        .ok_or(CoreError::Malformed("RTS for an unknown TRX index"))?;
    let pdch = trx_ref
        .pdch
        .get(ts as usize)
        .ok_or(CoreError::Malformed("RTS for an unknown timeslot index"))?;

    for ms in pdch.occupants(Direction::Uplink).chain(pdch.occupants(Direction::Downlink)) {
        let ms_ref = ms.borrow();
        let owed = |poll: PollState| matches!(poll, PollState::Sched { poll_fn } if poll_fn == fn_);
        let owes = ms_ref.ul_tbf().map(|t| owed(t.header.poll_state)).unwrap_or(false)
            || ms_ref.dl_tbf().map(|t| owed(t.header.poll_state)).unwrap_or(false);
        if owes {
            return Ok(SchedulerPick::PolledResponse { tlli: ms_ref.tlli() });
        }
    }

    for ms in pdch.occupants(Direction::Uplink).chain(pdch.occupants(Direction::Downlink)) {
        let ms_ref = ms.borrow();
        let pending = ms_ref.ul_tbf().map(|t| t.header.state == TbfState::Assign).unwrap_or(false)
            || ms_ref.dl_tbf().map(|t| t.header.state == TbfState::Assign).unwrap_or(false);
        if pending {
            return Ok(SchedulerPick::ControlMessage { tlli: ms_ref.tlli() });
        }
    }

    for ms in pdch.occupants(Direction::Downlink) {
        let mut ms_mut = ms.borrow_mut();
        let tlli = ms_mut.tlli();
        if let Some(dl) = ms_mut.dl_tbf_mut() {
            if dl.header.state != TbfState::Flow {
                continue;
            }
            if let Some(bsn) = dl.window.resend_needed() {
                return Ok(SchedulerPick::DataBlock { tlli, bsn, resend: true });
            }
            if !dl.llc_queue.is_empty() && !dl.window.window_stalled() {
                let bsn = dl.window.increment_send()?;
                return Ok(SchedulerPick::DataBlock { tlli, bsn, resend: false });
            }
        }
    }

    Ok(SchedulerPick::Idle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding_scheme::GprsCodingScheme;
    use crate::config::BtsConfig;
    use crate::llc::LlcFrame;
    use crate::ms::MsRegistry;
    use crate::pdch::Direction as Dir;
    use crate::tbf::{DlTbf, TbfHeader};

    fn bts_with_one_enabled_pdch() -> Bts {
        let mut bts = Bts::new(BtsConfig::default());
        bts.add_trx(800, 1);
        bts.trx[0].pdch[0].enabled = true;
        bts
    }

    #[test]
    fn idle_pdch_reports_idle() {
        let bts = bts_with_one_enabled_pdch();
        assert_eq!(pick_for_rts(&bts, 0, 0, 100).unwrap(), SchedulerPick::Idle);
    }

    #[test]
    fn polled_response_wins_over_pending_control_and_data() {
        let mut bts = bts_with_one_enabled_pdch();
        let owner = bts.ms_registry.get_or_create(0xaaaa, None, None);
        let mut header = TbfHeader::new(0, 0xaaaa, 0, 0b1, 0, 0, 1, 0, GprsCodingScheme::Cs1).unwrap();
        header.state = TbfState::Flow;
        header.poll_state.schedule(100);
        let dl_tbf = DlTbf::new(header, 128, 64);
        owner.borrow_mut().attach_dl_tbf(dl_tbf).unwrap();
        bts.trx[0].pdch[0].occupy_tfi(Dir::Downlink, 0, &owner);

        let pick = pick_for_rts(&bts, 0, 0, 100).unwrap();
        assert_eq!(pick, SchedulerPick::PolledResponse { tlli: 0xaaaa });
    }

    #[test]
    fn data_block_is_picked_when_flow_and_llc_queued() {
        let mut bts = bts_with_one_enabled_pdch();
        let owner = bts.ms_registry.get_or_create(0xbbbb, None, None);
        let mut header = TbfHeader::new(1, 0xbbbb, 0, 0b1, 0, 0, 1, 0, GprsCodingScheme::Cs1).unwrap();
        header.state = TbfState::Flow;
        let mut dl_tbf = DlTbf::new(header, 128, 64);
        dl_tbf.llc_queue.push_back(LlcFrame::new(vec![1, 2, 3]).unwrap());
        owner.borrow_mut().attach_dl_tbf(dl_tbf).unwrap();
        bts.trx[0].pdch[0].occupy_tfi(Dir::Downlink, 1, &owner);

        let pick = pick_for_rts(&bts, 0, 0, 5).unwrap();
        assert_eq!(pick, SchedulerPick::DataBlock { tlli: 0xbbbb, bsn: 0, resend: false });
    }

    #[test]
    fn resend_slot_wins_over_fresh_bsn() {
        let mut bts = bts_with_one_enabled_pdch();
        let owner = bts.ms_registry.get_or_create(0xcccc, None, None);
        let mut header = TbfHeader::new(2, 0xcccc, 0, 0b1, 0, 0, 1, 0, GprsCodingScheme::Cs1).unwrap();
        header.state = TbfState::Flow;
        let mut dl_tbf = DlTbf::new(header, 128, 64);
        dl_tbf.window.increment_send().unwrap();
        dl_tbf.window.mark_for_resend();
        dl_tbf.llc_queue.push_back(LlcFrame::new(vec![9]).unwrap());
        owner.borrow_mut().attach_dl_tbf(dl_tbf).unwrap();
        bts.trx[0].pdch[0].occupy_tfi(Dir::Downlink, 2, &owner);

        let pick = pick_for_rts(&bts, 0, 0, 5).unwrap();
        assert_eq!(pick, SchedulerPick::DataBlock { tlli: 0xcccc, bsn: 0, resend: true });
    }

    #[test]
    fn unknown_trx_index_is_malformed() {
        let bts = bts_with_one_enabled_pdch();
        assert!(pick_for_rts(&bts, 5, 0, 0).is_err());
    }
}
