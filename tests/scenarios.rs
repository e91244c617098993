//! End-to-end scenarios spanning multiple modules (spec §8), run against
//! the crate's public API the way a host process would drive it.

use gprs_rlcmac::alloc::{multislot, single_slot, Direction};
use gprs_rlcmac::bts::Bts;
use gprs_rlcmac::codec::ack_nack::{self, AckNackParams};
use gprs_rlcmac::coding_scheme::GprsCodingScheme;
use gprs_rlcmac::config::BtsConfig;
use gprs_rlcmac::error::CoreError;
use gprs_rlcmac::rlc::UlWindow;
use gprs_rlcmac::scheduler::{self, SchedulerPick};
use gprs_rlcmac::tbf::state::{TbfEvent, TbfState};
use gprs_rlcmac::tbf::{DlTbf, TbfHeader};

fn bts_with_mask(mask: u8) -> Bts {
    let mut bts = Bts::new(BtsConfig::default());
    bts.add_trx(877, 1);
    for i in 0..8u8 {
        bts.trx[0].pdch[i as usize].enabled = mask & (1 << i) != 0;
    }
    bts
}

/// S4: Algorithm A on a 2-PDCH mask spreads uplink allocations across both
/// PDCHs (7 usable USFs each, USF 0b111 reserved) for 14 total, the 15th
/// fails, and freeing one lets the allocator succeed again.
#[test]
fn scenario_s4_algorithm_a_exhausts_usf_then_recovers() {
    let mut bts = bts_with_mask(0x0C);
    let ms = bts.ms_registry.get_or_create(0x1000_0001, None, None);

    let mut grants = Vec::new();
    for _ in 0..14 {
        grants.push(single_slot::allocate(&mut bts, Direction::Uplink, &ms).unwrap());
    }
    assert!(matches!(
        single_slot::allocate(&mut bts, Direction::Uplink, &ms),
        Err(CoreError::NoResources)
    ));

    let freed = grants.pop().unwrap();
    let pdch = &mut bts.trx[0].pdch[freed.ts as usize];
    pdch.free_tfi(Direction::Uplink, freed.tfi);
    pdch.free_usf(freed.usf.unwrap());

    assert!(single_slot::allocate(&mut bts, Direction::Uplink, &ms).is_ok());
}

/// S5: allocating UL then DL (and the reverse order) for the same MS class
/// must agree on `first_common_ts`.
#[test]
fn scenario_s5_algorithm_b_agrees_on_first_common_ts_either_order() {
    let bts = bts_with_mask(0xE0); // ts 5,6,7

    let ul_first = multislot::slot_mask(&bts, Direction::Uplink, 10, None, false).unwrap();
    let dl_after = multislot::slot_mask(&bts, Direction::Downlink, 10, Some(ul_first), false).unwrap();
    assert_eq!(ul_first.first_common_ts, dl_after.first_common_ts);

    let dl_first = multislot::slot_mask(&bts, Direction::Downlink, 10, None, false).unwrap();
    let ul_after = multislot::slot_mask(&bts, Direction::Uplink, 10, Some(dl_first), false).unwrap();
    assert_eq!(dl_first.first_common_ts, ul_after.first_common_ts);
}

/// S2-style: an uplink TBF receiving BSN 0,1,2 then raising V(Q) emits a
/// Packet Uplink Ack/Nack reporting `ssn=3` and RBB's last three bits set.
#[test]
fn scenario_s2_ack_nack_reports_received_window() {
    let mut window = UlWindow::new(128, 64);
    window.receive_bsn(0).unwrap();
    window.receive_bsn(1).unwrap();
    window.receive_bsn(2).unwrap();
    window.raise_v_q();
    assert_eq!(window.ssn(), 3);

    let params = AckNackParams { tfi: 4, rrbp: 0, is_final: false, tlli: 0x1122_3344 };
    let mut buf = [0u8; 64];
    let len = ack_nack::write_gprs(&mut buf, &params, 1, &window).unwrap();
    let header = ack_nack::read_header(&buf[..len]).unwrap();
    assert_eq!(header.tfi, 4);
    assert!(!header.is_final);
}

/// Full downlink TBF lifecycle: allocate via Algorithm A, attach to an MS,
/// walk the state machine to RELEASING, then free the TFI and prune the MS
/// out of the registry once idle.
#[test]
fn downlink_tbf_lifecycle_from_allocation_to_idle_prune() {
    let mut bts = bts_with_mask(0x01);
    let ms = bts.ms_registry.get_or_create(0x2000_0002, None, None);

    let grant = single_slot::allocate(&mut bts, Direction::Downlink, &ms).unwrap();
    assert!(grant.usf.is_none());

    let mut header = TbfHeader::new(
        grant.tfi,
        0x2000_0002,
        grant.trx,
        1 << grant.ts,
        grant.ts,
        grant.ts,
        1,
        20,
        GprsCodingScheme::Cs1,
    )
    .unwrap();
    header.state = header.state.apply(TbfEvent::AllocSuccess).unwrap();
    assert_eq!(header.state, TbfState::Assign);

    let dl_tbf = DlTbf::new(header, 128, 64);
    ms.borrow_mut().attach_dl_tbf(dl_tbf).unwrap();

    {
        let mut ms_mut = ms.borrow_mut();
        let tbf = ms_mut.dl_tbf_mut().unwrap();
        tbf.header.state = tbf.header.state.apply(TbfEvent::AssignmentAcked).unwrap();
        tbf.window.increment_send().unwrap();
        let mut rbb = [false; 64];
        rbb[63] = true;
        tbf.window.update(1, &rbb);
        tbf.window.move_window();
        tbf.header.state = tbf.header.state.apply(TbfEvent::LastBlockAcked).unwrap();
        tbf.header.state = tbf.header.state.apply(TbfEvent::FinalAckAcked).unwrap();
        tbf.header.state = tbf.header.state.apply(TbfEvent::WaitReleaseTimerExpired).unwrap();
        assert!(tbf.header.state.is_terminal());
    }

    let released = ms.borrow_mut().detach_dl_tbf().unwrap();
    bts.trx[0].pdch[grant.ts as usize].free_tfi(Direction::Downlink, released.header.tfi);

    bts.ms_registry.prune_idle();
    assert_eq!(bts.ms_registry.len(), 0);
    assert!(bts.trx[0].pdch[grant.ts as usize].first_free_tfi(Direction::Downlink).is_some());
}

/// The scheduler picks a polled response ahead of a queued data block, and
/// a fresh data block only once no poll is owed, wiring `Bts`/`Pdch`
/// occupancy together with the TBF poll sub-state.
#[test]
fn scheduler_prioritizes_polled_response_over_queued_data() {
    let mut bts = bts_with_mask(0x01);
    let ms = bts.ms_registry.get_or_create(0x3000_0003, None, None);

    let mut header = TbfHeader::new(0, 0x3000_0003, 0, 0b1, 0, 0, 1, 10, GprsCodingScheme::Cs1).unwrap();
    header.state = TbfState::Flow;
    let mut dl_tbf = DlTbf::new(header, 128, 64);
    dl_tbf
        .llc_queue
        .push_back(gprs_rlcmac::llc::LlcFrame::new(vec![1, 2, 3]).unwrap());
    ms.borrow_mut().attach_dl_tbf(dl_tbf).unwrap();
    bts.trx[0].pdch[0].occupy_tfi(Direction::Downlink, 0, &ms);

    // No poll owed yet: the queued LLC data wins.
    let pick = scheduler::pick_for_rts(&bts, 0, 0, 50).unwrap();
    assert!(matches!(pick, SchedulerPick::DataBlock { resend: false, .. }));

    // Schedule a poll due at this exact FN and re-check: it now wins.
    ms.borrow_mut().dl_tbf_mut().unwrap().header.poll_state.schedule(50);
    let pick = scheduler::pick_for_rts(&bts, 0, 0, 50).unwrap();
    assert!(matches!(pick, SchedulerPick::PolledResponse { .. }));
}

/// An MS with no TBF attached and no guard produces an idle scheduler read
/// (no crash, no phantom pick) on every PDCH it does not occupy.
#[test]
fn idle_bts_has_nothing_to_schedule() {
    let bts = bts_with_mask(0xFF);
    for ts in 0..8u8 {
        assert_eq!(scheduler::pick_for_rts(&bts, 0, ts, 0).unwrap(), SchedulerPick::Idle);
    }
}
