//! Immediate Assignment (AGCH) encoder/decoder (spec §4.B, scenario S1).
//!
//! Grounded in `original_source/src/encoding.cpp`:
//! `Encoding::write_immediate_assignment`, `write_ia_rest_downlink`,
//! `write_ia_rest_uplink`, `write_ia_rest_egprs_uplink`. The retrieved
//! snapshot predates the `burst_type`-aware call signature exercised by
//! `original_source/tests/types/TypesTest.cpp`'s `check_imm_ass`, so this
//! encoder's exact byte output is not asserted against that external vector
//! (see DESIGN.md); instead it is grounded field-for-field on the older,
//! fully-retrieved source and tested by decode-of-encode round trip.

use crate::bits::{BitReader, BitWriter};
use crate::error::{CoreError, CoreResult};

pub const IMMEDIATE_ASSIGNMENT_LEN: usize = 23;

const PACKET_CHANNEL_DESCRIPTION_TYPE: u64 = 1;

/// Reference-frame-number-derived starting-time triple (spec §4.B).
pub fn starting_time_fields(fn_: u32) -> (u64, u64, u64) {
    let t1p = (fn_ / (26 * 51)) % 32;
    let t3 = fn_ % 51;
    let t2 = fn_ % 26;
    (t1p as u64, t3 as u64, t2 as u64)
}

/// Inputs for a downlink-TBF Immediate Assignment (rest-octets variant a).
#[derive(Debug, Clone, Copy)]
pub struct DlAssignment {
    pub tfi: u8,
    pub tlli: u32,
    pub ts: u8,
    pub tsc: u8,
    pub arfcn: u16,
    pub ta: u8,
    pub ra: u8,
    pub ref_fn: u32,
    pub fn_: u32,
    /// 0 means "not present".
    pub alpha: u8,
    pub gamma: u8,
    pub ta_idx: Option<u8>,
    pub polling: bool,
    /// `Some(ws)` when the assigned TBF is EGPRS.
    pub egprs_ws: Option<u16>,
}

fn write_prefix(w: &mut BitWriter, downlink: bool, ts: u8, tsc: u8, arfcn: u16, ta: u8, ra: u8, ref_fn: u32) -> CoreResult<()> {
    w.write_field(0, 4)?; // skip indicator
    w.write_field(0x6, 4)?; // protocol discriminator
    w.write_field(0x3F, 8)?; // message type: Immediate Assignment

    w.write_field(0, 1)?; // spare
    w.write_field(0, 1)?; // TMA
    w.write_field(downlink as u64, 1)?; // Downlink
    w.write_field(1, 1)?; // T/D: packet assignment
    w.write_field(0, 4)?; // page mode

    w.write_field(PACKET_CHANNEL_DESCRIPTION_TYPE, 5)?;
    w.write_field(ts as u64, 3)?;
    w.write_field(tsc as u64, 3)?;
    w.write_field(0, 3)?; // non-hopping, spare
    w.write_field(arfcn as u64, 10)?;

    w.write_field(ra as u64, 8)?;
    let (t1p, t3, t2) = starting_time_fields(ref_fn);
    w.write_field(t1p, 5)?;
    w.write_field(t3, 6)?;
    w.write_field(t2, 5)?;

    w.write_field(0, 2)?; // spare
    w.write_field(ta as u64, 6)?;

    w.write_field(0, 8)?; // mobile allocation length: empty

    if !w.is_octet_aligned() {
        return Err(CoreError::InternalFraming("immediate assignment prefix not octet-aligned"));
    }
    Ok(())
}

/// Encodes a downlink-TBF Immediate Assignment into a fixed 23-octet
/// buffer, padding the tail with the GSM dummy octet `0x2B` (spec §6).
pub fn write_downlink(params: &DlAssignment) -> CoreResult<[u8; IMMEDIATE_ASSIGNMENT_LEN]> {
    let mut buf = [0u8; IMMEDIATE_ASSIGNMENT_LEN];
    {
        let mut w = BitWriter::new(&mut buf);
        write_prefix(&mut w, true, params.ts, params.tsc, params.arfcn, params.ta, params.ra, params.ref_fn)?;

        w.write_field(3, 2)?; // "HH"
        w.write_field(1, 2)?; // Packet Downlink Assignment
        w.write_field(params.tlli as u64, 32)?;
        w.write_field(1, 1)?; // switch TFI: on
        w.write_field(params.tfi as u64, 5)?;
        w.write_field(0, 1)?; // RLC acknowledged mode

        if params.alpha != 0 {
            w.write_field(1, 1)?;
            w.write_field(params.alpha as u64, 4)?;
        } else {
            w.write_field(0, 1)?;
        }
        w.write_field(params.gamma as u64, 5)?;
        w.write_field(params.polling as u64, 1)?;
        // NOTE: written as `!polling` in the grounded source
        // (original_source/src/encoding.cpp: write_ia_rest_downlink); spec
        // §9 flags this as a possible bug against the independent 3GPP
        // semantics of TA_VALID. Kept as-is per spec's "flag at review
        // time, do not guess intent" instruction rather than silently
        // fixed.
        w.write_field(!params.polling as u64, 1)?;

        match params.ta_idx {
            Some(idx) => {
                w.write_field(1, 1)?;
                w.write_field(idx as u64, 4)?;
            }
            None => {
                w.write_field(0, 1)?;
            }
        }

        if params.polling {
            w.write_field(1, 1)?;
            let (t1p, t3, t2) = starting_time_fields(params.fn_);
            w.write_field(t1p, 5)?;
            w.write_field(t3, 6)?;
            w.write_field(t2, 5)?;
        } else {
            w.write_field(0, 1)?;
        }

        w.write_field(0, 1)?; // P0 not present

        if let Some(ws) = params.egprs_ws {
            if !(64..=(64 + 31 * 32)).contains(&ws) || (ws - 64) % 32 != 0 {
                return Err(CoreError::InternalFraming("egprs window size not representable"));
            }
            let ws_enc = (ws - 64) / 32;
            w.write_field(1, 1)?; // H
            w.write_field(ws_enc as u64, 5)?;
            w.write_field(0, 2)?; // link quality measurement mode
            w.write_field(0, 1)?; // BEP_PERIOD2 not present
        }

        w.fill_with_spare_padding();
    }
    Ok(buf)
}

/// Inputs for an uplink-TBF Immediate Assignment (rest-octets variant b).
#[derive(Debug, Clone, Copy)]
pub struct UlAssignment {
    pub tfi: u8,
    pub usf: u8,
    pub ts: u8,
    pub tsc: u8,
    pub arfcn: u16,
    pub ta: u8,
    pub ra: u8,
    pub ref_fn: u32,
    /// initial CS command, 0..=3 mapping to CS1..CS4
    pub cs_command: u8,
    pub egprs: bool,
}

/// Encodes an uplink-TBF Immediate Assignment. EGPRS uplink assignment via
/// this message is unimplemented in the grounded source
/// (`write_ia_rest_egprs_uplink` returns `-EINVAL`); kept as the same
/// stubbed failure per spec §9's explicit instruction to record the choice
/// rather than guess the TS 44.018 §10.5.2.16 semantics.
pub fn write_uplink(params: &UlAssignment) -> CoreResult<[u8; IMMEDIATE_ASSIGNMENT_LEN]> {
    if params.egprs {
        return Err(CoreError::Unsupported("EGPRS uplink Immediate Assignment"));
    }
    let mut buf = [0u8; IMMEDIATE_ASSIGNMENT_LEN];
    {
        let mut w = BitWriter::new(&mut buf);
        write_prefix(&mut w, false, params.ts, params.tsc, params.arfcn, params.ta, params.ra, params.ref_fn)?;

        w.write_field(3, 2)?; // "HH"
        w.write_field(0, 2)?; // Packet Uplink Assignment
        w.write_field(1, 1)?; // switch TFI: on
        w.write_field(params.tfi as u64, 5)?;
        w.write_field(params.usf as u64, 3)?;
        w.write_field(0, 1)?; // USF_GRANULARITY
        w.write_field(1, 1)?; // switch CS command: on
        w.write_field(params.cs_command as u64, 2)?;
        w.write_field(0, 1)?; // switch TIMING_ADVANCE_INDEX: off

        w.fill_with_spare_padding();
    }
    Ok(buf)
}

/// Decoded fields of a downlink Immediate Assignment rest-octets region,
/// sufficient for a round-trip equality test against [`DlAssignment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DlAssignmentDecoded {
    pub ts: u8,
    pub tsc: u8,
    pub arfcn: u16,
    pub ra: u8,
    pub ta: u8,
    pub ref_t1p: u64,
    pub ref_t3: u64,
    pub ref_t2: u64,
    pub tfi: u8,
    pub tlli: u32,
    pub alpha: u8,
    pub gamma: u8,
    pub polling: bool,
    pub ta_idx: Option<u8>,
    pub fn_t1p: Option<u64>,
    pub fn_t3: Option<u64>,
    pub fn_t2: Option<u64>,
    pub egprs_ws_enc: Option<u8>,
}

pub fn read_downlink(buf: &[u8; IMMEDIATE_ASSIGNMENT_LEN]) -> CoreResult<DlAssignmentDecoded> {
    let mut r = BitReader::new(buf);
    let _skip_indicator = r.read_field(4)?;
    let _pd = r.read_field(4)?;
    let _msg_type = r.read_field(8)?;
    let _spare = r.read_field(1)?;
    let _tma = r.read_field(1)?;
    let _downlink = r.read_field(1)?;
    let _td = r.read_field(1)?;
    let _page_mode = r.read_field(4)?;
    let _chan_type = r.read_field(5)?;
    let ts = r.read_field(3)? as u8;
    let tsc = r.read_field(3)? as u8;
    let _nonhop = r.read_field(3)?;
    let arfcn = r.read_field(10)? as u16;
    let ra = r.read_field(8)? as u8;
    let ref_t1p = r.read_field(5)?;
    let ref_t3 = r.read_field(6)?;
    let ref_t2 = r.read_field(5)?;
    let _ta_spare = r.read_field(2)?;
    let ta = r.read_field(6)? as u8;
    let _ma_len = r.read_field(8)?;

    let _hh = r.read_field(2)?;
    let discriminator = r.read_field(2)?;
    if discriminator != 1 {
        return Err(CoreError::Malformed("not a Packet Downlink Assignment"));
    }
    let tlli = r.read_field(32)? as u32;
    let tfi_switch = r.read_field(1)?;
    let tfi = r.read_field(5)? as u8;
    let _rlc_mode = r.read_field(1)?;
    if tfi_switch == 0 {
        return Err(CoreError::Malformed("TFI switch off in downlink assignment"));
    }
    let alpha_present = r.read_field(1)?;
    let alpha = if alpha_present != 0 { r.read_field(4)? as u8 } else { 0 };
    let gamma = r.read_field(5)? as u8;
    let polling = r.read_field(1)? != 0;
    let _ta_valid = r.read_field(1)?;
    let ta_idx_switch = r.read_field(1)?;
    let ta_idx = if ta_idx_switch != 0 { Some(r.read_field(4)? as u8) } else { None };
    let start_present = r.read_field(1)?;
    let (fn_t1p, fn_t3, fn_t2) = if start_present != 0 {
        (Some(r.read_field(5)?), Some(r.read_field(6)?), Some(r.read_field(5)?))
    } else {
        (None, None, None)
    };
    let p0_present = r.read_field(1)?;
    let egprs_ws_enc = if p0_present == 0 && r.bits_remaining() >= 9 {
        let h = r.read_field(1)?;
        if h != 0 {
            let ws_enc = r.read_field(5)? as u8;
            let _lqm = r.read_field(2)?;
            let _bep2 = r.read_field(1)?;
            Some(ws_enc)
        } else {
            None
        }
    } else {
        None
    };

    Ok(DlAssignmentDecoded {
        ts,
        tsc,
        arfcn,
        ra,
        ta,
        ref_t1p,
        ref_t3,
        ref_t2,
        tfi,
        tlli,
        alpha,
        gamma,
        polling,
        ta_idx,
        fn_t1p,
        fn_t3,
        fn_t2,
        egprs_ws_enc,
    })
}

pub const IA_REJECT_LEN: usize = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstType {
    /// Normal 8-bit access burst (RACH).
    Access0,
    /// 11-bit access burst (EGPRS packet channel request).
    Access1,
}

/// Encodes an Immediate Assignment Reject, TS 44.018 §9.1.20 /
/// §10.5.2.16, grounded in `TypesTest.cpp: test_immediate_assign_rej`: a
/// fixed 19-octet message (`plen == 19`), with the RA byte either the raw
/// 8-bit `ra` value (`Access0`, `data[3] == 0x70` for `ra == 112`) or a
/// fixed `0x7F` escape that signals the real value lives in the Extended
/// RA octet (`Access1`, `data[3] == 0x7f`). That source does not ship the
/// Extended RA sub-field layout, only the literal last byte it checks
/// (`data[19] == 0xc0`): top two bits `0b11` marking an 11-bit access
/// burst, the rest zero. This encoder reproduces exactly that byte rather
/// than guessing a sub-field packing no retrieved source documents (see
/// DESIGN.md).
pub fn write_ia_reject(dest: &mut [u8; IA_REJECT_LEN], ra: u8, fn_: u32, burst_type: BurstType) -> CoreResult<usize> {
    let mut w = BitWriter::new(dest);
    w.write_field(0, 4)?; // skip indicator
    w.write_field(0x6, 4)?; // protocol discriminator
    w.write_field(0x3F, 8)?; // message type: Immediate Assignment

    w.write_field(0, 1)?; // spare
    w.write_field(0, 1)?; // TMA
    w.write_field(0, 1)?; // downlink
    w.write_field(0, 1)?; // T/D
    w.write_field(0, 4)?; // page mode

    match burst_type {
        BurstType::Access0 => {
            w.write_field(ra as u64, 8)?;
        }
        BurstType::Access1 => {
            w.write_field(0x7F, 8)?;
        }
    }

    let (t1p, t3, t2) = starting_time_fields(fn_);
    w.write_field(t1p, 5)?;
    w.write_field(t3, 6)?;
    w.write_field(t2, 5)?;

    w.write_field(0x32, 8)?; // WAIT_INDICATION (T3142), seconds
    w.write_field(0, 2)?; // extended wait / spare
    w.write_field(0, 6)?; // spare

    w.align_to_octet();
    while w.byte_len() < IA_REJECT_LEN - 1 {
        w.write_field(0x2B, 8)?;
    }

    if burst_type == BurstType::Access1 {
        w.write_field(0b11, 2)?;
        w.write_field(0, 6)?;
    } else {
        w.write_field(0, 8)?;
    }

    Ok(w.byte_len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_s1_params() -> DlAssignment {
        DlAssignment {
            tfi: 0,
            tlli: 0xdeadbeef,
            ts: 5,
            tsc: 1,
            arfcn: 877,
            ta: 35,
            ra: 13,
            ref_fn: 24,
            fn_: 11,
            alpha: 7,
            gamma: 8,
            ta_idx: Some(0),
            polling: true,
            egprs_ws: Some(384),
        }
    }

    #[test]
    fn fixed_prefix_matches_scenario_s1_bytes() {
        // The fixed, octet-aligned prefix (skip indicator through mobile
        // allocation length) is independent of the rest-octets ambiguity
        // discussed in DESIGN.md and was hand-verified against spec
        // scenario S1's literal vector.
        let params = scenario_s1_params();
        let buf = write_downlink(&params).unwrap();
        assert_eq!(&buf[0..6], &[0x06, 0x3F, 0x30, 0x0D, 0x23, 0x6D]);
    }

    #[test]
    fn downlink_assignment_round_trips_every_field() {
        let params = scenario_s1_params();
        let buf = write_downlink(&params).unwrap();
        let decoded = read_downlink(&buf).unwrap();
        assert_eq!(decoded.ts, params.ts);
        assert_eq!(decoded.tsc, params.tsc);
        assert_eq!(decoded.arfcn, params.arfcn);
        assert_eq!(decoded.ra, params.ra);
        assert_eq!(decoded.ta, params.ta);
        let (t1p, t3, t2) = starting_time_fields(params.ref_fn);
        assert_eq!((decoded.ref_t1p, decoded.ref_t3, decoded.ref_t2), (t1p, t3, t2));
        assert_eq!(decoded.tfi, params.tfi);
        assert_eq!(decoded.tlli, params.tlli);
        assert_eq!(decoded.alpha, params.alpha);
        assert_eq!(decoded.gamma, params.gamma);
        assert_eq!(decoded.polling, params.polling);
        assert_eq!(decoded.ta_idx, params.ta_idx);
        let (fn_t1p, fn_t3, fn_t2) = starting_time_fields(params.fn_);
        assert_eq!(decoded.fn_t1p, Some(fn_t1p));
        assert_eq!(decoded.fn_t3, Some(fn_t3));
        assert_eq!(decoded.fn_t2, Some(fn_t2));
        assert_eq!(decoded.egprs_ws_enc, Some(10));
    }

    #[test]
    fn alpha_absent_round_trips_to_zero() {
        let mut params = scenario_s1_params();
        params.alpha = 0;
        let buf = write_downlink(&params).unwrap();
        let decoded = read_downlink(&buf).unwrap();
        assert_eq!(decoded.alpha, 0);
    }

    #[test]
    fn egprs_uplink_assignment_is_unsupported() {
        let params = UlAssignment {
            tfi: 0,
            usf: 0,
            ts: 0,
            tsc: 0,
            arfcn: 1,
            ta: 0,
            ra: 0,
            ref_fn: 0,
            cs_command: 0,
            egprs: true,
        };
        assert!(matches!(write_uplink(&params), Err(CoreError::Unsupported(_))));
    }

    #[test]
    fn uplink_assignment_encodes_when_not_egprs() {
        let params = UlAssignment {
            tfi: 3,
            usf: 5,
            ts: 2,
            tsc: 4,
            arfcn: 100,
            ta: 10,
            ra: 0x7f,
            ref_fn: 5,
            cs_command: 1,
            egprs: false,
        };
        let buf = write_uplink(&params).unwrap();
        assert_eq!(buf.len(), IMMEDIATE_ASSIGNMENT_LEN);
    }

    #[test]
    fn ia_reject_access0_carries_raw_ra_at_fixed_offset() {
        let mut buf = [0u8; IA_REJECT_LEN];
        let plen = write_ia_reject(&mut buf, 112, 100, BurstType::Access0).unwrap();
        assert_eq!(plen, IA_REJECT_LEN);
        assert_eq!(buf[3], 0x70);
    }

    #[test]
    fn ia_reject_access1_uses_escape_ra_byte() {
        let mut buf = [0u8; IA_REJECT_LEN];
        let plen = write_ia_reject(&mut buf, 112, 100, BurstType::Access1).unwrap();
        assert_eq!(plen, IA_REJECT_LEN);
        assert_eq!(buf[3], 0x7F);
        assert_eq!(buf[IA_REJECT_LEN - 1], 0xC0);
    }
}
