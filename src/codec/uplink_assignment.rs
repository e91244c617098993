//! Packet Uplink Assignment encoder (spec §4.B), GPRS and EGPRS dynamic
//! allocation variants.
//!
//! Grounded in `original_source/src/encoding.cpp`'s
//! `Encoding::write_packet_uplink_assignment`. Only the dynamic-allocation
//! timeslot structure is implemented, matching that source's own `#if 1`
//! branch (fixed allocation was removed upstream and is not reachable from
//! any caller grounded here).

use crate::bits::BitWriter;
use crate::error::CoreResult;

/// Per-timeslot USF grant, indexed 0..=7.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeslotUsf {
    pub assigned: bool,
    pub usf: u8,
}

#[derive(Debug, Clone, Copy)]
pub enum OldDownlinkRef {
    Tlli(u32),
    Tfi { tfi: u8, was_downlink: bool },
}

#[derive(Debug, Clone)]
pub struct UplinkAssignmentParams {
    pub poll: bool,
    pub rrbp: u8,
    pub old_ref: OldDownlinkRef,
    pub tfi: u8,
    pub ta: u8,
    pub ta_idx: Option<u8>,
    pub tsc: u8,
    pub arfcn: u16,
    pub alpha: u8,
    pub gamma: u8,
    pub timeslots: [TimeslotUsf; 8],
    /// `Some((cs_command, ws))` selects the EGPRS branch; `None` the GPRS
    /// branch with `cs_command` interpreted as CS1..CS4 (0..=3).
    pub egprs: Option<EgprsParams>,
    pub gprs_cs_command: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct EgprsParams {
    pub mcs_command: u8,
    pub window_size: u16,
}

pub fn write(dest: &mut [u8], params: &UplinkAssignmentParams) -> CoreResult<usize> {
    let mut w = BitWriter::new(dest);

    w.write_field(0x1, 2)?; // payload type
    w.write_field(0x0, 2)?; // uplink block with TDMA frame number (N+13)
    w.write_field(params.poll as u64, 1)?;
    w.write_field(0x0, 3)?; // uplink state flag
    w.write_field(0xA, 6)?; // message type: Packet Uplink Assignment
    w.write_field(0x0, 2)?; // page mode

    w.write_field(0x0, 1)?; // PERSIST_LEVEL not present
    match params.old_ref {
        OldDownlinkRef::Tlli(tlli) => {
            w.write_field(0x2, 2)?;
            w.write_field(tlli as u64, 32)?;
        }
        OldDownlinkRef::Tfi { tfi, was_downlink } => {
            w.write_field(0x0, 1)?;
            w.write_field(was_downlink as u64, 1)?;
            w.write_field(tfi as u64, 5)?;
        }
    }

    match params.egprs {
        None => {
            w.write_field(0x0, 1)?; // message escape: off
            w.write_field(params.gprs_cs_command as u64, 2)?;
            w.write_field(0x1, 1)?; // TLLI_BLOCK_CHANNEL_CODING
            w.write_field(0x1, 1)?; // timing advance value present
            w.write_field(params.ta as u64, 6)?;
            match params.ta_idx {
                Some(idx) => {
                    w.write_field(0x1, 1)?;
                    w.write_field(idx as u64, 4)?;
                }
                None => w.write_field(0x0, 1)?,
            }
        }
        Some(egprs) => {
            if !(64..=(64 + 31 * 32)).contains(&egprs.window_size) || (egprs.window_size - 64) % 32 != 0 {
                return Err(crate::error::CoreError::InternalFraming("egprs window size not representable"));
            }
            let ws_enc = (egprs.window_size - 64) / 32;
            w.write_field(0x1, 1)?; // message escape: on
            w.write_field(0x0, 2)?; // EGPRS message contents
            w.write_field(0x0, 1)?; // no contention resolution TLLI
            w.write_field(0x0, 1)?; // no COMPACT reduced MA
            w.write_field(egprs.mcs_command as u64, 4)?;
            w.write_field(0x0, 1)?; // no resegment
            w.write_field(ws_enc as u64, 5)?;
            w.write_field(0x0, 1)?; // no access technologies request
            w.write_field(0x0, 1)?; // no ARAC retransmission request
            w.write_field(0x1, 1)?; // TLLI_BLOCK_CHANNEL_CODING
            w.write_field(0x0, 1)?; // no BEP_PERIOD2

            w.write_field(0x1, 1)?; // timing advance value present
            w.write_field(params.ta as u64, 6)?;
            match params.ta_idx {
                Some(idx) => {
                    w.write_field(0x1, 1)?;
                    w.write_field(idx as u64, 4)?;
                }
                None => w.write_field(0x0, 1)?,
            }
            w.write_field(0x0, 1)?; // no packet extended timing advance
        }
    }

    w.write_field(0x1, 1)?; // frequency parameters present
    w.write_field(params.tsc as u64, 3)?;
    w.write_field(0x0, 2)?; // ARFCN present
    w.write_field(params.arfcn as u64, 10)?;

    w.write_field(0x1, 2)?; // dynamic allocation

    w.write_field(0x0, 1)?; // extended dynamic allocation: off
    w.write_field(0x0, 1)?; // P0: off

    w.write_field(0x0, 1)?; // USF_GRANULARITY
    w.write_field(0x1, 1)?; // switch TFI: on
    w.write_field(params.tfi as u64, 5)?;

    w.write_field(0x0, 1)?; // spare
    w.write_field(0x0, 1)?; // TBF starting time: off

    let power_control = params.alpha != 0 || params.gamma != 0;
    if power_control {
        w.write_field(0x1, 1)?;
        w.write_field(params.alpha as u64, 4)?;
    } else {
        w.write_field(0x0, 1)?;
    }

    for ts in params.timeslots.iter() {
        if ts.assigned {
            w.write_field(0x1, 1)?;
            w.write_field(ts.usf as u64, 3)?;
            if power_control {
                w.write_field(params.gamma as u64, 5)?;
            }
        } else {
            w.write_field(0x0, 1)?;
        }
    }

    Ok(w.byte_len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params() -> UplinkAssignmentParams {
        UplinkAssignmentParams {
            poll: true,
            rrbp: 0,
            old_ref: OldDownlinkRef::Tfi { tfi: 1, was_downlink: false },
            tfi: 2,
            ta: 10,
            ta_idx: None,
            tsc: 3,
            arfcn: 50,
            alpha: 0,
            gamma: 0,
            timeslots: [TimeslotUsf::default(); 8],
            egprs: None,
            gprs_cs_command: 1,
        }
    }

    #[test]
    fn gprs_assignment_encodes_without_error() {
        let params = base_params();
        let mut buf = [0u8; 32];
        let len = write(&mut buf, &params).unwrap();
        assert!(len > 0);
    }

    #[test]
    fn egprs_assignment_encodes_window_size() {
        let mut params = base_params();
        params.egprs = Some(EgprsParams { mcs_command: 4, window_size: 256 });
        let mut buf = [0u8; 32];
        let len = write(&mut buf, &params).unwrap();
        assert!(len > 0);
    }

    #[test]
    fn per_timeslot_usf_sets_assigned_bit() {
        let mut params = base_params();
        params.timeslots[3] = TimeslotUsf { assigned: true, usf: 5 };
        let mut buf = [0u8; 32];
        write(&mut buf, &params).unwrap();
    }
}
