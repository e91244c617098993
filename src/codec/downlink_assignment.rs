//! Packet Downlink Assignment encoder (spec §4.B), TS 44.060 §11.2.7.
//!
//! Grounded in `original_source/src/encoding.cpp`'s
//! `Encoding::write_packet_downlink_assignment`.

use crate::bits::BitWriter;
use crate::error::CoreResult;

#[derive(Debug, Clone, Copy)]
pub enum AssignmentId {
    OldTfi { tfi: u8, was_downlink: bool },
    Tlli(u32),
}

#[derive(Debug, Clone)]
pub struct DownlinkAssignmentParams {
    pub poll: bool,
    pub rrbp: u8,
    pub id: AssignmentId,
    /// set when the MS has an active T3192 (was releasing) timer and no
    /// new DL TBF should be established on its behalf.
    pub control_ack: bool,
    pub timeslots_assigned: [bool; 8],
    pub ta: u8,
    pub ta_idx: Option<u8>,
    pub ta_ts: u8,
    pub tsc: u8,
    pub arfcn: u16,
    pub tfi: u8,
    pub alpha: u8,
    pub gamma: u8,
    /// `Some(ws)` selects the EGPRS AdditionsR99 tail.
    pub egprs_ws: Option<u16>,
}

pub fn write(dest: &mut [u8], params: &DownlinkAssignmentParams) -> CoreResult<usize> {
    let mut w = BitWriter::new(dest);

    w.write_field(0x1, 2)?; // payload type
    w.write_field(params.rrbp as u64, 2)?;
    w.write_field(params.poll as u64, 1)?;
    w.write_field(0x0, 3)?; // uplink state flag

    w.write_field(0x2, 6)?; // message type: Packet Downlink Assignment
    w.write_field(0x0, 2)?; // page mode

    w.write_field(0x0, 1)?; // persistence level not present

    match params.id {
        AssignmentId::OldTfi { tfi, was_downlink } => {
            w.write_field(0x0, 1)?; // ID = Global TFI
            w.write_field(was_downlink as u64, 1)?;
            w.write_field(tfi as u64, 5)?;
        }
        AssignmentId::Tlli(tlli) => {
            w.write_field(0x1, 1)?; // ID = TLLI
            w.write_field(tlli as u64, 32)?;
        }
    }

    w.write_field(0x0, 2)?; // MAC_MODE: dynamic allocation
    w.write_field(0x0, 1)?; // RLC_MODE: acknowledged
    w.write_field(params.control_ack as u64, 1)?;

    let mut timeslot_bitmap: u8 = 0;
    for (tn, assigned) in params.timeslots_assigned.iter().enumerate() {
        if *assigned {
            timeslot_bitmap |= 0x80 >> tn;
        }
    }
    w.write_field(timeslot_bitmap as u64, 8)?;

    w.write_field(0x1, 1)?; // timing advance value present
    w.write_field(params.ta as u64, 6)?;
    match params.ta_idx {
        Some(idx) => {
            w.write_field(0x1, 1)?;
            w.write_field(idx as u64, 4)?;
            w.write_field(params.ta_ts as u64, 3)?;
        }
        None => w.write_field(0x0, 1)?,
    }

    w.write_field(0x0, 1)?; // P0/BTS power control mode not present

    w.write_field(0x1, 1)?; // frequency parameters present
    w.write_field(params.tsc as u64, 3)?;
    w.write_field(0x0, 2)?; // ARFCN present
    w.write_field(params.arfcn as u64, 10)?;

    w.write_field(0x1, 1)?; // downlink TFI assignment present
    w.write_field(params.tfi as u64, 5)?;

    w.write_field(0x1, 1)?; // power control parameters present
    w.write_field(params.alpha as u64, 4)?;
    for assigned in params.timeslots_assigned.iter() {
        if *assigned {
            w.write_field(0x1, 1)?;
            w.write_field(params.gamma as u64, 5)?;
        } else {
            w.write_field(0x0, 1)?;
        }
    }

    w.write_field(0x0, 1)?; // TBF starting time not present
    w.write_field(0x0, 1)?; // measurement mapping not present

    match params.egprs_ws {
        None => {
            w.write_field(0x0, 1)?; // AdditionsR99 not present
        }
        Some(ws) => {
            if !(64..=(64 + 31 * 32)).contains(&ws) || (ws - 64) % 32 != 0 {
                return Err(crate::error::CoreError::InternalFraming("egprs window size not representable"));
            }
            let ws_enc = (ws - 64) / 32;
            w.write_field(0x1, 1)?; // AdditionsR99 present
            w.write_field(0x1, 1)?; // EGPRS params present
            w.write_field(ws_enc as u64, 5)?;
            w.write_field(0x0, 2)?; // link quality measurement mode
            w.write_field(0x0, 1)?; // BEP_PERIOD2 not present
            w.write_field(0x0, 1)?; // packet extended timing advance not present
            w.write_field(0x0, 1)?; // COMPACT reduced MA not present
        }
    }

    Ok(w.byte_len())
}
