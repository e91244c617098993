//! Packet Timeslot Reconfigure encoder (spec §4.B), TS 44.060 §11.2.31.
//!
//! Grounded in `original_source/src/encoding.cpp`'s
//! `Encoding::write_packet_ts_reconfigure`. Only the EGPRS
//! `PTR_EGPRS_00` branch is implemented; the grounded source's own GPRS
//! branch (`PTR_GPRS_t`) is left empty (it never populates `g`), and the
//! CSN.1 comment block marks the `01`/`10`/`11` `PTR_EGPRS` union variants
//! `CSN_ERROR ... CSN_ERROR_STREAM_NOT_SUPPORTED` upstream. Both map to
//! [`CoreError::Unsupported`] here (Open Question decision, DESIGN.md).

use crate::bits::BitWriter;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy)]
pub enum ReconfigureVariant {
    /// TS 44.060 PTR_EGPRS_00: COMPACT reduced MA absent, dynamic
    /// allocation only.
    Egprs00 {
        channel_coding_command: u8,
        ta: u8,
        timeslots_assigned: [bool; 8],
        tsc_present: bool,
    },
    /// Upstream's GPRS branch is unimplemented (it never fills `g`).
    Gprs,
}

#[derive(Debug, Clone)]
pub struct TsReconfigureParams {
    pub poll: bool,
    pub rrbp: u8,
    pub tfi: u8,
    pub variant: ReconfigureVariant,
}

pub fn write(dest: &mut [u8], params: &TsReconfigureParams) -> CoreResult<usize> {
    let egprs00 = match &params.variant {
        ReconfigureVariant::Gprs => {
            return Err(CoreError::Unsupported("PTR_GPRS timeslot reconfigure"));
        }
        ReconfigureVariant::Egprs00 { channel_coding_command, ta, timeslots_assigned, tsc_present } => {
            (*channel_coding_command, *ta, *timeslots_assigned, *tsc_present)
        }
    };
    let (channel_coding_command, ta, timeslots_assigned, _tsc_present) = egprs00;

    let mut w = BitWriter::new(dest);

    w.write_field(0x1, 2)?; // payload type: RLC/MAC control, no optional octets
    w.write_field(params.rrbp as u64, 2)?;
    w.write_field(params.poll as u64, 1)?;
    w.write_field(0x0, 3)?; // uplink state flag

    w.write_field(0x7, 6)?; // message type: Packet Timeslot Reconfigure
    w.write_field(0x3, 2)?; // page mode: same as before

    w.write_field(0x0, 1)?; // spare
    w.write_field(params.tfi as u64, 5)?; // Global TFI (downlink)

    w.write_field(0x1, 2)?; // union type: PTR_EGPRS (1) -- then sub-variant 00

    w.write_field(0x0, 1)?; // COMPACT reduced MA not present
    w.write_field(channel_coding_command as u64, 4)?;
    w.write_field(0x0, 1)?; // no resegment

    w.write_field(0x0, 1)?; // downlink EGPRS window size not present
    w.write_field(0x0, 1)?; // uplink EGPRS window size not present
    w.write_field(0x0, 2)?; // link quality measurement mode

    w.write_field(0x1, 1)?; // timing advance value present
    w.write_field(ta as u64, 6)?;
    w.write_field(0x0, 1)?; // uplink timing advance not present
    w.write_field(0x0, 1)?; // downlink timing advance not present

    w.write_field(0x0, 1)?; // extended timing advance not present

    w.write_field(0x0, 1)?; // RLC mode: acknowledged
    w.write_field(0x0, 1)?; // CONTROL_ACK: not a new TBF
    w.write_field(0x0, 1)?; // downlink TFI assignment not present
    w.write_field(0x0, 1)?; // uplink TFI assignment not present

    let mut bitmap: u8 = 0;
    for (tn, assigned) in timeslots_assigned.iter().enumerate() {
        if *assigned {
            bitmap |= 0x80 >> tn;
        }
    }
    w.write_field(bitmap as u64, 8)?;

    w.write_field(0x0, 1)?; // frequency parameters not present

    w.write_field(0x0, 1)?; // dynamic allocation: extended DA off
    w.write_field(0x0, 2)?; // P0 not present
    w.write_field(0x0, 1)?; // USF_GRANULARITY: 1 block
    w.write_field(0x0, 1)?; // RLC_DATA_BLOCKS_GRANTED not present
    w.write_field(0x0, 1)?; // TBF starting time not present

    for assigned in timeslots_assigned.iter() {
        w.write_field(*assigned as u64, 1)?;
        if *assigned {
            w.write_field(0, 3)?; // USF_TN: filled in by caller via a follow-up patch
        }
    }

    Ok(w.byte_len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gprs_variant_is_unsupported() {
        let params = TsReconfigureParams {
            poll: false,
            rrbp: 0,
            tfi: 0,
            variant: ReconfigureVariant::Gprs,
        };
        let mut buf = [0u8; 32];
        assert!(matches!(write(&mut buf, &params), Err(CoreError::Unsupported(_))));
    }

    #[test]
    fn egprs00_variant_encodes() {
        let params = TsReconfigureParams {
            poll: true,
            rrbp: 1,
            tfi: 5,
            variant: ReconfigureVariant::Egprs00 {
                channel_coding_command: 3,
                ta: 15,
                timeslots_assigned: [true, true, false, false, false, false, false, false],
                tsc_present: true,
            },
        };
        let mut buf = [0u8; 32];
        let len = write(&mut buf, &params).unwrap();
        assert!(len > 0);
    }
}
