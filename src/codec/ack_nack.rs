//! Packet Uplink Ack/Nack encoder (spec §4.B, scenario S2).
//!
//! Grounded in `original_source/src/encoding.cpp`'s
//! `Encoding::write_packet_uplink_ack`, `write_packet_uplink_ack_gprs`,
//! `write_packet_uplink_ack_egprs` and `write_packet_ack_nack_desc_gprs`.
//! CRBB (compressed bitmap) support is explicitly TODO in the grounded
//! source ("Add CRBB support"); this codec mirrors that by always emitting
//! an uncompressed URBB and returning [`CoreError::Unsupported`] if asked
//! to decode a description that has CRBB present (Open Question decision,
//! see DESIGN.md).

use crate::bits::{BitReader, BitWriter};
use crate::error::{CoreError, CoreResult};
use crate::rlc::UlWindow;

/// Shared fields for both GPRS and EGPRS uplink Ack/Nack.
#[derive(Debug, Clone, Copy)]
pub struct AckNackParams {
    pub tfi: u8,
    pub rrbp: u8,
    pub is_final: bool,
    pub tlli: u32,
}

fn write_header(w: &mut BitWriter, params: &AckNackParams, egprs: bool) -> CoreResult<()> {
    w.write_field(0x1, 2)?; // payload type
    w.write_field(params.rrbp as u64, 2)?;
    w.write_field(params.is_final as u64, 1)?;
    w.write_field(0x0, 3)?; // uplink state flag
    w.write_field(0x9, 6)?; // message type: Packet Uplink Ack/Nack
    w.write_field(0x0, 2)?; // page mode

    w.write_field(0x0, 2)?; // spare
    w.write_field(params.tfi as u64, 5)?;
    w.write_field(egprs as u64, 1)?;
    Ok(())
}

/// Writes the 7-bit SSN + 64-bit uncompressed receive-block-bitmap
/// description shared by the GPRS Ack/Nack path (spec §4.C).
fn write_desc_gprs(w: &mut BitWriter, window: &UlWindow, is_final: bool) -> CoreResult<()> {
    let mut rbb = [false; 64];
    window.update_rbb(&mut rbb);
    w.write_field(is_final as u64, 1)?;
    w.write_field(window.ssn() as u64, 7)?;
    for ack in rbb.iter() {
        w.write_field(*ack as u64, 1)?;
    }
    Ok(())
}

/// Encodes a GPRS Packet Uplink Ack/Nack into `dest`, returning the number
/// of octets written. `cs_command` is `current_cs - 1` per the grounded
/// source (0..=3 for CS1..CS4).
pub fn write_gprs(dest: &mut [u8], params: &AckNackParams, cs_command: u8, window: &UlWindow) -> CoreResult<usize> {
    let mut w = BitWriter::new(dest);
    write_header(&mut w, params, false)?;

    w.write_field(cs_command as u64, 2)?;
    write_desc_gprs(&mut w, window, params.is_final)?;

    w.write_field(1, 1)?; // have contention resolution TLLI
    w.write_field(params.tlli as u64, 32)?;

    w.write_field(0, 1)?; // no packet timing advance
    w.write_field(0, 1)?; // no power control parameters
    w.write_field(0, 1)?; // no extension bits
    w.write_field(0, 1)?; // fixed 0
    w.write_field(1, 1)?; // have Additions R99
    w.write_field(0, 1)?; // no packet extended timing advance
    w.write_field(1, 1)?; // TBF_EST enabled
    w.write_field(0, 1)?; // no Rel 5

    w.align_to_octet();
    Ok(w.byte_len())
}

/// Encodes an EGPRS Packet Uplink Ack/Nack, always with CRBB absent
/// (uncompressed bitmap only).
pub fn write_egprs(dest: &mut [u8], params: &AckNackParams, window: &UlWindow) -> CoreResult<usize> {
    let mut w = BitWriter::new(dest);
    write_header(&mut w, params, true)?;

    w.write_field(0, 2)?; // fixed 00
    w.write_field(2, 4)?; // channel coding command: MCS-3
    w.write_field(0, 1)?; // no resegment
    w.write_field(1, 1)?; // pre-emptive transmission
    w.write_field(0, 1)?; // no PRR retransmission request
    w.write_field(0, 1)?; // no ARAC retransmission request
    w.write_field(1, 1)?; // have contention resolution TLLI
    w.write_field(params.tlli as u64, 32)?;
    w.write_field(1, 1)?; // TBF_EST enabled
    w.write_field(0, 1)?; // no packet timing advance
    w.write_field(0, 1)?; // no packet extended timing advance
    w.write_field(0, 1)?; // no power control parameters
    w.write_field(0, 1)?; // no extension bits

    let ssn = window.egprs_ssn();
    let mut rbb = [false; 64];
    window.update_rbb(&mut rbb);

    w.write_field(0, 1)?; // no length field (uncompressed, fits remaining space)
    w.write_field(params.is_final as u64, 1)?;
    w.write_field(1, 1)?; // beginning of window
    w.write_field(1, 1)?; // end of window: uncompressed bitmap always covers the full window
    w.write_field(ssn as u64, 11)?;
    w.write_field(0, 1)?; // CRBB not present

    for ack in rbb.iter() {
        w.write_field(*ack as u64, 1)?;
    }

    w.write_field(0, 1)?; // fixed 0
    w.write_field(0, 1)?; // no Rel 5

    w.align_to_octet();
    Ok(w.byte_len())
}

/// Decoded fields of a Packet Uplink Ack/Nack header, common to both
/// dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckNackHeader {
    pub rrbp: u8,
    pub is_final: bool,
    pub tfi: u8,
    pub egprs: bool,
}

pub fn read_header(buf: &[u8]) -> CoreResult<AckNackHeader> {
    let mut r = BitReader::new(buf);
    let _payload_type = r.read_field(2)?;
    let rrbp = r.read_field(2)? as u8;
    let is_final = r.read_field(1)? != 0;
    let _usf_flag = r.read_field(3)?;
    let msg_type = r.read_field(6)?;
    if msg_type != 0x9 {
        return Err(CoreError::Malformed("not a Packet Uplink Ack/Nack"));
    }
    let _page_mode = r.read_field(2)?;
    let _spare = r.read_field(2)?;
    let tfi = r.read_field(5)? as u8;
    let egprs = r.read_field(1)? != 0;
    Ok(AckNackHeader { rrbp, is_final, tfi, egprs })
}

/// Reading the EGPRS description with CRBB present is unimplemented
/// per the grounded source's own TODO; callers encounter this only on
/// wire input this encoder never produces itself.
pub fn reject_if_crbb_present(byte_with_crbb_bit: u8, crbb_bit_index: u8) -> CoreResult<()> {
    if (byte_with_crbb_bit >> (7 - crbb_bit_index)) & 1 != 0 {
        return Err(CoreError::Unsupported("EGPRS Ack/Nack CRBB"));
    }
    Ok(())
}
