//! Paging Request Type 1 encoder carrying a P-TMSI mobile identity (spec
//! §4.B), grounded in `original_source/src/encoding.cpp`'s
//! `Encoding::write_paging_request`.

use crate::bits::BitWriter;
use crate::error::{CoreError, CoreResult};

/// Encodes a Paging Request naming `ptmsi` by its raw octets (typically 4,
/// the P-TMSI length), returning the octet length of the message body
/// before the fixed rest-octets tail. Fails with `Malformed` if the body
/// written so far is not octet-aligned before the rest octets are appended
/// (mirroring the grounded source's own defensive `exit(0)` turned into a
/// recoverable error here).
pub fn write_ptmsi_paging(dest: &mut [u8], ptmsi: &[u8]) -> CoreResult<usize> {
    let mut w = BitWriter::new(dest);

    w.write_field(0x0, 4)?; // skip indicator
    w.write_field(0x6, 4)?; // protocol discriminator
    w.write_field(0x21, 8)?; // message type: Paging Request

    w.write_field(0x0, 4)?; // page mode
    w.write_field(0x0, 4)?; // channel needed

    let ptmsi_len = ptmsi.len();
    w.write_field((ptmsi_len + 1) as u64, 8)?; // mobile identity length
    w.write_field(0xF, 4)?; // unused
    w.write_field(0x4, 4)?; // identity type: P-TMSI
    for byte in ptmsi {
        w.write_field(*byte as u64, 8)?;
    }

    if !w.is_octet_aligned() {
        return Err(CoreError::InternalFraming("paging request body not octet-aligned before rest octets"));
    }
    let plen = w.byte_len();

    w.write_field(0x0, 1)?; // NLN(PCH) not present
    w.write_field(0x0, 1)?; // Priority1 not present
    w.write_field(0x1, 1)?; // Priority2 not present
    w.write_field(0x0, 1)?; // group call information not present
    w.write_field(0x0, 1)?; // packet page indication 1: packet paging procedure
    w.write_field(0x1, 1)?; // packet page indication 2: packet paging procedure

    Ok(plen)
}
