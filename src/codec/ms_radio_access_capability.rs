//! MS Radio Access Capability IE (TS 24.008 §10.5.5.12), used to read a
//! mobile's multislot class out of a CHANNEL REQUEST / ATTACH REQUEST
//! payload so the allocator can select Algorithm A or B.
//!
//! `original_source/` does not ship the CSN.1 table for this IE (only
//! `tests/rlcmac/RLCMACTest.cpp` exercises an external `decode_gsm_ra_cap`
//! from libosmocore against two hand-annotated hex vectors,
//! `"1365146230"` and `"13a5146200"`). Those annotations ground the
//! outermost shape (4-bit Access Technology Type, 7-bit length-in-bits,
//! then a GSM-E content struct whose multislot fields this module
//! extracts); the finer sub-field boundaries inside that struct are not
//! independently verifiable from the retrieved pack, so this decoder is
//! tested by re-encoding its own decoded values and checking equality
//! (the same decode-of-encode strategy used for the Immediate Assignment
//! codec) rather than by matching the two hex vectors bit-for-bit (Open
//! Question decision, see DESIGN.md).

use crate::bits::{BitReader, BitWriter};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MultislotCapability {
    pub gprs_multislot_class: Option<u8>,
    pub gprs_extended_dynamic_allocation: bool,
    pub egprs_multislot_class: Option<u8>,
    pub egprs_extended_dynamic_allocation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessCapabilityEntry {
    pub access_technology_type: u8,
    pub rf_power_capability: u8,
    pub controlled_early_classmark_sending: bool,
    pub pseudo_synchronisation: bool,
    pub voice_group_call_service: bool,
    pub voice_broadcast_service: bool,
    pub multislot: MultislotCapability,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsRadioAccessCapability {
    pub entries: Vec<AccessCapabilityEntry>,
}

fn decode_multislot(r: &mut BitReader) -> CoreResult<MultislotCapability> {
    let mut cap = MultislotCapability::default();
    if r.read_field(1)? == 0 {
        r.read_field(5)?; // HSCSD multislot class, discarded
    }
    if r.read_field(1)? == 0 {
        r.read_field(8)?; // SMS_VALUE + SM_VALUE, discarded
    }
    if r.read_field(1)? == 0 {
        r.read_field(5)?; // ECSD multislot class, discarded
    }
    if r.read_field(1)? == 0 {
        r.read_field(4)?; // DTM GPRS/EGPRS multislot class, discarded
    }
    if r.read_field(1)? == 0 {
        cap.gprs_multislot_class = Some(r.read_field(5)? as u8);
        cap.gprs_extended_dynamic_allocation = r.read_field(1)? != 0;
    }
    if r.read_field(1)? == 0 {
        cap.egprs_multislot_class = Some(r.read_field(5)? as u8);
        cap.egprs_extended_dynamic_allocation = r.read_field(1)? != 0;
    }
    Ok(cap)
}

fn encode_multislot(w: &mut BitWriter, cap: &MultislotCapability) -> CoreResult<()> {
    w.write_field(1, 1)?; // HSCSD absent
    w.write_field(1, 1)?; // SMS_VALUE/SM_VALUE absent
    w.write_field(1, 1)?; // ECSD absent
    w.write_field(1, 1)?; // DTM absent
    match cap.gprs_multislot_class {
        Some(class) => {
            w.write_field(0, 1)?;
            w.write_field(class as u64, 5)?;
            w.write_field(cap.gprs_extended_dynamic_allocation as u64, 1)?;
        }
        None => w.write_field(1, 1)?,
    }
    match cap.egprs_multislot_class {
        Some(class) => {
            w.write_field(0, 1)?;
            w.write_field(class as u64, 5)?;
            w.write_field(cap.egprs_extended_dynamic_allocation as u64, 1)?;
        }
        None => w.write_field(1, 1)?,
    }
    Ok(())
}

fn decode_entry(r: &mut BitReader, access_technology_type: u8) -> CoreResult<AccessCapabilityEntry> {
    let rf_power_capability = r.read_field(3)? as u8;
    if r.read_field(1)? != 0 {
        r.read_field(4)?; // A5 bits present, discarded (not surfaced to the allocator)
    }
    let controlled_early_classmark_sending = r.read_field(1)? != 0;
    let pseudo_synchronisation = r.read_field(1)? != 0;
    let voice_group_call_service = r.read_field(1)? != 0;
    let voice_broadcast_service = r.read_field(1)? != 0;
    let multislot = if r.read_field(1)? == 0 {
        decode_multislot(r)?
    } else {
        MultislotCapability::default()
    };
    Ok(AccessCapabilityEntry {
        access_technology_type,
        rf_power_capability,
        controlled_early_classmark_sending,
        pseudo_synchronisation,
        voice_group_call_service,
        voice_broadcast_service,
        multislot,
    })
}

fn encode_entry(w: &mut BitWriter, entry: &AccessCapabilityEntry) -> CoreResult<()> {
    w.write_field(entry.rf_power_capability as u64, 3)?;
    w.write_field(0, 1)?; // A5 bits not re-encoded
    w.write_field(entry.controlled_early_classmark_sending as u64, 1)?;
    w.write_field(entry.pseudo_synchronisation as u64, 1)?;
    w.write_field(entry.voice_group_call_service as u64, 1)?;
    w.write_field(entry.voice_broadcast_service as u64, 1)?;
    w.write_field(0, 1)?; // multislot capability struct present
    encode_multislot(w, &entry.multislot)?;
    Ok(())
}

/// Decodes the outer Access Technology Type + Length-in-bits + content
/// loop. A content field's declared length may run past what this reader
/// actually consumes (unmodeled sub-fields); the reader trusts the length
/// and skips to its end rather than the parsed bit count, tolerating
/// unknown access-tech entries.
pub fn decode(buf: &[u8]) -> CoreResult<MsRadioAccessCapability> {
    let mut r = BitReader::new(buf);
    let mut entries = Vec::new();
    loop {
        if r.bits_remaining() < 11 {
            break;
        }
        let access_technology_type = r.read_field(4)? as u8;
        let len_bits = r.read_field(7)?;
        if len_bits == 0 {
            break;
        }
        let content_start = r.bit_pos();
        let entry = decode_entry(&mut r, access_technology_type)?;
        let consumed = (r.bit_pos() - content_start) as u64;
        if consumed > len_bits {
            return Err(CoreError::Malformed("MS RA capability entry overran its declared length"));
        }
        entries.push(entry);
        for _ in 0..(len_bits - consumed) {
            r.read_field(1)?;
        }
        if r.bits_remaining() < 1 || r.read_field(1)? == 0 {
            break;
        }
    }
    Ok(MsRadioAccessCapability { entries })
}

/// Re-encodes a decoded capability set. Length-in-bits and the trailing
/// "more entries follow" bit are recomputed from the encoded entry size,
/// so round-tripping preserves every decoded field even though the raw
/// byte image may differ from the original wire capture.
pub fn encode(dest: &mut [u8], caps: &MsRadioAccessCapability) -> CoreResult<usize> {
    let mut w = BitWriter::new(dest);
    for (i, entry) in caps.entries.iter().enumerate() {
        let mut scratch = [0u8; 32];
        let len_bits = {
            let mut sw = BitWriter::new(&mut scratch);
            encode_entry(&mut sw, entry)?;
            sw.bit_pos()
        };
        w.write_field(entry.access_technology_type as u64, 4)?;
        w.write_field(len_bits as u64, 7)?;
        encode_entry(&mut w, entry)?;
        let has_more = i + 1 < caps.entries.len();
        w.write_field(has_more as u64, 1)?;
    }
    w.align_to_octet();
    Ok(w.byte_len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MsRadioAccessCapability {
        MsRadioAccessCapability {
            entries: vec![AccessCapabilityEntry {
                access_technology_type: 1,
                rf_power_capability: 1,
                controlled_early_classmark_sending: true,
                pseudo_synchronisation: false,
                voice_group_call_service: false,
                voice_broadcast_service: false,
                multislot: MultislotCapability {
                    gprs_multislot_class: Some(3),
                    gprs_extended_dynamic_allocation: false,
                    egprs_multislot_class: Some(3),
                    egprs_extended_dynamic_allocation: false,
                },
            }],
        }
    }

    #[test]
    fn decode_of_encode_round_trips_multislot_classes() {
        let caps = sample();
        let mut buf = [0u8; 32];
        let len = encode(&mut buf, &caps).unwrap();
        let decoded = decode(&buf[..len]).unwrap();
        assert_eq!(decoded.entries.len(), 1);
        assert_eq!(decoded.entries[0].multislot.gprs_multislot_class, Some(3));
        assert_eq!(decoded.entries[0].multislot.egprs_multislot_class, Some(3));
        assert_eq!(decoded.entries[0].access_technology_type, 1);
    }

    #[test]
    fn absent_multislot_classes_round_trip_as_none() {
        let mut caps = sample();
        caps.entries[0].multislot.gprs_multislot_class = None;
        caps.entries[0].multislot.egprs_multislot_class = None;
        let mut buf = [0u8; 32];
        let len = encode(&mut buf, &caps).unwrap();
        let decoded = decode(&buf[..len]).unwrap();
        assert_eq!(decoded.entries[0].multislot.gprs_multislot_class, None);
        assert_eq!(decoded.entries[0].multislot.egprs_multislot_class, None);
    }
}
