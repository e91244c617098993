//! Packet Channel Request (RACH, 11-bit access burst) decoding, spec §4.B
//! boundary case B3: an all-ones request pattern decodes to `Unknown`
//! rather than `Malformed`, since GSM reserves `0b111111` as an
//! establishment-cause escape the PCU does not interpret on its own.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstablishmentCause {
    OnePhaseAccess { priority: u8, multislot: bool },
    TwoPhaseAccess,
    PageResponse,
    CellUpdate,
    MmProcedure,
    SingleBlockAccess,
    Unknown,
}

/// Decodes an 11-bit RA value (as captured from a CHANNEL REQUEST burst)
/// into the establishment cause it names, per TS 44.018 §9.1.8 / Table
/// 9.9. Only the "one phase access request" and "single block" high-level
/// shapes used by the PCU are distinguished; anything else, including the
/// reserved `0b111111` prefix, maps to `Unknown` without error (boundary
/// case B3).
pub fn decode(ra: u16) -> EstablishmentCause {
    let ra = ra & 0x7FF;
    let top6 = (ra >> 5) as u8 & 0x3F;

    if top6 == 0b111_111 {
        return EstablishmentCause::Unknown;
    }

    if top6 & 0b111_000 == 0b000_000 {
        return EstablishmentCause::OnePhaseAccess {
            priority: (ra & 0x1F) as u8,
            multislot: (top6 & 0b000_100) != 0,
        };
    }
    if top6 & 0b111_000 == 0b001_000 {
        return EstablishmentCause::SingleBlockAccess;
    }
    if top6 & 0b110_000 == 0b010_000 {
        return EstablishmentCause::PageResponse;
    }
    if top6 & 0b100_000 == 0b100_000 {
        return EstablishmentCause::TwoPhaseAccess;
    }
    EstablishmentCause::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_ones_is_unknown_not_malformed() {
        assert_eq!(decode(0b111_111_00000), EstablishmentCause::Unknown);
    }

    #[test]
    fn low_prefix_is_one_phase_access() {
        match decode(0b000_010_10101) {
            EstablishmentCause::OnePhaseAccess { priority, .. } => assert_eq!(priority, 0b10101),
            other => panic!("unexpected {:?}", other),
        }
    }
}
