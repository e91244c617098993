//! Coding-scheme catalog (§4.A): CS-1..CS-4 (GPRS) and MCS-1..MCS-9 (EGPRS).

/// RLC data-block header layout family. Determines how BSN and extension
/// bits are split across the header (see `codec::data_header`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderType {
    GprsData,
    EgprsDataT1,
    EgprsDataT2,
    EgprsDataT3,
}

/// A single GPRS or EGPRS coding scheme, or `Unknown` for an unrecognized
/// wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GprsCodingScheme {
    Unknown,
    Cs1,
    Cs2,
    Cs3,
    Cs4,
    Mcs1,
    Mcs2,
    Mcs3,
    Mcs4,
    Mcs5,
    Mcs6,
    Mcs7,
    Mcs8,
    Mcs9,
}

use GprsCodingScheme::*;

/// `(data_block_bytes, num_data_blocks, header_type, size_dl, size_ul,
/// spare_bits_dl, spare_bits_ul)` for one coding scheme. GPRS sizes per TS
/// 44.060 Table 10.2.1 (header 3 octets included in `size_*`); EGPRS sizes
/// per TS 44.060 Table 10.4.1.
struct SchemeInfo {
    data_block_bytes: u16,
    num_data_blocks: u8,
    header_type: HeaderType,
    size_dl: u16,
    size_ul: u16,
    spare_bits_dl: u8,
    spare_bits_ul: u8,
}

const fn info(cs: GprsCodingScheme) -> Option<SchemeInfo> {
    use HeaderType::*;
    Some(match cs {
        Unknown => return None,
        Cs1 => SchemeInfo { data_block_bytes: 20, num_data_blocks: 1, header_type: GprsData, size_dl: 23, size_ul: 23, spare_bits_dl: 0, spare_bits_ul: 0 },
        Cs2 => SchemeInfo { data_block_bytes: 30, num_data_blocks: 1, header_type: GprsData, size_dl: 33, size_ul: 33, spare_bits_dl: 7, spare_bits_ul: 7 },
        Cs3 => SchemeInfo { data_block_bytes: 36, num_data_blocks: 1, header_type: GprsData, size_dl: 39, size_ul: 39, spare_bits_dl: 3, spare_bits_ul: 3 },
        Cs4 => SchemeInfo { data_block_bytes: 50, num_data_blocks: 1, header_type: GprsData, size_dl: 53, size_ul: 53, spare_bits_dl: 7, spare_bits_ul: 7 },
        Mcs1 => SchemeInfo { data_block_bytes: 22, num_data_blocks: 1, header_type: EgprsDataT3, size_dl: 27, size_ul: 27, spare_bits_dl: 0, spare_bits_ul: 0 },
        Mcs2 => SchemeInfo { data_block_bytes: 28, num_data_blocks: 1, header_type: EgprsDataT3, size_dl: 33, size_ul: 33, spare_bits_dl: 0, spare_bits_ul: 0 },
        Mcs3 => SchemeInfo { data_block_bytes: 37, num_data_blocks: 1, header_type: EgprsDataT3, size_dl: 42, size_ul: 42, spare_bits_dl: 0, spare_bits_ul: 0 },
        Mcs4 => SchemeInfo { data_block_bytes: 44, num_data_blocks: 1, header_type: EgprsDataT3, size_dl: 49, size_ul: 49, spare_bits_dl: 0, spare_bits_ul: 0 },
        Mcs5 => SchemeInfo { data_block_bytes: 56, num_data_blocks: 1, header_type: EgprsDataT2, size_dl: 60, size_ul: 60, spare_bits_dl: 0, spare_bits_ul: 0 },
        Mcs6 => SchemeInfo { data_block_bytes: 74, num_data_blocks: 1, header_type: EgprsDataT2, size_dl: 78, size_ul: 78, spare_bits_dl: 0, spare_bits_ul: 0 },
        Mcs7 => SchemeInfo { data_block_bytes: 56, num_data_blocks: 2, header_type: EgprsDataT1, size_dl: 117, size_ul: 117, spare_bits_dl: 0, spare_bits_ul: 0 },
        Mcs8 => SchemeInfo { data_block_bytes: 68, num_data_blocks: 2, header_type: EgprsDataT1, size_dl: 141, size_ul: 141, spare_bits_dl: 0, spare_bits_ul: 0 },
        Mcs9 => SchemeInfo { data_block_bytes: 74, num_data_blocks: 2, header_type: EgprsDataT1, size_dl: 153, size_ul: 153, spare_bits_dl: 0, spare_bits_ul: 0 },
    })
}

impl GprsCodingScheme {
    pub fn is_gprs(self) -> bool {
        matches!(self, Cs1 | Cs2 | Cs3 | Cs4)
    }

    pub fn is_egprs(self) -> bool {
        matches!(self, Mcs1 | Mcs2 | Mcs3 | Mcs4 | Mcs5 | Mcs6 | Mcs7 | Mcs8 | Mcs9)
    }

    /// EGPRS schemes that use GMSK modulation rather than 8-PSK.
    pub fn is_egprs_gmsk(self) -> bool {
        matches!(self, Mcs1 | Mcs2 | Mcs3 | Mcs4)
    }

    pub fn header_type(self) -> Option<HeaderType> {
        info(self).map(|i| i.header_type)
    }

    pub fn max_data_block_bytes(self) -> u16 {
        info(self).map(|i| i.data_block_bytes).unwrap_or(0)
    }

    pub fn num_data_blocks(self) -> u8 {
        info(self).map(|i| i.num_data_blocks).unwrap_or(0)
    }

    pub fn spare_bits_dl(self) -> u8 {
        info(self).map(|i| i.spare_bits_dl).unwrap_or(0)
    }

    pub fn spare_bits_ul(self) -> u8 {
        info(self).map(|i| i.spare_bits_ul).unwrap_or(0)
    }

    pub fn size_dl(self) -> u16 {
        info(self).map(|i| i.size_dl).unwrap_or(0)
    }

    pub fn size_ul(self) -> u16 {
        info(self).map(|i| i.size_ul).unwrap_or(0)
    }

    /// Demuxes an incoming uplink radio block by its octet length.
    pub fn by_size_ul(n: u16) -> GprsCodingScheme {
        const ALL: [GprsCodingScheme; 13] =
            [Cs1, Cs2, Cs3, Cs4, Mcs1, Mcs2, Mcs3, Mcs4, Mcs5, Mcs6, Mcs7, Mcs8, Mcs9];
        for cs in ALL {
            if cs.size_ul() == n {
                return cs;
            }
        }
        Unknown
    }

    fn family(self) -> Option<&'static [GprsCodingScheme]> {
        const GPRS_FAMILY: [GprsCodingScheme; 4] = [Cs1, Cs2, Cs3, Cs4];
        const EGPRS_GMSK_FAMILY: [GprsCodingScheme; 4] = [Mcs1, Mcs2, Mcs3, Mcs4];
        const EGPRS_FAMILY: [GprsCodingScheme; 9] =
            [Mcs1, Mcs2, Mcs3, Mcs4, Mcs5, Mcs6, Mcs7, Mcs8, Mcs9];
        if self.is_gprs() {
            Some(&GPRS_FAMILY)
        } else if self.is_egprs_gmsk() {
            Some(&EGPRS_GMSK_FAMILY)
        } else if self.is_egprs() {
            Some(&EGPRS_FAMILY)
        } else {
            None
        }
    }

    /// Next (higher-rate) scheme within the same family, saturating at the
    /// top.
    pub fn inc(self) -> GprsCodingScheme {
        match self.family() {
            None => self,
            Some(family) => {
                let idx = family.iter().position(|&c| c == self).unwrap_or(0);
                family[(idx + 1).min(family.len() - 1)]
            }
        }
    }

    /// Previous (lower-rate) scheme within the same family, saturating at
    /// the bottom.
    pub fn dec(self) -> GprsCodingScheme {
        match self.family() {
            None => self,
            Some(family) => {
                let idx = family.iter().position(|&c| c == self).unwrap_or(0);
                family[idx.saturating_sub(1)]
            }
        }
    }

    /// Lowest-rate scheme within the family that fits a single radio block,
    /// signalling via `needs_padding` whether the caller must append
    /// padding bits to reach that block's fixed size.
    pub fn dec_to_single_block(self, needs_padding: &mut bool) -> GprsCodingScheme {
        *needs_padding = self.num_data_blocks() > 1;
        match self.family() {
            None => self,
            Some(family) => family[0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_size_ul_round_trips_for_every_known_scheme() {
        for cs in [Cs1, Cs2, Cs3, Cs4, Mcs1, Mcs2, Mcs3, Mcs4, Mcs5, Mcs6, Mcs7, Mcs8, Mcs9] {
            assert_eq!(GprsCodingScheme::by_size_ul(cs.size_ul()), cs);
        }
    }

    #[test]
    fn unknown_size_maps_to_unknown() {
        assert_eq!(GprsCodingScheme::by_size_ul(0), Unknown);
    }

    #[test]
    fn inc_dec_saturate_within_gprs_family() {
        assert_eq!(Cs4.inc(), Cs4);
        assert_eq!(Cs1.dec(), Cs1);
        assert_eq!(Cs1.inc(), Cs2);
        assert_eq!(Cs4.dec(), Cs3);
    }

    #[test]
    fn inc_dec_stay_within_egprs_gmsk_family() {
        assert_eq!(Mcs4.inc(), Mcs4);
        assert_eq!(Mcs1.dec(), Mcs1);
        assert_eq!(Mcs2.inc(), Mcs3);
    }

    #[test]
    fn dec_to_single_block_flags_padding_for_two_block_schemes() {
        let mut needs_padding = false;
        let single = Mcs9.dec_to_single_block(&mut needs_padding);
        assert!(needs_padding);
        assert_eq!(single, Mcs1);

        let mut needs_padding2 = false;
        let single2 = Mcs2.dec_to_single_block(&mut needs_padding2);
        assert!(!needs_padding2);
        assert_eq!(single2, Mcs1);
    }

    #[test]
    fn header_types_match_block_families() {
        assert_eq!(Cs1.header_type(), Some(HeaderType::GprsData));
        assert_eq!(Mcs3.header_type(), Some(HeaderType::EgprsDataT3));
        assert_eq!(Mcs5.header_type(), Some(HeaderType::EgprsDataT2));
        assert_eq!(Mcs9.header_type(), Some(HeaderType::EgprsDataT1));
    }
}
