//! BTS-wide configuration surface (spec §6).
//!
//! `Bts::new` is the only construction path; there is no process-global
//! configuration singleton, so a test can build as many independent `Bts`
//! values as it needs.

/// Allocation algorithm choice for the PDCH/TFI/USF allocator (§4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocAlgorithm {
    /// Single-slot round robin.
    A,
    /// Multislot-class-aware.
    B,
}

/// GPRS/EGPRS coding scheme and timer/counter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BtsConfig {
    /// Starting coding scheme for new downlink TBFs, 1..=4.
    pub initial_cs_dl: u8,
    /// Starting coding scheme for new uplink TBFs, 1..=4.
    pub initial_cs_ul: u8,
    /// Which GPRS coding schemes are administratively permitted.
    pub cs1: bool,
    pub cs2: bool,
    pub cs3: bool,
    pub cs4: bool,
    pub egprs_enabled: bool,
    pub alloc_algorithm: AllocAlgorithm,

    /// Milliseconds until a single-block allocation expires (T3142).
    pub t3142_msec: u32,
    /// Milliseconds an uplink TBF waits for a poll response before
    /// escalating (T3169).
    pub t3169_msec: u32,
    /// Milliseconds an uplink TBF in WAIT_RELEASE waits before release
    /// (T3191).
    pub t3191_msec: u32,
    /// Milliseconds a downlink TBF in WAIT_RELEASE waits before release
    /// (T3193).
    pub t3193_msec: u32,
    /// Milliseconds an assignment waits for acknowledgement (T3195).
    pub t3195_msec: u32,
    /// Poll retries before an uplink TBF is released (N3101).
    pub n3101_max: u8,
    /// Retransmissions before a contention-resolution failure (N3103).
    pub n3103_max: u8,
    /// Retransmissions before a downlink TBF is released (N3105).
    pub n3105_max: u8,
}

impl Default for BtsConfig {
    fn default() -> Self {
        BtsConfig {
            initial_cs_dl: 1,
            initial_cs_ul: 1,
            cs1: true,
            cs2: true,
            cs3: true,
            cs4: true,
            egprs_enabled: true,
            alloc_algorithm: AllocAlgorithm::B,
            t3142_msec: 20_000,
            t3169_msec: 5_000,
            t3191_msec: 5_000,
            t3193_msec: 1_200,
            t3195_msec: 5_000,
            n3101_max: 8,
            n3103_max: 8,
            n3105_max: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_enables_egprs_and_algorithm_b() {
        let cfg = BtsConfig::default();
        assert!(cfg.egprs_enabled);
        assert_eq!(cfg.alloc_algorithm, AllocAlgorithm::B);
        assert!(cfg.cs1 && cfg.cs2 && cfg.cs3 && cfg.cs4);
    }
}
